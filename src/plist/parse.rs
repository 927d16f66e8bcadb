//! Parser for the ASCII plist grammar.
//!
//! Produces the untyped [`Value`] tree. Malformed input (unterminated quote,
//! unbalanced braces, missing root dictionary) fails outright; no partial
//! tree is ever returned.

use crate::err::{Error, Result};

use super::{CommentedString, Dict, Value};

/// Parses a whole document. The root must be a dictionary.
pub fn parse(input: &str) -> Result<Dict> {
  let mut p = Parser::new(input);

  let root = match p.next_skipping_comments()? {
    Some((_, Tok::LBrace)) => p.parse_dict()?,
    Some((at, tok))        => return Err(malformed(at, format!("expected `{{`, found {}", tok.describe()))),
    None                   => return Err(malformed(input.len(), "missing root dictionary".to_string()))
  };

  match p.next_skipping_comments()? {
    None            => Ok(root),
    Some((at, tok)) => Err(malformed(at, format!("trailing {} after root dictionary", tok.describe())))
  }
}

fn malformed(offset: usize, message: String) -> Error {
  Error::Malformed { offset, message }
}

enum Tok {
  LBrace,
  RBrace,
  LParen,
  RParen,
  Semi,
  Comma,
  Eq,
  Str(String),
  Comment(String)
}

impl Tok {
  fn describe(&self) -> &'static str {
    match self {
      Tok::LBrace     => "`{`",
      Tok::RBrace     => "`}`",
      Tok::LParen     => "`(`",
      Tok::RParen     => "`)`",
      Tok::Semi       => "`;`",
      Tok::Comma      => "`,`",
      Tok::Eq         => "`=`",
      Tok::Str(_)     => "string",
      Tok::Comment(_) => "comment"
    }
  }
}

struct Lexer<'a> {
  bytes: &'a [u8],
  pos:   usize
}

impl<'a> Lexer<'a> {
  fn next_token(&mut self) -> Result<Option<(usize, Tok)>> {
    loop {
      while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
        self.pos += 1;
      }
      if self.pos >= self.bytes.len() {
        return Ok(None);
      }

      let at = self.pos;
      let b  = self.bytes[at];

      // Line comments only appear as the `// !$*UTF8*$!` header.
      if b == b'/' && self.bytes.get(at + 1) == Some(&b'/') {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
          self.pos += 1;
        }
        continue;
      }

      if b == b'/' && self.bytes.get(at + 1) == Some(&b'*') {
        return Ok(Some((at, Tok::Comment(self.block_comment(at)?))));
      }

      let tok = match b {
        b'{' => Tok::LBrace,
        b'}' => Tok::RBrace,
        b'(' => Tok::LParen,
        b')' => Tok::RParen,
        b';' => Tok::Semi,
        b',' => Tok::Comma,
        b'=' => Tok::Eq,
        b'"' => {
          return Ok(Some((at, Tok::Str(self.quoted_string(at)?))));
        },
        _    => {
          return Ok(Some((at, Tok::Str(self.bare_string(at)?))));
        }
      };
      self.pos += 1;
      return Ok(Some((at, tok)));
    }
  }

  fn block_comment(&mut self, at: usize) -> Result<String> {
    self.pos += 2;
    let start = self.pos;
    while self.pos + 1 < self.bytes.len() {
      if self.bytes[self.pos] == b'*' && self.bytes[self.pos + 1] == b'/' {
        let text = std::str::from_utf8(&self.bytes[start .. self.pos])
          .map_err(|_| malformed(at, "comment is not valid UTF-8".to_string()))?
          .trim()
          .to_string();
        self.pos += 2;
        return Ok(text);
      }
      self.pos += 1;
    }
    Err(malformed(at, "unterminated comment".to_string()))
  }

  fn quoted_string(&mut self, at: usize) -> Result<String> {
    self.pos += 1;
    let mut s = String::new();
    while self.pos < self.bytes.len() {
      match self.bytes[self.pos] {
        b'"'  => {
          self.pos += 1;
          return Ok(s);
        },
        b'\\' => {
          self.pos += 1;
          let escaped = *self.bytes.get(self.pos)
            .ok_or_else(|| malformed(at, "unterminated string".to_string()))?;
          match escaped {
            b'n'  => s.push('\n'),
            b't'  => s.push('\t'),
            b'r'  => s.push('\r'),
            b'"'  => s.push('"'),
            b'\\' => s.push('\\'),
            other => s.push(other as char)
          }
          self.pos += 1;
        },
        _ => {
          // Consume one UTF-8 scalar, not one byte.
          let rest = std::str::from_utf8(&self.bytes[self.pos ..])
            .map_err(|_| malformed(at, "string is not valid UTF-8".to_string()))?;
          let c = rest.chars().next()
            .ok_or_else(|| malformed(at, "unterminated string".to_string()))?;
          s.push(c);
          self.pos += c.len_utf8();
        }
      }
    }
    Err(malformed(at, "unterminated string".to_string()))
  }

  fn bare_string(&mut self, at: usize) -> Result<String> {
    let start = self.pos;
    while self.pos < self.bytes.len() {
      let b = self.bytes[self.pos];
      if b.is_ascii_whitespace() || b"{}();,=\"".contains(&b) {
        break;
      }
      if b == b'/' && matches!(self.bytes.get(self.pos + 1), Some(b'*') | Some(b'/')) {
        break;
      }
      self.pos += 1;
    }
    if self.pos == start {
      return Err(malformed(at, format!("unexpected character `{}`", self.bytes[at] as char)));
    }
    std::str::from_utf8(&self.bytes[start .. self.pos])
      .map(str::to_string)
      .map_err(|_| malformed(at, "string is not valid UTF-8".to_string()))
  }
}

struct Parser<'a> {
  lexer:  Lexer<'a>,
  peeked: Option<Option<(usize, Tok)>>
}

impl<'a> Parser<'a> {
  fn new(input: &'a str) -> Self {
    Parser {
      lexer:  Lexer { bytes: input.as_bytes(), pos: 0 },
      peeked: None
    }
  }

  fn next(&mut self) -> Result<Option<(usize, Tok)>> {
    match self.peeked.take() {
      Some(t) => Ok(t),
      None    => self.lexer.next_token()
    }
  }

  /// Next token that is not a comment. Comments are only meaningful directly
  /// after a string value, where `parse_value` picks them up itself.
  fn next_skipping_comments(&mut self) -> Result<Option<(usize, Tok)>> {
    loop {
      match self.next()? {
        Some((_, Tok::Comment(_))) => continue,
        other                      => return Ok(other)
      }
    }
  }

  fn parse_value(&mut self, at: usize, tok: Tok) -> Result<Value> {
    match tok {
      Tok::LBrace => Ok(Value::Dict(self.parse_dict()?)),
      Tok::LParen => Ok(Value::Array(self.parse_array()?)),
      Tok::Str(s) => {
        let comment = self.take_trailing_comment()?;
        Ok(Value::String(CommentedString { string: s, comment }))
      },
      other => Err(malformed(at, format!("expected a value, found {}", other.describe())))
    }
  }

  fn take_trailing_comment(&mut self) -> Result<Option<String>> {
    match self.next()? {
      Some((_, Tok::Comment(c))) => Ok(Some(c)),
      other                      => {
        self.peeked = Some(other);
        Ok(None)
      }
    }
  }

  /// The opening `{` has already been consumed.
  fn parse_dict(&mut self) -> Result<Dict> {
    let mut dict = Dict::new();
    loop {
      let (at, tok) = match self.next_skipping_comments()? {
        Some(t) => t,
        None    => return Err(malformed(self.lexer.pos, "unterminated dictionary".to_string()))
      };
      let key = match tok {
        Tok::RBrace => return Ok(dict),
        Tok::Str(s) => s,
        other       => return Err(malformed(at, format!("expected a key, found {}", other.describe())))
      };

      match self.next_skipping_comments()? {
        Some((_, Tok::Eq)) => {},
        Some((at, tok))    => return Err(malformed(at, format!("expected `=`, found {}", tok.describe()))),
        None               => return Err(malformed(self.lexer.pos, "unterminated dictionary".to_string()))
      }

      let value = match self.next_skipping_comments()? {
        Some((at, tok)) => self.parse_value(at, tok)?,
        None            => return Err(malformed(self.lexer.pos, "unterminated dictionary".to_string()))
      };
      dict.insert(key, value);

      match self.next_skipping_comments()? {
        Some((_, Tok::Semi)) => {},
        Some((at, tok))      => return Err(malformed(at, format!("expected `;`, found {}", tok.describe()))),
        None                 => return Err(malformed(self.lexer.pos, "unterminated dictionary".to_string()))
      }
    }
  }

  /// The opening `(` has already been consumed.
  fn parse_array(&mut self) -> Result<Vec<Value>> {
    let mut array = Vec::new();
    loop {
      let (at, tok) = match self.next_skipping_comments()? {
        Some(t) => t,
        None    => return Err(malformed(self.lexer.pos, "unterminated array".to_string()))
      };
      if let Tok::RParen = tok {
        return Ok(array);
      }
      array.push(self.parse_value(at, tok)?);

      match self.next_skipping_comments()? {
        Some((_, Tok::Comma))  => {},
        Some((_, Tok::RParen)) => return Ok(array), // trailing comma is conventional, not required
        Some((at, tok))        => return Err(malformed(at, format!("expected `,`, found {}", tok.describe()))),
        None                   => return Err(malformed(self.lexer.pos, "unterminated array".to_string()))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_nested_values() {
    let root = parse(concat!("// !$*UTF8*$!\n",
                             "{\n",
                             "\tarchiveVersion = 1;\n",
                             "\tclasses = {\n",
                             "\t};\n",
                             "\tlist = (\n",
                             "\t\ta,\n",
                             "\t\t\"b c\",\n",
                             "\t);\n",
                             "}\n")).unwrap();
    assert_eq!(root["archiveVersion"].as_str(), Some("1"));
    assert_eq!(root["classes"].as_dict().unwrap().len(), 0);
    let list = root["list"].as_array().unwrap();
    assert_eq!(list[0].as_str(), Some("a"));
    assert_eq!(list[1].as_str(), Some("b c"));
  }

  #[test]
  fn attaches_trailing_comments_to_strings() {
    let root = parse("{ rootObject = 97C146E61CF9000F007C117D /* Project object */; }").unwrap();
    match &root["rootObject"] {
      Value::String(s) => {
        assert_eq!(s.string, "97C146E61CF9000F007C117D");
        assert_eq!(s.comment.as_deref(), Some("Project object"));
      },
      other => panic!("expected a string, got {:?}", other)
    }
  }

  #[test]
  fn unescapes_quoted_strings() {
    let root = parse(r#"{ script = "echo \"hi\"\n\tdone\\"; }"#).unwrap();
    assert_eq!(root["script"].as_str(), Some("echo \"hi\"\n\tdone\\"));
  }

  #[test]
  fn single_line_objects_parse() {
    let root = parse("{ A = {isa = PBXBuildFile; fileRef = B /* main.c */; }; }").unwrap();
    let a = root["A"].as_dict().unwrap();
    assert_eq!(a["isa"].as_str(), Some("PBXBuildFile"));
  }

  #[test]
  fn rejects_unterminated_quote() {
    match parse("{ a = \"oops; }") {
      Err(crate::err::Error::Malformed { .. }) => {},
      other => panic!("expected Malformed, got {:?}", other.map(|_| ()))
    }
  }

  #[test]
  fn rejects_unbalanced_braces() {
    assert!(parse("{ a = { b = c; }; ").is_err());
    assert!(parse("(1, 2)").is_err()); // root must be a dictionary
  }

  #[test]
  fn rejects_trailing_garbage() {
    assert!(parse("{ a = b; } extra").is_err());
  }
}
