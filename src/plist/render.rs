//! Renderer for the ASCII plist grammar.
//!
//! Layout mirrors what Xcode itself writes: tab indentation, `isa` first and
//! the remaining dictionary keys in alphabetical order, one array element per
//! line with a trailing comma, and `/* */` comments after reference values.
//! Staying byte-compatible with Xcode's own output keeps diffs reviewable
//! when a project file is edited from both sides.

use std::borrow::Cow;

use super::{CommentedString, Value};

/// Quotes a string only when it contains characters outside the bare set
/// accepted by the format. Empty strings and boolean spellings follow the
/// same conventions Xcode applies on save.
pub fn quoted(s: &str) -> Cow<'_, str> {
  match s {
    ""      => return Cow::Borrowed("\"\""),
    "true"  => return Cow::Borrowed("YES"),
    "false" => return Cow::Borrowed("NO"),
    _       => {}
  }

  let bare = |c: char| matches!(c, '_' | '$' | '.'..='9' | 'A'..='Z' | 'a'..='z');
  if s.chars().all(bare) {
    if !s.contains('_') && !s.contains('/') {
      return Cow::Borrowed(s);
    }
    // `//` opens a comment and `___` trips Xcode's own parser; both force quotes.
    if !s.contains("//") && !s.contains("___") {
      return Cow::Borrowed(s);
    }
  }

  let mut escaped = String::with_capacity(s.len() + 2);
  escaped.push('"');
  for c in s.chars() {
    match c {
      '\\' => escaped.push_str("\\\\"),
      '"'  => escaped.push_str("\\\""),
      '\t' => escaped.push_str("\\t"),
      '\n' => escaped.push_str("\\n"),
      _    => escaped.push(c)
    }
  }
  escaped.push('"');
  Cow::Owned(escaped)
}

/// Low-level plist writer. The document-level layout (sections, top-level
/// key order) is driven by the caller; this type owns indentation, quoting
/// and the canonical ordering of dictionary keys.
pub struct Renderer {
  out:       String,
  indent:    usize,
  multiline: bool
}

impl Default for Renderer {
  fn default() -> Self {
    Renderer::new()
  }
}

impl Renderer {
  pub fn new() -> Self {
    Renderer { out: String::new(), indent: 0, multiline: true }
  }

  pub fn finish(self) -> String {
    self.out
  }

  pub fn header(&mut self) {
    self.out.push_str("// !$*UTF8*$!");
    self.newline();
  }

  pub fn raw(&mut self, s: &str) {
    self.out.push_str(s);
  }

  pub fn newline(&mut self) {
    if self.multiline {
      self.out.push('\n');
    }
    else {
      self.out.push(' ');
    }
  }

  pub fn write_indent(&mut self) {
    if self.multiline {
      for _ in 0 .. self.indent {
        self.out.push('\t');
      }
    }
  }

  pub fn inc_indent(&mut self) {
    self.indent += 1;
  }

  pub fn dec_indent(&mut self) {
    self.indent -= 1;
  }

  pub fn begin_dict(&mut self) {
    self.out.push('{');
    if self.multiline {
      self.newline();
    }
    self.inc_indent();
  }

  pub fn end_dict(&mut self) {
    self.dec_indent();
    self.write_indent();
    self.out.push('}');
  }

  /// Writes `key = value;` on its own line. `multiline` false collapses the
  /// value to a single line, as Xcode does for build files and file
  /// references.
  pub fn entry(&mut self, key: &CommentedString, value: &Value, multiline: bool) {
    self.write_indent();
    let before = self.multiline;
    self.multiline = multiline;
    self.commented(key);
    self.out.push_str(" = ");
    self.value(value);
    self.out.push(';');
    self.multiline = before;
    self.newline();
  }

  pub fn value(&mut self, value: &Value) {
    match value {
      Value::String(s) => self.commented(s),
      Value::Array(a)  => self.array(a),
      Value::Dict(d)   => self.dict(d)
    }
  }

  fn commented(&mut self, s: &CommentedString) {
    let quoted = quoted(&s.string);
    self.out.push_str(&quoted);
    if let Some(comment) = &s.comment {
      self.out.push_str(" /* ");
      self.out.push_str(comment);
      self.out.push_str(" */");
    }
  }

  fn dict(&mut self, dict: &super::Dict) {
    self.begin_dict();

    let mut keys: Vec<&String> = dict.keys().collect();
    keys.sort_by(|a, b| {
      match (a.as_str() == "isa", b.as_str() == "isa") {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _             => a.cmp(b)
      }
    });

    let multiline = self.multiline;
    for key in keys {
      self.entry(&CommentedString::plain(key.clone()), &dict[key.as_str()], multiline);
    }

    self.end_dict();
  }

  fn array(&mut self, array: &[Value]) {
    self.out.push('(');
    if self.multiline {
      self.newline();
    }
    self.inc_indent();
    for element in array {
      self.write_indent();
      self.value(element);
      self.out.push(',');
      self.newline();
    }
    self.dec_indent();
    self.write_indent();
    self.out.push(')');
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::plist::{parse, Dict};

  #[test]
  fn quoting_rules() {
    assert_eq!(quoted("main.c"), "main.c");
    assert_eq!(quoted("path/to/file.c"), "path/to/file.c");
    assert_eq!(quoted("OTHER_LDFLAGS"), "OTHER_LDFLAGS");
    assert_eq!(quoted("$(inherited)"), "\"$(inherited)\"");
    assert_eq!(quoted("two words"), "\"two words\"");
    assert_eq!(quoted("dash-ed"), "\"dash-ed\"");
    assert_eq!(quoted(""), "\"\"");
    assert_eq!(quoted("true"), "YES");
    assert_eq!(quoted("false"), "NO");
    assert_eq!(quoted("a//b"), "\"a//b\"");
    assert_eq!(quoted("tri___ple"), "\"tri___ple\"");
    assert_eq!(quoted("say \"hi\""), "\"say \\\"hi\\\"\"");
    assert_eq!(quoted("line\nbreak"), "\"line\\nbreak\"");
  }

  #[test]
  fn dict_keys_render_isa_first_then_alphabetical() {
    let mut d = Dict::new();
    d.insert("zeta".to_string(), Value::string("1"));
    d.insert("isa".to_string(), Value::string("PBXGroup"));
    d.insert("alpha".to_string(), Value::string("2"));

    let mut r = Renderer::new();
    r.value(&Value::Dict(d));
    let out = r.finish();
    assert_eq!(out, "{\n\tisa = PBXGroup;\n\talpha = 2;\n\tzeta = 1;\n}");
  }

  #[test]
  fn single_line_dicts_collapse() {
    let mut d = Dict::new();
    d.insert("isa".to_string(), Value::string("PBXBuildFile"));
    d.insert("fileRef".to_string(),
             Value::String(CommentedString::commented("ABCDEF", "main.c")));

    let mut r = Renderer::new();
    r.entry(&CommentedString::commented("012345", "main.c in Sources"),
            &Value::Dict(d), false);
    assert_eq!(r.finish(),
               "012345 /* main.c in Sources */ = {isa = PBXBuildFile; fileRef = ABCDEF /* main.c */; };\n");
  }

  #[test]
  fn arrays_render_one_element_per_line() {
    let v = Value::Array(vec![Value::string("en"), Value::string("Base")]);
    let mut r = Renderer::new();
    r.value(&v);
    assert_eq!(r.finish(), "(\n\ten,\n\tBase,\n)");
  }

  #[test]
  fn rendered_text_reparses() {
    let mut d = Dict::new();
    d.insert("name".to_string(), Value::string("App (iOS)"));
    d.insert("empty".to_string(), Value::Dict(Dict::new()));
    d.insert("list".to_string(), Value::Array(vec![Value::string("a b")]));

    let mut r = Renderer::new();
    r.begin_dict();
    let multiline = true;
    for (k, v) in &d {
      r.entry(&CommentedString::plain(k.clone()), v, multiline);
    }
    r.end_dict();
    r.newline();
    let text = r.finish();

    let back = parse(&text).unwrap();
    assert_eq!(back["name"].as_str(), Some("App (iOS)"));
    assert_eq!(back["empty"].as_dict().unwrap().len(), 0);
    assert_eq!(back["list"].as_array().unwrap()[0].as_str(), Some("a b"));
  }
}
