//! The `contents.xcworkspacedata` sidecar inside a project bundle.
//!
//! The document is a small fixed-shape XML file listing file references by
//! location string. Only the shapes Xcode itself writes are handled.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::err::{Error, Result};

/// A workspace location string, `scheme:path`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkspaceLocation {
  /// `absolute:` an absolute file system path.
  Absolute(String),
  /// `container:` relative to the workspace's container.
  Container(String),
  /// `developer:` relative to the developer directory.
  Developer(String),
  /// `group:` relative to the enclosing group.
  Group(String),
  /// `self:` the project document itself.
  Current(String),
  /// Any scheme this crate does not know, carried as scheme and path.
  Other(String, String)
}

impl FromStr for WorkspaceLocation {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let (scheme, path) = s.split_once(':')
      .ok_or_else(|| Error::InvalidPath(format!("workspace location without a scheme: {}", s)))?;
    let path = path.to_string();
    Ok(match scheme {
      "absolute"  => WorkspaceLocation::Absolute(path),
      "container" => WorkspaceLocation::Container(path),
      "developer" => WorkspaceLocation::Developer(path),
      "group"     => WorkspaceLocation::Group(path),
      "self"      => WorkspaceLocation::Current(path),
      other       => WorkspaceLocation::Other(other.to_string(), path)
    })
  }
}

impl fmt::Display for WorkspaceLocation {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      WorkspaceLocation::Absolute(p)     => write!(f, "absolute:{}", p),
      WorkspaceLocation::Container(p)    => write!(f, "container:{}", p),
      WorkspaceLocation::Developer(p)    => write!(f, "developer:{}", p),
      WorkspaceLocation::Group(p)        => write!(f, "group:{}", p),
      WorkspaceLocation::Current(p)      => write!(f, "self:{}", p),
      WorkspaceLocation::Other(s, p)     => write!(f, "{}:{}", s, p)
    }
  }
}

/// The file references of one workspace document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XCWorkspaceData {
  pub refs: Vec<WorkspaceLocation>
}

impl Default for XCWorkspaceData {
  /// The workspace Xcode generates for a standalone project: a single
  /// reference to the project itself.
  fn default() -> Self {
    XCWorkspaceData { refs: vec![WorkspaceLocation::Current(String::new())] }
  }
}

impl XCWorkspaceData {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<XCWorkspaceData> {
    let path = path.as_ref();
    if !path.is_file() {
      return Err(Error::NotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    text.parse()
  }

  pub fn render(&self) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<Workspace\n   version = \"1.0\">\n");
    for location in &self.refs {
      out.push_str("   <FileRef\n      location = \"");
      out.push_str(&escape(&location.to_string()));
      out.push_str("\">\n   </FileRef>\n");
    }
    out.push_str("</Workspace>\n");
    out
  }

  /// Conditional write with the same contract as the project document:
  /// identical bytes are left alone, differing files are only replaced when
  /// `overwrite` is set.
  pub fn write<P: AsRef<Path>>(&self, path: P, overwrite: bool) -> Result<bool> {
    let path = path.as_ref();
    let rendered = self.render();
    if path.exists() {
      let existing = fs::read_to_string(path)?;
      if existing == rendered {
        debug!(file = %path.display(), "workspace unchanged, skipping write");
        return Ok(false);
      }
      if !overwrite {
        return Ok(false);
      }
    }
    if let Some(dir) = path.parent() {
      if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)?;
      }
    }
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(rendered.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(true)
  }
}

impl FromStr for XCWorkspaceData {
  type Err = Error;

  fn from_str(text: &str) -> Result<Self> {
    let mut refs = Vec::new();
    let mut rest = text;
    while let Some(at) = rest.find("location") {
      rest = &rest[at + "location".len() ..];
      let quoted = match rest.trim_start().strip_prefix('=') {
        Some(after_eq) => match after_eq.trim_start().strip_prefix('"') {
          Some(quoted) => quoted,
          None         => continue
        },
        None => continue
      };
      let end = match quoted.find('"') {
        Some(end) => end,
        None      => {
          return Err(Error::Malformed {
            offset:  text.len() - quoted.len(),
            message: "unterminated location attribute".to_string()
          });
        }
      };
      refs.push(unescape(&quoted[.. end]).parse()?);
      rest = &quoted[end + 1 ..];
    }
    Ok(XCWorkspaceData { refs })
  }
}

fn escape(s: &str) -> String {
  s.replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
    .replace('"', "&quot;")
}

fn unescape(s: &str) -> String {
  s.replace("&lt;", "<")
    .replace("&gt;", ">")
    .replace("&quot;", "\"")
    .replace("&apos;", "'")
    .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn location_strings_round_trip() {
    for s in ["self:", "group:App", "container:Lib/Lib.xcodeproj",
              "absolute:/tmp/x", "developer:Tools", "weird:thing"] {
      let loc: WorkspaceLocation = s.parse().unwrap();
      assert_eq!(loc.to_string(), s);
    }
    assert!("noscheme".parse::<WorkspaceLocation>().is_err());
  }

  #[test]
  fn default_workspace_round_trips() {
    let ws = XCWorkspaceData::default();
    let text = ws.render();
    assert!(text.contains("location = \"self:\""));
    let back: XCWorkspaceData = text.parse().unwrap();
    assert_eq!(back, ws);
  }

  #[test]
  fn parses_the_format_xcode_writes() {
    let text = concat!(
      "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
      "<Workspace\n",
      "   version = \"1.0\">\n",
      "   <FileRef\n",
      "      location = \"group:App &amp; Tools\">\n",
      "   </FileRef>\n",
      "   <FileRef\n",
      "      location = \"container:Lib/Lib.xcodeproj\">\n",
      "   </FileRef>\n",
      "</Workspace>\n");
    let ws: XCWorkspaceData = text.parse().unwrap();
    assert_eq!(ws.refs, vec![
      WorkspaceLocation::Group("App & Tools".to_string()),
      WorkspaceLocation::Container("Lib/Lib.xcodeproj".to_string())
    ]);
  }
}
