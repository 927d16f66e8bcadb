//! The NeXTSTEP property list format used by `project.pbxproj`.
//!
//! The grammar provides the following data types:
//! - String:     "contents", or bare when no delimiters are needed
//! - Array:      ( element, ... )
//! - Dictionary: { key = value; ... }
//!
//! Comments of the form /* contents */ may trail any value. Xcode loads a
//! project fine without them, but regenerates them on every save; keeping
//! them limits version-control noise when a generated file is later edited
//! from Xcode, so this codec reproduces them too.
//!
//! `parse` turns text into an untyped [`Value`] tree, `render` is the exact
//! inverse. The renderer owns all layout decisions (key order, quoting,
//! indentation, section comments) so that re-rendering a parsed document is
//! a fixed point.

mod parse;
mod render;

pub use parse::parse;
pub use render::{quoted, Renderer};

use indexmap::IndexMap;

/// Dictionary of string keys to values, in insertion order. The renderer
/// re-orders keys canonically, so insertion order only matters for verbatim
/// passthrough of unrecognized objects.
pub type Dict = IndexMap<String, Value>;

/// A string scalar plus its optional trailing comment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentedString {
  pub string:  String,
  pub comment: Option<String>
}

impl CommentedString {
  pub fn plain<S: Into<String>>(string: S) -> Self {
    CommentedString { string: string.into(), comment: None }
  }

  pub fn commented<S: Into<String>, C: Into<String>>(string: S, comment: C) -> Self {
    CommentedString { string: string.into(), comment: Some(comment.into()) }
  }
}

/// An untyped plist value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
  String(CommentedString),
  Array(Vec<Value>),
  Dict(Dict)
}

impl Value {
  pub fn string<S: Into<String>>(s: S) -> Value {
    Value::String(CommentedString::plain(s))
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::String(s) => Some(&s.string),
      _                => None
    }
  }

  pub fn as_array(&self) -> Option<&[Value]> {
    match self {
      Value::Array(a) => Some(a),
      _               => None
    }
  }

  pub fn as_dict(&self) -> Option<&Dict> {
    match self {
      Value::Dict(d) => Some(d),
      _              => None
    }
  }
}

impl From<CommentedString> for Value {
  fn from(s: CommentedString) -> Value {
    Value::String(s)
  }
}
