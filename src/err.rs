//! Error kinds surfaced by the library.
//!
//! Every error carries enough context (path, identifier or field name) to be
//! reported to a user without re-parsing the offending file.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
  /// The project bundle, pbxproj file or workspace is absent.
  #[error("not found at {}", .0.display())]
  NotFound(PathBuf),

  /// The plist grammar was violated or the mandatory root structure is missing.
  #[error("malformed plist at byte {offset}: {message}")]
  Malformed { offset: usize, message: String },

  /// An object is missing a field its kind requires.
  #[error("object {id} is missing required field `{field}`")]
  MissingField { id: String, field: &'static str },

  /// A field holds a value of a type its key does not allow.
  #[error("object {id} has an unexpected value for `{field}`")]
  UnexpectedValue { id: String, field: &'static str },

  /// An object that must be concrete has an unrecognized type tag.
  #[error("object {id} has unsupported type `{isa}`")]
  UnexpectedIsa { id: String, isa: String },

  /// One or more references point at identifiers absent from the store.
  /// Detected before writing so a corrupt file is never emitted.
  #[error("unresolved references: {}", list_unresolved(.0))]
  UnresolvedReferences(Vec<Unresolved>),

  /// A lookup expected exactly one match and found several.
  #[error("multiple package references named `{0}`")]
  AmbiguousResolution(String),

  /// An absolute path was supplied where only a relative one is valid.
  #[error("expected a relative path, got `{0}`")]
  InvalidPath(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Pattern(#[from] glob::PatternError),
}

/// One dangling edge: the object holding the reference and the missing target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
  pub owner:      String,
  pub owner_isa:  String,
  pub target:     String
}

impl fmt::Display for Unresolved {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{} ({}) -> {}", self.owner, self.owner_isa, self.target)
  }
}

fn list_unresolved(refs: &[Unresolved]) -> String {
  refs.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ")
}
