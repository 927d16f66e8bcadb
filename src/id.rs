//! Object identifiers.
//!
//! Xcode names every object in the project file with a 24-character uppercase
//! hexadecimal token. Objects created in memory receive a random *temporary*
//! identifier so other objects can refer to them right away; temporary
//! identifiers are replaced by deterministic permanent ones before writing
//! (see `refgen`) and must never reach the output.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

pub const ID_LEN: usize = 24;

#[derive(Clone, Debug)]
pub struct Id {
  value:     String,
  temporary: bool
}

impl Id {
  /// A permanent identifier, as read from disk or produced by `refgen`.
  pub fn new<S: Into<String>>(value: S) -> Self {
    Id { value: value.into(), temporary: false }
  }

  /// A fresh temporary identifier.
  pub fn temporary() -> Self {
    use rand::RngCore;
    let mut bytes = [0u8; ID_LEN / 2];
    rand::thread_rng().fill_bytes(&mut bytes);
    Id { value: hex::encode_upper(bytes), temporary: true }
  }

  pub fn value(&self) -> &str {
    &self.value
  }

  pub fn is_temporary(&self) -> bool {
    self.temporary
  }

  /// True when the string has the shape of an identifier token. Used to tell
  /// reference-valued strings apart from ordinary scalars.
  pub fn looks_like_id(s: &str) -> bool {
    s.len() == ID_LEN && s.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
  }
}

// Identity is the token value alone; the temporary flag never participates so
// a reference created before `refgen` runs still finds its object afterwards.
impl PartialEq for Id {
  fn eq(&self, other: &Self) -> bool {
    self.value == other.value
  }
}

impl Eq for Id {}

impl Hash for Id {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.value.hash(state);
  }
}

impl PartialOrd for Id {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Id {
  fn cmp(&self, other: &Self) -> Ordering {
    self.value.cmp(&other.value)
  }
}

impl fmt::Display for Id {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(&self.value)
  }
}
