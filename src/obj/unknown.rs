//! Verbatim passthrough for object kinds this crate does not model.

use crate::plist::{Dict, Value};

/// An object with an unrecognized `isa`. Its fields are carried exactly as
/// parsed, trailing comments included, so a document written by a newer
/// Xcode round-trips without loss. The fields are opaque: nothing inside
/// them is treated as a reference, and deterministic identifier generation
/// leaves such objects on their original identifiers.
#[derive(Clone, Debug, PartialEq)]
pub struct UnknownObject {
  pub isa:    String,
  pub fields: Dict
}

impl UnknownObject {
  pub(crate) fn capture(isa: &str, dict: &Dict) -> Self {
    let fields = dict.iter()
      .filter(|(key, _)| key.as_str() != "isa")
      .map(|(key, value)| (key.clone(), value.clone()))
      .collect();
    UnknownObject { isa: isa.to_string(), fields }
  }

  pub(crate) fn encode(&self) -> Dict {
    let mut d = Dict::new();
    d.insert("isa".to_string(), Value::string(self.isa.clone()));
    d.extend(self.fields.clone());
    d
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::plist::parse;

  #[test]
  fn fields_survive_verbatim_with_comments() {
    let dict = parse(concat!(
      "{ isa = PBXBuildRule; compilerSpec = com.apple.compilers.proxy.script; ",
      "fileRef = 97C146F11CF9000F007C117D /* lexer.l */; }")).unwrap();
    let o = UnknownObject::capture("PBXBuildRule", &dict);
    let out = o.encode();
    assert_eq!(out["isa"].as_str(), Some("PBXBuildRule"));
    match &out["fileRef"] {
      Value::String(s) => assert_eq!(s.comment.as_deref(), Some("lexer.l")),
      other => panic!("expected a string, got {:?}", other)
    }
  }
}
