//! File elements of the group tree, and the build-file wrapper that places
//! a file into a build phase.

use crate::err::Result;
use crate::id::Id;
use crate::plist::{Dict, Value};
use crate::store::{AnyRef, DecodeContext, Ref, Store};

use super::{isa_value, opt_dict, opt_ref, opt_str, ref_list, ref_value, refs_value,
            Comments, XCSwiftPackageProductDependency};

/// A reference to a file on disk. Leaf of the group tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PBXFileReference {
  pub explicit_file_type:   Option<String>,
  pub file_encoding:        Option<String>,
  pub include_in_index:     Option<String>,
  pub last_known_file_type: Option<String>,
  pub line_ending:          Option<String>,
  pub name:                 Option<String>,
  pub path:                 Option<String>,
  pub source_tree:          Option<String>
}

impl PBXFileReference {
  pub(crate) fn decode(_id: &str, dict: &Dict, _ctx: &mut DecodeContext) -> Result<Self> {
    Ok(PBXFileReference {
      explicit_file_type:   opt_str(dict, "explicitFileType"),
      file_encoding:        opt_str(dict, "fileEncoding"),
      include_in_index:     opt_str(dict, "includeInIndex"),
      last_known_file_type: opt_str(dict, "lastKnownFileType"),
      line_ending:          opt_str(dict, "lineEnding"),
      name:                 opt_str(dict, "name"),
      path:                 opt_str(dict, "path"),
      source_tree:          opt_str(dict, "sourceTree")
    })
  }

  pub(crate) fn encode(&self, _store: &Store, _comments: &Comments) -> Dict {
    let mut d = Dict::new();
    d.extend([isa_value("PBXFileReference")]);
    opt_entry(&mut d, "explicitFileType", &self.explicit_file_type);
    opt_entry(&mut d, "fileEncoding", &self.file_encoding);
    opt_entry(&mut d, "includeInIndex", &self.include_in_index);
    opt_entry(&mut d, "lastKnownFileType", &self.last_known_file_type);
    opt_entry(&mut d, "lineEnding", &self.line_ending);
    opt_entry(&mut d, "name", &self.name);
    opt_entry(&mut d, "path", &self.path);
    opt_entry(&mut d, "sourceTree", &self.source_tree);
    d
  }

  pub(crate) fn visit_refs(&self, _f: &mut dyn FnMut(&Id)) {}

  pub(crate) fn visit_refs_mut(&mut self, _f: &mut dyn FnMut(&mut Id)) {}
}

/// A named node of the group tree, holding file references and other groups.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PBXGroup {
  pub children:    Vec<AnyRef>,
  pub name:        Option<String>,
  pub path:        Option<String>,
  pub source_tree: Option<String>
}

impl PBXGroup {
  pub(crate) fn decode(_id: &str, dict: &Dict, ctx: &mut DecodeContext) -> Result<Self> {
    Ok(PBXGroup {
      children:    ref_list(dict, "children", ctx),
      name:        opt_str(dict, "name"),
      path:        opt_str(dict, "path"),
      source_tree: opt_str(dict, "sourceTree")
    })
  }

  pub(crate) fn encode(&self, store: &Store, comments: &Comments) -> Dict {
    group_dict("PBXGroup", &self.children, &self.name, &self.path, &self.source_tree,
               store, comments)
  }

  pub(crate) fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
    for child in &self.children {
      f(child.id());
    }
  }

  pub(crate) fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
    for child in &mut self.children {
      f(child.id_mut());
    }
  }
}

/// A group whose children are localized variants of a single resource.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PBXVariantGroup {
  pub children:    Vec<AnyRef>,
  pub name:        Option<String>,
  pub path:        Option<String>,
  pub source_tree: Option<String>
}

impl PBXVariantGroup {
  pub(crate) fn decode(_id: &str, dict: &Dict, ctx: &mut DecodeContext) -> Result<Self> {
    Ok(PBXVariantGroup {
      children:    ref_list(dict, "children", ctx),
      name:        opt_str(dict, "name"),
      path:        opt_str(dict, "path"),
      source_tree: opt_str(dict, "sourceTree")
    })
  }

  pub(crate) fn encode(&self, store: &Store, comments: &Comments) -> Dict {
    group_dict("PBXVariantGroup", &self.children, &self.name, &self.path, &self.source_tree,
               store, comments)
  }

  pub(crate) fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
    for child in &self.children {
      f(child.id());
    }
  }

  pub(crate) fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
    for child in &mut self.children {
      f(child.id_mut());
    }
  }
}

/// Membership of one file (or package product) in one build phase, with
/// optional per-file settings such as compiler flags.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PBXBuildFile {
  pub file_ref:    Option<AnyRef>,
  pub product_ref: Option<Ref<XCSwiftPackageProductDependency>>,
  pub settings:    Option<Dict>
}

impl PBXBuildFile {
  pub(crate) fn decode(_id: &str, dict: &Dict, ctx: &mut DecodeContext) -> Result<Self> {
    Ok(PBXBuildFile {
      file_ref:    opt_ref(dict, "fileRef", ctx),
      product_ref: opt_ref(dict, "productRef", ctx),
      settings:    opt_dict(dict, "settings")
    })
  }

  pub(crate) fn encode(&self, store: &Store, comments: &Comments) -> Dict {
    let mut d = Dict::new();
    d.extend([isa_value("PBXBuildFile")]);
    if let Some(file_ref) = &self.file_ref {
      d.insert("fileRef".to_string(), ref_value(store, comments, file_ref.id()));
    }
    if let Some(product_ref) = &self.product_ref {
      d.insert("productRef".to_string(), ref_value(store, comments, product_ref.id()));
    }
    if let Some(settings) = &self.settings {
      d.insert("settings".to_string(), Value::Dict(settings.clone()));
    }
    d
  }

  pub(crate) fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
    if let Some(r) = &self.file_ref {
      f(r.id());
    }
    if let Some(r) = &self.product_ref {
      f(r.id());
    }
  }

  pub(crate) fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
    if let Some(r) = &mut self.file_ref {
      f(r.id_mut());
    }
    if let Some(r) = &mut self.product_ref {
      f(r.id_mut());
    }
  }
}

fn group_dict(isa: &str, children: &[AnyRef], name: &Option<String>, path: &Option<String>,
              source_tree: &Option<String>, store: &Store, comments: &Comments) -> Dict {
  let mut d = Dict::new();
  d.extend([isa_value(isa)]);
  d.insert("children".to_string(), refs_value(store, comments, children));
  opt_entry(&mut d, "name", name);
  opt_entry(&mut d, "path", path);
  opt_entry(&mut d, "sourceTree", source_tree);
  d
}

pub(crate) fn opt_entry(d: &mut Dict, key: &str, value: &Option<String>) {
  if let Some(value) = value {
    d.insert(key.to_string(), Value::string(value.clone()));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::obj::erase;
  use crate::plist::parse;

  #[test]
  fn file_reference_round_trips_its_fields() {
    let dict = parse(concat!(
      "{ isa = PBXFileReference; lastKnownFileType = sourcecode.c.c; ",
      "path = main.c; sourceTree = \"<group>\"; }")).unwrap();
    let mut ctx = DecodeContext::new();
    let f = PBXFileReference::decode("AA", &dict, &mut ctx).unwrap();
    assert_eq!(f.path.as_deref(), Some("main.c"));
    assert_eq!(f.source_tree.as_deref(), Some("<group>"));

    let out = f.encode(&Store::new(), &Comments::default());
    assert_eq!(out["lastKnownFileType"].as_str(), Some("sourcecode.c.c"));
    assert!(out.get("name").is_none());
  }

  #[test]
  fn build_file_keeps_per_file_settings() {
    let dict = parse(concat!(
      "{ isa = PBXBuildFile; fileRef = 97C146F11CF9000F007C117D; ",
      "settings = { COMPILER_FLAGS = \"-Wall\"; }; }")).unwrap();
    let mut ctx = DecodeContext::new();
    let b = PBXBuildFile::decode("AA", &dict, &mut ctx).unwrap();
    let settings = b.settings.as_ref().unwrap();
    assert_eq!(settings["COMPILER_FLAGS"].as_str(), Some("-Wall"));

    let out = b.encode(&Store::new(), &Comments::default());
    assert_eq!(out["fileRef"].as_str(), Some("97C146F11CF9000F007C117D"));
  }

  #[test]
  fn group_children_are_visited() {
    let mut store = Store::new();
    let child = store.add(PBXFileReference::default());
    let group = PBXGroup { children: vec![erase(&child)], ..Default::default() };

    let mut seen = Vec::new();
    group.visit_refs(&mut |id| seen.push(id.clone()));
    assert_eq!(seen, vec![child.id().clone()]);
  }
}
