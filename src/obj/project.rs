//! The root object of every project document.

use indexmap::IndexMap;

use crate::err::Result;
use crate::id::Id;
use crate::plist::{Dict, Value};
use crate::store::{AnyRef, DecodeContext, Ref, Store};

use super::file::opt_entry;
use super::{isa_value, opt_dict, opt_ref, opt_str, ref_list, ref_value, refs_value, req_ref,
            str_list, strings_value, Comments, PBXGroup, XCConfigurationList};

#[derive(Clone, Debug, PartialEq)]
pub struct PBXProject {
  /// The project's name. Never serialized; it comes from the bundle
  /// directory name and only shows up in configuration-list comments.
  pub name: String,

  pub build_configuration_list: Ref<XCConfigurationList>,
  pub compatibility_version:    Option<String>,
  pub development_region:       Option<String>,
  pub has_scanned_for_encodings: Option<String>,
  pub known_regions:            Vec<String>,
  pub main_group:               Ref<PBXGroup>,
  pub product_ref_group:        Option<Ref<PBXGroup>>,
  pub project_dir_path:         String,
  pub project_root:             String,
  /// For each referenced project, a dictionary of role name (`ProjectRef`,
  /// `ProductGroup`) to object.
  pub project_references:       Vec<IndexMap<String, AnyRef>>,
  pub targets:                  Vec<AnyRef>,
  /// Free-form project attributes, minus `TargetAttributes`.
  pub attributes:               Dict,
  /// Per-target attribute dictionaries, keyed by target.
  pub target_attributes:        Vec<(AnyRef, Dict)>,
  pub package_references:       Vec<AnyRef>
}

impl PBXProject {
  pub fn new<S: Into<String>>(name: S, build_configuration_list: Ref<XCConfigurationList>,
                              main_group: Ref<PBXGroup>) -> Self {
    PBXProject {
      name: name.into(),
      build_configuration_list,
      compatibility_version: Some("Xcode 14.0".to_string()),
      development_region: Some("en".to_string()),
      has_scanned_for_encodings: Some("0".to_string()),
      known_regions: vec!["en".to_string(), "Base".to_string()],
      main_group,
      product_ref_group: None,
      project_dir_path: String::new(),
      project_root: String::new(),
      project_references: Vec::new(),
      targets: Vec::new(),
      attributes: Dict::new(),
      target_attributes: Vec::new(),
      package_references: Vec::new()
    }
  }

  pub(crate) fn decode(id: &str, dict: &Dict, ctx: &mut DecodeContext) -> Result<Self> {
    let mut attributes = Dict::new();
    let mut target_attributes = Vec::new();
    if let Some(raw) = opt_dict(dict, "attributes") {
      for (key, value) in raw {
        match (key.as_str(), &value) {
          ("TargetAttributes", Value::Dict(per_target)) => {
            for (target_id, attrs) in per_target {
              let attrs = attrs.as_dict().cloned().unwrap_or_default();
              target_attributes.push((ctx.reference(target_id), attrs));
            }
          },
          _ => {
            attributes.insert(key, value);
          }
        }
      }
    }

    let mut project_references = Vec::new();
    if let Some(Value::Array(items)) = dict.get("projectReferences") {
      for item in items {
        if let Value::Dict(roles) = item {
          let mut entry = IndexMap::new();
          for (role, value) in roles {
            if let Some(s) = value.as_str() {
              entry.insert(role.clone(), ctx.reference(s));
            }
          }
          project_references.push(entry);
        }
      }
    }

    Ok(PBXProject {
      name: String::new(),
      build_configuration_list: req_ref(id, dict, "buildConfigurationList", ctx)?,
      compatibility_version:    opt_str(dict, "compatibilityVersion"),
      development_region:       opt_str(dict, "developmentRegion"),
      has_scanned_for_encodings: opt_str(dict, "hasScannedForEncodings"),
      known_regions:            str_list(dict, "knownRegions"),
      main_group:               req_ref(id, dict, "mainGroup", ctx)?,
      product_ref_group:        opt_ref(dict, "productRefGroup", ctx),
      project_dir_path:         opt_str(dict, "projectDirPath").unwrap_or_default(),
      project_root:             opt_str(dict, "projectRoot").unwrap_or_default(),
      project_references,
      targets:                  ref_list(dict, "targets", ctx),
      attributes,
      target_attributes,
      package_references:       ref_list(dict, "packageReferences", ctx)
    })
  }

  pub(crate) fn encode(&self, store: &Store, comments: &Comments) -> Dict {
    let mut d = Dict::new();
    d.extend([isa_value("PBXProject")]);

    if !self.attributes.is_empty() || !self.target_attributes.is_empty() {
      let mut attributes = self.attributes.clone();
      if !self.target_attributes.is_empty() {
        let mut per_target = Dict::new();
        for (target, attrs) in &self.target_attributes {
          per_target.insert(target.id().value().to_string(), Value::Dict(attrs.clone()));
        }
        attributes.insert("TargetAttributes".to_string(), Value::Dict(per_target));
      }
      d.insert("attributes".to_string(), Value::Dict(attributes));
    }

    d.insert("buildConfigurationList".to_string(),
             ref_value(store, comments, self.build_configuration_list.id()));
    opt_entry(&mut d, "compatibilityVersion", &self.compatibility_version);
    opt_entry(&mut d, "developmentRegion", &self.development_region);
    opt_entry(&mut d, "hasScannedForEncodings", &self.has_scanned_for_encodings);
    if !self.known_regions.is_empty() {
      d.insert("knownRegions".to_string(), strings_value(&self.known_regions));
    }
    d.insert("mainGroup".to_string(), ref_value(store, comments, self.main_group.id()));
    if !self.package_references.is_empty() {
      d.insert("packageReferences".to_string(),
               refs_value(store, comments, &self.package_references));
    }
    if let Some(products) = &self.product_ref_group {
      d.insert("productRefGroup".to_string(), ref_value(store, comments, products.id()));
    }
    d.insert("projectDirPath".to_string(), Value::string(self.project_dir_path.clone()));
    if !self.project_references.is_empty() {
      let items = self.project_references.iter()
        .map(|roles| {
          Value::Dict(roles.iter()
            .map(|(role, r)| (role.clone(), ref_value(store, comments, r.id())))
            .collect())
        })
        .collect();
      d.insert("projectReferences".to_string(), Value::Array(items));
    }
    d.insert("projectRoot".to_string(), Value::string(self.project_root.clone()));
    d.insert("targets".to_string(), refs_value(store, comments, &self.targets));
    d
  }

  pub(crate) fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
    f(self.build_configuration_list.id());
    f(self.main_group.id());
    if let Some(r) = &self.product_ref_group {
      f(r.id());
    }
    for r in &self.targets {
      f(r.id());
    }
    for r in &self.package_references {
      f(r.id());
    }
    for roles in &self.project_references {
      for r in roles.values() {
        f(r.id());
      }
    }
    for (target, _) in &self.target_attributes {
      f(target.id());
    }
  }

  pub(crate) fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
    f(self.build_configuration_list.id_mut());
    f(self.main_group.id_mut());
    if let Some(r) = &mut self.product_ref_group {
      f(r.id_mut());
    }
    for r in &mut self.targets {
      f(r.id_mut());
    }
    for r in &mut self.package_references {
      f(r.id_mut());
    }
    for roles in &mut self.project_references {
      for r in roles.values_mut() {
        f(r.id_mut());
      }
    }
    for (target, _) in &mut self.target_attributes {
      f(target.id_mut());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::plist::parse;

  #[test]
  fn target_attributes_are_split_out_and_rebuilt() {
    let dict = parse(concat!(
      "{ isa = PBXProject; ",
      "attributes = { LastUpgradeCheck = 1500; TargetAttributes = { ",
      "97C146ED1CF9000F007C117D = { CreatedOnToolsVersion = 15.0; }; }; }; ",
      "buildConfigurationList = 97C146E91CF9000F007C117D; ",
      "mainGroup = 97C146E51CF9000F007C117D; ",
      "projectDirPath = \"\"; projectRoot = \"\"; ",
      "targets = ( 97C146ED1CF9000F007C117D, ); }")).unwrap();

    let mut ctx = DecodeContext::new();
    let p = PBXProject::decode("AA", &dict, &mut ctx).unwrap();
    assert_eq!(p.attributes["LastUpgradeCheck"].as_str(), Some("1500"));
    assert!(p.attributes.get("TargetAttributes").is_none());
    assert_eq!(p.target_attributes.len(), 1);
    assert_eq!(p.target_attributes[0].0.id().value(), "97C146ED1CF9000F007C117D");

    let out = p.encode(&Store::new(), &Comments::default());
    let attrs = out["attributes"].as_dict().unwrap();
    let per_target = attrs["TargetAttributes"].as_dict().unwrap();
    assert!(per_target.get("97C146ED1CF9000F007C117D").is_some());
  }

  #[test]
  fn missing_main_group_is_an_error() {
    let dict = parse(concat!(
      "{ isa = PBXProject; buildConfigurationList = 97C146E91CF9000F007C117D; ",
      "targets = (); }")).unwrap();
    let mut ctx = DecodeContext::new();
    match PBXProject::decode("AA", &dict, &mut ctx) {
      Err(crate::err::Error::MissingField { field: "mainGroup", .. }) => {},
      other => panic!("expected MissingField, got {:?}", other)
    }
  }
}
