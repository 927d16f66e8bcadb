//! Targets. All three kinds share the same core shape; the native kind adds
//! the produced artifact, the legacy kind wraps an external build tool.

use crate::err::Result;
use crate::id::Id;
use crate::plist::{Dict, Value};
use crate::store::{AnyRef, DecodeContext, Ref, Store};

use super::file::opt_entry;
use super::{isa_value, opt_ref, opt_str, ref_list, ref_value, refs_value, req_str, Comments,
            PBXFileReference, PBXTargetDependency, XCConfigurationList,
            XCSwiftPackageProductDependency};

/// Fields common to every target.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetData {
  pub build_configuration_list: Option<Ref<XCConfigurationList>>,
  pub build_phases:             Vec<AnyRef>,
  pub dependencies:             Vec<Ref<PBXTargetDependency>>,
  pub name:                     String,
  pub product_name:             Option<String>,
  pub package_product_dependencies: Vec<Ref<XCSwiftPackageProductDependency>>
}

impl TargetData {
  pub fn named<S: Into<String>>(name: S) -> Self {
    TargetData { name: name.into(), ..Default::default() }
  }

  fn decode(id: &str, dict: &Dict, ctx: &mut DecodeContext) -> Result<Self> {
    Ok(TargetData {
      build_configuration_list: opt_ref(dict, "buildConfigurationList", ctx),
      build_phases:             ref_list(dict, "buildPhases", ctx),
      dependencies:             ref_list(dict, "dependencies", ctx),
      name:                     req_str(id, dict, "name")?,
      product_name:             opt_str(dict, "productName"),
      package_product_dependencies: ref_list(dict, "packageProductDependencies", ctx)
    })
  }

  fn encode_into(&self, isa: &str, store: &Store, comments: &Comments) -> Dict {
    let mut d = Dict::new();
    d.extend([isa_value(isa)]);
    if let Some(list) = &self.build_configuration_list {
      d.insert("buildConfigurationList".to_string(), ref_value(store, comments, list.id()));
    }
    d.insert("buildPhases".to_string(), refs_value(store, comments, &self.build_phases));
    d.insert("dependencies".to_string(), refs_value(store, comments, &self.dependencies));
    d.insert("name".to_string(), Value::string(self.name.clone()));
    if !self.package_product_dependencies.is_empty() {
      d.insert("packageProductDependencies".to_string(),
               refs_value(store, comments, &self.package_product_dependencies));
    }
    opt_entry(&mut d, "productName", &self.product_name);
    d
  }

  fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
    if let Some(r) = &self.build_configuration_list {
      f(r.id());
    }
    for r in &self.build_phases {
      f(r.id());
    }
    for r in &self.dependencies {
      f(r.id());
    }
    for r in &self.package_product_dependencies {
      f(r.id());
    }
  }

  fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
    if let Some(r) = &mut self.build_configuration_list {
      f(r.id_mut());
    }
    for r in &mut self.build_phases {
      f(r.id_mut());
    }
    for r in &mut self.dependencies {
      f(r.id_mut());
    }
    for r in &mut self.package_product_dependencies {
      f(r.id_mut());
    }
  }
}

/// A target that produces an artifact (app, library, test bundle, ...).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PBXNativeTarget {
  pub data:              TargetData,
  pub build_rules:       Vec<AnyRef>,
  pub product_reference: Option<Ref<PBXFileReference>>,
  pub product_type:      Option<String>
}

impl PBXNativeTarget {
  pub(crate) fn decode(id: &str, dict: &Dict, ctx: &mut DecodeContext) -> Result<Self> {
    Ok(PBXNativeTarget {
      data:              TargetData::decode(id, dict, ctx)?,
      build_rules:       ref_list(dict, "buildRules", ctx),
      product_reference: opt_ref(dict, "productReference", ctx),
      product_type:      opt_str(dict, "productType")
    })
  }

  pub(crate) fn encode(&self, store: &Store, comments: &Comments) -> Dict {
    let mut d = self.data.encode_into("PBXNativeTarget", store, comments);
    d.insert("buildRules".to_string(), refs_value(store, comments, &self.build_rules));
    if let Some(product) = &self.product_reference {
      d.insert("productReference".to_string(), ref_value(store, comments, product.id()));
    }
    opt_entry(&mut d, "productType", &self.product_type);
    d
  }

  pub(crate) fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
    self.data.visit_refs(f);
    for r in &self.build_rules {
      f(r.id());
    }
    if let Some(r) = &self.product_reference {
      f(r.id());
    }
  }

  pub(crate) fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
    self.data.visit_refs_mut(f);
    for r in &mut self.build_rules {
      f(r.id_mut());
    }
    if let Some(r) = &mut self.product_reference {
      f(r.id_mut());
    }
  }
}

/// A target with no product of its own, used to group other targets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PBXAggregateTarget {
  pub data: TargetData
}

impl PBXAggregateTarget {
  pub(crate) fn decode(id: &str, dict: &Dict, ctx: &mut DecodeContext) -> Result<Self> {
    Ok(PBXAggregateTarget { data: TargetData::decode(id, dict, ctx)? })
  }

  pub(crate) fn encode(&self, store: &Store, comments: &Comments) -> Dict {
    self.data.encode_into("PBXAggregateTarget", store, comments)
  }

  pub(crate) fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
    self.data.visit_refs(f);
  }

  pub(crate) fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
    self.data.visit_refs_mut(f);
  }
}

/// A target driven by an external build tool such as make.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PBXLegacyTarget {
  pub data:                   TargetData,
  pub build_arguments_string: Option<String>,
  pub build_tool_path:        Option<String>,
  pub build_working_directory: Option<String>,
  pub pass_build_settings_in_environment: Option<String>
}

impl PBXLegacyTarget {
  pub(crate) fn decode(id: &str, dict: &Dict, ctx: &mut DecodeContext) -> Result<Self> {
    Ok(PBXLegacyTarget {
      data:                   TargetData::decode(id, dict, ctx)?,
      build_arguments_string: opt_str(dict, "buildArgumentsString"),
      build_tool_path:        opt_str(dict, "buildToolPath"),
      build_working_directory: opt_str(dict, "buildWorkingDirectory"),
      pass_build_settings_in_environment: opt_str(dict, "passBuildSettingsInEnvironment")
    })
  }

  pub(crate) fn encode(&self, store: &Store, comments: &Comments) -> Dict {
    let mut d = self.data.encode_into("PBXLegacyTarget", store, comments);
    opt_entry(&mut d, "buildArgumentsString", &self.build_arguments_string);
    opt_entry(&mut d, "buildToolPath", &self.build_tool_path);
    opt_entry(&mut d, "buildWorkingDirectory", &self.build_working_directory);
    opt_entry(&mut d, "passBuildSettingsInEnvironment",
              &self.pass_build_settings_in_environment);
    d
  }

  pub(crate) fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
    self.data.visit_refs(f);
  }

  pub(crate) fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
    self.data.visit_refs_mut(f);
  }
}
