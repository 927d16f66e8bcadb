//! Build phases. Every phase kind shares the same core shape (an ordered
//! list of build files plus two bookkeeping scalars); the copy-files and
//! shell-script kinds carry extra fields on top.

use crate::err::Result;
use crate::id::Id;
use crate::plist::{Dict, Value};
use crate::store::{DecodeContext, Ref, Store};

use super::file::opt_entry;
use super::{isa_value, opt_str, ref_list, refs_value, str_list, strings_value, Comments,
            PBXBuildFile};

pub(crate) const DEFAULT_BUILD_ACTION_MASK: &str = "2147483647";

/// Fields common to every build phase.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildPhaseData {
  pub files:             Vec<Ref<PBXBuildFile>>,
  pub build_action_mask: String,
  /// "1" restricts the phase to install builds.
  pub run_only_for_deployment_postprocessing: String
}

impl Default for BuildPhaseData {
  fn default() -> Self {
    BuildPhaseData {
      files:             Vec::new(),
      build_action_mask: DEFAULT_BUILD_ACTION_MASK.to_string(),
      run_only_for_deployment_postprocessing: "0".to_string()
    }
  }
}

impl BuildPhaseData {
  fn decode(dict: &Dict, ctx: &mut DecodeContext) -> Self {
    BuildPhaseData {
      files:             ref_list(dict, "files", ctx),
      build_action_mask: opt_str(dict, "buildActionMask")
        .unwrap_or_else(|| DEFAULT_BUILD_ACTION_MASK.to_string()),
      run_only_for_deployment_postprocessing:
        opt_str(dict, "runOnlyForDeploymentPostprocessing").unwrap_or_else(|| "0".to_string())
    }
  }

  fn encode_into(&self, isa: &str, store: &Store, comments: &Comments) -> Dict {
    let mut d = Dict::new();
    d.extend([isa_value(isa)]);
    d.insert("buildActionMask".to_string(), Value::string(self.build_action_mask.clone()));
    d.insert("files".to_string(), refs_value(store, comments, &self.files));
    d.insert("runOnlyForDeploymentPostprocessing".to_string(),
             Value::string(self.run_only_for_deployment_postprocessing.clone()));
    d
  }

  fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
    for file in &self.files {
      f(file.id());
    }
  }

  fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
    for file in &mut self.files {
      f(file.id_mut());
    }
  }
}

macro_rules! plain_phase {
  ($(#[$doc:meta])* $ty:ident, $isa:literal) => {
    $(#[$doc])*
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct $ty {
      pub data: BuildPhaseData
    }

    impl $ty {
      pub(crate) fn decode(_id: &str, dict: &Dict, ctx: &mut DecodeContext) -> Result<Self> {
        Ok($ty { data: BuildPhaseData::decode(dict, ctx) })
      }

      pub(crate) fn encode(&self, store: &Store, comments: &Comments) -> Dict {
        self.data.encode_into($isa, store, comments)
      }

      pub(crate) fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
        self.data.visit_refs(f);
      }

      pub(crate) fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
        self.data.visit_refs_mut(f);
      }
    }
  }
}

plain_phase! {
  /// Compiles the listed sources.
  PBXSourcesBuildPhase, "PBXSourcesBuildPhase"
}
plain_phase! {
  /// Links the listed frameworks and libraries.
  PBXFrameworksBuildPhase, "PBXFrameworksBuildPhase"
}
plain_phase! {
  /// Copies the listed resources into the product bundle.
  PBXResourcesBuildPhase, "PBXResourcesBuildPhase"
}
plain_phase! {
  /// Installs the listed headers.
  PBXHeadersBuildPhase, "PBXHeadersBuildPhase"
}

/// Copies files to an arbitrary destination inside the product.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PBXCopyFilesBuildPhase {
  pub data:               BuildPhaseData,
  pub dst_path:           Option<String>,
  pub dst_subfolder_spec: Option<String>,
  pub name:               Option<String>
}

impl PBXCopyFilesBuildPhase {
  pub(crate) fn decode(_id: &str, dict: &Dict, ctx: &mut DecodeContext) -> Result<Self> {
    Ok(PBXCopyFilesBuildPhase {
      data:               BuildPhaseData::decode(dict, ctx),
      dst_path:           opt_str(dict, "dstPath"),
      dst_subfolder_spec: opt_str(dict, "dstSubfolderSpec"),
      name:               opt_str(dict, "name")
    })
  }

  pub(crate) fn encode(&self, store: &Store, comments: &Comments) -> Dict {
    let mut d = self.data.encode_into("PBXCopyFilesBuildPhase", store, comments);
    opt_entry(&mut d, "dstPath", &self.dst_path);
    opt_entry(&mut d, "dstSubfolderSpec", &self.dst_subfolder_spec);
    opt_entry(&mut d, "name", &self.name);
    d
  }

  pub(crate) fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
    self.data.visit_refs(f);
  }

  pub(crate) fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
    self.data.visit_refs_mut(f);
  }
}

/// Runs a shell script during the build.
#[derive(Clone, Debug, PartialEq)]
pub struct PBXShellScriptBuildPhase {
  pub data:                 BuildPhaseData,
  pub name:                 Option<String>,
  pub input_paths:          Vec<String>,
  pub output_paths:         Vec<String>,
  pub shell_path:           String,
  pub shell_script:         Option<String>,
  pub show_env_vars_in_log: Option<String>
}

impl Default for PBXShellScriptBuildPhase {
  fn default() -> Self {
    PBXShellScriptBuildPhase {
      data:                 BuildPhaseData::default(),
      name:                 None,
      input_paths:          Vec::new(),
      output_paths:         Vec::new(),
      shell_path:           "/bin/sh".to_string(),
      shell_script:         None,
      show_env_vars_in_log: None
    }
  }
}

impl PBXShellScriptBuildPhase {
  pub(crate) fn decode(_id: &str, dict: &Dict, ctx: &mut DecodeContext) -> Result<Self> {
    Ok(PBXShellScriptBuildPhase {
      data:                 BuildPhaseData::decode(dict, ctx),
      name:                 opt_str(dict, "name"),
      input_paths:          str_list(dict, "inputPaths"),
      output_paths:         str_list(dict, "outputPaths"),
      shell_path:           opt_str(dict, "shellPath").unwrap_or_else(|| "/bin/sh".to_string()),
      shell_script:         opt_str(dict, "shellScript"),
      show_env_vars_in_log: opt_str(dict, "showEnvVarsInLog")
    })
  }

  pub(crate) fn encode(&self, store: &Store, comments: &Comments) -> Dict {
    let mut d = self.data.encode_into("PBXShellScriptBuildPhase", store, comments);
    opt_entry(&mut d, "name", &self.name);
    d.insert("inputPaths".to_string(), strings_value(&self.input_paths));
    d.insert("outputPaths".to_string(), strings_value(&self.output_paths));
    d.insert("shellPath".to_string(), Value::string(self.shell_path.clone()));
    opt_entry(&mut d, "shellScript", &self.shell_script);
    opt_entry(&mut d, "showEnvVarsInLog", &self.show_env_vars_in_log);
    d
  }

  pub(crate) fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
    self.data.visit_refs(f);
  }

  pub(crate) fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
    self.data.visit_refs_mut(f);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::plist::parse;

  #[test]
  fn defaults_fill_in_missing_bookkeeping_fields() {
    let dict = parse("{ isa = PBXSourcesBuildPhase; files = (); }").unwrap();
    let mut ctx = DecodeContext::new();
    let p = PBXSourcesBuildPhase::decode("AA", &dict, &mut ctx).unwrap();
    assert_eq!(p.data.build_action_mask, DEFAULT_BUILD_ACTION_MASK);
    assert_eq!(p.data.run_only_for_deployment_postprocessing, "0");

    let out = p.encode(&Store::new(), &Comments::default());
    assert_eq!(out["buildActionMask"].as_str(), Some(DEFAULT_BUILD_ACTION_MASK));
    assert_eq!(out["files"].as_array().unwrap().len(), 0);
  }

  #[test]
  fn shell_script_phase_keeps_script_and_paths() {
    let dict = parse(concat!(
      "{ isa = PBXShellScriptBuildPhase; name = \"Run Script\"; ",
      "inputPaths = ( \"$(SRCROOT)/in.txt\", ); outputPaths = (); ",
      "shellPath = /bin/sh; shellScript = \"echo done\\n\"; }")).unwrap();
    let mut ctx = DecodeContext::new();
    let p = PBXShellScriptBuildPhase::decode("AA", &dict, &mut ctx).unwrap();
    assert_eq!(p.name.as_deref(), Some("Run Script"));
    assert_eq!(p.input_paths, vec!["$(SRCROOT)/in.txt".to_string()]);
    assert_eq!(p.shell_script.as_deref(), Some("echo done\n"));
  }
}
