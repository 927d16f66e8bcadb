//! Build configurations and the lists that group them per project or target.

use indexmap::IndexMap;

use crate::err::{Error, Result};
use crate::id::Id;
use crate::plist::{Dict, Value};
use crate::store::{DecodeContext, Ref, Store};

use super::file::opt_entry;
use super::{isa_value, opt_ref, opt_str, ref_list, ref_value, refs_value, req_str,
            strings_value, Comments, PBXFileReference};

/// One build setting value. The format has no map-valued settings; a setting
/// is either a single string or a list of strings.
#[derive(Clone, Debug, PartialEq)]
pub enum BuildSetting {
  String(String),
  Array(Vec<String>)
}

impl BuildSetting {
  pub fn as_str(&self) -> Option<&str> {
    match self {
      BuildSetting::String(s) => Some(s),
      BuildSetting::Array(_)  => None
    }
  }

  pub fn as_array(&self) -> Option<&[String]> {
    match self {
      BuildSetting::Array(a)  => Some(a),
      BuildSetting::String(_) => None
    }
  }

  fn to_value(&self) -> Value {
    match self {
      BuildSetting::String(s) => Value::string(s.clone()),
      BuildSetting::Array(a)  => strings_value(a)
    }
  }
}

impl From<&str> for BuildSetting {
  fn from(s: &str) -> Self {
    BuildSetting::String(s.to_string())
  }
}

impl From<String> for BuildSetting {
  fn from(s: String) -> Self {
    BuildSetting::String(s)
  }
}

impl From<Vec<String>> for BuildSetting {
  fn from(a: Vec<String>) -> Self {
    BuildSetting::Array(a)
  }
}

pub type BuildSettings = IndexMap<String, BuildSetting>;

/// A named set of build settings, e.g. `Debug` or `Release`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XCBuildConfiguration {
  pub base_configuration: Option<Ref<PBXFileReference>>,
  pub build_settings:     BuildSettings,
  pub name:               String
}

impl XCBuildConfiguration {
  pub fn new<S: Into<String>>(name: S) -> Self {
    XCBuildConfiguration { name: name.into(), ..Default::default() }
  }

  /// Appends `value` to the setting named `key`, unless it is already
  /// present. List settings grow by one element with duplicates dropped;
  /// scalar settings are joined with a space, the value counted as present
  /// when it already appears as a whitespace-separated token. A setting that
  /// does not exist yet starts from `$(inherited)`. Appending an empty value
  /// changes nothing.
  pub fn append_setting(&mut self, key: &str, value: &str) {
    if value.is_empty() {
      return;
    }
    let current = self.build_settings
      .shift_remove(key)
      .unwrap_or_else(|| BuildSetting::String("$(inherited)".to_string()));
    let next = match current {
      BuildSetting::String(s) => {
        if s.split_whitespace().any(|token| token == value) {
          BuildSetting::String(s)
        }
        else {
          BuildSetting::String(format!("{} {}", s, value))
        }
      },
      BuildSetting::Array(mut a) => {
        a.push(value.to_string());
        let mut unique = Vec::with_capacity(a.len());
        for item in a {
          if !unique.contains(&item) {
            unique.push(item);
          }
        }
        BuildSetting::Array(unique)
      }
    };
    self.build_settings.insert(key.to_string(), next);
  }

  pub(crate) fn decode(id: &str, dict: &Dict, ctx: &mut DecodeContext) -> Result<Self> {
    Ok(XCBuildConfiguration {
      base_configuration: opt_ref(dict, "baseConfigurationReference", ctx),
      build_settings:     decode_settings(id, dict)?,
      name:               req_str(id, dict, "name")?
    })
  }

  pub(crate) fn encode(&self, store: &Store, comments: &Comments) -> Dict {
    let mut d = Dict::new();
    d.extend([isa_value("XCBuildConfiguration")]);
    if let Some(base) = &self.base_configuration {
      d.insert("baseConfigurationReference".to_string(), ref_value(store, comments, base.id()));
    }
    let settings = self.build_settings.iter()
      .map(|(k, v)| (k.clone(), v.to_value()))
      .collect();
    d.insert("buildSettings".to_string(), Value::Dict(settings));
    d.insert("name".to_string(), Value::string(self.name.clone()));
    d
  }

  pub(crate) fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
    if let Some(r) = &self.base_configuration {
      f(r.id());
    }
  }

  pub(crate) fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
    if let Some(r) = &mut self.base_configuration {
      f(r.id_mut());
    }
  }
}

fn decode_settings(id: &str, dict: &Dict) -> Result<BuildSettings> {
  let mut settings = BuildSettings::new();
  let raw = match dict.get("buildSettings") {
    Some(Value::Dict(d)) => d,
    Some(_)              => {
      return Err(Error::UnexpectedValue { id: id.to_string(), field: "buildSettings" });
    },
    None => return Ok(settings)
  };
  for (key, value) in raw {
    let setting = match value {
      Value::String(s) => BuildSetting::String(s.string.clone()),
      Value::Array(items) => {
        let mut list = Vec::with_capacity(items.len());
        for item in items {
          match item.as_str() {
            Some(s) => list.push(s.to_string()),
            None    => {
              return Err(Error::UnexpectedValue { id: id.to_string(), field: "buildSettings" });
            }
          }
        }
        BuildSetting::Array(list)
      },
      Value::Dict(_) => {
        return Err(Error::UnexpectedValue { id: id.to_string(), field: "buildSettings" });
      }
    };
    settings.insert(key.clone(), setting);
  }
  Ok(settings)
}

/// The ordered configurations of a project or target, plus which one is the
/// default.
#[derive(Clone, Debug, PartialEq)]
pub struct XCConfigurationList {
  pub build_configurations: Vec<Ref<XCBuildConfiguration>>,
  pub default_configuration_is_visible: String,
  pub default_configuration_name: Option<String>
}

impl Default for XCConfigurationList {
  fn default() -> Self {
    XCConfigurationList {
      build_configurations: Vec::new(),
      default_configuration_is_visible: "0".to_string(),
      default_configuration_name: None
    }
  }
}

impl XCConfigurationList {
  /// The configuration with the given name, if any.
  pub fn configuration(&self, store: &Store, name: &str)
                       -> Option<Ref<XCBuildConfiguration>> {
    self.build_configurations.iter()
      .find(|r| r.get(store).map(|c| c.name == name).unwrap_or(false))
      .cloned()
  }

  pub(crate) fn decode(_id: &str, dict: &Dict, ctx: &mut DecodeContext) -> Result<Self> {
    Ok(XCConfigurationList {
      build_configurations: ref_list(dict, "buildConfigurations", ctx),
      default_configuration_is_visible:
        opt_str(dict, "defaultConfigurationIsVisible").unwrap_or_else(|| "0".to_string()),
      default_configuration_name: opt_str(dict, "defaultConfigurationName")
    })
  }

  pub(crate) fn encode(&self, store: &Store, comments: &Comments) -> Dict {
    let mut d = Dict::new();
    d.extend([isa_value("XCConfigurationList")]);
    d.insert("buildConfigurations".to_string(),
             refs_value(store, comments, &self.build_configurations));
    d.insert("defaultConfigurationIsVisible".to_string(),
             Value::string(self.default_configuration_is_visible.clone()));
    opt_entry(&mut d, "defaultConfigurationName", &self.default_configuration_name);
    d
  }

  pub(crate) fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
    for r in &self.build_configurations {
      f(r.id());
    }
  }

  pub(crate) fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
    for r in &mut self.build_configurations {
      f(r.id_mut());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::plist::parse;

  #[test]
  fn append_to_scalar_setting_joins_with_a_space() {
    let mut c = XCBuildConfiguration::new("Debug");
    c.build_settings.insert("OTHER_CFLAGS".to_string(), "-Wall".into());
    c.append_setting("OTHER_CFLAGS", "-Wextra");
    assert_eq!(c.build_settings["OTHER_CFLAGS"].as_str(), Some("-Wall -Wextra"));
  }

  #[test]
  fn append_to_scalar_setting_skips_tokens_already_present() {
    let mut c = XCBuildConfiguration::new("Debug");
    c.build_settings.insert("OTHER_CFLAGS".to_string(), "flag1 flag2".into());
    c.append_setting("OTHER_CFLAGS", "flag1");
    assert_eq!(c.build_settings["OTHER_CFLAGS"].as_str(), Some("flag1 flag2"));

    // Substrings of an existing token are not the token.
    c.append_setting("OTHER_CFLAGS", "flag");
    assert_eq!(c.build_settings["OTHER_CFLAGS"].as_str(), Some("flag1 flag2 flag"));
  }

  #[test]
  fn append_to_list_setting_adds_without_duplicates() {
    let mut c = XCBuildConfiguration::new("Release");
    c.build_settings.insert("OTHER_LDFLAGS".to_string(),
                            vec!["$(inherited)".to_string(), "-lz".to_string()].into());
    c.append_setting("OTHER_LDFLAGS", "-ObjC");
    c.append_setting("OTHER_LDFLAGS", "-lz");
    assert_eq!(c.build_settings["OTHER_LDFLAGS"].as_array(),
               Some(&["$(inherited)".to_string(), "-lz".to_string(), "-ObjC".to_string()][..]));
  }

  #[test]
  fn append_to_absent_setting_seeds_inherited() {
    let mut c = XCBuildConfiguration::new("Debug");
    c.append_setting("SWIFT_FLAGS", "-DDEBUG");
    assert_eq!(c.build_settings["SWIFT_FLAGS"].as_str(), Some("$(inherited) -DDEBUG"));

    c.append_setting("SWIFT_FLAGS", "");
    assert_eq!(c.build_settings["SWIFT_FLAGS"].as_str(), Some("$(inherited) -DDEBUG"));
  }

  #[test]
  fn settings_reject_nested_dictionaries() {
    let dict = parse("{ isa = XCBuildConfiguration; name = Debug; \
                       buildSettings = { BAD = { nested = 1; }; }; }").unwrap();
    let mut ctx = DecodeContext::new();
    match XCBuildConfiguration::decode("AA", &dict, &mut ctx) {
      Err(Error::UnexpectedValue { field: "buildSettings", .. }) => {},
      other => panic!("expected UnexpectedValue, got {:?}", other)
    }
  }

  #[test]
  fn configuration_lookup_by_name() {
    let mut store = Store::new();
    let debug   = store.add(XCBuildConfiguration::new("Debug"));
    let release = store.add(XCBuildConfiguration::new("Release"));
    let list = XCConfigurationList {
      build_configurations: vec![debug.clone(), release],
      default_configuration_name: Some("Release".to_string()),
      ..Default::default()
    };
    assert_eq!(list.configuration(&store, "Debug"), Some(debug));
    assert!(list.configuration(&store, "Profile").is_none());
  }
}
