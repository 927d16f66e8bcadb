//! The closed set of build object kinds.
//!
//! Each kind mirrors one `isa` value from the project file. Decoding is
//! strict about required fields and reference shapes but tolerant of extra
//! keys; any `isa` outside this set is captured verbatim by
//! [`UnknownObject`] so a document written by a newer Xcode survives a
//! round trip untouched.

mod config;
mod dependency;
mod file;
mod package;
mod phase;
mod project;
mod target;
mod unknown;

pub use config::{BuildSetting, BuildSettings, XCBuildConfiguration, XCConfigurationList};
pub use dependency::{PBXContainerItemProxy, PBXTargetDependency};
pub use file::{PBXBuildFile, PBXFileReference, PBXGroup, PBXVariantGroup};
pub use package::{XCLocalSwiftPackageReference, XCRemoteSwiftPackageReference,
                  XCSwiftPackageProductDependency};
pub use phase::{BuildPhaseData, PBXCopyFilesBuildPhase, PBXFrameworksBuildPhase,
                PBXHeadersBuildPhase, PBXResourcesBuildPhase, PBXShellScriptBuildPhase,
                PBXSourcesBuildPhase};
pub use project::PBXProject;
pub use target::{PBXAggregateTarget, PBXLegacyTarget, PBXNativeTarget, TargetData};
pub use unknown::UnknownObject;

use std::collections::HashMap;

use crate::err::{Error, Result};
use crate::id::Id;
use crate::plist::{CommentedString, Dict, Value};
use crate::store::{AnyRef, DecodeContext, Ref, Store};

/// Implemented by every concrete kind so typed references can downcast an
/// [`Object`] back out of the store.
pub trait ObjectKind: Sized {
  fn from_object(object: &Object) -> Option<&Self>;
  fn from_object_mut(object: &mut Object) -> Option<&mut Self>;
  fn into_object(self) -> Object;
}

impl ObjectKind for Object {
  fn from_object(object: &Object) -> Option<&Self> {
    Some(object)
  }

  fn from_object_mut(object: &mut Object) -> Option<&mut Self> {
    Some(object)
  }

  fn into_object(self) -> Object {
    self
  }
}

/// Drops the kind from a typed reference so it can sit in a heterogeneous
/// slot such as group children or the target list.
pub fn erase<T: ObjectKind>(r: &Ref<T>) -> AnyRef {
  Ref::new(r.id().clone())
}

macro_rules! object_kinds {
  ($($isa:literal => $ty:ident),* $(,)?) => {
    /// One build object of any recognized kind, or an unrecognized one held
    /// verbatim.
    #[derive(Clone, Debug, PartialEq)]
    pub enum Object {
      $($ty($ty),)*
      Unknown(UnknownObject)
    }

    $(
      impl ObjectKind for $ty {
        fn from_object(object: &Object) -> Option<&Self> {
          match object {
            Object::$ty(o) => Some(o),
            _              => None
          }
        }

        fn from_object_mut(object: &mut Object) -> Option<&mut Self> {
          match object {
            Object::$ty(o) => Some(o),
            _              => None
          }
        }

        fn into_object(self) -> Object {
          Object::$ty(self)
        }
      }

      impl From<$ty> for Object {
        fn from(o: $ty) -> Object {
          Object::$ty(o)
        }
      }
    )*

    impl Object {
      pub fn isa(&self) -> &str {
        match self {
          $(Object::$ty(_) => $isa,)*
          Object::Unknown(o) => &o.isa
        }
      }

      pub(crate) fn decode(isa: &str, id: &str, dict: &Dict, ctx: &mut DecodeContext)
                           -> Result<Object> {
        match isa {
          $($isa => Ok(Object::$ty(<$ty>::decode(id, dict, ctx)?)),)*
          _      => Ok(Object::Unknown(UnknownObject::capture(isa, dict)))
        }
      }

      pub(crate) fn encode(&self, store: &Store, comments: &Comments) -> Dict {
        match self {
          $(Object::$ty(o) => o.encode(store, comments),)*
          Object::Unknown(o) => o.encode()
        }
      }

      /// Calls `f` for every identifier this object holds a reference
      /// through. Raw foreign identifiers (a proxy's remote global ID) are
      /// excluded: they may legitimately point outside this document.
      pub fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
        match self {
          $(Object::$ty(o) => o.visit_refs(f),)*
          Object::Unknown(_) => {}
        }
      }

      /// Mutable variant used when identifiers are rewritten in place. This
      /// one does include raw foreign identifiers, so a remote global ID
      /// that happens to name a local object follows it through renames.
      pub(crate) fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
        match self {
          $(Object::$ty(o) => o.visit_refs_mut(f),)*
          Object::Unknown(_) => {}
        }
      }
    }
  }
}

object_kinds! {
  "PBXBuildFile"                    => PBXBuildFile,
  "PBXFileReference"                => PBXFileReference,
  "PBXGroup"                        => PBXGroup,
  "PBXVariantGroup"                 => PBXVariantGroup,
  "PBXProject"                      => PBXProject,
  "PBXNativeTarget"                 => PBXNativeTarget,
  "PBXAggregateTarget"              => PBXAggregateTarget,
  "PBXLegacyTarget"                 => PBXLegacyTarget,
  "PBXTargetDependency"             => PBXTargetDependency,
  "PBXContainerItemProxy"           => PBXContainerItemProxy,
  "PBXSourcesBuildPhase"            => PBXSourcesBuildPhase,
  "PBXFrameworksBuildPhase"         => PBXFrameworksBuildPhase,
  "PBXResourcesBuildPhase"          => PBXResourcesBuildPhase,
  "PBXHeadersBuildPhase"            => PBXHeadersBuildPhase,
  "PBXCopyFilesBuildPhase"          => PBXCopyFilesBuildPhase,
  "PBXShellScriptBuildPhase"        => PBXShellScriptBuildPhase,
  "XCBuildConfiguration"            => XCBuildConfiguration,
  "XCConfigurationList"             => XCConfigurationList,
  "XCRemoteSwiftPackageReference"   => XCRemoteSwiftPackageReference,
  "XCLocalSwiftPackageReference"    => XCLocalSwiftPackageReference,
  "XCSwiftPackageProductDependency" => XCSwiftPackageProductDependency
}

impl Object {
  /// Build files and file references render on a single line.
  pub(crate) fn multiline(&self) -> bool {
    !matches!(self, Object::PBXBuildFile(_) | Object::PBXFileReference(_))
  }
}

/// Context an object cannot derive about itself: the comments on build-file
/// and configuration-list references name the *owning* object, so they are
/// gathered in one pass over the whole store before encoding.
#[derive(Default)]
pub struct Comments {
  build_file_phase:  HashMap<Id, String>,
  config_list_owner: HashMap<Id, (&'static str, String)>
}

impl Comments {
  pub fn build(store: &Store) -> Comments {
    let mut c = Comments::default();
    for (_, object) in store.iter() {
      match object {
        Object::PBXSourcesBuildPhase(p)     => c.phase(&p.data, "Sources"),
        Object::PBXFrameworksBuildPhase(p)  => c.phase(&p.data, "Frameworks"),
        Object::PBXResourcesBuildPhase(p)   => c.phase(&p.data, "Resources"),
        Object::PBXHeadersBuildPhase(p)     => c.phase(&p.data, "Headers"),
        Object::PBXCopyFilesBuildPhase(p)   => {
          let name = p.name.clone().unwrap_or_else(|| "CopyFiles".to_string());
          c.phase_named(&p.data, name);
        },
        Object::PBXShellScriptBuildPhase(p) => {
          let name = p.name.clone().unwrap_or_else(|| "ShellScript".to_string());
          c.phase_named(&p.data, name);
        },
        Object::PBXProject(p) => {
          c.config_list_owner.insert(p.build_configuration_list.id().clone(),
                                     ("PBXProject", p.name.clone()));
        },
        Object::PBXNativeTarget(t) => {
          c.list(&t.data.build_configuration_list, "PBXNativeTarget", &t.data.name);
        },
        Object::PBXAggregateTarget(t) => {
          c.list(&t.data.build_configuration_list, "PBXAggregateTarget", &t.data.name);
        },
        Object::PBXLegacyTarget(t) => {
          c.list(&t.data.build_configuration_list, "PBXLegacyTarget", &t.data.name);
        },
        _ => {}
      }
    }
    c
  }

  fn phase(&mut self, data: &phase::BuildPhaseData, name: &str) {
    self.phase_named(data, name.to_string());
  }

  fn phase_named(&mut self, data: &phase::BuildPhaseData, name: String) {
    for file in &data.files {
      self.build_file_phase.insert(file.id().clone(), name.clone());
    }
  }

  fn list(&mut self, list: &Option<Ref<XCConfigurationList>>, isa: &'static str, name: &str) {
    if let Some(list) = list {
      self.config_list_owner.insert(list.id().clone(), (isa, name.to_string()));
    }
  }
}

/// The human-readable name written as a `/* */` comment wherever this object
/// is referenced. `None` means the reference is written bare, as Xcode does
/// for the main group.
pub fn display_name(store: &Store, comments: &Comments, id: &Id) -> Option<String> {
  match store.get(id)? {
    Object::PBXProject(_) => Some("Project object".to_string()),

    Object::PBXNativeTarget(t)    => Some(t.data.name.clone()),
    Object::PBXAggregateTarget(t) => Some(t.data.name.clone()),
    Object::PBXLegacyTarget(t)    => Some(t.data.name.clone()),

    Object::PBXBuildFile(b) => {
      let phase = comments.build_file_phase.get(id)?;
      let file = b.file_ref.as_ref()
        .and_then(|f| display_name(store, comments, f.id()))
        .or_else(|| {
          b.product_ref.as_ref()
            .and_then(|p| p.get(store))
            .map(|p| p.product_name.clone())
        })
        .unwrap_or_else(|| "(null)".to_string());
      Some(format!("{} in {}", file, phase))
    },

    Object::PBXFileReference(f)  => f.name.clone().or_else(|| f.path.clone()),
    Object::PBXGroup(g)          => g.name.clone().or_else(|| g.path.clone()),
    Object::PBXVariantGroup(g)   => g.name.clone().or_else(|| g.path.clone()),

    Object::PBXSourcesBuildPhase(_)     => Some("Sources".to_string()),
    Object::PBXFrameworksBuildPhase(_)  => Some("Frameworks".to_string()),
    Object::PBXResourcesBuildPhase(_)   => Some("Resources".to_string()),
    Object::PBXHeadersBuildPhase(_)     => Some("Headers".to_string()),
    Object::PBXCopyFilesBuildPhase(p)   => {
      Some(p.name.clone().unwrap_or_else(|| "CopyFiles".to_string()))
    },
    Object::PBXShellScriptBuildPhase(p) => {
      Some(p.name.clone().unwrap_or_else(|| "ShellScript".to_string()))
    },

    Object::XCBuildConfiguration(c) => Some(c.name.clone()),
    Object::XCConfigurationList(_)  => {
      let (isa, name) = comments.config_list_owner.get(id)?;
      Some(format!("Build configuration list for {} \"{}\"", isa, name))
    },

    Object::PBXContainerItemProxy(_) => Some("PBXContainerItemProxy".to_string()),
    Object::PBXTargetDependency(_)   => Some("PBXTargetDependency".to_string()),

    Object::XCRemoteSwiftPackageReference(p) => {
      Some(format!("XCRemoteSwiftPackageReference \"{}\"", p.name()))
    },
    Object::XCLocalSwiftPackageReference(p) => {
      Some(format!("XCLocalSwiftPackageReference \"{}\"", p.name()))
    },
    Object::XCSwiftPackageProductDependency(p) => Some(p.product_name.clone()),

    Object::Unknown(_) => None
  }
}

// ---------------------------------------------------------------------------
// Field decoding helpers. Required fields fail loudly with the owning
// object's identifier; optional fields of the wrong shape are treated as
// absent, matching how Xcode itself shrugs off junk it does not understand.

pub(crate) fn req_str(id: &str, dict: &Dict, field: &'static str) -> Result<String> {
  match dict.get(field) {
    Some(Value::String(s)) => Ok(s.string.clone()),
    Some(_)                => Err(Error::UnexpectedValue { id: id.to_string(), field }),
    None                   => Err(Error::MissingField { id: id.to_string(), field })
  }
}

pub(crate) fn opt_str(dict: &Dict, field: &str) -> Option<String> {
  match dict.get(field) {
    Some(Value::String(s)) => Some(s.string.clone()),
    _                      => None
  }
}

pub(crate) fn str_list(dict: &Dict, field: &str) -> Vec<String> {
  match dict.get(field) {
    Some(Value::Array(items)) => {
      items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()
    },
    _ => Vec::new()
  }
}

pub(crate) fn req_ref<T: ObjectKind>(id: &str, dict: &Dict, field: &'static str,
                                     ctx: &mut DecodeContext) -> Result<Ref<T>> {
  Ok(ctx.reference(&req_str(id, dict, field)?))
}

pub(crate) fn opt_ref<T: ObjectKind>(dict: &Dict, field: &str,
                                     ctx: &mut DecodeContext) -> Option<Ref<T>> {
  opt_str(dict, field).map(|s| ctx.reference(&s))
}

pub(crate) fn ref_list<T: ObjectKind>(dict: &Dict, field: &str,
                                      ctx: &mut DecodeContext) -> Vec<Ref<T>> {
  match dict.get(field) {
    Some(Value::Array(items)) => {
      items.iter()
        .filter_map(|v| v.as_str())
        .map(|s| ctx.reference(s))
        .collect()
    },
    _ => Vec::new()
  }
}

pub(crate) fn opt_dict(dict: &Dict, field: &str) -> Option<Dict> {
  dict.get(field).and_then(Value::as_dict).cloned()
}

// ---------------------------------------------------------------------------
// Field encoding helpers.

pub(crate) fn isa_value(isa: &str) -> (String, Value) {
  ("isa".to_string(), Value::string(isa))
}

/// A reference value with its regenerated comment.
pub(crate) fn ref_value(store: &Store, comments: &Comments, id: &Id) -> Value {
  Value::String(CommentedString {
    string:  id.value().to_string(),
    comment: display_name(store, comments, id)
  })
}

pub(crate) fn refs_value<T: ObjectKind>(store: &Store, comments: &Comments,
                                        refs: &[Ref<T>]) -> Value {
  Value::Array(refs.iter().map(|r| ref_value(store, comments, r.id())).collect())
}

pub(crate) fn strings_value(items: &[String]) -> Value {
  Value::Array(items.iter().map(Value::string).collect())
}
