//! The `project.pbxproj` document: the object store plus the handful of
//! top-level scalars wrapped around it, with loading, validation and
//! writing.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::err::{Error, Result, Unresolved};
use crate::id::Id;
use crate::obj::{self, Comments, Object, PBXGroup, PBXProject, XCBuildConfiguration,
                 XCConfigurationList, XCRemoteSwiftPackageReference};
use crate::plist::{parse, CommentedString, Dict, Renderer, Value};
use crate::refgen;
use crate::store::{AnyRef, DecodeContext, Ref, Store};

/// A parsed (or in-memory) project document.
pub struct Pbxproj {
  pub store: Store,
  root:      Ref<PBXProject>,
  /// Top-level version scalars, carried verbatim. Their values are opaque
  /// tokens chosen by Xcode, not numbers this crate interprets.
  pub archive_version: String,
  pub object_version:  String,
  /// The `classes` dictionary, always empty in practice but carried anyway.
  pub classes: Dict
}

impl Pbxproj {
  /// A minimal new project: Debug and Release configurations, an empty main
  /// group with a Products subgroup, and no targets.
  pub fn new<S: Into<String>>(name: S) -> Self {
    let mut store = Store::new();

    let debug   = store.add(XCBuildConfiguration::new("Debug"));
    let release = store.add(XCBuildConfiguration::new("Release"));
    let list = store.add(XCConfigurationList {
      build_configurations: vec![debug, release],
      default_configuration_name: Some("Release".to_string()),
      ..Default::default()
    });

    let products = store.add(PBXGroup {
      name:        Some("Products".to_string()),
      source_tree: Some("<group>".to_string()),
      ..Default::default()
    });
    let main_group = store.add(PBXGroup {
      children:    vec![obj::erase(&products)],
      source_tree: Some("<group>".to_string()),
      ..Default::default()
    });

    let mut project = PBXProject::new(name, list, main_group);
    project.product_ref_group = Some(products);
    let root = store.add(project);

    Pbxproj {
      store,
      root,
      archive_version: "1".to_string(),
      object_version:  "56".to_string(),
      classes:         Dict::new()
    }
  }

  /// The concrete pbxproj file a path addresses: the file itself, or the
  /// first `*.pbxproj` inside a bundle directory.
  pub fn locate<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    locate(path.as_ref())
  }

  /// Loads a document from an `.xcodeproj` bundle directory or directly
  /// from a `project.pbxproj` file.
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Pbxproj> {
    let path = path.as_ref();
    let file = locate(path)?;
    let name = project_name(&file);
    debug!(file = %file.display(), name = %name, "loading project");
    let text = fs::read_to_string(&file)?;
    Pbxproj::parse_document(&name, &text)
  }

  /// Parses document text. `name` is the project name the bundle implies;
  /// it is not stored in the file itself.
  pub fn parse_document(name: &str, text: &str) -> Result<Pbxproj> {
    let root_dict = parse(text)?;

    let archive_version = doc_str(&root_dict, "archiveVersion")?;
    let object_version  = doc_str(&root_dict, "objectVersion")?;
    let classes = root_dict.get("classes")
      .and_then(Value::as_dict)
      .cloned()
      .unwrap_or_default();
    let root_token = doc_str(&root_dict, "rootObject")?;
    let objects = match root_dict.get("objects") {
      Some(Value::Dict(d)) => d,
      Some(_) => return Err(Error::UnexpectedValue { id: "(root)".to_string(), field: "objects" }),
      None    => return Err(Error::MissingField { id: "(root)".to_string(), field: "objects" })
    };

    let mut ctx = DecodeContext::new();
    let mut store = Store::new();
    for (token, entry) in objects {
      let dict = match entry {
        Value::Dict(d) => d,
        _ => return Err(Error::UnexpectedValue { id: token.clone(), field: "objects" })
      };
      let isa = match dict.get("isa").and_then(Value::as_str) {
        Some(isa) => isa,
        None      => return Err(Error::MissingField { id: token.clone(), field: "isa" })
      };
      let object = Object::decode(isa, token, dict, &mut ctx)?;
      store.insert_with_id(ctx.id(token), object);
    }

    let root_id = ctx.id(&root_token);
    match store.get(&root_id) {
      Some(Object::PBXProject(_)) => {},
      Some(other) => {
        return Err(Error::UnexpectedIsa { id: root_token, isa: other.isa().to_string() });
      },
      None => {
        return Err(Error::UnresolvedReferences(vec![Unresolved {
          owner:     "(root)".to_string(),
          owner_isa: "rootObject".to_string(),
          target:    root_token
        }]));
      }
    }

    let root: Ref<PBXProject> = Ref::new(root_id);
    if let Some(project) = root.get_mut(&mut store) {
      project.name = name.to_string();
    }

    info!(name = %name, objects = store.len(), "loaded project");
    Ok(Pbxproj { store, root, archive_version, object_version, classes })
  }

  pub fn root_project(&self) -> Option<&PBXProject> {
    self.root.get(&self.store)
  }

  pub fn root_project_mut(&mut self) -> Option<&mut PBXProject> {
    self.root.get_mut(&mut self.store)
  }

  pub fn root_ref(&self) -> &Ref<PBXProject> {
    &self.root
  }

  /// All targets of the root project, in declaration order.
  pub fn targets(&self) -> Vec<AnyRef> {
    self.root_project().map(|p| p.targets.clone()).unwrap_or_default()
  }

  /// The target with the given name. Errs when several targets share it.
  pub fn target(&self, name: &str) -> Result<Option<AnyRef>> {
    let matches: Vec<AnyRef> = self.targets().into_iter()
      .filter(|r| target_name(&self.store, r).map(|n| n == name).unwrap_or(false))
      .collect();
    single(matches, name)
  }

  /// The remote package reference with the given derived name.
  pub fn remote_package(&self, name: &str)
                        -> Result<Option<Ref<XCRemoteSwiftPackageReference>>> {
    let matches: Vec<Ref<XCRemoteSwiftPackageReference>> = self.store.iter()
      .filter_map(|(id, object)| match object {
        Object::XCRemoteSwiftPackageReference(p) if p.name() == name => {
          Some(Ref::new(id.clone()))
        },
        _ => None
      })
      .collect();
    single(matches, name)
  }

  /// Checks that every reference resolves and that local package paths are
  /// relative. All dangling references are reported together.
  pub fn validate(&self) -> Result<()> {
    for (id, object) in self.store.iter() {
      if let Object::XCLocalSwiftPackageReference(p) = object {
        if p.relative_path.starts_with('/') {
          return Err(Error::InvalidPath(format!(
            "local package {} must use a relative path, got {}", id, p.relative_path)));
        }
      }
    }

    let mut unresolved = Vec::new();
    for (id, object) in self.store.iter() {
      object.visit_refs(&mut |target| {
        if !self.store.contains(target) {
          unresolved.push(Unresolved {
            owner:     id.value().to_string(),
            owner_isa: object.isa().to_string(),
            target:    target.value().to_string()
          });
        }
      });
    }
    if unresolved.is_empty() {
      Ok(())
    }
    else {
      Err(Error::UnresolvedReferences(unresolved))
    }
  }

  /// Renders the document in Xcode's own layout. Comments are regenerated
  /// from the current object graph, never echoed from the input.
  pub fn render(&self) -> String {
    let comments = Comments::build(&self.store);
    let mut r = Renderer::new();

    r.header();
    r.raw("{");
    r.newline();
    r.inc_indent();

    r.entry(&CommentedString::plain("archiveVersion"),
            &Value::string(self.archive_version.clone()), true);
    r.entry(&CommentedString::plain("classes"), &Value::Dict(self.classes.clone()), true);
    r.entry(&CommentedString::plain("objectVersion"),
            &Value::string(self.object_version.clone()), true);

    r.write_indent();
    r.raw("objects = {");
    r.newline();
    r.inc_indent();

    // One framed section per isa, alphabetically; entries sorted by
    // identifier within each section.
    let mut sections: BTreeMap<&str, Vec<(&Id, &Object)>> = BTreeMap::new();
    for (id, object) in self.store.iter() {
      sections.entry(object.isa()).or_default().push((id, object));
    }
    for (isa, mut entries) in sections {
      entries.sort_by_key(|(id, _)| *id);

      r.raw(&format!("\n/* Begin {} section */\n", isa));
      for (id, object) in entries {
        let key = CommentedString {
          string:  id.value().to_string(),
          comment: obj::display_name(&self.store, &comments, id)
        };
        r.entry(&key, &Value::Dict(object.encode(&self.store, &comments)),
                object.multiline());
      }
      r.raw(&format!("/* End {} section */\n", isa));
    }

    r.dec_indent();
    r.write_indent();
    r.raw("};");
    r.newline();

    r.entry(&CommentedString::plain("rootObject"),
            &obj::ref_value(&self.store, &comments, self.root.id()), true);

    r.dec_indent();
    r.raw("}");
    r.newline();
    r.finish()
  }

  /// Validates, assigns permanent identifiers, and renders. This is the
  /// text `write` would put on disk.
  pub fn canonical_text(&mut self) -> Result<String> {
    self.validate()?;
    let root_id = self.root.id().clone();
    let root_id = refgen::assign(&mut self.store, &root_id);
    self.root = Ref::new(root_id);
    Ok(self.render())
  }

  /// Validates, assigns permanent identifiers, and writes the document.
  ///
  /// The write is conditional: a byte-identical file on disk is left
  /// untouched (its mtime included), and an existing file with different
  /// contents is only replaced when `overwrite` is set. Returns whether
  /// bytes reached the disk.
  pub fn write<P: AsRef<Path>>(&mut self, path: P, overwrite: bool) -> Result<bool> {
    let rendered = self.canonical_text()?;
    let file = output_path(path.as_ref())?;

    if file.exists() {
      let existing = fs::read_to_string(&file)?;
      if existing == rendered {
        debug!(file = %file.display(), "project unchanged, skipping write");
        return Ok(false);
      }
      if !overwrite {
        debug!(file = %file.display(), "project differs but overwrite is off");
        return Ok(false);
      }
    }

    let dir = file.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(rendered.as_bytes())?;
    tmp.persist(&file).map_err(|e| e.error)?;

    info!(file = %file.display(), bytes = rendered.len(), "wrote project");
    Ok(true)
  }
}

fn doc_str(dict: &Dict, field: &'static str) -> Result<String> {
  match dict.get(field) {
    Some(Value::String(s)) => Ok(s.string.clone()),
    Some(_)                => Err(Error::UnexpectedValue { id: "(root)".to_string(), field }),
    None                   => Err(Error::MissingField { id: "(root)".to_string(), field })
  }
}

fn single<T>(mut matches: Vec<T>, name: &str) -> Result<Option<T>> {
  match matches.len() {
    0 => Ok(None),
    1 => Ok(matches.pop()),
    _ => Err(Error::AmbiguousResolution(name.to_string()))
  }
}

fn target_name(store: &Store, r: &AnyRef) -> Option<String> {
  match r.get(store)? {
    Object::PBXNativeTarget(t)    => Some(t.data.name.clone()),
    Object::PBXAggregateTarget(t) => Some(t.data.name.clone()),
    Object::PBXLegacyTarget(t)    => Some(t.data.name.clone()),
    _ => None
  }
}

/// Finds the pbxproj file addressed by `path`, which may be the bundle
/// directory or the file itself.
fn locate(path: &Path) -> Result<PathBuf> {
  if path.is_dir() {
    let pattern = path.join("*.pbxproj");
    let mut matches: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
      .filter_map(|entry| entry.ok())
      .collect();
    matches.sort();
    return matches.into_iter().next().ok_or_else(|| Error::NotFound(path.to_path_buf()));
  }
  if path.is_file() {
    return Ok(path.to_path_buf());
  }
  Err(Error::NotFound(path.to_path_buf()))
}

/// The project name an on-disk location implies: the bundle directory's
/// stem, or the file's own stem outside a bundle.
fn project_name(file: &Path) -> String {
  let bundle = file.parent()
    .filter(|dir| dir.extension().map(|e| e == "xcodeproj").unwrap_or(false));
  let stem = match bundle {
    Some(dir) => dir.file_stem(),
    None      => file.file_stem()
  };
  stem.map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Maps a target path to the concrete pbxproj file, creating a bundle
/// directory when one is addressed.
fn output_path(path: &Path) -> Result<PathBuf> {
  let is_bundle = path.extension().map(|e| e == "xcodeproj").unwrap_or(false);
  if is_bundle || path.is_dir() {
    fs::create_dir_all(path)?;
    Ok(path.join("project.pbxproj"))
  }
  else {
    if let Some(dir) = path.parent() {
      if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir)?;
      }
    }
    Ok(path.to_path_buf())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::obj::{erase, PBXFileReference};

  const MINIMAL: &str = r#"// !$*UTF8*$!
{
	archiveVersion = 1;
	classes = {
	};
	objectVersion = 56;
	objects = {

/* Begin PBXGroup section */
		97C146E51CF9000F007C117D = {
			isa = PBXGroup;
			children = (
			);
			sourceTree = "<group>";
		};
/* End PBXGroup section */

/* Begin PBXProject section */
		97C146E61CF9000F007C117D /* Project object */ = {
			isa = PBXProject;
			buildConfigurationList = 97C146E91CF9000F007C117D /* Build configuration list for PBXProject "App" */;
			mainGroup = 97C146E51CF9000F007C117D;
			projectDirPath = "";
			projectRoot = "";
			targets = (
			);
		};
/* End PBXProject section */

/* Begin XCBuildConfiguration section */
		97C146FB1CF9000F007C117D /* Debug */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
			};
			name = Debug;
		};
/* End XCBuildConfiguration section */

/* Begin XCConfigurationList section */
		97C146E91CF9000F007C117D /* Build configuration list for PBXProject "App" */ = {
			isa = XCConfigurationList;
			buildConfigurations = (
				97C146FB1CF9000F007C117D /* Debug */,
			);
			defaultConfigurationIsVisible = 0;
			defaultConfigurationName = Debug;
		};
/* End XCConfigurationList section */
	};
	rootObject = 97C146E61CF9000F007C117D /* Project object */;
}
"#;

  #[test]
  fn parsed_document_rerenders_to_the_same_bytes() {
    let doc = Pbxproj::parse_document("App", MINIMAL).unwrap();
    assert_eq!(doc.render(), MINIMAL);
  }

  #[test]
  fn root_object_must_be_a_project() {
    let text = MINIMAL.replace("rootObject = 97C146E61CF9000F007C117D /* Project object */",
                               "rootObject = 97C146E51CF9000F007C117D");
    match Pbxproj::parse_document("App", &text) {
      Err(Error::UnexpectedIsa { isa, .. }) => assert_eq!(isa, "PBXGroup"),
      other => panic!("expected UnexpectedIsa, got {:?}", other.map(|_| ()))
    }
  }

  #[test]
  fn validation_reports_every_dangling_reference() {
    let mut doc = Pbxproj::parse_document("App", MINIMAL).unwrap();
    let ghost = |token: &str| -> AnyRef { Ref::new(Id::new(token)) };
    let main_group = doc.root_project().unwrap().main_group.clone();
    main_group.get_mut(&mut doc.store).unwrap().children
      .extend([ghost("AAAAAAAAAAAAAAAAAAAAAAAA"), ghost("BBBBBBBBBBBBBBBBBBBBBBBB")]);

    match doc.validate() {
      Err(Error::UnresolvedReferences(list)) => {
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].owner_isa, "PBXGroup");
      },
      other => panic!("expected UnresolvedReferences, got {:?}", other)
    }
  }

  #[test]
  fn new_project_renders_and_reparses() {
    let mut doc = Pbxproj::new("Fresh");
    let file = doc.root_project().unwrap().main_group.clone();
    let main_c = doc.store.add(PBXFileReference {
      path: Some("main.c".to_string()),
      ..Default::default()
    });
    file.get_mut(&mut doc.store).unwrap().children.push(erase(&main_c));

    let text = doc.canonical_text().unwrap();
    let back = Pbxproj::parse_document("Fresh", &text).unwrap();
    assert_eq!(back.render(), text);
    assert_eq!(back.store.len(), doc.store.len());
  }
}
