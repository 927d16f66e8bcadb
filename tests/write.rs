//! Disk behavior: conditional writes, overwrite policy, and deterministic
//! identifier assignment for documents built from scratch.

use std::fs;

use pbxproj::obj::{erase, BuildPhaseData, PBXBuildFile, PBXFileReference, PBXNativeTarget,
                   PBXSourcesBuildPhase, TargetData, XCBuildConfiguration,
                   XCConfigurationList};
use pbxproj::{AnyRef, Error, Id, Pbxproj, Ref};

/// A small project with one target, built entirely in memory.
fn build_doc() -> Pbxproj {
  let mut doc = Pbxproj::new("Fresh");

  let main_c = doc.store.add(PBXFileReference {
    last_known_file_type: Some("sourcecode.c.c".to_string()),
    path:                 Some("main.c".to_string()),
    source_tree:          Some("<group>".to_string()),
    ..Default::default()
  });
  let build_file = doc.store.add(PBXBuildFile {
    file_ref: Some(erase(&main_c)),
    ..Default::default()
  });
  let sources = doc.store.add(PBXSourcesBuildPhase {
    data: BuildPhaseData { files: vec![build_file], ..Default::default() }
  });

  let debug = doc.store.add(XCBuildConfiguration::new("Debug"));
  let list = doc.store.add(XCConfigurationList {
    build_configurations: vec![debug],
    ..Default::default()
  });

  let target = doc.store.add(PBXNativeTarget {
    data: TargetData {
      build_configuration_list: Some(list),
      build_phases:             vec![erase(&sources)],
      product_name:             Some("App".to_string()),
      ..TargetData::named("App")
    },
    product_type: Some("com.apple.product-type.application".to_string()),
    ..Default::default()
  });

  let main_group = doc.root_project().unwrap().main_group.clone();
  main_group.get_mut(&mut doc.store).unwrap().children.insert(0, erase(&main_c));
  doc.root_project_mut().unwrap().targets.push(erase(&target));
  doc
}

#[test]
fn rewriting_an_unchanged_project_touches_nothing() {
  let dir = tempfile::tempdir().unwrap();
  let bundle = dir.path().join("Fresh.xcodeproj");

  let mut doc = build_doc();
  assert!(doc.write(&bundle, true).unwrap());

  let file = bundle.join("project.pbxproj");
  let first = fs::read_to_string(&file).unwrap();
  let mtime = fs::metadata(&file).unwrap().modified().unwrap();

  let mut reopened = Pbxproj::open(&bundle).unwrap();
  assert!(!reopened.write(&bundle, true).unwrap());
  assert_eq!(fs::read_to_string(&file).unwrap(), first);
  assert_eq!(fs::metadata(&file).unwrap().modified().unwrap(), mtime);
}

#[test]
fn overwrite_off_leaves_a_differing_file_alone() {
  let dir = tempfile::tempdir().unwrap();
  let bundle = dir.path().join("Fresh.xcodeproj");

  build_doc().write(&bundle, true).unwrap();
  let file = bundle.join("project.pbxproj");
  let original = fs::read_to_string(&file).unwrap();

  let mut doc = Pbxproj::open(&bundle).unwrap();
  let list = doc.root_project().unwrap().build_configuration_list.clone();
  let debug = list.get(&doc.store).unwrap()
    .configuration(&doc.store, "Debug")
    .unwrap();
  debug.get_mut(&mut doc.store).unwrap().append_setting("OTHER_CFLAGS", "-Wall");

  assert!(!doc.write(&bundle, false).unwrap());
  assert_eq!(fs::read_to_string(&file).unwrap(), original);

  assert!(doc.write(&bundle, true).unwrap());
  assert!(fs::read_to_string(&file).unwrap().contains("OTHER_CFLAGS"));
}

#[test]
fn documents_built_twice_serialize_identically() {
  let mut a = build_doc();
  let mut b = build_doc();
  assert_eq!(a.canonical_text().unwrap(), b.canonical_text().unwrap());
}

#[test]
fn bundles_with_nonstandard_plist_names_are_located() {
  let dir = tempfile::tempdir().unwrap();
  let bundle = dir.path().join("Odd.xcodeproj");
  fs::create_dir_all(&bundle).unwrap();

  let mut doc = build_doc();
  let text = doc.canonical_text().unwrap();
  let file = bundle.join("custom.pbxproj");
  fs::write(&file, &text).unwrap();

  assert_eq!(Pbxproj::locate(&bundle).unwrap(), file);
  let reopened = Pbxproj::open(&bundle).unwrap();
  assert_eq!(reopened.store.len(), doc.store.len());
}

#[test]
fn writing_a_document_with_dangling_references_fails() {
  let dir = tempfile::tempdir().unwrap();
  let bundle = dir.path().join("Broken.xcodeproj");

  let mut doc = build_doc();
  let ghost: AnyRef = Ref::new(Id::new("DEADBEEFDEADBEEFDEADBEEF"));
  let main_group = doc.root_project().unwrap().main_group.clone();
  main_group.get_mut(&mut doc.store).unwrap().children.push(ghost);

  match doc.write(&bundle, true) {
    Err(Error::UnresolvedReferences(list)) => {
      assert_eq!(list[0].target, "DEADBEEFDEADBEEFDEADBEEF");
    },
    other => panic!("expected UnresolvedReferences, got {:?}", other)
  }
  assert!(!bundle.join("project.pbxproj").exists());
}
