//! Round-trip and graph-query behavior over a realistic document.

use pbxproj::obj::Object;
use pbxproj::{deep_equal, Pbxproj};

const DEMO: &str = include_str!("fixtures/Demo.pbxproj");

fn demo() -> Pbxproj {
  Pbxproj::parse_document("Demo", DEMO).unwrap()
}

#[test]
fn parse_then_render_is_byte_identical() {
  assert_eq!(demo().render(), DEMO);
}

#[test]
fn render_parse_render_is_a_fixed_point() {
  let once = demo().render();
  let again = Pbxproj::parse_document("Demo", &once).unwrap().render();
  assert_eq!(again, once);
}

#[test]
fn unknown_object_kinds_survive_a_round_trip() {
  let doc = demo();
  let unknown = doc.store.iter()
    .find_map(|(_, object)| match object {
      Object::Unknown(u) => Some(u.clone()),
      _                  => None
    })
    .expect("fixture contains an unrecognized object");
  assert_eq!(unknown.isa, "PBXFunkyThing");
  assert_eq!(unknown.fields["flavor"].as_str(), Some("grape"));

  // Field values and their comments come back verbatim.
  let text = doc.render();
  assert!(text.contains("linkedTo = 97C146F11CF9000F007C117D /* main.c */;"));
}

#[test]
fn configurations_are_reachable_by_name() {
  let doc = demo();
  let target = doc.target("Runner").unwrap().expect("target exists");
  let target = match target.get(&doc.store) {
    Some(Object::PBXNativeTarget(t)) => t.clone(),
    other => panic!("expected a native target, got {:?}", other)
  };

  let list = target.data.build_configuration_list.expect("target has configurations");
  let list = list.get(&doc.store).unwrap();
  let debug = list.configuration(&doc.store, "Debug").expect("Debug exists");
  let debug = debug.get(&doc.store).unwrap();
  assert_eq!(debug.name, "Debug");
  assert_eq!(debug.build_settings["PRODUCT_NAME"].as_str(), Some("$(TARGET_NAME)"));

  assert!(list.configuration(&doc.store, "Profile").is_none());
  assert!(doc.target("NoSuchTarget").unwrap().is_none());
}

#[test]
fn appending_linker_flags_uniques_and_renders() {
  let mut doc = demo();
  let list = doc.root_project().unwrap().build_configuration_list.clone();
  let debug = list.get(&doc.store).unwrap()
    .configuration(&doc.store, "Debug")
    .unwrap();

  let config = debug.get_mut(&mut doc.store).unwrap();
  config.append_setting("OTHER_LDFLAGS", "-ObjC");
  config.append_setting("OTHER_LDFLAGS", "-lz"); // already present, must not duplicate

  let config = debug.get(&doc.store).unwrap();
  assert_eq!(config.build_settings["OTHER_LDFLAGS"].as_array(),
             Some(&["$(inherited)".to_string(), "-lz".to_string(), "-ObjC".to_string()][..]));

  let text = doc.render();
  assert!(text.contains("\"-ObjC\","));
}

#[test]
fn deep_equality_follows_references_across_stores() {
  let a = demo();
  let mut b = demo();
  let ra = a.root_ref().id().clone();
  let rb = b.root_ref().id().clone();
  assert!(deep_equal(&a.store, &ra, &b.store, &rb));

  // Renaming a target is visible from the root even though every
  // identifier stays the same.
  let target = b.target("Runner").unwrap().unwrap();
  match target.get_mut(&mut b.store) {
    Some(Object::PBXNativeTarget(t)) => t.data.name = "Renamed".to_string(),
    other => panic!("expected a native target, got {:?}", other)
  }
  assert!(!deep_equal(&a.store, &ra, &b.store, &rb));
}
