//! Deterministic identifier assignment.
//!
//! Objects created in memory carry random temporary identifiers. Before a
//! document is written, every temporary identifier is replaced by a digest
//! of the object's position in the graph: the path of display names leading
//! to it from the root project, prefixed with its `isa`. Two runs over the
//! same graph therefore produce the same identifiers, and regenerating an
//! unchanged project produces an unchanged file.
//!
//! Permanent identifiers (anything read from disk, or produced by an
//! earlier pass) are never touched, which makes the pass idempotent.

use std::collections::{HashMap, HashSet};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::id::{Id, ID_LEN};
use crate::obj::{Comments, Object, PBXBuildFile, PBXProject, TargetData, XCConfigurationList};
use crate::store::{Ref, Store};

/// Replaces every temporary identifier in the store, rewriting inbound
/// references along the way. `root` names the root project; objects not
/// reachable from it are keyed by their store position instead of a path.
/// Returns the root's identifier after the pass.
pub fn assign(store: &mut Store, root: &Id) -> Id {
  let map = {
    let mut gen = Generator::new(store);
    gen.run(root);
    gen.map
  };
  if !map.is_empty() {
    debug!(replaced = map.len(), "assigned permanent identifiers");
  }
  let new_root = map.get(root).cloned().unwrap_or_else(|| root.clone());
  store.remap(&map);
  new_root
}

struct Generator<'a> {
  store: &'a Store,
  map:   HashMap<Id, Id>,
  taken: HashSet<String>,
  done:  HashSet<Id>
}

impl<'a> Generator<'a> {
  fn new(store: &'a Store) -> Self {
    let taken = store.ids()
      .filter(|id| !id.is_temporary())
      .map(|id| id.value().to_string())
      .collect();
    Generator { store, map: HashMap::new(), taken, done: HashSet::new() }
  }

  fn run(&mut self, root: &Id) {
    if let Some(project) = self.store.get_as::<PBXProject>(root) {
      let base = vec![project.name.clone()];

      self.fix(root, "PBXProject", &base);
      self.configuration_list(&project.build_configuration_list, &base);
      self.group(project.main_group.id(), &base);
      for roles in &project.project_references {
        for r in roles.values() {
          self.group(r.id(), &base);
        }
      }
      // All targets are fixed before any of their edges: build files and
      // dependencies hash the identifier of what they point at, and a
      // dependency may point at a target that appears later in the list.
      for target in &project.targets {
        self.target(target.id(), &base);
      }
      for target in &project.targets {
        self.target_edges(target.id(), &base);
      }
      for package in &project.package_references {
        self.package(package.id(), &base);
      }
    }

    self.leftovers();
  }

  fn configuration_list(&mut self, list: &Ref<XCConfigurationList>, identifiers: &[String]) {
    self.fix(list.id(), "XCConfigurationList", identifiers);
    if let Some(list) = list.get(self.store) {
      for config in &list.build_configurations {
        let path = match config.get(self.store) {
          Some(c) => push(identifiers, &c.name),
          None    => identifiers.to_vec()
        };
        self.fix(config.id(), "XCBuildConfiguration", &path);
      }
    }
  }

  fn group(&mut self, id: &Id, identifiers: &[String]) {
    let (isa, name, children) = match self.store.get(id) {
      Some(Object::PBXGroup(g)) => {
        ("PBXGroup", g.name.clone().or_else(|| g.path.clone()), g.children.clone())
      },
      Some(Object::PBXVariantGroup(g)) => {
        ("PBXVariantGroup", g.name.clone().or_else(|| g.path.clone()), g.children.clone())
      },
      Some(Object::PBXFileReference(f)) => {
        let name = f.name.clone().or_else(|| f.path.clone());
        let path = push(identifiers, name.as_deref().unwrap_or(""));
        self.fix(id, "PBXFileReference", &path);
        return;
      },
      _ => return
    };

    let path = push(identifiers, name.as_deref().unwrap_or(""));
    if !self.fix(id, isa, &path) {
      return; // already walked through another parent
    }
    for child in &children {
      self.group(child.id(), &path);
    }
  }

  fn target(&mut self, id: &Id, identifiers: &[String]) {
    let (isa, data) = match self.store.get(id) {
      Some(Object::PBXNativeTarget(t))    => ("PBXNativeTarget", t.data.clone()),
      Some(Object::PBXAggregateTarget(t)) => ("PBXAggregateTarget", t.data.clone()),
      Some(Object::PBXLegacyTarget(t))    => ("PBXLegacyTarget", t.data.clone()),
      _ => return
    };

    let path = push(identifiers, &data.name);
    self.fix(id, isa, &path);

    if let Some(list) = &data.build_configuration_list {
      self.configuration_list(list, &path);
    }
    self.phases(&data, &path);
    for product in &data.package_product_dependencies {
      self.product_dependency(product.id(), &path);
    }

    if let Some(Object::PBXNativeTarget(t)) = self.store.get(id) {
      if let Some(product) = &t.product_reference {
        let name = t.data.product_name.clone().unwrap_or_else(|| data.name.clone());
        self.fix(product.id(), "PBXFileReference", &push(&path, &name));
      }
    }
  }

  /// Second pass over a target: build files and dependencies, whose
  /// fingerprints include identifiers assigned by the first pass.
  fn target_edges(&mut self, id: &Id, identifiers: &[String]) {
    let data = match self.store.get(id) {
      Some(Object::PBXNativeTarget(t))    => t.data.clone(),
      Some(Object::PBXAggregateTarget(t)) => t.data.clone(),
      Some(Object::PBXLegacyTarget(t))    => t.data.clone(),
      _ => return
    };

    let path = push(identifiers, &data.name);
    self.build_files(&data, &path);
    self.dependencies(&data, &path);
  }

  fn phase_info(&self, id: &Id) -> Option<(&'static str, String, Vec<Ref<PBXBuildFile>>)> {
    match self.store.get(id)? {
      Object::PBXSourcesBuildPhase(p) => {
        Some(("PBXSourcesBuildPhase", "Sources".to_string(), p.data.files.clone()))
      },
      Object::PBXFrameworksBuildPhase(p) => {
        Some(("PBXFrameworksBuildPhase", "Frameworks".to_string(), p.data.files.clone()))
      },
      Object::PBXResourcesBuildPhase(p) => {
        Some(("PBXResourcesBuildPhase", "Resources".to_string(), p.data.files.clone()))
      },
      Object::PBXHeadersBuildPhase(p) => {
        Some(("PBXHeadersBuildPhase", "Headers".to_string(), p.data.files.clone()))
      },
      Object::PBXCopyFilesBuildPhase(p) => {
        let name = p.name.clone().unwrap_or_else(|| "CopyFiles".to_string());
        Some(("PBXCopyFilesBuildPhase", name, p.data.files.clone()))
      },
      Object::PBXShellScriptBuildPhase(p) => {
        let name = p.name.clone().unwrap_or_else(|| "ShellScript".to_string());
        Some(("PBXShellScriptBuildPhase", name, p.data.files.clone()))
      },
      _ => None
    }
  }

  fn phases(&mut self, data: &TargetData, identifiers: &[String]) {
    for phase in &data.build_phases {
      if let Some((isa, name, _)) = self.phase_info(phase.id()) {
        self.fix(phase.id(), isa, &push(identifiers, &name));
      }
    }
  }

  fn build_files(&mut self, data: &TargetData, identifiers: &[String]) {
    for phase in &data.build_phases {
      let (_, name, files) = match self.phase_info(phase.id()) {
        Some(info) => info,
        None       => continue
      };
      let phase_path = push(identifiers, &name);

      // A build file hashes the identifier of what it wraps, which must be
      // permanent by now. Wrapped objects that no group or target reaches
      // (orphan file references, stray product dependencies) are fixed here
      // first; the done-set makes that a no-op for everything else.
      for file in &files {
        let wrapped = match file.get(self.store) {
          Some(b) => (b.file_ref.clone(), b.product_ref.clone()),
          None    => continue
        };
        let token = match wrapped {
          (Some(r), _) => {
            self.group(r.id(), &phase_path);
            self.current_value(r.id())
          },
          (None, Some(r)) => {
            self.product_dependency(r.id(), &phase_path);
            self.current_value(r.id())
          },
          (None, None) => String::new()
        };
        self.fix(file.id(), "PBXBuildFile", &push(&phase_path, &token));
      }
    }
  }

  fn dependencies(&mut self, data: &TargetData, identifiers: &[String]) {
    for dep in &data.dependencies {
      let dep = match dep.get(self.store) {
        Some(d) => (dep.id().clone(), d.clone()),
        None    => continue
      };
      let (dep_id, dep) = dep;

      if let Some(proxy) = &dep.target_proxy {
        let remote = match proxy.get(self.store) {
          Some(p) => {
            p.remote_info.clone()
              .or_else(|| p.remote_global_id.as_ref().map(|id| self.current_value(id)))
              .unwrap_or_default()
          },
          None => String::new()
        };
        self.fix(proxy.id(), "PBXContainerItemProxy", &push(identifiers, &remote));
      }

      let hint = dep.name.clone()
        .or_else(|| dep.target.as_ref().map(|t| self.current_value(t.id())))
        .unwrap_or_default();
      self.fix(&dep_id, "PBXTargetDependency", &push(identifiers, &hint));

      if let Some(product) = &dep.product {
        self.product_dependency(product.id(), identifiers);
      }
    }
  }

  fn product_dependency(&mut self, id: &Id, identifiers: &[String]) {
    let (name, package) = match self.store.get_as::<crate::obj::XCSwiftPackageProductDependency>(id) {
      Some(p) => (p.product_name.clone(), p.package.clone()),
      None    => return
    };
    self.fix(id, "XCSwiftPackageProductDependency", &push(identifiers, &name));
    if let Some(package) = package {
      self.package(package.id(), identifiers);
    }
  }

  fn package(&mut self, id: &Id, identifiers: &[String]) {
    match self.store.get(id) {
      Some(Object::XCRemoteSwiftPackageReference(p)) => {
        let path = push(identifiers, p.name());
        self.fix(id, "XCRemoteSwiftPackageReference", &path);
      },
      Some(Object::XCLocalSwiftPackageReference(p)) => {
        let path = push(identifiers, p.name());
        self.fix(id, "XCLocalSwiftPackageReference", &path);
      },
      _ => {}
    }
  }

  /// Objects the walk never reached (orphans, objects behind unknown kinds)
  /// are keyed by isa, display name and store position so they still come
  /// out deterministic.
  fn leftovers(&mut self) {
    let comments = Comments::build(self.store);
    let pending: Vec<(usize, Id, String, String)> = self.store.iter()
      .enumerate()
      .filter(|(_, (id, _))| id.is_temporary() && !self.done.contains(id))
      .map(|(i, (id, object))| {
        let name = crate::obj::display_name(self.store, &comments, id).unwrap_or_default();
        (i, id.clone(), object.isa().to_string(), name)
      })
      .collect();
    for (position, id, isa, name) in pending {
      self.fix(&id, &isa, &[name, position.to_string()]);
    }
  }

  /// Assigns a permanent identifier to `id` if it is temporary and has not
  /// been visited yet. Returns false when the object was already visited.
  fn fix(&mut self, id: &Id, isa: &str, identifiers: &[String]) -> bool {
    if !self.done.insert(id.clone()) {
      return false;
    }
    if !id.is_temporary() {
      return true;
    }

    let content = format!("{}-{}", isa, identifiers.join("-"));
    let mut candidate = digest(&content);
    let mut bump = 0u32;
    while self.taken.contains(&candidate) {
      bump += 1;
      candidate = digest(&format!("{}-{}", content, bump));
    }
    self.taken.insert(candidate.clone());
    self.map.insert(id.clone(), Id::new(candidate));
    true
  }

  /// The identifier value an object will have after remapping.
  fn current_value(&self, id: &Id) -> String {
    self.map.get(id).unwrap_or(id).value().to_string()
  }
}

fn push(identifiers: &[String], next: &str) -> Vec<String> {
  let mut path = identifiers.to_vec();
  path.push(next.to_string());
  path
}

fn digest(content: &str) -> String {
  let mut hex = hex::encode_upper(Sha256::digest(content.as_bytes()));
  hex.truncate(ID_LEN);
  hex
}
