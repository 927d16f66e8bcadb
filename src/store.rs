//! The object store and its reference machinery.
//!
//! Every build object lives in exactly one [`Store`], keyed by identifier;
//! this is the single source of truth. References between objects are plain
//! lookup keys ([`Ref`]), never pointers, so the cyclic shape of the graph
//! (a project refers to its targets, which refer back through dependency
//! proxies) costs nothing: removal from the store is the only destruction
//! event, and a dereference always sees the current state because it
//! re-queries the store every time.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use indexmap::IndexMap;

use crate::id::Id;
use crate::obj::{Comments, Object, ObjectKind};
use crate::plist::Value;

/// Insertion-ordered arena of build objects.
#[derive(Clone, Debug, Default)]
pub struct Store {
  objects: IndexMap<Id, Object>
}

impl Store {
  pub fn new() -> Self {
    Store { objects: IndexMap::new() }
  }

  /// Stores an object under a fresh temporary identifier.
  pub fn insert(&mut self, object: Object) -> Id {
    let id = Id::temporary();
    self.objects.insert(id.clone(), object);
    id
  }

  /// Stores a typed object and hands back a typed reference to it.
  pub fn add<T: ObjectKind>(&mut self, object: T) -> Ref<T> {
    Ref::new(self.insert(object.into_object()))
  }

  /// Stores an object under a known identifier, replacing any previous one.
  pub fn insert_with_id(&mut self, id: Id, object: Object) {
    self.objects.insert(id, object);
  }

  pub fn get(&self, id: &Id) -> Option<&Object> {
    self.objects.get(id)
  }

  pub fn get_mut(&mut self, id: &Id) -> Option<&mut Object> {
    self.objects.get_mut(id)
  }

  /// Typed lookup. Absent identifier and kind mismatch both come back as
  /// `None`; a stale reference is an expected condition, not a crash.
  pub fn get_as<T: ObjectKind>(&self, id: &Id) -> Option<&T> {
    self.objects.get(id).and_then(T::from_object)
  }

  pub fn get_as_mut<T: ObjectKind>(&mut self, id: &Id) -> Option<&mut T> {
    self.objects.get_mut(id).and_then(T::from_object_mut)
  }

  /// Removes an object. Does not cascade: references elsewhere now dangle
  /// and it is the caller's job to null them out or accept the validation
  /// error at write time.
  pub fn remove(&mut self, id: &Id) -> Option<Object> {
    self.objects.shift_remove(id)
  }

  pub fn contains(&self, id: &Id) -> bool {
    self.objects.contains_key(id)
  }

  pub fn len(&self) -> usize {
    self.objects.len()
  }

  pub fn is_empty(&self) -> bool {
    self.objects.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&Id, &Object)> {
    self.objects.iter()
  }

  pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Id, &mut Object)> {
    self.objects.iter_mut()
  }

  pub fn ids(&self) -> impl Iterator<Item = &Id> {
    self.objects.keys()
  }

  /// Rewrites identifiers across the whole store: the keys themselves and
  /// every inbound reference held by any object, preserving insertion order.
  pub(crate) fn remap(&mut self, map: &HashMap<Id, Id>) {
    if map.is_empty() {
      return;
    }
    let old = std::mem::take(&mut self.objects);
    for (id, mut object) in old {
      object.visit_refs_mut(&mut |r| {
        if let Some(new) = map.get(r) {
          *r = new.clone();
        }
      });
      let key = map.get(&id).cloned().unwrap_or(id);
      self.objects.insert(key, object);
    }
  }
}

/// A typed, lazy reference: an identifier plus the kind it is expected to
/// resolve to. Dereferencing looks the object up at use time and never
/// caches, because the target may be replaced or removed long after the
/// reference was created.
pub struct Ref<T> {
  id:    Id,
  _kind: PhantomData<fn() -> T>
}

/// Reference into a heterogeneous slot (file elements, build phases,
/// targets of any kind).
pub type AnyRef = Ref<Object>;

impl<T: ObjectKind> Ref<T> {
  pub fn new(id: Id) -> Self {
    Ref { id, _kind: PhantomData }
  }

  pub fn id(&self) -> &Id {
    &self.id
  }

  pub(crate) fn id_mut(&mut self) -> &mut Id {
    &mut self.id
  }

  pub fn get<'a>(&self, store: &'a Store) -> Option<&'a T> {
    store.get_as(&self.id)
  }

  pub fn get_mut<'a>(&self, store: &'a mut Store) -> Option<&'a mut T> {
    store.get_as_mut(&self.id)
  }
}

impl<T> Clone for Ref<T> {
  fn clone(&self) -> Self {
    Ref { id: self.id.clone(), _kind: PhantomData }
  }
}

impl<T> PartialEq for Ref<T> {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl<T> Eq for Ref<T> {}

impl<T> Hash for Ref<T> {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl<T> fmt::Debug for Ref<T> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "Ref({})", self.id)
  }
}

/// Per-parse state threaded through recursive decoding. Interns textual
/// identifiers so the same token yields the same [`Id`] no matter which
/// decode call sees it first; forward references to objects that have not
/// been materialized yet are therefore free.
#[derive(Default)]
pub struct DecodeContext {
  ids: HashMap<String, Id>
}

impl DecodeContext {
  pub fn new() -> Self {
    DecodeContext { ids: HashMap::new() }
  }

  pub fn id(&mut self, value: &str) -> Id {
    self.ids.entry(value.to_string()).or_insert_with(|| Id::new(value)).clone()
  }

  pub fn reference<T: ObjectKind>(&mut self, value: &str) -> Ref<T> {
    Ref::new(self.id(value))
  }
}

/// Deep structural equality between two objects that may live in different
/// stores. Non-reference fields must match exactly; reference fields must
/// point at targets that are themselves structurally equal. Identifier
/// values are allowed to differ, so two independently generated graphs can
/// still describe "the same project".
pub fn deep_equal(a: &Store, a_id: &Id, b: &Store, b_id: &Id) -> bool {
  let ca = Comments::build(a);
  let cb = Comments::build(b);
  let mut assumed = HashSet::new();
  eq_objects(a, &ca, a_id, b, &cb, b_id, &mut assumed)
}

#[allow(clippy::too_many_arguments)]
fn eq_objects(a: &Store, ca: &Comments, a_id: &Id,
              b: &Store, cb: &Comments, b_id: &Id,
              assumed: &mut HashSet<(Id, Id)>) -> bool {
  // Cycle guard: a pair under comparison is assumed equal until a field
  // proves otherwise.
  if !assumed.insert((a_id.clone(), b_id.clone())) {
    return true;
  }

  match (a.get(a_id), b.get(b_id)) {
    (Some(oa), Some(ob)) => {
      oa.isa() == ob.isa()
        && eq_values(a, ca, &Value::Dict(oa.encode(a, ca)),
                     b, cb, &Value::Dict(ob.encode(b, cb)),
                     assumed)
    },
    _ => false
  }
}

#[allow(clippy::too_many_arguments)]
fn eq_values(a: &Store, ca: &Comments, va: &Value,
             b: &Store, cb: &Comments, vb: &Value,
             assumed: &mut HashSet<(Id, Id)>) -> bool {
  match (va, vb) {
    (Value::String(sa), Value::String(sb)) => {
      // A string is treated as a reference when it resolves in its own
      // store. References are compared by target structure, never by
      // identifier value, which may coincide or differ for free.
      let ia = Id::new(&sa.string);
      let ib = Id::new(&sb.string);
      let ref_a = Id::looks_like_id(&sa.string) && a.contains(&ia);
      let ref_b = Id::looks_like_id(&sb.string) && b.contains(&ib);
      match (ref_a, ref_b) {
        (true, true)   => eq_objects(a, ca, &ia, b, cb, &ib, assumed),
        (false, false) => sa.string == sb.string,
        _              => false
      }
    },
    (Value::Array(xa), Value::Array(xb)) => {
      xa.len() == xb.len()
        && xa.iter().zip(xb).all(|(va, vb)| eq_values(a, ca, va, b, cb, vb, assumed))
    },
    (Value::Dict(da), Value::Dict(db)) => {
      da.len() == db.len()
        && da.iter().all(|(k, va)| {
          match db.get(k) {
            Some(vb) => eq_values(a, ca, va, b, cb, vb, assumed),
            None     => false
          }
        })
    },
    _ => false
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::obj::{PBXFileReference, PBXGroup};

  fn file_ref(name: &str) -> PBXFileReference {
    PBXFileReference {
      name: Some(name.to_string()),
      path: Some(name.to_string()),
      source_tree: Some("<group>".to_string()),
      ..Default::default()
    }
  }

  #[test]
  fn references_resolve_through_the_store() {
    let mut store = Store::new();
    let r = store.add(file_ref("main.c"));
    assert_eq!(r.get(&store).unwrap().name.as_deref(), Some("main.c"));

    // Mutation through one handle is visible through every other.
    let r2 = r.clone();
    r.get_mut(&mut store).unwrap().name = Some("other.c".to_string());
    assert_eq!(r2.get(&store).unwrap().name.as_deref(), Some("other.c"));
  }

  #[test]
  fn removed_targets_dereference_to_none() {
    let mut store = Store::new();
    let r = store.add(file_ref("gone.c"));
    assert!(store.remove(r.id()).is_some());
    assert!(r.get(&store).is_none());
    assert!(store.remove(r.id()).is_none());
  }

  #[test]
  fn kind_mismatch_is_not_found() {
    let mut store = Store::new();
    let r = store.add(file_ref("main.c"));
    assert!(store.get_as::<PBXGroup>(r.id()).is_none());
    assert!(store.get_as::<PBXFileReference>(r.id()).is_some());
  }

  #[test]
  fn decode_context_interns_identifiers() {
    let mut ctx = DecodeContext::new();
    let a: AnyRef = ctx.reference("97C146E61CF9000F007C117D");
    let b: AnyRef = ctx.reference("97C146E61CF9000F007C117D");
    let c: AnyRef = ctx.reference("97C146EB1CF9000F007C117D");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(!a.id().is_temporary());
  }

  #[test]
  fn deep_equality_ignores_identifier_values() {
    let mut a = Store::new();
    let mut b = Store::new();

    let fa = a.add(file_ref("main.c"));
    let fb = b.add(file_ref("main.c"));

    let ga = a.add(PBXGroup {
      children: vec![crate::obj::erase(&fa)],
      name: Some("Sources".to_string()),
      ..Default::default()
    });
    let gb = b.add(PBXGroup {
      children: vec![crate::obj::erase(&fb)],
      name: Some("Sources".to_string()),
      ..Default::default()
    });

    assert!(deep_equal(&a, ga.id(), &b, gb.id()));

    fb.get_mut(&mut b).unwrap().path = Some("other.c".to_string());
    assert!(!deep_equal(&a, ga.id(), &b, gb.id()));
  }
}
