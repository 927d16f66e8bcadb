//! Target dependencies and the proxies that let them cross project
//! boundaries.

use crate::err::Result;
use crate::id::Id;
use crate::plist::{Dict, Value};
use crate::store::{AnyRef, DecodeContext, Ref, Store};

use super::file::opt_entry;
use super::{isa_value, opt_ref, opt_str, ref_value, req_ref, Comments,
            XCSwiftPackageProductDependency};

/// Stand-in for an object that may live in another project file. The remote
/// global ID is kept as an opaque identifier: it resolves locally for
/// same-project dependencies and dangles by design for cross-project ones.
#[derive(Clone, Debug, PartialEq)]
pub struct PBXContainerItemProxy {
  pub container_portal: AnyRef,
  pub proxy_type:       Option<String>,
  pub remote_global_id: Option<Id>,
  pub remote_info:      Option<String>
}

impl PBXContainerItemProxy {
  pub(crate) fn decode(id: &str, dict: &Dict, ctx: &mut DecodeContext) -> Result<Self> {
    Ok(PBXContainerItemProxy {
      container_portal: req_ref(id, dict, "containerPortal", ctx)?,
      proxy_type:       opt_str(dict, "proxyType"),
      remote_global_id: opt_str(dict, "remoteGlobalIDString").map(|s| ctx.id(&s)),
      remote_info:      opt_str(dict, "remoteInfo")
    })
  }

  pub(crate) fn encode(&self, store: &Store, comments: &Comments) -> Dict {
    let mut d = Dict::new();
    d.extend([isa_value("PBXContainerItemProxy")]);
    d.insert("containerPortal".to_string(),
             ref_value(store, comments, self.container_portal.id()));
    opt_entry(&mut d, "proxyType", &self.proxy_type);
    if let Some(remote) = &self.remote_global_id {
      d.insert("remoteGlobalIDString".to_string(), Value::string(remote.value()));
    }
    opt_entry(&mut d, "remoteInfo", &self.remote_info);
    d
  }

  // The remote global ID is deliberately absent here; see visit_refs_mut.
  pub(crate) fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
    f(self.container_portal.id());
  }

  pub(crate) fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
    f(self.container_portal.id_mut());
    if let Some(remote) = &mut self.remote_global_id {
      f(remote);
    }
  }
}

/// One target's build-order dependency on another, usually routed through a
/// container item proxy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PBXTargetDependency {
  pub name:         Option<String>,
  pub target:       Option<AnyRef>,
  pub target_proxy: Option<Ref<PBXContainerItemProxy>>,
  pub product:      Option<Ref<XCSwiftPackageProductDependency>>
}

impl PBXTargetDependency {
  pub(crate) fn decode(_id: &str, dict: &Dict, ctx: &mut DecodeContext) -> Result<Self> {
    Ok(PBXTargetDependency {
      name:         opt_str(dict, "name"),
      target:       opt_ref(dict, "target", ctx),
      target_proxy: opt_ref(dict, "targetProxy", ctx),
      product:      opt_ref(dict, "productRef", ctx)
    })
  }

  pub(crate) fn encode(&self, store: &Store, comments: &Comments) -> Dict {
    let mut d = Dict::new();
    d.extend([isa_value("PBXTargetDependency")]);
    opt_entry(&mut d, "name", &self.name);
    if let Some(target) = &self.target {
      d.insert("target".to_string(), ref_value(store, comments, target.id()));
    }
    if let Some(proxy) = &self.target_proxy {
      d.insert("targetProxy".to_string(), ref_value(store, comments, proxy.id()));
    }
    if let Some(product) = &self.product {
      d.insert("productRef".to_string(), ref_value(store, comments, product.id()));
    }
    d
  }

  pub(crate) fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
    if let Some(r) = &self.target {
      f(r.id());
    }
    if let Some(r) = &self.target_proxy {
      f(r.id());
    }
    if let Some(r) = &self.product {
      f(r.id());
    }
  }

  pub(crate) fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
    if let Some(r) = &mut self.target {
      f(r.id_mut());
    }
    if let Some(r) = &mut self.target_proxy {
      f(r.id_mut());
    }
    if let Some(r) = &mut self.product {
      f(r.id_mut());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::plist::parse;

  #[test]
  fn proxy_requires_a_container_portal() {
    let dict = parse("{ isa = PBXContainerItemProxy; proxyType = 1; }").unwrap();
    let mut ctx = DecodeContext::new();
    match PBXContainerItemProxy::decode("AA", &dict, &mut ctx) {
      Err(crate::err::Error::MissingField { field: "containerPortal", .. }) => {},
      other => panic!("expected MissingField, got {:?}", other)
    }
  }

  #[test]
  fn remote_global_id_is_not_validated_as_a_local_reference() {
    let dict = parse(concat!(
      "{ isa = PBXContainerItemProxy; containerPortal = 97C146E61CF9000F007C117D; ",
      "proxyType = 1; remoteGlobalIDString = FFFFFFFFFFFFFFFFFFFFFFFF; ",
      "remoteInfo = Framework; }")).unwrap();
    let mut ctx = DecodeContext::new();
    let p = PBXContainerItemProxy::decode("AA", &dict, &mut ctx).unwrap();

    let mut validated = Vec::new();
    p.visit_refs(&mut |id| validated.push(id.value().to_string()));
    assert_eq!(validated, vec!["97C146E61CF9000F007C117D".to_string()]);

    let mut rewritten = Vec::new();
    let mut p = p;
    p.visit_refs_mut(&mut |id| rewritten.push(id.value().to_string()));
    assert!(rewritten.contains(&"FFFFFFFFFFFFFFFFFFFFFFFF".to_string()));
  }
}
