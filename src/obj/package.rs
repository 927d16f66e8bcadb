//! Swift package references and the product dependencies drawn from them.

use crate::err::Result;
use crate::id::Id;
use crate::plist::{Dict, Value};
use crate::store::{DecodeContext, Ref, Store};

use super::{isa_value, opt_dict, opt_ref, ref_value, req_str, Comments};

/// A package fetched from a repository URL, pinned by a version requirement.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XCRemoteSwiftPackageReference {
  pub repository_url: String,
  /// The version requirement dictionary as written, e.g.
  /// `{ kind = upToNextMajorVersion; minimumVersion = 1.2.0; }`.
  pub requirement:    Option<Dict>
}

impl XCRemoteSwiftPackageReference {
  /// The package name Xcode derives from the URL: the last path component,
  /// minus a `.git` suffix.
  pub fn name(&self) -> &str {
    let last = self.repository_url
      .trim_end_matches('/')
      .rsplit('/')
      .next()
      .unwrap_or(&self.repository_url);
    last.strip_suffix(".git").unwrap_or(last)
  }

  pub(crate) fn decode(id: &str, dict: &Dict, _ctx: &mut DecodeContext) -> Result<Self> {
    Ok(XCRemoteSwiftPackageReference {
      repository_url: req_str(id, dict, "repositoryURL")?,
      requirement:    opt_dict(dict, "requirement")
    })
  }

  pub(crate) fn encode(&self, _store: &Store, _comments: &Comments) -> Dict {
    let mut d = Dict::new();
    d.extend([isa_value("XCRemoteSwiftPackageReference")]);
    d.insert("repositoryURL".to_string(), Value::string(self.repository_url.clone()));
    if let Some(requirement) = &self.requirement {
      d.insert("requirement".to_string(), Value::Dict(requirement.clone()));
    }
    d
  }

  pub(crate) fn visit_refs(&self, _f: &mut dyn FnMut(&Id)) {}

  pub(crate) fn visit_refs_mut(&mut self, _f: &mut dyn FnMut(&mut Id)) {}
}

/// A package vendored next to the project, addressed by relative path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XCLocalSwiftPackageReference {
  pub relative_path: String
}

impl XCLocalSwiftPackageReference {
  pub fn name(&self) -> &str {
    self.relative_path
      .trim_end_matches('/')
      .rsplit('/')
      .next()
      .unwrap_or(&self.relative_path)
  }

  pub(crate) fn decode(id: &str, dict: &Dict, _ctx: &mut DecodeContext) -> Result<Self> {
    Ok(XCLocalSwiftPackageReference {
      relative_path: req_str(id, dict, "relativePath")?
    })
  }

  pub(crate) fn encode(&self, _store: &Store, _comments: &Comments) -> Dict {
    let mut d = Dict::new();
    d.extend([isa_value("XCLocalSwiftPackageReference")]);
    d.insert("relativePath".to_string(), Value::string(self.relative_path.clone()));
    d
  }

  pub(crate) fn visit_refs(&self, _f: &mut dyn FnMut(&Id)) {}

  pub(crate) fn visit_refs_mut(&mut self, _f: &mut dyn FnMut(&mut Id)) {}
}

/// One product of a package, as consumed by a target.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XCSwiftPackageProductDependency {
  pub product_name: String,
  pub package:      Option<Ref<XCRemoteSwiftPackageReference>>
}

impl XCSwiftPackageProductDependency {
  pub(crate) fn decode(id: &str, dict: &Dict, ctx: &mut DecodeContext) -> Result<Self> {
    Ok(XCSwiftPackageProductDependency {
      product_name: req_str(id, dict, "productName")?,
      package:      opt_ref(dict, "package", ctx)
    })
  }

  pub(crate) fn encode(&self, store: &Store, comments: &Comments) -> Dict {
    let mut d = Dict::new();
    d.extend([isa_value("XCSwiftPackageProductDependency")]);
    if let Some(package) = &self.package {
      d.insert("package".to_string(), ref_value(store, comments, package.id()));
    }
    d.insert("productName".to_string(), Value::string(self.product_name.clone()));
    d
  }

  pub(crate) fn visit_refs(&self, f: &mut dyn FnMut(&Id)) {
    if let Some(r) = &self.package {
      f(r.id());
    }
  }

  pub(crate) fn visit_refs_mut(&mut self, f: &mut dyn FnMut(&mut Id)) {
    if let Some(r) = &mut self.package {
      f(r.id_mut());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn package_name_comes_from_the_url() {
    let p = XCRemoteSwiftPackageReference {
      repository_url: "https://github.com/apple/swift-log.git".to_string(),
      requirement:    None
    };
    assert_eq!(p.name(), "swift-log");

    let p = XCRemoteSwiftPackageReference {
      repository_url: "https://github.com/apple/swift-nio/".to_string(),
      requirement:    None
    };
    assert_eq!(p.name(), "swift-nio");
  }

  #[test]
  fn local_package_name_is_the_last_path_component() {
    let p = XCLocalSwiftPackageReference { relative_path: "Vendor/MyLib".to_string() };
    assert_eq!(p.name(), "MyLib");
  }
}
