//! Model and codec for Xcode `project.pbxproj` documents.
//!
//! A document is an object graph: a [`Store`](store::Store) of typed build
//! objects addressed by 24-character identifiers, wrapped by
//! [`Pbxproj`](proj::Pbxproj) which carries the top-level scalars and knows
//! how to read and write the NeXTSTEP ASCII plist format byte-compatibly
//! with Xcode.

pub mod err;
pub mod id;
pub mod obj;
pub mod plist;
pub mod proj;
pub mod refgen;
pub mod store;
pub mod workspace;

pub use err::{Error, Result};
pub use id::Id;
pub use proj::Pbxproj;
pub use store::{deep_equal, AnyRef, DecodeContext, Ref, Store};
pub use workspace::{WorkspaceLocation, XCWorkspaceData};
