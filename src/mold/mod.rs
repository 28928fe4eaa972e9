//! Mold resolution engine
//!
//! A mold is a versioned bundle of templates living in an ordinary git
//! repository. This module turns a reference string into a cached, validated
//! directory:
//!
//! ```text
//! reference ──parse──▶ Reference ──lock / remote──▶ ResolvedVersion
//!     ──fetch──▶ cache snapshot ──subpath──▶ MoldView
//! ```

pub mod fetch;
pub mod lockfile;
pub mod reference;
pub mod resolver;
pub mod version;
pub mod view;

pub use fetch::Fetcher;
pub use lockfile::{LockEntry, LockFile, LOCKFILE_NAME};
pub use reference::{is_remote_reference, Reference, SpecifierKind};
pub use resolver::{MoldResolver, ResolvedMold};
pub use version::{resolve_version, Constraint, ResolvedVersion};
pub use view::MoldView;
