//! Local mold cache
//!
//! Each origin repository gets one directory under the cache root holding a
//! bare clone plus one extracted snapshot per resolved version. Snapshots are
//! written once and never modified after their manifest is in place.
//!
//! # Security Model
//!
//! - All path composition goes through [`paths::safe_join`]
//! - Tar entries that would land outside the snapshot abort extraction
//! - Cleaning only ever deletes strict descendants of the cache root

pub mod archive;
pub mod layout;
pub mod paths;

pub use archive::extract_tar;
pub use layout::{find_manifest, CacheLayout, CachedMold, MANIFEST_FILES};
pub use paths::safe_join;
