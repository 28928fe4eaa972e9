//! Ailloy - versioned mold bundles from git
//!
//! Resolves mold references such as `github.com/acme/widget@^1.0.0//molds/claude`
//! against their origin repositories, caches immutable snapshots on disk,
//! and pins every resolution in a lock file.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod mold;

pub use error::{AilloyError, AilloyResult};
