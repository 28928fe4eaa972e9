//! Git access for the mold engine
//!
//! All version-control work (remote tag and branch queries, bare clones,
//! archives) goes through the [`GitRunner`] trait. [`CommandGit`] shells out
//! to the system `git`.

mod command;
#[cfg(test)]
pub(crate) mod fake;
mod runner;

pub use command::CommandGit;
pub use runner::GitRunner;
