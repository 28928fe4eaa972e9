//! CLI command implementations

pub mod cache;
pub mod fetch;
pub mod lock;

pub use cache::execute as cache;
pub use fetch::execute as fetch;
pub use lock::execute as lock;
