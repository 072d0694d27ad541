#![warn(clippy::unwrap_used)]

pub mod loader;
pub mod local;

pub use loader::{DatasetSource, TableLoader};
pub use local::DatasetCache;
