//! dircloud: browse `du` reports as a size-weighted word cloud
//!
//! The core is [`tree::Tree`], a path-indexed store of sizes and
//! timestamps built from a report by [`loader`] and held per generation
//! by [`store::TreeStore`]. The remaining modules read the real disk,
//! search, render HTML and serve it over HTTP.

pub mod cloud;
pub mod dict;
pub mod disk;
pub mod error;
pub mod fallback;
pub mod format;
pub mod loader;
pub mod pathkey;
pub mod scanner;
pub mod search;
pub mod server;
pub mod settings;
pub mod sort;
pub mod space;
pub mod store;
pub mod tree;

pub use pathkey::PathKey;
pub use sort::SortPolicy;
pub use store::TreeStore;
pub use tree::{Child, Tree, TreeOptions};
