//! Customer directory snapshot cache

pub mod cache;

pub use cache::{DirectoryCache, DirectorySnapshot, DEFAULT_TTL};
