//! Keeps a static bookmark page in sync with browser bookmark exports and
//! seeds its video list from the public listing API.

pub mod bookmarks;
pub mod categories;
pub mod document;
pub mod error;
pub mod merge;
pub mod progress;
pub mod render;
pub mod videos;

pub use bookmarks::{parse_export, Bookmark, CategoryBuckets};
pub use categories::{CategoryConfig, CategoryMap};
pub use document::{Anchor, TargetDocument};
pub use error::{FetchError, MergeError};
pub use merge::{merge_files, CategoryOutcome, DedupStrategy, MergeEngine, MergeOptions, MergeReport};
