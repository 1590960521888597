//! Barrel Watcher - barrel indexing and live regeneration
//!
//! This crate handles the file system side of things:
//! - Walking directories depth-first and rewriting their barrel files
//! - Resolving export name collisions across the whole tree
//! - Watching directories and re-indexing on every change
//! - Batching change notifications into one printed block per quiet period

mod changelog;
mod error;
mod indexer;
mod registry;
mod synthesizer;
mod watcher;

pub use changelog::{DebounceTimer, LogAggregator, DEFAULT_DEBOUNCE};
pub use error::{Result, WatcherError};
pub use indexer::{IndexOptions, IndexReport, Indexer, DEFAULT_BARREL_FILE, DEFAULT_EXTENSIONS};
pub use registry::ExportRegistry;
pub use synthesizer::{directory_statement, file_statement};
pub use watcher::{FsChange, ShutdownHandle, WatchSession};
