//! Barrel Core - export extraction for barrel generation
//!
//! This crate answers one question for the rest of the workspace: which
//! symbols does a component file export? It parses the file with
//! Tree-sitter and reports named exports in source order, followed by the
//! default export.
//!
//! # Example
//!
//! ```no_run
//! use barrel_core::extract_exports;
//! use std::path::Path;
//!
//! let records = extract_exports(Path::new("app/components/Button.tsx")).unwrap();
//! for record in records {
//!     println!("{} ({})", record.name, record.kind);
//! }
//! ```

pub mod error;
pub mod export;
pub mod extractor;

pub use error::{ExtractError, Result};
pub use export::{module_identifier, ExportKind, ExportRecord};
pub use extractor::{extract_exports, extract_source};
