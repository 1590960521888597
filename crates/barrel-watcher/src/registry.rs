//! Global export registry and collision resolution.
//!
//! Every name a barrel re-exports is registered here against the file
//! that owns it. When a second file exports a name that is already
//! taken, its export is aliased as `<name>As<Module>` so the names
//! reachable through nested `export *` lines stay unique.

use barrel_core::{module_identifier, ExportRecord};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maps final export names to the file that owns them.
///
/// Entries are never evicted. A deleted file keeps its names reserved
/// for the lifetime of the registry.
#[derive(Debug, Default, Clone)]
pub struct ExportRegistry {
    owners: HashMap<String, PathBuf>,
}

impl ExportRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a record exported by `file` against the registry.
    ///
    /// A free name, or one already owned by `file`, is kept as-is.
    /// Otherwise the record is renamed to `<name>As<Module>`, with a
    /// numeric suffix if that alias is itself taken by another file.
    /// The final name is registered to `file`.
    pub fn resolve(&mut self, record: ExportRecord, file: &Path) -> ExportRecord {
        self.resolve_claimed(record, file, &mut HashSet::new())
    }

    /// Resolves every record of one file, preserving order.
    ///
    /// Names claimed by earlier records of the same file count as taken,
    /// so a file exporting `Button` both named and as default gets two
    /// distinct names.
    pub fn resolve_all(&mut self, records: Vec<ExportRecord>, file: &Path) -> Vec<ExportRecord> {
        let mut claimed = HashSet::new();
        records
            .into_iter()
            .map(|record| self.resolve_claimed(record, file, &mut claimed))
            .collect()
    }

    fn resolve_claimed(
        &mut self,
        record: ExportRecord,
        file: &Path,
        claimed: &mut HashSet<String>,
    ) -> ExportRecord {
        if self.is_available(&record.name, file, claimed) {
            claimed.insert(record.name.clone());
            self.owners.insert(record.name.clone(), file.to_path_buf());
            return record;
        }

        let base = format!("{}As{}", record.name, module_identifier(file));
        let mut alias = base.clone();
        let mut suffix = 2;
        while !self.is_available(&alias, file, claimed) {
            alias = format!("{}{}", base, suffix);
            suffix += 1;
        }

        debug!(
            "Export '{}' of {} collides, aliased as '{}'",
            record.name,
            file.display(),
            alias
        );

        claimed.insert(alias.clone());
        self.owners.insert(alias.clone(), file.to_path_buf());
        record.renamed(alias)
    }

    /// Returns the file that owns a name.
    pub fn owner(&self, name: &str) -> Option<&Path> {
        self.owners.get(name).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    fn is_available(&self, name: &str, file: &Path, claimed: &HashSet<String>) -> bool {
        if claimed.contains(name) {
            return false;
        }
        match self.owners.get(name) {
            Some(owner) => owner == file,
            None => true,
        }
    }
}
