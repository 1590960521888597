//! Directory indexing.
//!
//! Walks a directory depth-first and regenerates barrel files bottom-up:
//! every subdirectory's barrel is rewritten before the parent line that
//! re-exports it is emitted. All I/O is synchronous, which is what keeps
//! that ordering without any coordination.

use crate::changelog::LogAggregator;
use crate::error::WatcherError;
use crate::registry::ExportRegistry;
use crate::synthesizer::{directory_statement, file_statement};
use barrel_core::extract_exports;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

/// Default name of the generated barrel file.
pub const DEFAULT_BARREL_FILE: &str = "index.tsx";

/// Default component file extensions.
pub const DEFAULT_EXTENSIONS: &[&str] = &["tsx", "jsx"];

/// Options for barrel indexing.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Top-level watch targets. They never get a barrel of their own.
    pub watched_roots: HashSet<PathBuf>,

    /// Absolute paths excluded from export extraction.
    pub ignore_files: HashSet<PathBuf>,

    /// File name of the generated barrel in every directory.
    pub barrel_file_name: String,

    /// Extensions (without the dot) of files that may contribute exports.
    pub extensions: Vec<String>,
}

impl IndexOptions {
    /// Marks a directory as a watched root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.watched_roots.insert(root.into());
        self
    }

    /// Excludes a file from export extraction.
    pub fn ignore(mut self, file: impl Into<PathBuf>) -> Self {
        self.ignore_files.insert(file.into());
        self
    }

    pub fn with_barrel_file_name(mut self, name: impl Into<String>) -> Self {
        self.barrel_file_name = name.into();
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            watched_roots: HashSet::new(),
            ignore_files: HashSet::new(),
            barrel_file_name: DEFAULT_BARREL_FILE.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Result of one `reindex` call, summed over the whole subtree.
#[derive(Debug, Default)]
pub struct IndexReport {
    /// Barrel files written.
    pub barrels_written: usize,

    /// Component files whose exports were extracted.
    pub files_indexed: usize,

    /// Exports found across those files.
    pub exports_found: usize,

    /// Files or directories that could not be processed.
    pub errors: Vec<(PathBuf, String)>,
}

impl IndexReport {
    /// Folds another report into this one.
    pub fn merge(&mut self, other: IndexReport) {
        self.barrels_written += other.barrels_written;
        self.files_indexed += other.files_indexed;
        self.exports_found += other.exports_found;
        self.errors.extend(other.errors);
    }

    fn record_error(&mut self, error: WatcherError) {
        let path = match &error {
            WatcherError::Io { path, .. } => path.clone(),
            WatcherError::Extract(barrel_core::ExtractError::Io { path, .. }) => path.clone(),
            _ => PathBuf::new(),
        };
        warn!("{}", error);
        self.errors.push((path, error.to_string()));
    }
}

/// A listed directory entry.
#[derive(Debug)]
struct Entry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// Regenerates barrel files.
///
/// Owns the export registry and the change log, so both live exactly as
/// long as the indexer does (one per process in the CLI).
#[derive(Debug)]
pub struct Indexer {
    options: IndexOptions,
    registry: ExportRegistry,
    log: LogAggregator,
}

impl Indexer {
    /// Creates an indexer that prints its change log to stdout.
    pub fn new(options: IndexOptions) -> Self {
        Self::with_log(options, LogAggregator::default())
    }

    pub fn with_log(options: IndexOptions, log: LogAggregator) -> Self {
        Self {
            options,
            registry: ExportRegistry::new(),
            log,
        }
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    pub fn registry(&self) -> &ExportRegistry {
        &self.registry
    }

    pub fn log(&self) -> &LogAggregator {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut LogAggregator {
        &mut self.log
    }

    pub fn is_watched_root(&self, dir: &Path) -> bool {
        self.options.watched_roots.contains(dir)
    }

    /// Path of the barrel file for a directory.
    pub fn barrel_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.options.barrel_file_name)
    }

    /// Checks whether a path names a generated barrel file.
    pub fn is_barrel_file(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name == self.options.barrel_file_name.as_str())
            .unwrap_or(false)
    }

    /// Checks whether a file may contribute exports to its directory's barrel.
    pub fn is_component_file(&self, path: &Path) -> bool {
        let has_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.options.extensions.iter().any(|known| known == ext))
            .unwrap_or(false);

        has_extension && !self.is_barrel_file(path) && !self.options.ignore_files.contains(path)
    }

    /// Regenerates the barrels of `dir` and everything below it.
    ///
    /// A missing directory is a warning, not an error. Nothing here
    /// fails the caller: problems are logged and collected in the report.
    pub fn reindex(&mut self, dir: &Path) -> IndexReport {
        let start = Instant::now();
        let mut report = IndexReport::default();

        self.reindex_into(dir, &mut report);

        debug!(
            "Reindexed {}: {} barrels, {} files ({} exports) in {:?}",
            dir.display(),
            report.barrels_written,
            report.files_indexed,
            report.exports_found,
            start.elapsed()
        );

        report
    }

    /// Returns false if the directory was not there to index.
    fn reindex_into(&mut self, dir: &Path, report: &mut IndexReport) -> bool {
        if !dir.is_dir() {
            warn!("Directory not found: {}", dir.display());
            return false;
        }

        let entries = match list_entries(dir) {
            Ok(entries) => entries,
            Err(e) => {
                report.record_error(e);
                return false;
            }
        };

        if self.is_watched_root(dir) {
            for entry in entries.iter().filter(|e| e.is_dir) {
                self.reindex_into(&entry.path, report);
            }
            return true;
        }

        let lines = self.synthesize(dir, &entries, report);
        let barrel = self.barrel_path(dir);

        match fs::write(&barrel, lines.join("\n")) {
            Ok(()) => {
                report.barrels_written += 1;
                self.log.push(format!("Updated {}", barrel.display()));
            }
            // Fatal for this directory only; siblings and parents carry on
            Err(e) => report.record_error(WatcherError::io(&barrel, e)),
        }

        true
    }

    /// Builds the statement lines of one directory's barrel.
    fn synthesize(
        &mut self,
        dir: &Path,
        entries: &[Entry],
        report: &mut IndexReport,
    ) -> Vec<String> {
        let is_root = self.is_watched_root(dir);
        let mut lines = Vec::new();

        for entry in entries {
            if entry.is_dir {
                let indexed = self.reindex_into(&entry.path, report);
                if indexed && !is_root {
                    lines.push(directory_statement(&entry.name));
                }
                continue;
            }

            if !self.is_component_file(&entry.path) {
                continue;
            }

            debug!("Extracting exports from {}", entry.path.display());
            let records = match extract_exports(&entry.path) {
                Ok(records) => records,
                Err(e) => {
                    report.record_error(e.into());
                    continue;
                }
            };

            report.files_indexed += 1;
            report.exports_found += records.len();

            let records = self.registry.resolve_all(records, &entry.path);
            let module = module_name(&entry.path);
            if let Some(line) = file_statement(&module, &records) {
                lines.push(line);
            }
        }

        lines
    }
}

/// Lists a directory sorted by name, so barrel output is stable.
fn list_entries(dir: &Path) -> Result<Vec<Entry>, WatcherError> {
    let read_dir = fs::read_dir(dir).map_err(|e| WatcherError::io(dir, e))?;

    let mut entries = Vec::new();
    for item in read_dir {
        let item = item.map_err(|e| WatcherError::io(dir, e))?;
        let path = item.path();

        let name = match item.file_name().into_string() {
            Ok(name) => name,
            Err(_) => {
                warn!("Skipping non UTF-8 entry: {}", path.display());
                continue;
            }
        };

        // Symlinks are not followed, matching an lstat-based listing
        let is_dir = match item.file_type() {
            Ok(file_type) => file_type.is_dir(),
            Err(e) => {
                warn!("Failed to stat {}: {}", path.display(), e);
                continue;
            }
        };

        entries.push(Entry { name, path, is_dir });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// File name without its extension, as used in `from "./<module>"`.
fn module_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn quiet_indexer(options: IndexOptions) -> Indexer {
        Indexer::with_log(options, LogAggregator::with_sink(Duration::from_millis(500), |_| {}))
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_missing_directory_is_noop() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");

        let mut indexer = quiet_indexer(IndexOptions::default());
        let report = indexer.reindex(&missing);

        assert_eq!(report.barrels_written, 0);
        assert!(report.errors.is_empty());
        assert!(!missing.exists());
        assert!(indexer.log().pending().is_empty());
    }

    #[test]
    fn test_one_line_per_exporting_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Button.tsx"), "export function Button() {}").unwrap();
        fs::write(dir.path().join("Avatar.jsx"), "export const Avatar = () => null;").unwrap();
        fs::write(dir.path().join("helpers.tsx"), "const local = 1;").unwrap();
        fs::write(dir.path().join("theme.ts"), "export const theme = {};").unwrap();
        fs::write(dir.path().join("styles.css"), ".button {}").unwrap();

        let mut indexer = quiet_indexer(IndexOptions::default());
        let report = indexer.reindex(dir.path());

        assert_eq!(report.barrels_written, 1);
        assert_eq!(report.files_indexed, 3);
        assert_eq!(
            read(&dir.path().join("index.tsx")),
            "export { Avatar } from \"./Avatar\";\nexport { Button } from \"./Button\";"
        );
    }

    #[test]
    fn test_reindex_is_idempotent() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("forms")).unwrap();
        fs::write(dir.path().join("forms/Input.tsx"), "export default function Input() {}").unwrap();
        fs::write(dir.path().join("a.tsx"), "export const Foo = 1;").unwrap();
        fs::write(dir.path().join("b.tsx"), "export const Foo = 2;\nexport default Bar;").unwrap();

        let mut indexer = quiet_indexer(IndexOptions::default());
        indexer.reindex(dir.path());
        let first = read(&dir.path().join("index.tsx"));

        indexer.reindex(dir.path());
        let second = read(&dir.path().join("index.tsx"));

        assert_eq!(first, second);
        assert_eq!(
            second,
            "export { Foo } from \"./a\";\n\
             export { default as Bar, Foo as FooAsB } from \"./b\";\n\
             export * from \"./forms\";"
        );
    }

    #[test]
    fn test_collision_aliases_later_file() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.tsx");
        let b = dir.path().join("b.tsx");
        fs::write(&a, "export const Foo = 1;").unwrap();
        fs::write(&b, "export const Foo = 2;").unwrap();

        let mut indexer = quiet_indexer(IndexOptions::default());
        indexer.reindex(dir.path());

        assert_eq!(
            read(&dir.path().join("index.tsx")),
            "export { Foo } from \"./a\";\nexport { Foo as FooAsB } from \"./b\";"
        );
        assert_eq!(indexer.registry().owner("Foo"), Some(a.as_path()));
        assert_eq!(indexer.registry().owner("FooAsB"), Some(b.as_path()));
    }

    #[test]
    fn test_named_and_default_of_same_symbol() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("Button.tsx"),
            "export function Button() {}\nexport default Button;",
        )
        .unwrap();

        let mut indexer = quiet_indexer(IndexOptions::default());
        indexer.reindex(dir.path());
        let expected = "export { default as ButtonAsButton, Button } from \"./Button\";";
        assert_eq!(read(&dir.path().join("index.tsx")), expected);

        indexer.reindex(dir.path());
        assert_eq!(read(&dir.path().join("index.tsx")), expected);
    }

    #[test]
    fn test_collision_across_directories() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("cards")).unwrap();
        fs::create_dir(dir.path().join("lists")).unwrap();
        fs::write(dir.path().join("cards/Item.tsx"), "export const Item = 1;").unwrap();
        fs::write(dir.path().join("lists/Row.tsx"), "export const Item = 2;").unwrap();

        let mut indexer = quiet_indexer(IndexOptions::default());
        indexer.reindex(dir.path());

        assert_eq!(
            read(&dir.path().join("lists/index.tsx")),
            "export { Item as ItemAsRow } from \"./Row\";"
        );
    }

    #[test]
    fn test_watched_root_gets_no_barrel() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("app");
        fs::create_dir_all(root.join("ui")).unwrap();
        fs::write(root.join("layout.tsx"), "export const Layout = 1;").unwrap();
        fs::write(root.join("ui/Card.tsx"), "export const Card = 1;").unwrap();

        let mut indexer = quiet_indexer(IndexOptions::default().with_root(&root));
        let report = indexer.reindex(&root);

        assert!(!root.join("index.tsx").exists());
        assert_eq!(read(&root.join("ui/index.tsx")), "export { Card } from \"./Card\";");
        assert_eq!(report.barrels_written, 1);
        // The root's own files are not aggregated anywhere
        assert_eq!(indexer.registry().owner("Layout"), None);
    }

    #[test]
    fn test_children_written_before_parent() {
        let dir = tempdir().unwrap();
        let child = dir.path().join("widgets");
        fs::create_dir(&child).unwrap();
        fs::write(child.join("Dial.tsx"), "export const Dial = 1;").unwrap();

        let mut indexer = quiet_indexer(IndexOptions::default());
        indexer.reindex(dir.path());

        assert_eq!(
            indexer.log().pending(),
            &[
                format!("Updated {}", child.join("index.tsx").display()),
                format!("Updated {}", dir.path().join("index.tsx").display()),
            ]
        );
        assert_eq!(read(&dir.path().join("index.tsx")), "export * from \"./widgets\";");
    }

    #[test]
    fn test_sole_default_export_reexports_module() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("widget.tsx"),
            "export default function Widget() {}",
        )
        .unwrap();

        let mut indexer = quiet_indexer(IndexOptions::default());
        indexer.reindex(dir.path());

        assert_eq!(read(&dir.path().join("index.tsx")), "export * from \"./widget\";");
    }

    #[test]
    fn test_ignored_and_barrel_files_skipped() {
        let dir = tempdir().unwrap();
        let ignored = dir.path().join("Legacy.tsx");
        fs::write(&ignored, "export const Legacy = 1;").unwrap();
        fs::write(dir.path().join("Modern.tsx"), "export const Modern = 1;").unwrap();
        fs::write(dir.path().join("index.tsx"), "export const Stale = 1;").unwrap();

        let mut indexer = quiet_indexer(IndexOptions::default().ignore(&ignored));
        indexer.reindex(dir.path());

        assert_eq!(read(&dir.path().join("index.tsx")), "export { Modern } from \"./Modern\";");
    }

    #[test]
    fn test_custom_barrel_name_and_extensions() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("api.ts"), "export const api = 1;").unwrap();
        fs::write(dir.path().join("View.tsx"), "export const View = 1;").unwrap();

        let options = IndexOptions::default()
            .with_barrel_file_name("index.ts")
            .with_extensions(["ts"]);
        let mut indexer = quiet_indexer(options);
        indexer.reindex(dir.path());

        assert_eq!(read(&dir.path().join("index.ts")), "export { api } from \"./api\";");
        assert!(!dir.path().join("index.tsx").exists());
    }

    #[test]
    fn test_unreadable_file_contributes_nothing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Broken.tsx"), [0xff, 0xfe, 0x00, 0x9f]).unwrap();
        fs::write(dir.path().join("Good.tsx"), "export const Good = 1;").unwrap();

        let mut indexer = quiet_indexer(IndexOptions::default());
        let report = indexer.reindex(dir.path());

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].0, dir.path().join("Broken.tsx"));
        assert_eq!(read(&dir.path().join("index.tsx")), "export { Good } from \"./Good\";");
    }

    #[test]
    fn test_removed_subdirectory_drops_line() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("Thing.tsx"), "export const Thing = 1;").unwrap();
        fs::write(dir.path().join("Top.tsx"), "export const Top = 1;").unwrap();

        let mut indexer = quiet_indexer(IndexOptions::default());
        indexer.reindex(dir.path());
        assert!(read(&dir.path().join("index.tsx")).contains("export * from \"./sub\";"));

        fs::remove_dir_all(&sub).unwrap();
        indexer.reindex(dir.path());
        assert_eq!(read(&dir.path().join("index.tsx")), "export { Top } from \"./Top\";");

        // The orphaned subdirectory can still be asked for without panicking
        let report = indexer.reindex(&sub);
        assert_eq!(report.barrels_written, 0);
    }

    #[test]
    fn test_report_merge() {
        let mut total = IndexReport::default();
        total.merge(IndexReport {
            barrels_written: 2,
            files_indexed: 3,
            exports_found: 5,
            errors: vec![(PathBuf::from("/x.tsx"), "bad".into())],
        });
        total.merge(IndexReport {
            barrels_written: 1,
            ..Default::default()
        });

        assert_eq!(total.barrels_written, 3);
        assert_eq!(total.files_indexed, 3);
        assert_eq!(total.errors.len(), 1);
    }
}
