//! Export record representation.
//!
//! An ExportRecord is one symbol a source file makes importable. Records
//! are produced per file by the extractor, possibly renamed by the
//! collision resolver, and consumed immediately by statement synthesis.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// How a symbol is exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    /// Exported under its own declared identifier.
    Named,
    /// The module's single privileged export.
    Default,
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Named => "named",
            Self::Default => "default",
        };
        write!(f, "{}", s)
    }
}

/// A symbol exported by one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// The name the barrel re-exports the symbol under.
    pub name: String,

    /// Named or default.
    pub kind: ExportKind,

    /// The identifier actually declared in the source file. Only set when
    /// `name` was rewritten to avoid a collision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
}

impl ExportRecord {
    /// Creates a named export record.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ExportKind::Named,
            original_name: None,
        }
    }

    /// Creates a default export record.
    pub fn default_export(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ExportKind::Default,
            original_name: None,
        }
    }

    pub fn is_default(&self) -> bool {
        self.kind == ExportKind::Default
    }

    /// Renames the record, remembering the declared identifier.
    ///
    /// Renaming twice keeps the first original name.
    pub fn renamed(mut self, alias: impl Into<String>) -> Self {
        let previous = std::mem::replace(&mut self.name, alias.into());
        if self.original_name.is_none() {
            self.original_name = Some(previous);
        }
        self
    }

    /// The identifier declared in the source file.
    pub fn source_name(&self) -> &str {
        self.original_name.as_deref().unwrap_or(&self.name)
    }
}

/// Renders the record as a barrel item: `name` or `original as name`.
impl fmt::Display for ExportRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.original_name {
            Some(original) => write!(f, "{} as {}", original, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Converts a file's stem into a PascalCase identifier.
///
/// `my-widget.tsx` becomes `MyWidget`, `b.tsx` becomes `B`. Used as the
/// alias suffix for colliding exports and as the name of anonymous
/// default exports.
pub fn module_identifier(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut ident = String::with_capacity(stem.len());
    for segment in stem.split(|c: char| !(c.is_alphanumeric() || c == '$')) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            ident.extend(first.to_uppercase());
            ident.push_str(chars.as_str());
        }
    }

    if ident.is_empty() {
        return "Module".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_identifier() {
        assert_eq!(module_identifier(Path::new("b.tsx")), "B");
        assert_eq!(module_identifier(Path::new("/src/my-widget.tsx")), "MyWidget");
        assert_eq!(module_identifier(Path::new("user_profile.card.jsx")), "UserProfileCard");
        assert_eq!(module_identifier(Path::new("Button.tsx")), "Button");
        assert_eq!(module_identifier(Path::new("2col.tsx")), "_2col");
        assert_eq!(module_identifier(Path::new("---.tsx")), "Module");
    }

    #[test]
    fn test_renamed_keeps_declared_name() {
        let record = ExportRecord::named("Foo").renamed("FooAsB").renamed("FooAsB2");
        assert_eq!(record.name, "FooAsB2");
        assert_eq!(record.original_name.as_deref(), Some("Foo"));
        assert_eq!(record.source_name(), "Foo");
        assert_eq!(record.to_string(), "Foo as FooAsB2");
    }

    #[test]
    fn test_display_without_alias() {
        assert_eq!(ExportRecord::named("Card").to_string(), "Card");
        assert!(ExportRecord::default_export("Card").is_default());
    }

    #[test]
    fn test_serialize_skips_missing_original() {
        let json = serde_json::to_value(ExportRecord::named("Card")).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "Card", "kind": "named" }));
    }
}
