//! Export extraction - finds what a component file makes importable.
//!
//! Files are parsed with Tree-sitter's TSX grammar (which also accepts
//! plain JS/JSX), and only top-level `export` statements are inspected.
//! Nothing inside function bodies, comments or string literals can be
//! mistaken for an export.

use crate::error::{ExtractError, Result};
use crate::export::{module_identifier, ExportRecord};
use std::fs;
use std::path::Path;
use tracing::debug;
use tree_sitter::{Node, Parser};

/// Extracts the exports of a source file.
///
/// Named exports come first, in source order, followed by the default
/// export if there is one. A file without exports yields an empty list.
///
/// # Example
///
/// ```no_run
/// use barrel_core::extract_exports;
/// use std::path::Path;
///
/// for record in extract_exports(Path::new("src/components/Button.tsx")).unwrap() {
///     println!("{} ({})", record.name, record.kind);
/// }
/// ```
pub fn extract_exports(path: &Path) -> Result<Vec<ExportRecord>> {
    let source = fs::read_to_string(path).map_err(|e| ExtractError::io(path, e))?;
    let records = extract_source(&source, &module_identifier(path))?;
    debug!("Found {} exports in {}", records.len(), path.display());
    Ok(records)
}

/// Extracts exports from in-memory source.
///
/// `fallback_default` names a default export that has no identifier of
/// its own (`export default () => ...`).
pub fn extract_source(source: &str, fallback_default: &str) -> Result<Vec<ExportRecord>> {
    if source.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_typescript::language_tsx())
        .map_err(|e| ExtractError::Parser(format!("Failed to set language: {}", e)))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ExtractError::Parser("Tree-sitter returned no tree".into()))?;

    let root = tree.root_node();
    let mut named: Vec<String> = Vec::new();
    let mut default: Option<String> = None;

    let mut cursor = root.walk();
    for statement in root.children(&mut cursor) {
        if statement.kind() != "export_statement" {
            continue;
        }

        if is_default_export(&statement) {
            // Only the first default export counts
            if default.is_none() {
                default = Some(default_export_name(&statement, source).unwrap_or_else(|| {
                    debug!("Anonymous default export, naming it {}", fallback_default);
                    fallback_default.to_string()
                }));
            }
            continue;
        }

        // `export { a }` and `export * from` have no declaration and are skipped
        if let Some(declaration) = statement.child_by_field_name("declaration") {
            collect_declared_names(&declaration, source, &mut named);
        }
    }

    let mut records: Vec<ExportRecord> = Vec::with_capacity(named.len() + 1);
    for name in named {
        if !records.iter().any(|r| r.name == name) {
            records.push(ExportRecord::named(name));
        }
    }
    if let Some(name) = default {
        records.push(ExportRecord::default_export(name));
    }

    Ok(records)
}

/// Checks for the `default` keyword directly under an export statement.
fn is_default_export(statement: &Node) -> bool {
    let mut cursor = statement.walk();
    let found = statement
        .children(&mut cursor)
        .any(|child| child.kind() == "default");
    found
}

/// Resolves the identifier of a default export, if it has one.
fn default_export_name(statement: &Node, source: &str) -> Option<String> {
    if let Some(declaration) = statement.child_by_field_name("declaration") {
        return declaration
            .child_by_field_name("name")
            .map(|name| get_text(&name, source));
    }

    let value = statement.child_by_field_name("value")?;
    if value.kind() == "identifier" {
        return Some(get_text(&value, source));
    }

    // Named function/class expressions: `export default class Foo extends Bar {}`
    value
        .child_by_field_name("name")
        .filter(|name| matches!(name.kind(), "identifier" | "type_identifier"))
        .map(|name| get_text(&name, source))
}

/// Pushes the identifiers a declaration introduces.
fn collect_declared_names(declaration: &Node, source: &str, names: &mut Vec<String>) {
    match declaration.kind() {
        "function_declaration"
        | "generator_function_declaration"
        | "function_signature"
        | "class_declaration"
        | "abstract_class_declaration"
        | "interface_declaration"
        | "type_alias_declaration"
        | "enum_declaration" => {
            if let Some(name) = declaration.child_by_field_name("name") {
                names.push(get_text(&name, source));
            }
        }

        // Only `const`; `let` shares this node kind but is not a component export
        "lexical_declaration" => {
            let is_const = declaration
                .child(0)
                .map(|keyword| keyword.kind() == "const")
                .unwrap_or(false);
            if !is_const {
                return;
            }

            let mut cursor = declaration.walk();
            for declarator in declaration.named_children(&mut cursor) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                if let Some(name) = declarator.child_by_field_name("name") {
                    // Destructuring patterns are not supported
                    if name.kind() == "identifier" {
                        names.push(get_text(&name, source));
                    }
                }
            }
        }

        // `export declare function foo(): void;`
        "ambient_declaration" => {
            let mut cursor = declaration.walk();
            for inner in declaration.named_children(&mut cursor) {
                collect_declared_names(&inner, source, names);
            }
        }

        _ => {}
    }
}

/// Gets text content of a node.
fn get_text(node: &Node, source: &str) -> String {
    source[node.byte_range()].to_string()
}
