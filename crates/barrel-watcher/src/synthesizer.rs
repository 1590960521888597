//! Barrel statement rendering.
//!
//! Output is limited to three statement shapes:
//!
//! ```text
//! export * from "./<name>";
//! export { <item>, ... } from "./<name>";
//! export { default as <item>, ... } from "./<name>";
//! ```

use barrel_core::ExportRecord;

/// Statement re-exporting a subdirectory's barrel.
pub fn directory_statement(name: &str) -> String {
    format!("export * from \"./{}\";", name)
}

/// Statement re-exporting one file's resolved exports.
///
/// `module` is the file name without extension. Returns None when the
/// file exports nothing. A file whose only export is its default export
/// is re-exported as a whole module.
pub fn file_statement(module: &str, records: &[ExportRecord]) -> Option<String> {
    if let [only] = records {
        if only.is_default() {
            return Some(format!("export * from \"./{}\";", module));
        }
    }

    let named: Vec<String> = records
        .iter()
        .filter(|r| !r.is_default())
        .map(|r| r.to_string())
        .collect();

    match records.iter().find(|r| r.is_default()) {
        Some(default) => {
            let mut items = format!("default as {}", default.name);
            if !named.is_empty() {
                items.push_str(", ");
                items.push_str(&named.join(", "));
            }
            Some(format!("export {{ {} }} from \"./{}\";", items, module))
        }
        None if !named.is_empty() => Some(format!(
            "export {{ {} }} from \"./{}\";",
            named.join(", "),
            module
        )),
        None => None,
    }
}
