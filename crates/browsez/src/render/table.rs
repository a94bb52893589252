//! Markdown tables for uniform record lists.

use super::node::CanonicalNode;
use super::truncate::truncate_value;

/// Render a list of records as a markdown table.
///
/// Returns `None` when the list is empty or any element is not an object;
/// the caller then falls back to bullet rendering. Columns are the union of
/// record keys in first-appearance order, missing keys render as empty
/// cells, and every cell is limited to `max_cell_width` characters. There is
/// no row limit here; the structural renderer's caps apply afterwards.
pub fn render_table(items: &[CanonicalNode], max_cell_width: usize) -> Option<String> {
    if items.is_empty() {
        return None;
    }

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        match item {
            CanonicalNode::Object(entries) => records.push(entries),
            _ => return None,
        }
    }

    let mut columns: Vec<&str> = Vec::new();
    for entries in &records {
        for (key, _) in entries.iter() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }
    if columns.is_empty() {
        return None;
    }

    let mut lines = Vec::with_capacity(records.len() + 2);
    lines.push(row(columns.iter().map(|c| escape_cell(c))));
    lines.push(row(columns.iter().map(|_| "---".to_string())));
    for entries in &records {
        lines.push(row(columns.iter().map(|col| {
            let cell = entries
                .iter()
                .find(|(k, _)| k.as_str() == *col)
                .map(|(_, v)| cell_text(v, max_cell_width))
                .unwrap_or_default();
            escape_cell(&cell)
        })));
    }
    Some(lines.join("\n"))
}

fn row(cells: impl Iterator<Item = String>) -> String {
    let cells: Vec<String> = cells.collect();
    format!("| {} |", cells.join(" | "))
}

/// Cell text: scalars as-is, nested values as compact JSON, then truncated.
fn cell_text(node: &CanonicalNode, max_cell_width: usize) -> String {
    match node {
        CanonicalNode::Scalar(value) => truncate_value(value.as_deref(), max_cell_width),
        composite => truncate_value(Some(&composite.to_value().to_string()), max_cell_width),
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace("\r\n", " ").replace(['\n', '\r'], " ")
}
