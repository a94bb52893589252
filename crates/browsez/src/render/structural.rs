//! Sectioned markdown rendering under a hard size ceiling.
//!
//! [`render`] walks a [`CanonicalNode`] depth-first. Named objects become
//! headings, uniform record lists become tables, anything else becomes
//! bullets or `key: value` lines. After the walk two caps are applied in a
//! fixed order: first the character cap, then the line cap. Each leaves its
//! own marker so the reader knows output was dropped.

use super::node::{CanonicalNode, Normalizer};
use super::table::render_table;
use super::truncate::truncate_value;
use serde_json::Value;
use tracing::debug;

/// Appended after the first `max_total_chars` characters when the character cap fires.
pub const SIZE_TRUNCATION_MARKER: &str = "\n…(output truncated: character limit reached)";

/// Appended as its own line when the line cap fires.
pub const ROW_TRUNCATION_MARKER: &str = "…(output truncated: row limit reached)";

/// Shown for objects and lists with no content.
const EMPTY_PLACEHOLDER: &str = "(empty)";

/// Label used for an unnamed root scalar and unnamed list elements.
const VALUE_LABEL: &str = "value";
const ITEM_LABEL: &str = "item";

/// Size limits for one render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderBudget {
    /// Ceiling on output characters, marker included. Default: 25 000.
    pub max_total_chars: usize,
    /// Ceiling on output lines before the row marker. Default: 40.
    pub max_rows: usize,
    /// Ceiling on a single value's characters. Default: 100.
    pub max_cell_width: usize,
    /// Deepest heading level; deeper sections reuse it. Default: 4.
    pub max_heading_level: usize,
}

impl Default for RenderBudget {
    fn default() -> Self {
        Self {
            max_total_chars: 25_000,
            max_rows: 40,
            max_cell_width: 100,
            max_heading_level: 4,
        }
    }
}

impl RenderBudget {
    pub fn with_max_total_chars(mut self, n: usize) -> Self {
        self.max_total_chars = n;
        self
    }

    pub fn with_max_rows(mut self, n: usize) -> Self {
        self.max_rows = n;
        self
    }

    pub fn with_max_cell_width(mut self, n: usize) -> Self {
        self.max_cell_width = n;
        self
    }

    /// Clamp heading depth. Values outside markdown's 1..=6 are clamped.
    pub fn with_max_heading_level(mut self, n: usize) -> Self {
        self.max_heading_level = n.clamp(1, 6);
        self
    }

    fn heading(&self, name: &str, depth: usize) -> String {
        let level = depth.clamp(1, self.max_heading_level.clamp(1, 6));
        format!("{} {name}", "#".repeat(level))
    }
}

/// Render a canonical tree. Never fails.
pub fn render(node: &CanonicalNode, budget: &RenderBudget) -> String {
    let mut lines = Vec::new();
    walk(node, None, 0, budget, &mut lines);
    let full = lines.join("\n");
    let capped = apply_caps(full, budget);
    debug!(
        "Rendered tool result: {} chars, {} lines",
        capped.chars().count(),
        capped.lines().count()
    );
    capped
}

/// Normalize then render.
pub fn render_value(value: &Value, budget: &RenderBudget, normalizer: &Normalizer) -> String {
    render(&normalizer.normalize(value), budget)
}

fn walk(
    node: &CanonicalNode,
    name: Option<&str>,
    depth: usize,
    budget: &RenderBudget,
    out: &mut Vec<String>,
) {
    match node {
        CanonicalNode::Scalar(value) => {
            let text = truncate_value(value.as_deref(), budget.max_cell_width);
            match name {
                Some(name) => out.push(format!("{name}: {text}")),
                None => {
                    out.push(budget.heading(VALUE_LABEL, 1));
                    out.push(text);
                }
            }
        }
        CanonicalNode::Object(entries) => {
            if let Some(name) = name {
                out.push(budget.heading(name, depth));
            }
            if entries.is_empty() {
                out.push(EMPTY_PLACEHOLDER.to_string());
            }
            for (key, child) in entries {
                walk(child, Some(key.as_str()), depth + 1, budget, out);
            }
        }
        CanonicalNode::List(items) => {
            if let Some(name) = name {
                out.push(budget.heading(name, depth));
            }
            if items.is_empty() {
                out.push(EMPTY_PLACEHOLDER.to_string());
                return;
            }
            if let Some(table) = render_table(items, budget.max_cell_width) {
                out.push(table);
                return;
            }
            let label = name.unwrap_or(ITEM_LABEL);
            for (i, item) in items.iter().enumerate() {
                match item {
                    CanonicalNode::Scalar(value) => out.push(format!(
                        "- {}",
                        truncate_value(value.as_deref(), budget.max_cell_width)
                    )),
                    composite => {
                        let child = format!("{label} [{}]", i + 1);
                        walk(composite, Some(child.as_str()), depth + 1, budget, out);
                    }
                }
            }
        }
    }
}

/// Character cap first, then line cap.
fn apply_caps(text: String, budget: &RenderBudget) -> String {
    let mut out = text;

    if out.chars().count() > budget.max_total_chars {
        let mut cut: String = out.chars().take(budget.max_total_chars).collect();
        cut.push_str(SIZE_TRUNCATION_MARKER);
        out = cut;
    }

    let line_count = out.lines().count();
    if line_count > budget.max_rows {
        let mut kept: Vec<&str> = out.lines().take(budget.max_rows).collect();
        kept.push(ROW_TRUNCATION_MARKER);
        out = kept.join("\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::truncate::TRUNCATION_MARKER;
    use serde_json::json;

    fn render_json(value: Value, budget: &RenderBudget) -> String {
        render_value(&value, budget, &Normalizer::new())
    }

    fn table_cells(line: &str) -> Vec<String> {
        line.trim()
            .trim_start_matches('|')
            .trim_end_matches('|')
            .split(" | ")
            .map(|c| c.trim().to_string())
            .collect()
    }

    #[test]
    fn balances_render_as_table_under_heading() {
        let note = "x".repeat(200);
        let input = json!({"balances": [
            {"type": "Available", "amount": "100.50"},
            {"type": "Ledger", "amount": "100.50", "note": note},
        ]});
        let budget = RenderBudget::default().with_max_cell_width(50);
        let out = render_json(input, &budget);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "# balances");
        assert_eq!(table_cells(lines[1]), vec!["type", "amount", "note"]);
        assert_eq!(table_cells(lines[3]), vec!["Available", "100.50", ""]);
        let row2 = table_cells(lines[4]);
        assert_eq!(row2[0], "Ledger");
        assert_eq!(row2[2], format!("{}{TRUNCATION_MARKER}", "x".repeat(50)));
    }

    #[test]
    fn envelope_payload_is_rendered() {
        let input = json!({"text": "{\"errorCode\": \"00\", \"errorMsg\": \"SUCCESS\"}"});
        let out = render_json(input, &RenderBudget::default());
        assert_eq!(out, "errorCode: 00\nerrorMsg: SUCCESS");
    }

    #[test]
    fn unnamed_root_scalar_gets_value_heading() {
        let out = render_json(json!("gateway timeout"), &RenderBudget::default());
        assert_eq!(out, "# value\ngateway timeout");
    }

    #[test]
    fn heading_depth_is_clamped() {
        let input = json!({"a": {"b": {"c": {"d": {"e": {"f": "leaf"}}}}}});
        let budget = RenderBudget::default().with_max_heading_level(3);
        let out = render_json(input, &budget);
        assert_eq!(
            out,
            "# a\n## b\n### c\n### d\n### e\nf: leaf",
            "deep sections reuse the deepest level"
        );
    }

    #[test]
    fn non_uniform_list_uses_bullets_and_sub_sections() {
        let input = json!({"mixed": ["plain", {"id": 1}, null]});
        let out = render_json(input, &RenderBudget::default());
        assert_eq!(out, "# mixed\n- plain\n## mixed [2]\nid: 1\n- ");
    }

    #[test]
    fn empty_collections_are_marked() {
        let out = render_json(json!({"rows": [], "meta": {}}), &RenderBudget::default());
        assert_eq!(out, "# rows\n(empty)\n# meta\n(empty)");
    }

    #[test]
    fn character_cap_fires_before_row_cap() {
        let rows: Vec<Value> = (0..200)
            .map(|i| json!({"id": i, "desc": "y".repeat(80)}))
            .collect();
        let budget = RenderBudget::default()
            .with_max_total_chars(2_000)
            .with_max_rows(10);
        let out = render_json(Value::Array(rows), &budget);
        assert_eq!(out.lines().count(), 11);
        assert!(out.ends_with(ROW_TRUNCATION_MARKER));
        // The character marker was cut away by the row cap.
        assert!(!out.contains(SIZE_TRUNCATION_MARKER));
        assert!(out.chars().count() <= 2_000);
    }

    #[test]
    fn character_cap_alone_keeps_marker() {
        let rows: Vec<Value> = (0..50).map(|i| json!({"id": i})).collect();
        let budget = RenderBudget::default()
            .with_max_total_chars(120)
            .with_max_rows(1_000);
        let full = render_json(Value::Array(rows.clone()), &RenderBudget::default());
        assert!(full.chars().count() > 120);

        let out = render_json(Value::Array(rows), &budget);
        let kept: String = full.chars().take(120).collect();
        assert_eq!(out, format!("{kept}{SIZE_TRUNCATION_MARKER}"));
        assert_eq!(
            out.chars().count(),
            120 + SIZE_TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn small_output_is_untouched() {
        let out = render_json(json!({"status": "ok"}), &RenderBudget::default());
        assert_eq!(out, "status: ok");
    }

    #[test]
    fn caps_are_monotonic() {
        let rows: Vec<Value> = (0..120)
            .map(|i| json!({"id": i, "name": format!("account-{i}"), "memo": "z".repeat(i)}))
            .collect();
        let input = json!({"statement": rows, "summary": {"count": 120}});

        let mut previous = usize::MAX;
        for chars in [50_000, 10_000, 4_000, 1_000, 300] {
            let budget = RenderBudget::default()
                .with_max_total_chars(chars)
                .with_max_rows(10_000);
            let len = render_json(input.clone(), &budget).chars().count();
            assert!(len <= previous, "chars={chars}: {len} > {previous}");
            previous = len;
        }

        let mut previous = usize::MAX;
        for rows in [500, 100, 40, 10, 1] {
            let budget = RenderBudget::default().with_max_rows(rows);
            let count = render_json(input.clone(), &budget).lines().count();
            assert!(count <= previous, "rows={rows}: {count} > {previous}");
            previous = count;
        }

        let mut previous = usize::MAX;
        for width in [200, 100, 20, 5] {
            let budget = RenderBudget::default()
                .with_max_cell_width(width)
                .with_max_rows(10_000)
                .with_max_total_chars(1_000_000);
            let len = render_json(input.clone(), &budget).chars().count();
            assert!(len <= previous, "width={width}: {len} > {previous}");
            previous = len;
        }
    }

    #[test]
    fn zero_budgets_leave_only_the_row_marker() {
        let budget = RenderBudget::default().with_max_rows(0).with_max_total_chars(0);
        for input in [json!(null), json!([]), json!({}), json!([[[]]]), json!("")] {
            let out = render_json(input.clone(), &budget);
            assert_eq!(out, ROW_TRUNCATION_MARKER, "input {input}");
        }
    }
}
