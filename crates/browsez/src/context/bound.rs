//! Size-capping tool results before they re-enter the conversation.
//!
//! [`bound_tool_result`] is the machine-facing sibling of the structural
//! renderer: it keeps JSON shape (so the model can still read it) while
//! limiting record count, per-field length and total serialized size.

use crate::render::scalar_text;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Returned when a string payload is not valid JSON.
pub const INVALID_RESPONSE_SENTINEL: &str = "An error occurred in processing the API response";

/// Appended to a field cut under [`OversizePolicy::Slice`].
pub const FIELD_TRUNCATION_MARKER: &str = "...(truncated)";

/// Replaces a field under [`OversizePolicy::Replace`].
pub const FIELD_TOO_LARGE_SENTINEL: &str = "Data too large to display";

/// Appended when the serialized output is cut.
pub const OUTPUT_TRUNCATION_MARKER: &str = "\n... output truncated ...";

/// What to do with a string field longer than `max_field_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OversizePolicy {
    /// Keep the first `max_field_value` characters and append
    /// [`FIELD_TRUNCATION_MARKER`].
    #[default]
    Slice,
    /// Replace the whole value with [`FIELD_TOO_LARGE_SENTINEL`].
    Replace,
}

/// Limits for [`bound_tool_result`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundBudget {
    /// Records kept from the top-level list. Default: 50.
    pub max_rows: usize,
    /// Longest string kept intact, in characters. Default: 10 000.
    pub max_field_value: usize,
    /// Serialized output ceiling before the final slice. Default: 20 000.
    pub max_total_chars: usize,
    /// Field policy, applied uniformly within one call.
    pub policy: OversizePolicy,
}

impl Default for BoundBudget {
    fn default() -> Self {
        Self {
            max_rows: 50,
            max_field_value: 10_000,
            max_total_chars: 20_000,
            policy: OversizePolicy::Slice,
        }
    }
}

impl BoundBudget {
    pub fn with_max_rows(mut self, n: usize) -> Self {
        self.max_rows = n;
        self
    }

    pub fn with_max_field_value(mut self, n: usize) -> Self {
        self.max_field_value = n;
        self
    }

    pub fn with_max_total_chars(mut self, n: usize) -> Self {
        self.max_total_chars = n;
        self
    }

    pub fn with_policy(mut self, policy: OversizePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Bound a tool result for the conversation history. Never fails.
///
/// 1. A string input is decoded as JSON; undecodable text yields
///    [`INVALID_RESPONSE_SENTINEL`].
/// 2. The payload becomes a record list: an object is wrapped in a
///    one-element list, a list stays as is, any other scalar becomes
///    `[{"response": "<text>"}]`.
/// 3. Only the first `max_rows` records are kept.
/// 4. Every string at any depth longer than `max_field_value` is cut or
///    replaced according to the budget's [`OversizePolicy`].
/// 5. The list is pretty-printed; if still longer than `max_total_chars` it
///    is cut there and [`OUTPUT_TRUNCATION_MARKER`] appended. This last step
///    may leave invalid JSON.
pub fn bound_tool_result(data: &Value, budget: &BoundBudget) -> String {
    let decoded = match data {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Tool result is not valid JSON: {e}");
                return INVALID_RESPONSE_SENTINEL.to_string();
            }
        },
        other => other.clone(),
    };
    let input_chars = match data {
        Value::String(raw) => raw.chars().count(),
        other => other.to_string().chars().count(),
    };

    let mut records = match decoded {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        scalar => vec![json!({
            "response": scalar_text(&scalar).unwrap_or_else(|| "null".to_string())
        })],
    };

    if records.len() > budget.max_rows {
        debug!(
            "Dropping {} of {} records",
            records.len() - budget.max_rows,
            records.len()
        );
        records.truncate(budget.max_rows);
    }

    let bounded: Vec<Value> = records
        .into_iter()
        .map(|r| cap_fields(r, budget))
        .collect();

    let mut output = serde_json::to_string_pretty(&bounded)
        .unwrap_or_else(|_| Value::Array(bounded).to_string());

    if output.chars().count() > budget.max_total_chars {
        output = output.chars().take(budget.max_total_chars).collect();
        output.push_str(OUTPUT_TRUNCATION_MARKER);
    }

    debug!(
        "Reduced tool result of {input_chars} chars to {}",
        output.chars().count()
    );
    output
}

fn cap_fields(value: Value, budget: &BoundBudget) -> Value {
    match value {
        Value::String(s) => Value::String(cap_string(s, budget)),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|v| cap_fields(v, budget)).collect())
        }
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, cap_fields(v, budget)))
                .collect(),
        ),
        other => other,
    }
}

fn cap_string(s: String, budget: &BoundBudget) -> String {
    let Some((cut, _)) = s.char_indices().nth(budget.max_field_value) else {
        return s;
    };
    match budget.policy {
        OversizePolicy::Slice => {
            let mut kept = s.get(..cut).unwrap_or_default().to_string();
            kept.push_str(FIELD_TRUNCATION_MARKER);
            kept
        }
        OversizePolicy::Replace => FIELD_TOO_LARGE_SENTINEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(out: &str) -> Vec<Value> {
        serde_json::from_str(out).expect("bounded output should be valid JSON")
    }

    #[test]
    fn eighty_records_become_fifty() {
        let records: Vec<Value> = (0..80)
            .map(|i| json!({"id": i, "desc": "x".repeat(20_000)}))
            .collect();
        let budget = BoundBudget::default().with_max_total_chars(usize::MAX);
        let out = parse(&bound_tool_result(&Value::Array(records), &budget));

        assert_eq!(out.len(), 50);
        assert_eq!(out[0]["id"], 0);
        assert_eq!(out[49]["id"], 49);
        let desc = out[0]["desc"].as_str().unwrap();
        assert_eq!(desc.chars().count(), 10_000 + FIELD_TRUNCATION_MARKER.len());
        assert!(desc.ends_with(FIELD_TRUNCATION_MARKER));
    }

    #[test]
    fn eighty_records_with_default_budget_hit_the_backstop() {
        let records: Vec<Value> = (0..80)
            .map(|i| json!({"id": i, "desc": "x".repeat(20_000)}))
            .collect();
        let out = bound_tool_result(&Value::Array(records), &BoundBudget::default());
        assert!(out.ends_with(OUTPUT_TRUNCATION_MARKER));
        assert_eq!(
            out.chars().count(),
            20_000 + OUTPUT_TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn object_is_wrapped_in_a_list() {
        let out = parse(&bound_tool_result(
            &json!({"balance": "10.00"}),
            &BoundBudget::default(),
        ));
        assert_eq!(out, vec![json!({"balance": "10.00"})]);
    }

    #[test]
    fn scalars_become_response_records() {
        let budget = BoundBudget::default();
        assert_eq!(
            parse(&bound_tool_result(&json!(42), &budget)),
            vec![json!({"response": "42"})]
        );
        assert_eq!(
            parse(&bound_tool_result(&Value::Null, &budget)),
            vec![json!({"response": "null"})]
        );
        assert_eq!(
            parse(&bound_tool_result(&json!("\"ok\""), &budget)),
            vec![json!({"response": "ok"})]
        );
    }

    #[test]
    fn string_input_is_decoded() {
        let out = parse(&bound_tool_result(
            &json!("[{\"a\": 1}, {\"b\": 2}]"),
            &BoundBudget::default(),
        ));
        assert_eq!(out, vec![json!({"a": 1}), json!({"b": 2})]);
    }

    #[test]
    fn invalid_string_yields_sentinel() {
        let out = bound_tool_result(&json!("<html>502 Bad Gateway</html>"), &BoundBudget::default());
        assert_eq!(out, INVALID_RESPONSE_SENTINEL);
    }

    #[test]
    fn nested_strings_are_capped_at_any_depth() {
        let data = json!({"a": {"b": [{"c": "y".repeat(30)}], "short": "ok"}});
        let budget = BoundBudget::default().with_max_field_value(10);
        let out = parse(&bound_tool_result(&data, &budget));
        assert_eq!(
            out[0]["a"]["b"][0]["c"],
            format!("{}{FIELD_TRUNCATION_MARKER}", "y".repeat(10))
        );
        assert_eq!(out[0]["a"]["short"], "ok");
    }

    #[test]
    fn field_policies_differ_only_in_replacement() {
        let data = json!([{"blob": "q".repeat(64), "tag": "keep"}]);
        let slice = parse(&bound_tool_result(
            &data,
            &BoundBudget::default()
                .with_max_field_value(8)
                .with_policy(OversizePolicy::Slice),
        ));
        let replace = parse(&bound_tool_result(
            &data,
            &BoundBudget::default()
                .with_max_field_value(8)
                .with_policy(OversizePolicy::Replace),
        ));

        assert_eq!(slice[0]["blob"], "qqqqqqqq...(truncated)");
        assert_eq!(replace[0]["blob"], FIELD_TOO_LARGE_SENTINEL);
        assert_eq!(slice[0]["tag"], "keep");
        assert_eq!(replace[0]["tag"], "keep");
    }

    #[test]
    fn key_order_is_preserved() {
        let data = json!({"zeta": 1, "alpha": 2, "mid": 3});
        let out = bound_tool_result(&data, &BoundBudget::default());
        let zeta = out.find("zeta").unwrap();
        let alpha = out.find("alpha").unwrap();
        let mid = out.find("mid").unwrap();
        assert!(zeta < alpha && alpha < mid);
    }

    #[test]
    fn zero_budgets_still_end_in_a_marker() {
        let budget = BoundBudget::default()
            .with_max_rows(0)
            .with_max_field_value(0)
            .with_max_total_chars(0);
        for input in [
            json!({"k": "v"}),
            json!([1, [2, [3]]]),
            json!(null),
            json!(7),
            json!(true),
        ] {
            let out = bound_tool_result(&input, &budget);
            assert_eq!(out, OUTPUT_TRUNCATION_MARKER, "input {input}");
        }
        assert_eq!(
            bound_tool_result(&json!("not json"), &budget),
            INVALID_RESPONSE_SENTINEL
        );
    }
}
