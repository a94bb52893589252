//! Trace ids, model pricing and per-session cost accounting.
//!
//! Every [`Session::respond`](crate::agent::session::Session::respond) call
//! gets a trace id for log correlation. Token usage is accumulated in a
//! [`CostTracker`]; [`cost_table`] renders the per-reply cost footer shown
//! under an answer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// Tokens per pricing unit (prices are quoted per million tokens).
const PRICE_UNIT: f64 = 1_000_000.0;

/// Unique id for one `respond` call.
pub fn generate_trace_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let ts = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("tr-{ts:x}-{count:04x}")
}

/// USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPricing {
    pub const fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }

    /// Cost in USD for the given token counts.
    pub fn estimate_cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (input_tokens as f64 / PRICE_UNIT) * self.input_per_million
            + (output_tokens as f64 / PRICE_UNIT) * self.output_per_million
    }
}

/// Known chat models, most specific names first.
const PRICE_LIST: &[(&str, ModelPricing)] = &[
    ("gpt-5-nano", ModelPricing::new(0.05, 0.40)),
    ("gpt-5-mini", ModelPricing::new(0.25, 2.00)),
    ("gpt-5", ModelPricing::new(1.25, 10.00)),
    ("gpt-4.1-nano", ModelPricing::new(0.10, 0.40)),
    ("gpt-4.1-mini", ModelPricing::new(0.40, 1.60)),
    ("gpt-4.1", ModelPricing::new(2.00, 8.00)),
    ("gpt-4o-mini", ModelPricing::new(0.15, 0.60)),
    ("gpt-4o", ModelPricing::new(2.50, 10.00)),
];

/// Pricing for a model, matched on the name after any `provider/` prefix.
///
/// Returns `None` for models not in the price list; callers then omit the
/// cost footer rather than guess.
pub fn pricing_for_model(model: &str) -> Option<ModelPricing> {
    let name = model.rsplit('/').next().unwrap_or(model).to_lowercase();
    PRICE_LIST
        .iter()
        .find(|(prefix, _)| name.starts_with(prefix))
        .map(|(_, pricing)| *pricing)
}

// ── Display currency ───────────────────────────────────────────────

/// Currency the cost footer is shown in.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayCurrency {
    /// ISO code shown in the table header.
    pub code: String,
    /// Symbol prefixed to the amount.
    pub symbol: String,
    /// Units of this currency per US dollar.
    pub per_usd: f64,
}

impl Default for DisplayCurrency {
    fn default() -> Self {
        Self::inr()
    }
}

impl DisplayCurrency {
    pub fn inr() -> Self {
        Self {
            code: "INR".into(),
            symbol: "₹".into(),
            per_usd: 91.0,
        }
    }

    pub fn usd() -> Self {
        Self {
            code: "USD".into(),
            symbol: "$".into(),
            per_usd: 1.0,
        }
    }

    pub fn with_rate(mut self, per_usd: f64) -> Self {
        self.per_usd = per_usd;
        self
    }
}

/// Markdown cost table for one exchange.
pub fn cost_table(
    input_tokens: u32,
    output_tokens: u32,
    pricing: &ModelPricing,
    currency: &DisplayCurrency,
) -> String {
    let total = pricing.estimate_cost(input_tokens, output_tokens) * currency.per_usd;
    format!(
        "| Input Tokens | Output Tokens | Total Cost ({code}) |\n\
         | :----------- | :------------ | :--------------- |\n\
         | {input} | {output} | {symbol}{total:.4} |",
        code = currency.code,
        input = group_thousands(input_tokens as u64),
        output = group_thousands(output_tokens as u64),
        symbol = currency.symbol,
    )
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ── Tracker ────────────────────────────────────────────────────────

/// Cumulative usage for one session.
#[derive(Debug, Default, Clone)]
pub struct CostTracker {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub estimated_cost_usd: f64,
}

impl CostTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one exchange. Unknown pricing still counts tokens.
    pub fn record(&mut self, input_tokens: u32, output_tokens: u32, pricing: Option<&ModelPricing>) {
        self.total_input_tokens += input_tokens as u64;
        self.total_output_tokens += output_tokens as u64;
        if let Some(pricing) = pricing {
            self.estimated_cost_usd += pricing.estimate_cost(input_tokens, output_tokens);
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens + self.total_output_tokens
    }

    pub fn summary(&self) -> String {
        format!(
            "tokens: {} input + {} output = {} total, est. cost: ${:.4}",
            self.total_input_tokens,
            self.total_output_tokens,
            self.total_tokens(),
            self.estimated_cost_usd,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_ids_are_unique() {
        let a = generate_trace_id();
        let b = generate_trace_id();
        assert_ne!(a, b);
        assert!(a.starts_with("tr-"));
    }

    #[test]
    fn pricing_matches_most_specific_name() {
        assert_eq!(
            pricing_for_model("gpt-4.1-mini"),
            Some(ModelPricing::new(0.40, 1.60))
        );
        assert_eq!(
            pricing_for_model("openai/gpt-4.1"),
            Some(ModelPricing::new(2.00, 8.00))
        );
        assert_eq!(
            pricing_for_model("gpt-5-mini-2025-08-07"),
            Some(ModelPricing::new(0.25, 2.00))
        );
        assert_eq!(pricing_for_model("some-local-model"), None);
    }

    #[test]
    fn cost_table_in_rupees() {
        let pricing = ModelPricing::new(1.0, 2.0);
        let table = cost_table(1_000_000, 500_000, &pricing, &DisplayCurrency::inr());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "| Input Tokens | Output Tokens | Total Cost (INR) |");
        // (1.0 + 1.0) USD * 91
        assert_eq!(lines[2], "| 1,000,000 | 500,000 | ₹182.0000 |");
    }

    #[test]
    fn cost_table_in_dollars() {
        let pricing = ModelPricing::new(1.0, 2.0);
        let table = cost_table(999, 1_000, &pricing, &DisplayCurrency::usd());
        assert!(table.contains("Total Cost (USD)"));
        assert!(table.ends_with("| 999 | 1,000 | $0.0030 |"));
    }

    #[test]
    fn tracker_accumulates_with_and_without_pricing() {
        let mut tracker = CostTracker::new();
        let pricing = ModelPricing::new(3.0, 15.0);
        tracker.record(1_000_000, 0, Some(&pricing));
        tracker.record(500, 500, None);
        assert_eq!(tracker.total_tokens(), 1_001_000);
        assert!((tracker.estimated_cost_usd - 3.0).abs() < 1e-9);
        assert!(tracker.summary().contains("1001000 total"));
    }
}
