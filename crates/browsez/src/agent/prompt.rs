//! Directive prompt assembly.
//!
//! [`SystemPromptBuilder`] joins a preamble and headed sections;
//! [`directive_prompt`] uses it to build the assistant's system turn, which
//! the session rebuilds before every model call so the embedded clock stays
//! current.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use super::config::IST_OFFSET_MINUTES;

/// Builder for multi-section system prompts.
///
/// Sections are joined with blank lines; empty sections are skipped.
///
/// ```
/// use browsez::agent::prompt::SystemPromptBuilder;
///
/// let prompt = SystemPromptBuilder::new("You are BrowsEZ.")
///     .section("Rules", "Be brief.")
///     .section_opt("Missing", None::<String>)
///     .build();
///
/// assert!(prompt.contains("## Rules"));
/// assert!(!prompt.contains("## Missing"));
/// ```
pub struct SystemPromptBuilder {
    sections: Vec<String>,
    heading_prefix: String,
}

impl SystemPromptBuilder {
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            sections: vec![preamble.into()],
            heading_prefix: "##".to_string(),
        }
    }

    /// Heading level for subsequent sections (default 2).
    pub fn heading_level(mut self, level: u8) -> Self {
        self.heading_prefix = "#".repeat(level.max(1) as usize);
        self
    }

    pub fn section(mut self, heading: &str, content: impl Into<String>) -> Self {
        let content = content.into();
        if !content.is_empty() {
            self.sections
                .push(format!("{} {heading}\n\n{content}", self.heading_prefix));
        }
        self
    }

    pub fn section_opt(self, heading: &str, content: Option<impl Into<String>>) -> Self {
        match content {
            Some(c) => self.section(heading, c),
            None => self,
        }
    }

    /// Text without a heading.
    pub fn raw(mut self, content: impl Into<String>) -> Self {
        let content = content.into();
        if !content.is_empty() {
            self.sections.push(content);
        }
        self
    }

    pub fn build(self) -> String {
        self.sections.join("\n\n")
    }
}

// ── Directive ──────────────────────────────────────────────────────

const DEFAULT_PERSONA: &str = "You are **BrowsEZ**, a digital teammate that helps users get work done \
through simple, natural conversation. You can execute tools, retrieve enterprise data, and \
trigger workflows across cloud or on-prem systems.";

const RESPONSIBILITIES: &str = "\
* Identify the correct tool from the available list
* Extract required parameters from the conversation
* Execute the most appropriate action
* Respond clearly with the result or next step";

const TOOL_RESULT_RULES: &str = "\
* Tool results may arrive trimmed to fit the conversation. Say so when data was cut off.
* Do not truncate information yourself. Show as much as you can under 20,000 characters.
* Format tabular data as markdown tables.";

const CLOSING: &str = "Always prioritize accuracy, security, and minimal back-and-forth. \
Act like a proactive, reliable enterprise assistant, not just a chatbot.";

/// Fixed offset for `minutes` east of UTC, falling back to UTC when out of range.
pub fn fixed_offset(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// Current time at the given offset.
pub fn now_at(minutes: i32) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&fixed_offset(minutes))
}

fn zone_label(offset: &FixedOffset) -> String {
    if offset.local_minus_utc() == IST_OFFSET_MINUTES * 60 {
        "IST".to_string()
    } else {
        format!("UTC{offset}")
    }
}

/// The system turn for a session, stamped with `now`.
pub fn directive_prompt(persona: Option<&str>, now: &DateTime<FixedOffset>) -> String {
    SystemPromptBuilder::new(persona.unwrap_or(DEFAULT_PERSONA))
        .section("Responsibilities", RESPONSIBILITIES)
        .section("Tool results", TOOL_RESULT_RULES)
        .raw(CLOSING)
        .raw(format!(
            "Current date and time ({}): {}",
            zone_label(now.offset()),
            now.format("%Y-%m-%d %H:%M:%S")
        ))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn builder_skips_empty_sections() {
        let prompt = SystemPromptBuilder::new("Preamble")
            .section("Empty", "")
            .section("Full", "content")
            .raw("")
            .build();
        assert_eq!(prompt, "Preamble\n\n## Full\n\ncontent");
    }

    #[test]
    fn heading_level_applies_to_later_sections() {
        let prompt = SystemPromptBuilder::new("P")
            .heading_level(3)
            .section("Deep", "x")
            .build();
        assert!(prompt.contains("### Deep"));
    }

    #[test]
    fn directive_carries_ist_timestamp() {
        let ist = fixed_offset(IST_OFFSET_MINUTES);
        let now = ist.with_ymd_and_hms(2026, 2, 19, 14, 5, 0).unwrap();
        let prompt = directive_prompt(None, &now);
        assert!(prompt.starts_with("You are **BrowsEZ**"));
        assert!(prompt.contains("## Responsibilities"));
        assert!(prompt.ends_with("Current date and time (IST): 2026-02-19 14:05:00"));
    }

    #[test]
    fn other_offsets_are_labelled_numerically() {
        let utc = fixed_offset(0);
        let now = utc.with_ymd_and_hms(2026, 2, 19, 8, 35, 0).unwrap();
        let prompt = directive_prompt(Some("You are a test bot."), &now);
        assert!(prompt.starts_with("You are a test bot."));
        assert!(prompt.ends_with("Current date and time (UTC+00:00): 2026-02-19 08:35:00"));
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        assert_eq!(fixed_offset(100_000).local_minus_utc(), 0);
    }

    #[test]
    fn extreme_offsets_fall_back_to_utc() {
        assert_eq!(fixed_offset(i32::MAX).local_minus_utc(), 0);
        assert_eq!(fixed_offset(i32::MIN).local_minus_utc(), 0);
        assert_eq!(now_at(i32::MAX).offset().local_minus_utc(), 0);
    }
}
