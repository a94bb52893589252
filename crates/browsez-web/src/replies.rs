//! Canned replies answered without a model call.

use regex::{Regex, RegexBuilder};

pub const GREETING_REPLY: &str = "Hello! How can I assist you today?";
pub const IDENTITY_REPLY: &str = "Hey! I'm BrowsEZ. Need something? Just ask—I'll make it easy.";

/// Whole-message patterns mapped to fixed replies. First match wins.
pub struct CannedReplies {
    rules: Vec<(Regex, String)>,
}

impl CannedReplies {
    /// No canned replies; every message goes to the model.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Greetings and "who are you" questions.
    pub fn standard() -> Result<Self, String> {
        Self::empty()
            .with_rule(r"^\s*(hello|hi|hey)\s*[!.]*\s*$", GREETING_REPLY)?
            .with_rule(r"^\s*who\s+(are\s+you|is\s+this)\s*\??\s*$", IDENTITY_REPLY)
    }

    /// Add a case-insensitive pattern.
    pub fn with_rule(mut self, pattern: &str, reply: impl Into<String>) -> Result<Self, String> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| format!("invalid reply pattern '{pattern}': {e}"))?;
        self.rules.push((regex, reply.into()));
        Ok(self)
    }

    pub fn reply_for(&self, text: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|(regex, _)| regex.is_match(text))
            .map(|(_, reply)| reply.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greetings_and_identity_match_whole_messages() {
        let canned = CannedReplies::standard().unwrap();
        assert_eq!(canned.reply_for("Hello"), Some(GREETING_REPLY));
        assert_eq!(canned.reply_for("  hi! "), Some(GREETING_REPLY));
        assert_eq!(canned.reply_for("Who are you?"), Some(IDENTITY_REPLY));
        assert_eq!(canned.reply_for("who is this"), Some(IDENTITY_REPLY));
    }

    #[test]
    fn requests_containing_greetings_go_to_the_model() {
        let canned = CannedReplies::standard().unwrap();
        assert_eq!(canned.reply_for("Hi, what is my balance?"), None);
        assert_eq!(canned.reply_for("history of transactions"), None);
        assert_eq!(CannedReplies::empty().reply_for("hello"), None);
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(CannedReplies::empty().with_rule("(", "x").is_err());
    }
}
