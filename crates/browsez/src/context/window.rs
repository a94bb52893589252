//! Fixed-size conversation history with a pinned directive.
//!
//! Turn zero is always the directive (the system prompt). It is refreshed in
//! place before every model call, so time-sensitive content such as the
//! current date stays current, and it is never evicted. Every other turn
//! lives in a recency window capped at `max_turns`; appending past the cap
//! drops the oldest turns first.

use crate::{Message, MessageRole};
use std::collections::VecDeque;
use tracing::debug;

/// Default number of non-directive turns kept.
pub const DEFAULT_MAX_TURNS: usize = 20;

/// Conversation history for one session.
#[derive(Debug, Clone)]
pub struct ContextWindowManager {
    directive: Message,
    turns: VecDeque<Message>,
    max_turns: usize,
    evicted_total: usize,
}

impl ContextWindowManager {
    /// Create a history holding only `directive`. With a cap of zero every
    /// appended turn is evicted at once and only the directive remains.
    pub fn new(directive: impl Into<String>, max_turns: usize) -> Self {
        Self {
            directive: Message::system(directive),
            turns: VecDeque::new(),
            max_turns,
            evicted_total: 0,
        }
    }

    /// Append a turn, evicting the oldest non-directive turns over the cap.
    ///
    /// Returns how many turns were evicted. System-role turns are rejected;
    /// the directive changes only through [`refresh_directive`](Self::refresh_directive).
    pub fn append(&mut self, turn: Message) -> Result<usize, String> {
        if turn.role == MessageRole::System {
            return Err("system turns cannot be appended; refresh the directive instead".into());
        }
        self.turns.push_back(turn);

        let mut evicted = 0;
        while self.turns.len() > self.max_turns {
            if self.turns.pop_front().is_some() {
                evicted += 1;
            }
        }
        if evicted > 0 {
            self.evicted_total += evicted;
            debug!(
                "Evicted {evicted} turn(s); window holds {}/{}",
                self.turns.len(),
                self.max_turns
            );
        }
        Ok(evicted)
    }

    /// Replace the directive's content in place. Never evicts.
    pub fn refresh_directive(&mut self, content: impl Into<String>) {
        self.directive.content = Some(content.into());
    }

    pub fn directive(&self) -> &Message {
        &self.directive
    }

    /// The full ordered history, directive first.
    pub fn turns(&self) -> impl Iterator<Item = &Message> {
        std::iter::once(&self.directive).chain(self.turns.iter())
    }

    /// Owned copy of the full history.
    pub fn to_messages(&self) -> Vec<Message> {
        self.turns().cloned().collect()
    }

    /// History as sent to the model.
    ///
    /// Tool turns at the head of the window whose requesting assistant turn
    /// has been evicted are skipped; chat APIs reject a tool result with no
    /// matching call. The stored history is unchanged.
    pub fn transmittable(&self) -> Vec<Message> {
        let orphans = self
            .turns
            .iter()
            .take_while(|m| m.role == MessageRole::Tool)
            .count();
        std::iter::once(&self.directive)
            .chain(self.turns.iter().skip(orphans))
            .cloned()
            .collect()
    }

    /// Number of non-directive turns held.
    pub fn conversation_len(&self) -> usize {
        self.turns.len()
    }

    /// Total turns held, directive included.
    pub fn total_len(&self) -> usize {
        self.turns.len() + 1
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Turns evicted over the lifetime of this history.
    pub fn evicted_total(&self) -> usize {
        self.evicted_total
    }

    /// The most recent non-directive turn.
    pub fn last(&self) -> Option<&Message> {
        self.turns.back()
    }

    /// Drop every non-directive turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolCall;

    #[test]
    fn starts_with_only_the_directive() {
        let window = ContextWindowManager::new("be brief", 6);
        assert_eq!(window.total_len(), 1);
        assert_eq!(window.conversation_len(), 0);
        assert_eq!(window.directive().role, MessageRole::System);
    }

    #[test]
    fn ten_turns_under_cap_six_keep_last_six() {
        let mut window = ContextWindowManager::new("directive", 6);
        let mut evicted = 0;
        for i in 0..10 {
            evicted += window.append(Message::user(format!("turn {i}"))).unwrap();
        }

        assert_eq!(evicted, 4);
        assert_eq!(window.total_len(), 7);
        let contents: Vec<&str> = window
            .turns()
            .map(|m| m.content.as_deref().unwrap())
            .collect();
        assert_eq!(
            contents,
            vec!["directive", "turn 4", "turn 5", "turn 6", "turn 7", "turn 8", "turn 9"]
        );
    }

    #[test]
    fn directive_survives_any_overflow() {
        let mut window = ContextWindowManager::new("keep me", 3);
        for i in 0..100 {
            window
                .append(Message::assistant_text(format!("a{i}")))
                .unwrap();
            assert!(window.conversation_len() <= 3);
            let first = window.turns().next().unwrap();
            assert_eq!(first.role, MessageRole::System);
            assert_eq!(first.content.as_deref(), Some("keep me"));
        }
        assert_eq!(window.evicted_total(), 97);
    }

    #[test]
    fn refresh_replaces_in_place_without_evicting() {
        let mut window = ContextWindowManager::new("date: monday", 2);
        window.append(Message::user("a")).unwrap();
        window.append(Message::user("b")).unwrap();
        window.refresh_directive("date: tuesday");

        assert_eq!(window.total_len(), 3);
        assert_eq!(
            window.directive().content.as_deref(),
            Some("date: tuesday")
        );
        assert_eq!(window.last().unwrap().content.as_deref(), Some("b"));
    }

    #[test]
    fn system_turns_are_rejected() {
        let mut window = ContextWindowManager::new("d", 4);
        assert!(window.append(Message::system("second directive")).is_err());
        assert_eq!(window.total_len(), 1);
    }

    #[test]
    fn zero_cap_keeps_only_the_directive() {
        let mut window = ContextWindowManager::new("d", 0);
        assert_eq!(window.append(Message::user("first")).unwrap(), 1);
        assert_eq!(window.append(Message::user("second")).unwrap(), 1);
        assert_eq!(window.max_turns(), 0);
        assert_eq!(window.conversation_len(), 0);
        assert!(window.last().is_none());
        assert_eq!(window.evicted_total(), 2);
        let turns: Vec<&Message> = window.turns().collect();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, MessageRole::System);
    }

    #[test]
    fn transmittable_skips_orphaned_tool_results() {
        let mut window = ContextWindowManager::new("d", 3);
        window.append(Message::user("balance?")).unwrap();
        window
            .append(Message::assistant_tool_calls(
                None,
                vec![
                    ToolCall::new("c1", "check_bank_balance", "{}"),
                    ToolCall::new("c2", "check_bank_balance", "{}"),
                ],
            ))
            .unwrap();
        window.append(Message::tool_result("c1", "[]")).unwrap();
        window.append(Message::tool_result("c2", "[]")).unwrap();
        window.append(Message::assistant_text("done")).unwrap();

        // The window holds tool c1, tool c2, assistant; the call turn is gone.
        assert_eq!(window.conversation_len(), 3);
        let sent = window.transmittable();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, MessageRole::System);
        assert_eq!(sent[1].content.as_deref(), Some("done"));
        assert_eq!(window.total_len(), 4, "stored history is untouched");
    }

    #[test]
    fn clear_keeps_directive() {
        let mut window = ContextWindowManager::new("d", 4);
        window.append(Message::user("x")).unwrap();
        window.clear();
        assert_eq!(window.to_messages(), vec![Message::system("d")]);
    }
}
