use serde::{Deserialize, Serialize};

/// Number of history entries kept per user. Applied after appending the new
/// user message and before every model invocation, so context growth stays
/// bounded regardless of conversation length.
pub const HISTORY_WINDOW: usize = 20;

/// Role of a persisted conversation entry. The system policy message is never
/// persisted; it is prepended by the engine on every run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One entry of the rolling per-user history. Tool calls and tool results are
/// not persisted; only their conversational effect survives a turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl StoredMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// Drops the oldest entries so at most [`HISTORY_WINDOW`] remain, preserving
/// the relative order of everything kept.
pub fn truncate_history(history: &mut Vec<StoredMessage>) {
    if history.len() > HISTORY_WINDOW {
        let excess = history.len() - HISTORY_WINDOW;
        history.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::{truncate_history, StoredMessage, HISTORY_WINDOW};

    fn numbered(count: usize) -> Vec<StoredMessage> {
        (0..count)
            .map(|i| {
                if i % 2 == 0 {
                    StoredMessage::user(format!("u{i}"))
                } else {
                    StoredMessage::assistant(format!("a{i}"))
                }
            })
            .collect()
    }

    #[test]
    fn short_history_is_untouched() {
        let mut history = numbered(5);
        truncate_history(&mut history);
        assert_eq!(history, numbered(5));
    }

    #[test]
    fn long_history_keeps_most_recent_in_order() {
        let mut history = numbered(27);
        truncate_history(&mut history);

        assert_eq!(history.len(), HISTORY_WINDOW);
        assert_eq!(history.first().expect("first").content, "a7");
        assert_eq!(history.last().expect("last").content, "u26");
        // Relative order survives.
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        let expected: Vec<String> = (7..27)
            .map(|i| if i % 2 == 0 { format!("u{i}") } else { format!("a{i}") })
            .collect();
        assert_eq!(contents, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn exactly_window_sized_history_is_kept_whole() {
        let mut history = numbered(HISTORY_WINDOW);
        truncate_history(&mut history);
        assert_eq!(history.len(), HISTORY_WINDOW);
    }

    #[test]
    fn roles_round_trip_through_json() {
        let entry = StoredMessage::user("black hoodie under 60");
        let json = serde_json::to_string(&entry).expect("serialize");
        assert!(json.contains("\"user\""));
        let back: StoredMessage = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, entry);
    }
}
