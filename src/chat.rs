//! Companion chat pane: canned assistant replies.
//!
//! Replies are keyed on substrings of the lowercased user message, checked
//! in order. A real backend would slot in behind the same function.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Opening message shown before the user says anything.
pub const GREETING: &str = "Hi! Ask me anything here.";

/// Produce the canned reply for one user message.
pub fn canned_reply(text: &str) -> String {
    let lowered = text.to_lowercase();

    if lowered.contains("hello") || lowered.contains("hi") {
        return "Hello! How can I help you today?".to_string();
    }
    if lowered.contains("name") {
        return "I'm the console's demo assistant. You can wire me to a real model later."
            .to_string();
    }
    if lowered.contains("help") {
        return "Sure! You can ask me questions, or type 'record' to see how analysis works."
            .to_string();
    }
    if lowered.contains("record") {
        return "Start a recording from the console above. After you stop, I will process the data."
            .to_string();
    }
    if lowered.contains("joke") {
        return "Why don't programmers like nature? Too many bugs!".to_string();
    }

    format!(
        "You said: \"{}\". (This is a canned reply. Connect a real backend next.)",
        text.trim()
    )
}
