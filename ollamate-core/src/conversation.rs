//! Chat history and the plain-text prompt format sent to `/api/generate`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn speaker(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Flatten prior turns plus the new message into a single prompt.
///
/// Empty assistant turns (an aborted reply) are left out.
pub fn build_prompt(history: &[Message], message: &str) -> String {
    let mut prompt = String::new();
    for msg in history {
        if msg.role == Role::Assistant && msg.content.is_empty() {
            continue;
        }
        prompt.push_str(msg.role.speaker());
        prompt.push_str(": ");
        prompt.push_str(&msg.content);
        prompt.push('\n');
    }
    prompt.push_str("User: ");
    prompt.push_str(message);
    prompt.push_str("\nAssistant:");
    prompt
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Prompt for the next user message, given everything said so far.
    pub fn prompt_for(&self, message: &str) -> String {
        build_prompt(&self.messages, message)
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Record a finished exchange.
    pub fn record(&mut self, user: &str, assistant: &str) {
        self.push_user(user);
        self.push_assistant(assistant);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_history() {
        assert_eq!(build_prompt(&[], "Hello"), "User: Hello\nAssistant:");
    }

    #[test]
    fn test_prompt_with_history_skips_empty_replies() {
        let history = vec![
            Message::user("What is Rust?"),
            Message::assistant("A systems language."),
            Message::user("Is it fast?"),
            Message::assistant(""),
        ];
        assert_eq!(
            build_prompt(&history, "Thanks"),
            "User: What is Rust?\nAssistant: A systems language.\nUser: Is it fast?\nUser: Thanks\nAssistant:"
        );
    }

    #[test]
    fn test_conversation_records_and_clears() {
        let mut convo = Conversation::new();
        assert!(convo.is_empty());
        convo.record("hi", "hello!");
        assert_eq!(convo.messages().len(), 2);
        assert_eq!(
            convo.prompt_for("how are you?"),
            "User: hi\nAssistant: hello!\nUser: how are you?\nAssistant:"
        );
        convo.clear();
        assert_eq!(convo.prompt_for("again"), "User: again\nAssistant:");

        convo.push_user("unanswered");
        convo.push_assistant("");
        assert_eq!(
            convo.prompt_for("retry"),
            "User: unanswered\nUser: retry\nAssistant:"
        );
    }
}
