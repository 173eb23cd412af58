//! UI-agnostic conversation state types
//!
//! This module contains the data structures shared between the controller and
//! any presentation layer (TUI, web bridge, etc.). None of them depend on a UI
//! framework, and all of them serialize so a snapshot can cross a process
//! boundary if a surface needs it to.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifier of a message in the conversation log.
///
/// Issued by the controller from a counter that only moves forward, so two
/// messages created in the same instant still get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// Feedback a user has left on an assistant message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    #[default]
    None,
    Liked,
    Disliked,
}

/// The feedback button a user pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Like,
    Dislike,
}

impl Feedback {
    /// Apply a button press: pressing the active button clears it, pressing the
    /// other one replaces it.
    pub fn toggled(self, kind: FeedbackKind) -> Feedback {
        match (self, kind) {
            (Feedback::Liked, FeedbackKind::Like) => Feedback::None,
            (Feedback::Disliked, FeedbackKind::Dislike) => Feedback::None,
            (_, FeedbackKind::Like) => Feedback::Liked,
            (_, FeedbackKind::Dislike) => Feedback::Disliked,
        }
    }
}

/// Where submitted text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Typed,
    Suggestion,
}

/// A single entry in the conversation log.
///
/// Everything except `feedback` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    text: String,
    sender: Sender,
    timestamp: DateTime<Local>,
    feedback: Feedback,
}

impl Message {
    pub fn new(id: MessageId, sender: Sender, text: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            id,
            text: text.into(),
            sender,
            timestamp,
            feedback: Feedback::None,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn feedback(&self) -> Feedback {
        self.feedback
    }

    /// Display time, e.g. "09:41"
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

/// The ordered message log.
///
/// Messages live in insertion order; a side index maps ids to positions so
/// feedback can be applied by id without holding references into the log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Message>", into = "Vec<Message>")]
pub struct Conversation {
    messages: Vec<Message>,
    index: HashMap<MessageId, usize>,
}

impl From<Vec<Message>> for Conversation {
    fn from(messages: Vec<Message>) -> Self {
        let mut conv = Conversation::new();
        for message in messages {
            conv.push(message);
        }
        conv
    }
}

impl From<Conversation> for Vec<Message> {
    fn from(conv: Conversation) -> Self {
        conv.messages
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.index.insert(message.id, self.messages.len());
        self.messages.push(message);
    }

    pub(crate) fn clear(&mut self) {
        self.messages.clear();
        self.index.clear();
    }

    /// Toggle feedback on an assistant message. Returns the new value, or
    /// `None` when the id is unknown or the message was sent by the user.
    pub(crate) fn toggle_feedback(&mut self, id: MessageId, kind: FeedbackKind) -> Option<Feedback> {
        let pos = *self.index.get(&id)?;
        let message = &mut self.messages[pos];
        if message.sender != Sender::Assistant {
            return None;
        }
        message.feedback = message.feedback.toggled(kind);
        Some(message.feedback)
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.index.get(&id).map(|&pos| &self.messages[pos])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

/// Everything a presentation layer needs to draw the chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatState {
    pub messages: Conversation,
    /// A request is in flight
    pub pending: bool,
    pub last_error: Option<String>,
    pub suggestions_visible: bool,
    pub last_copied: Option<MessageId>,
}

impl Default for ChatState {
    fn default() -> Self {
        Self {
            messages: Conversation::new(),
            pending: false,
            last_error: None,
            suggestions_visible: true,
            last_copied: None,
        }
    }
}
