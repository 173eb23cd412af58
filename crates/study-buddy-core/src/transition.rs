//! Pure state transitions for the chat.
//!
//! Every change to [`ChatState`] goes through [`transition`]. Ids and
//! timestamps are minted by the caller and carried inside the events, so the
//! same state and event always produce the same result.

use crate::state::{ChatState, FeedbackKind, Message, MessageId, Sender};

/// Shown when the service answered without any reply text
pub const EMPTY_REPLY_PLACEHOLDER: &str = "No response from server.";

/// Appended to the log when a request fails
pub const FAILURE_NOTICE: &str =
    "Error: Could not get response from server. Check your backend connection.";

/// Stored in `last_error` when a request fails
pub const CONNECTIVITY_ERROR: &str =
    "Unable to reach Study Buddy. Please check your connection and try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The user sent a message; a request is about to go out
    Submitted(Message),
    /// The service answered; the message holds the reply (or placeholder)
    ReplyReceived(Message),
    /// The request failed; the message holds the failure notice
    RequestFailed(Message),
    Cleared,
    FeedbackToggled { id: MessageId, kind: FeedbackKind },
    Copied(MessageId),
    CopyExpired(MessageId),
    ErrorDismissed,
}

pub fn transition(mut state: ChatState, event: Event) -> ChatState {
    match event {
        Event::Submitted(message) => {
            if state.pending || message.text().trim().is_empty() {
                return state;
            }
            state.suggestions_visible = false;
            state.last_error = None;
            state.messages.push(message);
            state.pending = true;
        }
        Event::ReplyReceived(message) => {
            state.messages.push(message);
            state.pending = false;
        }
        Event::RequestFailed(message) => {
            state.last_error = Some(CONNECTIVITY_ERROR.to_string());
            state.messages.push(message);
            state.pending = false;
        }
        Event::Cleared => {
            state.messages.clear();
            state.suggestions_visible = true;
            state.last_error = None;
            state.last_copied = None;
        }
        Event::FeedbackToggled { id, kind } => {
            state.messages.toggle_feedback(id, kind);
        }
        Event::Copied(id) => {
            if state.messages.get(id).is_some() {
                state.last_copied = Some(id);
            }
        }
        Event::CopyExpired(id) => {
            if state.last_copied == Some(id) {
                state.last_copied = None;
            }
        }
        Event::ErrorDismissed => {
            state.last_error = None;
        }
    }
    state
}

/// Build the assistant message for a successful reply
pub(crate) fn reply_message(id: MessageId, reply: Option<String>, now: chrono::DateTime<chrono::Local>) -> Message {
    let text = reply
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| EMPTY_REPLY_PLACEHOLDER.to_string());
    Message::new(id, Sender::Assistant, text, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Feedback;
    use chrono::Local;
    use pretty_assertions::assert_eq;

    fn user(id: u64, text: &str) -> Message {
        Message::new(MessageId(id), Sender::User, text, Local::now())
    }

    fn assistant(id: u64, text: &str) -> Message {
        Message::new(MessageId(id), Sender::Assistant, text, Local::now())
    }

    fn run(events: Vec<Event>) -> ChatState {
        events.into_iter().fold(ChatState::default(), transition)
    }

    #[test]
    fn test_submit_marks_pending_and_hides_suggestions() {
        let state = run(vec![Event::Submitted(user(0, "hello"))]);

        assert!(state.pending);
        assert!(!state.suggestions_visible);
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages.last().map(|m| m.sender()), Some(Sender::User));
    }

    #[test]
    fn test_submit_while_pending_is_ignored() {
        let first = run(vec![Event::Submitted(user(0, "one"))]);
        let second = transition(first.clone(), Event::Submitted(user(1, "two")));

        assert_eq!(second, first);
    }

    #[test]
    fn test_blank_submit_is_ignored() {
        let state = run(vec![Event::Submitted(user(0, "   \n\t"))]);

        assert_eq!(state, ChatState::default());
    }

    #[test]
    fn test_submit_clears_previous_error() {
        let state = run(vec![
            Event::Submitted(user(0, "test")),
            Event::RequestFailed(assistant(1, FAILURE_NOTICE)),
        ]);
        assert_eq!(state.last_error.as_deref(), Some(CONNECTIVITY_ERROR));

        let state = transition(state, Event::Submitted(user(2, "again")));
        assert_eq!(state.last_error, None);
        assert_eq!(state.messages.len(), 3);
    }

    #[test]
    fn test_reply_releases_pending() {
        let state = run(vec![
            Event::Submitted(user(0, "Explain quantum physics")),
            Event::ReplyReceived(assistant(1, "Quantum physics is...")),
        ]);

        assert!(!state.pending);
        assert_eq!(state.last_error, None);
        assert_eq!(state.messages.last().map(|m| m.text()), Some("Quantum physics is..."));
    }

    #[test]
    fn test_failure_keeps_notice_in_log() {
        let state = run(vec![
            Event::Submitted(user(0, "test")),
            Event::RequestFailed(assistant(1, FAILURE_NOTICE)),
        ]);

        assert!(!state.pending);
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages.last().map(|m| m.text()), Some(FAILURE_NOTICE));
    }

    #[test]
    fn test_clear_resets_log_but_not_pending() {
        let state = run(vec![
            Event::Submitted(user(0, "hello")),
            Event::Copied(MessageId(0)),
            Event::Cleared,
        ]);

        assert!(state.messages.is_empty());
        assert!(state.suggestions_visible);
        assert_eq!(state.last_copied, None);
        assert!(state.pending);

        // A late reply still lands in the cleared log
        let state = transition(state, Event::ReplyReceived(assistant(1, "late")));
        assert_eq!(state.messages.len(), 1);
        assert!(!state.pending);
    }

    #[test]
    fn test_feedback_toggle_sequence() {
        let base = run(vec![
            Event::Submitted(user(0, "hi")),
            Event::ReplyReceived(assistant(1, "hello")),
        ]);
        let like = Event::FeedbackToggled { id: MessageId(1), kind: FeedbackKind::Like };
        let dislike = Event::FeedbackToggled { id: MessageId(1), kind: FeedbackKind::Dislike };

        let liked = transition(base.clone(), like.clone());
        assert_eq!(liked.messages.get(MessageId(1)).unwrap().feedback(), Feedback::Liked);

        let cleared = transition(liked.clone(), like);
        assert_eq!(cleared.messages.get(MessageId(1)).unwrap().feedback(), Feedback::None);

        let disliked = transition(liked, dislike);
        assert_eq!(disliked.messages.get(MessageId(1)).unwrap().feedback(), Feedback::Disliked);
    }

    #[test]
    fn test_feedback_on_user_message_is_ignored() {
        let base = run(vec![Event::Submitted(user(0, "hi"))]);
        let after = transition(
            base.clone(),
            Event::FeedbackToggled { id: MessageId(0), kind: FeedbackKind::Like },
        );

        assert_eq!(after, base);
    }

    #[test]
    fn test_copy_flag_only_for_known_ids() {
        let base = run(vec![Event::Submitted(user(0, "hi"))]);

        assert_eq!(transition(base.clone(), Event::Copied(MessageId(7))).last_copied, None);

        let copied = transition(base, Event::Copied(MessageId(0)));
        assert_eq!(copied.last_copied, Some(MessageId(0)));

        // A stale expiry for another id leaves the flag alone
        let still = transition(copied.clone(), Event::CopyExpired(MessageId(3)));
        assert_eq!(still.last_copied, Some(MessageId(0)));

        let expired = transition(copied, Event::CopyExpired(MessageId(0)));
        assert_eq!(expired.last_copied, None);
    }

    #[test]
    fn test_reply_message_placeholder() {
        let now = Local::now();
        assert_eq!(reply_message(MessageId(0), None, now).text(), EMPTY_REPLY_PLACEHOLDER);
        assert_eq!(
            reply_message(MessageId(0), Some(" ".to_string()), now).text(),
            EMPTY_REPLY_PLACEHOLDER
        );
        assert_eq!(reply_message(MessageId(0), Some("ok".to_string()), now).text(), "ok");
    }
}
