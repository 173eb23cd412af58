use crate::backend::{ChatBackend, HttpChatBackend, TransportError};
use crate::clipboard::{Clipboard, SystemClipboard};
use crate::config::{Config, DEFAULT_COPY_FLASH_MS, DEFAULT_SUGGESTIONS};
use crate::state::{ChatState, FeedbackKind, Message, MessageId, Origin, Sender};
use crate::transition::{reply_message, transition, Event, FAILURE_NOTICE};
use chrono::Local;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;

/// Why a submit did nothing. Never shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitSkipped {
    #[error("message is empty")]
    EmptyInput,
    #[error("a request is already in flight")]
    RequestPending,
    #[error("no such suggestion")]
    NoSuchSuggestion,
}

/// The one request in flight.
///
/// Returned by [`ConversationController::begin_submit`] and consumed by
/// [`ConversationController::complete`], so each request resolves once.
#[derive(Debug)]
#[must_use = "a pending request must be handed back to `complete`"]
pub struct PendingRequest {
    message: String,
    user_message: MessageId,
}

impl PendingRequest {
    /// Text sent to the service
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Log entry for the user's side of this turn
    pub fn user_message(&self) -> MessageId {
        self.user_message
    }
}

/// A request owned by [`ConversationController::submit`].
///
/// If the submit future is dropped mid-flight the request still resolves,
/// through the failure path.
struct InFlight<'a> {
    controller: &'a mut ConversationController,
    request: Option<PendingRequest>,
}

impl InFlight<'_> {
    fn resolve(&mut self, outcome: Result<Option<String>, TransportError>) {
        if let Some(request) = self.request.take() {
            self.controller.complete(request, outcome);
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.resolve(Err(TransportError::Interrupted("submit was cancelled".to_string())));
    }
}

/// Owns the conversation and is the only thing that changes it.
///
/// Presentation layers call the operations below and either read
/// [`state`](Self::state) or [`subscribe`](Self::subscribe) to snapshots.
pub struct ConversationController {
    state: ChatState,
    backend: Arc<dyn ChatBackend>,
    clipboard: Box<dyn Clipboard>,
    suggestions: Vec<String>,
    copy_flash: Duration,
    copied_at: Option<Instant>,
    next_id: u64,
    snapshots: watch::Sender<ChatState>,
}

impl ConversationController {
    pub fn new(backend: Arc<dyn ChatBackend>, clipboard: Box<dyn Clipboard>) -> Self {
        let state = ChatState::default();
        let (snapshots, _) = watch::channel(state.clone());
        Self {
            state,
            backend,
            clipboard,
            suggestions: DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
            copy_flash: Duration::from_millis(DEFAULT_COPY_FLASH_MS),
            copied_at: None,
            next_id: 0,
            snapshots,
        }
    }

    /// HTTP backend and system clipboard, both set up from `config`
    pub fn from_config(config: &Config) -> Self {
        let backend = HttpChatBackend::new(&config.backend_url()).with_reply_field(config.reply_field());
        Self::new(Arc::new(backend), Box::new(SystemClipboard))
            .with_suggestions(config.suggestions())
            .with_copy_flash(config.copy_flash())
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_copy_flash(mut self, copy_flash: Duration) -> Self {
        self.copy_flash = copy_flash;
        self
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    /// Receive a fresh snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<ChatState> {
        self.snapshots.subscribe()
    }

    pub fn backend(&self) -> Arc<dyn ChatBackend> {
        Arc::clone(&self.backend)
    }

    /// Suggestion chips on offer; empty once the conversation has started
    pub fn suggestions(&self) -> &[String] {
        if self.state.suggestions_visible {
            &self.suggestions
        } else {
            &[]
        }
    }

    /// Send `text` and wait for the reply.
    ///
    /// Holds the controller for the whole round trip. Surfaces that need to
    /// keep working while the request is out use [`begin_submit`](Self::begin_submit)
    /// and [`complete`](Self::complete) instead.
    pub async fn submit(&mut self, text: &str, origin: Origin) -> Result<(), SubmitSkipped> {
        let request = self.begin_submit(text, origin)?;
        let backend = self.backend();
        let message = request.message().to_string();
        let mut in_flight = InFlight {
            controller: self,
            request: Some(request),
        };
        let outcome = backend.send(&message).await;
        in_flight.resolve(outcome);
        Ok(())
    }

    pub async fn submit_suggestion(&mut self, index: usize) -> Result<(), SubmitSkipped> {
        let text = self.suggestion_text(index)?;
        self.submit(&text, Origin::Suggestion).await
    }

    /// Record the user's message and mark the request as in flight.
    ///
    /// The caller sends [`PendingRequest::message`] to the backend and hands
    /// the outcome to [`complete`](Self::complete).
    pub fn begin_submit(&mut self, text: &str, origin: Origin) -> Result<PendingRequest, SubmitSkipped> {
        if text.trim().is_empty() {
            tracing::debug!(?origin, "ignoring empty submit");
            return Err(SubmitSkipped::EmptyInput);
        }
        if self.state.pending {
            tracing::debug!(?origin, "ignoring submit while a request is in flight");
            return Err(SubmitSkipped::RequestPending);
        }

        let id = self.mint_id();
        self.apply(Event::Submitted(Message::new(id, Sender::User, text, Local::now())));
        tracing::info!(message_id = %id, ?origin, chars = text.chars().count(), "sending chat message");

        Ok(PendingRequest {
            message: text.to_string(),
            user_message: id,
        })
    }

    pub fn begin_suggestion(&mut self, index: usize) -> Result<PendingRequest, SubmitSkipped> {
        let text = self.suggestion_text(index)?;
        self.begin_submit(&text, Origin::Suggestion)
    }

    /// Resolve the request started by [`begin_submit`](Self::begin_submit).
    pub fn complete(&mut self, request: PendingRequest, outcome: Result<Option<String>, TransportError>) {
        let id = self.mint_id();
        let now = Local::now();
        match outcome {
            Ok(reply) => {
                tracing::info!(message_id = %id, reply_to = %request.user_message, "received reply");
                self.apply(Event::ReplyReceived(reply_message(id, reply, now)));
            }
            Err(e) => {
                tracing::warn!(reply_to = %request.user_message, error = %e, "chat request failed");
                self.apply(Event::RequestFailed(Message::new(id, Sender::Assistant, FAILURE_NOTICE, now)));
            }
        }
    }

    pub fn clear(&mut self) {
        tracing::debug!(messages = self.state.messages.len(), "clearing conversation");
        self.copied_at = None;
        self.apply(Event::Cleared);
    }

    pub fn set_feedback(&mut self, id: MessageId, kind: FeedbackKind) {
        self.apply(Event::FeedbackToggled { id, kind });
        if let Some(message) = self.state.messages.get(id) {
            tracing::debug!(message_id = %id, feedback = ?message.feedback(), "feedback updated");
        }
    }

    /// Put a message's text on the clipboard and flag it as copied
    pub fn copy(&mut self, id: MessageId) {
        let Some(message) = self.state.messages.get(id) else {
            return;
        };
        self.clipboard.write(message.text());
        self.copied_at = Some(Instant::now());
        self.apply(Event::Copied(id));
    }

    pub fn dismiss_error(&mut self) {
        self.apply(Event::ErrorDismissed);
    }

    /// Expire the "copied" flag once the flash duration has passed
    pub fn tick(&mut self, now: Instant) {
        let (Some(id), Some(at)) = (self.state.last_copied, self.copied_at) else {
            return;
        };
        if now.saturating_duration_since(at) >= self.copy_flash {
            self.copied_at = None;
            self.apply(Event::CopyExpired(id));
        }
    }

    fn suggestion_text(&self, index: usize) -> Result<String, SubmitSkipped> {
        self.suggestions()
            .get(index)
            .cloned()
            .ok_or(SubmitSkipped::NoSuchSuggestion)
    }

    fn mint_id(&mut self) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        id
    }

    fn apply(&mut self, event: Event) {
        let state = std::mem::take(&mut self.state);
        self.state = transition(state, event);
        self.snapshots.send_replace(self.state.clone());
    }
}
