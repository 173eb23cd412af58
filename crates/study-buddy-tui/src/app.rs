use std::time::Instant;
use study_buddy_core::{
    ChatState, ConversationController, FeedbackKind, MessageId, Origin, PendingRequest,
    SubmitSkipped, TransportError,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Typing into the input box
    Editing,
    /// Moving through the log to like, dislike or copy
    Selecting,
}

type ReplyTask = JoinHandle<Result<Option<String>, TransportError>>;

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Input box
    pub input: String,
    pub cursor: usize, // cursor position in chars

    // Chat pane
    pub view: ChatState,
    pub selected: Option<usize>,
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height, set during render
    pub chat_width: u16,  // inner width, set during render
    pub animation_frame: u8,

    controller: ConversationController,
    snapshots: watch::Receiver<ChatState>,
    reply_task: Option<(PendingRequest, ReplyTask)>,
}

impl App {
    pub fn new(controller: ConversationController) -> Self {
        let snapshots = controller.subscribe();
        let view = controller.state().clone();
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            input: String::new(),
            cursor: 0,
            view,
            selected: None,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            controller,
            snapshots,
            reply_task: None,
        }
    }

    pub fn suggestions(&self) -> &[String] {
        self.controller.suggestions()
    }

    pub fn send_input(&mut self) {
        match self.controller.begin_submit(&self.input, Origin::Typed) {
            Ok(request) => {
                self.input.clear();
                self.cursor = 0;
                self.dispatch(request);
            }
            Err(skip) => tracing::debug!(reason = %skip, "input not sent"),
        }
    }

    pub fn pick_suggestion(&mut self, index: usize) {
        match self.controller.begin_suggestion(index) {
            Ok(request) => {
                self.input_mode = InputMode::Editing;
                self.dispatch(request);
            }
            Err(SubmitSkipped::NoSuchSuggestion) => {}
            Err(skip) => tracing::debug!(reason = %skip, "suggestion not sent"),
        }
    }

    /// Run the request on a background task so the UI keeps drawing
    fn dispatch(&mut self, request: PendingRequest) {
        let backend = self.controller.backend();
        let text = request.message().to_string();
        let handle = tokio::spawn(async move { backend.send(&text).await });
        self.reply_task = Some((request, handle));
        self.sync();
        self.scroll_to_bottom();
    }

    /// Hand a finished reply back to the controller
    pub async fn poll_reply(&mut self) {
        let finished = matches!(&self.reply_task, Some((_, handle)) if handle.is_finished());
        if !finished {
            return;
        }
        let Some((request, handle)) = self.reply_task.take() else {
            return;
        };
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(TransportError::Interrupted(e.to_string())),
        };
        self.controller.complete(request, outcome);
        self.sync();
        self.scroll_to_bottom();
    }

    pub fn clear(&mut self) {
        self.controller.clear();
        self.selected = None;
        self.chat_scroll = 0;
        self.sync();
    }

    pub fn dismiss_error(&mut self) {
        self.controller.dismiss_error();
        self.sync();
    }

    pub fn feedback_selected(&mut self, kind: FeedbackKind) {
        if let Some(id) = self.selected_message_id() {
            self.controller.set_feedback(id, kind);
            self.sync();
        }
    }

    pub fn copy_selected(&mut self) {
        if let Some(id) = self.selected_message_id() {
            self.controller.copy(id);
            self.sync();
        }
    }

    pub fn tick(&mut self) {
        if self.view.pending {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.controller.tick(Instant::now());
        self.sync();
    }

    /// Pull the latest snapshot from the controller
    fn sync(&mut self) {
        if !self.snapshots.has_changed().unwrap_or(false) {
            return;
        }
        let was_pending = self.view.pending;
        self.view = self.snapshots.borrow_and_update().clone();

        // Give the input box back once the reply lands
        if was_pending && !self.view.pending {
            self.input_mode = InputMode::Editing;
        }
        if let Some(idx) = self.selected {
            if idx >= self.view.messages.len() {
                self.selected = self.view.messages.len().checked_sub(1);
            }
        }
    }

    pub fn selected_message_id(&self) -> Option<MessageId> {
        self.selected
            .and_then(|idx| self.view.messages.as_slice().get(idx))
            .map(|m| m.id())
    }

    pub fn select_next(&mut self) {
        let len = self.view.messages.len();
        if len == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            Some(idx) => (idx + 1).min(len - 1),
            None => 0,
        });
    }

    pub fn select_prev(&mut self) {
        let len = self.view.messages.len();
        if len == 0 {
            return;
        }
        self.selected = Some(match self.selected {
            Some(idx) => idx.saturating_sub(1),
            None => len - 1,
        });
    }

    pub fn enter_selecting(&mut self) {
        self.input_mode = InputMode::Selecting;
        if self.selected.is_none() {
            self.selected = self.view.messages.len().checked_sub(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    /// Scroll chat to bottom so the newest entry is visible
    pub fn scroll_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: usize = 0;
        for msg in &self.view.messages {
            total_lines += 1; // sender line
            for line in msg.text().lines() {
                let chars = line.chars().count();
                total_lines += chars.div_ceil(wrap_width).max(1);
            }
            total_lines += 1; // blank line after message
        }
        if self.view.pending {
            total_lines += 2;
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height as usize
        } else {
            20
        };
        self.chat_scroll = total_lines.saturating_sub(visible_height).min(u16::MAX as usize) as u16;
    }
}
