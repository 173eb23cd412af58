use crate::app::{App, InputMode};
use crate::tui::AppEvent;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use study_buddy_core::FeedbackKind;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick(),
    }
    app.poll_reply().await;
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return;
            }
            KeyCode::Char('l') => {
                app.clear();
                return;
            }
            _ => {}
        }
    }

    match key.code {
        KeyCode::Esc if app.view.last_error.is_some() => {
            app.dismiss_error();
            return;
        }
        KeyCode::Tab => {
            match app.input_mode {
                InputMode::Editing => app.enter_selecting(),
                InputMode::Selecting => app.input_mode = InputMode::Editing,
            }
            return;
        }
        _ => {}
    }

    match app.input_mode {
        InputMode::Editing => handle_editing(app, key),
        InputMode::Selecting => handle_selecting(app, key),
    }
}

fn handle_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.enter_selecting(),
        KeyCode::Enter => app.send_input(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if app.cursor < app.input.chars().count() {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => app.cursor = app.cursor.saturating_sub(1),
        KeyCode::Right => app.cursor = (app.cursor + 1).min(app.input.chars().count()),
        KeyCode::Home => app.cursor = 0,
        KeyCode::End => app.cursor = app.input.chars().count(),
        _ => {}
    }
}

fn handle_selecting(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc | KeyCode::Char('i') => app.input_mode = InputMode::Editing,
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::PageDown => app.scroll_down(),
        KeyCode::PageUp => app.scroll_up(),
        KeyCode::Char('l') => app.feedback_selected(FeedbackKind::Like),
        KeyCode::Char('d') => app.feedback_selected(FeedbackKind::Dislike),
        KeyCode::Char('c') => app.copy_selected(),
        KeyCode::Char(c @ '1'..='9') => {
            let index = (c as usize) - ('1' as usize);
            app.pick_suggestion(index);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use study_buddy_core::{ConversationController, NoClipboard, TransportError};

    struct SilentBackend;

    #[async_trait::async_trait]
    impl study_buddy_core::ChatBackend for SilentBackend {
        async fn send(&self, _message: &str) -> Result<Option<String>, TransportError> {
            Ok(None)
        }
    }

    fn app() -> App {
        App::new(ConversationController::new(Arc::new(SilentBackend), Box::new(NoClipboard)))
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        let s = "añb";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 10), s.len());
    }

    #[test]
    fn test_typing_and_editing() {
        let mut app = app();
        for c in "héllo".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.input, "hélo");
        assert_eq!(app.cursor, 3);

        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Delete);
        assert_eq!(app.input, "élo");
    }

    #[test]
    fn test_tab_toggles_mode() {
        let mut app = app();
        assert_eq!(app.input_mode, InputMode::Editing);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.input_mode, InputMode::Selecting);
        // 'l' is feedback in selection mode, not text
        press(&mut app, KeyCode::Char('l'));
        assert!(app.input.is_empty());
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = app();
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
        assert!(app.input.is_empty());
    }

    #[tokio::test]
    async fn test_number_key_picks_suggestion() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('2'));

        assert!(app.view.pending);
        assert_eq!(
            app.view.messages.last().map(|m| m.text().to_string()),
            Some(study_buddy_core::config::DEFAULT_SUGGESTIONS[1].to_string())
        );
        assert_eq!(app.input_mode, InputMode::Editing);
    }
}
