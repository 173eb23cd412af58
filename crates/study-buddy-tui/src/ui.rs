use crate::app::{App, InputMode};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use study_buddy_core::{Feedback, Message, Sender};

/// Style **bold** runs in a line of assistant text
fn styled_reply_line(text: &str) -> Line<'static> {
    // An unpaired marker is shown as typed
    if text.matches("**").count() % 2 == 1 {
        return Line::from(text.to_string());
    }

    let mut spans = Vec::new();
    for (i, part) in text.split("**").enumerate() {
        if part.is_empty() {
            continue;
        }
        // Odd segments sit between a pair of markers
        if i % 2 == 1 {
            spans.push(Span::styled(part.to_string(), Style::default().add_modifier(Modifier::BOLD)));
        } else {
            spans.push(Span::raw(part.to_string()));
        }
    }
    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let suggestions_height = if app.suggestions().is_empty() { 0 } else { 3 };
    let error_height = if app.view.last_error.is_some() { 1 } else { 0 };

    let [header_area, chat_area, suggestions_area, error_area, input_area, footer_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(suggestions_height),
            Constraint::Length(error_height),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(area);

    render_header(frame, header_area);
    render_chat(app, frame, chat_area);
    if suggestions_height > 0 {
        render_suggestions(app, frame, suggestions_area);
    }
    if let Some(error) = &app.view.last_error {
        let banner = Paragraph::new(format!(" {} (Esc to dismiss)", error))
            .style(Style::default().bg(Color::Red).fg(Color::White));
        frame.render_widget(banner, error_area);
    }
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Study Buddy ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("Your intelligent study companion ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn message_heading(app: &App, idx: usize, msg: &Message) -> Line<'static> {
    let selected = app.input_mode == InputMode::Selecting && app.selected == Some(idx);
    let marker = if selected { "> " } else { "" };

    let (label, color) = match msg.sender() {
        Sender::User => ("You", Color::Cyan),
        Sender::Assistant => ("Study Buddy", Color::Yellow),
    };
    let mut heading_style = Style::default().fg(color).add_modifier(Modifier::BOLD);
    if selected {
        heading_style = heading_style.add_modifier(Modifier::REVERSED);
    }

    let mut spans = vec![
        Span::styled(format!("{}{}:", marker, label), heading_style),
        Span::styled(format!(" {}", msg.time_label()), Style::default().fg(Color::DarkGray)),
    ];
    match msg.feedback() {
        Feedback::Liked => spans.push(Span::styled(" [+1]", Style::default().fg(Color::Green))),
        Feedback::Disliked => spans.push(Span::styled(" [-1]", Style::default().fg(Color::Red))),
        Feedback::None => {}
    }
    if app.view.last_copied == Some(msg.id()) {
        spans.push(Span::styled(" copied", Style::default().fg(Color::Green).italic()));
    }
    Line::from(spans)
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Inner size minus borders, for scroll calculations
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let border_color = if app.input_mode == InputMode::Selecting {
        Color::Cyan
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Conversation ");

    let text = if app.view.messages.is_empty() && !app.view.pending {
        Text::from(vec![
            Line::from(Span::styled("Start a conversation", Style::default().fg(Color::Cyan).bold())),
            Line::from(Span::styled(
                "Ask Study Buddy anything about your studies!",
                Style::default().fg(Color::DarkGray),
            )),
        ])
    } else {
        let mut lines: Vec<Line> = Vec::new();
        for (idx, msg) in app.view.messages.iter().enumerate() {
            lines.push(message_heading(app, idx, msg));
            for line in msg.text().lines() {
                match msg.sender() {
                    Sender::User => lines.push(Line::from(line.to_string())),
                    Sender::Assistant => lines.push(styled_reply_line(line)),
                }
            }
            lines.push(Line::default());
        }

        if app.view.pending {
            lines.push(Line::from(Span::styled(
                "Study Buddy:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }
        Text::from(lines)
    };

    let chat = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);
}

fn render_suggestions(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let mut spans = Vec::new();
    for (i, suggestion) in app.suggestions().iter().take(9).enumerate() {
        spans.push(Span::styled(format!(" {} ", i + 1), key_style));
        spans.push(Span::styled(format!(" {}  ", suggestion), Style::default().fg(Color::Magenta)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Try asking (Tab, then number) ");
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let title = if app.view.pending {
        " Waiting for Study Buddy... "
    } else {
        " Type your question... "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scroll so the cursor stays visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width > 0 && app.cursor >= inner_width {
        app.cursor - inner_width + 1
    } else {
        0
    };
    let visible: String = app.input.chars().skip(scroll_offset).take(inner_width).collect();

    let input = Paragraph::new(visible)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        let cursor_x = (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Editing => (" EDIT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        InputMode::Selecting => (" SELECT ", Style::default().bg(Color::Blue).fg(Color::White)),
    };

    let hints: &[(&str, &str)] = match app.input_mode {
        InputMode::Editing => &[
            (" Enter ", " send "),
            (" Tab ", " select "),
            (" C-l ", " clear "),
            (" C-c ", " quit "),
        ],
        InputMode::Selecting => &[
            (" j/k ", " move "),
            (" l ", " like "),
            (" d ", " dislike "),
            (" c ", " copy "),
            (" Tab ", " edit "),
            (" C-l ", " clear "),
            (" q ", " quit "),
        ],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in hints {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
