use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use glowchat_core::EntryKind;

use crate::app::App;

/// Style `**bold**` and `*italic*` runs in a line of reply text.
///
/// Unclosed markers are kept as literal text.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current_text = String::new();
    let mut rest = text;

    while let Some(star) = rest.find('*') {
        current_text.push_str(&rest[..star]);
        let after = &rest[star..];

        let (marker, modifier) = if after.starts_with("**") {
            ("**", Modifier::BOLD)
        } else {
            ("*", Modifier::ITALIC)
        };
        let body = &after[marker.len()..];

        // Emphasis must hug its text: "2 * 3" is not italic
        let closing = body.find(marker).filter(|&end| {
            let inner = &body[..end];
            !inner.is_empty()
                && !inner.starts_with(char::is_whitespace)
                && !inner.ends_with(char::is_whitespace)
        });

        match closing {
            Some(end) => {
                if !current_text.is_empty() {
                    spans.push(Span::raw(std::mem::take(&mut current_text)));
                }
                spans.push(Span::styled(
                    body[..end].to_string(),
                    Style::default().add_modifier(modifier),
                ));
                rest = &body[end + marker.len()..];
            }
            _ => {
                current_text.push_str(marker);
                rest = body;
            }
        }
    }
    current_text.push_str(rest);

    if !current_text.is_empty() {
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" glowchat ", Style::default().fg(Color::Magenta).bold()),
        Span::styled(format!("→ {}", app.endpoint_label), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

/// Every surface entry as wrapped lines, without the border.
///
/// Scrolling measures this same paragraph, so the scroll target matches
/// what gets drawn.
pub fn chat_paragraph(app: &App) -> Paragraph<'static> {
    let label_style = |kind: EntryKind| match kind {
        EntryKind::User => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        EntryKind::Assistant | EntryKind::Pending => {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        }
    };

    let mut lines: Vec<Line<'static>> = Vec::new();
    for entry in app.conversation.surface().entries() {
        let label = match entry.kind {
            EntryKind::User => "You:",
            EntryKind::Assistant | EntryKind::Pending => "Assistant:",
        };
        lines.push(Line::from(Span::styled(label, label_style(entry.kind))));

        match entry.kind {
            EntryKind::Pending => {
                // Animated ellipsis: cycles through ".", "..", "..."
                let dots = ".".repeat((app.animation_frame as usize) + 1);
                lines.push(Line::from(Span::styled(
                    format!("Thinking{}", dots),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )));
            }
            EntryKind::User => {
                for line in entry.text.lines() {
                    lines.push(Line::raw(line.to_string()));
                }
            }
            EntryKind::Assistant => {
                for line in entry.text.lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true })
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Inner size minus borders, for scroll calculations
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);
    app.follow_tail();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ");

    let chat = chat_paragraph(app)
        .block(block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.is_waiting() { Color::DarkGray } else { Color::Yellow };
    let title = if app.is_waiting() { " Waiting for reply… " } else { " Ask " };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 || app.cursor < inner_width {
        0
    } else {
        app.cursor - inner_width + 1
    };

    let visible_text: String = app.input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);

    frame.render_widget(input, area);

    let cursor_x = (app.cursor - scroll_offset) as u16;
    frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let (mode_text, mode_style) = if app.is_waiting() {
        (" WAITING ", Style::default().bg(Color::Yellow).fg(Color::Black))
    } else {
        (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    let mut spans = vec![Span::styled(mode_text, mode_style)];
    spans.extend(vec![
        Span::styled(" Enter ", key_style),
        Span::styled(" send ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use glowchat_core::{ChatClient, ChatView, Conversation};
    use ratatui::{backend::TestBackend, Terminal};

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn styled(line: &Line) -> Vec<(String, Modifier)> {
        line.spans
            .iter()
            .map(|s| (s.content.to_string(), s.style.add_modifier))
            .collect()
    }

    #[test]
    fn test_bold_and_italic_runs() {
        let line = parse_markdown_line("Try **Revitalift** serum, *gently*.");
        assert_eq!(
            styled(&line),
            vec![
                ("Try ".to_string(), Modifier::empty()),
                ("Revitalift".to_string(), Modifier::BOLD),
                (" serum, ".to_string(), Modifier::empty()),
                ("gently".to_string(), Modifier::ITALIC),
                (".".to_string(), Modifier::empty()),
            ]
        );
    }

    #[test]
    fn test_caveat_renders_italic() {
        let line = parse_markdown_line("💡 *Response may be incomplete.*");
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[1].style.add_modifier, Modifier::ITALIC);
    }

    #[test]
    fn test_unclosed_markers_are_literal() {
        let line = parse_markdown_line("2 * 3 = 6 and **bold");
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "2 * 3 = 6 and **bold");
        assert!(line.spans.iter().all(|s| s.style.add_modifier.is_empty()));
    }

    #[test]
    fn test_empty_line() {
        assert!(parse_markdown_line("").spans.is_empty());
    }

    #[test]
    fn test_long_reply_scrolls_to_its_last_word() {
        let conversation = Conversation::new(ChatClient::new("http://localhost:8787"), "sys", ChatView::new());
        let mut app = App::new(conversation);
        let reply = "moisturizing hydration ".repeat(16) + " FINALWORD";
        app.conversation.greet(&reply);

        let mut terminal = Terminal::new(TestBackend::new(32, 14)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        assert!(app.chat_scroll > 0);
        assert!(screen_text(&terminal).contains("FINALWORD"));
    }

    #[test]
    fn test_header_shows_endpoint_host() {
        let conversation = Conversation::new(
            ChatClient::new("https://relay.example.workers.dev/v1/chat"),
            "sys",
            ChatView::new(),
        );
        let mut app = App::new(conversation);

        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.contains("relay.example.workers.dev"));
        assert!(!screen.contains("/v1/chat"));
    }
}
