use glowchat_core::{ChatView, Conversation, ExchangeError, Submission, Surface};
use tokio::sync::mpsc::UnboundedSender;

use crate::tui::AppEvent;

/// Fallback sizes until the first frame has been drawn
const DEFAULT_WRAP_WIDTH: u16 = 50;
const DEFAULT_CHAT_HEIGHT: u16 = 20;

pub struct App {
    pub should_quit: bool,
    pub conversation: Conversation<ChatView>,

    // Input box
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Chat pane
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    pub animation_frame: u8,
    /// Shown in the header so it's obvious where messages go
    pub endpoint_label: String,
}

impl App {
    pub fn new(conversation: Conversation<ChatView>) -> Self {
        let client = conversation.client();
        let endpoint_label = client
            .endpoint_host()
            .unwrap_or_else(|| client.endpoint().to_string());
        Self {
            should_quit: false,
            conversation,
            input: String::new(),
            cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            endpoint_label,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.conversation.is_pending()
    }

    /// Send the input box contents, posting the reply back through `tx`.
    pub fn submit(&mut self, tx: &UnboundedSender<AppEvent>) {
        match self.conversation.submit(&mut self.input) {
            Submission::Dispatched(pending) => {
                self.cursor = 0;
                self.animation_frame = 0;
                let tx = tx.clone();
                tokio::spawn(async move {
                    let outcome = pending.resolve().await;
                    // Receiver only goes away when the app is quitting
                    let _ = tx.send(AppEvent::Reply(outcome));
                });
            }
            Submission::Busy => {
                tracing::debug!("ignoring Enter while a reply is pending");
            }
            Submission::Empty => {}
        }
    }

    pub fn receive_reply(&mut self, outcome: Result<String, ExchangeError>) {
        self.conversation.settle(outcome);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_waiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    fn wrap_width(&self) -> u16 {
        if self.chat_width > 0 {
            self.chat_width
        } else {
            DEFAULT_WRAP_WIDTH
        }
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            DEFAULT_CHAT_HEIGHT
        }
    }

    /// Rendered height of the whole chat at the current pane width.
    pub fn chat_line_count(&self) -> u16 {
        let lines = crate::ui::chat_paragraph(self).line_count(self.wrap_width());
        u16::try_from(lines).unwrap_or(u16::MAX)
    }

    fn max_scroll(&self) -> u16 {
        self.chat_line_count().saturating_sub(self.visible_height())
    }

    /// Keep the chat pinned to the newest entry if the surface asks for it.
    pub fn follow_tail(&mut self) {
        if self.conversation.surface().follows_tail() {
            self.chat_scroll = self.max_scroll();
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        if self.chat_scroll < self.max_scroll() {
            self.conversation.surface_mut().unpin();
        }
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        if self.chat_scroll == max {
            self.conversation.surface_mut().scroll_to_bottom();
        }
    }

    pub fn half_page(&self) -> u16 {
        (self.visible_height() / 2).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glowchat_core::{ChatClient, Entry};

    fn app() -> App {
        let conversation = Conversation::new(
            ChatClient::new("https://relay.example.dev/v1/chat"),
            "sys",
            ChatView::new(),
        );
        let mut app = App::new(conversation);
        app.chat_width = 10;
        app.chat_height = 4;
        app
    }

    #[test]
    fn test_endpoint_label_is_the_host() {
        assert_eq!(app().endpoint_label, "relay.example.dev");

        let conversation = Conversation::new(ChatClient::new("relay.local/x"), "sys", ChatView::new());
        assert_eq!(App::new(conversation).endpoint_label, "relay.local/x");
    }

    #[test]
    fn test_chat_line_count_wraps_long_lines() {
        let mut app = app();
        // label + 3 wrapped lines (25 chars at width 10) + blank
        app.conversation.greet(&"x".repeat(25));
        assert_eq!(app.chat_line_count(), 5);

        // label + exactly one full line + blank
        app.conversation.greet(&"y".repeat(10));
        assert_eq!(app.chat_line_count(), 8);
    }

    #[test]
    fn test_chat_line_count_wraps_at_word_boundaries() {
        let mut app = app();
        // 16 chars would fit in two rows cut mid-word; word wrap needs three
        app.conversation.greet("aaa bbbbbbbb ccc");
        assert_eq!(app.chat_line_count(), 5);
    }

    #[test]
    fn test_pending_entry_takes_two_lines() {
        let mut app = app();
        app.conversation.surface_mut().append(Entry::pending());
        assert_eq!(app.chat_line_count(), 3);
    }

    #[test]
    fn test_follow_tail_and_manual_scroll() {
        let mut app = app();
        for i in 0..4 {
            app.conversation.greet(&format!("message {i}"));
        }
        app.follow_tail();
        let bottom = app.chat_line_count() - app.chat_height;
        assert!(bottom > 3);
        assert_eq!(app.chat_scroll, bottom);

        app.scroll_up(3);
        assert_eq!(app.chat_scroll, bottom - 3);
        assert!(!app.conversation.surface().follows_tail());

        app.conversation.greet("another");
        app.follow_tail();
        let bottom = app.chat_line_count() - app.chat_height;
        assert_eq!(app.chat_scroll, bottom);

        app.scroll_up(u16::MAX);
        assert_eq!(app.chat_scroll, 0);
        app.scroll_down(u16::MAX);
        assert_eq!(app.chat_scroll, bottom);
        assert!(app.conversation.surface().follows_tail());
    }
}
