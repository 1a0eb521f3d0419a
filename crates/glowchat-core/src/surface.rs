//! Rendering surface: what the user sees, as opposed to what is sent.
//!
//! Entries mirror the user and assistant turns of the transcript, plus
//! transient placeholders (the typing indicator) that never reach the
//! transcript.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    User,
    Assistant,
    /// Typing indicator shown while a reply is in flight
    Pending,
}

impl EntryKind {
    pub fn is_transient(&self) -> bool {
        matches!(self, EntryKind::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    pub text: String,
}

impl Entry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Assistant,
            text: text.into(),
        }
    }

    pub fn pending() -> Self {
        Self {
            kind: EntryKind::Pending,
            text: String::new(),
        }
    }
}

/// Anything the conversation controller can draw into.
pub trait Surface {
    fn append(&mut self, entry: Entry);

    /// Remove and return the most recently appended entry.
    fn remove_last(&mut self) -> Option<Entry>;

    fn last(&self) -> Option<&Entry>;

    /// Keep the newest entry in view.
    fn scroll_to_bottom(&mut self);
}

/// In-memory surface backing the terminal chat pane.
#[derive(Debug, Default, Clone)]
pub struct ChatView {
    entries: Vec<Entry>,
    follow_tail: bool,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|e| e.kind.is_transient()).count()
    }

    /// Whether the view should be pinned to the newest entry
    pub fn follows_tail(&self) -> bool {
        self.follow_tail
    }

    /// Called when the user scrolls away from the bottom manually.
    pub fn unpin(&mut self) {
        self.follow_tail = false;
    }
}

impl Surface for ChatView {
    fn append(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    fn remove_last(&mut self) -> Option<Entry> {
        self.entries.pop()
    }

    fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    fn scroll_to_bottom(&mut self) {
        self.follow_tail = true;
    }
}
