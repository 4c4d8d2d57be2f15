//! Rendering boundary.
//!
//! The view layer only reads session state: it receives a [`SessionView`]
//! snapshot (or borrows the transcript) and produces text. User input comes
//! back through the [`Composer`], whose submit trigger hands a draft to
//! [`crate::session::ChatSession::send`].

use std::fmt::Write as _;

use serde::Serialize;

use crate::session::{ConnectionStatus, Message, Sender};

/// Read-only snapshot of a session for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub status: ConnectionStatus,
    pub messages: Vec<Message>,
    /// Partial assistant text; empty when no reply is in flight.
    pub streaming: String,
}

/// Status header, e.g. `[connected]`.
#[must_use]
pub fn status_line(status: ConnectionStatus) -> String {
    format!("[{status}]")
}

/// Prefix printed before a message body.
#[must_use]
pub fn label(sender: Sender) -> String {
    format!("{}: ", sender.display_name())
}

/// Render a whole snapshot as plain text.
///
/// Messages appear in transcript order; an in-flight reply is rendered last
/// as an assistant block.
#[must_use]
pub fn render(view: &SessionView) -> String {
    let mut out = status_line(view.status);
    out.push('\n');

    for message in &view.messages {
        let _ = writeln!(out, "{}{}", label(message.sender()), message.text());
    }

    if !view.streaming.is_empty() {
        let _ = writeln!(out, "{}{}", label(Sender::Assistant), view.streaming);
    }

    out
}

/// A key press delivered to the [`Composer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter { shift: bool },
    Backspace,
}

/// Free-text entry with an Enter-to-submit trigger.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    draft: String,
}

impl Composer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Apply one key press. Returns the draft when it is submitted.
    ///
    /// Enter without Shift submits and clears the draft, unless the draft is
    /// only whitespace, in which case nothing happens. Shift+Enter inserts a
    /// newline.
    pub fn on_key(&mut self, key: Key) -> Option<String> {
        match key {
            Key::Char(c) => self.draft.push(c),
            Key::Backspace => {
                self.draft.pop();
            }
            Key::Enter { shift: true } => self.draft.push('\n'),
            Key::Enter { shift: false } => return self.submit(),
        }
        None
    }

    /// Feed one line of terminal input.
    ///
    /// A trailing `\` continues the draft on the next line (Shift+Enter);
    /// any other line ends with a submit.
    pub fn on_line(&mut self, line: &str) -> Option<String> {
        let (body, shift) = match line.strip_suffix('\\') {
            Some(body) => (body, true),
            None => (line, false),
        };
        for c in body.chars() {
            self.on_key(Key::Char(c));
        }
        self.on_key(Key::Enter { shift })
    }

    fn submit(&mut self) -> Option<String> {
        if self.draft.trim().is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.draft))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_messages_then_streaming() {
        let view = SessionView {
            status: ConnectionStatus::Connected,
            messages: vec![
                Message::user("top customers"),
                Message::assistant("SELECT * FROM customers;"),
            ],
            streaming: "SELECT na".to_string(),
        };

        let rendered = render(&view);
        assert_eq!(
            rendered,
            "[connected]\n\
             You: top customers\n\
             SQL Genie: SELECT * FROM customers;\n\
             SQL Genie: SELECT na\n"
        );
    }

    #[test]
    fn test_render_without_streaming() {
        let view = SessionView {
            status: ConnectionStatus::Error,
            messages: Vec::new(),
            streaming: String::new(),
        };
        assert_eq!(render(&view), "[error]\n");
    }

    #[test]
    fn test_composer_submit_and_newline() {
        let mut composer = Composer::new();
        for c in "line one".chars() {
            assert!(composer.on_key(Key::Char(c)).is_none());
        }
        assert!(composer.on_key(Key::Enter { shift: true }).is_none());
        composer.on_key(Key::Char('x'));
        composer.on_key(Key::Backspace);
        composer.on_key(Key::Char('2'));

        let submitted = composer.on_key(Key::Enter { shift: false });
        assert_eq!(submitted.as_deref(), Some("line one\n2"));
        assert_eq!(composer.draft(), "");
    }

    #[test]
    fn test_composer_ignores_blank_submit() {
        let mut composer = Composer::new();
        composer.on_key(Key::Char(' '));
        assert!(composer.on_key(Key::Enter { shift: false }).is_none());
        assert_eq!(composer.draft(), " ");
    }

    #[test]
    fn test_composer_line_continuation() {
        let mut composer = Composer::new();
        assert!(composer.on_line("SELECT the top\\").is_none());
        assert_eq!(
            composer.on_line("customers").as_deref(),
            Some("SELECT the top\ncustomers")
        );
        assert!(composer.on_line("").is_none());
    }
}
