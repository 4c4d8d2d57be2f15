//! Sentinel-terminated text framing.
//!
//! A reply is streamed as any number of plain-text frames followed by one
//! frame whose entire payload is [`END_OF_MESSAGE`]. The terminator is never
//! escaped, so content that is exactly equal to it cannot be represented;
//! the writer side logs such fragments as a protocol hazard.
//!
//! # Example
//!
//! ```rust
//! use sql_genie::protocol::{END_OF_MESSAGE, Frame, FrameAssembler};
//!
//! let mut assembler = FrameAssembler::new();
//! assert_eq!(assembler.push("SELECT "), Frame::Pending);
//! assert_eq!(assembler.push("1;"), Frame::Pending);
//! assert_eq!(
//!     assembler.push(END_OF_MESSAGE),
//!     Frame::Complete("SELECT 1;".to_string())
//! );
//! ```

/// Reserved frame payload marking the end of one streamed reply.
pub const END_OF_MESSAGE: &str = "[[END_OF_MESSAGE]]";

/// Returns `true` when a frame payload is the terminator.
///
/// Only an exact match counts; a fragment that merely contains the
/// terminator is ordinary content.
#[must_use]
pub fn is_terminator(chunk: &str) -> bool {
    chunk == END_OF_MESSAGE
}

/// Outcome of feeding one frame to a [`FrameAssembler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// The chunk was appended; the reply is still in flight.
    Pending,
    /// A terminator closed a non-empty reply.
    Complete(String),
    /// A terminator arrived with nothing buffered.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssemblerState {
    Accumulating,
    Flushed,
}

/// Two-state parser that turns fragments into complete replies.
///
/// `Flushed` is the state right after a terminator (and the initial state);
/// any content chunk moves it to `Accumulating`.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    state: AssemblerState,
    buffer: String,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    /// Create an empty assembler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AssemblerState::Flushed,
            buffer: String::new(),
        }
    }

    /// Feed one inbound frame payload.
    pub fn push(&mut self, chunk: &str) -> Frame {
        if is_terminator(chunk) {
            self.state = AssemblerState::Flushed;
            if self.buffer.is_empty() {
                return Frame::Empty;
            }
            return Frame::Complete(std::mem::take(&mut self.buffer));
        }

        self.state = AssemblerState::Accumulating;
        self.buffer.push_str(chunk);
        Frame::Pending
    }

    /// Text received since the last terminator.
    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Whether a reply is currently being received.
    #[must_use]
    pub fn is_accumulating(&self) -> bool {
        self.state == AssemblerState::Accumulating
    }

    /// Drop any partial reply, returning what was discarded.
    pub fn discard(&mut self) -> String {
        self.state = AssemblerState::Flushed;
        std::mem::take(&mut self.buffer)
    }
}

/// Log a reply fragment that the receiver would mistake for the terminator.
pub(crate) fn warn_if_terminator(fragment: &str) {
    if is_terminator(fragment) {
        tracing::warn!(
            name: "protocol.terminator_in_content",
            "Reply fragment equals the terminator; the receiver will end the message early"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragments_concatenate_without_delimiter() {
        let mut assembler = FrameAssembler::new();
        for chunk in ["SELECT ", "* FROM ", "users;"] {
            assert_eq!(assembler.push(chunk), Frame::Pending);
        }
        assert_eq!(assembler.buffer(), "SELECT * FROM users;");
        assert_eq!(
            assembler.push(END_OF_MESSAGE),
            Frame::Complete("SELECT * FROM users;".to_string())
        );
        assert_eq!(assembler.buffer(), "");
    }

    #[test]
    fn test_terminator_on_empty_buffer() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.push(END_OF_MESSAGE), Frame::Empty);
        assert_eq!(assembler.push(END_OF_MESSAGE), Frame::Empty);
    }

    #[test]
    fn test_state_transitions() {
        let mut assembler = FrameAssembler::new();
        assert!(!assembler.is_accumulating());

        assembler.push("partial");
        assert!(assembler.is_accumulating());

        assembler.push(END_OF_MESSAGE);
        assert!(!assembler.is_accumulating());

        assembler.push("next");
        assert!(assembler.is_accumulating());
        assert_eq!(assembler.buffer(), "next");
    }

    #[test]
    fn test_empty_fragment_then_terminator_is_empty() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.push(""), Frame::Pending);
        assert!(assembler.is_accumulating());
        assert_eq!(assembler.buffer(), "");
        assert_eq!(assembler.push(END_OF_MESSAGE), Frame::Empty);
        assert!(!assembler.is_accumulating());
    }

    #[test]
    fn test_back_to_back_replies() {
        let mut assembler = FrameAssembler::new();
        assembler.push("first");
        assembler.push("");
        assert_eq!(
            assembler.push(END_OF_MESSAGE),
            Frame::Complete("first".to_string())
        );
        assembler.push("sec");
        assembler.push("ond");
        assert_eq!(
            assembler.push(END_OF_MESSAGE),
            Frame::Complete("second".to_string())
        );
        assert_eq!(assembler.push(END_OF_MESSAGE), Frame::Empty);
    }

    #[test]
    fn test_embedded_terminator_is_content() {
        let mut assembler = FrameAssembler::new();
        let chunk = format!("before {END_OF_MESSAGE} after");
        assert_eq!(assembler.push(&chunk), Frame::Pending);
        assert_eq!(assembler.buffer(), chunk);
    }

    #[test]
    fn test_whitespace_only_reply_is_kept() {
        let mut assembler = FrameAssembler::new();
        assembler.push("\n");
        assert_eq!(
            assembler.push(END_OF_MESSAGE),
            Frame::Complete("\n".to_string())
        );
    }

    #[test]
    fn test_discard_drops_partial_reply() {
        let mut assembler = FrameAssembler::new();
        assembler.push("partial answ");
        assert_eq!(assembler.discard(), "partial answ");
        assert_eq!(assembler.push(END_OF_MESSAGE), Frame::Empty);
    }
}
