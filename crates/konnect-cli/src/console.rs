//! Plain-text output.
//!
//! One line per item:
//! - `sender: message` for user messages
//! - `SYSTEM: message` for server announcements
//! - `! text` for advisories and errors
//! - `* text` for local feedback

use std::{fmt, io};

use konnect_client::Notice;
use konnect_core::{ChatEvent, ConnectionError, EventKind};

/// Render a chat event as one line.
pub fn render_event(event: &ChatEvent) -> String {
    match event.kind {
        EventKind::User => format!("{}: {}", event.sender, event.message),
        EventKind::System => format!("SYSTEM: {}", event.message),
    }
}

/// Render an advisory as one line.
pub fn render_advisory(err: &ConnectionError) -> String {
    if err.requires_rejoin() {
        format!("! {err} (type /rejoin)")
    } else {
        format!("! {err}")
    }
}

/// Line-oriented writer for chat output.
pub struct Console<W: io::Write> {
    out: W,
}

impl<W: io::Write> Console<W> {
    /// Write to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// The underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Print a runtime notice.
    pub fn notice(&mut self, notice: &Notice) -> io::Result<()> {
        let line = match notice {
            Notice::Message(event) => render_event(event),
            Notice::Advisory(err) => render_advisory(err),
        };
        self.line(&line)
    }

    /// Print local feedback.
    pub fn info(&mut self, text: impl fmt::Display) -> io::Result<()> {
        self.line(&format!("* {text}"))
    }

    /// Print a failed command.
    pub fn error(&mut self, err: impl fmt::Display) -> io::Result<()> {
        self.line(&format!("! {err}"))
    }

    fn line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(sender: &str, message: &str, kind: EventKind) -> ChatEvent {
        ChatEvent { sender: sender.into(), message: message.into(), kind, sequence: 1 }
    }

    fn output(console: &Console<Vec<u8>>) -> String {
        String::from_utf8_lossy(console.get_ref()).into_owned()
    }

    #[test]
    fn user_and_system_lines() {
        assert_eq!(render_event(&event("bob", "hi", EventKind::User)), "bob: hi");
        assert_eq!(
            render_event(&event("system", "User 'bob' joined the chat.", EventKind::System)),
            "SYSTEM: User 'bob' joined the chat."
        );
    }

    #[test]
    fn lost_connection_suggests_rejoin() {
        let err = ConnectionError::Lost { code: None, reason: String::new() };
        assert_eq!(render_advisory(&err), "! connection lost, rejoin (type /rejoin)");

        let err = ConnectionError::Transport("reset".into());
        assert_eq!(render_advisory(&err), "! connection error: reset");
    }

    #[test]
    fn writes_one_line_per_item() {
        let mut console = Console::new(Vec::new());
        console.notice(&Notice::Message(event("bob", "hi", EventKind::User))).unwrap();
        console.info("Name set to alice").unwrap();
        console.error("name cannot be empty").unwrap();

        assert_eq!(output(&console), "bob: hi\n* Name set to alice\n! name cannot be empty\n");
    }
}
