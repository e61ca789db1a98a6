use std::io::Write;
use std::sync::{Mutex, PoisonError};

use stellar_link_message::Message;
use tracing::warn;

use crate::handler::{ConnectionInfo, MessageHandler};

/// Line written when a connection is accepted.
pub const CONNECTION_NOTICE: &str = "got connection!";

/// Writes the position report for every message:
///
/// ```text
/// got connection!
/// {"current_position":42}
/// Current position is: 42
/// ```
pub struct PositionReporter<W> {
    out: Mutex<W>,
}

impl PositionReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> PositionReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lines(&self, lines: &[&str]) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let result = lines
            .iter()
            .try_for_each(|line| writeln!(out, "{line}"))
            .and_then(|()| out.flush());
        if let Err(err) = result {
            warn!(error = %err, "failed writing position report");
        }
    }
}

/// The position line for one message.
pub fn position_line(message: &Message) -> String {
    format!("Current position is: {}", message.current_position())
}

impl<W: Write + Send + 'static> MessageHandler for PositionReporter<W> {
    fn on_connect(&self, _conn: &ConnectionInfo) {
        self.write_lines(&[CONNECTION_NOTICE]);
    }

    fn on_message(&self, _conn: &ConnectionInfo, message: Message) {
        let object = message.to_string();
        let position = position_line(&message);
        self.write_lines(&[object.as_str(), position.as_str()]);
    }
}
