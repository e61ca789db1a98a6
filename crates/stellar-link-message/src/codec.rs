//! Stream framing for JSON messages.
//!
//! Stream sockets carry bytes, not messages, so [`MessageCodec`] buffers
//! partial reads until a whole message is available:
//!
//! - [`Framing::Eof`]: one message per connection, ending when the sender
//!   half-closes or closes its side.
//! - [`Framing::Lines`]: newline-delimited JSON, any number of messages per
//!   connection. A final unterminated line is still delivered at EOF.
//!
//! Both directions enforce the configured maximum message size.

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::error::{MessageError, Result};

/// Default maximum message size: 1 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// How message boundaries are found in the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// The message is everything sent before end-of-stream.
    #[default]
    Eof,
    /// Each `\n`-terminated line is one message.
    Lines,
}

impl Framing {
    pub fn name(self) -> &'static str {
        match self {
            Self::Eof => "eof",
            Self::Lines => "lines",
        }
    }
}

/// Codec producing raw, complete message payloads.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    framing: Framing,
    max_size: usize,
    // Bytes already scanned for a newline in Lines mode.
    next_index: usize,
}

impl MessageCodec {
    pub fn new(framing: Framing) -> Self {
        Self::with_max_size(framing, DEFAULT_MAX_MESSAGE_SIZE)
    }

    pub fn with_max_size(framing: Framing, max_size: usize) -> Self {
        Self {
            framing,
            max_size,
            next_index: 0,
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    fn check_size(&self, size: usize) -> Result<()> {
        if size > self.max_size {
            return Err(MessageError::TooLarge {
                size,
                max: self.max_size,
            });
        }
        Ok(())
    }

    fn decode_line(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        loop {
            let newline = src[self.next_index..]
                .iter()
                .position(|b| *b == b'\n')
                .map(|offset| self.next_index + offset);

            let Some(end) = newline else {
                self.next_index = src.len();
                // The pending line alone is already over budget.
                self.check_size(src.len())?;
                return Ok(None);
            };

            self.next_index = 0;
            let mut line = src.split_to(end + 1);
            line.truncate(end);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }
            self.check_size(line.len())?;

            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Ok(Some(line.freeze()));
        }
    }
}

impl Decoder for MessageCodec {
    type Item = Bytes;
    type Error = MessageError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        match self.framing {
            Framing::Eof => {
                self.check_size(src.len())?;
                Ok(None)
            }
            Framing::Lines => self.decode_line(src),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        if let Some(message) = self.decode(src)? {
            return Ok(Some(message));
        }
        self.next_index = 0;

        if src.is_empty() {
            return Ok(None);
        }
        let rest = src.split();
        if self.framing == Framing::Lines && rest.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        trace!(
            size = rest.len(),
            framing = self.framing.name(),
            "message complete at end of stream"
        );
        Ok(Some(rest.freeze()))
    }
}

impl Encoder<Bytes> for MessageCodec {
    type Error = MessageError;

    fn encode(&mut self, payload: Bytes, dst: &mut BytesMut) -> Result<()> {
        self.check_size(payload.len())?;
        match self.framing {
            Framing::Eof => dst.extend_from_slice(&payload),
            Framing::Lines => {
                if payload.contains(&b'\n') {
                    return Err(MessageError::EmbeddedDelimiter);
                }
                dst.reserve(payload.len() + 1);
                dst.put_slice(&payload);
                dst.put_u8(b'\n');
            }
        }
        Ok(())
    }
}
