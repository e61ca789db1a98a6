//! JSON messages and their framing on a byte stream.
//!
//! A message arrives as bytes, is decoded as UTF-8 text, parsed as JSON and
//! must be an object. Its `current_position` field is optional.

pub mod codec;
pub mod error;
pub mod message;

pub use codec::{Framing, MessageCodec, DEFAULT_MAX_MESSAGE_SIZE};
pub use error::{preview, MessageError, Result};
pub use message::{Message, Position, CURRENT_POSITION};
