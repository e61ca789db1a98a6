use std::time::Duration;

use bytes::Bytes;

/// Longest slice of offending input quoted in diagnostics.
pub const PREVIEW_LIMIT: usize = 256;

/// Errors that can occur while turning received bytes into a message.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The bytes are not valid UTF-8.
    #[error("message is not valid UTF-8: {source}")]
    Decode {
        source: std::str::Utf8Error,
        raw: Bytes,
    },

    /// The text is not well-formed JSON.
    #[error("message is not valid JSON: {source}")]
    Parse {
        source: serde_json::Error,
        raw: Bytes,
    },

    /// The JSON value at the top level is not an object.
    #[error("message must be a JSON object, got {kind}")]
    NotAnObject { kind: &'static str, raw: Bytes },

    /// The message exceeds the configured maximum size.
    #[error("message too large ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    /// A line-framed payload contains the line delimiter.
    #[error("payload contains a newline and cannot be line framed")]
    EmbeddedDelimiter,

    /// No complete message arrived before the read deadline.
    #[error("no complete message within {0:?}")]
    Timeout(Duration),

    /// An I/O error occurred while reading or writing messages.
    #[error("message I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MessageError {
    /// The offending input, for failures that carry it.
    pub fn raw(&self) -> Option<&[u8]> {
        match self {
            Self::Decode { raw, .. } | Self::Parse { raw, .. } | Self::NotAnObject { raw, .. } => {
                Some(raw.as_ref())
            }
            _ => None,
        }
    }

    /// True for failures caused by the content of a message rather than the
    /// connection carrying it.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::Parse { .. } | Self::NotAnObject { .. }
        )
    }
}

/// Lossy, length-capped rendering of raw bytes for log lines.
pub fn preview(raw: &[u8]) -> String {
    if raw.len() <= PREVIEW_LIMIT {
        return String::from_utf8_lossy(raw).into_owned();
    }
    format!(
        "{}… ({} bytes total)",
        String::from_utf8_lossy(&raw[..PREVIEW_LIMIT]),
        raw.len()
    )
}

pub type Result<T> = std::result::Result<T, MessageError>;
