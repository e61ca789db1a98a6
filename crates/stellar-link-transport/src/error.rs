use std::io::ErrorKind;
use std::path::PathBuf;

/// Errors that can occur in socket transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// A sender id cannot be turned into a socket file name.
    #[error("invalid sender id {0:?}")]
    InvalidSenderId(String),
}

impl TransportError {
    /// True when a bind failed because a live listener already owns the path.
    pub fn is_addr_in_use(&self) -> bool {
        matches!(self, Self::Bind { source, .. } if source.kind() == ErrorKind::AddrInUse)
    }

    /// True when a connect failed because nothing is listening at the path.
    pub fn is_not_listening(&self) -> bool {
        matches!(
            self,
            Self::Connect { source, .. }
                if matches!(source.kind(), ErrorKind::NotFound | ErrorKind::ConnectionRefused)
        )
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_in_use_only_matches_bind() {
        let bind = TransportError::Bind {
            path: PathBuf::from("/tmp/x.sock"),
            source: std::io::Error::from(ErrorKind::AddrInUse),
        };
        let connect = TransportError::Connect {
            path: PathBuf::from("/tmp/x.sock"),
            source: std::io::Error::from(ErrorKind::AddrInUse),
        };
        assert!(bind.is_addr_in_use());
        assert!(!connect.is_addr_in_use());
    }

    #[test]
    fn not_listening_covers_missing_and_refused() {
        for kind in [ErrorKind::NotFound, ErrorKind::ConnectionRefused] {
            let err = TransportError::Connect {
                path: PathBuf::from("/tmp/x.sock"),
                source: std::io::Error::from(kind),
            };
            assert!(err.is_not_listening());
        }

        let denied = TransportError::Connect {
            path: PathBuf::from("/tmp/x.sock"),
            source: std::io::Error::from(ErrorKind::PermissionDenied),
        };
        assert!(!denied.is_not_listening());
    }
}
