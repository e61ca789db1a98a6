//! Well-known socket addresses.

use std::path::{Path, PathBuf};

use crate::error::{Result, TransportError};

/// Address used when none is configured.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/unixSocket";

/// Directory holding one socket per sender, relative to the working directory.
pub const DEFAULT_SENDER_DIR: &str = "tmp/stellar";

/// Socket path a listener for `sender_id` binds under `base_dir`.
///
/// The id becomes a single file name, so path separators and the `.`/`..`
/// components are rejected.
pub fn sender_socket_path(base_dir: impl AsRef<Path>, sender_id: &str) -> Result<PathBuf> {
    let valid = !sender_id.is_empty()
        && sender_id != "."
        && sender_id != ".."
        && !sender_id.contains('/')
        && !sender_id.contains('\0');
    if !valid {
        return Err(TransportError::InvalidSenderId(sender_id.to_string()));
    }
    Ok(base_dir.as_ref().join(sender_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_sender_under_base() {
        let path = sender_socket_path(DEFAULT_SENDER_DIR, "supervisor").unwrap();
        assert_eq!(path, PathBuf::from("tmp/stellar/supervisor"));
    }

    #[test]
    fn rejects_ids_that_escape_the_directory() {
        for id in ["", ".", "..", "a/b", "../up", "nul\0byte"] {
            assert!(
                matches!(
                    sender_socket_path("/tmp", id),
                    Err(TransportError::InvalidSenderId(_))
                ),
                "id {id:?} should be rejected"
            );
        }
    }
}
