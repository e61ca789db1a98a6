//! Unix domain socket transport for stellar-link.
//!
//! This is the lowest layer of stellar-link. Everything else builds on top of
//! the [`UnixDomainSocket`] listener and the [`IpcStream`] it hands out.

pub mod endpoint;
pub mod error;
pub mod stream;
pub mod uds;

pub use endpoint::{sender_socket_path, DEFAULT_SENDER_DIR, DEFAULT_SOCKET_PATH};
pub use error::{Result, TransportError};
pub use stream::{IpcStream, PeerCredentials};
pub use uds::{lock_path, UnixDomainSocket};
