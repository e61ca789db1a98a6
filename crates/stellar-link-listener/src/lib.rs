//! Local IPC listener for structured messages.
//!
//! A [`Listener`] binds a Unix domain socket, gives every accepted connection
//! its own task and buffer, decodes the JSON messages it receives and passes
//! them to a [`MessageHandler`]. Malformed input closes only the connection
//! that sent it. [`send_message`] is the matching client side.

pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod listener;
pub mod reporter;
pub mod sender;

pub use config::{ListenMode, ListenerConfig};
pub use connection::ConnectionSummary;
pub use error::{ListenerError, Result};
pub use handler::{ConnectionInfo, FnHandler, MessageHandler};
pub use listener::{listen_to, Listener, RunSummary, RunningListener, ShutdownHandle};
pub use reporter::{position_line, PositionReporter, CONNECTION_NOTICE};
pub use sender::{send_message, send_payload};
