//! Local IPC for robot diagnostics messages.
//!
//! stellar-link accepts JSON messages over a Unix domain socket and hands them
//! to application logic; the bundled CLI prints each message and its
//! `current_position`.
//!
//! # Crate Structure
//!
//! - [`transport`]: Unix domain socket bind/accept/connect
//! - [`message`]: Message decoding and stream framing
//! - [`listener`]: Accept loop, per-connection handling, sender client

/// Re-export transport types.
pub mod transport {
    pub use stellar_link_transport::*;
}

/// Re-export message types.
pub mod message {
    pub use stellar_link_message::*;
}

/// Re-export listener types.
pub mod listener {
    pub use stellar_link_listener::*;
}
