use std::num::NonZeroUsize;
use std::time::Duration;

use stellar_link_message::{Framing, DEFAULT_MAX_MESSAGE_SIZE};
use stellar_link_transport::UnixDomainSocket;

/// How many connections a listener serves before it stops on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListenMode {
    /// Keep accepting until shut down.
    #[default]
    Persistent,
    /// Accept this many connections, finish handling them, then return.
    Limit(NonZeroUsize),
}

impl ListenMode {
    /// Single-shot: one connection.
    pub fn once() -> Self {
        Self::Limit(NonZeroUsize::MIN)
    }

    pub fn limit(self) -> Option<usize> {
        match self {
            Self::Persistent => None,
            Self::Limit(n) => Some(n.get()),
        }
    }
}

/// Configuration for a [`Listener`](crate::Listener).
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Permission bits applied to the socket file. Default: `0o600`.
    pub socket_mode: u32,
    /// Maximum size of one message in bytes. Default: 1 MiB.
    pub max_message_size: usize,
    /// Longest wait for the next complete message on a connection.
    pub read_timeout: Option<Duration>,
    /// Message boundaries on each connection.
    pub framing: Framing,
    pub mode: ListenMode,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            socket_mode: UnixDomainSocket::DEFAULT_SOCKET_MODE,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            read_timeout: None,
            framing: Framing::default(),
            mode: ListenMode::default(),
        }
    }
}
