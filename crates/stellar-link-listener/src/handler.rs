use std::sync::Arc;

use stellar_link_message::{Message, MessageError};
use stellar_link_transport::PeerCredentials;

/// Identity of one accepted connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Listener-assigned id, `conn-1`, `conn-2`, ...
    pub id: String,
    pub peer: Option<PeerCredentials>,
}

impl ConnectionInfo {
    pub fn new(id: impl Into<String>, peer: Option<PeerCredentials>) -> Self {
        Self {
            id: id.into(),
            peer,
        }
    }
}

/// Application logic fed by a [`Listener`](crate::Listener).
///
/// One handler instance is shared by every connection task, so calls for
/// different connections may interleave. Each message is handed over by
/// value and belongs to that single call.
pub trait MessageHandler: Send + Sync + 'static {
    /// A connection was accepted.
    fn on_connect(&self, _conn: &ConnectionInfo) {}

    /// A complete message was decoded.
    fn on_message(&self, conn: &ConnectionInfo, message: Message);

    /// The connection is being closed because of `error`.
    fn on_error(&self, _conn: &ConnectionInfo, _error: &MessageError) {}
}

impl<H: MessageHandler> MessageHandler for Arc<H> {
    fn on_connect(&self, conn: &ConnectionInfo) {
        (**self).on_connect(conn);
    }

    fn on_message(&self, conn: &ConnectionInfo, message: Message) {
        (**self).on_message(conn, message);
    }

    fn on_error(&self, conn: &ConnectionInfo, error: &MessageError) {
        (**self).on_error(conn, error);
    }
}

/// Adapts a plain callback into a [`MessageHandler`].
pub struct FnHandler<F>(pub F);

impl<F> MessageHandler for FnHandler<F>
where
    F: Fn(Message) + Send + Sync + 'static,
{
    fn on_message(&self, _conn: &ConnectionInfo, message: Message) {
        (self.0)(message);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn fn_handler_forwards_messages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler = FnHandler(move |message: Message| {
            sink.lock().unwrap().push(message.to_string());
        });

        let conn = ConnectionInfo::new("conn-1", None);
        handler.on_connect(&conn);
        handler.on_message(&conn, Message::decode(br#"{"a":1}"#).unwrap());

        assert_eq!(seen.lock().unwrap().as_slice(), [r#"{"a":1}"#.to_string()]);
    }
}
