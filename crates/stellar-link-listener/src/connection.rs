use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use stellar_link_message::{preview, Framing, Message, MessageCodec, MessageError};
use stellar_link_transport::IpcStream;
use tokio_util::codec::FramedRead;
use tracing::{debug, warn};

use crate::handler::{ConnectionInfo, MessageHandler};

/// Per-connection settings copied out of the listener config.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConnectionSettings {
    pub framing: Framing,
    pub max_message_size: usize,
    pub read_timeout: Option<Duration>,
}

/// What happened on one connection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSummary {
    /// Messages decoded and handed to the handler.
    pub messages: usize,
    /// The connection was closed because of an error.
    pub failed: bool,
}

/// Read, decode and report every message on `stream`, then half-close it.
///
/// Owns its buffer and state; nothing is shared with other connections
/// except the handler. The write side is shut down only after processing
/// has finished, so a client that reads until EOF knows the listener is done.
pub(crate) async fn serve_connection<H: MessageHandler>(
    mut stream: IpcStream,
    info: ConnectionInfo,
    handler: Arc<H>,
    settings: ConnectionSettings,
) -> ConnectionSummary {
    handler.on_connect(&info);

    let mut summary = ConnectionSummary::default();
    let codec = MessageCodec::with_max_size(settings.framing, settings.max_message_size);
    let mut frames = FramedRead::new(&mut stream, codec);

    loop {
        let Some(next) = next_payload(&mut frames, settings.read_timeout).await else {
            break;
        };

        let result = next.and_then(|payload: Bytes| Message::decode(&payload));
        match result {
            Ok(message) => {
                debug!(
                    connection = %info.id,
                    fields = message.len(),
                    missing_position = message.current_position().is_missing(),
                    "decoded message"
                );
                handler.on_message(&info, message);
                summary.messages += 1;
            }
            Err(err) => {
                report_failure(&info, &err);
                handler.on_error(&info, &err);
                summary.failed = true;
                break;
            }
        }
    }
    drop(frames);

    if summary.messages == 0 && !summary.failed {
        debug!(connection = %info.id, "connection closed without a message");
    }

    if let Err(err) = stream.shutdown_write().await {
        debug!(connection = %info.id, error = %err, "half-close failed");
    }

    summary
}

async fn next_payload(
    frames: &mut FramedRead<&mut IpcStream, MessageCodec>,
    read_timeout: Option<Duration>,
) -> Option<Result<Bytes, MessageError>> {
    match read_timeout {
        Some(limit) => match tokio::time::timeout(limit, frames.next()).await {
            Ok(next) => next,
            Err(_) => Some(Err(MessageError::Timeout(limit))),
        },
        None => frames.next().await,
    }
}

fn report_failure(info: &ConnectionInfo, err: &MessageError) {
    match err.raw() {
        Some(raw) => warn!(
            connection = %info.id,
            error = %err,
            raw = %preview(raw),
            "dropping connection after malformed message"
        ),
        None => warn!(
            connection = %info.id,
            error = %err,
            "dropping connection after read failure"
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixStream;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl MessageHandler for Recorder {
        fn on_connect(&self, conn: &ConnectionInfo) {
            self.events.lock().unwrap().push(format!("connect {}", conn.id));
        }

        fn on_message(&self, _conn: &ConnectionInfo, message: Message) {
            self.events
                .lock()
                .unwrap()
                .push(format!("position {}", message.current_position()));
        }

        fn on_error(&self, _conn: &ConnectionInfo, error: &MessageError) {
            let kind = match error {
                MessageError::Decode { .. } => "decode",
                MessageError::Parse { .. } => "parse",
                MessageError::NotAnObject { .. } => "not-object",
                MessageError::TooLarge { .. } => "too-large",
                MessageError::Timeout(_) => "timeout",
                _ => "other",
            };
            self.events.lock().unwrap().push(format!("error {kind}"));
        }
    }

    fn settings(framing: Framing) -> ConnectionSettings {
        ConnectionSettings {
            framing,
            max_message_size: 1024,
            read_timeout: None,
        }
    }

    fn pair() -> (IpcStream, UnixStream) {
        let (server, client) = UnixStream::pair().unwrap();
        (IpcStream::from(server), client)
    }

    async fn run_with(
        framing: Framing,
        bytes: &[u8],
    ) -> (ConnectionSummary, Vec<String>, Vec<u8>) {
        run_with_settings(settings(framing), bytes).await
    }

    async fn run_with_settings(
        settings: ConnectionSettings,
        bytes: &[u8],
    ) -> (ConnectionSummary, Vec<String>, Vec<u8>) {
        let (server, mut client) = pair();
        let recorder = Arc::new(Recorder::default());
        let task = tokio::spawn(serve_connection(
            server,
            ConnectionInfo::new("conn-1", None),
            Arc::clone(&recorder),
            settings,
        ));

        client.write_all(bytes).await.unwrap();
        client.shutdown().await.unwrap();
        // The listener may reset the socket when it drops unread input.
        let mut reply = Vec::new();
        let _ = client.read_to_end(&mut reply).await;

        let summary = task.await.unwrap();
        (summary, recorder.events(), reply)
    }

    #[tokio::test]
    async fn reports_single_message_then_half_closes() {
        let (summary, events, reply) =
            run_with(Framing::Eof, br#"{"current_position": 42}"#).await;

        assert_eq!(summary, ConnectionSummary { messages: 1, failed: false });
        assert_eq!(events, ["connect conn-1", "position 42"]);
        assert!(reply.is_empty());
    }

    #[tokio::test]
    async fn message_split_across_writes_is_reassembled() {
        let (server, mut client) = pair();
        let recorder = Arc::new(Recorder::default());
        let task = tokio::spawn(serve_connection(
            server,
            ConnectionInfo::new("conn-1", None),
            Arc::clone(&recorder),
            settings(Framing::Eof),
        ));

        client.write_all(br#"{"current_"#).await.unwrap();
        tokio::task::yield_now().await;
        client.write_all(br#"position": "dock"}"#).await.unwrap();
        client.shutdown().await.unwrap();

        let summary = task.await.unwrap();
        assert_eq!(summary.messages, 1);
        assert_eq!(recorder.events(), ["connect conn-1", "position \"dock\""]);
    }

    #[tokio::test]
    async fn missing_position_is_not_fatal() {
        let (summary, events, _) = run_with(Framing::Eof, br#"{"foo": "bar"}"#).await;
        assert!(!summary.failed);
        assert_eq!(events, ["connect conn-1", "position undefined"]);
    }

    #[tokio::test]
    async fn invalid_utf8_closes_connection() {
        let (summary, events, _) = run_with(Framing::Eof, &[0xFF, 0xFE, b'{', b'}']).await;
        assert!(summary.failed);
        assert_eq!(events, ["connect conn-1", "error decode"]);
    }

    #[tokio::test]
    async fn malformed_json_closes_connection() {
        let (summary, events, _) = run_with(Framing::Eof, b"{not json").await;
        assert!(summary.failed);
        assert_eq!(events, ["connect conn-1", "error parse"]);
    }

    #[tokio::test]
    async fn empty_connection_reports_nothing() {
        let (summary, events, _) = run_with(Framing::Eof, b"").await;
        assert_eq!(summary, ConnectionSummary::default());
        assert_eq!(events, ["connect conn-1"]);
    }

    #[tokio::test]
    async fn lines_framing_handles_many_messages() {
        let wire = b"{\"current_position\":1}\n{\"current_position\":2}\n{\"current_position\":3}";
        let (summary, events, _) = run_with(Framing::Lines, wire).await;
        assert_eq!(summary.messages, 3);
        assert_eq!(
            events,
            ["connect conn-1", "position 1", "position 2", "position 3"]
        );
    }

    #[tokio::test]
    async fn lines_framing_stops_at_first_bad_message() {
        let wire = b"{\"current_position\":1}\n[1]\n{\"current_position\":3}\n";
        let (summary, events, _) = run_with(Framing::Lines, wire).await;
        assert_eq!(summary, ConnectionSummary { messages: 1, failed: true });
        assert_eq!(events, ["connect conn-1", "position 1", "error not-object"]);
    }

    #[tokio::test]
    async fn oversized_message_is_rejected() {
        let big = format!("{{\"current_position\":\"{}\"}}", "x".repeat(2048));
        let (summary, events, _) = run_with(Framing::Eof, big.as_bytes()).await;
        assert!(summary.failed);
        assert_eq!(events, ["connect conn-1", "error too-large"]);
    }

    #[tokio::test]
    async fn silent_client_hits_read_timeout() {
        let (server, _client) = pair();
        let recorder = Arc::new(Recorder::default());
        let summary = serve_connection(
            server,
            ConnectionInfo::new("conn-1", None),
            Arc::clone(&recorder),
            ConnectionSettings {
                read_timeout: Some(Duration::from_millis(20)),
                ..settings(Framing::Eof)
            },
        )
        .await;

        assert!(summary.failed);
        assert_eq!(recorder.events(), ["connect conn-1", "error timeout"]);
    }
}
