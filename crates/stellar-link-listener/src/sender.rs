use std::path::Path;

use bytes::Bytes;
use futures_util::SinkExt;
use stellar_link_message::{Framing, Message, MessageCodec};
use stellar_link_transport::UnixDomainSocket;
use tokio_util::codec::FramedWrite;
use tracing::debug;

use crate::error::Result;

/// Send one message to whoever is listening at `address`.
///
/// Returns `Ok(false)` when nobody is listening (no socket file, or nothing
/// accepting behind it) and `Ok(true)` once the message is written and the
/// write side is closed.
pub async fn send_message(
    address: impl AsRef<Path>,
    message: &Message,
    framing: Framing,
) -> Result<bool> {
    send_payload(address, message.to_bytes()?, framing).await
}

/// Send pre-encoded bytes in the given framing.
pub async fn send_payload(
    address: impl AsRef<Path>,
    payload: Bytes,
    framing: Framing,
) -> Result<bool> {
    let address = address.as_ref();
    let mut stream = match UnixDomainSocket::connect(address).await {
        Ok(stream) => stream,
        Err(err) if err.is_not_listening() => {
            debug!(path = ?address, "nobody is listening");
            return Ok(false);
        }
        Err(err) => return Err(err.into()),
    };

    let size = payload.len();
    let mut frames = FramedWrite::new(&mut stream, MessageCodec::new(framing));
    frames.send(payload).await?;
    drop(frames);
    stream.shutdown_write().await?;

    debug!(path = ?address, size, framing = framing.name(), "message sent");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tokio::io::AsyncReadExt;

    use super::*;

    fn make_dir(tag: &str) -> PathBuf {
        let dir = PathBuf::from(format!(
            "/tmp/stlk-send-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    #[tokio::test]
    async fn returns_false_without_socket_file() {
        let dir = make_dir("missing");
        let message = Message::decode(br#"{"current_position": 1}"#).unwrap();
        let sent = send_message(dir.join("nobody.sock"), &message, Framing::Eof)
            .await
            .unwrap();
        assert!(!sent);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn returns_false_for_stale_socket() {
        let dir = make_dir("stale");
        let path = dir.join("stale.sock");
        drop(UnixDomainSocket::bind(&path).unwrap());

        let message = Message::decode(b"{}").unwrap();
        assert!(!send_message(&path, &message, Framing::Eof).await.unwrap());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn writes_compact_json_then_half_closes() {
        let dir = make_dir("write");
        let path = dir.join("send.sock");
        let listener = UnixDomainSocket::bind(&path).unwrap();

        let server = tokio::spawn(async move {
            let mut stream = listener.accept().await.unwrap();
            let mut received = Vec::new();
            stream.read_to_end(&mut received).await.unwrap();
            received
        });

        let message =
            Message::decode(br#"{"current_position": [0.0, 0.1, 0.3], "speed": "lighting-speed"}"#)
                .unwrap();
        assert!(send_message(&path, &message, Framing::Lines).await.unwrap());

        let received = server.await.unwrap();
        assert_eq!(
            received,
            b"{\"current_position\":[0.0,0.1,0.3],\"speed\":\"lighting-speed\"}\n"
        );
        let _ = std::fs::remove_dir_all(&dir);
    }
}
