use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::UnixStream;

use crate::error::Result;

/// Credentials of the process on the other end of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerCredentials {
    pub uid: u32,
    pub gid: u32,
    /// Not every platform reports the peer pid.
    pub pid: Option<i32>,
}

/// A connected socket stream. Implements `AsyncRead + AsyncWrite`.
///
/// Returned by [`UnixDomainSocket::accept`](crate::UnixDomainSocket::accept)
/// and [`UnixDomainSocket::connect`](crate::UnixDomainSocket::connect).
pub struct IpcStream {
    inner: UnixStream,
}

impl IpcStream {
    pub(crate) fn from_unix(inner: UnixStream) -> Self {
        Self { inner }
    }

    /// Credentials of the connected peer, or `None` if the platform refuses.
    pub fn peer_credentials(&self) -> Option<PeerCredentials> {
        self.inner.peer_cred().ok().map(|cred| PeerCredentials {
            uid: cred.uid(),
            gid: cred.gid(),
            pid: cred.pid(),
        })
    }

    /// Half-close: shut down the write side, leaving the read side open.
    pub async fn shutdown_write(&mut self) -> Result<()> {
        self.inner.shutdown().await.map_err(Into::into)
    }

    /// Consume the wrapper and return the tokio stream.
    pub fn into_inner(self) -> UnixStream {
        self.inner
    }
}

impl From<UnixStream> for IpcStream {
    fn from(inner: UnixStream) -> Self {
        Self::from_unix(inner)
    }
}

impl AsyncRead for IpcStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for IpcStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

impl std::fmt::Debug for IpcStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpcStream").field("type", &"unix").finish()
    }
}
