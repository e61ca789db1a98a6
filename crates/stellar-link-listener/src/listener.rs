use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use stellar_link_transport::{sender_socket_path, UnixDomainSocket};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::ListenerConfig;
use crate::connection::{serve_connection, ConnectionSettings, ConnectionSummary};
use crate::error::{ListenerError, Result};
use crate::handler::{ConnectionInfo, MessageHandler};

// Pause after a failed accept so a persistent error (EMFILE) does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Totals for one [`Listener::run`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub connections: usize,
    pub messages: usize,
    /// Connections closed because of a decode, parse or read failure.
    pub failed_connections: usize,
}

impl RunSummary {
    fn record(&mut self, joined: std::result::Result<ConnectionSummary, JoinError>) {
        match joined {
            Ok(summary) => {
                self.messages += summary.messages;
                if summary.failed {
                    self.failed_connections += 1;
                }
            }
            Err(err) => {
                warn!(error = %err, "connection task ended abnormally");
                self.failed_connections += 1;
            }
        }
    }
}

/// Stops a running listener. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    token: CancellationToken,
}

impl ShutdownHandle {
    /// Stop accepting and abandon in-flight connections.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Accepts connections on a Unix domain socket and feeds decoded messages to
/// a [`MessageHandler`].
pub struct Listener {
    socket: UnixDomainSocket,
    config: ListenerConfig,
    shutdown: ShutdownHandle,
}

impl Listener {
    /// Bind `address` and start listening.
    ///
    /// Fails with a bind error when the path is held by a live listener, the
    /// parent directory is missing, or permissions forbid it. Must be called
    /// from within a tokio runtime.
    pub fn start(address: impl AsRef<Path>, config: ListenerConfig) -> Result<Self> {
        let socket = UnixDomainSocket::bind_with_mode(address, config.socket_mode)?;
        Ok(Self {
            socket,
            config,
            shutdown: ShutdownHandle::default(),
        })
    }

    /// Bound socket path.
    pub fn path(&self) -> &Path {
        self.socket.path()
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Accept and serve connections until shut down or the connection limit
    /// of [`ListenMode::Limit`](crate::ListenMode::Limit) is reached.
    ///
    /// Each connection runs in its own task. With a limit, the call returns
    /// after the last accepted connection has been handled; on shutdown,
    /// in-flight connections are aborted.
    pub async fn run<H: MessageHandler>(self, handler: Arc<H>) -> Result<RunSummary> {
        let settings = ConnectionSettings {
            framing: self.config.framing,
            max_message_size: self.config.max_message_size,
            read_timeout: self.config.read_timeout,
        };
        let limit = self.config.mode.limit();
        let token = self.shutdown.token.clone();

        let mut summary = RunSummary::default();
        let mut tasks = JoinSet::new();
        let mut next_id = 1u64;

        info!(
            path = ?self.socket.path(),
            framing = settings.framing.name(),
            mode = ?self.config.mode,
            "listener started"
        );

        loop {
            if limit.is_some_and(|limit| summary.connections >= limit) {
                debug!(connections = summary.connections, "connection limit reached");
                break;
            }

            tokio::select! {
                () = token.cancelled() => {
                    info!(in_flight = tasks.len(), "listener shutting down");
                    tasks.shutdown().await;
                    return Ok(summary);
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    summary.record(joined);
                }
                accepted = self.socket.accept() => {
                    let stream = match accepted {
                        Ok(stream) => stream,
                        Err(err) => {
                            warn!(error = %err, "accept failed");
                            tokio::time::sleep(ACCEPT_BACKOFF).await;
                            continue;
                        }
                    };

                    let info = ConnectionInfo::new(format!("conn-{next_id}"), stream.peer_credentials());
                    next_id += 1;
                    summary.connections += 1;

                    debug!(connection = %info.id, peer = ?info.peer, "connection accepted");
                    let span = info_span!("connection", id = %info.id);
                    tasks.spawn(
                        serve_connection(stream, info, Arc::clone(&handler), settings).instrument(span),
                    );
                }
            }
        }

        while !tasks.is_empty() {
            tokio::select! {
                () = token.cancelled() => {
                    info!(in_flight = tasks.len(), "listener shutting down");
                    tasks.shutdown().await;
                    return Ok(summary);
                }
                Some(joined) = tasks.join_next() => {
                    summary.record(joined);
                }
            }
        }
        info!(
            connections = summary.connections,
            messages = summary.messages,
            "listener finished"
        );
        Ok(summary)
    }

    /// Run on the current tokio runtime in the background.
    pub fn spawn<H: MessageHandler>(self, handler: Arc<H>) -> RunningListener {
        let shutdown = self.shutdown_handle();
        let path = self.path().to_path_buf();
        let task = tokio::spawn(self.run(handler));
        RunningListener {
            path,
            shutdown,
            task,
        }
    }
}

/// A listener running in a background task.
pub struct RunningListener {
    path: std::path::PathBuf,
    shutdown: ShutdownHandle,
    task: JoinHandle<Result<RunSummary>>,
}

impl RunningListener {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Request shutdown and wait for the accept loop to end.
    pub async fn stop(self) -> Result<RunSummary> {
        self.shutdown.shutdown();
        self.join().await
    }

    /// Wait for the accept loop to end on its own.
    pub async fn join(self) -> Result<RunSummary> {
        self.task.await.map_err(ListenerError::Task)?
    }
}

/// Listen for messages addressed to `sender_id`, on
/// `<base_dir>/<sender_id>`, and pass each one to `handler`.
pub fn listen_to<H: MessageHandler>(
    base_dir: impl AsRef<Path>,
    sender_id: &str,
    handler: Arc<H>,
) -> Result<RunningListener> {
    let path = sender_socket_path(base_dir, sender_id)?;
    let listener = Listener::start(path, ListenerConfig::default())?;
    Ok(listener.spawn(handler))
}
