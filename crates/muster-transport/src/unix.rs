//! Unix-domain-socket transport implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, MAX_FRAME, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A [`Transport`] listening on a Unix domain socket path.
pub struct UnixTransport {
    listener: UnixListener,
    path: PathBuf,
}

impl UnixTransport {
    /// Binds to `path`, removing a stale socket file left behind by an
    /// earlier run.
    pub fn bind(path: &Path) -> Result<Self, TransportError> {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
        let listener =
            UnixListener::bind(path).map_err(TransportError::AcceptFailed)?;
        tracing::info!(path = %path.display(), "transport listening");
        Ok(Self {
            listener,
            path: path.to_path_buf(),
        })
    }

    /// The socket path this transport is bound to.
    pub fn local_path(&self) -> &Path {
        &self.path
    }

    /// Removes the socket file. Called during graceful shutdown.
    pub fn remove_socket_file(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!(error = %e, "could not remove socket file");
        }
    }
}

impl Transport for UnixTransport {
    type Connection = UnixConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, "accepted connection");

        Ok(UnixConnection::from_stream(id, stream))
    }
}

/// A single Unix-socket connection.
///
/// Reader and writer halves are guarded separately so a task blocked in
/// [`recv`](Connection::recv) never stalls a concurrent
/// [`send`](Connection::send) from another task.
pub struct UnixConnection {
    id: ConnectionId,
    reader: Arc<Mutex<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl UnixConnection {
    fn from_stream(id: ConnectionId, stream: UnixStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            id,
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Connects to a server socket at `path` (client side).
    pub async fn connect(path: &Path) -> Result<Self, TransportError> {
        let stream = UnixStream::connect(path)
            .await
            .map_err(TransportError::ConnectFailed)?;
        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        Ok(Self::from_stream(id, stream))
    }
}

impl Connection for UnixConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let mut writer = self.writer.lock().await;
        writer
            .write_all(data)
            .await
            .map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut buf = [0u8; MAX_FRAME];
        let mut reader = self.reader.lock().await;
        let n = reader
            .read(&mut buf)
            .await
            .map_err(TransportError::ReceiveFailed)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(buf[..n].to_vec()))
    }

    async fn close(&self) -> Result<(), Self::Error> {
        let mut writer = self.writer.lock().await;
        writer.shutdown().await.map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
