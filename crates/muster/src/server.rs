//! Server assembly: binds the transport, owns the accept loop, and
//! wires each accepted connection to the admission engine and the
//! broadcast router.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use muster_lobby::{AdmissionEngine, BroadcastRouter, DeliveryMode, LobbyConfig};
use muster_protocol::Inventory;
use muster_transport::{Transport, UnixTransport};

use crate::MusterError;
use crate::handler::handle_connection;

/// How often a waiting player is reminded the lobby has not started.
pub const WAIT_NOTICE_PERIOD: Duration = Duration::from_secs(5);

/// Everything needed to bring a server up.
pub struct ServerConfig {
    /// Filesystem path of the listening socket.
    pub socket: PathBuf,
    /// Lobby shape: capacity, per-player quota, inventory template.
    pub lobby: LobbyConfig,
    /// Chat delivery backend.
    pub delivery: DeliveryMode,
    /// Interval between `Please wait...` notices while a lobby fills.
    /// [`WAIT_NOTICE_PERIOD`] outside tests.
    pub wait_notice_period: Duration,
}

/// Reads and parses an inventory template file.
///
/// The file format is one `<resource> <amount>` pair per line; blank
/// lines are skipped and any unknown resource or bad amount is fatal.
pub fn load_inventory_file(path: &Path) -> Result<Inventory, MusterError> {
    let text = std::fs::read_to_string(path)?;
    Ok(Inventory::parse(&text)?)
}

/// Handle for stopping a running server from another task.
///
/// Shutdown is graceful: admissions close first so no registration
/// slips in half-applied, then the accept loop is woken and exits.
/// Connections already seated keep running until they hang up.
#[derive(Clone)]
pub struct ShutdownHandle {
    engine: AdmissionEngine,
    notify: Arc<Notify>,
}

impl ShutdownHandle {
    /// Closes admissions, then stops the accept loop.
    pub async fn shutdown(&self) {
        self.engine.close().await;
        self.notify.notify_one();
    }
}

/// The assembled server: transport, engine, router.
pub struct MusterServer {
    transport: UnixTransport,
    engine: AdmissionEngine,
    router: Arc<BroadcastRouter>,
    shutdown: Arc<Notify>,
    notice_period: Duration,
}

impl MusterServer {
    /// Validates the lobby configuration and binds the socket.
    ///
    /// Must run inside a tokio runtime: the socket registers with the
    /// reactor and the relay backend spawns its coordinator task.
    pub fn bind(config: ServerConfig) -> Result<Self, MusterError> {
        config.lobby.validate()?;
        let transport = UnixTransport::bind(&config.socket)?;
        let engine = AdmissionEngine::new(config.lobby);
        let router = Arc::new(BroadcastRouter::new(config.delivery, engine.directory()));
        Ok(Self {
            transport,
            engine,
            router,
            shutdown: Arc::new(Notify::new()),
            notice_period: config.wait_notice_period,
        })
    }

    /// The socket path the server is listening on.
    pub fn local_path(&self) -> &Path {
        self.transport.local_path()
    }

    /// A clone of the admission engine, for operator tasks and tests.
    pub fn engine(&self) -> AdmissionEngine {
        self.engine.clone()
    }

    /// A handle that stops this server when triggered.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            engine: self.engine.clone(),
            notify: Arc::clone(&self.shutdown),
        }
    }

    /// Runs the accept loop until the shutdown handle fires.
    ///
    /// Each accepted connection gets its own task; a failed accept is
    /// logged and the loop keeps serving. On exit the socket file is
    /// removed so the next run can bind cleanly.
    pub async fn run(mut self) -> Result<(), MusterError> {
        tracing::info!(
            socket = %self.transport.local_path().display(),
            "server running"
        );
        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let engine = self.engine.clone();
                        let router = Arc::clone(&self.router);
                        let notice_period = self.notice_period;
                        tokio::spawn(async move {
                            if let Err(e) =
                                handle_connection(conn, engine, router, notice_period).await
                            {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                _ = self.shutdown.notified() => break,
            }
        }
        self.transport.remove_socket_file();
        tracing::info!("server stopped");
        Ok(())
    }
}
