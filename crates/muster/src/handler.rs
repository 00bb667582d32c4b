//! Per-connection worker: registration, the pre-start wait, and the
//! chat loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at, timeout};

use muster_lobby::{AdmissionEngine, BroadcastRouter, Decision, LobbyId, Ticket};
use muster_protocol::wire;
use muster_transport::{Connection, ConnectionId, UnixConnection};

use crate::MusterError;

/// Deadline for a single outbound chat delivery; a peer slower than
/// this gets its writer task stopped rather than a growing backlog.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Clears the worker's lobby slot when the worker ends, however it
/// ends. `leave` is idempotent, so the normal-path departure running
/// first costs nothing.
struct SlotGuard {
    engine: AdmissionEngine,
    lobby_id: LobbyId,
    conn: ConnectionId,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let engine = self.engine.clone();
        let lobby_id = self.lobby_id;
        let conn = self.conn;
        tokio::spawn(async move {
            engine.leave(lobby_id, conn).await;
        });
    }
}

/// Drives one connection from registration to departure.
///
/// Protocol, in order: one registration frame in; `OK` or the rejection
/// line out; `Please wait...` every `notice_period` until the lobby
/// fills; `START`; then free-form chat until the peer hangs up.
pub(crate) async fn handle_connection(
    conn: UnixConnection,
    engine: AdmissionEngine,
    router: Arc<BroadcastRouter>,
    notice_period: Duration,
) -> Result<(), MusterError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();

    let Some(frame) = conn.recv().await? else {
        tracing::debug!(%conn_id, "closed before registering");
        return Ok(());
    };
    let blob = String::from_utf8_lossy(&frame).into_owned();

    let (peer_tx, peer_rx) = mpsc::unbounded_channel::<String>();
    let ticket = match engine.admit(&blob, conn_id, peer_tx).await {
        Decision::Admitted(ticket) => ticket,
        Decision::Rejected(reason) => {
            tracing::info!(%conn_id, %reason, "registration rejected");
            conn.send(wire::REJECT_LINE.as_bytes()).await?;
            let _ = conn.close().await;
            return Ok(());
        }
    };
    let Ticket {
        lobby_id,
        name,
        mut started,
    } = ticket;

    let _guard = SlotGuard {
        engine: engine.clone(),
        lobby_id,
        conn: conn_id,
    };

    conn.send(wire::OK_LINE.as_bytes()).await?;
    spawn_writer(Arc::clone(&conn), peer_rx, SEND_TIMEOUT);

    // Wait for the lobby to fill. The connection is watched the whole
    // time: a player that hangs up here leaves the lobby without ever
    // seeing START.
    let mut notice = interval_at(Instant::now() + notice_period, notice_period);
    loop {
        tokio::select! {
            changed = async { started.wait_for(|s| *s).await.map(|_| ()) } => {
                if changed.is_err() {
                    // Lobby torn down mid-wait; nothing left to join.
                    return Ok(());
                }
                break;
            }
            _ = notice.tick() => {
                conn.send(wire::WAIT_LINE.as_bytes()).await?;
            }
            read = conn.recv() => {
                match read {
                    Ok(Some(_)) => {
                        // Chat opens at START; anything sooner is dropped.
                        tracing::debug!(%conn_id, "discarding pre-start data");
                    }
                    Ok(None) | Err(_) => {
                        tracing::info!(
                            %conn_id,
                            player = %name,
                            %lobby_id,
                            "left while waiting"
                        );
                        return Ok(());
                    }
                }
            }
        }
    }

    conn.send(wire::START_LINE.as_bytes()).await?;
    tracing::info!(%conn_id, player = %name, %lobby_id, "player is ready");

    loop {
        match conn.recv().await {
            Ok(Some(data)) => {
                let text = String::from_utf8_lossy(&data);
                let text = text.trim_end_matches(['\n', '\r']);
                router.relay_chat(lobby_id, conn_id, text).await;
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "receive failed");
                break;
            }
        }
    }

    if let Some(remaining) = engine.leave(lobby_id, conn_id).await {
        if remaining == 0 {
            tracing::info!(%lobby_id, "all players left, game over");
        }
    }
    Ok(())
}

/// Drains a player's outbound channel onto its connection.
///
/// Runs until the channel closes or a send fails or times out; a stuck
/// peer costs its own writer task, never a lobby's sender.
fn spawn_writer(
    conn: Arc<UnixConnection>,
    mut rx: mpsc::UnboundedReceiver<String>,
    send_timeout: Duration,
) {
    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            match timeout(send_timeout, conn.send(line.as_bytes())).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::debug!(conn_id = %conn.id(), error = %e, "peer send failed");
                    break;
                }
                Err(_) => {
                    tracing::debug!(conn_id = %conn.id(), "peer send timed out");
                    break;
                }
            }
        }
    });
}
