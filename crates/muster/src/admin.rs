//! Operator surface: signal-driven status dumps and graceful shutdown.

use tokio::signal::unix::{SignalKind, signal};

use muster_lobby::{AdmissionEngine, LobbySnapshot};
use muster_protocol::ResourceKind;

use crate::ShutdownHandle;

/// Spawns the operator listeners.
///
/// `SIGUSR1` prints a status dump of every lobby to stdout. `SIGINT`
/// closes admissions and stops the accept loop; seated players keep
/// chatting until they hang up.
pub fn spawn_operator_tasks(engine: AdmissionEngine, shutdown: ShutdownHandle) {
    tokio::spawn(async move {
        let mut dump = match signal(SignalKind::user_defined1()) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(error = %e, "cannot install SIGUSR1 handler");
                return;
            }
        };
        while dump.recv().await.is_some() {
            let lobbies = engine.snapshot().await;
            println!("{}", render_status(&lobbies));
        }
    });

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("interrupt received, closing server");
                shutdown.shutdown().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot install interrupt handler");
            }
        }
    });
}

/// Renders the operator status dump: every lobby ever created, its
/// state, its occupied slots, and its live inventory counters.
pub fn render_status(lobbies: &[LobbySnapshot]) -> String {
    let mut out = String::new();
    for snap in lobbies {
        out.push_str(&format!(
            "~~~~~ LOBBY {} [{}] ~~~~~\n\n",
            snap.id.0, snap.state
        ));

        out.push_str("Online players :\n");
        if snap.players.is_empty() {
            out.push_str("No online players..\n");
        } else {
            for name in &snap.players {
                out.push_str(name);
                out.push('\n');
            }
        }

        out.push_str(&format!("\nInventory [ {} ] :\n", snap.id.0));
        for kind in ResourceKind::ALL {
            out.push_str(&format!(
                "{} : {}\n",
                capitalize(kind.name()),
                snap.inventory.get(kind)
            ));
        }
        out.push('\n');
    }
    out.push_str("~~~ That's all! ~~~");
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
