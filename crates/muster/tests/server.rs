//! End-to-end tests driving a real server over a Unix socket with raw
//! stream clients.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use muster::{
    MusterServer, ServerConfig, ShutdownHandle, WAIT_NOTICE_PERIOD, load_inventory_file,
};
use muster_lobby::{AdmissionEngine, DeliveryMode, LobbyConfig, LobbyId, LobbyState};

struct TestServer {
    _dir: tempfile::TempDir,
    path: PathBuf,
    engine: AdmissionEngine,
    shutdown: ShutdownHandle,
    task: JoinHandle<Result<(), muster::MusterError>>,
}

async fn start_server(capacity: usize, quota: u64, template: &str) -> TestServer {
    start_server_with(
        capacity,
        quota,
        template,
        DeliveryMode::Direct,
        WAIT_NOTICE_PERIOD,
    )
    .await
}

async fn start_server_with(
    capacity: usize,
    quota: u64,
    template: &str,
    delivery: DeliveryMode,
    wait_notice_period: Duration,
) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let template_path = dir.path().join("inventory.txt");
    std::fs::write(&template_path, template).unwrap();

    let server = MusterServer::bind(ServerConfig {
        socket: dir.path().join("server"),
        lobby: LobbyConfig {
            capacity,
            quota,
            template: load_inventory_file(&template_path).unwrap(),
        },
        delivery,
        wait_notice_period,
    })
    .unwrap();

    let path = server.local_path().to_path_buf();
    let engine = server.engine();
    let shutdown = server.shutdown_handle();
    let task = tokio::spawn(server.run());
    TestServer {
        _dir: dir,
        path,
        engine,
        shutdown,
        task,
    }
}

struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    async fn register(path: &Path, blob: &str) -> Self {
        let stream = UnixStream::connect(path).await.unwrap();
        let (read, write) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(read),
            writer: write,
        };
        client.send(blob).await;
        client
    }

    async fn send(&mut self, text: &str) {
        self.writer.write_all(text.as_bytes()).await.unwrap();
    }

    /// Reads one line; empty string means the server closed the stream.
    async fn read_line(&mut self) -> String {
        let mut line = String::new();
        timeout(Duration::from_secs(5), self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for a line")
            .unwrap();
        line
    }

    /// Reads lines until something other than the periodic wait notice
    /// arrives.
    async fn read_skipping_wait(&mut self) -> String {
        loop {
            let line = self.read_line().await;
            if line != "Please wait...\n" {
                return line;
            }
        }
    }
}

#[tokio::test]
async fn test_admission_tokens_end_to_end() {
    let server = start_server(2, 10, "gold 5\n").await;

    let mut x = TestClient::register(&server.path, "X\ngold\t3\n").await;
    assert_eq!(x.read_line().await, "OK\n");

    // The open lobby has 2 gold left; this request cannot be covered.
    let mut y = TestClient::register(&server.path, "Y\ngold\t3\n").await;
    assert_eq!(y.read_line().await, "Try next time..\n");

    let mut z = TestClient::register(&server.path, "Z\ngold\t2\n").await;
    assert_eq!(z.read_line().await, "OK\n");

    // The lobby filled; both seated players get the start signal.
    assert_eq!(x.read_skipping_wait().await, "START\n");
    assert_eq!(z.read_skipping_wait().await, "START\n");
}

#[tokio::test]
async fn test_quota_exceeded_rejected() {
    let server = start_server(2, 3, "gold 100\narmor 100\n").await;

    let mut greedy = TestClient::register(&server.path, "G\ngold\t2\narmor\t2\n").await;
    assert_eq!(greedy.read_line().await, "Try next time..\n");
    // The server closes rejected connections.
    assert_eq!(greedy.read_line().await, "");
}

#[tokio::test]
async fn test_chat_relayed_between_lobby_peers() {
    let server = start_server(2, 10, "gold 5\n").await;

    let mut x = TestClient::register(&server.path, "X\ngold\t1\n").await;
    assert_eq!(x.read_line().await, "OK\n");
    let mut z = TestClient::register(&server.path, "Z\ngold\t1\n").await;
    assert_eq!(z.read_line().await, "OK\n");
    assert_eq!(x.read_skipping_wait().await, "START\n");
    assert_eq!(z.read_skipping_wait().await, "START\n");

    x.send("hello\n").await;
    assert_eq!(z.read_line().await, "X : hello\n");

    z.send("hi there\n").await;
    assert_eq!(x.read_line().await, "Z : hi there\n");
}

#[tokio::test]
async fn test_chat_relayed_over_relay_backend() {
    let server = start_server_with(
        2,
        10,
        "gold 5\n",
        DeliveryMode::Relay,
        WAIT_NOTICE_PERIOD,
    )
    .await;

    let mut x = TestClient::register(&server.path, "X\ngold\t1\n").await;
    assert_eq!(x.read_line().await, "OK\n");
    let mut z = TestClient::register(&server.path, "Z\ngold\t1\n").await;
    assert_eq!(z.read_line().await, "OK\n");
    assert_eq!(x.read_skipping_wait().await, "START\n");
    assert_eq!(z.read_skipping_wait().await, "START\n");

    x.send("first\n").await;
    x.send("second\n").await;
    assert_eq!(z.read_line().await, "X : first\n");
    assert_eq!(z.read_line().await, "X : second\n");
}

#[tokio::test]
async fn test_waiting_player_gets_periodic_notice_until_start() {
    // A short notice period makes the wait phase observable.
    let server = start_server_with(
        2,
        10,
        "gold 5\n",
        DeliveryMode::Direct,
        Duration::from_millis(100),
    )
    .await;

    let mut x = TestClient::register(&server.path, "X\ngold\t1\n").await;
    assert_eq!(x.read_line().await, "OK\n");
    assert_eq!(x.read_line().await, "Please wait...\n");
    assert_eq!(x.read_line().await, "Please wait...\n");

    let mut z = TestClient::register(&server.path, "Z\ngold\t1\n").await;
    assert_eq!(z.read_line().await, "OK\n");
    assert_eq!(x.read_skipping_wait().await, "START\n");
    assert_eq!(z.read_skipping_wait().await, "START\n");

    // Notices stop at START: after several quiet periods, the next
    // line X sees is chat, never another notice.
    tokio::time::sleep(Duration::from_millis(400)).await;
    z.send("hi\n").await;
    assert_eq!(x.read_line().await, "Z : hi\n");
}

#[tokio::test]
async fn test_departure_clears_slot_without_refund() {
    let server = start_server(2, 10, "gold 5\n").await;

    let mut x = TestClient::register(&server.path, "X\ngold\t3\n").await;
    assert_eq!(x.read_line().await, "OK\n");
    let mut z = TestClient::register(&server.path, "Z\ngold\t2\n").await;
    assert_eq!(z.read_line().await, "OK\n");
    assert_eq!(x.read_skipping_wait().await, "START\n");
    assert_eq!(z.read_skipping_wait().await, "START\n");

    drop(x);
    // Give the worker time to observe the hangup.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let lobbies = server.engine.snapshot().await;
    let first = lobbies
        .iter()
        .find(|l| l.id == LobbyId(1))
        .expect("first lobby exists");
    assert_eq!(first.players, vec!["Z".to_string()]);
    assert_eq!(first.state, LobbyState::Started);
    assert_eq!(
        first.inventory.get(muster_protocol::ResourceKind::Gold),
        0,
        "departure never refunds"
    );
}

#[tokio::test]
async fn test_departure_while_waiting_frees_the_slot() {
    let server = start_server(2, 10, "gold 5\n").await;

    let x = TestClient::register(&server.path, "X\ngold\t1\n").await;
    drop(x);
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The freed slot admits two more players, which starts the lobby.
    let mut y = TestClient::register(&server.path, "Y\ngold\t1\n").await;
    assert_eq!(y.read_line().await, "OK\n");
    let mut z = TestClient::register(&server.path, "Z\ngold\t1\n").await;
    assert_eq!(z.read_line().await, "OK\n");
    assert_eq!(y.read_skipping_wait().await, "START\n");
    assert_eq!(z.read_skipping_wait().await, "START\n");
}

#[tokio::test]
async fn test_shutdown_stops_accepting_and_removes_socket() {
    let server = start_server(2, 10, "gold 5\n").await;
    assert!(server.path.exists());

    server.shutdown.shutdown().await;
    server.task.await.unwrap().unwrap();

    assert!(!server.path.exists());
    assert!(UnixStream::connect(&server.path).await.is_err());
}
