//! Shared fixtures for the integration suites.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use mojenx::config::{ApiConfig, EgressConfig};
use mojenx::egress::EgressChecker;
use mojenx::service::{PortProbe, ServiceController};
use mojenx::torrc::{ConfigStore, TorrcManager};
use mojenx::{HttpServer, MojenxError, Shutdown};

pub const TOKEN: &str = "test-token";

/// Service controller that counts calls instead of running anything.
#[derive(Default)]
pub struct RecordingController {
    pub reloads: AtomicUsize,
    pub restarts: AtomicUsize,
    pub fail: AtomicBool,
}

impl RecordingController {
    fn outcome(&self, action: &str) -> mojenx::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MojenxError::ExternalCommand {
                command: format!("systemctl {action} tor"),
                detail: "Job for tor.service failed.".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ServiceController for RecordingController {
    async fn reload(&self) -> mojenx::Result<()> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        self.outcome("reload")
    }

    async fn restart(&self) -> mojenx::Result<()> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        self.outcome("restart")
    }
}

/// Manager rooted in `dir`, with `echo_host` reachable through the fake Tor.
pub fn manager(dir: &Path, controller: Arc<RecordingController>) -> Arc<TorrcManager> {
    let egress = EgressConfig {
        echo_host: "echo.test".into(),
        ..EgressConfig::default()
    };
    Arc::new(TorrcManager::new(
        ConfigStore::new(dir.join("torrc"), dir.join("backups")),
        controller,
        PortProbe::new(Duration::from_millis(300)),
        EgressChecker::new(egress),
    ))
}

/// Port nothing is listening on (at the time of the call).
pub async fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Serve the API on an ephemeral port. Keep the returned `Shutdown` alive.
pub async fn spawn_api(manager: Arc<TorrcManager>) -> (SocketAddr, Shutdown) {
    let config = ApiConfig {
        listen_address: "127.0.0.1:0".into(),
        token: TOKEN.into(),
        ..ApiConfig::default()
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(manager, &config);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (addr, shutdown)
}

/// A stand-in for Tor's SOCKS port in front of an "echo my IP" endpoint
/// that answers every CONNECT with `ip`.
pub async fn start_fake_tor(ip: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = serve_socks_echo(socket, ip).await;
            });
        }
    });
    addr
}

async fn serve_socks_echo(mut socket: TcpStream, ip: &str) -> std::io::Result<()> {
    let mut greeting = [0u8; 2];
    socket.read_exact(&mut greeting).await?;
    let mut methods = vec![0u8; greeting[1] as usize];
    socket.read_exact(&mut methods).await?;
    socket.write_all(&[0x05, 0x00]).await?;

    let mut head = [0u8; 5];
    socket.read_exact(&mut head).await?;
    let mut rest = vec![0u8; head[4] as usize + 2];
    socket.read_exact(&mut rest).await?;
    socket
        .write_all(&[0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0])
        .await?;

    let mut request = Vec::new();
    let mut byte = [0u8; 1];
    while !request.ends_with(b"\r\n\r\n") {
        if socket.read(&mut byte).await? == 0 {
            break;
        }
        request.push(byte[0]);
    }

    let body = format!("{ip}\n");
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}
