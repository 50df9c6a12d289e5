//! Loopback port availability probe.
//!
//! A short connect attempt: if something accepts, the port is taken. This is
//! a point-in-time check only; the port can be grabbed between the probe and
//! Tor binding it.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time;

#[derive(Debug, Clone)]
pub struct PortProbe {
    host: IpAddr,
    timeout: Duration,
}

impl PortProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            timeout,
        }
    }

    /// True when nothing accepted a connection on `port` within the timeout.
    pub async fn is_free(&self, port: u16) -> bool {
        let addr = SocketAddr::new(self.host, port);
        match time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => {
                tracing::debug!(port, "port probe: in use");
                false
            }
            Ok(Err(e)) => {
                tracing::debug!(port, error = %e, "port probe: free");
                true
            }
            Err(_) => {
                tracing::debug!(port, "port probe: timed out, treating as free");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_bound_port_is_busy() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = PortProbe::new(Duration::from_millis(500));
        assert!(!probe.is_free(port).await);
    }

    #[tokio::test]
    async fn test_released_port_is_free() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = PortProbe::new(Duration::from_millis(500));
        assert!(probe.is_free(port).await);
    }
}
