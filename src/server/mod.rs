// Server module entry point
// Owns the listening socket and runs the accept loop

pub mod connection;
pub mod listener;
pub mod signal;

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::{AppState, Config};
use crate::error::ServerError;
use crate::logger;

pub use listener::create_listener;

/// A bound static CORS server
///
/// Created in the listening state by [`Server::bind`]; dropping it (or
/// returning from [`Server::run`]) closes the socket.
pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
}

impl Server {
    /// Bind the configured address and prepare to serve `root`
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(config: Config, root: PathBuf) -> Result<Self, ServerError> {
        let addr = config
            .get_socket_addr()
            .map_err(|e| ServerError::Config(::config::ConfigError::Message(e)))?;

        let listener =
            create_listener(addr).map_err(|source| ServerError::Bind { addr, source })?;
        let state = Arc::new(AppState::new(config, root)?);

        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until SIGINT or SIGTERM
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(async {
            let signal = signal::shutdown_signal().await;
            logger::log_shutdown(signal);
        })
        .await
    }

    /// Serve until `shutdown` completes
    ///
    /// Each accepted connection is handed to its own task. Accept errors are
    /// logged and the loop continues.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        logger::log_server_start(&addr, &self.state.root, &self.state.config);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            connection::spawn_connection(stream, peer_addr, &self.state);
                        }
                        Err(e) => {
                            logger::log_error(&format!("Failed to accept connection: {e}"));
                        }
                    }
                }

                () = &mut shutdown => break,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    struct TestRoot(PathBuf);

    impl TestRoot {
        fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "cors-server-{}-{name}",
                std::process::id()
            ));
            let _ = std::fs::remove_dir_all(&dir);
            std::fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }
    }

    impl Drop for TestRoot {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn local_config(port: u16) -> Config {
        let mut config = Config::load(Some(port)).unwrap();
        config.server.host = "127.0.0.1".to_string();
        config.logging.access_log = false;
        config
    }

    /// Start a server on an ephemeral port, returning its address and a stop handle
    fn start(root: &TestRoot) -> (SocketAddr, oneshot::Sender<()>) {
        let server = Server::bind(local_config(0), root.0.clone()).unwrap();
        let addr = server.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(server.run_until(async {
            let _ = rx.await;
        }));
        (addr, tx)
    }

    /// Send one raw request and return (status line, headers, body)
    async fn raw_request(addr: SocketAddr, request: &str) -> (String, String, Vec<u8>) {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();

        let split = response
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .unwrap();
        let head = String::from_utf8(response[..split].to_vec()).unwrap();
        let body = response[split + 4..].to_vec();
        let (status, headers) = head.split_once("\r\n").unwrap_or((&head, ""));
        (status.to_string(), headers.to_lowercase(), body)
    }

    fn assert_cors(headers: &str) {
        assert!(headers.contains("access-control-allow-origin: *"));
        assert!(headers.contains("access-control-allow-methods: get"));
    }

    #[tokio::test]
    async fn test_serves_file_over_tcp() {
        let root = TestRoot::new("file");
        std::fs::write(root.0.join("index.html"), b"<p>served</p>").unwrap();
        let (addr, _stop) = start(&root);

        let (status, headers, body) = raw_request(
            addr,
            "GET /index.html HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert_eq!(status, "HTTP/1.1 200 OK");
        assert_eq!(body, b"<p>served</p>");
        assert!(headers.contains("content-length: 13"));
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn test_head_over_tcp() {
        let root = TestRoot::new("head");
        std::fs::write(root.0.join("f.txt"), b"hello").unwrap();
        let (addr, _stop) = start(&root);

        let (status, headers, body) = raw_request(
            addr,
            "HEAD /f.txt HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert_eq!(status, "HTTP/1.1 200 OK");
        assert!(headers.contains("content-length: 5"));
        assert!(headers.contains("content-type: text/plain; charset=utf-8"));
        assert!(body.is_empty());
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn test_not_found_over_tcp() {
        let root = TestRoot::new("missing");
        let (addr, _stop) = start(&root);

        let (status, headers, _) = raw_request(
            addr,
            "GET /does-not-exist HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert_eq!(status, "HTTP/1.1 404 Not Found");
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn test_post_over_tcp() {
        let root = TestRoot::new("post");
        let (addr, _stop) = start(&root);

        let (status, headers, _) = raw_request(
            addr,
            "POST / HTTP/1.1\r\nHost: localhost\r\nContent-Length: 2\r\nConnection: close\r\n\r\nhi",
        )
        .await;
        assert_eq!(status, "HTTP/1.1 501 Not Implemented");
        assert_cors(&headers);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_bind_error() {
        let root = TestRoot::new("conflict");
        let first = Server::bind(local_config(0), root.0.clone()).unwrap();
        let port = first.local_addr().unwrap().port();

        let second = Server::bind(local_config(port), root.0.clone());
        assert!(matches!(second, Err(ServerError::Bind { addr, .. }) if addr.port() == port));
    }

    #[tokio::test]
    async fn test_run_until_stops_on_shutdown() {
        let root = TestRoot::new("shutdown");
        let server = Server::bind(local_config(0), root.0.clone()).unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.run_until(async {
            let _ = rx.await;
        }));

        tx.send(()).unwrap();
        assert!(handle.await.unwrap().is_ok());
    }
}
