use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::{ReadMode, ServerConfig};
use crate::http::connection::Connection;
use crate::http::mime::MimeLookup;
use crate::router::Resolver;

/// Pause after a failed accept so persistent errors (EMFILE) don't spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Listening socket plus everything needed to serve a connection.
///
/// Binding happens in [`Server::bind`]; [`Server::run`] is the accept loop.
/// The loop stops once a [`ServerHandle`] clears the running flag.
pub struct Server {
    listener: TcpListener,
    resolver: Arc<Resolver>,
    read_limit: usize,
    read_mode: ReadMode,
    read_timeout: Option<Duration>,
    concurrent: bool,
    running: Arc<AtomicBool>,
    stop_tx: Arc<watch::Sender<bool>>,
}

/// Cloneable stop switch for a running [`Server`].
#[derive(Clone)]
pub struct ServerHandle {
    running: Arc<AtomicBool>,
    stop_tx: Arc<watch::Sender<bool>>,
}

impl ServerHandle {
    /// Stops accepting connections. A connection already being served runs
    /// to completion.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.stop_tx.send_replace(true);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Server {
    pub async fn bind(cfg: &ServerConfig) -> anyhow::Result<Self> {
        let addr = cfg.listen_addr();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding {}", addr))?;
        info!("Listening on {}", listener.local_addr()?);

        let resolver = Resolver::new(&cfg.document_root).server_name(cfg.server_name.clone());
        let (stop_tx, _) = watch::channel(false);

        Ok(Self {
            listener,
            resolver: Arc::new(resolver),
            read_limit: cfg.read_buffer_size,
            read_mode: cfg.read_mode,
            read_timeout: cfg.read_timeout,
            concurrent: cfg.concurrent,
            running: Arc::new(AtomicBool::new(true)),
            stop_tx: Arc::new(stop_tx),
        })
    }

    /// Swaps the MIME lookup used by the resolver.
    pub fn with_mime(mut self, mime: Arc<dyn MimeLookup>) -> Self {
        self.resolver = Arc::new(self.resolver.replace_mime(mime));
        self
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            running: self.running.clone(),
            stop_tx: self.stop_tx.clone(),
        }
    }

    /// Runs the accept loop on its own task.
    pub fn spawn(self) -> (ServerHandle, JoinHandle<anyhow::Result<()>>) {
        let handle = self.handle();
        (handle, tokio::spawn(self.run()))
    }

    /// Accepts connections until stopped.
    ///
    /// Connections are served one at a time unless `concurrent` is set, in
    /// which case each gets its own task. Per-connection failures are logged
    /// and never end the loop.
    pub async fn run(self) -> anyhow::Result<()> {
        let mut stop_rx = self.stop_tx.subscribe();

        while self.running.load(Ordering::SeqCst) {
            let accepted = tokio::select! {
                res = self.listener.accept() => res,
                _ = stop_rx.wait_for(|stopped| *stopped) => break,
            };

            let (socket, peer) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    error!("[ERROR] accept failed: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };
            debug!("Accepted connection from {}", peer);

            let conn = Connection::new(socket, self.resolver.clone())
                .read_limit(self.read_limit)
                .read_mode(self.read_mode)
                .read_timeout(self.read_timeout);

            if self.concurrent {
                tokio::spawn(serve(conn, peer));
            } else {
                serve(conn, peer).await;
            }
        }

        self.running.store(false, Ordering::SeqCst);
        drop(self.listener);
        info!("[SERVER STOPPED]");
        Ok(())
    }
}

async fn serve<S>(mut conn: Connection<S>, peer: SocketAddr)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match conn.run().await {
        Ok(Some(status)) => debug!(%peer, status = status.as_u16(), "connection closed"),
        Ok(None) => debug!(%peer, "client closed without a request"),
        Err(e) => error!(%peer, "[ERROR] {:#}", e),
    }
}
