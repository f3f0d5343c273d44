// ────────────────────────────────
// src/server/builder.rs
// ────────────────────────────────
use anyhow::Result;
use hyper::{server::conn::Http, Body, Request, Response};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::Service;

/// Builder pattern so `main.rs` can inject its Relay handler.
pub struct ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    addr: SocketAddr,
    handler: Option<H>,
}

impl<H> ServerBuilder<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr, handler: None }
    }

    /// Inject your request handler (usually wraps `relay::Relay`).
    pub fn with_handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Bind the TCP socket now, before serving, so the caller can learn
    /// the resolved address (port 0 becomes a real port).
    pub async fn bind(self) -> Result<BoundServer<H>> {
        let handler = self.handler.expect("handler must be set via with_handler()");

        let listener = TcpListener::bind(self.addr).await?;
        let addr = listener.local_addr()?;
        tracing::info!("HTTP server listening on {}", addr);

        Ok(BoundServer {
            listener,
            handler,
            addr,
        })
    }

    /// Bind and serve in one step.
    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        self.bind().await?.serve(shutdown).await
    }
}

/// A bound listener that has not started accepting yet.
pub struct BoundServer<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    listener: TcpListener,
    handler: H,
    addr: SocketAddr,
}

impl<H> BoundServer<H>
where
    H: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    H::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    H::Future: Send + 'static,
{
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accept connections, one Hyper task each, until `shutdown` resolves.
    /// In-flight connections finish on their own tasks. A failed accept
    /// (e.g. fd exhaustion) is logged and the loop keeps going; nothing
    /// short of the shutdown signal stops the listener.
    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let svc = self.handler.clone();

                            tokio::spawn(async move {
                                let http = Http::new();
                                if let Err(err) = http.serve_connection(stream, svc).await {
                                    tracing::warn!(%peer, %err, "connection error");
                                }
                            });
                        }
                        Err(err) => {
                            tracing::warn!(%err, "accept error");
                        }
                    }
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received, releasing listener");
                    break;
                }
            }
        }

        Ok(())
    }
}
