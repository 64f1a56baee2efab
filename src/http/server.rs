//! HTTP server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum_server::Handle;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::build_router;
use crate::error::{Result, TurnstileError};
use crate::ratelimit::RateLimiterBackend;

/// Default limit on draining in-flight requests at shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP server for the admission service.
pub struct HttpServer<R: RateLimiterBackend + 'static> {
    /// Address to bind to
    addr: SocketAddr,
    /// The rate limiter instance
    rate_limiter: Arc<R>,
    /// Upper bound on graceful draining once shutdown is signalled
    shutdown_timeout: Duration,
}

impl<R: RateLimiterBackend + 'static> HttpServer<R> {
    /// Create a new HTTP server backed by `rate_limiter`.
    pub fn new(addr: SocketAddr, rate_limiter: Arc<R>) -> Self {
        Self {
            addr,
            rate_limiter,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Set how long in-flight requests may run after shutdown is requested.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// The configured bind address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Build the router served by this server.
    pub fn router(&self) -> axum::Router {
        build_router(Arc::clone(&self.rate_limiter))
    }

    /// Start the HTTP server.
    ///
    /// This method will block until the server fails.
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Bind the configured address and serve until `signal` resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr).await.map_err(|e| {
            error!(addr = %self.addr, error = %e, "Failed to bind HTTP listener");
            TurnstileError::Io(e)
        })?;
        self.serve_on(listener, signal).await
    }

    /// Serve on an already bound listener until `signal` resolves.
    ///
    /// Once the signal fires no new connections are accepted and in-flight
    /// requests get up to the shutdown timeout to complete. Connections still
    /// open at the deadline are closed without being served.
    pub async fn serve_on<F>(self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        let shutdown_timeout = self.shutdown_timeout;
        let router = self.router();

        info!(addr = %local_addr, "Starting HTTP server");

        let handle = Handle::new();
        let shutdown_handle = handle.clone();
        let watcher = tokio::spawn(async move {
            signal.await;
            info!(
                timeout_secs = shutdown_timeout.as_secs_f64(),
                "Shutdown requested, draining connections"
            );
            shutdown_handle.graceful_shutdown(Some(shutdown_timeout));
        });

        let result = axum_server::from_tcp(listener.into_std()?)
            .handle(handle)
            .serve(router.into_make_service())
            .await;
        watcher.abort();

        result.map_err(|e| {
            error!(error = %e, "HTTP server failed");
            TurnstileError::Io(e)
        })?;
        info!("HTTP server stopped");
        Ok(())
    }
}
