//! Web server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;
use crate::{BoerseError, Result};

use super::router::create_router;
use super::state::AppState;

/// HTTP server for the site.
pub struct WebServer {
    addr: SocketAddr,
    state: AppState,
}

impl WebServer {
    /// Create a server for the configured address.
    pub fn new(ctx: Arc<AppContext>) -> Result<Self> {
        let server = &ctx.config.server;
        let addr = format!("{}:{}", server.host, server.port)
            .parse()
            .map_err(|e| {
                BoerseError::Config(format!(
                    "invalid listen address {}:{}: {e}",
                    server.host, server.port
                ))
            })?;
        let state = AppState::new(ctx)?;

        Ok(Self { addr, state })
    }

    /// Configured listen address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Bind and serve in a background task until `shutdown` is cancelled.
    ///
    /// Returns the bound address (useful with port 0) and the task handle;
    /// the task ends once in-flight requests have finished.
    pub async fn spawn(self, shutdown: CancellationToken) -> Result<(SocketAddr, JoinHandle<()>)> {
        let router = create_router(self.state);
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await;
            match result {
                Ok(()) => tracing::info!("Web server stopped"),
                Err(e) => tracing::error!("Web server error: {}", e),
            }
        });

        Ok((local_addr, handle))
    }
}
