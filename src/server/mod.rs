pub mod handler;

use crate::client::{MetaSearchClient, SearchSession};
use crate::tools::SearchTool;
use crate::{Config, Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use handler::{router, ApiError};

pub struct Server {
    config: Arc<Config>,
    cancellation_token: CancellationToken,
}

impl Server {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::new_with_arc(Arc::new(config))
    }

    #[must_use]
    pub fn new_with_arc(config: Arc<Config>) -> Self {
        Self {
            config,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Establish the session, bind the listener and serve until shutdown
    pub async fn run(&self) -> Result<()> {
        info!("Starting Sound Mind API server");

        // Session credentials are acquired once, before any request is served
        let session = Arc::new(SearchSession::establish(&self.config).await);
        info!(
            "Search session established (reddit connected: {})",
            session.is_reddit_connected()
        );

        let client = Arc::new(MetaSearchClient::new(&self.config)?);
        let tool = Arc::new(SearchTool::new(client, session));
        let app = router(tool, &self.config.server.static_dir);

        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Service(format!("Failed to bind {addr}: {e}")))?;
        info!("Listening on http://{}", addr);

        self.spawn_signal_handler();

        let shutdown_token = self.cancellation_token.clone();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown_token.cancelled().await });

        let server_result = serve
            .await
            .map_err(|e| Error::Service(format!("HTTP server error: {e}")));

        // Graceful shutdown with timeout
        let shutdown_timeout = Duration::from_secs(self.config.server.graceful_shutdown_timeout_secs);
        if tokio::time::timeout(shutdown_timeout, self.graceful_shutdown())
            .await
            .is_err()
        {
            warn!("Graceful shutdown timeout exceeded, forcing shutdown");
        }

        info!("Server shutdown complete");
        server_result
    }

    fn spawn_signal_handler(&self) {
        let shutdown_token = self.cancellation_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = wait_for_signal() => {
                    info!("Received shutdown signal, initiating graceful shutdown");
                    shutdown_token.cancel();
                }
                () = shutdown_token.cancelled() => {}
            }
        });
    }

    async fn graceful_shutdown(&self) {
        info!("Performing graceful shutdown");
        // In-flight requests were drained by axum; nothing is persisted
        tokio::task::yield_now().await;
        info!("Graceful shutdown completed");
    }

    pub async fn shutdown(&self) {
        warn!("Initiating server shutdown");
        self.cancellation_token.cancel();
    }

    /// Check if the server has been requested to shutdown
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// Get the server configuration
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            if let Err(e) = signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM"),
        result = signal::ctrl_c() => match result {
            Ok(()) => info!("Received SIGINT"),
            Err(e) => {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        },
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
