//! HTTP server initialization and lifecycle

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::{ConfigError, ServerConfig};
use crate::module::repository::FsModuleRepository;
use crate::proxy::handler::{AppState, handle_request};
use crate::proxy::queries::ModuleProxy;

/// Builds the proxy router serving the configured module directory
pub fn build_router(config: &ServerConfig) -> Result<Router, ConfigError> {
    let mod_dir = config.validated_mod_dir()?;

    let repository = FsModuleRepository::new(mod_dir);
    let state = AppState::new(
        Arc::new(ModuleProxy::new(repository)),
        Duration::from_millis(config.request_timeout_ms),
    );

    Ok(Router::new().fallback(handle_request).with_state(state))
}

/// Runs the proxy until SIGINT or SIGTERM, then shuts down gracefully
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let app = build_router(&config)?;
    let mod_dir = config.validated_mod_dir()?;
    let addr = config.validated_addr()?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to listen on {}", addr))?;
    info!(
        "Serving modules from {:?} on {}",
        mod_dir,
        listener.local_addr()?
    );

    let (shutdown, mut server) = spawn_server(listener, app);

    tokio::select! {
        result = &mut server => {
            return result.context("server task failed")?.context("server error");
        }
        () = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    shutdown.notify_one();

    let shutdown_timeout = Duration::from_millis(config.shutdown_timeout_ms);
    match tokio::time::timeout(shutdown_timeout, server).await {
        Ok(result) => {
            result.context("server task failed")?.context("server error")?;
            info!("Server stopped");
            Ok(())
        }
        Err(_) => anyhow::bail!(
            "graceful shutdown did not finish within {}ms",
            config.shutdown_timeout_ms
        ),
    }
}

/// Serves `app` on `listener` until the returned [`Notify`] is notified
fn spawn_server(
    listener: TcpListener,
    app: Router,
) -> (Arc<Notify>, JoinHandle<std::io::Result<()>>) {
    let shutdown = Arc::new(Notify::new());
    let signal = shutdown.clone();

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { signal.notified().await })
            .await
    });

    (shutdown, handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

/// A proxy listening on a random local port, for tests of code that talks to
/// a module proxy
pub struct TestServer {
    addr: SocketAddr,
    shutdown: Arc<Notify>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    /// Starts a proxy for `config`, ignoring its `addr`
    pub async fn start(config: &ServerConfig) -> anyhow::Result<Self> {
        let app = build_router(config)?;
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown, handle) = spawn_server(listener, app);

        Ok(Self {
            addr,
            shutdown,
            handle,
        })
    }

    /// Base URL to use as GOPROXY
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stops the server and waits for it to finish
    pub async fn close(self) -> anyhow::Result<()> {
        self.shutdown.notify_one();
        self.handle.await??;
        Ok(())
    }
}
