use crate::application::DependencyContainer;
use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

/// Manages application startup checks
pub struct ApplicationLifecycle {
    container: Arc<DependencyContainer>,
}

impl ApplicationLifecycle {
    pub fn new(container: Arc<DependencyContainer>) -> Self {
        Self { container }
    }

    /// Validate configuration before any command runs
    pub fn initialize(&self) -> Result<()> {
        self.container.config.validate()?;
        info!("✅ Configuration validated");
        Ok(())
    }
}

/// Resolve on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install terminate signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
