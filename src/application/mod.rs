use anyhow::Result;
use std::sync::Arc;

pub mod command_handlers;
pub mod dependency_container;
pub mod lifecycle;

pub use command_handlers::{
    ConfigCommandHandler, HealthCommandHandler, RankCommandHandler, ServerCommandHandler,
};
pub use dependency_container::DependencyContainer;
pub use lifecycle::{shutdown_signal, ApplicationLifecycle};

use crate::Config;

/// Application layer - wires configuration, embedder, ranker and catalog
pub struct Application {
    pub container: Arc<DependencyContainer>,
    pub lifecycle: Arc<ApplicationLifecycle>,
}

impl Application {
    pub fn new(config: Config) -> Result<Self> {
        let container = Arc::new(DependencyContainer::new(config)?);
        let lifecycle = Arc::new(ApplicationLifecycle::new(container.clone()));

        Ok(Self {
            container,
            lifecycle,
        })
    }

    pub fn initialize(&self) -> Result<()> {
        self.lifecycle.initialize()
    }
}
