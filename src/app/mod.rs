// Application wiring: builds the orchestrator and its collaborators from a data directory.

use crate::adapters::{ComposeRuntime, RouteTable};
use crate::config::{ConfigStore, DataDir, Settings};
use crate::core::{Orchestrator, PortAllocator, TeamStore};
use crate::domain::ports::ContainerRuntime;
use crate::utils::error::Result;
use std::sync::Arc;

pub struct Provisioner {
    pub orchestrator: Arc<Orchestrator>,
    pub routes: Arc<RouteTable>,
    pub settings: Settings,
}

impl Provisioner {
    /// Production wiring: the compose command configured in config.toml.
    pub fn open(data_dir: DataDir) -> Result<Self> {
        Self::open_with(data_dir, |settings, dir| {
            Arc::new(ComposeRuntime::from_settings(&settings.runtime, dir.root()))
        })
    }

    pub fn open_with<F>(data_dir: DataDir, make_runtime: F) -> Result<Self>
    where
        F: FnOnce(&Settings, &DataDir) -> Arc<dyn ContainerRuntime>,
    {
        data_dir.ensure_exists()?;

        // 載入設定與隊伍資料
        let config = ConfigStore::open(data_dir.settings_path())?;
        let settings = config.settings().clone();
        let teams = TeamStore::open(data_dir.data_path())?;

        let runtime = make_runtime(&settings, &data_dir);
        let routes = Arc::new(RouteTable::new());
        let backend_ip = settings.runtime.backend_ip()?;

        let orchestrator = Orchestrator::new(
            PortAllocator::new(config),
            teams,
            runtime,
            routes.clone(),
            backend_ip,
        );

        tracing::info!(
            "Provisioner ready in {} (cursor {})",
            data_dir.root().display(),
            settings.server.port_start
        );

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            routes,
            settings,
        })
    }

    pub fn bearer_token(&self) -> &str {
        self.settings.server.bearer_token.as_deref().unwrap_or("")
    }
}
