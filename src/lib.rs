pub mod adapters;
pub mod api;
pub mod app;
pub mod commands;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliCommand, CliConfig};

pub use app::Provisioner;
pub use crate::core::{orchestrator::Orchestrator, team_store::TeamStore};
pub use utils::error::{ContestError, Result};
