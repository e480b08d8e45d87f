use crate::utils::error::ProvisionError;
use async_trait::async_trait;
use std::net::SocketAddr;

/// Brings a team's server instance up or down.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn start(&self, server_name: &str, port: u16) -> Result<(), ProvisionError>;
    async fn stop(&self, server_name: &str) -> Result<(), ProvisionError>;
}

/// The router's backend list, keyed by team id.
pub trait BackendRegistry: Send + Sync {
    /// Replaces any existing route for `id`.
    fn register(&self, id: &str, address: SocketAddr);
    /// Returns the removed address, if there was one.
    fn unregister(&self, id: &str) -> Option<SocketAddr>;
    fn lookup(&self, id: &str) -> Option<SocketAddr>;
}
