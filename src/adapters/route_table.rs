use crate::domain::ports::BackendRegistry;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::SocketAddr;

/// In-process list of router backends, keyed by team id.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: RwLock<HashMap<String, SocketAddr>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }
}

impl BackendRegistry for RouteTable {
    fn register(&self, id: &str, address: SocketAddr) {
        let previous = self.routes.write().insert(id.to_string(), address);
        match previous {
            Some(old) if old != address => {
                tracing::info!("Backend {} moved from {} to {}", id, old, address)
            }
            Some(_) => tracing::debug!("Backend {} re-registered at {}", id, address),
            None => tracing::info!("Registered backend {} at {}", id, address),
        }
    }

    fn unregister(&self, id: &str) -> Option<SocketAddr> {
        let removed = self.routes.write().remove(id);
        if let Some(addr) = removed {
            tracing::info!("Unregistered backend {} ({})", id, addr);
        }
        removed
    }

    fn lookup(&self, id: &str) -> Option<SocketAddr> {
        self.routes.read().get(id).copied()
    }
}
