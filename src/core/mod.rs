pub mod orchestrator;
pub mod port_allocator;
pub mod team_store;

pub use crate::domain::model::{NewTeam, Team};
pub use crate::domain::ports::{BackendRegistry, ContainerRuntime};
pub use crate::utils::error::Result;
pub use orchestrator::Orchestrator;
pub use port_allocator::{PortAllocator, PortReservation};
pub use team_store::TeamStore;
