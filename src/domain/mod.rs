// Domain layer: team models and the ports (interfaces) the orchestrator depends on.

pub mod model;
pub mod ports;
