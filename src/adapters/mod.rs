// Adapters layer: concrete implementations of the domain ports.

pub mod compose;
pub mod route_table;

pub use compose::ComposeRuntime;
pub use route_table::RouteTable;
