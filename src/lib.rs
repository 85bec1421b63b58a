pub mod actors;
pub mod config;
pub mod fleet;
pub mod probe;
pub mod stats;
pub mod supervisor;
pub mod util;

#[cfg(feature = "dashboard")]
pub mod viewer;

pub use actors::messages::{AlertEvent, AlertKind, Report};
pub use fleet::{EndpointSnapshot, Fleet};
pub use stats::{EndpointStats, Window};
