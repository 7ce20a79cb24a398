//! monitor-core: Shared infrastructure for the workspace 2SV monitor.
pub mod config;
pub mod error;
pub mod http;
pub mod observability;

pub use reqwest;
pub use secrecy;
pub use serde;
pub use tokio;
pub use tracing;
