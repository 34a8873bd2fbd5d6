//! hangar-gateway: HTTP surface for the hangar agents
//!
//! Exposes chat, agent directory, task history and health endpoints over
//! an Axum router.

pub mod history;
pub mod protocol;
pub mod server;

pub use history::TaskHistory;
pub use server::GatewayServer;
