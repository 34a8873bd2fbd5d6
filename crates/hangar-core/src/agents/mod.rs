//! Agent profiles and the agent directory

pub mod directory;
pub mod profile;

pub use directory::{AgentDirectory, AgentInfo};
pub use profile::DomainProfile;
