pub mod config;
pub mod network;
pub mod raft;

// Public exports
pub use config::Config;
pub use raft::{NodeRole, Raft, RaftConfig, RaftError};
