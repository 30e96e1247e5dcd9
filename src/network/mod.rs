mod error;

pub mod client;
pub mod protocol;
pub mod server;

pub use client::PeerClient;
pub use error::{NetworkError, ProtocolError};
pub use protocol::{Reply, Request};
pub use server::PeerServer;
