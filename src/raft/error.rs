use thiserror::Error;

#[derive(Error, Debug)]
pub enum RaftError {
    #[error("Invalid peer address: {0}")]
    InvalidPeer(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
