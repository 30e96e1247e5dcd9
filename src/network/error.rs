use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Empty message")]
    Empty,

    #[error("Unknown message: {0}")]
    UnknownMessage(String),

    #[error("Invalid round number: {0}")]
    InvalidRound(String),

    #[error("Unknown reply: {0}")]
    UnknownReply(String),

    #[error("Message exceeds {0} bytes")]
    TooLong(usize),
}

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Timeout error")]
    TimeoutError,

    #[error("Connection closed before a reply was received")]
    ConnectionClosed,

    #[error("Protocol error: {0}")]
    ProtocolError(#[from] ProtocolError),
}
