//! Newline-delimited text protocol spoken between peers.
//!
//! One request and one reply per connection:
//!
//! | Request                  | Reply                 |
//! |--------------------------|-----------------------|
//! | `LEADER-HEARTBEAT-SYNC`  | `FOLLOWER ACK`        |
//! | `NoVote<round>`          | `OK` or `NOTOK`       |

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use super::{NetworkError, ProtocolError};

pub const HEARTBEAT: &str = "LEADER-HEARTBEAT-SYNC";
pub const VOTE_REQUEST_PREFIX: &str = "NoVote";
pub const ACK: &str = "FOLLOWER ACK";
pub const GRANT: &str = "OK";
pub const DENY: &str = "NOTOK";

/// Upper bound on a single protocol line, terminator included.
pub const MAX_LINE_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Heartbeat,
    RequestVote { round: u64 },
}

impl Request {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }

        if line.starts_with(HEARTBEAT) {
            return Ok(Request::Heartbeat);
        }

        if let Some(rest) = line.strip_prefix(VOTE_REQUEST_PREFIX) {
            // Digits only: no separator, sign or padding
            if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ProtocolError::InvalidRound(rest.to_string()));
            }
            let round = rest
                .parse::<u64>()
                .map_err(|_| ProtocolError::InvalidRound(rest.to_string()))?;
            return Ok(Request::RequestVote { round });
        }

        Err(ProtocolError::UnknownMessage(line.to_string()))
    }

    pub fn encode(&self) -> String {
        match self {
            Request::Heartbeat => format!("{HEARTBEAT}\n"),
            Request::RequestVote { round } => format!("{VOTE_REQUEST_PREFIX}{round}\n"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ack,
    Grant,
    Deny,
}

impl Reply {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let line = line.trim_end_matches(['\r', '\n']);
        // NOTOK first: a grant is anything prefixed with OK
        if line.starts_with(DENY) {
            Ok(Reply::Deny)
        } else if line.starts_with(GRANT) {
            Ok(Reply::Grant)
        } else if line.starts_with(ACK) {
            Ok(Reply::Ack)
        } else {
            Err(ProtocolError::UnknownReply(line.to_string()))
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Reply::Ack => format!("{ACK}\n"),
            Reply::Grant => format!("{GRANT}\n"),
            Reply::Deny => format!("{DENY}\n"),
        }
    }

    pub fn vote(granted: bool) -> Self {
        if granted {
            Reply::Grant
        } else {
            Reply::Deny
        }
    }
}

/// Reads one protocol line of at most [`MAX_LINE_LEN`] bytes. Returns `None`
/// when the peer closed the stream without sending anything.
pub async fn read_line<R>(reader: &mut R) -> Result<Option<String>, NetworkError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let n = reader
        .take(MAX_LINE_LEN as u64)
        .read_line(&mut line)
        .await?;

    if n == 0 {
        return Ok(None);
    }
    if n == MAX_LINE_LEN && !line.ends_with('\n') {
        return Err(ProtocolError::TooLong(MAX_LINE_LEN).into());
    }
    Ok(Some(line))
}
