use std::time::Duration;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::protocol::{self, Reply, Request};
use super::NetworkError;
use crate::raft::Peer;

/// Outbound side of the peer protocol: one connection per request.
#[derive(Debug, Clone)]
pub struct PeerClient {
    timeout: Duration,
}

impl PeerClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Dials `address`, sends `request` and reads one reply line. The whole
    /// exchange, dial included, is bounded by the client timeout.
    pub async fn send(&self, address: &str, request: Request) -> Result<Reply, NetworkError> {
        timeout(self.timeout, Self::exchange(address, request))
            .await
            .map_err(|_| NetworkError::TimeoutError)?
    }

    async fn exchange(address: &str, request: Request) -> Result<Reply, NetworkError> {
        let mut stream = TcpStream::connect(address).await?;
        stream.write_all(request.encode().as_bytes()).await?;

        let mut reader = BufReader::new(stream);
        let line = protocol::read_line(&mut reader)
            .await?
            .ok_or(NetworkError::ConnectionClosed)?;

        Ok(Reply::parse(&line)?)
    }

    /// Asks `peer` for its vote in `round`. Returns true only on a grant.
    pub async fn request_vote(&self, peer: &Peer, round: u64) -> Result<bool, NetworkError> {
        let reply = self.send(&peer.addr, Request::RequestVote { round }).await?;
        Ok(reply == Reply::Grant)
    }

    pub async fn heartbeat(&self, peer: &Peer) -> Result<Reply, NetworkError> {
        self.send(&peer.addr, Request::Heartbeat).await
    }
}
