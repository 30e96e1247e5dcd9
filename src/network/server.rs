use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace, warn};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::time::timeout;

use super::protocol::{self, Reply, Request};
use super::NetworkError;
use crate::raft::{RaftNode, TimerHandle};

/// Inbound side of the peer protocol. Every accepted connection is handled on
/// its own task: read one line, dispatch, write one reply, close.
pub struct PeerServer {
    node: Arc<Mutex<RaftNode>>,
    election_timer: TimerHandle,
    read_timeout: Duration,
}

impl PeerServer {
    pub fn new(
        node: Arc<Mutex<RaftNode>>,
        election_timer: TimerHandle,
        read_timeout: Duration,
    ) -> Self {
        Self {
            node,
            election_timer,
            read_timeout,
        }
    }

    pub async fn serve(self, listener: TcpListener) {
        let server = Arc::new(self);

        loop {
            let (stream, remote) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("Failed to accept connection: {e}");
                    continue;
                }
            };

            let server = Arc::clone(&server);
            tokio::spawn(async move {
                if let Err(e) = server.handle_connection(stream, remote).await {
                    debug!("Connection from {remote} failed: {e}");
                }
            });
        }
    }

    async fn handle_connection(
        &self,
        stream: TcpStream,
        remote: SocketAddr,
    ) -> Result<(), NetworkError> {
        let mut reader = BufReader::new(stream);
        let line = timeout(self.read_timeout, protocol::read_line(&mut reader))
            .await
            .map_err(|_| NetworkError::TimeoutError)??;

        let line = match line {
            Some(line) => line,
            None => {
                trace!("Connection from {remote} closed without a request");
                return Ok(());
            }
        };
        debug!("Server received from {remote}: {}", line.trim_end());

        let request = match Request::parse(&line) {
            Ok(request) => request,
            Err(e) => {
                // No reply is defined for unrecognized lines
                warn!("Dropping request from {remote}: {e}");
                return Ok(());
            }
        };

        let reply = self.handle_request(request).await;

        let mut stream = reader.into_inner();
        stream.write_all(reply.encode().as_bytes()).await?;
        let _ = stream.shutdown().await;
        Ok(())
    }

    /// Applies `request` to the node and returns the reply to send back.
    pub async fn handle_request(&self, request: Request) -> Reply {
        match request {
            Request::Heartbeat => {
                self.node.lock().await.handle_heartbeat();
                self.election_timer.reset();
                Reply::Ack
            }
            Request::RequestVote { round } => {
                let granted = self.node.lock().await.can_vote(round);
                debug!("Vote request for round {round}: granted={granted}");
                Reply::vote(granted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raft::{election_timer_channel, NodeRole};

    fn server(node: RaftNode) -> (PeerServer, tokio::sync::mpsc::Receiver<()>) {
        let (handle, resets) = election_timer_channel();
        let server = PeerServer::new(
            Arc::new(Mutex::new(node)),
            handle,
            Duration::from_millis(100),
        );
        (server, resets)
    }

    #[tokio::test]
    async fn heartbeat_demotes_and_resets_election_timer() {
        let mut node = RaftNode::new("n1", 3);
        node.change_role(NodeRole::Leader);
        let (server, mut resets) = server(node);

        assert_eq!(server.handle_request(Request::Heartbeat).await, Reply::Ack);
        assert_eq!(server.node.lock().await.role(), NodeRole::Follower);
        assert!(resets.try_recv().is_ok());
    }

    #[tokio::test]
    async fn vote_requests_follow_the_ledger() {
        let (server, _resets) = server(RaftNode::new("n1", 3));

        let first = server
            .handle_request(Request::RequestVote { round: 1 })
            .await;
        let second = server
            .handle_request(Request::RequestVote { round: 1 })
            .await;
        let next = server
            .handle_request(Request::RequestVote { round: 2 })
            .await;

        assert_eq!(first, Reply::Grant);
        assert_eq!(second, Reply::Deny);
        assert_eq!(next, Reply::Grant);
    }

    #[tokio::test]
    async fn concurrent_requests_for_one_round_grant_once() {
        let (server, _resets) = server(RaftNode::new("n1", 3));
        let server = Arc::new(server);

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let server = Arc::clone(&server);
            tasks.push(tokio::spawn(async move {
                server
                    .handle_request(Request::RequestVote { round: 1 })
                    .await
            }));
        }

        let mut grants = 0;
        for task in tasks {
            if task.await.unwrap() == Reply::Grant {
                grants += 1;
            }
        }
        assert_eq!(grants, 1);
    }
}
