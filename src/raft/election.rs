use std::sync::Arc;

use ::log::{debug, info, warn};
use tokio::sync::{mpsc, Mutex};

use super::{ElectionOutcome, PeerRegistry, RaftNode};
use crate::network::PeerClient;

/// Runs election attempts on demand: advance the round, ask every other peer
/// for its vote one after another, then tally against the full cluster size.
pub struct ElectionCoordinator {
    node: Arc<Mutex<RaftNode>>,
    registry: Arc<PeerRegistry>,
    client: PeerClient,
}

impl ElectionCoordinator {
    pub fn new(node: Arc<Mutex<RaftNode>>, registry: Arc<PeerRegistry>, client: PeerClient) -> Self {
        Self {
            node,
            registry,
            client,
        }
    }

    pub async fn run(self, mut trigger: mpsc::Receiver<()>) {
        debug!("Waiting for election triggers");
        while trigger.recv().await.is_some() {
            self.run_once().await;
        }
    }

    /// One election attempt. Failed or slow peers count as "no vote" and are
    /// not retried within the attempt.
    pub async fn run_once(&self) -> ElectionOutcome {
        let round = match self.node.lock().await.begin_election() {
            Some(round) => round,
            None => return ElectionOutcome::Aborted,
        };

        for peer in self.registry.others() {
            match self.client.request_vote(peer, round).await {
                Ok(true) => {
                    info!("Received vote from {peer} for round {round}");
                    self.node.lock().await.record_vote(round);
                }
                Ok(false) => {
                    debug!("Peer {peer} denied vote for round {round}");
                }
                Err(e) => {
                    warn!("Vote request to {peer} for round {round} failed: {e}");
                }
            }
        }

        self.node.lock().await.finish_election(round)
    }
}
