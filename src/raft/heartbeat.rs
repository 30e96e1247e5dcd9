use std::sync::Arc;

use ::log::{debug, trace};
use tokio::sync::{mpsc, Mutex};

use super::{PeerRegistry, RaftNode};
use crate::network::PeerClient;

/// Best-effort liveness broadcast from the Leader to every other peer.
pub struct HeartbeatBroadcaster {
    node: Arc<Mutex<RaftNode>>,
    registry: Arc<PeerRegistry>,
    client: PeerClient,
}

impl HeartbeatBroadcaster {
    pub fn new(node: Arc<Mutex<RaftNode>>, registry: Arc<PeerRegistry>, client: PeerClient) -> Self {
        Self {
            node,
            registry,
            client,
        }
    }

    pub async fn run(self, mut trigger: mpsc::Receiver<()>) {
        while trigger.recv().await.is_some() {
            self.broadcast_once().await;
        }
    }

    /// Sends one heartbeat to each other peer and returns how many replied.
    /// Replies are only logged; failures never demote the Leader.
    pub async fn broadcast_once(&self) -> usize {
        // The trigger may have been queued before a demotion
        if !self.node.lock().await.is_leader() {
            trace!("Skipping heartbeat broadcast: no longer leader");
            return 0;
        }

        debug!("Leader starts heartbeat");
        let mut replies = 0;
        for peer in self.registry.others() {
            match self.client.heartbeat(peer).await {
                Ok(reply) => {
                    debug!("Heartbeat reply from {peer}: {}", reply.encode().trim_end());
                    replies += 1;
                }
                Err(e) => {
                    debug!("Heartbeat to {peer} failed: {e}");
                }
            }
        }
        replies
    }
}
