mod config;
mod election;
mod error;
mod heartbeat;
mod node;
mod peer;
mod state;
mod timer;

pub use self::config::RaftConfig;
pub use self::election::ElectionCoordinator;
pub use self::error::RaftError;
pub use self::heartbeat::HeartbeatBroadcaster;
pub use self::node::{has_quorum, RaftNode};
pub use self::peer::{Peer, PeerRegistry};
pub use self::state::{ElectionOutcome, NodeRole, NodeState};
pub use self::timer::{
    election_timer_channel, random_election_timeout, ElectionTimer, HeartbeatTimer, TimerHandle,
};

use std::sync::Arc;

use ::log::{error, info};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::network::{PeerClient, PeerServer};

// Main election service
pub struct Raft {
    pub node: Arc<Mutex<RaftNode>>,
    config: RaftConfig,
    registry: Arc<PeerRegistry>,
}

/// Handles of the tasks spawned by [`Raft::start`].
pub struct RaftTasks {
    handles: Vec<JoinHandle<()>>,
}

impl RaftTasks {
    /// Stops every task of the node. Election state stays in memory.
    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }

    /// Waits for the tasks; they only return if aborted or panicked.
    pub async fn wait(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    error!("Election task panicked: {e}");
                }
            }
        }
    }
}

impl Raft {
    pub fn new(config: RaftConfig) -> Result<Self, RaftError> {
        config.validate()?;
        let registry = PeerRegistry::new(config.local.clone(), config.peers.clone())?;
        let node = RaftNode::new(&config.local.addr, registry.len());

        Ok(Self {
            node: Arc::new(Mutex::new(node)),
            config,
            registry: Arc::new(registry),
        })
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    /// Spawns both timers, the election coordinator, the heartbeat
    /// broadcaster and the peer listener on `listener`.
    pub fn start(&self, listener: TcpListener) -> RaftTasks {
        let client = PeerClient::new(self.config.rpc_timeout());
        let (timer_handle, resets) = election_timer_channel();
        let (election_tx, election_rx) = mpsc::channel(1);
        let (heartbeat_tx, heartbeat_rx) = mpsc::channel(1);

        info!(
            "Starting node {} in a cluster of {}",
            self.registry.local(),
            self.registry.len()
        );

        let coordinator = ElectionCoordinator::new(
            Arc::clone(&self.node),
            Arc::clone(&self.registry),
            client.clone(),
        );
        let broadcaster = HeartbeatBroadcaster::new(
            Arc::clone(&self.node),
            Arc::clone(&self.registry),
            client,
        );
        let election_timer = ElectionTimer::new(
            Arc::clone(&self.node),
            resets,
            election_tx,
            self.config.election_timeout_min,
            self.config.election_timeout_max,
        );
        let heartbeat_timer = HeartbeatTimer::new(
            Arc::clone(&self.node),
            heartbeat_tx,
            self.config.heartbeat_interval(),
        );
        let server = PeerServer::new(
            Arc::clone(&self.node),
            timer_handle,
            self.config.rpc_timeout(),
        );

        let handles = vec![
            tokio::spawn(coordinator.run(election_rx)),
            tokio::spawn(broadcaster.run(heartbeat_rx)),
            tokio::spawn(election_timer.run()),
            tokio::spawn(heartbeat_timer.run()),
            tokio::spawn(server.serve(listener)),
        ];

        RaftTasks { handles }
    }
}
