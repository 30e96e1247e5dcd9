use ::log::{debug, error, info};

use super::{ElectionOutcome, NodeRole, NodeState};

/// Returns true when `granted` votes from other peers, plus the implicit
/// self-vote, form a strict majority of `cluster_size`.
pub fn has_quorum(granted: usize, cluster_size: usize) -> bool {
    (granted + 1) * 2 > cluster_size
}

/// A single node's view of the election: role, round and vote ledger.
///
/// All methods are synchronous; callers share the node behind one mutex and
/// never hold the guard across network I/O.
pub struct RaftNode {
    // Node identity, used in log lines only
    id: String,

    // Total number of registered peers, self included
    cluster_size: usize,

    state: NodeState,
}

impl RaftNode {
    pub fn new(id: &str, cluster_size: usize) -> Self {
        Self {
            id: id.to_string(),
            cluster_size,
            state: NodeState::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn role(&self) -> NodeRole {
        self.state.role
    }

    pub fn round(&self) -> u64 {
        self.state.round
    }

    pub fn is_leader(&self) -> bool {
        matches!(self.state.role, NodeRole::Leader)
    }

    pub fn change_role(&mut self, role: NodeRole) {
        info!(
            "Node {} becomes {} (round {})",
            self.id, role, self.state.round
        );
        self.state.role = role;
    }

    /// Called when the election countdown elapses. Returns true when an
    /// election should be started; the node is then already Candidate and
    /// marked as electing.
    pub fn on_election_timeout(&mut self) -> bool {
        if self.is_leader() || self.state.electing {
            debug!(
                "Node {} ignores election timeout (role={}, electing={})",
                self.id, self.state.role, self.state.electing
            );
            return false;
        }

        self.state.electing = true;
        self.change_role(NodeRole::Candidate);
        true
    }

    /// Opens a new election attempt and returns its round. Returns `None`
    /// when the round counter is exhausted; the node then settles as
    /// Follower instead of starting an election.
    pub fn begin_election(&mut self) -> Option<u64> {
        let round = match self.state.round.checked_add(1) {
            Some(round) => round,
            None => {
                error!(
                    "Node {} cannot start an election: round {} is exhausted",
                    self.id, self.state.round
                );
                self.state.electing = false;
                if self.state.role == NodeRole::Candidate {
                    self.change_role(NodeRole::Follower);
                }
                return None;
            }
        };

        self.state.votes_received = 0;
        self.state.round = round;
        // The implicit self-vote is this round's vote
        self.state.voted_this_round = true;
        self.state.electing = true;

        info!("Node {} starts election for round {}", self.id, self.state.round);
        Some(self.state.round)
    }

    /// Counts a granted vote for the election running in `round`.
    pub fn record_vote(&mut self, round: u64) {
        if !self.state.electing || round != self.state.round {
            debug!(
                "Node {} ignores stale vote for round {} (current round {})",
                self.id, round, self.state.round
            );
            return;
        }
        self.state.votes_received += 1;
    }

    /// Closes the election attempt for `round`, promoting to Leader on quorum
    /// and reverting a losing candidate to Follower.
    pub fn finish_election(&mut self, round: u64) -> ElectionOutcome {
        self.state.electing = false;

        if self.state.role != NodeRole::Candidate {
            info!(
                "Node {} abandons election for round {}: now {}",
                self.id, round, self.state.role
            );
            return ElectionOutcome::Aborted;
        }

        let current = round == self.state.round;
        if current && has_quorum(self.state.votes_received, self.cluster_size) {
            info!(
                "Node {} won round {} with {} of {} votes",
                self.id,
                round,
                self.state.votes_received + 1,
                self.cluster_size
            );
            self.change_role(NodeRole::Leader);
            return ElectionOutcome::Won;
        }

        info!(
            "Node {} lost round {} with {} of {} votes",
            self.id,
            round,
            if current { self.state.votes_received + 1 } else { 0 },
            self.cluster_size
        );
        self.change_role(NodeRole::Follower);
        ElectionOutcome::Lost
    }

    /// Decides a vote request carrying `round`. A node grants at most one vote
    /// per round, a higher round always clears the ledger, and a Leader never
    /// grants.
    pub fn can_vote(&mut self, round: u64) -> bool {
        if self.is_leader() {
            if round > self.state.round {
                self.state.round = round;
                self.state.voted_this_round = false;
            }
            return false;
        }

        if round > self.state.round {
            self.state.round = round;
            self.state.voted_this_round = true;
            return true;
        }

        if round == self.state.round && !self.state.voted_this_round {
            self.state.voted_this_round = true;
            return true;
        }

        false
    }

    /// Applies a heartbeat from the current leader.
    pub fn handle_heartbeat(&mut self) {
        if self.state.role != NodeRole::Follower {
            self.change_role(NodeRole::Follower);
        }
    }
}
