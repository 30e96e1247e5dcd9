use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    Follower,
    Candidate,
    Leader,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Follower => write!(f, "follower"),
            NodeRole::Candidate => write!(f, "candidate"),
            NodeRole::Leader => write!(f, "leader"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeState {
    pub role: NodeRole,
    pub round: u64,
    // Whether a vote (including the implicit self-vote) was cast in `round`.
    pub voted_this_round: bool,
    // Only meaningful while `electing` is true.
    pub votes_received: usize,
    pub electing: bool,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            role: NodeRole::Follower,
            round: 0,
            voted_this_round: false,
            votes_received: 0,
            electing: false,
        }
    }
}

/// Outcome of a single election attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectionOutcome {
    Won,
    Lost,
    /// The node stopped being a candidate before the tally, e.g. a heartbeat
    /// from another leader demoted it mid-election.
    Aborted,
}
