use std::time::Duration;

use super::{Peer, RaftError};

#[derive(Debug, Clone)]
pub struct RaftConfig {
    pub local: Peer,
    pub peers: Vec<Peer>, // full registry, self included
    pub election_timeout_min: u64, // in milliseconds, inclusive
    pub election_timeout_max: u64, // in milliseconds, exclusive
    pub heartbeat_interval: u64,   // in milliseconds
    pub rpc_timeout: u64,          // in milliseconds, per peer exchange
}

impl RaftConfig {
    pub fn new(local: Peer) -> Self {
        Self {
            peers: vec![local.clone()],
            local,
            election_timeout_min: 1500,
            election_timeout_max: 3000,
            heartbeat_interval: 500,
            rpc_timeout: 300,
        }
    }

    pub fn add_peer(&mut self, peer: Peer) {
        if !self.peers.contains(&peer) {
            self.peers.push(peer);
        }
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout)
    }

    pub fn validate(&self) -> Result<(), RaftError> {
        if self.election_timeout_min >= self.election_timeout_max {
            return Err(RaftError::InvalidConfig(format!(
                "election timeout range [{}, {}) is empty",
                self.election_timeout_min, self.election_timeout_max
            )));
        }
        if self.heartbeat_interval == 0 {
            return Err(RaftError::InvalidConfig(
                "heartbeat interval must be positive".to_string(),
            ));
        }
        if self.rpc_timeout == 0 {
            return Err(RaftError::InvalidConfig(
                "rpc timeout must be positive".to_string(),
            ));
        }
        if !self.peers.contains(&self.local) {
            return Err(RaftError::InvalidConfig(format!(
                "local address {} is not in the peer registry",
                self.local
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> Peer {
        Peer::new("127.0.0.1", 5000)
    }

    #[test]
    fn new_config_contains_self_and_default_timings() {
        let cfg = RaftConfig::new(local());
        assert_eq!(cfg.peers, vec![local()]);
        assert_eq!(cfg.election_timeout_min, 1500);
        assert_eq!(cfg.election_timeout_max, 3000);
        assert_eq!(cfg.heartbeat_interval(), Duration::from_millis(500));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn add_peer_ignores_duplicates() {
        let mut cfg = RaftConfig::new(local());
        cfg.add_peer(Peer::new("127.0.0.1", 5001));
        cfg.add_peer(Peer::new("127.0.0.1", 5001));
        cfg.add_peer(local());
        assert_eq!(cfg.peers.len(), 2);
    }

    #[test]
    fn validate_rejects_inverted_timeouts() {
        let mut cfg = RaftConfig::new(local());
        cfg.election_timeout_min = 3000;
        cfg.election_timeout_max = 1500;
        assert!(matches!(cfg.validate(), Err(RaftError::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_registry_without_self() {
        let mut cfg = RaftConfig::new(local());
        cfg.peers = vec![Peer::new("127.0.0.1", 5001)];
        assert!(matches!(cfg.validate(), Err(RaftError::InvalidConfig(_))));
    }
}
