use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::raft::{Peer, RaftConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub peers: Vec<PeerConfig>,
    pub election_timeout_min_ms: u64,
    pub election_timeout_max_ms: u64,
    pub heartbeat_interval_ms: u64,
    pub rpc_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerConfig {
    pub host: String,
    pub port: u16,
}

impl From<&PeerConfig> for Peer {
    fn from(peer: &PeerConfig) -> Self {
        Peer::new(&peer.host, peer.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            peers: (5000..=5002)
                .map(|port| PeerConfig {
                    host: "127.0.0.1".to_string(),
                    port,
                })
                .collect(),
            election_timeout_min_ms: 1500,
            election_timeout_max_ms: 3000,
            heartbeat_interval_ms: 500,
            rpc_timeout_ms: 300,
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Replaces the registry with a comma-separated `host:port` list.
    pub fn set_peers(&mut self, list: &str) -> Result<()> {
        let mut peers = Vec::new();
        for item in list.split(',').filter(|s| !s.trim().is_empty()) {
            let peer: Peer = item.parse()?;
            peers.push(PeerConfig {
                host: peer.host,
                port: peer.port,
            });
        }
        self.peers = peers;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.peers.is_empty() {
            bail!("peer list is empty");
        }
        if self.heartbeat_interval_ms == 0 {
            bail!("heartbeat_interval_ms must be positive");
        }
        if self.rpc_timeout_ms == 0 {
            bail!("rpc_timeout_ms must be positive");
        }
        if self.election_timeout_min_ms >= self.election_timeout_max_ms {
            bail!(
                "election_timeout_min_ms ({}) must be below election_timeout_max_ms ({})",
                self.election_timeout_min_ms,
                self.election_timeout_max_ms
            );
        }
        let local = self.local_peer();
        let listed = self.peers.iter().any(|p| Peer::from(p) == local);
        if !listed {
            if let Some(alias) = self.peers.iter().find(|p| p.port == self.port) {
                bail!(
                    "local address {} is not in the peer list, but {}:{} uses the same port; \
                     set host to match the peer list",
                    local,
                    alias.host,
                    alias.port
                );
            }
        }
        Ok(())
    }

    pub fn local_peer(&self) -> Peer {
        Peer::new(&self.host, self.port)
    }

    /// Runtime view of this config. The local address is always part of the
    /// registry, even if the peer list omits it.
    pub fn to_raft_config(&self) -> RaftConfig {
        let mut config = RaftConfig::new(self.local_peer());
        config.peers = self.peers.iter().map(Peer::from).collect();
        config.add_peer(self.local_peer());
        config.election_timeout_min = self.election_timeout_min_ms;
        config.election_timeout_max = self.election_timeout_max_ms;
        config.heartbeat_interval = self.heartbeat_interval_ms;
        config.rpc_timeout = self.rpc_timeout_ms;
        config
    }
}
