use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::RaftError;

/// Address of a cluster participant. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Peer {
    pub host: String,
    pub port: u16,
    pub addr: String, // dial string, "host:port"
}

impl Peer {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            addr: format!("{host}:{port}"),
        }
    }
}

impl FromStr for Peer {
    type Err = RaftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| RaftError::InvalidPeer(s.to_string()))?;
        if host.is_empty() {
            return Err(RaftError::InvalidPeer(s.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| RaftError::InvalidPeer(s.to_string()))?;
        Ok(Peer::new(host, port))
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.addr)
    }
}

/// Static list of cluster members, self included.
#[derive(Debug, Clone)]
pub struct PeerRegistry {
    local: Peer,
    peers: Vec<Peer>,
}

impl PeerRegistry {
    pub fn new(local: Peer, peers: Vec<Peer>) -> Result<Self, RaftError> {
        if !peers.contains(&local) {
            return Err(RaftError::InvalidConfig(format!(
                "local address {local} is not in the peer registry"
            )));
        }
        Ok(Self { local, peers })
    }

    pub fn local(&self) -> &Peer {
        &self.local
    }

    /// Every registered peer except self, in registry order.
    pub fn others(&self) -> impl Iterator<Item = &Peer> {
        self.peers.iter().filter(move |p| **p != self.local)
    }

    /// Total cluster size, self included. Quorum is computed against this.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
