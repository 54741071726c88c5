use std::sync::Arc;
use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use orchestrator_core::config::PeerServerConfig;
use tracing::{info, warn};

use crate::transport::{PeerTransport, ToolSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Connected,
    Disconnected,
}

/// One connected (or known-but-unreachable) peer server.
pub struct Peer {
    name: String,
    liveness: Liveness,
    tools: Vec<ToolSpec>,
    transport: Arc<dyn PeerTransport>,
    registered_at: DateTime<Utc>,
}

impl Peer {
    pub fn connected(
        name: impl Into<String>,
        tools: Vec<ToolSpec>,
        transport: Arc<dyn PeerTransport>,
    ) -> Self {
        Self {
            name: name.into(),
            liveness: Liveness::Connected,
            tools,
            transport,
            registered_at: Utc::now(),
        }
    }

    pub fn disconnected(name: impl Into<String>, transport: Arc<dyn PeerTransport>) -> Self {
        Self {
            name: name.into(),
            liveness: Liveness::Disconnected,
            tools: Vec::new(),
            transport,
            registered_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness
    }

    pub fn is_connected(&self) -> bool {
        self.liveness == Liveness::Connected
    }

    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    pub fn transport(&self) -> Arc<dyn PeerTransport> {
        Arc::clone(&self.transport)
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("name", &self.name)
            .field("liveness", &self.liveness)
            .field("tools", &self.tools.len())
            .finish()
    }
}

/// Process-wide set of peers, keyed by advertised name.
///
/// Registration and removal are serialized behind a write lock; lookups and
/// listings take the shared lock and never block each other.
pub struct PeerRegistry {
    peers: RwLock<Vec<Arc<Peer>>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self {
            peers: RwLock::new(Vec::new()),
        }
    }

    /// Adds a peer, replacing any existing peer with the same name. The
    /// replaced peer keeps its original registration slot so listing order
    /// stays stable across reconnects.
    pub fn register(&self, peer: Peer) {
        let peer = Arc::new(peer);
        let mut peers = self.peers.write().unwrap();
        match peers.iter().position(|p| p.name() == peer.name()) {
            Some(slot) => peers[slot] = peer,
            None => peers.push(peer),
        }
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Peer>> {
        let mut peers = self.peers.write().unwrap();
        let slot = peers.iter().position(|p| p.name() == name)?;
        Some(peers.remove(slot))
    }

    pub fn peer_by_name(&self, name: &str) -> Option<Arc<Peer>> {
        let peers = self.peers.read().unwrap();
        peers.iter().find(|p| p.name() == name).cloned()
    }

    /// All peers in registration order, Disconnected ones included.
    pub fn list_peers(&self) -> Vec<Arc<Peer>> {
        self.peers.read().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.peers.read().unwrap().len()
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Performs the capability-discovery handshake against one configured peer.
///
/// Discovery failure or timeout yields a Disconnected peer under the
/// configured name; registration itself never fails.
pub async fn connect_peer(
    config: &PeerServerConfig,
    transport: Arc<dyn PeerTransport>,
    timeout: Duration,
) -> Peer {
    match tokio::time::timeout(timeout, transport.discover()).await {
        Ok(Ok(info)) => {
            if info.name != config.name {
                info!(
                    configured = %config.name,
                    advertised = %info.name,
                    "peer advertises a different name; using the advertised one"
                );
            }
            info!(peer = %info.name, tools = info.tools.len(), "peer connected");
            Peer::connected(info.name, info.tools, transport)
        }
        Ok(Err(e)) => {
            warn!(peer = %config.name, error = %e, "peer discovery failed");
            Peer::disconnected(config.name.clone(), transport)
        }
        Err(_) => {
            warn!(peer = %config.name, "peer discovery timed out");
            Peer::disconnected(config.name.clone(), transport)
        }
    }
}
