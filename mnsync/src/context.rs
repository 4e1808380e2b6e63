use std::net::SocketAddr;
use std::time::Duration;

use dash_sml::Network;

/// Per-operation settings threaded through diff processing.
///
/// A context is cheap to build and is constructed fresh for every apply,
/// so per-payload facts (peer, payload shape) never leak between
/// operations.
#[derive(Debug, Clone)]
pub struct ProcessingContext {
    pub network: Network,
    /// The peer that supplied the payload, for logging and penalties.
    pub peer: Option<SocketAddr>,
    /// Whether a backup provider may be consulted for block data the
    /// chain state misses.
    pub use_fallback_backup: bool,
    /// The payload was loaded from a local snapshot rather than received
    /// from the network.
    pub is_snapshot_sourced: bool,
    /// The payload carries rotation (qrinfo) data.
    pub is_rotating_quorum_format: bool,
    /// Upper bound on a single backup lookup.
    pub lookup_timeout: Duration,
}

impl ProcessingContext {
    const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn for_network(network: Network) -> Self {
        ProcessingContext {
            network,
            peer: None,
            use_fallback_backup: false,
            is_snapshot_sourced: false,
            is_rotating_quorum_format: false,
            lookup_timeout: Self::DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn with_fallback_backup(mut self) -> Self {
        self.use_fallback_backup = true;
        self
    }

    pub fn snapshot_sourced(mut self) -> Self {
        self.is_snapshot_sourced = true;
        self
    }

    pub fn rotating_quorum_format(mut self) -> Self {
        self.is_rotating_quorum_format = true;
        self
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }
}
