//! Async masternode list synchronization.
//!
//! This crate drives network payloads into the [`dash_sml`] verification
//! core: it resolves block heights and coinbase-asserted merkle roots
//! through the embedder's chain state (falling back to a backup provider
//! under a bounded wait), serializes diff application per chain, and
//! exposes the committed lists, quorums and chain-lock store behind a
//! manager with a small read surface.

pub mod backup;
pub mod chain_state;
pub mod context;
pub mod error;
pub mod fallback;
pub mod logging;
pub mod manager;

pub use backup::{BackupBlockInfo, BackupDataProvider, BackupError};
pub use chain_state::{AssertedBlockRoots, ChainStateAccessor};
pub use context::ProcessingContext;
pub use error::ProcessDiffError;
pub use fallback::FallbackCoordinator;
pub use logging::{init_logging, LoggingConfig};
pub use manager::MasternodeListManager;
