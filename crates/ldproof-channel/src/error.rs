//! Error types for the channel module.

use ldproof_core::{AnchorageId, ChannelId, CoreError};
use thiserror::Error;

/// Errors that can occur during channel and ledger operations.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The node configuration is malformed.
    #[error("invalid node: {0}")]
    InvalidNode(String),

    /// The ledger could not be reached or refused the submission.
    #[error("transport error: {0}")]
    Transport(String),

    /// Something was already anchored at this anchorage.
    #[error("anchorage {anchorage_id} of channel {channel_id} is already consumed")]
    AnchorageConsumed {
        channel_id: ChannelId,
        anchorage_id: AnchorageId,
    },

    /// The ledger has never seen this channel.
    #[error("channel not found: {0}")]
    ChannelNotFound(ChannelId),

    /// The anchorage was never issued or nothing was anchored there.
    #[error("anchorage {anchorage_id} of channel {channel_id} not found")]
    AnchorageNotFound {
        channel_id: ChannelId,
        anchorage_id: AnchorageId,
    },

    /// A submission was cancelled before the ledger answered; it may or may
    /// not have been committed.
    #[error("outcome unknown for channel {channel_id:?} anchorage {anchorage_id:?}")]
    Indeterminate {
        channel_id: Option<ChannelId>,
        anchorage_id: Option<AnchorageId>,
    },

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Malformed data read back from a ledger.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl ChannelError {
    /// True for both "channel unknown" and "nothing at this anchorage".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ChannelError::ChannelNotFound(_) | ChannelError::AnchorageNotFound { .. }
        )
    }
}

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;
