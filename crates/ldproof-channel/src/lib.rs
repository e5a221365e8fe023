//! # ldproof channel
//!
//! Append-only anchoring channels. A channel is created locally against a
//! node, bound by submitting a genesis record to a ledger, and then written
//! one immutable anchorage at a time.
//!
//! ## Key Types
//!
//! - [`LedgerTransport`] - The async trait every ledger backend implements
//! - [`UnboundChannel`] / [`AnchoringChannel`] - The channel handle before and after binding
//! - [`ChannelReader`] - Read-only access for verifiers without a bound channel
//! - [`MemoryLedger`] - In-memory ledger for tests
//! - [`SqliteLedger`] - Durable ledger backed by SQLite
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ldproof_channel::{MemoryLedger, UnboundChannel};
//!
//! async fn example() {
//!     let ledger = Arc::new(MemoryLedger::new());
//!     let channel = UnboundChannel::create("https://node.example", ledger)
//!         .unwrap()
//!         .bind()
//!         .await
//!         .unwrap();
//!
//!     let first = channel.first_anchorage_id();
//!     let next = channel.anchor(b"payload", &first).await.unwrap();
//!     let bytes = channel.fetch(&channel.channel_id(), &first).await.unwrap();
//!     assert_eq!(&bytes[..], b"payload");
//!     # let _ = next;
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Exactly-once**: the ledger rejects a second write at an anchorage with
//!   `AnchorageConsumed`; nothing is ever overwritten.
//! - **No retries**: a failed or timed-out submission is reported, never
//!   resubmitted, so a payload cannot be anchored twice by accident.
//! - **Lock-free handles**: channel handles hold immutable identifiers and an
//!   `Arc` to the transport; all serialization happens in the ledger.

pub mod channel;
pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod transport;

pub use channel::{validate_node, AnchoringChannel, ChannelConfig, ChannelReader, UnboundChannel};
pub use error::{ChannelError, Result};
pub use memory::MemoryLedger;
pub use sqlite::SqliteLedger;
pub use transport::{GenesisReceipt, LedgerTransport};
