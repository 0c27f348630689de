//! mz-notify - Materialize SUBSCRIBE to Novu notification relay.
//!
//! ## Architecture
//!
//! A single sequential loop over two Materialize connections:
//! - **Feed connection**: Holds the SUBSCRIBE cursor inside one transaction
//! - **Checkpoint connection**: Autocommit writes of the resume position
//!
//! ## Flow
//!
//! Fetch → decode → transform → resolve recipients → trigger/delete → checkpoint
//!
//! ## Epistemic Design
//!
//! - K_i (Knowledge): Typed change events, content-derived idempotency keys
//! - B_i (Beliefs): Network and storage calls return Result
//! - I^R (Resolvable): Everything operator-tunable lives in `Config`
//! - I^B (Bounded): Crash or stall → exit, restart resumes from checkpoint

pub mod checkpoint;
pub mod client;
pub mod feed;
pub mod models;
pub mod pipeline;

// Re-exports for convenience
pub use checkpoint::{CheckpointBackend, CheckpointStore, FileBackend, MemoryBackend, TableBackend};
pub use client::{DryRunNotifier, Notifier, NovuClient};
pub use feed::{ChangeFeed, SubscribeFeed};
pub use models::{ChangeEvent, Config, NotifyError, Result, STALL_EXIT_CODE};
pub use pipeline::{Dispatcher, Engine, Shutdown};
