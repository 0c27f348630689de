//! Pipeline module: from decoded change events to notification calls.
//!
//! Provides:
//! - `Transformer`: Positional columns → named payload + idempotency key
//! - `RecipientResolver`: Payload column and static list → recipient set
//! - `Dispatcher`: Trigger/delete decision and checkpoint advance
//! - `StallMonitor`: Liveness check on the feed
//! - `Engine`: The fetch loop tying it together

mod dispatcher;
mod engine;
mod recipients;
mod stall;
mod transform;

pub use dispatcher::*;
pub use engine::*;
pub use recipients::*;
pub use stall::*;
pub use transform::*;
