//! Change feed module.
//!
//! Provides:
//! - `connect`: Materialize connections (TLS or plain)
//! - `decode_row`: Raw positional rows → typed `ChangeEvent`
//! - `ChangeFeed` / `SubscribeFeed`: The polling SUBSCRIBE cursor

mod connect;
mod decode;
mod subscribe;

pub use connect::*;
pub use decode::*;
pub use subscribe::*;
