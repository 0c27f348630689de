//! Notification client module.

mod notifier;
mod novu;

pub use notifier::*;
pub use novu::*;
