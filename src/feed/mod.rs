//! Live change subscriptions on logical collections.

mod change_feed;
mod event;

pub use change_feed::{ChangeFeed, Subscription};
pub use event::{ChangeEvent, ChangeKind};
