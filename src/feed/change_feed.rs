//! Change feed adapter.
//!
//! Each `subscribe` call opens its own native channel on the collection's
//! table and owns its own active flag, so subscribers never share listener
//! state. Events are decoded through the collection's encoding before the
//! callback sees them. There is no replay: a subscriber sees changes from
//! the moment it subscribed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::event::ChangeEvent;
use crate::catalog::Catalog;
use crate::codec::DocumentCodec;
use crate::repository::{DataError, DataResult};
use crate::store::{ChannelId, RelationalStore, RowChange, RowListener};

/// Opens subscriptions on logical collections.
#[derive(Clone)]
pub struct ChangeFeed {
    store: Arc<dyn RelationalStore>,
    catalog: Arc<Catalog>,
}

impl ChangeFeed {
    pub fn new(store: Arc<dyn RelationalStore>, catalog: Arc<Catalog>) -> Self {
        Self { store, catalog }
    }

    /// Deliver every change on `collection` to `on_event` until the returned
    /// [`Subscription`] is unsubscribed or dropped.
    ///
    /// Changes that cannot be decoded are logged and skipped.
    pub fn subscribe<F>(&self, collection: &str, on_event: F) -> DataResult<Subscription>
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        let descriptor = self.catalog.resolve(collection);
        let active = Arc::new(AtomicBool::new(true));

        let listener: RowListener = {
            let catalog = self.catalog.clone();
            let descriptor = descriptor.clone();
            let active = active.clone();

            Arc::new(move |change: &RowChange| {
                // the store may still hold a reference after unsubscribe
                if !active.load(Ordering::Acquire) {
                    trace!(collection = %descriptor.logical_name, "dropping late change event");
                    return;
                }

                let codec = DocumentCodec::new(catalog.layout(), catalog.translator());
                match ChangeEvent::decode(&codec, &descriptor, change) {
                    Ok(event) => {
                        trace!(collection = %event.collection, kind = %event.kind, "change event");
                        on_event(event);
                    }
                    Err(e) => {
                        warn!(
                            collection = %descriptor.logical_name,
                            table = %change.table,
                            error = %e,
                            "skipping undecodable change event"
                        );
                    }
                }
            })
        };

        let channel = self
            .store
            .subscribe(&descriptor.physical_table, listener)
            .map_err(|e| DataError::from_store(&descriptor.logical_name, e))?;
        debug!(collection = %descriptor.logical_name, table = %descriptor.physical_table, %channel, "subscribed");

        Ok(Subscription {
            store: self.store.clone(),
            channel,
            active,
            closed: AtomicBool::new(false),
            collection: descriptor.logical_name,
        })
    }
}

/// Handle to one open subscription.
///
/// Unsubscribing is idempotent. Dropping the handle unsubscribes.
///
/// Delivery (`active`) and the store channel (`closed`) are tracked apart:
/// delivery stops on the first call, while the channel is only marked closed
/// once the store confirms it, so a failed close can be retried.
#[must_use = "dropping a Subscription closes it immediately"]
pub struct Subscription {
    store: Arc<dyn RelationalStore>,
    channel: ChannelId,
    active: Arc<AtomicBool>,
    closed: AtomicBool,
    collection: String,
}

impl Subscription {
    /// Stop delivery and close the store channel. After this returns the
    /// callback is not invoked again, even for an event the store already
    /// had in flight or when closing the channel fails. A failed close is
    /// retried by the next call.
    pub fn unsubscribe(&self) -> DataResult<()> {
        self.active.store(false, Ordering::Release);
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }

        self.store
            .unsubscribe(self.channel)
            .map_err(|e| DataError::from_store(&self.collection, e))?;
        self.closed.store(true, Ordering::Release);
        debug!(collection = %self.collection, channel = %self.channel, "unsubscribed");
        Ok(())
    }

    /// Whether the store has confirmed the channel is closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Err(e) = self.unsubscribe() {
            warn!(collection = %self.collection, error = %e, "failed to close change channel");
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("collection", &self.collection)
            .field("channel", &self.channel)
            .field("active", &self.is_active())
            .field("closed", &self.is_closed())
            .finish()
    }
}
