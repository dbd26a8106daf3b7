//! Typed publish/subscribe registry for decoded server events.
//!
//! Callbacks are keyed by [`EventKind`]; several subscribers may share a
//! kind, and each fires synchronously within the dispatch call (order among
//! them unspecified). Registrations live until their token is unsubscribed
//! or the owning connection tears the registry down, so nothing leaks past
//! a disconnect.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use wire::{EventKind, ServerEvent};

type Callback = Arc<dyn Fn(&ServerEvent) + Send + Sync>;

/// Handle returned by [`Dispatcher::subscribe`]; pass back to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

#[derive(Default)]
struct Registry {
    next_token: u64,
    subscribers: HashMap<EventKind, Vec<(SubscriptionToken, Callback)>>,
}

/// Tag-keyed callback registry.
#[derive(Default)]
pub struct Dispatcher {
    inner: Mutex<Registry>,
}

impl Dispatcher {
    /// Register a callback for one event kind.
    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&ServerEvent) + Send + Sync + 'static,
    ) -> SubscriptionToken {
        let mut registry = self.inner.lock();
        registry.next_token += 1;
        let token = SubscriptionToken(registry.next_token);
        registry
            .subscribers
            .entry(kind)
            .or_default()
            .push((token, Arc::new(callback)));
        token
    }

    /// Remove one registration. Unknown tokens are ignored.
    pub fn unsubscribe(&self, token: SubscriptionToken) {
        let mut registry = self.inner.lock();
        for subscribers in registry.subscribers.values_mut() {
            subscribers.retain(|(candidate, _)| *candidate != token);
        }
    }

    /// Drop every registration.
    pub fn clear(&self) {
        self.inner.lock().subscribers.clear();
    }

    /// Invoke every subscriber registered for the event's kind.
    ///
    /// The registry lock is released before callbacks run, so a callback may
    /// subscribe or unsubscribe without deadlocking; such changes take effect
    /// from the next dispatch.
    pub fn dispatch(&self, event: &ServerEvent) {
        let callbacks: Vec<Callback> = {
            let registry = self.inner.lock();
            registry
                .subscribers
                .get(&event.kind())
                .map(|subscribers| {
                    subscribers
                        .iter()
                        .map(|(_, callback)| Arc::clone(callback))
                        .collect()
                })
                .unwrap_or_default()
        };
        for callback in callbacks {
            callback(event);
        }
    }
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
