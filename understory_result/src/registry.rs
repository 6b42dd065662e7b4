// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registry implementation.
//!
//! ## Overview
//!
//! Holds results that nobody has picked up yet and the listeners that are waiting for results.
//! Whichever side arrives second triggers delivery.
//!
//! ## Routing
//!
//! - [`ResultRegistry::set_result`] checks listeners first. With at least one listener for the
//!   key, every listener receives the payload and nothing is stored. With none, the payload is
//!   stored, replacing any earlier payload for that key.
//! - [`ResultRegistry::register_listener`] checks pending results first. A pending payload is
//!   removed and handed to the new listener, which is then *not* stored. Otherwise the
//!   listener is stored until [`ResultRegistry::unregister_listener`].
//!
//! A key is therefore never pending and listened to at the same time, and each payload is
//! delivered at most once from the pending store.
//!
//! ## Two-phase use
//!
//! [`ResultRegistry::route_result`] and [`ResultRegistry::attach_listener`] update the maps
//! and return a [`Delivery`] instead of calling anything. Call [`Delivery::dispatch`] once the
//! registry is no longer borrowed; this is how [`ResultOwner`](crate::owner::ResultOwner) lets a
//! listener set a result for another key from inside its callback.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use crate::types::{Listener, Payload, PendingResults};

/// Rendezvous store between result producers and result listeners.
///
/// `I` is the subscriber identity. It tells apart listeners registered for the same request
/// key from different places in the UI tree; see [`CallSite`](crate::types::CallSite).
///
/// ## Usage
///
/// - Construct with [`ResultRegistry::new`], or with [`ResultRegistry::from_pending`] after a
///   rebuild.
/// - Producers call [`ResultRegistry::set_result`].
/// - Consumers call [`ResultRegistry::register_listener`] when they appear and
///   [`ResultRegistry::unregister_listener`] when they go away.
/// - Save [`ResultRegistry::pending_snapshot`] before a rebuild. Listeners are never saved.
pub struct ResultRegistry<I> {
    pending: PendingResults,
    listeners: BTreeMap<String, BTreeMap<I, Listener>>,
}

impl<I: core::fmt::Debug> core::fmt::Debug for ResultRegistry<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let listeners: BTreeMap<&str, Vec<&I>> = self
            .listeners
            .iter()
            .map(|(key, by_subscriber)| (key.as_str(), by_subscriber.keys().collect()))
            .collect();
        f.debug_struct("ResultRegistry")
            .field("pending", &self.pending)
            .field("listeners", &listeners)
            .finish()
    }
}

impl<I> Default for ResultRegistry<I> {
    fn default() -> Self {
        Self {
            pending: PendingResults::new(),
            listeners: BTreeMap::new(),
        }
    }
}

impl<I: Ord + core::fmt::Debug> ResultRegistry<I> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry whose pending results come from a saved snapshot.
    ///
    /// No listeners are restored; consumers register again when they reappear.
    pub fn from_pending(pending: PendingResults) -> Self {
        tracing::debug!(pending = pending.len(), "restoring result registry");
        Self {
            pending,
            listeners: BTreeMap::new(),
        }
    }

    /// Copy out the pending results for the host's save hook.
    pub fn pending_snapshot(&self) -> PendingResults {
        self.pending.clone()
    }

    /// Deliver `payload` to every listener for `request_key`, or store it if there are none.
    pub fn set_result(&mut self, request_key: impl Into<String>, payload: Payload) {
        if let Some(delivery) = self.route_result(request_key, payload) {
            delivery.dispatch();
        }
    }

    /// Register `listener` for `request_key` under `subscriber`.
    ///
    /// If a result is already pending for the key it is removed and passed to `listener`
    /// right away, and the listener is not kept.
    pub fn register_listener(
        &mut self,
        request_key: impl Into<String>,
        subscriber: I,
        listener: Listener,
    ) {
        if let Some(delivery) = self.attach_listener(request_key, subscriber, listener) {
            delivery.dispatch();
        }
    }

    /// Remove the listener registered for `request_key` under `subscriber`.
    ///
    /// Returns whether a listener was removed. Removing something that is not registered,
    /// including a listener that was never stored because it consumed a pending result, is a
    /// no-op.
    pub fn unregister_listener(&mut self, request_key: &str, subscriber: &I) -> bool {
        let Some(by_subscriber) = self.listeners.get_mut(request_key) else {
            return false;
        };
        let removed = by_subscriber.remove(subscriber).is_some();
        if by_subscriber.is_empty() {
            self.listeners.remove(request_key);
        }
        if removed {
            tracing::trace!(request_key, ?subscriber, "listener removed");
        }
        removed
    }

    /// Route a result without invoking anything.
    ///
    /// Returns the delivery to dispatch when listeners exist, or `None` when the payload was
    /// stored as pending.
    pub fn route_result(
        &mut self,
        request_key: impl Into<String>,
        payload: Payload,
    ) -> Option<Delivery> {
        let request_key = request_key.into();
        if let Some(by_subscriber) = self.listeners.get(&request_key)
            && !by_subscriber.is_empty()
        {
            tracing::trace!(
                request_key = %request_key,
                listeners = by_subscriber.len(),
                "delivering result to listeners"
            );
            return Some(Delivery {
                listeners: by_subscriber.values().cloned().collect(),
                request_key,
                payload,
            });
        }

        if self.pending.insert(request_key.clone(), payload).is_some() {
            tracing::debug!(request_key = %request_key, "replaced unconsumed pending result");
        } else {
            tracing::debug!(request_key = %request_key, "no listener, result kept pending");
        }
        None
    }

    /// Attach a listener without invoking anything.
    ///
    /// Returns a delivery of the pending result to `listener` if one was waiting (the listener
    /// is then not stored), or `None` when the listener was stored.
    pub fn attach_listener(
        &mut self,
        request_key: impl Into<String>,
        subscriber: I,
        listener: Listener,
    ) -> Option<Delivery> {
        let request_key = request_key.into();
        if let Some(payload) = self.pending.take(&request_key) {
            tracing::debug!(
                request_key = %request_key,
                ?subscriber,
                "pending result consumed by new listener"
            );
            return Some(Delivery {
                listeners: vec![listener],
                request_key,
                payload,
            });
        }

        tracing::trace!(request_key = %request_key, ?subscriber, "listener registered");
        self.listeners
            .entry(request_key)
            .or_default()
            .insert(subscriber, listener);
        None
    }

    /// Returns `true` if a result is pending for `request_key`.
    pub fn has_pending(&self, request_key: &str) -> bool {
        self.pending.contains(request_key)
    }

    /// Number of pending results across all keys.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of live listeners for `request_key`.
    pub fn listener_count(&self, request_key: &str) -> usize {
        self.listeners.get(request_key).map_or(0, BTreeMap::len)
    }

    /// Returns `true` if `subscriber` is listening on `request_key`.
    pub fn is_listening(&self, request_key: &str, subscriber: &I) -> bool {
        self.listeners
            .get(request_key)
            .is_some_and(|by_subscriber| by_subscriber.contains_key(subscriber))
    }

    /// Returns `true` if nothing is pending and nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.listeners.is_empty()
    }
}

/// A routed result waiting to be handed to its listeners.
///
/// Produced by [`ResultRegistry::route_result`] and [`ResultRegistry::attach_listener`].
#[must_use = "a delivery does nothing until it is dispatched"]
pub struct Delivery {
    request_key: String,
    payload: Payload,
    listeners: Vec<Listener>,
}

impl core::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Delivery")
            .field("request_key", &self.request_key)
            .field("payload", &self.payload)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Delivery {
    /// Request key the payload was set for.
    pub fn request_key(&self) -> &str {
        &self.request_key
    }

    /// The payload being delivered.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Number of listeners that will be called.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns `true` if no listener will be called.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Call every listener with the payload, in subscriber order.
    pub fn dispatch(self) {
        for listener in &self.listeners {
            listener(&self.payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::RefCell;

    type Log = Rc<RefCell<Vec<(u32, Payload)>>>;

    fn recorder(log: &Log, tag: u32) -> Listener {
        let log = log.clone();
        Rc::new(move |p: &Payload| log.borrow_mut().push((tag, p.clone())))
    }

    fn payload(bytes: &[u8]) -> Payload {
        Payload::from(bytes)
    }

    #[test]
    fn pending_result_is_consumed_by_later_listener() {
        let log: Log = Rc::default();
        let mut registry = ResultRegistry::<u32>::new();
        registry.set_result("k", payload(&[1]));
        assert!(registry.has_pending("k"));

        registry.register_listener("k", 7, recorder(&log, 7));
        assert_eq!(*log.borrow(), vec![(7, payload(&[1]))]);
        assert!(!registry.has_pending("k"));
        // Consumed listeners are not stored.
        assert!(!registry.is_listening("k", &7));
        assert!(registry.is_empty());
    }

    #[test]
    fn live_listener_receives_result_without_storing() {
        let log: Log = Rc::default();
        let mut registry = ResultRegistry::<u32>::new();
        registry.register_listener("k", 1, recorder(&log, 1));
        assert!(log.borrow().is_empty());

        registry.set_result("k", payload(&[9]));
        assert_eq!(*log.borrow(), vec![(1, payload(&[9]))]);
        assert_eq!(registry.pending_len(), 0);
        assert!(registry.is_listening("k", &1));
    }

    #[test]
    fn second_set_overwrites_unconsumed_result() {
        let log: Log = Rc::default();
        let mut registry = ResultRegistry::<u32>::new();
        registry.set_result("k", payload(&[1]));
        registry.set_result("k", payload(&[2]));
        assert_eq!(registry.pending_len(), 1);

        registry.register_listener("k", 1, recorder(&log, 1));
        assert_eq!(*log.borrow(), vec![(1, payload(&[2]))]);
    }

    #[test]
    fn unregister_after_auto_consume_is_noop() {
        let log: Log = Rc::default();
        let mut registry = ResultRegistry::<u32>::new();
        registry.set_result("k", payload(&[1]));
        registry.register_listener("k", 1, recorder(&log, 1));

        assert!(!registry.unregister_listener("k", &1));
        assert!(!registry.unregister_listener("never", &99));
        assert!(registry.is_empty());
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn all_listeners_for_key_receive_result() {
        let log: Log = Rc::default();
        let mut registry = ResultRegistry::<u32>::new();
        registry.register_listener("k", 2, recorder(&log, 2));
        registry.register_listener("k", 1, recorder(&log, 1));
        registry.register_listener("other", 3, recorder(&log, 3));
        assert_eq!(registry.listener_count("k"), 2);

        registry.set_result("k", payload(&[5]));
        let mut got = log.borrow().clone();
        got.sort_by_key(|(tag, _)| *tag);
        assert_eq!(got, vec![(1, payload(&[5])), (2, payload(&[5]))]);
        assert_eq!(registry.pending_len(), 0);
    }

    #[test]
    fn unregistered_listener_no_longer_receives() {
        let log: Log = Rc::default();
        let mut registry = ResultRegistry::<u32>::new();
        registry.register_listener("k", 1, recorder(&log, 1));
        assert!(registry.unregister_listener("k", &1));
        assert_eq!(registry.listener_count("k"), 0);

        registry.set_result("k", payload(&[3]));
        assert!(log.borrow().is_empty());
        assert!(registry.has_pending("k"));
    }

    #[test]
    fn same_identity_replaces_listener() {
        let log: Log = Rc::default();
        let mut registry = ResultRegistry::<u32>::new();
        registry.register_listener("k", 1, recorder(&log, 10));
        registry.register_listener("k", 1, recorder(&log, 20));
        assert_eq!(registry.listener_count("k"), 1);

        registry.set_result("k", payload(&[1]));
        assert_eq!(*log.borrow(), vec![(20, payload(&[1]))]);
    }

    #[test]
    fn snapshot_restores_pending_but_not_listeners() {
        let log: Log = Rc::default();
        let mut registry = ResultRegistry::<u32>::new();
        registry.set_result("k", payload(&[4]));
        registry.register_listener("other", 1, recorder(&log, 1));

        let snapshot = registry.pending_snapshot();
        drop(registry);

        let mut restored = ResultRegistry::<u32>::from_pending(snapshot);
        assert_eq!(restored.listener_count("other"), 0);
        restored.register_listener("k", 2, recorder(&log, 2));
        assert_eq!(*log.borrow(), vec![(2, payload(&[4]))]);
    }

    #[test]
    fn route_result_defers_calls_until_dispatch() {
        let log: Log = Rc::default();
        let mut registry = ResultRegistry::<u32>::new();
        registry.register_listener("k", 1, recorder(&log, 1));

        let delivery = registry.route_result("k", payload(&[8])).unwrap();
        assert_eq!(delivery.request_key(), "k");
        assert_eq!(delivery.payload(), &payload(&[8]));
        assert_eq!(delivery.len(), 1);
        assert!(log.borrow().is_empty());

        delivery.dispatch();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn route_result_without_listener_returns_none() {
        let mut registry = ResultRegistry::<u32>::new();
        assert!(registry.route_result("k", payload(&[1])).is_none());
        assert!(registry.has_pending("k"));
    }

    #[test]
    fn attach_listener_returns_pending_delivery() {
        let log: Log = Rc::default();
        let mut registry = ResultRegistry::<u32>::new();
        registry.set_result("k", payload(&[6]));

        let delivery = registry.attach_listener("k", 1, recorder(&log, 1)).unwrap();
        assert!(!registry.has_pending("k"));
        assert!(log.borrow().is_empty());
        delivery.dispatch();
        assert_eq!(*log.borrow(), vec![(1, payload(&[6]))]);
    }
}
