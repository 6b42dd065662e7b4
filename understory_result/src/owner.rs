// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition-root facade over a [`ResultRegistry`].
//!
//! ## Overview
//!
//! One [`ResultOwner`] exists per composition root. It is a cheap handle: clones share the
//! same registry, so the root can hand it to every descendant (see
//! [`OwnerLocal`](crate::local::OwnerLocal)).
//!
//! Producers see only [`ResultSink`]. Listener registration is reserved for
//! [`ResultSubscription`](crate::subscription::ResultSubscription), which owns subscriber
//! identities and guarantees unregistration.
//!
//! ## Rebuilds
//!
//! Call [`ResultOwner::save`] from the host's save hook and pass the snapshot to
//! [`ResultOwner::remember`] when the root is rebuilt. Listeners are not part of the snapshot.
//!
//! ## Re-entrancy
//!
//! Listener callbacks run after the registry borrow is released, so a callback may set a
//! result for another key through the same owner. Setting the key that is currently being
//! delivered from inside its own callback is not supported.

use alloc::rc::Rc;
use core::cell::RefCell;

use crate::codec::ResultCodec;
use crate::registry::ResultRegistry;
use crate::types::{Listener, Payload, PendingResults};

/// Producer-facing surface: set a result for a request key.
pub trait ResultSink {
    /// Deliver `payload` to whoever listens on `request_key`, or keep it pending.
    fn set_result(&self, request_key: &str, payload: Payload);

    /// Encode `value` with `codec` and set it as the result for `request_key`.
    ///
    /// Nothing is set if encoding fails; the codec's error is returned as is.
    fn set_typed_result<T, C>(&self, request_key: &str, value: &T, codec: C) -> Result<(), C::Error>
    where
        C: ResultCodec<T>,
        Self: Sized,
    {
        let payload = codec.encode(value)?;
        self.set_result(request_key, payload);
        Ok(())
    }
}

/// Shared, single-threaded handle to the result registry of one composition root.
pub struct ResultOwner<I> {
    registry: Rc<RefCell<ResultRegistry<I>>>,
}

impl<I> Clone for ResultOwner<I> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
        }
    }
}

impl<I: core::fmt::Debug> core::fmt::Debug for ResultOwner<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.registry.try_borrow() {
            Ok(registry) => f
                .debug_struct("ResultOwner")
                .field("registry", &*registry)
                .finish(),
            Err(_) => f.debug_struct("ResultOwner").finish_non_exhaustive(),
        }
    }
}

impl<I: Ord + core::fmt::Debug> Default for ResultOwner<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Ord + core::fmt::Debug> ResultOwner<I> {
    /// Create an owner with an empty registry.
    pub fn new() -> Self {
        Self::from_registry(ResultRegistry::new())
    }

    /// Create an owner whose registry starts with `pending`.
    pub fn from_pending(pending: PendingResults) -> Self {
        Self::from_registry(ResultRegistry::from_pending(pending))
    }

    /// Allocate the owner for a composition root.
    ///
    /// `saved` is whatever the host stored from [`ResultOwner::save`] before the root was torn
    /// down, or `None` on first creation.
    pub fn remember(saved: Option<PendingResults>) -> Self {
        match saved {
            Some(pending) => Self::from_pending(pending),
            None => Self::new(),
        }
    }

    fn from_registry(registry: ResultRegistry<I>) -> Self {
        Self {
            registry: Rc::new(RefCell::new(registry)),
        }
    }

    /// Snapshot the pending results for the host's save hook.
    pub fn save(&self) -> PendingResults {
        self.registry.borrow().pending_snapshot()
    }

    /// Returns `true` if a result is pending for `request_key`.
    pub fn has_pending(&self, request_key: &str) -> bool {
        self.registry.borrow().has_pending(request_key)
    }

    /// Number of pending results.
    pub fn pending_len(&self) -> usize {
        self.registry.borrow().pending_len()
    }

    /// Number of live listeners for `request_key`.
    pub fn listener_count(&self, request_key: &str) -> usize {
        self.registry.borrow().listener_count(request_key)
    }

    /// Returns `true` if both handles point at the same registry.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.registry, &other.registry)
    }

    pub(crate) fn register_listener(&self, request_key: &str, subscriber: I, listener: Listener) {
        let delivery = self
            .registry
            .borrow_mut()
            .attach_listener(request_key, subscriber, listener);
        if let Some(delivery) = delivery {
            delivery.dispatch();
        }
    }

    pub(crate) fn unregister_listener(&self, request_key: &str, subscriber: &I) -> bool {
        self.registry
            .borrow_mut()
            .unregister_listener(request_key, subscriber)
    }
}

impl<I: Ord + core::fmt::Debug> ResultSink for ResultOwner<I> {
    fn set_result(&self, request_key: &str, payload: Payload) {
        let delivery = self.registry.borrow_mut().route_result(request_key, payload);
        if let Some(delivery) = delivery {
            delivery.dispatch();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    type Log = Rc<RefCell<Vec<Payload>>>;

    fn recorder(log: &Log) -> Listener {
        let log = log.clone();
        Rc::new(move |p: &Payload| log.borrow_mut().push(p.clone()))
    }

    #[test]
    fn clones_share_one_registry() {
        let owner = ResultOwner::<u32>::new();
        let other = owner.clone();
        assert!(owner.ptr_eq(&other));

        other.set_result("k", Payload::from(vec![1]));
        assert!(owner.has_pending("k"));
        assert!(!owner.ptr_eq(&ResultOwner::new()));
    }

    #[test]
    fn remember_without_snapshot_is_empty() {
        let owner = ResultOwner::<u32>::remember(None);
        assert_eq!(owner.pending_len(), 0);
    }

    #[test]
    fn remember_restores_saved_results() {
        let log: Log = Rc::default();
        let owner = ResultOwner::<u32>::new();
        owner.set_result("k", Payload::from(vec![7]));
        let saved = owner.save();
        drop(owner);

        let rebuilt = ResultOwner::<u32>::remember(Some(saved));
        assert!(rebuilt.has_pending("k"));
        rebuilt.register_listener("k", 1, recorder(&log));
        assert_eq!(*log.borrow(), vec![Payload::from(vec![7])]);
        assert_eq!(rebuilt.listener_count("k"), 0);
    }

    #[test]
    fn listener_may_set_result_for_another_key() {
        let owner = ResultOwner::<u32>::new();
        let log: Log = Rc::default();

        let forward = {
            let owner = owner.clone();
            Rc::new(move |p: &Payload| owner.set_result("second", p.clone())) as Listener
        };
        owner.register_listener("first", 1, forward);
        owner.register_listener("second", 2, recorder(&log));

        owner.set_result("first", Payload::from(vec![3]));
        assert_eq!(*log.borrow(), vec![Payload::from(vec![3])]);
        assert_eq!(owner.pending_len(), 0);
    }

    #[test]
    fn pending_delivery_may_set_result_for_another_key() {
        let owner = ResultOwner::<u32>::new();
        owner.set_result("first", Payload::from(vec![5]));

        let forward = {
            let owner = owner.clone();
            Rc::new(move |p: &Payload| owner.set_result("second", p.clone())) as Listener
        };
        owner.register_listener("first", 1, forward);
        assert!(!owner.has_pending("first"));
        assert!(owner.has_pending("second"));
    }

    #[test]
    fn unregister_reports_presence() {
        let log: Log = Rc::default();
        let owner = ResultOwner::<u32>::new();
        owner.register_listener("k", 1, recorder(&log));
        assert!(owner.unregister_listener("k", &1));
        assert!(!owner.unregister_listener("k", &1));
    }

    #[cfg(feature = "postcard")]
    #[test]
    fn typed_result_is_encoded_before_routing() {
        use crate::codec::PostcardCodec;

        let log: Log = Rc::default();
        let owner = ResultOwner::<u32>::new();
        owner.register_listener("confirm", 1, recorder(&log));
        owner
            .set_typed_result("confirm", &true, PostcardCodec)
            .unwrap();

        let payload = log.borrow()[0].clone();
        let decoded: bool = PostcardCodec.decode(&payload).unwrap();
        assert!(decoded);
    }
}
