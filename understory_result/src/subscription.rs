// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifecycle-bound result subscriptions.
//!
//! ## Usage
//!
//! 1) When a consumer node mounts, call [`ResultSubscription::subscribe`] with the owner, the
//!    request key, the node's subscriber identity, and a callback. A result that was set while
//!    the node was absent is delivered right away.
//! 2) Keep the subscription alive while the node is mounted. Call
//!    [`ResultSubscription::set_callback`] whenever the node produces a fresh callback; later
//!    deliveries use the newest one.
//! 3) Drop the subscription when the node unmounts. Dropping always unregisters, even if the
//!    listener was never stored because it consumed a pending result on mount.
//!
//! ## Minimal example
//!
//! ```
//! use std::{cell::Cell, rc::Rc};
//! use understory_result::owner::{ResultOwner, ResultSink};
//! use understory_result::subscription::ResultSubscription;
//! use understory_result::types::{CallSite, Payload};
//!
//! let owner: ResultOwner<CallSite> = ResultOwner::new();
//! let received = Rc::new(Cell::new(0));
//!
//! let sub = {
//!     let received = received.clone();
//!     ResultSubscription::subscribe(&owner, "confirm", CallSite::here(), move |p: &Payload| {
//!         received.set(p.as_bytes()[0]);
//!     })
//! };
//! owner.set_result("confirm", Payload::from(vec![1]));
//! assert_eq!(received.get(), 1);
//!
//! drop(sub);
//! assert_eq!(owner.listener_count("confirm"), 0);
//! ```

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use core::cell::RefCell;

use crate::codec::ResultCodec;
use crate::owner::ResultOwner;
use crate::types::{CallSite, Listener, Payload};

// Empty while the callback is running; a replacement stored during the call wins.
type Callback = Rc<RefCell<Option<Box<dyn FnMut(&Payload)>>>>;

/// A mounted consumer's registration for one request key.
///
/// Registers on construction and unregisters on drop. The registered listener reads the
/// callback cell at delivery time, so replacing the callback never requires re-registering.
///
/// A callback may replace itself with [`ResultSubscription::set_callback`] while running; the
/// replacement handles the next delivery. It must not set the result for its own request key
/// while it is running.
pub struct ResultSubscription<I: Ord + core::fmt::Debug + Clone> {
    owner: ResultOwner<I>,
    request_key: String,
    subscriber: I,
    callback: Callback,
}

impl<I: Ord + core::fmt::Debug + Clone> core::fmt::Debug for ResultSubscription<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResultSubscription")
            .field("request_key", &self.request_key)
            .field("subscriber", &self.subscriber)
            .finish_non_exhaustive()
    }
}

impl<I: Ord + core::fmt::Debug + Clone> ResultSubscription<I> {
    /// Subscribe to results for `request_key` as `subscriber`.
    ///
    /// `on_result` may run before this returns if a result is already pending.
    pub fn subscribe(
        owner: &ResultOwner<I>,
        request_key: impl Into<String>,
        subscriber: I,
        on_result: impl FnMut(&Payload) + 'static,
    ) -> Self {
        let subscription = Self {
            owner: owner.clone(),
            request_key: request_key.into(),
            subscriber,
            callback: Rc::new(RefCell::new(Some(Box::new(on_result)))),
        };
        subscription.register();
        subscription
    }

    /// Subscribe with a callback that receives decoded values.
    ///
    /// Each payload is decoded with `codec`; a decode failure reaches `on_result` as the
    /// codec's error.
    pub fn subscribe_typed<T, C>(
        owner: &ResultOwner<I>,
        request_key: impl Into<String>,
        subscriber: I,
        codec: C,
        on_result: impl FnMut(Result<T, C::Error>) + 'static,
    ) -> Self
    where
        T: 'static,
        C: ResultCodec<T> + 'static,
    {
        Self::subscribe(owner, request_key, subscriber, decoding(codec, on_result))
    }

    /// Replace the callback used for future deliveries.
    pub fn set_callback(&self, on_result: impl FnMut(&Payload) + 'static) {
        *self.callback.borrow_mut() = Some(Box::new(on_result));
    }

    /// Replace the callback with one that receives decoded values.
    pub fn set_typed_callback<T, C>(
        &self,
        codec: C,
        on_result: impl FnMut(Result<T, C::Error>) + 'static,
    ) where
        T: 'static,
        C: ResultCodec<T> + 'static,
    {
        self.set_callback(decoding(codec, on_result));
    }

    /// Move the subscription to another request key.
    ///
    /// Unregisters from the old key and registers for the new one, which may deliver a pending
    /// result immediately. Setting the current key again does nothing.
    pub fn set_request_key(&mut self, request_key: impl Into<String>) {
        let request_key = request_key.into();
        if request_key == self.request_key {
            return;
        }
        self.owner
            .unregister_listener(&self.request_key, &self.subscriber);
        self.request_key = request_key;
        self.register();
    }

    /// Request key this subscription listens on.
    pub fn request_key(&self) -> &str {
        &self.request_key
    }

    /// Identity this subscription registered under.
    pub fn subscriber(&self) -> &I {
        &self.subscriber
    }

    fn register(&self) {
        let cell = Rc::clone(&self.callback);
        let listener: Listener = Rc::new(move |payload: &Payload| {
            let Some(mut on_result) = cell.borrow_mut().take() else {
                return;
            };
            on_result(payload);
            let mut slot = cell.borrow_mut();
            if slot.is_none() {
                *slot = Some(on_result);
            }
        });
        self.owner
            .register_listener(&self.request_key, self.subscriber.clone(), listener);
    }
}

impl ResultSubscription<CallSite> {
    /// Subscribe using the caller's source location as the subscriber identity.
    ///
    /// Only suitable when a single live instance subscribes from this location; see
    /// [`CallSite`] for why repeated component instances need a slot or a tree identity.
    #[track_caller]
    pub fn here(
        owner: &ResultOwner<CallSite>,
        request_key: impl Into<String>,
        on_result: impl FnMut(&Payload) + 'static,
    ) -> Self {
        Self::subscribe(owner, request_key, CallSite::here(), on_result)
    }
}

impl<I: Ord + core::fmt::Debug + Clone> Drop for ResultSubscription<I> {
    fn drop(&mut self) {
        self.owner
            .unregister_listener(&self.request_key, &self.subscriber);
    }
}

fn decoding<T, C>(
    codec: C,
    mut on_result: impl FnMut(Result<T, C::Error>) + 'static,
) -> impl FnMut(&Payload) + 'static
where
    T: 'static,
    C: ResultCodec<T> + 'static,
{
    move |payload: &Payload| on_result(codec.decode(payload))
}
