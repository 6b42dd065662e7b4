// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for result routing: payloads, snapshots, listeners, and subscriber identities.
//!
//! ## Overview
//!
//! These types describe what flows through the [registry](crate::registry) and what crosses
//! the persistence boundary. They are referenced by the [owner](crate::owner) and by
//! [subscriptions](crate::subscription).

use alloc::collections::BTreeMap;
use alloc::collections::btree_map;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

/// An opaque, already-encoded result value.
///
/// The router never looks inside a payload; it only moves it from the producer to a
/// listener or into the pending store. Typed values are converted with a
/// [`ResultCodec`](crate::codec::ResultCodec).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Payload(Vec<u8>);

impl Payload {
    /// Wrap encoded bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Borrow the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the payload, returning the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Number of encoded bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the payload carries no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Results that were set while nobody was listening, keyed by request key.
///
/// This is the only registry state that survives a rebuild of the composition root.
/// Produce it with [`ResultRegistry::pending_snapshot`](crate::registry::ResultRegistry::pending_snapshot)
/// (or [`ResultOwner::save`](crate::owner::ResultOwner::save)) in the host's save hook, store it
/// however the host stores state, and hand it back to
/// [`ResultRegistry::from_pending`](crate::registry::ResultRegistry::from_pending)
/// (or [`ResultOwner::remember`](crate::owner::ResultOwner::remember)) after the rebuild.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PendingResults(BTreeMap<String, Payload>);

impl PendingResults {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Number of pending results.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if a result is pending for `request_key`.
    pub fn contains(&self, request_key: &str) -> bool {
        self.0.contains_key(request_key)
    }

    /// Borrow the pending payload for `request_key`, if any.
    pub fn get(&self, request_key: &str) -> Option<&Payload> {
        self.0.get(request_key)
    }

    /// Store `payload` under `request_key`, returning the payload it replaced.
    pub fn insert(&mut self, request_key: impl Into<String>, payload: Payload) -> Option<Payload> {
        self.0.insert(request_key.into(), payload)
    }

    /// Remove and return the payload pending for `request_key`.
    pub fn take(&mut self, request_key: &str) -> Option<Payload> {
        self.0.remove(request_key)
    }

    /// Iterate pending results in request-key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Payload> {
        self.0.iter()
    }

    /// Encode the whole snapshot into one binary blob.
    ///
    /// Useful when the host's state store only holds bytes.
    #[cfg(feature = "postcard")]
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Decode a snapshot previously produced by [`PendingResults::to_bytes`].
    #[cfg(feature = "postcard")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}

impl FromIterator<(String, Payload)> for PendingResults {
    fn from_iter<T: IntoIterator<Item = (String, Payload)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PendingResults {
    type Item = (String, Payload);
    type IntoIter = btree_map::IntoIter<String, Payload>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PendingResults {
    type Item = (&'a String, &'a Payload);
    type IntoIter = btree_map::Iter<'a, String, Payload>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A live listener callback.
///
/// Shared so a [`Delivery`](crate::registry::Delivery) can hold it after the registry
/// borrow ends. Listeners that need mutable state keep it behind their own cell.
pub type Listener = Rc<dyn Fn(&Payload)>;

/// A subscriber identity derived from the source location of the subscribing call.
///
/// Stable across repeated runs of the same code path and distinct across call sites,
/// which is what the registry needs to tell two consumers of one request key apart.
///
/// A `CallSite` marks a source location, not a position in the UI tree. Two instances of
/// one component that subscribe to the same request key from the same line get equal
/// identities: the second registration replaces the first, and dropping either one
/// unregisters both. Give such instances distinct [slots](CallSite::with_slot) (loop
/// indices, item keys), or, if the toolkit has its own node identity, use that as the
/// subscriber type instead of `CallSite`.
///
/// ```
/// use understory_result::types::CallSite;
///
/// fn site() -> CallSite {
///     CallSite::here()
/// }
///
/// assert_eq!(site(), site());
/// assert_ne!(CallSite::here(), CallSite::here());
/// assert_ne!(site().with_slot(0), site().with_slot(1));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallSite {
    file: &'static str,
    line: u32,
    column: u32,
    slot: u64,
}

impl CallSite {
    /// Capture the location of the caller.
    #[track_caller]
    pub fn here() -> Self {
        let location = core::panic::Location::caller();
        Self {
            file: location.file(),
            line: location.line(),
            column: location.column(),
            slot: 0,
        }
    }

    /// Distinguish repeated uses of one call site, e.g. items of a list.
    #[must_use]
    pub fn with_slot(self, slot: u64) -> Self {
        Self { slot, ..self }
    }

    /// Source file of the call site.
    pub fn file(&self) -> &'static str {
        self.file
    }

    /// Line of the call site.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Column of the call site.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Slot within the call site.
    pub fn slot(&self) -> u64 {
        self.slot
    }
}
