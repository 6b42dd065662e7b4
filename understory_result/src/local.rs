// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scoped access to the composition root's [`ResultOwner`].
//!
//! Toolkits usually carry an environment or context object down the tree. Put an
//! [`OwnerLocal`] in it, provide the owner once at the root, and let descendants read it.
//! Reading a slot that was never provided is a programming error and panics instead of
//! falling back to a fresh owner, which would silently lose results.
//!
//! ```
//! use understory_result::local::OwnerLocal;
//! use understory_result::owner::ResultOwner;
//! use understory_result::types::CallSite;
//!
//! let mut local: OwnerLocal<CallSite> = OwnerLocal::new();
//! assert!(local.try_current().is_err());
//!
//! local.provide(ResultOwner::new());
//! assert_eq!(local.current().pending_len(), 0);
//! ```

use crate::error::Error;
use crate::owner::ResultOwner;

/// A slot holding the [`ResultOwner`] provided for a composition root.
pub struct OwnerLocal<I> {
    owner: Option<ResultOwner<I>>,
}

impl<I: core::fmt::Debug> core::fmt::Debug for OwnerLocal<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OwnerLocal")
            .field("owner", &self.owner)
            .finish()
    }
}

impl<I> Clone for OwnerLocal<I> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
        }
    }
}

impl<I> Default for OwnerLocal<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> OwnerLocal<I> {
    /// Create an empty slot.
    pub const fn new() -> Self {
        Self { owner: None }
    }

    /// Create a slot that already holds `owner`.
    pub fn provided(owner: ResultOwner<I>) -> Self {
        Self { owner: Some(owner) }
    }

    /// Provide `owner`, returning the previously provided one.
    pub fn provide(&mut self, owner: ResultOwner<I>) -> Option<ResultOwner<I>> {
        self.owner.replace(owner)
    }

    /// Returns `true` once an owner has been provided.
    pub fn is_provided(&self) -> bool {
        self.owner.is_some()
    }

    /// The provided owner.
    ///
    /// # Panics
    ///
    /// Panics if no owner was provided.
    #[track_caller]
    pub fn current(&self) -> &ResultOwner<I> {
        match &self.owner {
            Some(owner) => owner,
            None => panic!("{}", Error::OwnerNotProvided),
        }
    }

    /// The provided owner, or [`Error::OwnerNotProvided`].
    pub fn try_current(&self) -> Result<&ResultOwner<I>, Error> {
        self.owner.as_ref().ok_or(Error::OwnerNotProvided)
    }
}
