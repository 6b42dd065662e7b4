// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised by this crate.

/// Failures of the result router itself.
///
/// Codec failures are not wrapped here; they surface as the codec's own error type.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A [`ResultOwner`](crate::owner::ResultOwner) was looked up in an
    /// [`OwnerLocal`](crate::local::OwnerLocal) that was never provided with one.
    #[error("no ResultOwner provided; provide one at the composition root before subscribing or setting results")]
    OwnerNotProvided,
}
