// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed results: convert values to and from opaque [`Payload`]s.
//!
//! The router only moves payloads. A [`ResultCodec`] is the seam where a toolkit plugs in
//! its own structured encoding. With the `postcard` feature, [`PostcardCodec`] covers every
//! serde type.
//!
//! Codec errors are returned as the codec's own error type, unchanged.

use crate::types::Payload;

/// Encode and decode values of type `T` as payloads.
pub trait ResultCodec<T> {
    /// Failure raised by the underlying encoding.
    type Error;

    /// Encode `value` into a payload.
    fn encode(&self, value: &T) -> Result<Payload, Self::Error>;

    /// Decode a payload back into a value.
    fn decode(&self, payload: &Payload) -> Result<T, Self::Error>;
}

impl<T, C: ResultCodec<T> + ?Sized> ResultCodec<T> for &C {
    type Error = C::Error;

    #[inline]
    fn encode(&self, value: &T) -> Result<Payload, Self::Error> {
        (**self).encode(value)
    }

    #[inline]
    fn decode(&self, payload: &Payload) -> Result<T, Self::Error> {
        (**self).decode(payload)
    }
}

/// [`ResultCodec`] backed by `postcard`.
///
/// ```
/// use understory_result::codec::{PostcardCodec, ResultCodec};
///
/// let payload = PostcardCodec.encode(&(255_u8, 0_u8, 0_u8)).unwrap();
/// let rgb: (u8, u8, u8) = PostcardCodec.decode(&payload).unwrap();
/// assert_eq!(rgb, (255, 0, 0));
/// ```
#[cfg(feature = "postcard")]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PostcardCodec;

#[cfg(feature = "postcard")]
impl<T> ResultCodec<T> for PostcardCodec
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    type Error = postcard::Error;

    fn encode(&self, value: &T) -> Result<Payload, Self::Error> {
        postcard::to_allocvec(value).map(Payload::new)
    }

    fn decode(&self, payload: &Payload) -> Result<T, Self::Error> {
        postcard::from_bytes(payload.as_bytes())
    }
}
