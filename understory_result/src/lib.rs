// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_result --heading-base-level=0

//! Understory Result: a deterministic, `no_std` router for results between UI nodes.
//!
//! ## Overview
//!
//! One node asks for a result (a color picker, a confirmation dialog, a file chooser) and
//! another node eventually provides it, often just before it leaves the tree.
//! This crate connects the two by request key.
//! It does not own a UI tree. Instead, feed it mount and unmount through
//! [`ResultSubscription`](crate::subscription::ResultSubscription) guards and results through
//! [`ResultSink::set_result`](crate::owner::ResultSink::set_result).
//!
//! ## Routing
//!
//! Whichever side arrives second triggers delivery.
//! - Result first: the [`Payload`](crate::types::Payload) is kept pending until a listener for
//!   its key registers, which consumes it. A second result for the same key replaces the first.
//! - Listener first: the result goes to every live listener for the key and is never stored.
//!
//! See [`ResultRegistry`](crate::registry::ResultRegistry) for the exact rules.
//!
//! ## Identity
//!
//! Listeners are keyed by request key and subscriber identity, so two places in the tree can
//! wait for the same key. Any `Ord + Clone + Debug` token works; [`CallSite`](crate::types::CallSite)
//! derives one from the source location of the subscribing call.
//!
//! ## Rebuilds
//!
//! Pending results survive a rebuild of the composition root through
//! [`PendingResults`](crate::types::PendingResults): save it with
//! [`ResultOwner::save`](crate::owner::ResultOwner::save) and hand it back to
//! [`ResultOwner::remember`](crate::owner::ResultOwner::remember). Listeners are never saved;
//! consumers register again when they mount again.
//!
//! ## Typed results
//!
//! [`ResultCodec`](crate::codec::ResultCodec) converts values to payloads and back.
//! With the `postcard` feature (on by default), [`PostcardCodec`](crate::codec::PostcardCodec)
//! handles any serde type.
//!
//! ## Workflow
//!
//! ```
//! # #[cfg(feature = "postcard")]
//! # fn main() {
//! use std::{cell::RefCell, rc::Rc};
//! use understory_result::codec::PostcardCodec;
//! use understory_result::local::OwnerLocal;
//! use understory_result::owner::{ResultOwner, ResultSink};
//! use understory_result::subscription::ResultSubscription;
//! use understory_result::types::CallSite;
//!
//! // Composition root: allocate the owner (restoring a saved snapshot if there is one).
//! let local = OwnerLocal::provided(ResultOwner::<CallSite>::remember(None));
//!
//! // A picker screen sets its result before anyone listens.
//! local
//!     .current()
//!     .set_typed_result("pick_color", &(255_u8, 0_u8, 0_u8), PostcardCodec)
//!     .unwrap();
//!
//! // The requesting screen mounts and receives it at once.
//! let picked = Rc::new(RefCell::new(None));
//! let _sub = {
//!     let picked = picked.clone();
//!     ResultSubscription::subscribe_typed(
//!         local.current(),
//!         "pick_color",
//!         CallSite::here(),
//!         PostcardCodec,
//!         move |rgb: Result<(u8, u8, u8), _>| *picked.borrow_mut() = rgb.ok(),
//!     )
//! };
//! assert_eq!(*picked.borrow(), Some((255, 0, 0)));
//! # }
//! # #[cfg(not(feature = "postcard"))]
//! # fn main() {}
//! ```
//!
//! All operations are single-threaded and synchronous; listener callbacks run on the caller's
//! stack.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod codec;
pub mod error;
pub mod local;
pub mod owner;
pub mod registry;
pub mod subscription;
pub mod types;

pub use error::Error;
