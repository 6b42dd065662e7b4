// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pending results across a rebuild of the composition root.
//!
//! The owner is saved to bytes (as a host's state store would), dropped together with every
//! listener, and remembered again from the saved bytes. Only pending results come back.
//!
//! Run:
//! - `cargo run -p understory_demos --example result_restore`

use understory_result::codec::PostcardCodec;
use understory_result::owner::{ResultOwner, ResultSink};
use understory_result::subscription::ResultSubscription;
use understory_result::types::{CallSite, PendingResults};

fn main() {
    let owner = ResultOwner::<CallSite>::remember(None);
    let listener = ResultSubscription::subscribe_typed(
        &owner,
        "search_query",
        CallSite::here(),
        PostcardCodec,
        |q: Result<String, _>| println!("  live listener received {q:?}"),
    );
    owner
        .set_typed_result("selected_item", &42_u32, PostcardCodec)
        .expect("encode selection");

    let saved = owner.save().to_bytes().expect("encode snapshot");
    println!("== Saved {} pending result(s), {} bytes ==", owner.pending_len(), saved.len());
    drop(listener);
    drop(owner);

    let restored = PendingResults::from_bytes(&saved).expect("decode snapshot");
    let owner = ResultOwner::<CallSite>::remember(Some(restored));
    println!(
        "== Rebuilt: {} pending, {} listener(s) on search_query ==",
        owner.pending_len(),
        owner.listener_count("search_query")
    );

    let _requester = ResultSubscription::subscribe_typed(
        &owner,
        "selected_item",
        CallSite::here(),
        PostcardCodec,
        |item: Result<u32, _>| println!("  requester received {item:?}"),
    );
    println!("== Pending after pickup: {} ==", owner.pending_len());
}
