// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Result routing basics.
//!
//! A color picker sets its result before the requesting screen is mounted, so the result is
//! kept pending and delivered the moment the requester subscribes. A confirmation dialog
//! answers a requester that is already listening, so its result is delivered synchronously
//! and never stored.
//!
//! Run:
//! - `cargo run -p understory_demos --example result_basics`

use serde::{Deserialize, Serialize};
use understory_result::codec::PostcardCodec;
use understory_result::local::OwnerLocal;
use understory_result::owner::{ResultOwner, ResultSink};
use understory_result::subscription::ResultSubscription;
use understory_result::types::CallSite;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Rgb {
    r: u8,
    g: u8,
    b: u8,
}

fn main() {
    let local = OwnerLocal::provided(ResultOwner::<CallSite>::remember(None));

    println!("== Result first ==");
    local
        .current()
        .set_typed_result("pick_color", &Rgb { r: 255, g: 0, b: 0 }, PostcardCodec)
        .expect("encode color");
    println!(
        "  pending after picker closed: {}",
        local.current().has_pending("pick_color")
    );
    let picker_requester = ResultSubscription::subscribe_typed(
        local.current(),
        "pick_color",
        CallSite::here(),
        PostcardCodec,
        |color: Result<Rgb, _>| println!("  requester received {color:?}"),
    );
    println!(
        "  pending after requester mounted: {}",
        local.current().has_pending("pick_color")
    );
    drop(picker_requester);

    println!("== Listener first ==");
    let dialog_requester = ResultSubscription::subscribe_typed(
        local.current(),
        "confirm",
        CallSite::here(),
        PostcardCodec,
        |ok: Result<bool, _>| println!("  requester received {ok:?}"),
    );
    local
        .current()
        .set_typed_result("confirm", &true, PostcardCodec)
        .expect("encode answer");
    println!(
        "  pending after dialog answered: {}",
        local.current().has_pending("confirm")
    );

    drop(dialog_requester);
    let _remounted = ResultSubscription::subscribe_typed(
        local.current(),
        "confirm",
        CallSite::here(),
        PostcardCodec,
        |ok: Result<bool, _>| println!("  unexpected redelivery {ok:?}"),
    );
    println!("  remounted requester: nothing to deliver");
}
