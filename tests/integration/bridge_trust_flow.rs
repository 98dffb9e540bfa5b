//! External tile updates through the trust gate, end to end over
//! file-backed stores.

use std::sync::Arc;

use quickslot::host::contract::{CommandName, events};
use quickslot::privilege::NoBroker;
use serde_json::json;

use crate::helpers::{RecordingShell, call, drain_events, file_router, route, temp_router};

const CALLER: &str = "com.example.automation";

fn torch_request(tile: i64) -> serde_json::Value {
    json!({
        "tileId": tile,
        "label": "Torch",
        "actionType": "FLASHLIGHT",
        "caller_package": CALLER,
    })
}

#[test]
fn untrusted_caller_waits_then_approval_applies_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let router = file_router(dir.path(), RecordingShell::unrooted(), Arc::new(NoBroker));
    let mut rx = router.events().subscribe();

    let waiting = call(&router, CommandName::BridgeUpdateTile, torch_request(4));
    assert!(waiting.ok);
    assert_eq!(waiting.payload["state"], "awaiting_decision");
    assert_eq!(waiting.payload["caller"], CALLER);
    assert_eq!(waiting.payload["tile_id"], 4);
    assert_eq!(router.pending_count(), 1);

    let prompts = drain_events(&mut rx);
    let prompt = prompts
        .iter()
        .find(|e| e.event == events::BRIDGE_APPROVAL_REQUESTED)
        .expect("approval prompt event");
    assert_eq!(prompt.payload["caller"], CALLER);
    assert_eq!(prompt.payload["label"], "Torch");

    // Nothing is written before the decision.
    let before = call(&router, CommandName::SlotGet, json!({"tile_id": 4}));
    assert_ne!(before.payload["slot"]["label"], "Torch");

    let approval_id = waiting.payload["approval_id"].as_str().unwrap().to_owned();
    let decided = call(
        &router,
        CommandName::ApprovalRespond,
        json!({"approval_id": approval_id, "approved": true}),
    );
    assert!(decided.ok);
    assert_eq!(decided.payload["state"], "applied");
    assert_eq!(router.pending_count(), 0);

    let applied = drain_events(&mut rx);
    assert!(applied.iter().any(|e| e.event == events::BRIDGE_APPLIED));
    assert!(
        applied
            .iter()
            .any(|e| e.event == events::TILE_REFRESH && e.payload["tile_id"] == 4)
    );

    let after = call(&router, CommandName::SlotGet, json!({"tile_id": 4}));
    assert_eq!(after.payload["slot"]["label"], "Torch");
    drop(router);

    // A fresh router over the same files trusts the caller and applies directly.
    let reopened = file_router(dir.path(), RecordingShell::unrooted(), Arc::new(NoBroker));
    let trusted = call(&reopened, CommandName::TrustList, json!({}));
    assert_eq!(trusted.payload["callers"], json!([CALLER]));

    let direct = call(&reopened, CommandName::BridgeUpdateTile, torch_request(5));
    assert_eq!(direct.payload["state"], "applied");
    assert_eq!(reopened.pending_count(), 0);
    let tile5 = call(&reopened, CommandName::SlotGet, json!({"tile_id": 5}));
    assert_eq!(tile5.payload["slot"]["label"], "Torch");
}

#[test]
fn denial_discards_and_does_not_trust() {
    let (router, _dir) = temp_router(RecordingShell::unrooted());

    let waiting = call(&router, CommandName::BridgeUpdateTile, torch_request(2));
    let approval_id = waiting.payload["approval_id"].as_str().unwrap().to_owned();
    let denied = call(
        &router,
        CommandName::ApprovalRespond,
        json!({"approval_id": &approval_id, "approved": false}),
    );
    assert_eq!(denied.payload["state"], "discarded");

    let slot = call(&router, CommandName::SlotGet, json!({"tile_id": 2}));
    assert_ne!(slot.payload["slot"]["label"], "Torch");
    let trusted = call(&router, CommandName::TrustList, json!({}));
    assert_eq!(trusted.payload["callers"], json!([]));

    // A decision can only be made once.
    let again = route(
        &router,
        CommandName::ApprovalRespond,
        json!({"approval_id": approval_id, "approved": true}),
    );
    assert!(again.is_err());
}

#[test]
fn revoked_caller_needs_approval_again() {
    let (router, _dir) = temp_router(RecordingShell::unrooted());

    let waiting = call(&router, CommandName::BridgeUpdateTile, torch_request(1));
    let approval_id = waiting.payload["approval_id"].as_str().unwrap().to_owned();
    call(
        &router,
        CommandName::ApprovalRespond,
        json!({"approval_id": approval_id, "approved": true}),
    );

    let revoked = call(&router, CommandName::TrustRevoke, json!({"caller": CALLER}));
    assert_eq!(revoked.payload["revoked"], CALLER);

    let next = call(&router, CommandName::BridgeUpdateTile, torch_request(1));
    assert_eq!(next.payload["state"], "awaiting_decision");
}

#[test]
fn sender_identity_is_used_when_caller_is_not_declared() {
    let (router, _dir) = temp_router(RecordingShell::unrooted());

    let waiting = call(
        &router,
        CommandName::BridgeUpdateTile,
        json!({"tileId": 3, "label": "Notes", "sender": "org.example.notes"}),
    );
    assert_eq!(waiting.payload["caller"], "org.example.notes");

    let anonymous = call(
        &router,
        CommandName::BridgeUpdateTile,
        json!({"tileId": 3, "label": "Notes"}),
    );
    assert_eq!(anonymous.payload["caller"], "External App");
}

#[test]
fn malformed_requests_are_rejected_before_the_gate() {
    let (router, _dir) = temp_router(RecordingShell::unrooted());
    let mut rx = router.events().subscribe();

    for payload in [
        json!({"tileId": 0, "label": "x"}),
        json!({"tileId": 21, "label": "x"}),
        json!({"tileId": -1, "label": "x"}),
        json!({"tileId": 3, "actionType": "TELEPORT"}),
        json!({"label": "no tile"}),
    ] {
        assert!(
            route(&router, CommandName::BridgeUpdateTile, payload.clone()).is_err(),
            "accepted {payload}"
        );
    }
    assert_eq!(router.pending_count(), 0);
    assert!(drain_events(&mut rx).is_empty());
}
