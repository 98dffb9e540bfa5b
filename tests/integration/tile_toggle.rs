//! Tile triggers through the host router: toggle flags, their persistence,
//! and the platform events a headless host forwards.

use std::sync::Arc;

use quickslot::action::ActionKind;
use quickslot::executor::ExecFailure;
use quickslot::host::contract::{CommandName, events};
use quickslot::privilege::NoBroker;
use serde_json::json;

use crate::helpers::{
    RecordingShell, call, drain_events, file_router, route, seed_tile, temp_router,
};

fn trigger(router: &quickslot::host::channel::CommandRouter, tile: i64) -> serde_json::Value {
    let response = call(router, CommandName::SlotTrigger, json!({"tile_id": tile}));
    assert!(response.ok);
    response.payload
}

#[test]
fn elevated_toggle_flips_state_and_runs_matching_command() {
    let dir = tempfile::tempdir().unwrap();
    seed_tile(dir.path(), 2, ActionKind::MobileData, "");
    let shell = RecordingShell::rooted();
    let router = file_router(dir.path(), shell.clone(), Arc::new(NoBroker));
    let mut rx = router.events().subscribe();

    let first = trigger(&router, 2);
    assert_eq!(first["result"]["message"], "Mobile Data enable");
    let view = call(&router, CommandName::SlotGet, json!({"tile_id": 2}));
    assert_eq!(view.payload["view"]["state"], "active");

    let second = trigger(&router, 2);
    assert_eq!(second["result"]["message"], "Mobile Data disable");
    let view = call(&router, CommandName::SlotGet, json!({"tile_id": 2}));
    assert_eq!(view.payload["view"]["state"], "inactive");

    assert_eq!(shell.commands(), vec!["svc data enable", "svc data disable"]);

    let emitted = drain_events(&mut rx);
    let refreshes = emitted
        .iter()
        .filter(|e| e.event == events::TILE_REFRESH)
        .count();
    assert_eq!(refreshes, 2);
    assert!(
        emitted
            .iter()
            .any(|e| e.event == events::NOTIFICATION_SHOW
                && e.payload["message"] == "Mobile Data enable")
    );
}

#[test]
fn toggle_state_survives_router_restart() {
    let dir = tempfile::tempdir().unwrap();
    seed_tile(dir.path(), 7, ActionKind::Toggle, "");

    let router = file_router(dir.path(), RecordingShell::unrooted(), Arc::new(NoBroker));
    trigger(&router, 7);
    drop(router);

    let reopened = file_router(dir.path(), RecordingShell::unrooted(), Arc::new(NoBroker));
    let view = call(&reopened, CommandName::SlotGet, json!({"tile_id": 7}));
    assert_eq!(view.payload["slot"]["is_active"], true);
    assert_eq!(view.payload["view"]["state"], "active");
}

#[test]
fn flashlight_tile_asks_the_shell_for_the_torch() {
    let dir = tempfile::tempdir().unwrap();
    seed_tile(dir.path(), 1, ActionKind::Flashlight, "");
    let shell = RecordingShell::rooted();
    let router = file_router(dir.path(), shell.clone(), Arc::new(NoBroker));
    let mut rx = router.events().subscribe();

    let on = trigger(&router, 1);
    assert_eq!(on["result"]["message"], "Flashlight On");
    let off = trigger(&router, 1);
    assert_eq!(off["result"]["message"], "Flashlight Off");

    let torch: Vec<_> = drain_events(&mut rx)
        .into_iter()
        .filter(|e| e.event == events::PLATFORM_TORCH)
        .map(|e| e.payload["enabled"].clone())
        .collect();
    assert_eq!(torch, vec![json!(true), json!(false)]);
    assert!(shell.commands().is_empty());
}

#[test]
fn open_app_tile_forwards_a_launch_request() {
    let dir = tempfile::tempdir().unwrap();
    seed_tile(dir.path(), 3, ActionKind::OpenApp, "com.example.camera");
    let router = file_router(dir.path(), RecordingShell::unrooted(), Arc::new(NoBroker));
    let mut rx = router.events().subscribe();

    let result = trigger(&router, 3);
    assert_eq!(result["result"]["message"], "Opening app...");

    let launch = drain_events(&mut rx)
        .into_iter()
        .find(|e| e.event == events::PLATFORM_LAUNCH)
        .expect("launch event");
    assert_eq!(launch.payload["package"], "com.example.camera");
}

#[test]
fn elevated_toggle_without_channels_still_flips_but_stays_silent() {
    let dir = tempfile::tempdir().unwrap();
    seed_tile(dir.path(), 4, ActionKind::AdbWifi, "");
    let shell = RecordingShell::unrooted();
    let router = file_router(dir.path(), shell.clone(), Arc::new(NoBroker));

    let result = trigger(&router, 4);
    assert!(result["result"]["message"].is_null());
    assert_eq!(result["result"]["command"]["status"], "unavailable");
    assert!(shell.commands().is_empty());

    let view = call(&router, CommandName::SlotGet, json!({"tile_id": 4}));
    assert_eq!(view.payload["view"]["state"], "active");
}

#[test]
fn failing_command_is_reported_as_failure() {
    let dir = tempfile::tempdir().unwrap();
    seed_tile(dir.path(), 5, ActionKind::ShellCommand, "false");
    let shell = Arc::new(RecordingShell {
        available: true,
        fail_with: Some(ExecFailure::NonZeroExit(1)),
        ..Default::default()
    });
    let router = file_router(dir.path(), shell.clone(), Arc::new(NoBroker));

    let result = trigger(&router, 5);
    assert_eq!(result["result"]["message"], "Command failed");
    assert_eq!(result["result"]["command"]["status"], "failed");
    assert_eq!(shell.commands(), vec!["false"]);
}

#[test]
fn unbound_tile_is_silent_and_unavailable() {
    let (router, _dir) = temp_router(RecordingShell::rooted());
    let mut rx = router.events().subscribe();

    let result = trigger(&router, 9);
    assert!(result["result"]["message"].is_null());
    assert!(drain_events(&mut rx).is_empty());

    let view = call(&router, CommandName::SlotGet, json!({"tile_id": 9}));
    assert_eq!(view.payload["view"]["state"], "unavailable");
}

#[test]
fn unbound_assistant_opens_the_main_surface() {
    let (router, _dir) = temp_router(RecordingShell::unrooted());
    let mut rx = router.events().subscribe();

    let result = trigger(&router, -1);
    assert_eq!(result["tile_id"], -1);
    assert!(
        drain_events(&mut rx)
            .iter()
            .any(|e| e.event == events::PLATFORM_MAIN_SURFACE)
    );
}

#[test]
fn out_of_range_tile_is_invalid() {
    let (router, _dir) = temp_router(RecordingShell::unrooted());
    assert!(route(&router, CommandName::SlotTrigger, json!({"tile_id": 21})).is_err());
    assert!(route(&router, CommandName::SlotGet, json!({"tile_id": 0})).is_err());
    assert!(route(&router, CommandName::SlotGet, json!({})).is_err());
}
