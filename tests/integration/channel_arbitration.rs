//! Channel selection for privileged actions, including a real process-backed
//! shell (`sh` standing in for `su`).

use std::sync::Arc;
use std::time::Duration;

use quickslot::host::channel::CommandRouter;
use quickslot::host::contract::CommandName;
use quickslot::privilege::{BrokerPermission, NoBroker, RootShell, ShellChannel};
use serde_json::json;

use crate::helpers::{RecordingBroker, RecordingShell, call, file_router, temp_router};

fn dispatch(
    router: &CommandRouter,
    action_type: &str,
    action_value: &str,
) -> serde_json::Value {
    let response = call(
        router,
        CommandName::ActionDispatch,
        json!({"action_type": action_type, "action_value": action_value}),
    );
    assert!(response.ok);
    response.payload["result"].clone()
}

#[test]
fn granted_broker_wins_and_root_shell_is_never_spawned() {
    let dir = tempfile::tempdir().unwrap();
    let shell = RecordingShell::rooted();
    let broker = RecordingBroker::new(BrokerPermission::Granted);
    let router = file_router(dir.path(), shell.clone(), broker.clone());

    let result = dispatch(&router, "REBOOT", "");
    assert_eq!(result["message"], "Rebooting...");
    assert_eq!(result["command"]["channel"], "brokered_privilege");
    assert_eq!(
        *broker.ran.lock().unwrap(),
        vec![vec!["sh".to_owned(), "-c".to_owned(), "reboot".to_owned()]]
    );
    assert!(shell.commands().is_empty());
}

#[test]
fn denied_broker_falls_back_to_root_shell() {
    let dir = tempfile::tempdir().unwrap();
    let shell = RecordingShell::rooted();
    let broker = RecordingBroker::new(BrokerPermission::Denied);
    let router = file_router(dir.path(), shell.clone(), broker.clone());

    let result = dispatch(&router, "KILL_APP", "com.example.game");
    assert_eq!(result["message"], "App killed");
    assert_eq!(result["command"]["channel"], "root_shell");
    assert_eq!(shell.commands(), vec!["am force-stop com.example.game"]);
    assert!(broker.ran.lock().unwrap().is_empty());
}

#[test]
fn privilege_status_reflects_each_probe() {
    let (bare, _bare_dir) = temp_router(RecordingShell::unrooted());
    let status = call(&bare, CommandName::PrivilegeStatus, json!({}));
    assert_eq!(status.payload["can_execute_commands"], false);
    let channels = status.payload["channels"].as_array().unwrap();
    assert!(channels.iter().all(|c| c["available"] == false));

    let (rooted, _rooted_dir) = temp_router(RecordingShell::rooted());
    let status = call(&rooted, CommandName::PrivilegeStatus, json!({}));
    assert_eq!(status.payload["can_execute_commands"], true);
    let root = status.payload["channels"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["channel"] == "root_shell")
        .cloned()
        .unwrap();
    assert_eq!(root["available"], true);
}

#[test]
fn accessibility_actions_fall_back_to_shell_without_a_service() {
    let (router, _dir) = temp_router(RecordingShell::rooted());
    let result = dispatch(&router, "LOCK_SCREEN", "");
    assert_eq!(result["message"], "Triggered via Shell");
}

fn sh_router(command_timeout: Duration) -> (Arc<CommandRouter>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let shell: Arc<dyn ShellChannel> =
        Arc::new(RootShell::new("sh", command_timeout, Duration::from_secs(5)));
    let router = file_router(dir.path(), shell, Arc::new(NoBroker));
    (router, dir)
}

#[test]
fn process_shell_runs_the_command() {
    let (router, dir) = sh_router(Duration::from_secs(5));
    let marker = dir.path().join("marker");

    let result = dispatch(
        &router,
        "SHELL_COMMAND",
        &format!("touch '{}'", marker.display()),
    );
    assert_eq!(result["message"], "Command executed");
    assert!(marker.exists());
}

#[test]
fn process_shell_nonzero_exit_is_a_failure() {
    let (router, _dir) = sh_router(Duration::from_secs(5));
    let result = dispatch(&router, "SHELL_COMMAND", "exit 3");
    assert_eq!(result["message"], "Command failed");
    assert_eq!(result["command"]["failure"]["kind"], "non_zero_exit");
    assert_eq!(result["command"]["failure"]["detail"], 3);
}

#[test]
fn process_shell_hung_command_times_out() {
    let (router, _dir) = sh_router(Duration::from_millis(200));
    let started = std::time::Instant::now();
    let result = dispatch(&router, "SHELL_COMMAND", "sleep 10");
    assert_eq!(result["message"], "Command timed out");
    assert_eq!(result["command"]["failure"]["kind"], "timed_out");
    assert!(started.elapsed() < Duration::from_secs(5));
}
