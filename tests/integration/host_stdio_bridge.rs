//! The newline-delimited JSON bridge driven over in-memory pipes.

use quickslot::host::contract::{CommandEnvelope, CommandName, events};
use quickslot::host::stdio::run_bridge;
use serde_json::{Value, json};
use tokio::io::AsyncReadExt;

use crate::helpers::{RecordingShell, temp_router};

fn line(request_id: &str, command: CommandName, payload: Value) -> String {
    let envelope = CommandEnvelope::new(request_id, command, payload);
    format!("{}\n", serde_json::to_string(&envelope).unwrap())
}

/// Feed `input` through the bridge and return every output line as JSON.
async fn run_script(input: String) -> Vec<Value> {
    let (router, _dir) = temp_router(RecordingShell::unrooted());
    let (output, mut reader) = tokio::io::duplex(1 << 16);

    run_bridge(input.as_bytes(), output, router, 8).await.unwrap();

    let mut raw = String::new();
    reader.read_to_string(&mut raw).await.unwrap();
    raw.lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

fn responses(lines: &[Value]) -> Vec<&Value> {
    lines.iter().filter(|l| l.get("request_id").is_some()).collect()
}

#[tokio::test]
async fn answers_each_line_and_stops_on_runtime_stop() {
    let mut input = String::new();
    input.push_str(&line("req-1", CommandName::HostPing, json!({})));
    input.push_str("this is not json\n");
    input.push('\n');
    input.push_str(&line("req-2", CommandName::HostVersion, json!({})));
    input.push_str(&line("req-3", CommandName::RuntimeStop, json!({})));
    input.push_str(&line("req-after-stop", CommandName::HostPing, json!({})));

    let lines = run_script(input).await;
    let responses = responses(&lines);
    let ids: Vec<_> = responses
        .iter()
        .map(|r| r["request_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["req-1", "parse-error", "req-2", "req-3"]);

    assert_eq!(responses[0]["ok"], true);
    assert_eq!(responses[0]["payload"]["pong"], true);
    assert_eq!(responses[1]["ok"], false);
    assert_eq!(responses[2]["payload"]["contract_version"], 1);
    assert_eq!(responses[3]["payload"]["stopping"], true);
}

#[tokio::test]
async fn routing_errors_become_error_responses() {
    let input = line("bad-tile", CommandName::SlotGet, json!({"tile_id": 99}));
    let lines = run_script(input).await;
    let responses = responses(&lines);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["request_id"], "bad-tile");
    assert_eq!(responses[0]["ok"], false);
    assert!(
        responses[0]["error"]
            .as_str()
            .unwrap()
            .contains("tile_id 99")
    );
}

#[tokio::test]
async fn approval_prompt_is_forwarded_as_an_event() {
    let mut input = line(
        "update",
        CommandName::BridgeUpdateTile,
        json!({"tileId": 6, "label": "Lamp", "caller_package": "org.example.home"}),
    );
    input.push_str(&line("ping", CommandName::HostPing, json!({})));
    input.push_str(&line("stop", CommandName::RuntimeStop, json!({})));

    let lines = run_script(input).await;
    let prompt = lines
        .iter()
        .find(|l| l["event"] == events::BRIDGE_APPROVAL_REQUESTED)
        .expect("approval event line");
    assert_eq!(prompt["payload"]["caller"], "org.example.home");
    assert_eq!(prompt["payload"]["tile_id"], 6);

    let update = responses(&lines)
        .into_iter()
        .find(|r| r["request_id"] == "update")
        .cloned()
        .unwrap();
    assert_eq!(update["payload"]["state"], "awaiting_decision");
}
