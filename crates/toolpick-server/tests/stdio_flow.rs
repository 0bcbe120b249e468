use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};

#[test]
fn join_and_pick_over_stdio_work() {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let db_path = std::env::temp_dir()
        .join(format!("toolpick-stdio-{now}.json"))
        .display()
        .to_string();

    let mut child = Command::new(env!("CARGO_BIN_EXE_toolpickd"))
        .env("TOOLPICK_TRANSPORT", "stdio")
        .env("TOOLPICK_DB", &db_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn toolpickd");

    let mut child_stdin = child.stdin.take().expect("stdin");
    let child_stdout = child.stdout.take().expect("stdout");
    let mut reader = BufReader::new(child_stdout);

    let join = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "join",
        "params": {"codename": "plover"}
    });
    writeln!(child_stdin, "{join}").expect("write join");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read join response");
    let join_response: Value = serde_json::from_str(&line).expect("parse join response");
    let player_id = join_response["result"]["player_id"]
        .as_str()
        .expect("player id")
        .to_string();

    let pick = json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "pick",
        "params": {
            "player_id": player_id,
            "scenario_id": "nightly-etl",
            "tool_id": "rails-handbuilt",
            "presented_at_ms": 1_000,
            "submitted_at_ms": 8_000,
        }
    });
    writeln!(child_stdin, "{pick}").expect("write pick");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read pick response");
    let pick_response: Value = serde_json::from_str(&line).expect("parse pick response");
    assert_eq!(pick_response["result"]["latency_ms"].as_u64(), Some(7_000));
    assert!(pick_response["result"]["accuracy"].as_f64().expect("accuracy") > 0.8);

    drop(child_stdin);
    let status = child.wait().expect("wait child");
    assert!(status.success());

    let _ = std::fs::remove_file(db_path);
}
