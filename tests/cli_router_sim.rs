use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "ustack-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

const SCENARIO: &str = r#"
{
    "schema_version": 1,
    "hosts": [
        { "name": "h0", "ip": "10.0.0.2/24", "mac": "02:00:00:00:00:10", "gateway": "10.0.0.1" },
        { "name": "h1", "ip": "10.0.1.2/24", "mac": "02:00:00:00:00:11", "gateway": "10.0.1.1" }
    ],
    "routers": [
        {
            "name": "r0",
            "interfaces": [
                { "name": "eth0", "ip": "10.0.0.1", "mac": "02:00:00:00:01:00" },
                { "name": "eth1", "ip": "10.0.1.1", "mac": "02:00:00:00:01:01" }
            ],
            "routes": [
                { "prefix": "10.0.0.0/24", "interface": 0 },
                { "prefix": "10.0.1.0/24", "interface": 1 }
            ]
        }
    ],
    "segments": [ ["h0", "r0:eth0"], ["h1", "r0:eth1"] ],
    "sends": [
        { "at_ms": 0, "from": "h0", "to": "10.0.1.2", "payload": "ping" },
        { "at_ms": 0, "from": "h0", "to": "10.0.1.2", "ttl": 1, "payload": "expired" }
    ]
}
"#;

fn stats_line(stdout: &str) -> Value {
    let line = stdout
        .lines()
        .find_map(|line| line.strip_prefix("stats "))
        .expect("stats line in stdout");
    serde_json::from_str(line).expect("parse stats JSON")
}

#[test]
fn router_sim_prints_stats_and_writes_events() {
    let dir = unique_temp_dir("router-sim");
    let scenario = write_file(&dir, "scenario.json", SCENARIO);
    let events_json = dir.join("events.json");

    let output = Command::new(env!("CARGO_BIN_EXE_router_sim"))
        .args([
            "--scenario",
            scenario.to_str().unwrap(),
            "--until-ms",
            "20",
            "--events-json",
            events_json.to_str().unwrap(),
        ])
        .output()
        .expect("run router_sim");
    assert!(
        output.status.success(),
        "router_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stats = stats_line(&stdout);
    assert_eq!(stats["datagrams_sent"].as_u64(), Some(2));
    assert_eq!(stats["datagrams_delivered"].as_u64(), Some(1));
    assert!(
        stdout
            .lines()
            .any(|l| l.starts_with("received host=h1") && l.contains("\"ping\"")),
        "stdout={stdout}"
    );

    let raw = fs::read_to_string(&events_json).expect("read events.json");
    let v: Value = serde_json::from_str(&raw).expect("parse events.json");
    let arr = v.as_array().expect("events.json must be a JSON array");
    let kinds: Vec<&str> = arr
        .iter()
        .filter_map(|e| e.get("kind").and_then(|k| k.as_str()))
        .collect();
    assert_eq!(kinds.iter().filter(|k| **k == "host_send").count(), 2);
    assert_eq!(kinds.iter().filter(|k| **k == "datagram_arrived").count(), 1);
    assert!(kinds.contains(&"frame_delivered"));
    assert!(arr.iter().all(|e| e.get("t_ms").is_some()));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn router_sim_rejects_bad_scenario() {
    let dir = unique_temp_dir("router-sim-bad");
    let scenario = write_file(
        &dir,
        "scenario.json",
        r#"{ "schema_version": 1, "segments": [ ["nobody"] ] }"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_router_sim"))
        .args(["--scenario", scenario.to_str().unwrap()])
        .output()
        .expect("run router_sim");
    assert!(!output.status.success());

    let _ = fs::remove_dir_all(&dir);
}
