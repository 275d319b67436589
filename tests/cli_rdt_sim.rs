use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "rdt-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn rdt_sim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rdt_sim"))
        .args(args)
        .output()
        .expect("run rdt_sim")
}

fn path_arg(p: &Path) -> &str {
    p.to_str().expect("utf-8 temp path")
}

#[test]
fn rdt_sim_writes_viz_json_with_meta_first_and_done_last() {
    let dir = unique_temp_dir("viz");
    let out_json = dir.join("viz.json");

    let output = rdt_sim(&[
        "--protocol",
        "tcp",
        "--message-count",
        "8",
        "--loss",
        "0.1",
        "--corrupt",
        "0.1",
        "--jitter-ms",
        "2",
        "--seed",
        "5",
        "--viz-json",
        path_arg(&out_json),
    ]);
    assert!(
        output.status.success(),
        "rdt_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("finished=true"), "stdout={stdout}");
    assert!(stdout.contains("delivered=8"));
    assert!(stdout.contains("order_violations=0"));

    let raw = fs::read_to_string(&out_json).expect("read viz.json");
    let v: Value = serde_json::from_str(&raw).expect("parse viz.json");
    let arr = v.as_array().expect("viz.json must be a JSON array");
    assert_eq!(
        arr[0].get("kind").and_then(|k| k.as_str()),
        Some("meta"),
        "expected first viz event to be meta"
    );
    assert_eq!(
        arr[0].get("protocol").and_then(|k| k.as_str()),
        Some("tcp")
    );
    assert!(
        arr.iter()
            .any(|e| e.get("kind").and_then(|k| k.as_str()) == Some("done"))
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn rdt_sim_reads_scenario_file_and_lets_flags_override() {
    let dir = unique_temp_dir("scenario");
    let scenario = dir.join("scenario.json");
    fs::write(
        &scenario,
        r#"
{
    "protocol": "tcp",
    "window_size": 3,
    "messages": ["alpha", "beta", "gamma"],
    "channel": { "delay_ms": 2 }
}
        "#,
    )
    .expect("write scenario");

    let output = rdt_sim(&["--scenario", path_arg(&scenario), "--protocol", "gbn"]);
    assert!(
        output.status.success(),
        "rdt_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("protocol=gbn"), "stdout={stdout}");
    assert!(stdout.contains("delivered=3"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn rdt_sim_rejects_invalid_probability() {
    let output = rdt_sim(&["--loss", "2"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("channel.loss"), "stderr={stderr}");
}

#[test]
fn rdt_sim_rejects_unknown_protocol() {
    let output = rdt_sim(&["--protocol", "udp"]);
    assert!(!output.status.success());
}
