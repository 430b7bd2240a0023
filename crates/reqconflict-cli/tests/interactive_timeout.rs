//! The binary must exit once the interactive wait times out, even while stdin
//! is still open.

use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempDir;

const DEADLINE: Duration = Duration::from_secs(20);

#[test]
fn exits_after_input_timeout_with_stdin_open() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("reqs.csv");
    std::fs::write(&input, "Requirements\nTop speed 120 km/h\nCost under 1500\n").unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_reqconflict"))
        .args([
            "--input",
            input.to_str().unwrap(),
            "--output-dir",
            dir.path().to_str().unwrap(),
            "--api-url",
            "http://127.0.0.1:1",
            "--request-timeout-secs",
            "1",
            "--call-delay-secs",
            "0",
            "--input-timeout-secs",
            "1",
            "--log-level",
            "error",
        ])
        .env_remove("HF_API_TOKEN")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    // Held open, never written to.
    let _stdin = child.stdin.take();

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if started.elapsed() > DEADLINE {
            child.kill().unwrap();
            panic!("reqconflict still running {DEADLINE:?} after start with stdin open");
        }
        std::thread::sleep(Duration::from_millis(50));
    };

    assert!(status.success(), "exit status {status}");
    assert!(dir.path().join("conflict_results.csv").exists());
}
