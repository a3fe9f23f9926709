// CLI integration tests: decode/stream flows against a fixture decoder module on PYTHONPATH.
// stderr may interleave tracing lines with JSON notices; only `{`-prefixed lines are parsed.
#![cfg(feature = "python")]

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use serde_json::Value;

const FIXTURE: &str = r#"
def decode(body, padding):
    if body.startswith("!"):
        raise ValueError("bad sentence: " + body)
    if body == "nested":
        return {"a": {"b": 1}}
    return {"body": body, "padding": padding, "mmsi": 477553000, "sog": 0.5}
"#;

fn cmd(module_dir: &Path) -> Command {
    let exe = env!("CARGO_BIN_EXE_aiscdec");
    let mut command = Command::new(exe);
    command
        .env("PYTHONPATH", module_dir)
        .env("AISCDEC_MODULE", "cli_fixture")
        .env_remove("AISCDEC_FUNCTION")
        .env_remove("AISCDEC_LOCK_TIMEOUT_MS");
    command
}

fn fixture_dir() -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("tempdir");
    std::fs::write(temp.path().join("cli_fixture.py"), FIXTURE).expect("fixture");
    temp
}

fn parse_json(value: &str) -> Value {
    serde_json::from_str(value).expect("valid json")
}

fn json_lines(output: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(output)
        .lines()
        .filter(|line| line.trim_start().starts_with('{'))
        .map(parse_json)
        .collect()
}

#[test]
fn decode_prints_one_object() {
    let temp = fixture_dir();
    let output = cmd(temp.path())
        .args(["decode", "177KQJ5000G?tO`K>RA1wUbN0TKH"])
        .output()
        .expect("decode");
    assert!(output.status.success());
    let value = parse_json(std::str::from_utf8(&output.stdout).expect("utf8"));
    assert_eq!(value["mmsi"].as_i64(), Some(477553000));
    assert_eq!(value["padding"].as_i64(), Some(0));
    assert_eq!(value["sog"].as_f64(), Some(0.5));
}

#[test]
fn stream_skips_failed_lines_and_reports_them() {
    let temp = fixture_dir();
    let mut child = cmd(temp.path())
        .args(["stream"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"# fixtures\n177KQJ 0\n!oops 0\nnested\n55P5TL01,2\n")
        .expect("write");
    let output = child.wait_with_output().expect("wait");
    assert!(output.status.success());

    let results = json_lines(&output.stdout);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["body"], "177KQJ");
    assert_eq!(results[1]["padding"], 2);

    let notices = json_lines(&output.stderr)
        .into_iter()
        .filter(|value| value.get("notice").is_some())
        .collect::<Vec<_>>();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0]["notice"]["line"], 3);
    assert_eq!(notices[0]["notice"]["details"]["error"]["kind"], "Invocation");
    assert_eq!(notices[1]["notice"]["line"], 4);
    assert_eq!(
        notices[1]["notice"]["details"]["error"]["kind"],
        "UnsupportedValueType"
    );
    assert_eq!(notices[1]["notice"]["details"]["error"]["key"], "a");
}

#[test]
fn stream_stop_policy_uses_error_exit_code() {
    let temp = fixture_dir();
    let input = temp.path().join("input.txt");
    std::fs::write(&input, "177KQJ\n!oops\n55P5TL01 2\n").expect("input");

    let output = cmd(temp.path())
        .args(["stream", input.to_str().unwrap(), "--errors", "stop"])
        .output()
        .expect("stream");
    assert_eq!(output.status.code(), Some(4));
    assert_eq!(json_lines(&output.stdout).len(), 1);
    let err = json_lines(&output.stderr)
        .into_iter()
        .find(|value| value.get("error").is_some())
        .expect("error json");
    assert_eq!(err["error"]["kind"], "Invocation");
}

#[test]
fn missing_module_is_initialization_exit_code() {
    let temp = fixture_dir();
    let output = cmd(temp.path())
        .args(["--module", "aiscdec_no_such_module", "decode", "177KQJ"])
        .output()
        .expect("decode");
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn padding_out_of_range_is_usage_exit_code() {
    let temp = fixture_dir();
    let output = cmd(temp.path())
        .args(["decode", "177KQJ", "--padding", "9"])
        .output()
        .expect("decode");
    assert_eq!(output.status.code(), Some(2));
}
