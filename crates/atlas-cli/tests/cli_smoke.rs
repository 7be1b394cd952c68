use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "atlas-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_atlas<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_atlas");
    Command::new(bin)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("atlas command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout should be JSON ({e})\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

/// ℙ² with glueings U0 ↔ U1 and U1 ↔ U2 only.
const PLANE_TOML: &str = r#"
[[charts]]
name = "U0"
coordinates = ["x1/x0", "x2/x0"]

[[charts]]
name = "U1"
coordinates = ["x0/x1", "x2/x1"]

[[charts]]
name = "U2"
coordinates = ["x0/x2", "x1/x2"]

[[glueings]]
first = "U0"
second = "U1"
first_inverted = [0]
second_inverted = [0]
forward = [[-1, 0], [-1, 1]]
backward = [[-1, 0], [-1, 1]]

[[glueings]]
first = "U1"
second = "U2"
first_inverted = [1]
second_inverted = [1]
forward = [[1, -1], [0, -1]]
backward = [[1, -1], [0, -1]]

[decomposition]
U0 = [{ coefficient = 1.0, exponents = [1, 0] }]
U1 = [{ coefficient = 1.0, exponents = [0, 1] }]
U2 = [{ coefficient = 1.0, exponents = [1, 1] }]
"#;

fn write_plane(dir: &TempDirGuard) -> PathBuf {
    let path = dir.path().join("plane.toml");
    fs::write(&path, PLANE_TOML).expect("covering file should be written");
    path
}

#[test]
fn inspect_reports_arcs_and_connectivity() {
    let tmp = TempDirGuard::new("inspect");
    let path = write_plane(&tmp);

    let output = run_atlas([OsStr::new("inspect"), path.as_os_str(), OsStr::new("--json")]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);

    assert_eq!(payload["connected"], Value::Bool(true));
    assert_eq!(payload["arcs"].as_array().map(Vec::len), Some(4));
    assert_eq!(payload["report"]["charts"].as_array().map(Vec::len), Some(3));
    assert_eq!(payload["report"]["decomposition_info"], Value::Bool(true));
    assert_eq!(payload["connectivity"]["transition_vertices"], 2);
    assert_eq!(
        payload["report"]["fingerprint"].as_str().map(str::len),
        Some(64)
    );
}

#[test]
fn inspect_text_dump() {
    let tmp = TempDirGuard::new("inspect-text");
    let path = write_plane(&tmp);

    let output = run_atlas([OsStr::new("inspect"), path.as_os_str()]);
    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Covering with 3 charts"));
    assert!(stdout.contains("  1: [x1/x0, x2/x0]"));
    assert!(stdout.contains("glued along (1, 2), (2, 3)"));
    assert!(stdout.contains("Connected: yes"));
}

#[test]
fn fill_closes_the_plane() {
    let tmp = TempDirGuard::new("fill");
    let path = write_plane(&tmp);

    let output = run_atlas([OsStr::new("fill"), path.as_os_str(), OsStr::new("--json")]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["glueings_before"], 2);
    assert_eq!(payload["added"], serde_json::json!([[0, 2]]));
    assert_eq!(payload["added_charts"], serde_json::json!([["U0", "U2"]]));
    assert_eq!(payload["glueings_after"], 3);
}

#[test]
fn transitions_lists_composable_pairs() {
    let tmp = TempDirGuard::new("transitions");
    let path = write_plane(&tmp);

    let output = run_atlas([
        OsStr::new("transitions"),
        path.as_os_str(),
        OsStr::new("--json"),
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["vertices"].as_array().map(Vec::len), Some(2));
    assert_eq!(payload["vertices"][0]["charts"], serde_json::json!(["U0", "U1"]));
    assert_eq!(payload["edges"], serde_json::json!([[0, 1]]));
    assert_eq!(payload["components"], 1);
}

#[test]
fn base_change_moves_every_chart() {
    let tmp = TempDirGuard::new("base-change");
    let path = write_plane(&tmp);

    let output = run_atlas([
        OsStr::new("base-change"),
        path.as_os_str(),
        OsStr::new("--field"),
        OsStr::new("QQ(i)"),
        OsStr::new("--json"),
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    let charts = payload["charts"].as_array().expect("charts array");
    assert_eq!(charts.len(), 3);
    assert!(charts.iter().all(|c| c["base_field"] == "QQ(i)"));
    assert_eq!(charts[2]["from"], 2);
    assert_eq!(payload["report"]["glueings"], serde_json::json!([[0, 1], [1, 2]]));
    assert_eq!(payload["report"]["decomposition_info"], Value::Bool(true));
}

#[test]
fn json_sources_are_accepted() {
    let tmp = TempDirGuard::new("json-source");
    let path = tmp.path().join("line.json");
    fs::write(
        &path,
        r#"{
            "charts": [
                { "name": "U0", "coordinates": ["t"] },
                { "name": "U1", "coordinates": ["s"] }
            ],
            "glueings": [
                { "first": "U0", "second": "U1",
                  "first_inverted": [0], "second_inverted": [0],
                  "forward": [[-1]], "backward": [[-1]] }
            ]
        }"#,
    )
    .expect("covering file should be written");

    let output = run_atlas([OsStr::new("inspect"), path.as_os_str(), OsStr::new("--json")]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["arcs"], serde_json::json!([[0, 1], [1, 0]]));
}

#[test]
fn unknown_chart_fails_with_message() {
    let tmp = TempDirGuard::new("bad-source");
    let path = tmp.path().join("bad.toml");
    fs::write(&path, PLANE_TOML.replace("second = \"U2\"", "second = \"U7\""))
        .expect("covering file should be written");

    let output = run_atlas([OsStr::new("inspect"), path.as_os_str()]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown chart `U7`"), "stderr:\n{stderr}");
}

#[test]
fn empty_covering_is_not_an_error() {
    let tmp = TempDirGuard::new("empty");
    let path = tmp.path().join("empty.json");
    fs::write(&path, r#"{ "charts": [] }"#).expect("covering file should be written");

    let output = run_atlas([OsStr::new("inspect"), path.as_os_str(), OsStr::new("--json")]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["connected"], Value::Null);
    assert_eq!(payload["connectivity"]["charts"], 0);
}

/// Two reducible lines glued along one component only.
const SPLIT_TOML: &str = r#"
[[charts]]
name = "A"
coordinates = ["s"]
components = ["p", "q"]

[[charts]]
name = "B"
coordinates = ["t"]
components = ["p", "q"]

[[glueings]]
first = "A"
second = "B"
first_components = ["p"]
second_components = ["p"]
forward = [[1]]
backward = [[1]]
"#;

#[test]
fn all_dense_flag_drives_connectivity_and_arcs() {
    let tmp = TempDirGuard::new("all-dense");
    let path = tmp.path().join("split.toml");
    fs::write(&path, SPLIT_TOML).expect("covering file should be written");

    let output = run_atlas([OsStr::new("inspect"), path.as_os_str(), OsStr::new("--json")]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["arcs"], serde_json::json!([]));
    assert_eq!(payload["connected"], Value::Bool(false));
    assert_eq!(payload["connectivity"]["glueing_components"], 2);

    let output = run_atlas([
        OsStr::new("inspect"),
        path.as_os_str(),
        OsStr::new("--all-dense"),
        OsStr::new("--json"),
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["all_dense"], Value::Bool(true));
    assert_eq!(payload["arcs"], serde_json::json!([[0, 1], [1, 0]]));
    assert_eq!(payload["connected"], Value::Bool(true));
    assert_eq!(payload["connectivity"]["glueing_components"], 1);
}

#[test]
fn ragged_map_fails_with_message() {
    let tmp = TempDirGuard::new("ragged");
    let path = tmp.path().join("ragged.toml");
    fs::write(
        &path,
        PLANE_TOML.replace("forward = [[-1, 0], [-1, 1]]", "forward = [[1, 0], [1]]"),
    )
    .expect("covering file should be written");

    let output = run_atlas([OsStr::new("fill"), path.as_os_str()]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("forward map of glueing U0 -> U1"), "stderr:\n{stderr}");
}
