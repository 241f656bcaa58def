use std::path::PathBuf;
use std::process::Command;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_deckmath-tester"))
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("deckmath-cli-{}-{name}", std::process::id()))
}

#[test]
fn lists_scenarios_into_output_file() {
    let path = temp_path("list.txt");
    let status = bin()
        .args(["--list-scenarios", "--output"])
        .arg(&path)
        .status()
        .expect("run tester");
    assert!(status.success());
    let text = std::fs::read_to_string(&path).expect("listing");
    assert!(text.starts_with("Available scenarios:"));
    for key in ["smoke", "pool-completion", "competition-timeout"] {
        assert!(text.contains(key), "missing {key}");
    }
    let _ = std::fs::remove_file(path);
}

#[test]
fn smoke_run_emits_json_report() {
    let path = temp_path("report.json");
    let status = bin()
        .args([
            "--scenarios",
            "smoke,restart",
            "--seeds",
            "3,4",
            "--iterations",
            "2",
            "--report",
            "json",
            "--output",
        ])
        .arg(&path)
        .status()
        .expect("run tester");
    assert!(status.success());
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("report")).expect("json");
    let results = report.as_array().expect("array");
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r["passed"] == serde_json::json!(true)));
    let _ = std::fs::remove_file(path);
}

#[test]
fn bad_seed_fails() {
    let output = bin()
        .args(["--seeds", "not-a-seed"])
        .output()
        .expect("run tester");
    assert!(!output.status.success());
}
