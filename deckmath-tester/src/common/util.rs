use anyhow::{Context, Result};
use chrono::Utc;
use std::{fs, path::Path};

pub fn artifacts_dir(base: &str, mode: &str, scenario: &str, seed: u64) -> String {
    let ts = Utc::now().format("%Y%m%dT%H%M%S");
    format!("{base}/{mode}/{scenario}/seed-{seed}/{ts}")
}

/// Persist what a failing run saw: the error chain and a JSON trace of the
/// session (status line, requests sent, navigations).
pub fn write_failure_artifacts(dir: &str, err: &anyhow::Error, trace: &serde_json::Value) -> Result<()> {
    let dir = Path::new(dir);
    fs::create_dir_all(dir).context("creating artifacts dir")?;
    let payload = serde_json::to_vec_pretty(trace).unwrap_or_default();
    let _ = fs::write(dir.join("session.json"), payload);
    let _ = fs::write(dir.join("error.txt"), format!("{err:#}"));
    Ok(())
}

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}
