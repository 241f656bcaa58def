mod common;
mod live;
mod logic;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use common::scenario::{Scenario, all_scenario_keys, get_scenario, list_scenarios};
use common::split_csv;
use logic::{LogicTester, ScenarioResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestMode {
    /// Scripted sessions against the in-process simulated backend (fast)
    Logic,
    /// Live-safe scenarios against a running server
    Live,
}

#[derive(Debug, Parser)]
#[command(name = "deckmath-tester", version = "0.1.0")]
#[command(about = "Automated QA for Deckmath sessions - simulated backend and live server checks")]
struct Args {
    /// Test mode: logic (simulated backend) or live (HTTP)
    #[arg(long, value_enum, default_value_t = TestMode::Logic)]
    mode: TestMode,

    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed (logic mode only)
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Server root for live mode
    #[arg(long, default_value = "http://localhost:8000")]
    base_url: String,

    /// Artifacts directory for failure traces
    #[arg(long, default_value = "target/test-artifacts")]
    artifacts_dir: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = resolve_scenarios(&expand_scenarios(&args.scenarios));
    let seeds = parse_seeds(&args.seeds)?;

    let results = match args.mode {
        TestMode::Logic => run_logic_scenarios(&args, &scenarios, &seeds).await,
        TestMode::Live => run_live_scenarios(&args, &scenarios, &seeds).await?,
    };

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🃏 Deckmath Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for key in all_scenario_keys() {
            if !scenarios.contains(&key) {
                scenarios.push(key);
            }
        }
    }
    scenarios
}

fn resolve_scenarios(names: &[String]) -> Vec<Scenario> {
    names
        .iter()
        .filter_map(|name| {
            let found = get_scenario(name);
            if found.is_none() {
                eprintln!("⚠️  Unknown scenario: {}", name.yellow());
            }
            found
        })
        .collect()
}

fn parse_seeds(seeds_arg: &str) -> Result<Vec<u64>> {
    split_csv(seeds_arg)
        .iter()
        .map(|token| {
            token
                .parse::<u64>()
                .with_context(|| format!("invalid seed '{token}'"))
        })
        .collect()
}

async fn run_logic_scenarios(args: &Args, scenarios: &[Scenario], seeds: &[u64]) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let tester = LogicTester::new(args.verbose).with_artifacts(args.artifacts_dir.clone());
    let mut results = Vec::new();
    for scenario in scenarios {
        results.extend(tester.run_scenario(scenario, seeds, args.iterations).await);
    }
    results
}

async fn run_live_scenarios(
    args: &Args,
    scenarios: &[Scenario],
    seeds: &[u64],
) -> Result<Vec<ScenarioResult>> {
    println!("{}", "🌐 Running Live Tests".bright_blue().bold());
    println!("{}", "-".repeat(30).blue());

    let mut results = Vec::new();
    for scenario in scenarios {
        if !scenario.live {
            eprintln!(
                "⚠️  Scenario {} needs the simulated backend; skipped in live mode",
                scenario.key.yellow()
            );
            continue;
        }
        results.extend(
            live::run_live_scenario(scenario, seeds, &args.base_url, &args.artifacts_dir).await?,
        );
    }
    Ok(results)
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Deckmath Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(&mut output_target, results, duration)?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            mode: TestMode::Logic,
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            report: "json".to_string(),
            verbose: false,
            output: None,
            base_url: "http://localhost:8000".to_string(),
            artifacts_dir: "target/test-artifacts".to_string(),
        }
    }

    #[test]
    fn expands_all_scenarios_keyword() {
        let expanded = expand_scenarios("smoke,all");
        assert_eq!(expanded[0], "smoke");
        assert_eq!(expanded.len(), all_scenario_keys().len());
        assert!(expanded.contains(&"competition-timeout".to_string()));
    }

    #[test]
    fn expand_scenarios_without_all_preserves_order() {
        let expanded = expand_scenarios("restart,smoke");
        assert_eq!(expanded, vec!["restart".to_string(), "smoke".to_string()]);
    }

    #[test]
    fn unknown_scenarios_are_dropped() {
        let resolved = resolve_scenarios(&["smoke".to_string(), "nope".to_string()]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].key, "smoke");
    }

    #[test]
    fn seeds_must_be_numbers() {
        assert_eq!(parse_seeds("1, 2").expect("seeds"), vec![1, 2]);
        assert!(parse_seeds("abc").is_err());
    }

    #[test]
    fn list_scenarios_writes_to_output_file() {
        let path = std::env::temp_dir().join(format!("deckmath-list-{}.txt", std::process::id()));
        let args = Args {
            list_scenarios: true,
            output: Some(path.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).expect("listing"));
        let text = std::fs::read_to_string(&path).expect("read listing");
        assert!(text.contains("pool-completion"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn logic_run_writes_json_report() {
        let path = std::env::temp_dir().join(format!("deckmath-report-{}.json", std::process::id()));
        let args = Args {
            output: Some(path.clone()),
            ..base_args()
        };
        let scenarios = resolve_scenarios(&expand_scenarios(&args.scenarios));
        let seeds = parse_seeds(&args.seeds).expect("seeds");
        let results = tokio_test::block_on(run_logic_scenarios(&args, &scenarios, &seeds));
        write_reports(&args, &results, Instant::now()).expect("report");
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read report"))
                .expect("json");
        assert_eq!(parsed[0]["passed"], serde_json::json!(true));
        let _ = std::fs::remove_file(path);
    }
}
