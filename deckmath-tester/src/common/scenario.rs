//! Scripted sessions shared by the simulated and live runners.
//!
//! A scenario drives one [`SessionDriver`] through a sequence of player
//! actions and checks the controller's state after each step. Solutions are
//! always obtained through `/help`, so the same scripts run against the
//! simulated backend and a real server.

use anyhow::{Context, Result, ensure};
use deckmath_game::protocol::Endpoint;
use deckmath_game::{
    GameKind, GameRules, ManualClock, Phase, PlayMode, SessionConfig, SessionDriver,
    SessionIdentity, StatusTone, Transport, controller_for,
};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde_json::json;

pub type Driver<T> = SessionDriver<Box<dyn GameRules>, T>;

/// How the simulated backend behaves for a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendProfile {
    /// Replies carry authoritative stats.
    pub report_stats: bool,
    /// Number of upcoming `/next` calls that fail at the network level.
    pub flaky_reads: u32,
}

impl BackendProfile {
    pub const STANDARD: Self = Self {
        report_stats: true,
        flaky_reads: 0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Smoke,
    PoolCompletion,
    HintFirst,
    SkipChain,
    Restart,
    StatsFallback,
    CompetitionTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    pub key: &'static str,
    pub name: &'static str,
    pub game: GameKind,
    pub script: Script,
    pub profile: BackendProfile,
    /// Safe to point at a real server.
    pub live: bool,
}

const CATALOG: [Scenario; 7] = [
    Scenario {
        key: "smoke",
        name: "Smoke Test",
        game: GameKind::Game24,
        script: Script::Smoke,
        profile: BackendProfile::STANDARD,
        live: true,
    },
    Scenario {
        key: "pool-completion",
        name: "Custom Pool Completion",
        game: GameKind::Game24,
        script: Script::PoolCompletion,
        profile: BackendProfile::STANDARD,
        live: false,
    },
    Scenario {
        key: "hint-first",
        name: "Help Before Answering",
        game: GameKind::Game24,
        script: Script::HintFirst,
        profile: BackendProfile::STANDARD,
        live: true,
    },
    Scenario {
        key: "skip-chain",
        name: "Skip Chain With Flaky Reads",
        game: GameKind::Game24,
        script: Script::SkipChain,
        profile: BackendProfile {
            report_stats: true,
            flaky_reads: 1,
        },
        live: true,
    },
    Scenario {
        key: "restart",
        name: "Session Restart",
        game: GameKind::Game24,
        script: Script::Restart,
        profile: BackendProfile::STANDARD,
        live: true,
    },
    Scenario {
        key: "stats-fallback",
        name: "Local Stats Without Server Counters",
        game: GameKind::Game24,
        script: Script::StatsFallback,
        profile: BackendProfile {
            report_stats: false,
            flaky_reads: 0,
        },
        live: false,
    },
    Scenario {
        key: "competition-timeout",
        name: "Competition Countdown",
        game: GameKind::Game24,
        script: Script::CompetitionTimeout,
        profile: BackendProfile::STANDARD,
        live: false,
    },
];

pub fn get_scenario(name: &str) -> Option<Scenario> {
    let key = match name.to_lowercase().as_str() {
        "pool" => "pool-completion",
        "hint" | "help" => "hint-first",
        "skip" => "skip-chain",
        "stats" => "stats-fallback",
        "competition" => "competition-timeout",
        other => return CATALOG.iter().find(|s| s.key == other).copied(),
    };
    CATALOG.iter().find(|s| s.key == key).copied()
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    CATALOG.iter().map(|s| (s.key, s.name)).collect()
}

pub fn all_scenario_keys() -> Vec<String> {
    CATALOG.iter().map(|s| s.key.to_string()).collect()
}

/// Controller plus driver on simulated time, with identifiers derived from
/// the seed.
pub fn new_driver<T: Transport>(game: GameKind, transport: T, seed: u64) -> Driver<T> {
    let clock = ManualClock::starting_at(1_000);
    let identity = SessionIdentity::fixed(format!("qa-client-{seed}"), format!("qa-guest-{seed}"));
    let controller = controller_for(game, clock.clone(), SessionConfig::default(), identity);
    SessionDriver::new(controller, clock, transport)
}

/// JSON trace of what a driver has seen, for failure artifacts.
pub fn session_trace<T: Transport>(driver: &Driver<T>) -> serde_json::Value {
    let view = driver.view();
    json!({
        "phase": format!("{:?}", view.phase),
        "mode": format!("{:?}", view.mode),
        "level": view.level,
        "status": view.status.text,
        "stats": view.stats,
        "sent": driver.sent().iter().map(|e| e.label()).collect::<Vec<_>>(),
        "navigations": driver.navigations(),
    })
}

impl Scenario {
    pub async fn run<T: Transport>(&self, driver: &mut Driver<T>, rng: &mut ChaCha8Rng) -> Result<()> {
        match self.script {
            Script::Smoke => smoke(driver).await,
            Script::PoolCompletion => pool_completion(driver, rng).await,
            Script::HintFirst => hint_first(driver).await,
            Script::SkipChain => skip_chain(driver, rng).await,
            Script::Restart => restart(driver).await,
            Script::StatsFallback => stats_fallback(driver).await,
            Script::CompetitionTimeout => competition_timeout(driver, rng).await,
        }
    }
}

fn phase<T: Transport>(driver: &Driver<T>) -> Phase {
    driver.controller().state().phase
}

fn status<T: Transport>(driver: &Driver<T>) -> String {
    driver.controller().status().text.clone()
}

fn advance_delay<T: Transport>(driver: &Driver<T>) -> u64 {
    let controller = driver.controller();
    u64::from(
        controller
            .config()
            .advance_delay_ms
            .unwrap_or_else(|| controller.rules().advance_delay_ms()),
    )
}

async fn deal<T: Transport>(driver: &mut Driver<T>) -> Result<()> {
    driver.act(|c| c.deal(true, None)).await;
    ensure!(
        phase(driver) == Phase::Playing,
        "deal did not produce a puzzle: {}",
        status(driver)
    );
    Ok(())
}

fn current_case<T: Transport>(driver: &Driver<T>) -> Option<u32> {
    driver
        .controller()
        .state()
        .current_envelope
        .as_ref()
        .and_then(|envelope| envelope.case_id)
}

/// Ask for one solution and submit it.
async fn solve_with_help<T: Transport>(driver: &mut Driver<T>) -> Result<()> {
    driver.act(|c| c.request_hint(false)).await;
    let answer = driver
        .view()
        .hint
        .and_then(|hint| hint.lines.first().cloned())
        .with_context(|| format!("help returned no solution: {}", status(driver)))?;
    driver.act(|c| c.submit_answer(&answer)).await;
    ensure!(
        matches!(phase(driver), Phase::Solved | Phase::PoolComplete),
        "submitting '{answer}' did not solve the puzzle: {}",
        status(driver)
    );
    Ok(())
}

fn pick_cases(rng: &mut ChaCha8Rng, count: usize) -> Vec<u32> {
    let mut cases: Vec<u32> = Vec::with_capacity(count);
    while cases.len() < count {
        let case_id = rng.gen_range(1..=1820);
        if !cases.contains(&case_id) {
            cases.push(case_id);
        }
    }
    cases
}

fn pool_text(cases: &[u32]) -> String {
    cases
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

async fn smoke<T: Transport>(driver: &mut Driver<T>) -> Result<()> {
    deal(driver).await?;
    ensure!(driver.view().cards.len() == 4, "expected four cards on the table");

    driver.act(|c| c.submit_answer("1+1")).await;
    ensure!(
        driver.controller().status().tone == StatusTone::Error,
        "a wrong answer should be reported, got '{}'",
        status(driver)
    );
    ensure!(driver.controller().stats().incorrect >= 1, "incorrect answer not counted");

    solve_with_help(driver).await?;
    ensure!(driver.controller().stats().solved >= 1, "solve not counted");

    let delay = advance_delay(driver);
    driver.advance_time(delay).await;
    ensure!(phase(driver) == Phase::Playing, "auto-advance did not deal: {}", status(driver));
    ensure!(
        driver.controller().state().display_sequence == 2,
        "second puzzle should be #2"
    );

    driver.act(|c| c.exit()).await;
    ensure!(driver.navigations().len() == 1, "exit should navigate exactly once");
    Ok(())
}

async fn pool_completion<T: Transport>(driver: &mut Driver<T>, rng: &mut ChaCha8Rng) -> Result<()> {
    let cases = pick_cases(rng, 3);
    driver.act(|c| c.set_mode(PlayMode::CustomPool)).await;
    driver.act(|c| c.save_pool(&pool_text(&cases), None)).await;
    ensure!(
        status(driver).starts_with("Pool saved (3 case IDs)"),
        "pool not saved: {}",
        status(driver)
    );

    deal(driver).await?;
    let mut served = Vec::new();
    for round in 0..cases.len() {
        served.push(current_case(driver).context("pooled puzzle without a case id")?);
        solve_with_help(driver).await?;
        if round + 1 < cases.len() {
            let delay = advance_delay(driver);
            driver.advance_time(delay).await;
            ensure!(phase(driver) == Phase::Playing, "next pooled deal missing");
        }
    }
    ensure!(served == cases, "pool served {served:?}, expected {cases:?}");
    ensure!(
        phase(driver) == Phase::PoolComplete,
        "pool should be complete, phase {:?}",
        phase(driver)
    );
    ensure!(driver.sent_count(Endpoint::Summary) == 1, "summary not requested");

    let reset = u64::from(driver.controller().config().pool_reset_delay_ms);
    driver.advance_time(reset).await;
    let state = driver.controller().state();
    ensure!(state.mode == PlayMode::Single, "should be back in single play");
    ensure!(state.level == "easy", "level should reset to easy, got {}", state.level);
    ensure!(state.phase == Phase::Idle, "no deal should follow the reset");
    Ok(())
}

async fn hint_first<T: Transport>(driver: &mut Driver<T>) -> Result<()> {
    deal(driver).await?;
    let before = *driver.controller().stats();

    driver.act(|c| c.request_hint(true)).await;
    let hint = driver.view().hint.context("no help panel")?;
    ensure!(!hint.lines.is_empty(), "help listed no solutions: {}", hint.headline);
    ensure!(hint.headline.starts_with("All solutions"), "unexpected headline {}", hint.headline);

    driver.act(|c| c.request_hint(false)).await;
    let after_help = *driver.controller().stats();
    ensure!(
        after_help.revealed == before.revealed + 1,
        "help should count one reveal per puzzle"
    );
    ensure!(after_help.played == before.played + 1, "help should count the puzzle as played");

    solve_with_help(driver).await?;
    ensure!(
        driver.controller().stats().played == before.played + 1,
        "a helped solve is still one played puzzle"
    );
    Ok(())
}

async fn skip_chain<T: Transport>(driver: &mut Driver<T>, rng: &mut ChaCha8Rng) -> Result<()> {
    deal(driver).await?;
    let skips = rng.gen_range(2..=4);
    let before = driver.controller().stats().skipped;
    for _ in 0..skips {
        driver.act(|c| c.skip()).await;
        ensure!(phase(driver) == Phase::Playing, "skip did not deal: {}", status(driver));
    }
    ensure!(driver.sent_count(Endpoint::Skip) == skips, "one skip request per skip");
    ensure!(driver.sent_count(Endpoint::Next) == skips + 1, "one deal per skip");
    ensure!(
        driver.controller().stats().skipped == before + u64::try_from(skips).unwrap_or(u64::MAX),
        "skips miscounted"
    );
    Ok(())
}

async fn restart<T: Transport>(driver: &mut Driver<T>) -> Result<()> {
    deal(driver).await?;
    solve_with_help(driver).await?;
    driver.act(|c| c.restart_session()).await;
    ensure!(phase(driver) == Phase::Playing, "restart should deal: {}", status(driver));
    let stats = driver.controller().stats();
    ensure!(stats.solved == 0 && stats.played == 0, "restart should clear stats, got {stats:?}");
    ensure!(driver.armed_timers() == 0, "restart left a timer armed");
    Ok(())
}

async fn stats_fallback<T: Transport>(driver: &mut Driver<T>) -> Result<()> {
    deal(driver).await?;
    driver.act(|c| c.submit_answer("1+1")).await;
    solve_with_help(driver).await?;
    let delay = advance_delay(driver);
    driver.advance_time(delay).await;
    driver.act(|c| c.skip()).await;

    let stats = *driver.controller().stats();
    ensure!(stats.played == 1, "played {}", stats.played);
    ensure!(stats.solved == 1, "solved {}", stats.solved);
    ensure!(stats.incorrect == 1, "incorrect {}", stats.incorrect);
    ensure!(stats.revealed == 1, "revealed {}", stats.revealed);
    ensure!(stats.skipped == 1, "skipped {}", stats.skipped);
    ensure!(stats.accuracy_percent() == 100, "accuracy {}", stats.accuracy_percent());
    Ok(())
}

async fn competition_timeout<T: Transport>(driver: &mut Driver<T>, rng: &mut ChaCha8Rng) -> Result<()> {
    let cases = pick_cases(rng, 4);
    driver.act(|c| c.set_mode(PlayMode::Competition)).await;
    driver.act(|c| c.save_pool(&pool_text(&cases), Some(1))).await;
    ensure!(status(driver).starts_with("Pool saved"), "pool not saved: {}", status(driver));

    deal(driver).await?;
    driver.act(|c| c.request_hint(false)).await;
    ensure!(driver.sent_count(Endpoint::Help) == 0, "help must stay local in competition");
    ensure!(
        driver.view().countdown.is_some(),
        "countdown should be visible during a competition"
    );

    driver.advance_time(61_000).await;
    let state = driver.controller().state();
    ensure!(state.session_ended, "competition should end when time runs out");
    ensure!(state.phase == Phase::Ended, "phase {:?}", state.phase);
    ensure!(driver.controller().summary().is_some(), "summary not loaded");

    driver.act(|c| c.deal(true, None)).await;
    ensure!(driver.sent_count(Endpoint::Next) == 1, "no deals after the competition ends");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_catalog_entries() {
        assert_eq!(get_scenario("SMOKE").map(|s| s.script), Some(Script::Smoke));
        assert_eq!(get_scenario("pool").map(|s| s.key), Some("pool-completion"));
        assert_eq!(get_scenario("help").map(|s| s.key), Some("hint-first"));
        assert!(get_scenario("unknown").is_none());
    }

    #[test]
    fn catalog_keys_are_unique() {
        let keys = all_scenario_keys();
        let mut deduped = keys.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(keys.len(), deduped.len());
        assert_eq!(list_scenarios().len(), keys.len());
    }

    #[test]
    fn picked_cases_are_distinct_and_in_range() {
        use rand::SeedableRng;
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let cases = pick_cases(&mut rng, 25);
        assert_eq!(cases.len(), 25);
        assert!(cases.iter().all(|c| (1..=1820).contains(c)));
        let mut sorted = cases.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 25);
        assert_eq!(pool_text(&[3, 9]), "3, 9");
    }
}
