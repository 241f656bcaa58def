//! Live mode: the same scenario scripts, sent to a running server over HTTP.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use colored::Colorize;
use deckmath_game::protocol::{ApiRequest, HttpReply, Method};
use deckmath_game::{GameKind, Transport, TransportError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::common::scenario::{Scenario, new_driver, session_trace};
use crate::common::{artifacts_dir, write_failure_artifacts};
use crate::logic::ScenarioResult;

/// HTTP transport backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    game: GameKind,
}

impl ReqwestTransport {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, game: GameKind) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            game,
        })
    }

    #[must_use]
    pub fn url_for(&self, request: &ApiRequest) -> String {
        format!(
            "{}{}{}",
            self.base_url,
            self.game.api_base(),
            request.path_and_query()
        )
    }
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<HttpReply, TransportError> {
        let url = self.url_for(request);
        let builder = match request.endpoint().method() {
            Method::Get => self.client.get(&url),
            Method::Post => {
                let builder = self.client.post(&url);
                match request.body()? {
                    Some(body) => builder.json(&body),
                    None => builder,
                }
            }
        };
        let response = builder
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;
        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).map_err(|err| TransportError::InvalidBody(err.to_string()))?
        };
        log::debug!("{} {url} -> {status}", request.endpoint().label());
        Ok(HttpReply::new(status, body))
    }

    async fn pause(&self, millis: u32) {
        tokio::time::sleep(Duration::from_millis(u64::from(millis))).await;
    }
}

/// Run each live-safe scenario once per seed against `base_url`.
pub async fn run_live_scenario(
    scenario: &Scenario,
    seeds: &[u64],
    base_url: &str,
    artifacts_base: &str,
) -> anyhow::Result<Vec<ScenarioResult>> {
    let mut results = Vec::new();
    for &seed in seeds {
        let transport = ReqwestTransport::new(base_url, scenario.game)?;
        let mut driver = new_driver(scenario.game, transport, seed);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let start = Instant::now();
        let outcome = scenario.run(&mut driver, &mut rng).await;
        let duration = start.elapsed();

        let failures = match outcome {
            Ok(()) => {
                println!(
                    "✅ [{} seed {}] {} - {:?}",
                    "live".green(),
                    seed,
                    scenario.key,
                    duration
                );
                Vec::new()
            }
            Err(err) => {
                eprintln!(
                    "❌ [{} seed {}] {} - {:?}: {:#}",
                    "live".red(),
                    seed,
                    scenario.key,
                    duration,
                    err
                );
                let dir = artifacts_dir(artifacts_base, "live", scenario.key, seed);
                if let Err(write_err) = write_failure_artifacts(&dir, &err, &session_trace(&driver)) {
                    log::warn!("could not write artifacts to {dir}: {write_err:#}");
                }
                vec![format!("{err:#}")]
            }
        };

        let passed = failures.is_empty();
        results.push(ScenarioResult {
            scenario_name: scenario.name.to_string(),
            game: scenario.game.slug().to_string(),
            seed,
            passed,
            iterations_run: 1,
            successful_iterations: usize::from(passed),
            failures,
            average_duration: duration,
            performance_data: vec![duration],
        });
    }
    Ok(results)
}
