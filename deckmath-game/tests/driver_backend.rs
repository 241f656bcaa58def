use std::cell::{Cell, RefCell};

use async_trait::async_trait;
use deckmath_game::protocol::{ApiRequest, Endpoint, HttpReply};
use deckmath_game::{
    Game24Rules, ManualClock, Phase, PlayMode, RetryPolicy, SessionConfig,
    SessionController, SessionDriver, SessionIdentity, Transport, TransportError,
};
use serde_json::json;

/// Backend that serves a fixed list of cases and accepts any answer for
/// even case ids.
#[derive(Default)]
struct ScriptedBackend {
    cases: Vec<u32>,
    cursor: Cell<usize>,
    pooled: Cell<bool>,
    fail_next_reads: Cell<u32>,
    pauses: RefCell<Vec<u32>>,
    bodies: RefCell<Vec<serde_json::Value>>,
}

impl ScriptedBackend {
    fn with_cases(cases: &[u32]) -> Self {
        Self {
            cases: cases.to_vec(),
            ..Self::default()
        }
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedBackend {
    async fn send(&self, request: &ApiRequest) -> Result<HttpReply, TransportError> {
        if let Ok(Some(body)) = request.body() {
            self.bodies.borrow_mut().push(body);
        }
        let reply = match request {
            ApiRequest::Next(query) => {
                if self.fail_next_reads.get() > 0 {
                    self.fail_next_reads.set(self.fail_next_reads.get() - 1);
                    return Err(TransportError::Network("connection reset".to_string()));
                }
                let index = self.cursor.get();
                let Some(case_id) = query.case_id.or_else(|| self.cases.get(index).copied()) else {
                    return Ok(HttpReply::new(404, json!({"error": "No more cases"})));
                };
                self.cursor.set(index + 1);
                let mut body = json!({
                    "case_id": case_id,
                    "values": [case_id % 13 + 1, 2, 3, 4],
                    "seq": query.seq,
                    "target": 24,
                });
                if self.pooled.get() {
                    let total = u32::try_from(self.cases.len()).unwrap_or(u32::MAX);
                    let served = u32::try_from(index + 1).unwrap_or(u32::MAX);
                    body["pool_info"] = json!({
                        "remaining": total.saturating_sub(served),
                        "total_count": total
                    });
                }
                HttpReply::ok(body)
            }
            ApiRequest::Check(check) => {
                let ok = check.case_id.is_some_and(|id| id % 2 == 0);
                HttpReply::ok(json!({"ok": ok, "reason": if ok { None } else { Some("Not quite") }}))
            }
            ApiRequest::Pool(pool) => {
                self.pooled.set(!pool.case_ids.is_empty());
                HttpReply::ok(json!({"ok": true, "count": pool.case_ids.len()}))
            }
            ApiRequest::Summary(_) => HttpReply::ok(json!({
                "ok": true,
                "play_summary": {"totals": {"solved": 1, "incorrect": 1}}
            })),
            ApiRequest::Exit(_) => HttpReply::ok(json!({"ok": true, "next_url": "/bye"})),
            _ => HttpReply::ok(json!({"ok": true})),
        };
        Ok(reply)
    }

    async fn pause(&self, millis: u32) {
        self.pauses.borrow_mut().push(millis);
    }
}

fn scripted_driver(cases: &[u32], config: SessionConfig) -> SessionDriver<Game24Rules, ScriptedBackend> {
    let clock = ManualClock::starting_at(0);
    let controller = SessionController::new(
        Game24Rules,
        clock.clone(),
        config,
        SessionIdentity::fixed("c_test", "g_test"),
    );
    SessionDriver::new(controller, clock, ScriptedBackend::with_cases(cases))
}

#[tokio::test]
async fn auto_advance_walks_through_cases() {
    let mut driver = scripted_driver(&[2, 4, 6], SessionConfig::default());
    driver.act(|s| s.deal(true, None)).await;
    assert_eq!(driver.view().phase, Phase::Playing);

    driver.act(|s| s.submit_answer("anything")).await;
    assert_eq!(driver.controller().stats().solved, 1);
    assert_eq!(driver.armed_timers(), 1);

    driver.advance_time(899).await;
    assert_eq!(driver.sent_count(Endpoint::Next), 1);
    driver.advance_time(1).await;
    assert_eq!(driver.sent_count(Endpoint::Next), 2);
    assert_eq!(driver.controller().state().display_sequence, 2);
    assert!(driver.view().question.unwrap_or_default().starts_with("Q2 [#4]"));
}

#[tokio::test]
async fn wrong_answers_do_not_advance() {
    let mut driver = scripted_driver(&[3], SessionConfig::default());
    driver.act(|s| s.deal(true, None)).await;
    driver.act(|s| s.submit_answer("1+2")).await;
    driver.act(|s| s.submit_answer("1*2")).await;
    let stats = driver.controller().stats();
    assert_eq!((stats.played, stats.incorrect, stats.solved), (1, 2, 0));
    assert_eq!(driver.armed_timers(), 0);
    assert_eq!(driver.view().status.text, "✗ Not quite");
}

#[tokio::test]
async fn deals_are_retried_once_after_network_errors() {
    let mut driver = scripted_driver(&[2], SessionConfig::default());
    driver.transport().fail_next_reads.set(1);
    driver.act(|s| s.deal(true, None)).await;
    assert_eq!(driver.view().phase, Phase::Playing);
    assert_eq!(*driver.transport().pauses.borrow(), vec![250]);

    let mut stubborn = scripted_driver(
        &[2],
        SessionConfig {
            retry: RetryPolicy::none(),
            ..SessionConfig::default()
        },
    );
    stubborn.transport().fail_next_reads.set(1);
    stubborn.act(|s| s.deal(true, None)).await;
    assert_eq!(stubborn.view().phase, Phase::Idle);
    assert!(stubborn.view().status.text.contains("connection reset"));
}

#[tokio::test]
async fn pool_completion_returns_to_single_play() {
    let mut driver = scripted_driver(&[2, 4], SessionConfig::default());
    driver.act(|s| s.set_mode(PlayMode::CustomPool)).await;
    driver.act(|s| s.save_pool("2 4", None)).await;
    driver.act(|s| s.deal(true, None)).await;
    driver.act(|s| s.submit_answer("x")).await;
    driver.advance_time(900).await;
    driver.act(|s| s.submit_answer("x")).await;

    assert_eq!(driver.view().phase, Phase::PoolComplete);
    assert_eq!(driver.sent_count(Endpoint::Next), 2);
    assert_eq!(driver.sent_count(Endpoint::Summary), 1);
    assert!(driver.view().summary.is_some());

    driver.advance_time(2_000).await;
    let view = driver.view();
    assert_eq!(view.mode, PlayMode::Single);
    assert_eq!(view.level, "easy");
    assert_eq!(view.phase, Phase::Idle);
    assert_eq!(driver.sent_count(Endpoint::Next), 2, "no deal after pool end");
    assert_eq!(driver.sent_count(Endpoint::Pool), 2);
}

#[tokio::test]
async fn exit_reports_stats_and_navigates() {
    let mut driver = scripted_driver(&[2], SessionConfig::default());
    driver.act(|s| s.deal(true, None)).await;
    driver.clock().advance(3_000);
    driver.act(|s| s.submit_answer("ok")).await;
    driver.act(|s| s.exit()).await;

    assert_eq!(driver.navigations(), ["/bye".to_string()]);
    let bodies = driver.transport().bodies.borrow();
    let exit = bodies.last().expect("exit body");
    assert_eq!(exit["stats"]["solved"], 1);
    assert_eq!(exit["client_id"], "c_test");
}

#[tokio::test]
async fn boxed_rules_drive_the_same_engine() {
    let clock = ManualClock::starting_at(0);
    let controller = deckmath_game::controller_for(
        deckmath_game::GameKind::CountByTwos,
        clock.clone(),
        SessionConfig::default(),
        SessionIdentity::fixed("c", "g"),
    );
    let mut driver = SessionDriver::new(controller, clock, ScriptedBackend::with_cases(&[8]));
    driver.act(|s| s.deal(true, None)).await;
    driver.act(|s| s.submit_answer("ten")).await;
    assert_eq!(driver.sent_count(Endpoint::Check), 0);
    assert_eq!(driver.view().status.text, "Enter a whole number.");
}
