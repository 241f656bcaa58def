//! In-process stand-in for the puzzle server.
//!
//! Hands are generated from a seeded `ChaCha8Rng`, so a seed always produces
//! the same cases, cards and solutions. Counters follow the server's rules:
//! a puzzle is played once, revealed once and solved once per hand.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use async_trait::async_trait;
use deckmath_game::protocol::{ApiRequest, HttpReply};
use deckmath_game::{GameKind, PoolMode, Transport, TransportError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::{Value, json};

use crate::common::scenario::BackendProfile;

const MAX_CASE_ID: u32 = 1820;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Hand {
    values: Vec<u32>,
    solution: String,
    value: i64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    played: u64,
    solved: u64,
    revealed: u64,
    skipped: u64,
    answer_attempts: u64,
    answer_correct: u64,
    answer_wrong: u64,
}

impl Counters {
    fn to_json(self) -> Value {
        json!({
            "played": self.played,
            "solved": self.solved,
            "revealed": self.revealed,
            "skipped": self.skipped,
            "answer_attempts": self.answer_attempts,
            "answer_correct": self.answer_correct,
            "answer_wrong": self.answer_wrong,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct HandFlags {
    played: bool,
    revealed: bool,
    solved: bool,
}

#[derive(Debug, Clone)]
struct ServerPool {
    mode: PoolMode,
    case_ids: Vec<u32>,
    cursor: usize,
}

pub struct SimulatedBackend {
    game: GameKind,
    profile: BackendProfile,
    rng: RefCell<ChaCha8Rng>,
    hands: RefCell<HashMap<u32, Hand>>,
    pool: RefCell<Option<ServerPool>>,
    counters: Cell<Counters>,
    flags: Cell<HandFlags>,
    flaky_reads: Cell<u32>,
    pauses: RefCell<Vec<u32>>,
    requests: Cell<usize>,
}

impl SimulatedBackend {
    #[must_use]
    pub fn new(game: GameKind, profile: BackendProfile, seed: u64) -> Self {
        Self {
            game,
            profile,
            rng: RefCell::new(ChaCha8Rng::seed_from_u64(seed)),
            hands: RefCell::new(HashMap::new()),
            pool: RefCell::new(None),
            counters: Cell::new(Counters::default()),
            flags: Cell::new(HandFlags::default()),
            flaky_reads: Cell::new(profile.flaky_reads),
            pauses: RefCell::new(Vec::new()),
            requests: Cell::new(0),
        }
    }

    /// Requests answered or failed so far, retries included.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.get()
    }

    #[must_use]
    pub fn pauses(&self) -> Vec<u32> {
        self.pauses.borrow().clone()
    }

    fn hand(&self, case_id: u32) -> Hand {
        if let Some(hand) = self.hands.borrow().get(&case_id) {
            return hand.clone();
        }
        let values: Vec<u32> = {
            let mut rng = self.rng.borrow_mut();
            (0..4).map(|_| rng.gen_range(1..=13)).collect()
        };
        let sum: i64 = values.iter().map(|v| i64::from(*v)).sum();
        let (solution, value) = match self.game {
            GameKind::Game24 => (
                values
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("+"),
                sum,
            ),
            GameKind::RunningSum => (sum.to_string(), sum),
            GameKind::CountByTwos => {
                let count = 2 * i64::try_from(values.len()).unwrap_or(0);
                (count.to_string(), count)
            }
        };
        let hand = Hand {
            values,
            solution,
            value,
        };
        self.hands.borrow_mut().insert(case_id, hand.clone());
        hand
    }

    fn with_stats(&self, mut body: Value) -> Value {
        if self.profile.report_stats {
            body["stats"] = self.counters.get().to_json();
        }
        body
    }

    fn update(&self, apply: impl FnOnce(&mut Counters, &mut HandFlags)) {
        let mut counters = self.counters.get();
        let mut flags = self.flags.get();
        apply(&mut counters, &mut flags);
        self.counters.set(counters);
        self.flags.set(flags);
    }

    fn next_case(&self, requested: Option<u32>) -> Result<(u32, Option<Value>), Value> {
        let mut pool = self.pool.borrow_mut();
        match pool.as_mut() {
            Some(active) if requested.is_none() => {
                let Some(case_id) = active.case_ids.get(active.cursor).copied() else {
                    return Err(json!({"pool_done": true}));
                };
                active.cursor += 1;
                let total = active.case_ids.len();
                let info = json!({
                    "remaining": total - active.cursor,
                    "total_count": total,
                });
                Ok((case_id, Some(info)))
            }
            _ => {
                let case_id =
                    requested.unwrap_or_else(|| self.rng.borrow_mut().gen_range(1..=MAX_CASE_ID));
                Ok((case_id, None))
            }
        }
    }

    fn competition(&self) -> bool {
        self.pool
            .borrow()
            .as_ref()
            .is_some_and(|pool| pool.mode == PoolMode::Competition)
    }

    fn respond(&self, request: &ApiRequest) -> Result<HttpReply, TransportError> {
        let body = match request {
            ApiRequest::Next(query) => {
                if self.flaky_reads.get() > 0 {
                    self.flaky_reads.set(self.flaky_reads.get() - 1);
                    return Err(TransportError::Network("simulated connection reset".to_string()));
                }
                let (case_id, pool_info) = match self.next_case(query.case_id) {
                    Ok(next) => next,
                    Err(done) => return Ok(HttpReply::ok(self.with_stats(done))),
                };
                let hand = self.hand(case_id);
                self.flags.set(HandFlags::default());
                let mut body = json!({
                    "case_id": case_id,
                    "values": hand.values,
                    "seq": query.seq,
                    "help_disabled": self.competition(),
                });
                if self.game == GameKind::Game24 {
                    body["target"] = json!(query.target.unwrap_or(24));
                }
                if let Some(info) = pool_info {
                    body["pool_info"] = info;
                }
                self.with_stats(body)
            }
            ApiRequest::Check(check) => {
                let Some(hand) = check.case_id.map(|id| self.hand(id)) else {
                    return Ok(HttpReply::new(400, json!({"error": "Missing case_id"})));
                };
                let correct = canonical(&check.answer) == canonical(&hand.solution);
                self.update(|counters, flags| {
                    if !flags.played {
                        flags.played = true;
                        counters.played += 1;
                    }
                    counters.answer_attempts += 1;
                    if correct {
                        counters.answer_correct += 1;
                        if !flags.solved {
                            flags.solved = true;
                            counters.solved += 1;
                        }
                    } else {
                        counters.answer_wrong += 1;
                    }
                });
                let body = if correct {
                    json!({"ok": true, "value": hand.value, "done": true})
                } else {
                    json!({"ok": false, "reason": "Not quite", "expected": hand.value})
                };
                self.with_stats(body)
            }
            ApiRequest::Help(help) => {
                if self.competition() {
                    return Ok(HttpReply::new(
                        403,
                        json!({"error": "Help is disabled in competition mode."}),
                    ));
                }
                let hand = self.hand(help.case_id.unwrap_or(0));
                self.update(|counters, flags| {
                    if !flags.played {
                        flags.played = true;
                        counters.played += 1;
                    }
                    if !flags.revealed {
                        flags.revealed = true;
                        counters.revealed += 1;
                    }
                });
                self.with_stats(json!({
                    "has_solution": true,
                    "solutions": [hand.solution],
                    "expected": hand.value,
                }))
            }
            ApiRequest::Skip(_) => {
                self.update(|counters, flags| {
                    if !flags.solved {
                        counters.skipped += 1;
                    }
                });
                self.with_stats(json!({"ok": true}))
            }
            ApiRequest::Pool(pool) => {
                let active = pool.mode != PoolMode::Off && !pool.case_ids.is_empty();
                *self.pool.borrow_mut() = active.then(|| ServerPool {
                    mode: pool.mode,
                    case_ids: pool.case_ids.clone(),
                    cursor: 0,
                });
                let mut body = json!({
                    "ok": true,
                    "mode": pool.mode,
                    "count": pool.case_ids.len(),
                });
                if let Some(seconds) = pool.duration_sec.filter(|_| pool.mode == PoolMode::Competition) {
                    body["time_left"] = json!(seconds);
                    body["help_disabled"] = json!(true);
                }
                body
            }
            ApiRequest::Restart(_) => {
                self.counters.set(Counters::default());
                self.flags.set(HandFlags::default());
                *self.pool.borrow_mut() = None;
                self.with_stats(json!({"ok": true}))
            }
            ApiRequest::Exit(_) => json!({"ok": true, "next_url": "/"}),
            ApiRequest::Summary(_) => {
                let counters = self.counters.get();
                json!({
                    "ok": true,
                    "play_summary": {
                        "totals": {
                            "solved": counters.solved,
                            "helped": counters.revealed,
                            "incorrect": counters.answer_wrong,
                            "skipped": counters.skipped,
                        }
                    },
                    "export_url": "/export.csv",
                })
            }
            ApiRequest::Finish(_) => {
                self.update(|counters, flags| {
                    if !flags.solved {
                        flags.solved = true;
                        counters.solved += 1;
                    }
                });
                let pool_completed = self
                    .pool
                    .borrow()
                    .as_ref()
                    .is_some_and(|pool| pool.cursor >= pool.case_ids.len());
                self.with_stats(json!({"ok": true, "pool_completed": pool_completed}))
            }
        };
        Ok(HttpReply::ok(body))
    }
}

fn canonical(answer: &str) -> String {
    answer.chars().filter(|c| !c.is_whitespace()).collect()
}

#[async_trait(?Send)]
impl Transport for SimulatedBackend {
    async fn send(&self, request: &ApiRequest) -> Result<HttpReply, TransportError> {
        self.requests.set(self.requests.get() + 1);
        let reply = self.respond(request);
        if let Err(err) = &reply {
            log::debug!("simulated {} failed: {err}", request.endpoint().label());
        }
        reply
    }

    async fn pause(&self, millis: u32) {
        self.pauses.borrow_mut().push(millis);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckmath_game::protocol::{CheckRequest, ClientIds, NextQuery};

    fn ids() -> ClientIds {
        ClientIds {
            client_id: "c".to_string(),
            guest_id: "g".to_string(),
        }
    }

    fn next(seq: u64) -> ApiRequest {
        ApiRequest::Next(NextQuery {
            theme: "classic".to_string(),
            level: "easy".to_string(),
            seq,
            target: None,
            case_id: None,
            ids: ids(),
        })
    }

    #[test]
    fn same_seed_deals_same_hands() {
        let a = SimulatedBackend::new(GameKind::Game24, BackendProfile::STANDARD, 9);
        let b = SimulatedBackend::new(GameKind::Game24, BackendProfile::STANDARD, 9);
        for seq in 1..=3 {
            let left = tokio_test::block_on(a.send(&next(seq))).expect("deal");
            let right = tokio_test::block_on(b.send(&next(seq))).expect("deal");
            assert_eq!(left.body["case_id"], right.body["case_id"]);
            assert_eq!(left.body["values"], right.body["values"]);
        }
    }

    #[test]
    fn flaky_reads_fail_then_recover() {
        let profile = BackendProfile {
            report_stats: true,
            flaky_reads: 1,
        };
        let backend = SimulatedBackend::new(GameKind::Game24, profile, 1);
        assert!(matches!(
            tokio_test::block_on(backend.send(&next(1))),
            Err(TransportError::Network(_))
        ));
        assert!(tokio_test::block_on(backend.send(&next(1))).is_ok());
        assert_eq!(backend.requests(), 2);
    }

    #[test]
    fn retried_reads_pause_between_attempts() {
        let profile = BackendProfile {
            report_stats: true,
            flaky_reads: 1,
        };
        let backend = SimulatedBackend::new(GameKind::Game24, profile, 1);
        let policy = deckmath_game::RetryPolicy::default();
        let reply = tokio_test::block_on(deckmath_game::send_with_retry(&backend, &policy, &next(1)))
            .expect("retry succeeds");
        assert!(reply.body["case_id"].is_u64());
        assert_eq!(backend.pauses(), vec![policy.delay_before(1)]);
    }

    #[test]
    fn stats_follow_the_profile() {
        let silent = BackendProfile {
            report_stats: false,
            flaky_reads: 0,
        };
        let backend = SimulatedBackend::new(GameKind::Game24, silent, 3);
        let reply = tokio_test::block_on(backend.send(&next(1))).expect("deal");
        assert!(reply.body.get("stats").is_none());

        let backend = SimulatedBackend::new(GameKind::Game24, BackendProfile::STANDARD, 3);
        let reply = tokio_test::block_on(backend.send(&next(1))).expect("deal");
        let case_id = reply.body["case_id"].as_u64().and_then(|id| u32::try_from(id).ok());
        let values: Vec<u32> = serde_json::from_value(reply.body["values"].clone()).expect("values");
        let answer = values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" + ");
        let check = ApiRequest::Check(CheckRequest {
            values,
            answer,
            case_id,
            target: None,
            step: None,
            ids: ids(),
        });
        let reply = tokio_test::block_on(backend.send(&check)).expect("check");
        assert_eq!(reply.body["ok"], json!(true));
        assert_eq!(reply.body["stats"]["solved"], json!(1));
        assert_eq!(reply.body["stats"]["played"], json!(1));
    }
}
