use serde::de::DeserializeOwned;

use super::{Effect, PendingKind, Phase, PlayMode, SessionController, StatusLine, Ticket};
use crate::Clock;
use crate::auto_advance::ScheduledAction;
use crate::envelope::PuzzleEnvelope;
use crate::pool::{PoolConfiguration, PoolMode};
use crate::protocol::{
    ApiRequest, CheckReply, Endpoint, ErrorBody, ExitReply, FinishReply, FinishRequest,
    HelpReply, HttpReply, NextReply, PoolReply, ProtocolError, RestartReply, SkipReply,
    SummaryRequest,
};
use crate::reveal::RevealTransition;
use crate::rules::GameRules;
use crate::stats::LocalOutcome;
use crate::summary::SessionSummary;
use crate::transport::TransportError;

/// Why a reply could not be used.
enum ReplyFailure {
    Transport(TransportError),
    Rejected { status: u16, body: ErrorBody },
    Malformed(ProtocolError),
}

impl ReplyFailure {
    fn describe(&self, action: &str) -> String {
        match self {
            Self::Transport(err) => format!("Failed to {action}: {err}"),
            Self::Rejected { status, body } => body
                .best_message()
                .map_or_else(|| format!("Failed to {action}: HTTP {status}"), ToString::to_string),
            Self::Malformed(err) => format!("Failed to {action}: {err}"),
        }
    }

    const fn competition_over(&self) -> bool {
        matches!(self, Self::Rejected { status: 403, body } if body.competition_over)
    }
}

fn decode_reply<T: DeserializeOwned>(
    reply: Result<HttpReply, TransportError>,
    endpoint: Endpoint,
) -> Result<T, ReplyFailure> {
    let reply = reply.map_err(ReplyFailure::Transport)?;
    if !reply.is_success() {
        return Err(ReplyFailure::Rejected {
            status: reply.status,
            body: reply.error_body(),
        });
    }
    reply.decode(endpoint).map_err(ReplyFailure::Malformed)
}

impl<R: GameRules, C: Clock> SessionController<R, C> {
    /// Apply the outcome of the request identified by `ticket`.
    ///
    /// Unknown tickets and replies for a superseded hand are dropped.
    pub fn handle_reply(
        &mut self,
        ticket: Ticket,
        reply: Result<HttpReply, TransportError>,
    ) -> Vec<Effect> {
        let Some(pending) = self.outstanding.remove(&ticket) else {
            log::debug!("dropping reply for unknown ticket {}", ticket.0);
            return Vec::new();
        };
        if pending.kind.is_hand_bound() && pending.epoch != self.epoch {
            log::debug!("dropping stale {} reply", pending.kind.label());
            return Vec::new();
        }
        match pending.kind {
            PendingKind::Deal {
                sent_sequence,
                advance,
            } => self.on_deal(sent_sequence, advance, reply),
            PendingKind::Check { counts_play } => self.on_check(counts_play, reply),
            PendingKind::Help {
                all,
                counts_play,
                counts_reveal,
            } => self.on_help(all, counts_play, counts_reveal, reply),
            PendingKind::Skip { counts_skip } => {
                let current = pending.epoch == self.epoch;
                self.on_skip(counts_skip, current, reply)
            }
            PendingKind::Finish { answer } => self.on_finish(answer, reply),
            PendingKind::PoolSave(config) => self.on_pool_saved(config, reply),
            PendingKind::PoolOff => {
                if let Err(failure) = decode_reply::<PoolReply>(reply, Endpoint::Pool) {
                    log::warn!("{}", failure.describe("turn the pool off"));
                }
                Vec::new()
            }
            PendingKind::Restart => self.on_restart(reply),
            PendingKind::Exit => self.on_exit(reply),
            PendingKind::Summary => self.on_summary(reply),
        }
    }

    fn on_deal(
        &mut self,
        sent_sequence: u64,
        advance: bool,
        reply: Result<HttpReply, TransportError>,
    ) -> Vec<Effect> {
        self.state.deal_in_flight = false;
        let next: NextReply = match decode_reply(reply, Endpoint::Next) {
            Ok(next) => next,
            Err(failure) if failure.competition_over() => {
                return self.end_competition("Competition over! Here is your summary.");
            }
            Err(failure) => {
                self.state.phase = Phase::Idle;
                self.status = StatusLine::error(failure.describe("get a new question"));
                return Vec::new();
            }
        };
        if let Some(stats) = next.stats.as_ref() {
            self.stats.apply_server(stats);
        }
        if next.ok == Some(false) {
            self.state.phase = Phase::Idle;
            self.status = StatusLine::error(
                next.error
                    .unwrap_or_else(|| "Failed to get a new question.".to_string()),
            );
            return Vec::new();
        }
        let Some(envelope) = PuzzleEnvelope::from_next_reply(&next) else {
            if next.pool_done {
                return self.enter_pool_complete();
            }
            self.state.phase = Phase::Idle;
            self.status =
                StatusLine::error("Failed to get a new question: the reply had no cards.");
            return Vec::new();
        };

        if advance {
            self.state.display_sequence = envelope.seq.filter(|seq| *seq >= 1).unwrap_or(sent_sequence);
            self.state.next_request_sequence = sent_sequence + 1;
        }
        if self.rules.capabilities().variable_target
            && let Some(target) = envelope.target
        {
            self.state.target = target;
        }
        self.state.help_disabled =
            envelope.help_disabled || self.state.mode == PlayMode::Competition;
        if let Some(seconds) = envelope.time_left {
            self.state.time_left_secs = Some(seconds);
            self.state.time_left_at_ms = self.clock.now_ms();
        }
        self.reveal.reset(envelope.reveal.clone());
        self.state.reveal_step = self.reveal.step();
        self.state.current_envelope = Some(envelope);
        self.state.phase = Phase::Playing;
        let settled = self.timer.start(self.clock.now_ms());
        self.stats.add_seconds(settled);
        self.status = StatusLine::default();
        Vec::new()
    }

    fn on_check(
        &mut self,
        counts_play: bool,
        reply: Result<HttpReply, TransportError>,
    ) -> Vec<Effect> {
        self.answer_in_flight = false;
        let decoded = decode_reply::<CheckReply>(reply, Endpoint::Check);
        if decoded.is_err() && counts_play {
            self.state.release_played();
        }
        let check = match decoded {
            Ok(check) => check,
            Err(failure) if failure.competition_over() => {
                return self.end_competition("Competition over! Here is your summary.");
            }
            Err(failure) => {
                self.status = StatusLine::error(failure.describe("check the answer"));
                return Vec::new();
            }
        };
        if self.rules.capabilities().variable_target
            && let Some(target) = check.target
        {
            self.state.target = target;
        }
        if !check.ok {
            self.stats.reconcile(check.stats.as_ref(), |mirror| {
                if counts_play {
                    mirror.bump(LocalOutcome::Played);
                }
                mirror.add_attempt();
                mirror.bump(LocalOutcome::Incorrect);
            });
            self.status = StatusLine::error(self.rules.failure_message(&check));
            return Vec::new();
        }
        if self.rules.capabilities().reveal_stepping {
            return self.on_partial_sum(counts_play, &check);
        }

        self.settle_timer();
        self.stats.reconcile(check.stats.as_ref(), |mirror| {
            if counts_play {
                mirror.bump(LocalOutcome::Played);
            }
            mirror.add_attempt();
            mirror.bump(LocalOutcome::Solved);
        });
        self.state.solved_this_hand = true;
        self.state.phase = Phase::Solved;
        self.status = StatusLine::success(self.rules.success_message(&check, self.state.target));
        self.after_solve()
    }

    /// A correct running total: flip the next group or finish the plan.
    fn on_partial_sum(&mut self, counts_play: bool, check: &CheckReply) -> Vec<Effect> {
        self.stats.reconcile(check.stats.as_ref(), |mirror| {
            if counts_play {
                mirror.bump(LocalOutcome::Played);
            }
            mirror.add_attempt();
        });
        let transition = self
            .reveal
            .advance(check.next_step, check.done || check.complete);
        self.state.reveal_step = self.reveal.step();
        match transition {
            RevealTransition::Revealed(_) => {
                self.status = StatusLine::info("👍 Keep going…");
                Vec::new()
            }
            RevealTransition::Completed(_) | RevealTransition::Unchanged => self.finish_reveal(),
        }
    }

    fn finish_reveal(&mut self) -> Vec<Effect> {
        let Some(envelope) = self.state.current_envelope.as_ref() else {
            return Vec::new();
        };
        let answer: i64 = envelope.values.iter().map(|v| i64::from(*v)).sum();
        let formula = self.reveal.formula(&envelope.values);
        let request = ApiRequest::Finish(FinishRequest {
            case_id: envelope.case_id,
            answer,
            ids: self.ids(),
        });
        self.state.phase = Phase::Finishing;
        self.status = StatusLine::info(formula);
        vec![self.send(PendingKind::Finish { answer }, request)]
    }

    fn on_finish(&mut self, answer: i64, reply: Result<HttpReply, TransportError>) -> Vec<Effect> {
        self.settle_timer();
        self.state.solved_this_hand = true;
        self.state.phase = Phase::Solved;
        match decode_reply::<FinishReply>(reply, Endpoint::Finish) {
            Ok(finish) if finish.ok != Some(false) => {
                self.stats
                    .reconcile(finish.stats.as_ref(), |mirror| mirror.bump(LocalOutcome::Solved));
                let confirmed = CheckReply {
                    ok: true,
                    value: Some(answer),
                    ..CheckReply::default()
                };
                self.status =
                    StatusLine::success(self.rules.success_message(&confirmed, self.state.target));
                if finish.pool_completed {
                    return self.enter_pool_complete();
                }
                self.after_solve()
            }
            Ok(finish) => {
                self.status = StatusLine::error(format!(
                    "✗ {}",
                    finish
                        .reason
                        .as_deref()
                        .unwrap_or("Could not record the result.")
                ));
                Vec::new()
            }
            Err(failure) if failure.competition_over() => {
                self.end_competition("Competition over! Here is your summary.")
            }
            Err(failure) => {
                self.status = StatusLine::error(failure.describe("record the result"));
                Vec::new()
            }
        }
    }

    fn on_help(
        &mut self,
        all: bool,
        counts_play: bool,
        counts_reveal: bool,
        reply: Result<HttpReply, TransportError>,
    ) -> Vec<Effect> {
        self.hint_in_flight = false;
        let decoded = decode_reply::<HelpReply>(reply, Endpoint::Help);
        if decoded.is_err() {
            if counts_play {
                self.state.release_played();
            }
            if counts_reveal {
                self.state.release_revealed();
            }
        }
        match decoded {
            Ok(help) => {
                self.stats.reconcile(help.stats.as_ref(), |mirror| {
                    if counts_play {
                        mirror.bump(LocalOutcome::Played);
                    }
                    if counts_reveal {
                        mirror.bump(LocalOutcome::Revealed);
                    }
                });
                if self.rules.capabilities().variable_target
                    && let Some(target) = help.target
                {
                    self.state.target = target;
                }
                self.hint = Some(self.rules.hint_panel(&help, all, self.state.target));
                Vec::new()
            }
            Err(failure) if failure.competition_over() => {
                self.end_competition("Competition over! Here is your summary.")
            }
            Err(failure) => {
                self.status = StatusLine::error(failure.describe("load help"));
                Vec::new()
            }
        }
    }

    /// Record the skip, then deal unless the table moved on while it was in flight.
    fn on_skip(
        &mut self,
        counts_skip: bool,
        current: bool,
        reply: Result<HttpReply, TransportError>,
    ) -> Vec<Effect> {
        if current {
            self.state.deal_in_flight = false;
        }
        match decode_reply::<SkipReply>(reply, Endpoint::Skip) {
            Ok(skip) => {
                self.stats.reconcile(skip.stats.as_ref(), |mirror| {
                    if counts_skip {
                        mirror.bump(LocalOutcome::Skipped);
                    }
                });
            }
            Err(failure) if failure.competition_over() => {
                return self.end_competition("Competition over! Here is your summary.");
            }
            Err(failure) => log::warn!("{}", failure.describe("record the skip")),
        }
        if !current || self.state.session_ended {
            log::debug!("skip settled after the table changed; not dealing");
            return Vec::new();
        }
        self.deal(true, None)
    }

    fn on_pool_saved(
        &mut self,
        config: PoolConfiguration,
        reply: Result<HttpReply, TransportError>,
    ) -> Vec<Effect> {
        match decode_reply::<PoolReply>(reply, Endpoint::Pool) {
            Ok(pool) if pool.ok => {
                let mode = config.mode;
                let count = pool.count.unwrap_or(config.case_ids.len());
                self.state.mode = PlayMode::from_pool_mode(mode);
                self.state.level = mode.as_str().to_string();
                self.state.help_disabled =
                    pool.help_disabled.unwrap_or(mode == PoolMode::Competition);
                self.state.time_left_secs = pool.time_left.or(config.duration_sec);
                self.state.time_left_at_ms = self.clock.now_ms();
                self.state.display_sequence = 0;
                self.state.next_request_sequence = 1;
                self.pool = config;
                self.status = StatusLine::success(format!(
                    "Pool saved ({count} case IDs) for {}. Press Deal to start.",
                    mode.as_str()
                ));
            }
            Ok(pool) => {
                self.status = StatusLine::error(
                    pool.reason
                        .or(pool.message)
                        .unwrap_or_else(|| "Failed to save pool.".to_string()),
                );
            }
            Err(failure) => {
                self.status = StatusLine::error(failure.describe("save pool"));
            }
        }
        Vec::new()
    }

    fn on_restart(&mut self, reply: Result<HttpReply, TransportError>) -> Vec<Effect> {
        self.restart_pending = false;
        match decode_reply::<RestartReply>(reply, Endpoint::Restart) {
            Ok(restart) => {
                if let Some(stats) = restart.stats.as_ref() {
                    self.stats.apply_server(stats);
                }
            }
            Err(failure) => log::warn!("{}", failure.describe("restart on the server")),
        }
        self.status = StatusLine::info("Session restarted.");
        self.deal(true, None)
    }

    fn on_exit(&mut self, reply: Result<HttpReply, TransportError>) -> Vec<Effect> {
        self.exit_pending = false;
        let destination = match decode_reply::<ExitReply>(reply, Endpoint::Exit) {
            Ok(exit) => {
                if let Some(stats) = exit.stats.as_ref() {
                    self.stats.apply_server(stats);
                }
                exit.destination().map(ToString::to_string)
            }
            Err(failure) => {
                log::warn!("{}", failure.describe("close the session"));
                None
            }
        };
        vec![Effect::Navigate {
            url: destination.unwrap_or_else(|| self.config.exit_url.clone()),
        }]
    }

    fn on_summary(&mut self, reply: Result<HttpReply, TransportError>) -> Vec<Effect> {
        match decode_reply::<SessionSummary>(reply, Endpoint::Summary) {
            Ok(summary) => {
                if let Some(stats) = summary.stats.as_ref() {
                    self.stats.apply_server(stats);
                }
                self.summary = Some(summary);
            }
            Err(failure) => {
                self.status = StatusLine::error(failure.describe("load the summary"));
            }
        }
        Vec::new()
    }

    /// Decide what follows a solved puzzle: end of pool, auto-advance, or
    /// nothing.
    fn after_solve(&mut self) -> Vec<Effect> {
        let ends_pool = self
            .state
            .current_envelope
            .as_ref()
            .is_some_and(PuzzleEnvelope::ends_pool);
        if ends_pool {
            return self.enter_pool_complete();
        }
        if !self.state.auto_advance_enabled {
            return Vec::new();
        }
        let delay = self
            .config
            .advance_delay_ms
            .unwrap_or_else(|| self.rules.advance_delay_ms());
        self.schedule(ScheduledAction::DealNext, delay)
    }

    /// The pool ran dry: fetch the summary and fall back to single play
    /// after a pause. Never deals.
    fn enter_pool_complete(&mut self) -> Vec<Effect> {
        let mut effects = self.cancel_advance();
        self.settle_timer();
        self.state.phase = Phase::PoolComplete;
        self.state.auto_advance_enabled = false;
        self.status = StatusLine::success("Pool completed! Returning to easy mode.");
        let request = ApiRequest::Summary(SummaryRequest { ids: self.ids() });
        effects.push(self.send(PendingKind::Summary, request));
        let delay = self.config.pool_reset_delay_ms;
        effects.extend(self.schedule(ScheduledAction::ReturnToSingle, delay));
        effects
    }

    /// Competition time is over: freeze the table and fetch the summary.
    pub(super) fn end_competition(&mut self, message: &str) -> Vec<Effect> {
        if self.state.session_ended {
            return Vec::new();
        }
        let mut effects = self.cancel_advance();
        self.settle_timer();
        self.state.session_ended = true;
        self.state.deal_in_flight = false;
        self.state.phase = Phase::Ended;
        self.state.time_left_secs = Some(0);
        self.status = StatusLine::info(message);
        let request = ApiRequest::Summary(SummaryRequest { ids: self.ids() });
        effects.push(self.send(PendingKind::Summary, request));
        effects
    }
}
