//! Shared session state machine.
//!
//! Every operation mutates the controller and returns the [`Effect`]s the
//! host must run: requests to send, timers to arm or drop, pages to open.
//! Replies are fed back through [`SessionController::handle_reply`] with the
//! ticket of the request they answer. The controller never performs I/O and
//! reads time only through its [`Clock`].

mod effect;
mod replies;
mod state;

pub use effect::{Effect, EffectsExt, Ticket};
pub use state::{Phase, PlayMode, SessionState, StatusLine, StatusTone};

use std::collections::HashMap;

use crate::Clock;
use crate::auto_advance::{AdvanceToken, AutoAdvanceTimer, ScheduledAction};
use crate::config::{LEVELS, SessionConfig, clamp_target};
use crate::constants::DEFAULT_LEVEL;
use crate::identity::SessionIdentity;
use crate::pool::{PoolConfiguration, PoolMode, validate_case_id};
use crate::protocol::{
    ApiRequest, CheckRequest, ClientIds, ExitRequest, HelpRequest, NextQuery, PoolRequest,
    RestartRequest, SkipRequest, SummaryRequest,
};
use crate::reveal::RevealScheduler;
use crate::rules::{GameRules, HintPanel};
use crate::stats::{StatsMirror, StatsSnapshot};
use crate::summary::SessionSummary;
use crate::timer::PuzzleTimer;

/// What an outstanding request was for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingKind {
    Deal { sent_sequence: u64, advance: bool },
    Check { counts_play: bool },
    Help { all: bool, counts_play: bool, counts_reveal: bool },
    Skip { counts_skip: bool },
    Finish { answer: i64 },
    PoolSave(PoolConfiguration),
    PoolOff,
    Restart,
    Exit,
    Summary,
}

impl PendingKind {
    /// Replies that only make sense for the hand they were issued against.
    const fn is_hand_bound(&self) -> bool {
        matches!(
            self,
            Self::Deal { .. } | Self::Check { .. } | Self::Help { .. } | Self::Finish { .. }
        )
    }

    const fn label(&self) -> &'static str {
        match self {
            Self::Deal { .. } => "deal",
            Self::Check { .. } => "check",
            Self::Help { .. } => "help",
            Self::Skip { .. } => "skip",
            Self::Finish { .. } => "finish",
            Self::PoolSave(_) => "pool",
            Self::PoolOff => "pool-off",
            Self::Restart => "restart",
            Self::Exit => "exit",
            Self::Summary => "summary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending {
    kind: PendingKind,
    epoch: u64,
}

/// One table of play, parameterised by the variant's rules and a clock.
pub struct SessionController<R: GameRules, C: Clock> {
    rules: R,
    clock: C,
    config: SessionConfig,
    identity: SessionIdentity,
    state: SessionState,
    stats: StatsMirror,
    timer: PuzzleTimer,
    reveal: RevealScheduler,
    advance: AutoAdvanceTimer,
    pool: PoolConfiguration,
    status: StatusLine,
    hint: Option<HintPanel>,
    summary: Option<SessionSummary>,
    outstanding: HashMap<Ticket, Pending>,
    issued: u64,
    epoch: u64,
    answer_in_flight: bool,
    hint_in_flight: bool,
    restart_pending: bool,
    exit_pending: bool,
}

impl<R: GameRules, C: Clock> SessionController<R, C> {
    pub fn new(rules: R, clock: C, config: SessionConfig, identity: SessionIdentity) -> Self {
        let state = SessionState::new(
            config.level.clone(),
            config.theme.clone(),
            config.target,
            config.auto_advance,
        );
        let mut controller = Self {
            rules,
            clock,
            config,
            identity,
            state,
            stats: StatsMirror::default(),
            timer: PuzzleTimer::default(),
            reveal: RevealScheduler::default(),
            advance: AutoAdvanceTimer::default(),
            pool: PoolConfiguration::off(),
            status: StatusLine::default(),
            hint: None,
            summary: None,
            outstanding: HashMap::new(),
            issued: 0,
            epoch: 0,
            answer_in_flight: false,
            hint_in_flight: false,
            restart_pending: false,
            exit_pending: false,
        };
        // A pool level only makes sense once a pool is saved.
        let mode = PoolMode::from_level(&controller.state.level);
        if mode != PoolMode::Off && controller.rules.capabilities().pool_modes {
            controller.state.mode = PlayMode::from_pool_mode(mode);
        } else if mode != PoolMode::Off {
            controller.state.level = DEFAULT_LEVEL.to_string();
        }
        controller
    }

    #[must_use]
    pub const fn rules(&self) -> &R {
        &self.rules
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub const fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub const fn stats(&self) -> &StatsSnapshot {
        self.stats.snapshot()
    }

    #[must_use]
    pub const fn status(&self) -> &StatusLine {
        &self.status
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&HintPanel> {
        self.hint.as_ref()
    }

    #[must_use]
    pub const fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    #[must_use]
    pub const fn pool(&self) -> &PoolConfiguration {
        &self.pool
    }

    #[must_use]
    pub const fn reveal(&self) -> &RevealScheduler {
        &self.reveal
    }

    #[must_use]
    pub const fn is_advance_pending(&self) -> bool {
        self.advance.is_pending()
    }

    #[must_use]
    pub fn pending_action(&self) -> Option<ScheduledAction> {
        self.advance.pending_action()
    }

    /// Requests sent but not yet answered.
    #[must_use]
    pub fn outstanding_requests(&self) -> usize {
        self.outstanding.len()
    }

    #[must_use]
    pub fn puzzle_elapsed_ms(&self) -> u64 {
        self.timer.elapsed_ms(self.clock.now_ms())
    }

    #[must_use]
    pub fn view(&self) -> crate::view::SessionView {
        crate::view::SessionView::build(self)
    }

    #[must_use]
    pub fn help_disabled(&self) -> bool {
        self.state.help_disabled
            || self.state.mode == PlayMode::Competition
            || self
                .state
                .current_envelope
                .as_ref()
                .is_some_and(|envelope| envelope.help_disabled)
    }

    /// Request a new puzzle.
    ///
    /// With `explicit_case_id` the sequence counters stay where they are.
    pub fn deal(&mut self, advance_sequence: bool, explicit_case_id: Option<u32>) -> Vec<Effect> {
        if self.state.session_ended {
            log::debug!("deal ignored: session has ended");
            return Vec::new();
        }
        if self.state.deal_in_flight || self.restart_pending {
            log::debug!("deal ignored: another deal is in flight");
            return Vec::new();
        }
        let mut effects = self.cancel_advance();
        self.settle_timer();
        self.reset_hand();
        self.state.deal_in_flight = true;
        self.state.phase = Phase::Dealing;

        let seq = self.state.next_request_sequence;
        let request = ApiRequest::Next(NextQuery {
            theme: self.state.theme.clone(),
            level: self.state.level.clone(),
            seq,
            target: self.wire_target(),
            case_id: explicit_case_id,
            ids: self.ids(),
        });
        let kind = PendingKind::Deal {
            sent_sequence: seq,
            advance: advance_sequence && explicit_case_id.is_none(),
        };
        effects.push(self.send(kind, request));
        effects
    }

    /// Submit the player's answer for the active puzzle.
    pub fn submit_answer(&mut self, raw_input: &str) -> Vec<Effect> {
        if self.state.session_ended || self.state.phase != Phase::Playing {
            return Vec::new();
        }
        let Some(envelope) = self.state.current_envelope.as_ref() else {
            return Vec::new();
        };
        if self.answer_in_flight {
            log::debug!("answer ignored: previous answer still being checked");
            return Vec::new();
        }
        let answer = match self.rules.prepare_answer(raw_input) {
            Ok(answer) => answer,
            Err(rejection) => {
                self.status = StatusLine::warning(rejection.to_string());
                return Vec::new();
            }
        };
        let values = envelope.values.clone();
        let case_id = envelope.case_id;

        let mut effects = self.cancel_advance();
        let counts_play = self.state.note_played();
        self.answer_in_flight = true;
        let request = ApiRequest::Check(CheckRequest {
            values,
            answer,
            case_id,
            target: self.wire_target(),
            step: self.wire_step(),
            ids: self.ids(),
        });
        effects.push(self.send(PendingKind::Check { counts_play }, request));
        effects
    }

    /// Ask for one solution, or all of them.
    pub fn request_hint(&mut self, all: bool) -> Vec<Effect> {
        if self.state.session_ended
            || !matches!(self.state.phase, Phase::Playing | Phase::Solved)
        {
            return Vec::new();
        }
        if self.help_disabled() {
            self.status = StatusLine::warning("Help is disabled in competition mode.");
            return Vec::new();
        }
        let Some(envelope) = self.state.current_envelope.as_ref() else {
            return Vec::new();
        };
        if self.hint_in_flight {
            return Vec::new();
        }
        let values = envelope.values.clone();
        let case_id = envelope.case_id;

        let mut effects = self.cancel_advance();
        let counts_play = self.state.note_played();
        let counts_reveal = self.state.note_revealed();
        self.hint_in_flight = true;
        let request = ApiRequest::Help(HelpRequest {
            values,
            all,
            case_id,
            target: self.wire_target(),
            step: self.wire_step(),
            ids: self.ids(),
        });
        let kind = PendingKind::Help {
            all,
            counts_play,
            counts_reveal,
        };
        effects.push(self.send(kind, request));
        effects
    }

    /// Abandon the current puzzle. The next deal waits for the skip reply.
    pub fn skip(&mut self) -> Vec<Effect> {
        if self.state.session_ended || self.state.deal_in_flight || self.restart_pending {
            log::debug!("skip ignored: session busy or ended");
            return Vec::new();
        }
        let mut effects = self.cancel_advance();
        let Some(envelope) = self.state.current_envelope.as_ref() else {
            effects.extend(self.deal(true, None));
            return effects;
        };
        let request = ApiRequest::Skip(SkipRequest {
            values: envelope.values.clone(),
            case_id: envelope.case_id,
            ids: self.ids(),
        });
        let counts_skip = !self.state.solved_this_hand;
        self.settle_timer();
        self.state.deal_in_flight = true;
        self.state.phase = Phase::Dealing;
        effects.push(self.send(PendingKind::Skip { counts_skip }, request));
        effects
    }

    /// Wipe the session and deal a fresh puzzle once the server confirms.
    pub fn restart_session(&mut self) -> Vec<Effect> {
        if self.restart_pending {
            log::debug!("restart ignored: one is already outstanding");
            return Vec::new();
        }
        let mut effects = self.cancel_advance();
        self.settle_timer();
        self.timer.clear();
        self.outstanding.clear();
        self.epoch += 1;

        let pool_was_active = self.pool.is_active();
        let level = if PoolMode::from_level(&self.state.level) == PoolMode::Off {
            self.state.level.clone()
        } else {
            self.single_level()
        };
        self.state = SessionState::new(
            level,
            self.state.theme.clone(),
            self.state.target,
            self.config.auto_advance,
        );
        self.pool = PoolConfiguration::off();
        self.stats.reset();
        self.reveal = RevealScheduler::default();
        self.hint = None;
        self.summary = None;
        self.answer_in_flight = false;
        self.hint_in_flight = false;
        self.exit_pending = false;
        self.restart_pending = true;
        self.status = StatusLine::info("Restarting session…");

        if pool_was_active {
            effects.push(self.pool_off_request());
        }
        let request = ApiRequest::Restart(RestartRequest {
            target: self.wire_target(),
            ids: self.ids(),
        });
        effects.push(self.send(PendingKind::Restart, request));
        effects
    }

    /// Switch between single play and the pool modes.
    ///
    /// Leaving a pool notifies the server and waits for a manual deal.
    /// Entering one only records the mode until [`Self::save_pool`].
    pub fn set_mode(&mut self, mode: PlayMode) -> Vec<Effect> {
        if mode == self.state.mode {
            return Vec::new();
        }
        if mode.is_pool() && !self.rules.capabilities().pool_modes {
            self.status = StatusLine::warning("Pools are not available for this game.");
            return Vec::new();
        }
        let mut effects = self.cancel_advance();
        if mode == PlayMode::Single {
            if self.pool.is_active() {
                effects.push(self.pool_off_request());
            }
            self.pool = PoolConfiguration::off();
            self.state.mode = PlayMode::Single;
            if PoolMode::from_level(&self.state.level) != PoolMode::Off {
                self.state.level = self.single_level();
            }
            self.state.help_disabled = false;
            self.state.time_left_secs = None;
            self.enter_idle();
            self.status = StatusLine::info("Pool off. Press Deal to start.");
        } else {
            self.state.mode = mode;
            self.state.level = mode.pool_mode().as_str().to_string();
            self.status = StatusLine::info("Enter case IDs, then save the pool.");
        }
        effects
    }

    /// Pick a level. Pool levels switch mode; a difficulty level while pooled
    /// turns the pool off and keeps the chosen level.
    pub fn set_level(&mut self, level: &str) -> Vec<Effect> {
        if !LEVELS.contains(&level) {
            self.status = StatusLine::warning(format!("Unknown level '{level}'."));
            return Vec::new();
        }
        match PoolMode::from_level(level) {
            PoolMode::Off => {
                let effects = if self.state.mode.is_pool() {
                    self.set_mode(PlayMode::Single)
                } else {
                    Vec::new()
                };
                self.state.level = level.to_string();
                effects
            }
            pool => self.set_mode(PlayMode::from_pool_mode(pool)),
        }
    }

    /// Choose the target for variable-target games. Returns the value kept.
    pub fn set_target(&mut self, target: i64) -> i32 {
        if !self.rules.capabilities().variable_target {
            log::debug!("target ignored: fixed-target game");
            return self.state.target;
        }
        self.state.target = clamp_target(target);
        self.state.target
    }

    pub fn set_auto_advance(&mut self, enabled: bool) -> Vec<Effect> {
        self.state.auto_advance_enabled = enabled;
        if enabled {
            Vec::new()
        } else {
            self.cancel_advance()
        }
    }

    /// Jump to a specific case without advancing the sequence.
    pub fn load_case(&mut self, case_id: i64) -> Vec<Effect> {
        let case_id = match validate_case_id(case_id) {
            Ok(id) => id,
            Err(err) => {
                self.status = StatusLine::warning(err.to_string());
                return Vec::new();
            }
        };
        if self.state.mode.is_pool() {
            self.state.auto_advance_enabled = false;
        }
        self.deal(false, Some(case_id))
    }

    /// Validate and send a pool for the current pool mode.
    pub fn save_pool(&mut self, case_text: &str, competition_minutes: Option<u32>) -> Vec<Effect> {
        if !self.rules.capabilities().pool_modes {
            self.status = StatusLine::warning("Pools are not available for this game.");
            return Vec::new();
        }
        let config = match PoolConfiguration::from_input(
            self.state.mode.pool_mode(),
            case_text,
            competition_minutes,
        ) {
            Ok(config) => config,
            Err(err) => {
                self.status = StatusLine::warning(err.to_string());
                return Vec::new();
            }
        };
        let mut effects = self.cancel_advance();
        self.enter_idle();
        let request = ApiRequest::Pool(PoolRequest {
            mode: config.mode,
            case_ids: config.case_ids.clone(),
            duration_sec: config.duration_sec,
            ids: self.ids(),
        });
        self.status = StatusLine::info("Saving pool…");
        effects.push(self.send(PendingKind::PoolSave(config), request));
        effects
    }

    /// Close the session; the reply decides where the host navigates.
    pub fn exit(&mut self) -> Vec<Effect> {
        if self.exit_pending {
            return Vec::new();
        }
        let mut effects = self.cancel_advance();
        self.settle_timer();
        self.exit_pending = true;
        self.state.session_ended = true;
        self.state.phase = Phase::Ended;
        self.status = StatusLine::info("Saving your session…");
        let request = ApiRequest::Exit(ExitRequest {
            stats: *self.stats.snapshot(),
            ids: self.ids(),
        });
        effects.push(self.send(PendingKind::Exit, request));
        effects
    }

    pub fn request_summary(&mut self) -> Vec<Effect> {
        let request = ApiRequest::Summary(SummaryRequest { ids: self.ids() });
        vec![self.send(PendingKind::Summary, request)]
    }

    /// Check the competition countdown; expiry ends the session.
    pub fn tick(&mut self) -> Vec<Effect> {
        if self.state.session_ended || self.state.mode != PlayMode::Competition {
            return Vec::new();
        }
        match self.state.seconds_left(self.clock.now_ms()) {
            Some(0) => self.end_competition("Time is up! Competition over."),
            _ => Vec::new(),
        }
    }

    /// Host timer callback. Tokens other than the armed one are ignored.
    pub fn fire_scheduled(&mut self, token: AdvanceToken) -> Vec<Effect> {
        match self.advance.fire(token) {
            Some(ScheduledAction::DealNext) => self.deal(true, None),
            Some(ScheduledAction::ReturnToSingle) => self.return_to_single(),
            None => {
                log::debug!("ignoring stale timer {}", token.0);
                Vec::new()
            }
        }
    }

    fn send(&mut self, kind: PendingKind, request: ApiRequest) -> Effect {
        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.outstanding.insert(
            ticket,
            Pending {
                kind,
                epoch: self.epoch,
            },
        );
        Effect::Send { ticket, request }
    }

    fn ids(&self) -> ClientIds {
        self.identity.ids().clone()
    }

    fn wire_target(&self) -> Option<i32> {
        self.rules
            .capabilities()
            .variable_target
            .then_some(self.state.target)
    }

    fn wire_step(&self) -> Option<u32> {
        self.rules
            .capabilities()
            .reveal_stepping
            .then(|| u32::try_from(self.reveal.correct_submissions()).unwrap_or(u32::MAX))
    }

    fn single_level(&self) -> String {
        if PoolMode::from_level(&self.config.level) == PoolMode::Off {
            self.config.level.clone()
        } else {
            DEFAULT_LEVEL.to_string()
        }
    }

    fn cancel_advance(&mut self) -> Vec<Effect> {
        self.advance
            .cancel()
            .map(|token| Effect::Cancel { token })
            .into_iter()
            .collect()
    }

    fn schedule(&mut self, action: ScheduledAction, delay_ms: u32) -> Vec<Effect> {
        let (token, displaced) = self.advance.schedule(action);
        let mut effects: Vec<Effect> = displaced
            .map(|token| Effect::Cancel { token })
            .into_iter()
            .collect();
        effects.push(Effect::Schedule { token, delay_ms });
        effects
    }

    /// Move any running puzzle interval into the session total.
    fn settle_timer(&mut self) {
        let seconds = self.timer.accumulate(self.clock.now_ms());
        self.stats.add_seconds(seconds);
    }

    /// Clear the table for a new hand; late replies for the old one are
    /// dropped by the epoch check.
    fn reset_hand(&mut self) {
        self.epoch += 1;
        self.state.clear_hand();
        self.reveal = RevealScheduler::default();
        self.hint = None;
        self.answer_in_flight = false;
        self.hint_in_flight = false;
    }

    fn enter_idle(&mut self) {
        self.settle_timer();
        self.reset_hand();
        self.state.deal_in_flight = false;
        self.state.phase = Phase::Idle;
    }

    fn pool_off_request(&mut self) -> Effect {
        let request = ApiRequest::Pool(PoolRequest {
            mode: PoolMode::Off,
            case_ids: Vec::new(),
            duration_sec: None,
            ids: self.ids(),
        });
        self.send(PendingKind::PoolOff, request)
    }

    fn return_to_single(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.pool.is_active() || self.state.mode.is_pool() {
            effects.push(self.pool_off_request());
        }
        self.pool = PoolConfiguration::off();
        self.state.mode = PlayMode::Single;
        self.state.level = DEFAULT_LEVEL.to_string();
        self.state.auto_advance_enabled = self.config.auto_advance;
        self.state.help_disabled = false;
        self.state.time_left_secs = None;
        self.state.display_sequence = 0;
        self.state.next_request_sequence = 1;
        self.enter_idle();
        self.status = StatusLine::info("Switched to Easy mode. Press Deal to start.");
        effects
    }
}
