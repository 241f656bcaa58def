//! Deckmath Session Engine
//!
//! Platform-agnostic core for the Deckmath card-arithmetic games. One
//! controller drives every variant (Game 24, running sums, counting by twos)
//! through a small [`GameRules`] trait. The engine does no I/O: operations
//! return effects and hosts feed replies back in.

pub mod auto_advance;
pub mod clock;
pub mod config;
pub mod constants;
pub mod driver;
pub mod envelope;
pub mod identity;
pub mod normalize;
pub mod numbers;
pub mod pool;
pub mod prefs;
pub mod protocol;
pub mod retry;
pub mod reveal;
pub mod rules;
pub mod session;
pub mod stats;
pub mod summary;
pub mod timer;
pub mod transport;
pub mod view;

// Re-export commonly used types
pub use auto_advance::{AdvanceToken, AutoAdvanceTimer, ScheduledAction};
pub use clock::ManualClock;
pub use config::{ConfigError, LEVELS, SessionConfig};
pub use driver::SessionDriver;
pub use envelope::{CardImage, PoolInfo, PuzzleEnvelope, RevealPlan};
pub use identity::{IdentityWrites, SessionIdentity};
pub use normalize::{normalize_expression, parse_integer_answer, rank_token};
pub use pool::{PoolConfiguration, PoolError, PoolMode, parse_case_pool};
pub use prefs::{MemoryStore, SavedPreferences};
pub use protocol::{ApiRequest, ClientIds, Endpoint, HttpReply, Method, ProtocolError, ServerStats};
pub use retry::{RetryPolicy, send_with_retry};
pub use reveal::{RevealScheduler, RevealState, RevealTransition};
pub use rules::{
    AnswerRejection, Capabilities, CountByTwosRules, Game24Rules, GameKind, GameRules, HintPanel,
    RunningSumRules,
};
pub use session::{
    Effect, EffectsExt, Phase, PlayMode, SessionController, SessionState, StatusLine, StatusTone,
    Ticket,
};
pub use stats::{StatsMirror, StatsSnapshot};
pub use summary::{PlaySummary, PuzzleOutcome, PuzzleRecord, SessionSummary};
pub use timer::{PuzzleTimer, format_puzzle_time, format_total_time};
pub use transport::TransportError;
pub use view::{CardSlot, Controls, SessionView};

/// Source of wall-clock milliseconds.
/// Platform-specific implementations should provide this
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Trait for abstracting request execution
/// Platform-specific implementations should provide this
#[async_trait::async_trait(?Send)]
pub trait Transport {
    /// Execute one request against the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if no HTTP response could be obtained or its body was
    /// not JSON. Non-2xx statuses are replies, not errors.
    async fn send(&self, request: &ApiRequest) -> Result<HttpReply, TransportError>;

    /// Wait before a retry.
    async fn pause(&self, millis: u32);
}

/// Trait for abstracting small key/value persistence
/// Platform-specific implementations should provide this
pub trait PreferenceStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read a stored value
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be accessed.
    fn read(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Store a value
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error>;

    /// Remove a value
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be removed.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

#[async_trait::async_trait(?Send)]
impl<T: Transport + ?Sized> Transport for std::rc::Rc<T> {
    async fn send(&self, request: &ApiRequest) -> Result<HttpReply, TransportError> {
        (**self).send(request).await
    }

    async fn pause(&self, millis: u32) {
        (**self).pause(millis).await;
    }
}

/// Build a controller for `kind` with boxed rules, for hosts that pick the
/// variant at runtime.
pub fn controller_for<C: Clock>(
    kind: GameKind,
    clock: C,
    config: SessionConfig,
    identity: SessionIdentity,
) -> SessionController<Box<dyn GameRules>, C> {
    let rules: Box<dyn GameRules> = match kind {
        GameKind::Game24 => Box::new(Game24Rules),
        GameKind::RunningSum => Box::new(RunningSumRules),
        GameKind::CountByTwos => Box::new(CountByTwosRules),
    };
    SessionController::new(rules, clock, config, identity)
}

impl<R: GameRules + ?Sized> GameRules for Box<R> {
    fn kind(&self) -> GameKind {
        (**self).kind()
    }

    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    fn prepare_answer(&self, raw: &str) -> Result<String, AnswerRejection> {
        (**self).prepare_answer(raw)
    }

    fn question_text(&self, question: &rules::QuestionContext<'_>) -> String {
        (**self).question_text(question)
    }

    fn success_message(&self, reply: &protocol::CheckReply, target: i32) -> String {
        (**self).success_message(reply, target)
    }

    fn failure_message(&self, reply: &protocol::CheckReply) -> String {
        (**self).failure_message(reply)
    }

    fn hint_panel(&self, reply: &protocol::HelpReply, all: bool, target: i32) -> HintPanel {
        (**self).hint_panel(reply, all, target)
    }

    fn advance_delay_ms(&self) -> u32 {
        (**self).advance_delay_ms()
    }
}
