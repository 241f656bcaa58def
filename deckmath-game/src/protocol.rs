//! Wire contract between the session controller and the puzzle backend.
//!
//! Requests are plain serde structs grouped under [`ApiRequest`]; replies are
//! decoded lazily from [`HttpReply`] once the controller knows which request a
//! reply answers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::envelope::{CardImage, PoolInfo, RevealPlan};
use crate::pool::PoolMode;
use crate::stats::StatsSnapshot;

/// HTTP verb used by an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Backend endpoints consumed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Next,
    Check,
    Help,
    Skip,
    Pool,
    Restart,
    Exit,
    Summary,
    Finish,
}

impl Endpoint {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Next => "/next",
            Self::Check => "/check",
            Self::Help => "/help",
            Self::Skip => "/skip",
            Self::Pool => "/pool",
            Self::Restart => "/restart",
            Self::Exit => "/exit",
            Self::Summary => "/summary",
            Self::Finish => "/finish",
        }
    }

    #[must_use]
    pub const fn method(self) -> Method {
        match self {
            Self::Next => Method::Get,
            _ => Method::Post,
        }
    }

    /// Only idempotent reads may be retried; answer submission never is.
    #[must_use]
    pub const fn is_idempotent(self) -> bool {
        matches!(self, Self::Next)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Check => "check",
            Self::Help => "help",
            Self::Skip => "skip",
            Self::Pool => "pool",
            Self::Restart => "restart",
            Self::Exit => "exit",
            Self::Summary => "summary",
            Self::Finish => "finish",
        }
    }
}

/// Per-tab and per-browser identifiers attached to every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ClientIds {
    pub client_id: String,
    pub guest_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextQuery {
    pub theme: String,
    pub level: String,
    pub seq: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<u32>,
    #[serde(flatten)]
    pub ids: ClientIds,
}

impl NextQuery {
    /// Render the query as `key=value` pairs joined by `&`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut pairs = vec![
            ("theme", self.theme.clone()),
            ("level", self.level.clone()),
            ("seq", self.seq.to_string()),
        ];
        if let Some(target) = self.target {
            pairs.push(("target", target.to_string()));
        }
        if let Some(case_id) = self.case_id {
            pairs.push(("case_id", case_id.to_string()));
        }
        pairs.push(("client_id", self.ids.client_id.clone()));
        pairs.push(("guest_id", self.ids.guest_id.clone()));
        pairs
            .into_iter()
            .map(|(key, value)| format!("{key}={}", encode_component(&value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

pub(crate) fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    pub values: Vec<u32>,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<u32>,
    #[serde(flatten)]
    pub ids: ClientIds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpRequest {
    pub values: Vec<u32>,
    pub all: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<u32>,
    #[serde(flatten)]
    pub ids: ClientIds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipRequest {
    pub values: Vec<u32>,
    pub case_id: Option<u32>,
    #[serde(flatten)]
    pub ids: ClientIds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRequest {
    pub mode: PoolMode,
    pub case_ids: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<u32>,
    #[serde(flatten)]
    pub ids: ClientIds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<i32>,
    #[serde(flatten)]
    pub ids: ClientIds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitRequest {
    pub stats: StatsSnapshot,
    #[serde(flatten)]
    pub ids: ClientIds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    #[serde(flatten)]
    pub ids: ClientIds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishRequest {
    pub case_id: Option<u32>,
    pub answer: i64,
    #[serde(flatten)]
    pub ids: ClientIds,
}

/// One outbound call, ready for a transport to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    Next(NextQuery),
    Check(CheckRequest),
    Help(HelpRequest),
    Skip(SkipRequest),
    Pool(PoolRequest),
    Restart(RestartRequest),
    Exit(ExitRequest),
    Summary(SummaryRequest),
    Finish(FinishRequest),
}

impl ApiRequest {
    #[must_use]
    pub const fn endpoint(&self) -> Endpoint {
        match self {
            Self::Next(_) => Endpoint::Next,
            Self::Check(_) => Endpoint::Check,
            Self::Help(_) => Endpoint::Help,
            Self::Skip(_) => Endpoint::Skip,
            Self::Pool(_) => Endpoint::Pool,
            Self::Restart(_) => Endpoint::Restart,
            Self::Exit(_) => Endpoint::Exit,
            Self::Summary(_) => Endpoint::Summary,
            Self::Finish(_) => Endpoint::Finish,
        }
    }

    /// Path relative to the API base, including the query string for reads.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        match self {
            Self::Next(query) => format!("{}?{}", Endpoint::Next.path(), query.to_query_string()),
            other => other.endpoint().path().to_string(),
        }
    }

    /// JSON body for POST endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn body(&self) -> Result<Option<serde_json::Value>, ProtocolError> {
        let encoded = match self {
            Self::Next(_) => return Ok(None),
            Self::Check(req) => serde_json::to_value(req),
            Self::Help(req) => serde_json::to_value(req),
            Self::Skip(req) => serde_json::to_value(req),
            Self::Pool(req) => serde_json::to_value(req),
            Self::Restart(req) => serde_json::to_value(req),
            Self::Exit(req) => serde_json::to_value(req),
            Self::Summary(req) => serde_json::to_value(req),
            Self::Finish(req) => serde_json::to_value(req),
        };
        encoded.map(Some).map_err(|err| ProtocolError::Encode {
            endpoint: self.endpoint().label(),
            message: err.to_string(),
        })
    }
}

/// Raw status and JSON body as returned by a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: serde_json::Value,
}

impl HttpReply {
    #[must_use]
    pub const fn new(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    #[must_use]
    pub const fn ok(body: serde_json::Value) -> Self {
        Self::new(200, body)
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Structured error fields carried by a non-2xx reply, if any.
    #[must_use]
    pub fn error_body(&self) -> ErrorBody {
        serde_json::from_value(self.body.clone()).unwrap_or_default()
    }

    /// Decode the body into a typed reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not match the expected shape.
    pub fn decode<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T, ProtocolError> {
        serde_json::from_value(self.body.clone()).map_err(|err| ProtocolError::Decode {
            endpoint: endpoint.label(),
            message: err.to_string(),
        })
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("could not encode {endpoint} request: {message}")]
    Encode {
        endpoint: &'static str,
        message: String,
    },
    #[error("unexpected {endpoint} reply: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },
}

/// Counters as the server reports them. Every field is optional; absent
/// fields leave the mirrored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStats {
    #[serde(default)]
    pub played: Option<u64>,
    #[serde(default)]
    pub solved: Option<u64>,
    #[serde(default)]
    pub revealed: Option<u64>,
    #[serde(default)]
    pub skipped: Option<u64>,
    #[serde(default, alias = "total_time_seconds")]
    pub total_time: Option<u64>,
    #[serde(default)]
    pub answer_attempts: Option<u64>,
    #[serde(default)]
    pub answer_correct: Option<u64>,
    #[serde(default, alias = "incorrect")]
    pub answer_wrong: Option<u64>,
    #[serde(default)]
    pub deal_swaps: Option<u64>,
}

/// Fields a failing reply may carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub competition_over: bool,
}

impl ErrorBody {
    #[must_use]
    pub fn best_message(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or(self.reason.as_deref())
            .or(self.message.as_deref())
            .filter(|msg| !msg.trim().is_empty())
    }
}

/// `/next` reply before normalization into a [`crate::PuzzleEnvelope`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NextReply {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub seq: Option<u64>,
    #[serde(default)]
    pub case_id: Option<u32>,
    #[serde(default)]
    pub values: Option<Vec<u32>>,
    #[serde(default)]
    pub question: Option<serde_json::Value>,
    #[serde(default)]
    pub images: Vec<CardImage>,
    #[serde(default)]
    pub target: Option<i32>,
    #[serde(default)]
    pub reveal: Option<RevealPlan>,
    #[serde(default)]
    pub pool_info: Option<PoolInfo>,
    #[serde(default)]
    pub pool_done: bool,
    #[serde(default)]
    pub help_disabled: bool,
    #[serde(default)]
    pub time_left: Option<u32>,
    #[serde(default)]
    pub stats: Option<ServerStats>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CheckReply {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    pub expected: Option<i64>,
    #[serde(default)]
    pub next_step: Option<u32>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub complete: bool,
    #[serde(default)]
    pub target: Option<i32>,
    #[serde(default)]
    pub stats: Option<ServerStats>,
}

impl CheckReply {
    /// True when the server confirmed a correct "no solution" claim.
    #[must_use]
    pub fn is_no_solution(&self) -> bool {
        self.kind.as_deref() == Some("no-solution")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HelpReply {
    #[serde(default)]
    pub has_solution: Option<bool>,
    #[serde(default)]
    pub solutions: Vec<String>,
    #[serde(default)]
    pub expected: Option<i64>,
    #[serde(default)]
    pub target: Option<i32>,
    #[serde(default)]
    pub stats: Option<ServerStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SkipReply {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub stats: Option<ServerStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PoolReply {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub mode: Option<PoolMode>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub time_left: Option<u32>,
    #[serde(default)]
    pub help_disabled: Option<bool>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RestartReply {
    #[serde(default)]
    pub stats: Option<ServerStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExitReply {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub next_url: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub stats: Option<ServerStats>,
}

impl ExitReply {
    /// Where the host should navigate once the session has closed.
    #[must_use]
    pub fn destination(&self) -> Option<&str> {
        self.redirect_url
            .as_deref()
            .or(self.next_url.as_deref())
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FinishReply {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub pool_completed: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub stats: Option<ServerStats>,
}
