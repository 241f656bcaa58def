//! Browser implementations of the engine's platform traits.

use async_trait::async_trait;
use deckmath_game::prefs::{CLIENT_ID_KEY, GUEST_ID_KEY};
use deckmath_game::protocol::{ApiRequest, HttpReply, Method};
use deckmath_game::{Clock, GameKind, PreferenceStore, SessionIdentity, Transport, TransportError};
use wasm_bindgen::JsValue;

use crate::dom;

/// Monotonic page clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now_ms(&self) -> u64 {
        // Sub-millisecond precision is irrelevant to puzzle timing.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let now = dom::now_ms().max(0.0) as u64;
        now
    }
}

/// `fetch`-backed transport for one game's API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTransport {
    game: GameKind,
}

impl FetchTransport {
    #[must_use]
    pub const fn new(game: GameKind) -> Self {
        Self { game }
    }
}

fn network(err: &JsValue) -> TransportError {
    TransportError::Network(dom::js_error_message(err))
}

#[async_trait(?Send)]
impl Transport for FetchTransport {
    async fn send(&self, request: &ApiRequest) -> Result<HttpReply, TransportError> {
        let url = crate::paths::api_url(self.game, &request.path_and_query());
        let body = request
            .body()?
            .map(|value| value.to_string());
        let method = match request.endpoint().method() {
            Method::Get => "GET",
            Method::Post => "POST",
        };
        let response = dom::fetch_response(method, &url, body.as_deref())
            .await
            .map_err(|err| network(&err))?;
        let text = dom::response_text(&response)
            .await
            .map_err(|err| network(&err))?;
        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).map_err(|err| TransportError::InvalidBody(err.to_string()))?
        };
        Ok(HttpReply::new(response.status(), body))
    }

    async fn pause(&self, millis: u32) {
        if let Err(err) = dom::sleep_ms(i32::try_from(millis).unwrap_or(i32::MAX)).await {
            log::warn!("retry pause failed: {}", dom::js_error_message(&err));
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{area} unavailable: {message}")]
    Unavailable { area: &'static str, message: String },
    #[error("could not update {key}: {message}")]
    Write { key: String, message: String },
}

/// Which Web Storage area a [`BrowserStore`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    Local,
    Session,
}

impl StorageArea {
    const fn label(self) -> &'static str {
        match self {
            Self::Local => "localStorage",
            Self::Session => "sessionStorage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserStore {
    area: StorageArea,
}

impl BrowserStore {
    #[must_use]
    pub const fn local() -> Self {
        Self {
            area: StorageArea::Local,
        }
    }

    #[must_use]
    pub const fn session() -> Self {
        Self {
            area: StorageArea::Session,
        }
    }

    fn storage(self) -> Result<web_sys::Storage, StorageError> {
        let storage = match self.area {
            StorageArea::Local => dom::local_storage(),
            StorageArea::Session => dom::session_storage(),
        };
        storage.map_err(|err| StorageError::Unavailable {
            area: self.area.label(),
            message: dom::js_error_message(&err),
        })
    }

    #[must_use]
    pub fn is_available(self) -> bool {
        self.storage().is_ok()
    }
}

impl PreferenceStore for BrowserStore {
    type Error = StorageError;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.storage()?.get_item(key).ok().flatten())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.storage()?
            .set_item(key, value)
            .map_err(|err| StorageError::Write {
                key: key.to_string(),
                message: dom::js_error_message(&err),
            })
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.storage()?
            .remove_item(key)
            .map_err(|err| StorageError::Write {
                key: key.to_string(),
                message: dom::js_error_message(&err),
            })
    }
}

/// Seed for identifier generation from the page's random source and clock.
fn entropy() -> u64 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let random = (js_sys::Math::random() * 9_007_199_254_740_992.0) as u64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let clock = js_sys::Date::now() as u64;
    random ^ clock.rotate_left(32)
}

/// Load the tab and browser identifiers, minting and saving missing ones.
#[must_use]
pub fn load_identity() -> SessionIdentity {
    let tab = BrowserStore::session();
    let browser = BrowserStore::local();
    let available = tab.is_available() && browser.is_available();
    let stored_client = tab.read(CLIENT_ID_KEY).ok().flatten();
    let stored_guest = browser.read(GUEST_ID_KEY).ok().flatten();
    let (identity, writes) =
        SessionIdentity::resolve(stored_client, stored_guest, available, entropy());
    if let Some(id) = writes.client_id
        && let Err(err) = tab.write(CLIENT_ID_KEY, &id)
    {
        log::warn!("{err}");
    }
    if let Some(id) = writes.guest_id
        && let Err(err) = browser.write(GUEST_ID_KEY, &id)
    {
        log::warn!("{err}");
    }
    identity
}
