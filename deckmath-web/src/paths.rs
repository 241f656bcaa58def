//! URL helpers that respect the deployment base path.
//!
//! `PUBLIC_URL` (set at compile time) prefixes both the router and the API
//! endpoints, so the games can be served from a subdirectory.

use deckmath_game::GameKind;

#[must_use]
pub fn router_base() -> Option<String> {
    router_base_with_base(option_env!("PUBLIC_URL").unwrap_or(""))
}

/// Full URL for a request path of `game`'s API, e.g. `/game24/api/next?...`.
#[must_use]
pub fn api_url(game: GameKind, path_and_query: &str) -> String {
    api_url_with_base(game, path_and_query, option_env!("PUBLIC_URL").unwrap_or(""))
}

fn api_url_with_base(game: GameKind, path_and_query: &str, base: &str) -> String {
    let base = base.trim_end_matches('/');
    let rel = path_and_query.trim_start_matches('/');
    format!("{base}{}/{rel}", game.api_base())
}

fn router_base_with_base(base: &str) -> Option<String> {
    let base = base.trim_end_matches('/').trim();
    if base.is_empty() {
        None
    } else {
        Some(base.to_string())
    }
}
