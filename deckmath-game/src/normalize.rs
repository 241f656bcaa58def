//! Answer normalization applied before anything is sent to the server.
//!
//! Players type expressions with whatever symbols their keyboard offers and
//! refer to face cards by letter. The server only understands ASCII operators
//! and numeric ranks, so every submission passes through [`normalize_expression`].

use once_cell::sync::Lazy;
use regex::Regex;

const REWRITE_PATTERNS: [(&str, &str); 9] = [
    (r"\^", "**"),
    (r"[×∗·]", "*"),
    (r"[÷／]", "/"),
    (r"[−—–]", "-"),
    (r"(?i)\bA\b", "1"),
    // Case-sensitive: a lowercase `t` is not a card.
    (r"\bT\b", "10"),
    (r"(?i)\bJ\b", "11"),
    (r"(?i)\bQ\b", "12"),
    (r"(?i)\bK\b", "13"),
];

static REWRITES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    REWRITE_PATTERNS
        .iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(pattern).ok().map(|re| (re, *replacement))
        })
        .collect()
});

/// Rewrite operator synonyms and face-card letters into the server's syntax.
#[must_use]
pub fn normalize_expression(raw: &str) -> String {
    let mut expr = raw.trim().to_string();
    for (pattern, replacement) in REWRITES.iter() {
        expr = pattern.replace_all(&expr, *replacement).into_owned();
    }
    expr
}

/// Parse a card token such as `7`, `Q`, `10H` or `AS` into a numeric rank.
#[must_use]
pub fn rank_token(token: &str) -> Option<u32> {
    let upper = token.trim().to_ascii_uppercase();
    let rank = match upper.char_indices().last() {
        Some((idx, suit)) if idx > 0 && matches!(suit, 'S' | 'H' | 'D' | 'C') => &upper[..idx],
        _ => upper.trim_end_matches(['♠', '♥', '♦', '♣']),
    };
    match rank {
        "A" => Some(1),
        "T" => Some(10),
        "J" => Some(11),
        "Q" => Some(12),
        "K" => Some(13),
        digits => digits.parse().ok(),
    }
}

/// Parse a plain integer answer, tolerating unicode minus signs and spaces.
#[must_use]
pub fn parse_integer_answer(raw: &str) -> Option<i64> {
    let cleaned: String = normalize_expression(raw)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    cleaned.parse().ok()
}
