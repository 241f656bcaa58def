use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::normalize::rank_token;
use crate::protocol::NextReply;

/// Card indices unlocked together.
pub type IndexGroup = SmallVec<[usize; 4]>;

/// Rendering hint for one card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardImage {
    pub url: String,
    #[serde(default)]
    pub code: String,
}

/// Disclosure plan shipped with progressive reveal puzzles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealPlan {
    #[serde(default)]
    pub init_reveal: IndexGroup,
    #[serde(default)]
    pub groups: Vec<IndexGroup>,
}

impl RevealPlan {
    /// Plan used when the server omits one: everything visible at once.
    #[must_use]
    pub fn all_visible(card_count: usize) -> Self {
        Self {
            init_reveal: (0..card_count).collect(),
            groups: Vec::new(),
        }
    }

    /// Drop indices that do not address a card.
    #[must_use]
    fn clamped(mut self, card_count: usize) -> Self {
        self.init_reveal.retain(|idx| *idx < card_count);
        for group in &mut self.groups {
            group.retain(|idx| *idx < card_count);
        }
        self
    }
}

/// Pool progress reported alongside a pooled puzzle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInfo {
    #[serde(default)]
    pub remaining: Option<u32>,
    #[serde(default, alias = "total")]
    pub total_count: Option<u32>,
    #[serde(default)]
    pub is_last_puzzle: bool,
}

impl PoolInfo {
    /// 1-based position of the current puzzle within the pool.
    #[must_use]
    pub fn position(&self) -> Option<(u32, u32)> {
        let total = self.total_count?;
        let remaining = self.remaining.unwrap_or(0).min(total);
        Some((total - remaining, total))
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.is_last_puzzle || self.remaining == Some(0)
    }
}

/// One active puzzle as delivered by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleEnvelope {
    pub case_id: Option<u32>,
    pub seq: Option<u64>,
    pub values: Vec<u32>,
    pub images: Vec<CardImage>,
    pub target: Option<i32>,
    pub reveal: RevealPlan,
    pub pool_info: Option<PoolInfo>,
    pub pool_done: bool,
    pub help_disabled: bool,
    pub time_left: Option<u32>,
}

impl PuzzleEnvelope {
    /// Build an envelope from a `/next` reply. Returns `None` when the reply
    /// carries no playable cards.
    #[must_use]
    pub fn from_next_reply(reply: &NextReply) -> Option<Self> {
        let values = reply
            .values
            .clone()
            .filter(|values| !values.is_empty())
            .or_else(|| reply.question.as_ref().and_then(parse_question))?;
        let reveal = reply
            .reveal
            .clone()
            .map(|plan| plan.clamped(values.len()))
            .unwrap_or_else(|| RevealPlan::all_visible(values.len()));
        Some(Self {
            case_id: reply.case_id,
            seq: reply.seq,
            values,
            images: reply.images.clone(),
            target: reply.target,
            reveal,
            pool_info: reply.pool_info.clone(),
            pool_done: reply.pool_done,
            help_disabled: reply.help_disabled,
            time_left: reply.time_left,
        })
    }

    /// True when this puzzle is the final one of the active pool.
    #[must_use]
    pub fn ends_pool(&self) -> bool {
        self.pool_done || self.pool_info.as_ref().is_some_and(PoolInfo::is_exhausted)
    }

    #[must_use]
    pub fn card_count(&self) -> usize {
        self.values.len()
    }
}

/// `question` arrives as an integer array, an array of card codes, or a
/// comma separated string depending on the variant.
fn parse_question(question: &serde_json::Value) -> Option<Vec<u32>> {
    let parsed: Option<Vec<u32>> = match question {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| match item {
                serde_json::Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
                serde_json::Value::String(s) => rank_token(s),
                _ => None,
            })
            .collect(),
        serde_json::Value::String(text) => text
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(rank_token)
            .collect(),
        _ => None,
    };
    parsed.filter(|values| !values.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(value: serde_json::Value) -> NextReply {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn values_take_precedence_over_question() {
        let next = reply(json!({"values": [1, 2, 3, 4], "question": "9, 9, 9, 9", "case_id": 3}));
        let envelope = PuzzleEnvelope::from_next_reply(&next).unwrap();
        assert_eq!(envelope.values, vec![1, 2, 3, 4]);
        assert_eq!(envelope.case_id, Some(3));
    }

    #[test]
    fn question_string_and_codes_are_parsed() {
        let next = reply(json!({"question": "2, 3, 5, 9"}));
        assert_eq!(
            PuzzleEnvelope::from_next_reply(&next).unwrap().values,
            vec![2, 3, 5, 9]
        );
        let next = reply(json!({"question": ["AS", "10H", "QD", "KC"]}));
        assert_eq!(
            PuzzleEnvelope::from_next_reply(&next).unwrap().values,
            vec![1, 10, 12, 13]
        );
    }

    #[test]
    fn missing_cards_yield_no_envelope() {
        let next = reply(json!({"pool_done": true}));
        assert!(PuzzleEnvelope::from_next_reply(&next).is_none());
    }

    #[test]
    fn missing_reveal_plan_shows_everything() {
        let next = reply(json!({"values": [4, 5]}));
        let envelope = PuzzleEnvelope::from_next_reply(&next).unwrap();
        assert_eq!(envelope.reveal.init_reveal.as_slice(), &[0, 1]);
        assert!(envelope.reveal.groups.is_empty());
    }

    #[test]
    fn reveal_indices_outside_the_hand_are_dropped() {
        let next = reply(json!({
            "values": [1, 2, 3],
            "reveal": {"init_reveal": [0, 7], "groups": [[1], [2, 9]]}
        }));
        let envelope = PuzzleEnvelope::from_next_reply(&next).unwrap();
        assert_eq!(envelope.reveal.init_reveal.as_slice(), &[0]);
        assert_eq!(envelope.reveal.groups[1].as_slice(), &[2]);
    }

    #[test]
    fn pool_position_and_exhaustion() {
        let info = PoolInfo {
            remaining: Some(1),
            total_count: Some(3),
            is_last_puzzle: false,
        };
        assert_eq!(info.position(), Some((2, 3)));
        assert!(!info.is_exhausted());
        let last = PoolInfo {
            remaining: Some(0),
            ..info
        };
        assert!(last.is_exhausted());
        assert_eq!(last.position(), Some((3, 3)));
    }
}
