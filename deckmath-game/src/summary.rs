//! End-of-session report returned by `/summary`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::numbers::{ratio, whole_percent};
use crate::protocol::{ClientIds, ServerStats, encode_component};

/// How a puzzle left the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleOutcome {
    Solved,
    Skipped,
    Revealed,
    UnsolvedExit,
    #[serde(other)]
    Unknown,
}

/// History row for one dealt puzzle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleRecord {
    pub case_id: u32,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub target: Option<i32>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub incorrect_attempts: u32,
    #[serde(default)]
    pub helped: bool,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub solved: bool,
    #[serde(default)]
    pub started_at_ms: Option<u64>,
    #[serde(default)]
    pub ended_at_ms: Option<u64>,
    #[serde(default)]
    pub final_outcome: Option<PuzzleOutcome>,
}

impl PuzzleRecord {
    #[must_use]
    pub fn duration_ms(&self) -> Option<u64> {
        Some(self.ended_at_ms?.saturating_sub(self.started_at_ms?))
    }

    fn first_try(&self) -> bool {
        self.solved && self.attempts <= 1 && !self.helped
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryTotals {
    #[serde(default)]
    pub solved: u32,
    #[serde(default)]
    pub helped: u32,
    #[serde(default)]
    pub incorrect: u32,
    #[serde(default)]
    pub skipped: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTally {
    #[serde(default)]
    pub played: u32,
    #[serde(default)]
    pub solved: u32,
}

impl LevelTally {
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        whole_percent(ratio(u64::from(self.solved), u64::from(self.played)))
    }
}

/// Case ids grouped by how each puzzle went.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryBuckets {
    #[serde(default)]
    pub solved_ids: Vec<u32>,
    #[serde(default)]
    pub solved_no_help_ids: Vec<u32>,
    #[serde(default)]
    pub solved_with_help_ids: Vec<u32>,
    #[serde(default)]
    pub helped_ids: Vec<u32>,
    #[serde(default)]
    pub incorrect_ids: Vec<u32>,
    #[serde(default)]
    pub skipped_ids: Vec<u32>,
    #[serde(default)]
    pub revealed_no_attempt_ids: Vec<u32>,
    #[serde(default)]
    pub revealed_after_attempts_ids: Vec<u32>,
    #[serde(default)]
    pub unsolved_exit_ids: Vec<u32>,
    #[serde(default)]
    pub first_try_correct_ids: Vec<u32>,
    #[serde(default)]
    pub struggle_before_solve_ids: Vec<u32>,
}

impl SummaryBuckets {
    /// Labelled buckets in report order.
    #[must_use]
    pub fn labelled(&self) -> [(&'static str, &[u32]); 10] {
        [
            ("Solved (no help)", &self.solved_no_help_ids),
            ("Solved (with help)", &self.solved_with_help_ids),
            ("Helped (any)", &self.helped_ids),
            ("Incorrect (had wrong attempts)", &self.incorrect_ids),
            ("Skipped", &self.skipped_ids),
            ("Revealed no attempt", &self.revealed_no_attempt_ids),
            ("Revealed after attempts", &self.revealed_after_attempts_ids),
            ("Unsolved exit", &self.unsolved_exit_ids),
            ("First-try correct", &self.first_try_correct_ids),
            ("Struggled but solved", &self.struggle_before_solve_ids),
        ]
    }
}

/// Aggregated play history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaySummary {
    #[serde(default)]
    pub totals: SummaryTotals,
    #[serde(default)]
    pub buckets: SummaryBuckets,
    #[serde(default)]
    pub by_level: BTreeMap<String, LevelTally>,
    #[serde(default)]
    pub per_puzzle: Vec<PuzzleRecord>,
    #[serde(default)]
    pub report_html: Option<String>,
}

impl PlaySummary {
    /// Aggregate history rows into totals, buckets and per-level tallies.
    #[must_use]
    pub fn from_records(per_puzzle: Vec<PuzzleRecord>) -> Self {
        let mut totals = SummaryTotals::default();
        let mut buckets = SummaryBuckets::default();
        let mut by_level: BTreeMap<String, LevelTally> = BTreeMap::new();

        for row in &per_puzzle {
            let level = row.level.clone().unwrap_or_else(|| "unknown".to_string());
            let tally = by_level.entry(level).or_default();
            tally.played += 1;

            if row.solved {
                totals.solved += 1;
                tally.solved += 1;
                buckets.solved_ids.push(row.case_id);
                if row.helped {
                    buckets.solved_with_help_ids.push(row.case_id);
                } else {
                    buckets.solved_no_help_ids.push(row.case_id);
                }
                continue;
            }
            if row.helped {
                totals.helped += 1;
                buckets.helped_ids.push(row.case_id);
                if row.attempts == 0 {
                    buckets.revealed_no_attempt_ids.push(row.case_id);
                } else {
                    buckets.revealed_after_attempts_ids.push(row.case_id);
                }
            }
            if row.skipped {
                totals.skipped += 1;
                buckets.skipped_ids.push(row.case_id);
            } else {
                buckets.unsolved_exit_ids.push(row.case_id);
            }
            if row.incorrect_attempts > 0 {
                totals.incorrect += 1;
                buckets.incorrect_ids.push(row.case_id);
            }
        }

        let mut by_case: BTreeMap<u32, Vec<&PuzzleRecord>> = BTreeMap::new();
        for row in &per_puzzle {
            by_case.entry(row.case_id).or_default().push(row);
        }
        for (case_id, mut rows) in by_case {
            rows.sort_by_key(|row| row.started_at_ms.unwrap_or(0));
            if rows.first().is_some_and(|first| first.first_try()) {
                buckets.first_try_correct_ids.push(case_id);
            } else if rows.iter().any(|row| row.solved) {
                buckets.struggle_before_solve_ids.push(case_id);
            }
        }

        let mut summary = Self {
            totals,
            buckets,
            by_level,
            per_puzzle,
            report_html: None,
        };
        summary.report_html = Some(format!("<pre>{}</pre>", summary.report_lines().join("\n")));
        summary
    }

    /// Plain-text report, one line per entry.
    #[must_use]
    pub fn report_lines(&self) -> Vec<String> {
        let totals = &self.totals;
        let mut lines = vec![
            "Totals".to_string(),
            format!("  solved:    {}", totals.solved),
            format!("  helped:    {}", totals.helped),
            format!("  incorrect: {}", totals.incorrect),
            format!("  skipped:   {}", totals.skipped),
            String::new(),
            "Case IDs".to_string(),
        ];
        for (label, ids) in self.buckets.labelled() {
            let unique: BTreeSet<u32> = ids.iter().copied().collect();
            let listed = if unique.is_empty() {
                "-".to_string()
            } else {
                unique
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            lines.push(format!("  {label} [{}]: {listed}", unique.len()));
        }
        if !self.by_level.is_empty() {
            lines.push(String::new());
            lines.push("By Level".to_string());
            for (level, tally) in &self.by_level {
                lines.push(format!(
                    "  {level:<10} played={:<4} solved={:<4} acc={}%",
                    tally.played,
                    tally.solved,
                    tally.accuracy_percent()
                ));
            }
        }
        lines
    }
}

/// Reply to `/summary`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub stats: Option<ServerStats>,
    #[serde(default)]
    pub play_summary: Option<PlaySummary>,
    #[serde(default)]
    pub export_url: Option<String>,
}

impl SessionSummary {
    /// CSV export link carrying the session identifiers.
    #[must_use]
    pub fn export_link(&self, ids: &ClientIds) -> Option<String> {
        let base = self.export_url.as_deref().filter(|url| !url.is_empty())?;
        let joiner = if base.contains('?') { '&' } else { '?' };
        Some(format!(
            "{base}{joiner}client_id={}&guest_id={}",
            encode_component(&ids.client_id),
            encode_component(&ids.guest_id)
        ))
    }

    /// Report markup, falling back to a placeholder.
    #[must_use]
    pub fn report_html(&self) -> &str {
        self.play_summary
            .as_ref()
            .and_then(|summary| summary.report_html.as_deref())
            .unwrap_or("<p>No summary.</p>")
    }
}
