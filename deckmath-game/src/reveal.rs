//! Progressive disclosure for running-sum puzzles.
//!
//! The server ships the whole reveal plan with the envelope and stays
//! authoritative for the expected value at each step; the scheduler only
//! decides which card indices are face up.

use std::collections::BTreeSet;

use crate::envelope::RevealPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    /// Only `init_reveal` is visible.
    Initial,
    /// Groups `0..=k` are visible.
    Stepping(usize),
    /// Every group is visible and the final formula is shown.
    Complete,
}

/// Result of feeding a correct partial answer to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealTransition {
    /// Newly revealed card indices.
    Revealed(Vec<usize>),
    /// The plan finished; carries every index revealed by this transition.
    Completed(Vec<usize>),
    /// Already complete, nothing changed.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealScheduler {
    plan: RevealPlan,
    state: RevealState,
}

impl Default for RevealScheduler {
    fn default() -> Self {
        Self::new(RevealPlan::default())
    }
}

impl RevealScheduler {
    #[must_use]
    pub const fn new(plan: RevealPlan) -> Self {
        Self {
            plan,
            state: RevealState::Initial,
        }
    }

    /// Install the plan of a freshly dealt envelope.
    pub fn reset(&mut self, plan: RevealPlan) {
        self.plan = plan;
        self.state = RevealState::Initial;
    }

    #[must_use]
    pub const fn state(&self) -> RevealState {
        self.state
    }

    #[must_use]
    pub const fn plan(&self) -> &RevealPlan {
        &self.plan
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.state, RevealState::Complete)
    }

    /// Number of groups revealed so far; never exceeds the group count.
    #[must_use]
    pub const fn step(&self) -> usize {
        match self.state {
            RevealState::Initial => 0,
            RevealState::Stepping(k) => k + 1,
            RevealState::Complete => self.plan.groups.len(),
        }
    }

    /// Advance after a correct partial answer.
    ///
    /// `server_next_step` and `server_done` let the server move the cursor
    /// further than one step; the cursor never moves backwards.
    pub fn advance(&mut self, server_next_step: Option<u32>, server_done: bool) -> RevealTransition {
        if self.is_complete() {
            return RevealTransition::Unchanged;
        }
        let before = self.visible_set();
        let len = self.plan.groups.len();
        let proposed = server_next_step
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or_else(|| self.correct_submissions() + 1);
        let desired = proposed.max(self.correct_submissions() + 1);

        if server_done || desired > len {
            self.state = RevealState::Complete;
            let revealed = self.visible_set().difference(&before).copied().collect();
            return RevealTransition::Completed(revealed);
        }
        self.state = match desired {
            0 => RevealState::Initial,
            n => RevealState::Stepping(n - 1),
        };
        RevealTransition::Revealed(self.visible_set().difference(&before).copied().collect())
    }

    /// Force the plan to completion, revealing everything at once.
    pub fn complete(&mut self) -> Vec<usize> {
        let before = self.visible_set();
        self.state = RevealState::Complete;
        self.visible_set().difference(&before).copied().collect()
    }

    /// Correct partial answers accepted so far. Sent to the server as the
    /// step cursor.
    #[must_use]
    pub const fn correct_submissions(&self) -> usize {
        match self.state {
            RevealState::Initial => 0,
            RevealState::Stepping(k) => k + 1,
            RevealState::Complete => self.plan.groups.len() + 1,
        }
    }

    fn visible_set(&self) -> BTreeSet<usize> {
        let upto = match self.state {
            RevealState::Initial => 0,
            RevealState::Stepping(k) => k + 1,
            RevealState::Complete => self.plan.groups.len(),
        };
        self.plan
            .init_reveal
            .iter()
            .chain(self.plan.groups.iter().take(upto).flatten())
            .copied()
            .collect()
    }

    /// Visible card indices in ascending order.
    #[must_use]
    pub fn visible_indices(&self) -> Vec<usize> {
        self.visible_set().into_iter().collect()
    }

    #[must_use]
    pub fn is_visible(&self, index: usize) -> bool {
        self.visible_set().contains(&index)
    }

    /// Sum of the visible card values.
    #[must_use]
    pub fn running_total(&self, values: &[u32]) -> i64 {
        self.visible_set()
            .into_iter()
            .filter_map(|idx| values.get(idx))
            .map(|v| i64::from(*v))
            .sum()
    }

    /// Formula shown under the cards: `a + b = ?` while stepping and
    /// `a+b+c+d = sum` once complete.
    #[must_use]
    pub fn formula(&self, values: &[u32]) -> String {
        if self.is_complete() {
            let terms: Vec<String> = values.iter().map(ToString::to_string).collect();
            let sum: i64 = values.iter().map(|v| i64::from(*v)).sum();
            return format!("{} = {sum}", terms.join("+"));
        }
        let terms: Vec<String> = self
            .visible_set()
            .into_iter()
            .filter_map(|idx| values.get(idx))
            .map(ToString::to_string)
            .collect();
        if terms.is_empty() {
            return "?".to_string();
        }
        format!("{} = ?", terms.join(" + "))
    }
}
