use serde::{Deserialize, Serialize};

/// Handle identifying one armed schedule. Hosts echo it back when their
/// timer fires; only the currently armed token is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdvanceToken(pub u64);

/// What should happen when the pending schedule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledAction {
    /// Deal the next puzzle, advancing the sequence counter.
    DealNext,
    /// Leave a finished pool and return to single play.
    ReturnToSingle,
}

/// At most one pending scheduled action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoAdvanceTimer {
    pending: Option<(AdvanceToken, ScheduledAction)>,
    issued: u64,
}

impl AutoAdvanceTimer {
    /// Arm `action`, replacing anything pending. Returns the new token and the
    /// token it displaced, if any.
    pub fn schedule(&mut self, action: ScheduledAction) -> (AdvanceToken, Option<AdvanceToken>) {
        let displaced = self.cancel();
        self.issued += 1;
        let token = AdvanceToken(self.issued);
        self.pending = Some((token, action));
        (token, displaced)
    }

    /// Disarm the pending action. Idempotent; returns what was pending.
    pub const fn cancel(&mut self) -> Option<AdvanceToken> {
        match self.pending.take() {
            Some((token, _)) => Some(token),
            None => None,
        }
    }

    /// Consume the pending action if `token` is the armed one.
    pub fn fire(&mut self, token: AdvanceToken) -> Option<ScheduledAction> {
        match self.pending {
            Some((armed, action)) if armed == token => {
                self.pending = None;
                Some(action)
            }
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn pending_action(&self) -> Option<ScheduledAction> {
        self.pending.map(|(_, action)| action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_latest_schedule_is_armed() {
        let mut timer = AutoAdvanceTimer::default();
        let (first, displaced) = timer.schedule(ScheduledAction::DealNext);
        assert!(displaced.is_none());
        let (second, displaced) = timer.schedule(ScheduledAction::DealNext);
        assert_eq!(displaced, Some(first));
        assert_eq!(timer.fire(first), None);
        assert_eq!(timer.fire(second), Some(ScheduledAction::DealNext));
        assert!(!timer.is_pending());
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut timer = AutoAdvanceTimer::default();
        let (token, _) = timer.schedule(ScheduledAction::ReturnToSingle);
        assert_eq!(timer.cancel(), Some(token));
        assert_eq!(timer.cancel(), None);
        assert!(!timer.is_pending());
        assert_eq!(timer.fire(token), None);
    }

    #[test]
    fn many_schedules_leave_exactly_one_pending() {
        let mut timer = AutoAdvanceTimer::default();
        let tokens: Vec<_> = (0..16)
            .map(|_| timer.schedule(ScheduledAction::DealNext).0)
            .collect();
        assert!(timer.is_pending());
        let fired = tokens.iter().filter(|t| timer.clone().fire(**t).is_some()).count();
        assert_eq!(fired, 1);
        timer.cancel();
        assert!(!timer.is_pending());
    }
}
