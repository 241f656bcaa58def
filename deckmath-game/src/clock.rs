use std::cell::Cell;
use std::rc::Rc;

use crate::Clock;

/// Hand-driven clock shared between a controller and whatever drives it.
///
/// Clones observe the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Rc<Cell<u64>>,
}

impl ManualClock {
    #[must_use]
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(now_ms)),
        }
    }

    pub fn advance(&self, millis: u64) {
        self.now_ms.set(self.now_ms.get().saturating_add(millis));
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}
