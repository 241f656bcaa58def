use serde::{Deserialize, Serialize};

use crate::auto_advance::AdvanceToken;
use crate::protocol::{ApiRequest, Endpoint};

/// Correlates an outbound request with the reply fed back to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ticket(pub u64);

/// Work the host must perform on the controller's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Execute `request` and hand the outcome to `handle_reply(ticket, ..)`.
    Send { ticket: Ticket, request: ApiRequest },
    /// Call `fire_scheduled(token)` after `delay_ms`.
    Schedule { token: AdvanceToken, delay_ms: u32 },
    /// Drop the host timer for `token` if it is still pending.
    Cancel { token: AdvanceToken },
    /// Leave the page.
    Navigate { url: String },
}

impl Effect {
    #[must_use]
    pub const fn request(&self) -> Option<&ApiRequest> {
        match self {
            Self::Send { request, .. } => Some(request),
            _ => None,
        }
    }

    #[must_use]
    pub fn sends_to(&self, endpoint: Endpoint) -> bool {
        self.request().is_some_and(|request| request.endpoint() == endpoint)
    }
}

/// Convenience queries over an effect batch.
pub trait EffectsExt {
    fn sent(&self) -> Vec<(Ticket, &ApiRequest)>;
    fn ticket_for(&self, endpoint: Endpoint) -> Option<Ticket>;
    fn scheduled(&self) -> Option<(AdvanceToken, u32)>;
}

impl EffectsExt for [Effect] {
    fn sent(&self) -> Vec<(Ticket, &ApiRequest)> {
        self.iter()
            .filter_map(|effect| match effect {
                Effect::Send { ticket, request } => Some((*ticket, request)),
                _ => None,
            })
            .collect()
    }

    fn ticket_for(&self, endpoint: Endpoint) -> Option<Ticket> {
        self.iter().find_map(|effect| match effect {
            Effect::Send { ticket, request } if request.endpoint() == endpoint => Some(*ticket),
            _ => None,
        })
    }

    fn scheduled(&self) -> Option<(AdvanceToken, u32)> {
        self.iter().rev().find_map(|effect| match effect {
            Effect::Schedule { token, delay_ms } => Some((*token, *delay_ms)),
            _ => None,
        })
    }
}
