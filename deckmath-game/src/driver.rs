//! Headless host that runs a controller's effects against a [`Transport`]
//! on simulated time. Used by the QA harness and integration tests.

use std::collections::{BTreeMap, VecDeque};

use crate::{Clock, Transport};
use crate::auto_advance::AdvanceToken;
use crate::clock::ManualClock;
use crate::protocol::Endpoint;
use crate::retry::{RetryPolicy, send_with_retry};
use crate::rules::GameRules;
use crate::session::{Effect, SessionController};
use crate::view::SessionView;

pub struct SessionDriver<R: GameRules, T: Transport> {
    controller: SessionController<R, ManualClock>,
    clock: ManualClock,
    transport: T,
    retry: RetryPolicy,
    timers: BTreeMap<AdvanceToken, u64>,
    sent: Vec<Endpoint>,
    navigations: Vec<String>,
}

impl<R: GameRules, T: Transport> SessionDriver<R, T> {
    /// `clock` must be the clock the controller was built with.
    pub fn new(controller: SessionController<R, ManualClock>, clock: ManualClock, transport: T) -> Self {
        let retry = controller.config().retry;
        Self {
            controller,
            clock,
            transport,
            retry,
            timers: BTreeMap::new(),
            sent: Vec::new(),
            navigations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn controller(&self) -> &SessionController<R, ManualClock> {
        &self.controller
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    #[must_use]
    pub const fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Endpoints contacted so far, in order.
    #[must_use]
    pub fn sent(&self) -> &[Endpoint] {
        &self.sent
    }

    #[must_use]
    pub fn sent_count(&self, endpoint: Endpoint) -> usize {
        self.sent.iter().filter(|sent| **sent == endpoint).count()
    }

    #[must_use]
    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    #[must_use]
    pub fn armed_timers(&self) -> usize {
        self.timers.len()
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView::build(&self.controller)
    }

    /// Run one controller operation and everything it triggers.
    pub async fn act<F>(&mut self, op: F)
    where
        F: FnOnce(&mut SessionController<R, ManualClock>) -> Vec<Effect>,
    {
        let effects = op(&mut self.controller);
        self.dispatch(effects).await;
    }

    /// Execute effects until the queue drains. Replies are applied in the
    /// order requests were issued.
    pub async fn dispatch(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Send { ticket, request } => {
                    self.sent.push(request.endpoint());
                    let reply = send_with_retry(&self.transport, &self.retry, &request).await;
                    if let Err(err) = &reply {
                        log::debug!("{} failed: {err}", request.endpoint().label());
                    }
                    queue.extend(self.controller.handle_reply(ticket, reply));
                }
                Effect::Schedule { token, delay_ms } => {
                    let due = self.clock.now_ms().saturating_add(u64::from(delay_ms));
                    self.timers.insert(token, due);
                }
                Effect::Cancel { token } => {
                    self.timers.remove(&token);
                }
                Effect::Navigate { url } => self.navigations.push(url),
            }
        }
    }

    /// Move simulated time forward, firing due timers in order, then let the
    /// controller check its countdown.
    pub async fn advance_time(&mut self, millis: u64) {
        let target = self.clock.now_ms().saturating_add(millis);
        loop {
            let next_due = self
                .timers
                .iter()
                .filter(|(_, due)| **due <= target)
                .min_by_key(|(token, due)| (**due, **token))
                .map(|(token, due)| (*token, *due));
            let Some((token, due)) = next_due else {
                break;
            };
            self.timers.remove(&token);
            self.clock.set(due.max(self.clock.now_ms()));
            let effects = self.controller.fire_scheduled(token);
            self.dispatch(effects).await;
        }
        self.clock.set(target.max(self.clock.now_ms()));
        let effects = self.controller.tick();
        self.dispatch(effects).await;
    }

    pub fn into_parts(self) -> (SessionController<R, ManualClock>, T) {
        (self.controller, self.transport)
    }
}
