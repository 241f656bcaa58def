//! Runs controller effects in the browser: fetches through
//! [`FetchTransport`], timers through `setTimeout`, navigation through
//! `location`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use deckmath_game::{
    AdvanceToken, Effect, GameKind, GameRules, SessionConfig, SessionController, SessionIdentity,
    SessionView, send_with_retry,
};
use yew::Callback;

use crate::dom;
use crate::platform::{BrowserClock, FetchTransport};

pub type BrowserController = SessionController<Box<dyn GameRules>, BrowserClock>;

pub struct BrowserHost {
    controller: RefCell<BrowserController>,
    transport: FetchTransport,
    timers: RefCell<HashMap<AdvanceToken, i32>>,
    listener: RefCell<Callback<()>>,
}

impl BrowserHost {
    #[must_use]
    pub fn new(game: GameKind, config: SessionConfig, identity: SessionIdentity) -> Rc<Self> {
        let controller = deckmath_game::controller_for(game, BrowserClock, config, identity);
        Rc::new(Self {
            controller: RefCell::new(controller),
            transport: FetchTransport::new(game),
            timers: RefCell::new(HashMap::new()),
            listener: RefCell::new(Callback::noop()),
        })
    }

    /// Called after every state change so the page can re-render.
    pub fn set_listener(&self, listener: Callback<()>) {
        *self.listener.borrow_mut() = listener;
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        let controller = self.controller.borrow();
        SessionView::build(&*controller)
    }

    /// Apply one controller operation and run what it asks for.
    pub fn act<F>(self: &Rc<Self>, op: F)
    where
        F: FnOnce(&mut BrowserController) -> Vec<Effect>,
    {
        let effects = op(&mut self.controller.borrow_mut());
        self.run(effects);
        let listener = self.listener.borrow().clone();
        listener.emit(());
    }

    /// Read-only access for values the view does not carry.
    pub fn with<T>(&self, read: impl FnOnce(&BrowserController) -> T) -> T {
        read(&self.controller.borrow())
    }

    fn run(self: &Rc<Self>, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send { ticket, request } => {
                    let host = Rc::clone(self);
                    wasm_bindgen_futures::spawn_local(async move {
                        let retry = host.controller.borrow().config().retry;
                        let reply = send_with_retry(&host.transport, &retry, &request).await;
                        if let Err(err) = &reply {
                            log::warn!("{} request failed: {err}", request.endpoint().label());
                        }
                        host.act(|controller| controller.handle_reply(ticket, reply));
                    });
                }
                Effect::Schedule { token, delay_ms } => {
                    let host = Rc::clone(self);
                    let armed = dom::set_timeout(delay_ms, move || {
                        host.timers.borrow_mut().remove(&token);
                        host.act(|controller| controller.fire_scheduled(token));
                    });
                    match armed {
                        Ok(handle) => {
                            self.timers.borrow_mut().insert(token, handle);
                        }
                        Err(err) => dom::console_error(&format!(
                            "could not arm timer: {}",
                            dom::js_error_message(&err)
                        )),
                    }
                }
                Effect::Cancel { token } => {
                    if let Some(handle) = self.timers.borrow_mut().remove(&token) {
                        dom::clear_timeout(handle);
                    }
                }
                Effect::Navigate { url } => {
                    if let Err(err) = dom::navigate(&url) {
                        dom::console_error(&format!(
                            "could not open {url}: {}",
                            dom::js_error_message(&err)
                        ));
                    }
                }
            }
        }
    }
}
