use std::rc::Rc;

use deckmath_game::{GameKind, SavedPreferences, SessionConfig, SessionView};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
use yew::prelude::*;

use crate::a11y::LiveRegions;
use crate::components::answer_form::AnswerForm;
use crate::components::card_table::CardTable;
use crate::components::control_bar::{Action, ControlBar};
use crate::components::hint_box::HintBox;
use crate::components::settings_panel::{SettingsPanel, SettingsRequest};
use crate::components::stats_panel::StatsPanel;
use crate::components::status_bar::StatusBar;
use crate::components::summary_panel::SummaryPanel;
use crate::host::BrowserHost;

#[derive(Properties, Clone, PartialEq, Eq)]
pub struct Props {
    pub game: GameKind,
}

struct PageSetup {
    host: Rc<BrowserHost>,
    prefs: SavedPreferences,
}

fn build_setup(game: GameKind) -> PageSetup {
    let mut config = SessionConfig::default();
    #[cfg(target_arch = "wasm32")]
    let (prefs, identity) = (
        SavedPreferences::load(&crate::platform::BrowserStore::local(), game),
        crate::platform::load_identity(),
    );
    #[cfg(not(target_arch = "wasm32"))]
    let (prefs, identity) = (
        SavedPreferences::default(),
        deckmath_game::SessionIdentity::fixed("offline-client", "offline-guest"),
    );
    prefs.apply_to(&mut config);
    if let Err(err) = config.validate() {
        log::warn!("saved preferences rejected: {err}");
        config = SessionConfig::default();
    }
    PageSetup {
        host: BrowserHost::new(game, config, identity),
        prefs,
    }
}

const fn placeholder(game: GameKind) -> &'static str {
    match game {
        GameKind::Game24 => "e.g. (9-5)*3*2",
        GameKind::RunningSum => "Sum so far",
        GameKind::CountByTwos => "Count",
    }
}

fn dispatch(host: &Rc<BrowserHost>, action: Action) {
    match action {
        Action::Deal => host.act(|c| c.deal(true, None)),
        Action::Skip => host.act(|c| c.skip()),
        Action::Hint => host.act(|c| c.request_hint(false)),
        Action::HintAll => host.act(|c| c.request_hint(true)),
        Action::Restart => host.act(|c| c.restart_session()),
        Action::Exit => host.act(|c| c.exit()),
    }
}

#[cfg(target_arch = "wasm32")]
fn typing_into_field(e: &KeyboardEvent) -> bool {
    e.target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        .is_some_and(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA" | "SELECT"))
}

#[cfg(target_arch = "wasm32")]
fn save_preferences(game: GameKind, prefs: &SavedPreferences) {
    if let Err(err) = prefs.save(&crate::platform::BrowserStore::local(), game) {
        log::warn!("could not save preferences: {err}");
    }
}

/// One game's play screen. Owns the browser host for the session.
#[function_component(PlayPage)]
pub fn play_page(p: &Props) -> Html {
    let setup = use_memo(p.game, |game| build_setup(*game));
    let host = Rc::clone(&setup.host);
    let redraw = use_force_update();
    let pool_draft = use_state(|| setup.prefs.pool_text.clone().unwrap_or_default());
    let minutes = use_state(|| setup.prefs.competition_minutes);
    let high_contrast = use_state(|| setup.prefs.high_contrast);

    // Wire re-rendering, deal the first puzzle and start the clock.
    #[cfg(target_arch = "wasm32")]
    {
        let host = Rc::clone(&host);
        let redraw = redraw.clone();
        use_effect_with(p.game, move |_| {
            host.set_listener(Callback::from(move |()| redraw.force_update()));
            host.act(|c| c.deal(false, None));
            let ticker = {
                let host = Rc::clone(&host);
                crate::dom::Interval::start(1_000, move || host.act(|c| c.tick()))
            };
            let ticker = match ticker {
                Ok(ticker) => Some(ticker),
                Err(err) => {
                    crate::dom::console_error(&format!(
                        "could not start the session clock: {}",
                        crate::dom::js_error_message(&err)
                    ));
                    None
                }
            };
            move || {
                drop(ticker);
                host.set_listener(Callback::noop());
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = &redraw;
    }

    let view: SessionView = host.view();

    #[cfg(target_arch = "wasm32")]
    {
        use_effect_with(view.status.clone(), |status| {
            crate::a11y::announce(status);
            || {}
        });
        let saved = SavedPreferences {
            level: Some(view.level.clone()),
            auto_advance: Some(view.auto_advance),
            pool_text: Some((*pool_draft).clone()).filter(|text| !text.is_empty()),
            competition_minutes: *minutes,
            target: view.target,
            high_contrast: *high_contrast,
        };
        use_effect_with((p.game, saved), |(game, saved)| {
            save_preferences(*game, saved);
            || {}
        });
    }

    let on_action = {
        let host = Rc::clone(&host);
        Callback::from(move |action: Action| dispatch(&host, action))
    };

    let on_toggle_auto = {
        let host = Rc::clone(&host);
        Callback::from(move |enabled: bool| host.act(|c| c.set_auto_advance(enabled)))
    };

    let on_submit = {
        let host = Rc::clone(&host);
        Callback::from(move |raw: String| host.act(|c| c.submit_answer(&raw)))
    };

    let on_settings = {
        let host = Rc::clone(&host);
        let pool_draft = pool_draft.clone();
        let minutes = minutes.clone();
        let high_contrast = high_contrast.clone();
        Callback::from(move |request: SettingsRequest| match request {
            SettingsRequest::Level(level) => host.act(|c| c.set_level(&level)),
            SettingsRequest::Target(target) => host.act(|c| {
                c.set_target(target);
                Vec::new()
            }),
            SettingsRequest::LoadCase(case_id) => host.act(|c| c.load_case(case_id)),
            SettingsRequest::SavePool { text, minutes: mins } => {
                pool_draft.set(text.clone());
                minutes.set(mins);
                host.act(|c| c.save_pool(&text, mins));
            }
            SettingsRequest::HighContrast(enabled) => {
                #[cfg(target_arch = "wasm32")]
                crate::a11y::set_high_contrast(enabled);
                high_contrast.set(enabled);
            }
        })
    };

    let on_keydown = {
        #[cfg(target_arch = "wasm32")]
        {
            let host = Rc::clone(&host);
            Callback::from(move |e: KeyboardEvent| {
                if e.ctrl_key() || e.meta_key() || e.alt_key() || typing_into_field(&e) {
                    return;
                }
                if let Some(action) = Action::from_key(&e.key()) {
                    e.prevent_default();
                    dispatch(&host, action);
                }
            })
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            Callback::from(|_e: KeyboardEvent| {})
        }
    };

    let pool_text = if view.pool_text.is_empty() {
        (*pool_draft).clone()
    } else {
        view.pool_text.clone()
    };
    let export_link = view
        .summary
        .as_ref()
        .and_then(|summary| host.with(|c| summary.export_link(c.identity().ids())));

    html! {
        <main class={classes!("play", view.game.slug())} onkeydown={on_keydown} tabindex="-1" data-testid="play">
            <style>{ crate::a11y::FOCUS_CSS }</style>
            <LiveRegions />
            <h1>{ view.game.title() }</h1>
            <StatusBar status={view.status.clone()} />
            <StatsPanel
                stats_line={view.stats_line.clone()}
                puzzle_time={view.puzzle_time.clone()}
                total_time={view.total_time.clone()}
                countdown={view.countdown.clone()}
            />
            <CardTable cards={view.cards.clone()} question={view.question.clone()} formula={view.formula.clone()} />
            <AnswerForm
                enabled={view.controls.can_submit}
                placeholder={AttrValue::from(placeholder(view.game))}
                on_submit={on_submit}
            />
            <ControlBar controls={view.controls} auto_advance={view.auto_advance} on_action={on_action} on_toggle_auto={on_toggle_auto} />
            if let Some(hint) = view.hint.clone() {
                <HintBox hint={hint} />
            }
            if let Some(summary) = view.summary.clone() {
                <SummaryPanel summary={summary} export_link={export_link} />
            }
            <SettingsPanel
                level={view.level.clone()}
                mode={view.mode}
                target={view.target}
                pool_text={pool_text}
                competition_minutes={*minutes}
                high_contrast={*high_contrast}
                on_request={on_settings}
            />
        </main>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use yew::LocalServerRenderer;

    #[test]
    fn fresh_page_renders_an_idle_table() {
        let html = block_on(
            LocalServerRenderer::<PlayPage>::with_props(Props {
                game: GameKind::Game24,
            })
            .render(),
        );
        assert!(html.contains("Game 24"), "{html}");
        assert!(html.contains("Played 0"));
        assert!(html.contains("target-input"));
        assert!(html.contains("e.g. (9-5)*3*2"));
    }

    #[test]
    fn fixed_target_games_hide_the_target_field() {
        let html = block_on(
            LocalServerRenderer::<PlayPage>::with_props(Props {
                game: GameKind::CountByTwos,
            })
            .render(),
        );
        assert!(html.contains("Count by 2s"));
        assert!(!html.contains("target-input"));
    }

    #[test]
    fn every_shortcut_maps_to_a_controller_action() {
        assert_eq!(Action::from_key("d"), Some(Action::Deal));
        assert_eq!(placeholder(GameKind::RunningSum), "Sum so far");
    }
}
