use deckmath_game::{LEVELS, PlayMode};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
use yew::prelude::*;

/// What the player asked the settings panel to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsRequest {
    Level(String),
    Target(i64),
    LoadCase(i64),
    SavePool {
        text: String,
        minutes: Option<u32>,
    },
    HighContrast(bool),
}

#[derive(Properties, Clone, PartialEq)]
pub struct Props {
    pub level: String,
    pub mode: PlayMode,
    /// `None` for fixed-target games.
    #[prop_or_default]
    pub target: Option<i32>,
    #[prop_or_default]
    pub pool_text: String,
    #[prop_or_default]
    pub competition_minutes: Option<u32>,
    #[prop_or_default]
    pub high_contrast: bool,
    pub on_request: Callback<SettingsRequest>,
}

#[cfg(target_arch = "wasm32")]
fn input_value(node: &NodeRef) -> String {
    node.cast::<web_sys::HtmlInputElement>()
        .map(|input| input.value())
        .or_else(|| {
            node.cast::<web_sys::HtmlTextAreaElement>()
                .map(|area| area.value())
        })
        .unwrap_or_default()
}

#[cfg(not(target_arch = "wasm32"))]
fn input_value(_node: &NodeRef) -> String {
    String::new()
}

fn level_label(level: &str) -> String {
    let mut chars = level.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

#[function_component(SettingsPanel)]
pub fn settings_panel(p: &Props) -> Html {
    let target_ref = use_node_ref();
    let case_ref = use_node_ref();
    let pool_ref = use_node_ref();
    let minutes_ref = use_node_ref();

    let on_level = {
        let cb = p.on_request.clone();
        #[cfg(target_arch = "wasm32")]
        {
            Callback::from(move |e: Event| {
                if let Some(sel) = e
                    .target()
                    .and_then(|t| t.dyn_into::<web_sys::HtmlSelectElement>().ok())
                {
                    cb.emit(SettingsRequest::Level(sel.value()));
                }
            })
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = cb;
            Callback::from(|_e: Event| {})
        }
    };

    let on_target = {
        let cb = p.on_request.clone();
        let target_ref = target_ref.clone();
        Callback::from(move |_| {
            if let Ok(value) = input_value(&target_ref).trim().parse::<i64>() {
                cb.emit(SettingsRequest::Target(value));
            }
        })
    };

    let on_case = {
        let cb = p.on_request.clone();
        let case_ref = case_ref.clone();
        Callback::from(move |_| {
            // Out-of-range and junk input is reported by the controller.
            let value = input_value(&case_ref).trim().parse::<i64>().unwrap_or(0);
            cb.emit(SettingsRequest::LoadCase(value));
        })
    };

    let on_save_pool = {
        let cb = p.on_request.clone();
        let pool_ref = pool_ref.clone();
        let minutes_ref = minutes_ref.clone();
        Callback::from(move |_| {
            let minutes = input_value(&minutes_ref).trim().parse::<u32>().ok();
            cb.emit(SettingsRequest::SavePool {
                text: input_value(&pool_ref),
                minutes,
            });
        })
    };

    let on_contrast = {
        let cb = p.on_request.clone();
        let current = p.high_contrast;
        Callback::from(move |_| cb.emit(SettingsRequest::HighContrast(!current)))
    };

    html! {
        <section class="settings" aria-label="Settings">
            <label for="level-select">{ "Level" }</label>
            <select id="level-select" onchange={on_level} data-testid="level-select">
                { for LEVELS.iter().map(|level| html! {
                    <option value={*level} selected={*level == p.level}>{ level_label(level) }</option>
                }) }
            </select>

            if let Some(target) = p.target {
                <label for="target-input">{ "Target" }</label>
                <input id="target-input" type="number" min="-100" max="100"
                    value={target.to_string()} ref={target_ref} />
                <button type="button" onclick={on_target}>{ "Set target" }</button>
            }

            <label for="case-input">{ "Case ID" }</label>
            <input id="case-input" type="number" min="1" max="1820" ref={case_ref} />
            <button type="button" onclick={on_case}>{ "Load case" }</button>

            if p.mode.is_pool() {
                <fieldset class="pool" data-testid="pool-editor">
                    <legend>{ format!("{} pool", level_label(p.mode.pool_mode().as_str())) }</legend>
                    <textarea id="pool-input" rows="3" placeholder="1, 2, 3"
                        value={p.pool_text.clone()} ref={pool_ref} />
                    if p.mode == PlayMode::Competition {
                        <label for="minutes-input">{ "Minutes" }</label>
                        <input id="minutes-input" type="number" min="1" max="60"
                            value={p.competition_minutes.unwrap_or(5).to_string()} ref={minutes_ref} />
                    }
                    <button type="button" onclick={on_save_pool}>{ "Save pool" }</button>
                </fieldset>
            }

            <label class="contrast">
                <input type="checkbox" checked={p.high_contrast} onclick={on_contrast} />
                { "High contrast" }
            </label>
        </section>
    }
}
