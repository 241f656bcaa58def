use deckmath_game::Controls;
use yew::prelude::*;

/// Buttons on the control bar; also what keyboard shortcuts map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Deal,
    Skip,
    Hint,
    HintAll,
    Restart,
    Exit,
}

impl Action {
    /// Shortcut key for the action. Enter submits and is handled by the form.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "d" => Some(Self::Deal),
            "n" => Some(Self::Skip),
            "h" => Some(Self::Hint),
            "H" => Some(Self::HintAll),
            "r" => Some(Self::Restart),
            "x" => Some(Self::Exit),
            _ => None,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Deal => "Deal",
            Self::Skip => "Skip",
            Self::Hint => "Help",
            Self::HintAll => "All solutions",
            Self::Restart => "Restart",
            Self::Exit => "Exit",
        }
    }

    const fn key_hint(self) -> &'static str {
        match self {
            Self::Deal => "d",
            Self::Skip => "n",
            Self::Hint => "h",
            Self::HintAll => "H",
            Self::Restart => "r",
            Self::Exit => "x",
        }
    }

    #[must_use]
    pub const fn enabled(self, controls: &Controls) -> bool {
        match self {
            Self::Deal => controls.can_deal,
            Self::Skip => controls.can_skip,
            Self::Hint | Self::HintAll => controls.can_hint,
            Self::Restart => controls.can_restart,
            Self::Exit => controls.can_exit,
        }
    }
}

#[derive(Properties, Clone, PartialEq)]
pub struct Props {
    pub controls: Controls,
    pub auto_advance: bool,
    pub on_action: Callback<Action>,
    pub on_toggle_auto: Callback<bool>,
}

#[function_component(ControlBar)]
pub fn control_bar(p: &Props) -> Html {
    let button = |action: Action| {
        let cb = p.on_action.clone();
        html! {
            <button
                type="button"
                class="control"
                disabled={!action.enabled(&p.controls)}
                aria-keyshortcuts={action.key_hint()}
                onclick={Callback::from(move |_| cb.emit(action))}
            >
                { action.label() }
            </button>
        }
    };
    let toggle = {
        let cb = p.on_toggle_auto.clone();
        let current = p.auto_advance;
        Callback::from(move |_| cb.emit(!current))
    };

    html! {
        <nav class="controls" aria-label="Game controls">
            { for [Action::Deal, Action::Skip, Action::Hint, Action::HintAll].into_iter().map(&button) }
            <label class="auto-advance">
                <input type="checkbox" checked={p.auto_advance} onclick={toggle} />
                { "Auto-advance" }
            </label>
            { button(Action::Restart) }
            { button(Action::Exit) }
        </nav>
    }
}
