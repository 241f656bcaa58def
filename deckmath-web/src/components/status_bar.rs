use deckmath_game::{StatusLine, StatusTone};
use yew::prelude::*;

#[derive(Properties, Clone, PartialEq, Eq)]
pub struct Props {
    pub status: StatusLine,
}

const fn tone_class(tone: StatusTone) -> &'static str {
    match tone {
        StatusTone::Info => "status info",
        StatusTone::Success => "status success",
        StatusTone::Warning => "status warning",
        StatusTone::Error => "status error",
    }
}

#[function_component(StatusBar)]
pub fn status_bar(p: &Props) -> Html {
    let role = if p.status.tone == StatusTone::Error {
        "alert"
    } else {
        "status"
    };
    html! {
        <p class={tone_class(p.status.tone)} role={role} aria-live="polite" data-testid="status">
            { p.status.text.clone() }
        </p>
    }
}
