#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
use yew::prelude::*;

#[derive(Properties, Clone, PartialEq)]
pub struct Props {
    pub enabled: bool,
    pub placeholder: AttrValue,
    pub on_submit: Callback<String>,
}

/// Answer input. Enter submits and clears; the controller validates.
#[function_component(AnswerForm)]
pub fn answer_form(p: &Props) -> Html {
    let value = use_state(String::new);

    let on_input = {
        let value = value.clone();
        #[cfg(target_arch = "wasm32")]
        {
            Callback::from(move |e: InputEvent| {
                if let Some(input) = e
                    .target()
                    .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
                {
                    value.set(input.value());
                }
            })
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = value;
            Callback::from(|_e: InputEvent| {})
        }
    };

    let on_submit = {
        let value = value.clone();
        let cb = p.on_submit.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            cb.emit((*value).clone());
            value.set(String::new());
        })
    };

    html! {
        <form class="answer" onsubmit={on_submit}>
            <label for="answer-input" class="sr-only">{ "Answer" }</label>
            <input
                id="answer-input"
                type="text"
                autocomplete="off"
                inputmode="text"
                placeholder={p.placeholder.clone()}
                value={(*value).clone()}
                oninput={on_input}
                disabled={!p.enabled}
                data-testid="answer-input"
            />
            <button type="submit" disabled={!p.enabled}>{ "Check" }</button>
        </form>
    }
}
