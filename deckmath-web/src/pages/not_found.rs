use yew::prelude::*;

/// Shown when the path matches no game.
#[derive(Properties, PartialEq)]
pub struct Props {
    pub on_go_home: Callback<()>,
}

#[function_component(NotFound)]
pub fn not_found(props: &Props) -> Html {
    let go_home = {
        let cb = props.on_go_home.clone();
        Callback::from(move |_| cb.emit(()))
    };

    html! {
        <section class="panel not-found" aria-live="assertive">
            <h1>{ "Page not found" }</h1>
            <p>{ "There is no game at this address." }</p>
            <button type="button" onclick={go_home}>{ "Back to games" }</button>
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use yew::LocalServerRenderer;

    #[test]
    fn offers_a_way_home() {
        let html = block_on(
            LocalServerRenderer::<NotFound>::with_props(Props {
                on_go_home: Callback::noop(),
            })
            .render(),
        );
        assert!(html.contains("Back to games"));
    }
}
