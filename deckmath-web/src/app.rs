use yew::prelude::*;
use yew_router::prelude::*;

use crate::pages::{HomePage, NotFound, PlayPage};
use crate::router::Route;

/// Root component: router plus route switch.
#[function_component(App)]
pub fn app() -> Html {
    let basename = crate::paths::router_base();
    html! {
        <BrowserRouter basename={basename.map(AttrValue::from)}>
            <Switch<Route> render={switch} />
        </BrowserRouter>
    }
}

fn switch(route: Route) -> Html {
    match route.game() {
        Some(game) => html! { <PlayPage key={game.slug()} game={game} /> },
        None if route == Route::Home => html! { <HomePage /> },
        None => html! { <NotFoundRoute /> },
    }
}

#[function_component(NotFoundRoute)]
fn not_found_route() -> Html {
    let navigator = use_navigator();
    let on_go_home = Callback::from(move |()| {
        if let Some(nav) = navigator.as_ref() {
            nav.push(&Route::Home);
        }
    });
    html! { <NotFound on_go_home={on_go_home} /> }
}
