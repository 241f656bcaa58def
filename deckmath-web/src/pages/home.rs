use deckmath_game::GameKind;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::router::Route;

const fn blurb(game: GameKind) -> &'static str {
    match game {
        GameKind::Game24 => "Combine four cards with + - * / to hit the target.",
        GameKind::RunningSum => "Add the cards group by group as they turn over.",
        GameKind::CountByTwos => "Count the cards by twos.",
    }
}

/// Landing page listing the games.
#[function_component(HomePage)]
pub fn home_page() -> Html {
    html! {
        <main class="home" data-testid="home">
            <h1>{ "Deckmath" }</h1>
            <ul class="games">
                { for GameKind::ALL.into_iter().map(|game| html! {
                    <li>
                        <Link<Route> to={Route::for_game(game)}>{ game.title() }</Link<Route>>
                        <p>{ blurb(game) }</p>
                    </li>
                }) }
            </ul>
        </main>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use yew::LocalServerRenderer;
    use yew_router::history::{AnyHistory, History, MemoryHistory};

    #[function_component(Harness)]
    fn harness() -> Html {
        let history = AnyHistory::from(MemoryHistory::new());
        history.push("/");
        html! {
            <Router history={history}>
                <HomePage />
            </Router>
        }
    }

    #[test]
    fn links_every_game() {
        let html = block_on(LocalServerRenderer::<Harness>::new().render());
        for game in GameKind::ALL {
            assert!(html.contains(game.title()), "{html}");
            assert!(html.contains(&format!("/{}", game.slug())));
        }
    }
}
