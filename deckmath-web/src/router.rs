use deckmath_game::GameKind;
use yew_router::prelude::*;

#[derive(Clone, Debug, Routable, PartialEq, Eq)]
pub enum Route {
    #[at("/")]
    Home,
    #[at("/game24")]
    Game24,
    #[at("/sum4")]
    RunningSum,
    #[at("/count_by_2s")]
    CountByTwos,
    #[at("/404")]
    #[not_found]
    NotFound,
}

impl Route {
    #[must_use]
    pub const fn for_game(game: GameKind) -> Self {
        match game {
            GameKind::Game24 => Self::Game24,
            GameKind::RunningSum => Self::RunningSum,
            GameKind::CountByTwos => Self::CountByTwos,
        }
    }

    #[must_use]
    pub const fn game(&self) -> Option<GameKind> {
        match self {
            Self::Game24 => Some(GameKind::Game24),
            Self::RunningSum => Some(GameKind::RunningSum),
            Self::CountByTwos => Some(GameKind::CountByTwos),
            Self::Home | Self::NotFound => None,
        }
    }
}
