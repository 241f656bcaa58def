use yew::prelude::*;

#[derive(Properties, Clone, PartialEq, Eq)]
pub struct Props {
    pub stats_line: String,
    pub puzzle_time: String,
    pub total_time: String,
    #[prop_or_default]
    pub countdown: Option<String>,
}

#[function_component(StatsPanel)]
pub fn stats_panel(p: &Props) -> Html {
    html! {
        <aside class="stats" aria-label="Session statistics">
            <p class="stats-line" data-testid="stats-line">{ p.stats_line.clone() }</p>
            <p class="timers">
                <span class="puzzle-time">{ format!("Puzzle {}", p.puzzle_time) }</span>
                <span class="total-time">{ format!("Total {}", p.total_time) }</span>
            </p>
            if let Some(countdown) = &p.countdown {
                <p class="countdown" role="timer" data-testid="countdown">
                    { format!("Time left {countdown}") }
                </p>
            }
        </aside>
    }
}
