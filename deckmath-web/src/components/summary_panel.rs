use deckmath_game::SessionSummary;
use yew::prelude::*;

#[derive(Properties, Clone, PartialEq, Eq)]
pub struct Props {
    pub summary: SessionSummary,
    #[prop_or_default]
    pub export_link: Option<String>,
}

/// End-of-pool / end-of-competition report. Rendered from the structured
/// summary; server markup is never injected.
#[function_component(SummaryPanel)]
pub fn summary_panel(p: &Props) -> Html {
    let lines = p
        .summary
        .play_summary
        .as_ref()
        .map(deckmath_game::PlaySummary::report_lines)
        .unwrap_or_default();
    html! {
        <section class="summary" aria-label="Session summary" data-testid="summary">
            <h2>{ "Summary" }</h2>
            if lines.is_empty() {
                <p>{ "No summary." }</p>
            } else {
                <pre class="report">{ lines.join("\n") }</pre>
            }
            if let Some(link) = &p.export_link {
                <a class="export" href={link.clone()} download="">{ "Download CSV" }</a>
            }
        </section>
    }
}
