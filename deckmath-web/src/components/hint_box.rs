use deckmath_game::HintPanel;
use yew::prelude::*;

#[derive(Properties, Clone, PartialEq, Eq)]
pub struct Props {
    pub hint: HintPanel,
}

#[function_component(HintBox)]
pub fn hint_box(p: &Props) -> Html {
    html! {
        <section class="hint" aria-label="Help" data-testid="hint">
            <h3>{ p.hint.headline.clone() }</h3>
            if !p.hint.lines.is_empty() {
                <ol class="solutions">
                    { for p.hint.lines.iter().map(|line| html! { <li><code>{ line.clone() }</code></li> }) }
                </ol>
            }
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use yew::LocalServerRenderer;

    #[test]
    fn lists_every_solution() {
        let hint = HintPanel {
            headline: "All solutions (2):".to_string(),
            lines: vec!["(9-5)*3*2".to_string(), "9*2+3+5-2".to_string()],
        };
        let html = block_on(LocalServerRenderer::<HintBox>::with_props(Props { hint }).render());
        assert!(html.contains("All solutions (2):"));
        assert_eq!(html.matches("<li>").count(), 2);
    }
}
