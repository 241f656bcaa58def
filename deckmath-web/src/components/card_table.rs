use deckmath_game::CardSlot;
use yew::prelude::*;

#[derive(Properties, Clone, PartialEq, Eq)]
pub struct Props {
    pub cards: Vec<CardSlot>,
    #[prop_or_default]
    pub question: Option<String>,
    #[prop_or_default]
    pub formula: Option<String>,
}

fn card(index: usize, slot: &CardSlot) -> Html {
    match slot {
        CardSlot::Face {
            image: Some(image), ..
        } if !image.url.is_empty() => html! {
            <li class="card face" data-index={index.to_string()}>
                <img src={image.url.clone()} alt={slot.label()} />
            </li>
        },
        CardSlot::Face { .. } => html! {
            <li class="card face" data-index={index.to_string()}>
                <span class="rank">{ slot.label() }</span>
            </li>
        },
        CardSlot::Back => html! {
            <li class="card back" data-index={index.to_string()} aria-label="Hidden card">
                <span class="rank" aria-hidden="true">{ "?" }</span>
            </li>
        },
    }
}

#[function_component(CardTable)]
pub fn card_table(p: &Props) -> Html {
    html! {
        <section class="table" aria-label="Cards">
            if let Some(question) = &p.question {
                <h2 class="question" data-testid="question">{ question.clone() }</h2>
            }
            if p.cards.is_empty() {
                <p class="empty-table">{ "Press Deal to start." }</p>
            } else {
                <ul class="cards">
                    { for p.cards.iter().enumerate().map(|(idx, slot)| card(idx, slot)) }
                </ul>
            }
            if let Some(formula) = &p.formula {
                <p class="formula" data-testid="formula">{ formula.clone() }</p>
            }
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckmath_game::CardImage;
    use futures::executor::block_on;
    use yew::LocalServerRenderer;

    #[test]
    fn renders_faces_backs_and_formula() {
        let props = Props {
            cards: vec![
                CardSlot::Face {
                    rank: 12,
                    image: None,
                },
                CardSlot::Face {
                    rank: 3,
                    image: Some(CardImage {
                        url: "/cards/3H.png".to_string(),
                        code: "3H".to_string(),
                    }),
                },
                CardSlot::Back,
            ],
            question: Some("Q1 [#12]".to_string()),
            formula: Some("12 + 3 = ?".to_string()),
        };
        let html = block_on(LocalServerRenderer::<CardTable>::with_props(props).render());
        assert!(html.contains(">Q<"), "face letter missing: {html}");
        assert!(html.contains("/cards/3H.png"));
        assert!(html.contains("Hidden card"));
        assert!(html.contains("12 + 3 = ?"));
        assert!(html.contains("Q1 [#12]"));
    }

    #[test]
    fn empty_table_prompts_for_a_deal() {
        let html = block_on(
            LocalServerRenderer::<CardTable>::with_props(Props {
                cards: Vec::new(),
                question: None,
                formula: None,
            })
            .render(),
        );
        assert!(html.contains("Press Deal to start."));
    }
}
