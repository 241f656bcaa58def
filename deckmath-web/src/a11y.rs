//! Screen-reader announcements, focus styling and the high-contrast theme.

use deckmath_game::prefs::HIGH_CONTRAST_KEY;
use deckmath_game::{PreferenceStore, StatusLine, StatusTone};
use yew::prelude::*;

use crate::platform::BrowserStore;

/// Focus ring for keyboard play plus the visually hidden utility class.
pub const FOCUS_CSS: &str = concat!(
    ".play :focus-visible{outline:3px solid #2F6FEB;outline-offset:2px}",
    ".card:focus-visible{outline-width:4px}",
    ".sr-only{position:absolute;width:1px;height:1px;margin:-1px;overflow:hidden;clip:rect(0 0 0 0);white-space:nowrap}",
);

const HIGH_CONTRAST_CLASS: &str = "hc";

/// The two off-screen live regions a status line can be read through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveRegion {
    Polite,
    Assertive,
}

impl LiveRegion {
    /// Problems interrupt the reader; everything else waits its turn.
    #[must_use]
    pub const fn for_tone(tone: StatusTone) -> Self {
        match tone {
            StatusTone::Warning | StatusTone::Error => Self::Assertive,
            StatusTone::Info | StatusTone::Success => Self::Polite,
        }
    }

    #[must_use]
    pub const fn element_id(self) -> &'static str {
        match self {
            Self::Polite => "status-live-polite",
            Self::Assertive => "status-live-assertive",
        }
    }

    #[must_use]
    pub const fn politeness(self) -> &'static str {
        match self {
            Self::Polite => "polite",
            Self::Assertive => "assertive",
        }
    }

    const fn other(self) -> Self {
        match self {
            Self::Polite => Self::Assertive,
            Self::Assertive => Self::Polite,
        }
    }
}

/// Empty regions that [`announce`] writes into.
#[function_component(LiveRegions)]
pub fn live_regions() -> Html {
    let region = |r: LiveRegion| {
        html! { <div id={r.element_id()} class="sr-only" aria-live={r.politeness()} aria-atomic="true"></div> }
    };
    html! {
        <>
            { region(LiveRegion::Polite) }
            { region(LiveRegion::Assertive) }
        </>
    }
}

/// Read `status` aloud through the region its tone calls for.
///
/// The other region is cleared so a stale error is not repeated.
pub fn announce(status: &StatusLine) {
    let Some(doc) = web_sys::window().and_then(|win| win.document()) else {
        return;
    };
    let target = LiveRegion::for_tone(status.tone);
    if let Some(stale) = doc.get_element_by_id(target.other().element_id()) {
        stale.set_text_content(None);
    }
    if let Some(node) = doc.get_element_by_id(target.element_id()) {
        node.set_text_content(Some(&status.text));
    }
}

/// Switch the high-contrast theme and remember the choice for this browser.
pub fn set_high_contrast(enabled: bool) {
    apply_theme_class(enabled);
    let flag = if enabled { "1" } else { "0" };
    if let Err(err) = BrowserStore::local().write(HIGH_CONTRAST_KEY, flag) {
        log::warn!("could not remember the contrast setting: {err}");
    }
}

/// Re-apply a remembered high-contrast choice on page load.
pub fn restore_high_contrast() {
    let enabled = BrowserStore::local()
        .read(HIGH_CONTRAST_KEY)
        .ok()
        .flatten()
        .is_some_and(|v| v == "1");
    if enabled {
        apply_theme_class(true);
    }
}

fn apply_theme_class(enabled: bool) {
    let Some(root) = web_sys::window()
        .and_then(|win| win.document())
        .and_then(|doc| doc.document_element())
    else {
        return;
    };
    let classes = root.class_list();
    let toggled = if enabled {
        classes.add_1(HIGH_CONTRAST_CLASS)
    } else {
        classes.remove_1(HIGH_CONTRAST_CLASS)
    };
    if toggled.is_err() {
        log::debug!("could not toggle the contrast class");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use yew::LocalServerRenderer;

    #[test]
    fn problems_interrupt_and_progress_waits() {
        assert_eq!(LiveRegion::for_tone(StatusTone::Error), LiveRegion::Assertive);
        assert_eq!(LiveRegion::for_tone(StatusTone::Warning), LiveRegion::Assertive);
        assert_eq!(LiveRegion::for_tone(StatusTone::Success), LiveRegion::Polite);
        assert_eq!(LiveRegion::for_tone(StatusTone::Info), LiveRegion::Polite);
    }

    #[test]
    fn both_regions_render_with_their_politeness() {
        let html = block_on(LocalServerRenderer::<LiveRegions>::new().render());
        assert!(html.contains("id=\"status-live-polite\""));
        assert!(html.contains("aria-live=\"assertive\""));
        assert_eq!(html.matches("class=\"sr-only\"").count(), 2);
    }
}
