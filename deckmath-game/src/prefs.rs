//! UI preferences remembered between visits. Nothing here is authoritative;
//! the server owns pools and stats.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::convert::Infallible;

use crate::PreferenceStore;
use crate::config::{LEVELS, SessionConfig, clamp_target};
use crate::rules::GameKind;

/// Per-tab client id key (session storage).
pub const CLIENT_ID_KEY: &str = "deckmath.client_id";
/// Per-browser guest id key (local storage).
pub const GUEST_ID_KEY: &str = "deckmath.guest_id";
pub const HIGH_CONTRAST_KEY: &str = "deckmath.hc";

fn key(game: GameKind, name: &str) -> String {
    format!("deckmath.{}.{name}", game.slug())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedPreferences {
    pub level: Option<String>,
    pub auto_advance: Option<bool>,
    pub pool_text: Option<String>,
    pub competition_minutes: Option<u32>,
    pub target: Option<i32>,
    pub high_contrast: bool,
}

impl SavedPreferences {
    /// Read what the store has; unreadable or invalid entries are skipped.
    pub fn load<S: PreferenceStore + ?Sized>(store: &S, game: GameKind) -> Self {
        let read = |name: &str| match store.read(&key(game, name)) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(err) => {
                log::warn!("could not read preference {name}: {err}");
                None
            }
        };
        let high_contrast = store
            .read(HIGH_CONTRAST_KEY)
            .ok()
            .flatten()
            .is_some_and(|v| v == "1");
        Self {
            level: read("level").filter(|level| LEVELS.contains(&level.as_str())),
            auto_advance: read("auto_advance").and_then(|v| v.parse().ok()),
            pool_text: read("pool_text"),
            competition_minutes: read("competition_minutes").and_then(|v| v.parse().ok()),
            target: read("target")
                .and_then(|v| v.parse::<i64>().ok())
                .map(clamp_target),
            high_contrast,
        }
    }

    /// Persist every field that is set.
    ///
    /// # Errors
    ///
    /// Returns the store's error when a write fails.
    pub fn save<S: PreferenceStore + ?Sized>(&self, store: &S, game: GameKind) -> Result<(), S::Error> {
        if let Some(level) = &self.level {
            store.write(&key(game, "level"), level)?;
        }
        if let Some(auto) = self.auto_advance {
            store.write(&key(game, "auto_advance"), &auto.to_string())?;
        }
        match &self.pool_text {
            Some(text) => store.write(&key(game, "pool_text"), text)?,
            None => store.remove(&key(game, "pool_text"))?,
        }
        match self.competition_minutes {
            Some(minutes) => store.write(&key(game, "competition_minutes"), &minutes.to_string())?,
            None => store.remove(&key(game, "competition_minutes"))?,
        }
        if let Some(target) = self.target {
            store.write(&key(game, "target"), &target.to_string())?;
        }
        store.write(HIGH_CONTRAST_KEY, if self.high_contrast { "1" } else { "0" })
    }

    /// Seed a session config from saved choices.
    pub fn apply_to(&self, config: &mut SessionConfig) {
        if let Some(level) = &self.level {
            config.level.clone_from(level);
        }
        if let Some(auto) = self.auto_advance {
            config.auto_advance = auto;
        }
        if let Some(target) = self.target {
            config.target = target;
        }
    }
}

/// In-memory store for hosts without browser storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl PreferenceStore for MemoryStore {
    type Error = Infallible;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_preferences_reload() {
        let store = MemoryStore::default();
        let prefs = SavedPreferences {
            level: Some("hard".to_string()),
            auto_advance: Some(false),
            pool_text: Some("1, 2, 3".to_string()),
            competition_minutes: Some(10),
            target: Some(30),
            high_contrast: true,
        };
        prefs.save(&store, GameKind::Game24).unwrap();
        assert_eq!(SavedPreferences::load(&store, GameKind::Game24), prefs);
        assert_eq!(
            SavedPreferences::load(&store, GameKind::RunningSum).level,
            None,
            "preferences are per game"
        );
    }

    #[test]
    fn invalid_entries_are_ignored() {
        let store = MemoryStore::default();
        store.write("deckmath.game24.level", "impossible").unwrap();
        store.write("deckmath.game24.target", "900").unwrap();
        store.write("deckmath.game24.auto_advance", "maybe").unwrap();
        let prefs = SavedPreferences::load(&store, GameKind::Game24);
        assert_eq!(prefs.level, None);
        assert_eq!(prefs.target, Some(100));
        assert_eq!(prefs.auto_advance, None);
    }

    #[test]
    fn cleared_pool_removes_entries() {
        let store = MemoryStore::default();
        let mut prefs = SavedPreferences {
            pool_text: Some("4".to_string()),
            ..SavedPreferences::default()
        };
        prefs.save(&store, GameKind::CountByTwos).unwrap();
        prefs.pool_text = None;
        prefs.save(&store, GameKind::CountByTwos).unwrap();
        assert_eq!(SavedPreferences::load(&store, GameKind::CountByTwos).pool_text, None);
    }

    #[test]
    fn apply_to_overrides_config() {
        let mut config = SessionConfig::default();
        SavedPreferences {
            level: Some("medium".to_string()),
            auto_advance: Some(false),
            ..SavedPreferences::default()
        }
        .apply_to(&mut config);
        assert_eq!(config.level, "medium");
        assert!(!config.auto_advance);
    }
}
