use std::sync::{Arc, RwLock};

use super::app_settings::Settings;

/// Shared holder for the current policy.
///
/// Readers get an immutable `Arc<Settings>` snapshot that stays valid for
/// as long as they hold it; `replace` swaps in a whole new value, so a
/// reader sees either the old or the new settings, never a mix.
#[derive(Debug)]
pub struct SettingsStore {
    current: RwLock<Arc<Settings>>,
}

impl SettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            current: RwLock::new(Arc::new(settings)),
        }
    }

    pub fn snapshot(&self) -> Arc<Settings> {
        // A poisoned lock still guards a complete value: writers only swap the Arc.
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn replace(&self, settings: Settings) {
        let next = Arc::new(settings);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = next;
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
