//! Flat key-value settings. Values are strings regardless of logical type.

use std::collections::BTreeMap;

use crate::error::RegistryError;

use super::document::Setting;
use super::{current_time_secs, RegistryStore};

impl RegistryStore {
    pub fn setting(&self, key: &str) -> Option<String> {
        self.doc()
            .settings
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.value.clone())
    }

    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<(), RegistryError> {
        let now = current_time_secs();
        if let Some(existing) = self.doc_mut().settings.iter_mut().find(|s| s.key == key) {
            existing.value = value.to_string();
            existing.updated_at = now;
        } else {
            self.doc_mut().settings.push(Setting {
                key: key.to_string(),
                value: value.to_string(),
                updated_at: now,
            });
        }
        self.persist()
    }

    pub fn all_settings(&self) -> BTreeMap<String, String> {
        self.doc()
            .settings
            .iter()
            .map(|s| (s.key.clone(), s.value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::temp_store;

    #[test]
    fn set_then_get_roundtrips() {
        let (_dir, mut store) = temp_store();
        store.set_setting("theme", "dark").unwrap();
        assert_eq!(store.setting("theme").as_deref(), Some("dark"));
        assert_eq!(store.setting("missing"), None);
    }

    #[test]
    fn set_overwrites_and_bumps_updated_at() {
        let (_dir, mut store) = temp_store();
        store.set_setting("theme", "dark").unwrap();
        store.set_setting("theme", "light").unwrap();
        assert_eq!(store.setting("theme").as_deref(), Some("light"));
        assert_eq!(store.all_settings().len(), 1);
    }

    #[test]
    fn all_settings_maps_keys_to_values() {
        let (_dir, mut store) = temp_store();
        store.set_setting("a", "1").unwrap();
        store.set_setting("b", "2").unwrap();
        let all = store.all_settings();
        assert_eq!(all.get("a").map(String::as_str), Some("1"));
        assert_eq!(all.get("b").map(String::as_str), Some("2"));
    }
}
