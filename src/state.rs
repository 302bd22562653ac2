// src/state.rs

//! Process-wide context handed to every drawer constructor.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::resolution::Resolution;

/// Shared, read-only context built once during setup.
#[derive(Debug, Clone)]
pub struct State {
    pub resolution: Resolution,
    pub config: Config,
}

impl State {
    pub fn new(resolution: Resolution, config: Config) -> Self {
        State { resolution, config }
    }

    /// Decodes the settings entry configured for drawer `name`.
    ///
    /// A drawer without an entry gets `T::default()`.
    pub fn drawer_settings<T>(&self, name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.config.drawers.settings.get(name) {
            Some(value) => T::deserialize(value)
                .with_context(|| format!("Invalid settings for drawer '{}'", name)),
            None => Ok(T::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use test_log::test;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Knobs {
        width: u32,
        label: Option<String>,
    }

    fn state_with(settings: serde_json::Value) -> State {
        let mut config = Config::default();
        if let serde_json::Value::Object(map) = settings {
            config.drawers.settings = map.into_iter().collect();
        }
        State::new(Resolution::new(1080, 300), config)
    }

    #[test]
    fn missing_entry_yields_defaults() {
        let state = state_with(serde_json::json!({}));
        assert_eq!(state.drawer_settings::<Knobs>("gauge").unwrap(), Knobs::default());
    }

    #[test]
    fn entry_is_decoded_for_its_drawer_only() {
        let state = state_with(serde_json::json!({
            "gauge": { "width": 7 },
            "other": { "label": "x" }
        }));
        assert_eq!(
            state.drawer_settings::<Knobs>("gauge").unwrap(),
            Knobs {
                width: 7,
                label: None
            }
        );
    }

    #[test]
    fn malformed_entry_names_the_drawer() {
        let state = state_with(serde_json::json!({ "gauge": { "width": "wide" } }));
        let err = state.drawer_settings::<Knobs>("gauge").unwrap_err();
        assert!(err.to_string().contains("gauge"));
    }
}
