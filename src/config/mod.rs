mod defaults;
pub mod loader;

pub use loader::{history_path, load};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::history::DEFAULT_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Maximum number of remembered command templates.
    #[serde(
        default,
        deserialize_with = "lenient_capacity",
        skip_serializing_if = "Option::is_none"
    )]
    pub command_history: Option<usize>,
    /// Default separator for splitting captured output into items.
    #[serde(default = "defaults::separator")]
    pub separator: String,
    /// Copy resulting items to the clipboard.
    #[serde(default)]
    pub copy_items: bool,
}

impl AppConfig {
    /// History capacity, falling back to the default when unset.
    pub fn history_capacity(&self) -> usize {
        self.command_history.unwrap_or(DEFAULT_CAPACITY)
    }
}

/// Accept any value for `command_history`, keeping only non-negative integers.
fn lenient_capacity<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<toml::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| {
        let capacity = value
            .as_integer()
            .and_then(|n| usize::try_from(n).ok());
        if capacity.is_none() {
            warn!(%value, "Ignoring invalid command_history setting");
        }
        capacity
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.history_capacity(), 100);
        assert_eq!(config.separator, "\n");
        assert!(!config.copy_items);
    }

    #[test]
    fn test_command_history() {
        let config: AppConfig = toml::from_str("command_history = 25").unwrap();
        assert_eq!(config.history_capacity(), 25);
    }

    #[test]
    fn test_invalid_command_history_uses_default() {
        for source in [
            "command_history = -5",
            "command_history = \"many\"",
            "command_history = 2.5",
        ] {
            let config: AppConfig = toml::from_str(source).unwrap();
            assert_eq!(config.history_capacity(), 100, "{source}");
        }
    }

    #[test]
    fn test_other_settings() {
        let config: AppConfig = toml::from_str("separator = \",\"\ncopy_items = true").unwrap();
        assert_eq!(config.separator, ",");
        assert!(config.copy_items);
    }
}
