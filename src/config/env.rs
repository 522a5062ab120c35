use std::ffi::OsString;

use super::node::coerce_scalar;
use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;

/// Maps `PREFIX<sep>A<sep>B=value` environment variables to the config path `a.b`.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
}

impl EnvSource {
    /// # Panics
    ///
    /// Panics if `separator` is empty.
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
        }
    }

    fn entries_from<I>(&self, vars: I) -> Vec<ConfigEntry>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix_with_sep = format!("{}{}", self.prefix, self.separator);
        let mut entries = Vec::new();

        for (key, value) in vars {
            let Some(path_str) = key.strip_prefix(&prefix_with_sep) else {
                continue;
            };
            if path_str.is_empty() {
                continue;
            }

            let path: Vec<String> = path_str
                .split(&self.separator)
                .map(|s| s.to_lowercase())
                .collect();

            tracing::debug!(var = %key, "config value from environment");
            entries.push(ConfigEntry::at_path(path, coerce_scalar(&value)));
        }

        entries
    }
}

impl ConfigSource for EnvSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        Ok(self.entries_from(utf8_vars(std::env::vars_os())))
    }
}

/// Keeps the variables whose name and value are both valid UTF-8.
fn utf8_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                tracing::debug!(var = ?key, "skipping non UTF-8 environment variable");
                None
            }
        })
}
