//! File-based configuration source.

use std::path::{Path, PathBuf};

use super::node::{Mapping, Node};
use super::source::{ConfigEntry, ConfigSource};
use super::ConfigError;

/// A configuration source that loads from a YAML, TOML or JSON file.
///
/// The format is picked from the file extension. Files can be marked as
/// required or optional. Required files that don't exist cause an error;
/// optional files that don't exist are silently skipped.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
}

impl FileSource {
    /// Creates a new file source.
    ///
    /// If `required` is true, the build will fail if the file doesn't exist.
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required,
        }
    }
}

impl ConfigSource for FileSource {
    fn entries(&self) -> Result<Vec<ConfigEntry>, ConfigError> {
        match read_optional(&self.path, self.required)? {
            Some(map) => {
                tracing::debug!(path = %self.path.display(), "loaded config file");
                Ok(vec![ConfigEntry::root(map)])
            }
            None => {
                tracing::debug!(path = %self.path.display(), "optional config file not found");
                Ok(vec![])
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Toml,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "toml" => Some(Format::Toml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

/// Loads a config file into a mapping.
///
/// An empty YAML document is an empty mapping; any other top-level value
/// that is not a mapping is rejected.
pub fn load_config_file(path: &Path) -> Result<Mapping, ConfigError> {
    read_optional(path, true)?.ok_or_else(|| ConfigError::FileNotFound(path.to_path_buf()))
}

fn read_optional(path: &Path, required: bool) -> Result<Option<Mapping>, ConfigError> {
    let format =
        Format::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return if required {
                Err(ConfigError::FileNotFound(path.to_path_buf()))
            } else {
                Ok(None)
            };
        }
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let parse_error = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    };

    let node = match format {
        Format::Yaml => Node::from_yaml_str(&contents).map_err(|e| parse_error(Box::new(e)))?,
        Format::Toml => Node::from_toml_str(&contents).map_err(|e| parse_error(Box::new(e)))?,
        Format::Json => Node::from_json_str(&contents).map_err(|e| parse_error(Box::new(e)))?,
    };

    match node {
        Node::Mapping(map) => Ok(Some(map)),
        Node::Null => Ok(Some(Mapping::new())),
        _ => Err(ConfigError::NotAMapping(path.to_path_buf())),
    }
}
