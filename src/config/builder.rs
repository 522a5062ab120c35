use std::path::Path;

use serde::de::DeserializeOwned;

use super::env::EnvSource;
use super::file::FileSource;
use super::flags::BootFlags;
use super::node::{Mapping, Node};
use super::overlay::override_node_reporting;
use super::overrides::parse_overrides;
use super::resolve::resolve_references;
use super::source::{merge_at_path, ConfigSource};
use super::ConfigError;

/// Builder for loading configuration from files, environment variables and
/// command-line overrides.
///
/// Loading runs in four steps:
///
/// 1. **Layers** (files, environment, custom sources) are merged in
///    registration order. Later layers override earlier ones; nested mappings
///    are merged recursively, other values (including sequences) are replaced.
/// 2. **Overrides** (`key=value` strings) are applied on top. They may only
///    change values that already exist with the same kind: unknown keys,
///    out-of-range indices and kind mismatches are dropped.
/// 3. **References** (`${path.to.field}`) in string values are resolved.
/// 4. The tree is **decoded** into the target type.
///
/// ## Example
///
/// ```no_run
/// use svc_fnd::Config;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct MyConfig {
///     name: String,
///     port: u16,
/// }
///
/// let config: MyConfig = Config::builder()
///     .with_file("config/default.yaml", true)
///     .with_file("config/local.yaml", false)
///     .with_env("MYAPP", "__")
///     .with_overrides("port=9090")
///     .build()?;
/// # Ok::<(), svc_fnd::ConfigError>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct Config {
    sources: Vec<Box<dyn ConfigSource>>,
    overrides: Vec<String>,
    strict_overrides: bool,
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Adds a config file layer (YAML, TOML or JSON by extension).
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(FileSource::new(path, required))
    }

    /// Adds a layer from environment variables with the given prefix.
    ///
    /// `MYAPP__DATABASE__HOST=localhost` maps to `database.host` for prefix
    /// `MYAPP` and separator `__`. Values are coerced to boolean, integer,
    /// float or string.
    pub fn with_env(self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.with_source(EnvSource::new(prefix, separator))
    }

    /// Adds a custom layer.
    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Adds an override string such as `servers[0].port=2008,debug=true`.
    ///
    /// Override strings are applied after every layer, in registration order.
    pub fn with_overrides(mut self, overrides: impl Into<String>) -> Self {
        self.overrides.push(overrides.into());
        self
    }

    /// Adds the boot config file and `--set` overrides from `flags`.
    ///
    /// Fails if the resolved boot config file does not exist.
    pub fn with_boot_flags(
        self,
        flags: &BootFlags,
        default_path: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let path = flags.resolve_config_path(default_path)?;
        let mut builder = self.with_file(path, true);
        builder.overrides.extend(flags.overrides.iter().cloned());
        Ok(builder)
    }

    /// Fails the build when an override is dropped instead of only logging it.
    pub fn strict_overrides(mut self) -> Self {
        self.strict_overrides = true;
        self
    }

    /// Loads, merges and resolves all sources into a single tree.
    pub fn build_node(self) -> Result<Node, ConfigError> {
        let mut merged = Mapping::new();

        for source in &self.sources {
            for entry in source.entries()? {
                merge_at_path(&mut merged, &entry.path, entry.value);
            }
        }

        let mut merged = Node::Mapping(merged);
        let mut rejected = Vec::new();

        for raw in &self.overrides {
            let overrides = parse_overrides(raw)?;
            for dropped in override_node_reporting(&mut merged, &overrides) {
                tracing::debug!(path = %dropped.path, reason = %dropped.reason, "override dropped");
                rejected.push(dropped);
            }
        }

        if self.strict_overrides && !rejected.is_empty() {
            return Err(ConfigError::OverridesRejected(rejected));
        }

        if let Node::Mapping(map) = &mut merged {
            resolve_references(map)?;
        }

        Ok(merged)
    }

    /// Builds the configuration by loading, merging, resolving, and deserializing.
    ///
    /// This performs deserialization once at build time rather than on each access,
    /// making subsequent config reads zero-cost.
    pub fn build<T: DeserializeOwned>(self) -> Result<T, ConfigError> {
        let node = self.build_node()?;
        Ok(node.decode()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Server {
        port: u16,
        enabled: bool,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct AppConfig {
        name: String,
        servers: Vec<Server>,
    }

    const BOOT: &str = r#"
name: demo
servers:
  - port: 1949
    enabled: true
  - port: 1950
    enabled: true
"#;

    #[test]
    fn test_file_layers_override_in_order() {
        let base = yaml_file(BOOT);
        let local = yaml_file("name: local\n");

        let config: AppConfig = Config::builder()
            .with_file(base.path(), true)
            .with_file(local.path(), true)
            .build()
            .unwrap();

        assert_eq!(config.name, "local");
        assert_eq!(config.servers.len(), 2);
    }

    #[test]
    fn test_overrides_apply_after_layers() {
        let base = yaml_file(BOOT);

        let config: AppConfig = Config::builder()
            .with_file(base.path(), true)
            .with_overrides("servers[1].port=2008,servers[1].enabled=false")
            .build()
            .unwrap();

        assert_eq!(
            config.servers,
            vec![
                Server {
                    port: 1949,
                    enabled: true,
                },
                Server {
                    port: 2008,
                    enabled: false,
                },
            ]
        );
    }

    #[test]
    fn test_overrides_cannot_change_shape() {
        let base = yaml_file(BOOT);

        let node = Config::builder()
            .with_file(base.path(), true)
            .with_overrides("servers[5].port=1,name=true,extra=1")
            .build_node()
            .unwrap();

        assert_eq!(node["servers"].as_sequence().unwrap().len(), 2);
        assert_eq!(node["name"], Node::from("demo"));
        assert!(node.get("extra").is_none());
    }

    #[test]
    fn test_strict_overrides_report_drops() {
        let base = yaml_file(BOOT);

        let result = Config::builder()
            .with_file(base.path(), true)
            .with_overrides("name=true")
            .strict_overrides()
            .build_node();

        match result {
            Err(ConfigError::OverridesRejected(dropped)) => {
                assert_eq!(dropped.len(), 1);
                assert_eq!(dropped[0].path, "name");
            }
            other => panic!("expected rejected overrides, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_override_string_is_error() {
        let base = yaml_file(BOOT);
        let result = Config::builder()
            .with_file(base.path(), true)
            .with_overrides("no assignment")
            .build_node();
        assert!(matches!(result, Err(ConfigError::Override(_))));
    }

    #[test]
    fn test_references_see_overridden_values() {
        let base = yaml_file("host: localhost\nurl: \"http://${host}/api\"\n");

        let node = Config::builder()
            .with_file(base.path(), true)
            .with_overrides("host=example.com")
            .build_node()
            .unwrap();

        assert_eq!(node["url"], Node::from("http://example.com/api"));
    }

    #[test]
    fn test_decode_error() {
        let base = yaml_file("name: demo\nservers: nope\n");
        let result = Config::builder()
            .with_file(base.path(), true)
            .build::<AppConfig>();
        assert!(matches!(result, Err(ConfigError::DeserializeError(_))));
    }
}
