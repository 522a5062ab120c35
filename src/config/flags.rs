//! Boot flags read from the process command line.
//!
//! Two flags are recognised, everything else on the command line is left to
//! the application's own parser:
//!
//! ```text
//! ./service --boot-config config/boot.yaml \
//!           --set "servers[0].port=2008,servers[0].common.enabled=false"
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::de::DeserializeOwned;

use super::{Config, ConfigError};

pub const BOOT_CONFIG_FLAG: &str = "--boot-config";
pub const OVERRIDES_FLAG: &str = "--set";

/// Values of `--boot-config` and `--set`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(
    name = "boot",
    disable_help_flag = true,
    disable_version_flag = true,
    no_binary_name = true
)]
pub struct BootFlags {
    /// Boot config file path, absolute or relative to the working directory.
    #[arg(long = "boot-config", value_name = "PATH")]
    pub config_path: Option<PathBuf>,

    /// Comma separated overrides (`key1=val1,key2=val2`); may be repeated.
    #[arg(long = "set", value_name = "OVERRIDES")]
    pub overrides: Vec<String>,
}

impl BootFlags {
    /// Reads the boot flags from the process arguments.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_args(std::env::args_os().skip(1))
    }

    /// Picks the boot flags out of `args`, ignoring any other argument.
    ///
    /// `args` must not include the binary name.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let selected = select_boot_args(args.into_iter().map(Into::into));
        Ok(Self::try_parse_from(selected)?)
    }

    pub fn with_config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_overrides(mut self, overrides: impl Into<String>) -> Self {
        self.overrides.push(overrides.into());
        self
    }

    /// Picks the config file to load.
    ///
    /// `--boot-config` wins over `default_path`. Relative paths are joined
    /// onto the working directory, and the file must exist.
    pub fn resolve_config_path(&self, default_path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
        let path = self
            .config_path
            .as_deref()
            .unwrap_or_else(|| default_path.as_ref());

        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::WorkingDir)?
                .join(path)
        };

        if !path.is_file() {
            return Err(ConfigError::FileNotFound(path));
        }
        Ok(path)
    }

    /// Loads the boot config file, applies every `--set` override and
    /// decodes the result into `T`.
    pub fn load<T: DeserializeOwned>(&self, default_path: impl AsRef<Path>) -> Result<T, ConfigError> {
        Config::builder().with_boot_flags(self, default_path)?.build()
    }
}

/// Keeps only `--boot-config` / `--set` and their values.
fn select_boot_args(args: impl Iterator<Item = OsString>) -> Vec<OsString> {
    let mut selected = Vec::new();
    let mut args = args.peekable();

    while let Some(arg) = args.next() {
        let Some(text) = arg.to_str() else {
            continue;
        };

        let flag = [BOOT_CONFIG_FLAG, OVERRIDES_FLAG]
            .into_iter()
            .find(|flag| text == *flag || text.starts_with(&format!("{flag}=")));

        match flag {
            Some(flag) if text == flag => {
                selected.push(arg.clone());
                if let Some(value) = args.next_if(|next| !is_flag(next)) {
                    selected.push(value);
                }
            }
            Some(_) => selected.push(arg.clone()),
            None => {}
        }
    }

    selected
}

fn is_flag(arg: &OsString) -> bool {
    arg.to_str().is_some_and(|s| s.starts_with("--"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_flags_are_picked_from_mixed_args() {
        let flags = BootFlags::from_args([
            "--verbose",
            "--boot-config",
            "boot.yaml",
            "serve",
            "--set=a=1",
            "--set",
            "b[0]=x",
            "--port",
            "80",
        ])
        .unwrap();

        assert_eq!(flags.config_path, Some(PathBuf::from("boot.yaml")));
        assert_eq!(flags.overrides, vec!["a=1".to_string(), "b[0]=x".to_string()]);
    }

    #[test]
    fn test_no_flags() {
        let flags = BootFlags::from_args(["serve", "--port", "80"]).unwrap();
        assert_eq!(flags, BootFlags::default());
    }

    #[test]
    fn test_flag_without_value_is_error() {
        let result = BootFlags::from_args(["--set", "--boot-config", "x.yaml"]);
        assert!(matches!(result, Err(ConfigError::Flags(_))));
    }

    #[test]
    fn test_flag_path_wins_over_default() {
        let file = Builder::new().suffix(".yaml").tempfile().unwrap();
        let flags = BootFlags::default().with_config_path(file.path());

        let resolved = flags.resolve_config_path("does-not-matter.yaml").unwrap();
        assert_eq!(resolved, file.path());
    }

    #[test]
    fn test_default_path_used_without_flag() {
        let file = Builder::new().suffix(".yaml").tempfile().unwrap();
        let resolved = BootFlags::default().resolve_config_path(file.path()).unwrap();
        assert_eq!(resolved, file.path());
    }

    #[test]
    fn test_relative_path_joins_working_dir() {
        // Cargo runs tests from the package root
        let resolved = BootFlags::default()
            .with_config_path("Cargo.toml")
            .resolve_config_path("")
            .unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("Cargo.toml"));
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = BootFlags::default()
            .with_config_path("non-exist.yaml")
            .resolve_config_path("");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_applies_overrides() {
        #[derive(serde::Deserialize)]
        struct MyConfig {
            key: String,
        }

        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "key: value").unwrap();

        let config: MyConfig = BootFlags::default()
            .with_config_path(file.path())
            .with_overrides("key=value2")
            .load("")
            .unwrap();
        assert_eq!(config.key, "value2");
    }
}
