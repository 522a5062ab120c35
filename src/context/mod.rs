//! Application context for managing shared application state.
//!
//! The context is an explicitly constructed value: build one at the process
//! entry point, hand references to whatever needs it, and call
//! [`AppContext::shutdown`] before exiting.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::Node;
use crate::Error;

pub const DEFAULT_APP_NAME: &str = "app";

/// Error type returned by [`Entry`] lifecycle methods.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A long-running component (server, client pool, worker) managed by the context.
pub trait Entry: Send {
    fn name(&self) -> &str;

    /// A short type label such as `"http-server"`.
    fn kind(&self) -> &str;

    fn bootstrap(&mut self) -> Result<(), BoxError>;

    fn shutdown(&mut self) -> Result<(), BoxError>;
}

type ShutdownHook = Box<dyn FnOnce() + Send>;

/// Central application context holding configuration and shared resources.
///
/// Generic over the configuration type `C`, which is deserialized once at build time.
/// Access configuration via [`config()`](Self::config) for zero-cost reads.
///
/// ## Example
///
/// ```no_run
/// use svc_fnd::{AppContext, Config};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct MyConfig {
///     name: String,
///     port: u16,
/// }
///
/// let mut ctx = AppContext::builder()
///     .with_name("orders")
///     .with_config(
///         Config::builder()
///             .with_file("boot.yaml", true)
///             .build::<MyConfig>()?
///     )
///     .build()?;
///
/// ctx.bootstrap()?;
/// let config = ctx.config();  // &MyConfig, zero-cost
/// ctx.shutdown()?;
/// # Ok::<(), svc_fnd::Error>(())
/// ```
pub struct AppContext<C> {
    config: C,
    name: String,
    start_time: DateTime<Utc>,
    span: tracing::Span,
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
    raw_configs: BTreeMap<String, Node>,
    entries: BTreeMap<String, Box<dyn Entry>>,
    shutdown_hooks: Vec<(String, ShutdownHook)>,
}

impl<C> AppContext<C> {
    /// Returns a reference to the configuration.
    ///
    /// This is a zero-cost operation since the config was deserialized at build time.
    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Time elapsed since the context was built. Never negative.
    pub fn up_time(&self) -> Duration {
        (Utc::now() - self.start_time).to_std().unwrap_or_default()
    }

    /// Span carrying the application name, for instrumenting application work.
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// Stores a custom value, replacing any previous value under `key`.
    pub fn insert_value<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    /// Returns the value under `key` if it exists and has type `T`.
    pub fn value<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn remove_value(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn clear_values(&mut self) {
        self.values.clear();
    }

    pub fn value_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Keeps an untyped config tree around, e.g. for diagnostics endpoints.
    pub fn add_raw_config(&mut self, name: impl Into<String>, config: Node) {
        self.raw_configs.insert(name.into(), config);
    }

    pub fn raw_config(&self, name: &str) -> Option<&Node> {
        self.raw_configs.get(name)
    }

    pub fn raw_configs(&self) -> &BTreeMap<String, Node> {
        &self.raw_configs
    }

    /// Registers an entry, replacing any entry with the same name.
    pub fn add_entry(&mut self, entry: Box<dyn Entry>) {
        self.entries.insert(entry.name().to_string(), entry);
    }

    pub fn entry(&self, name: &str) -> Option<&dyn Entry> {
        self.entries.get(name).map(|e| e.as_ref())
    }

    pub fn entry_names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Registers a hook to run once during [`shutdown`](Self::shutdown).
    pub fn add_shutdown_hook(&mut self, name: impl Into<String>, hook: impl FnOnce() + Send + 'static) {
        self.shutdown_hooks.push((name.into(), Box::new(hook)));
    }

    pub fn shutdown_hook_names(&self) -> Vec<&str> {
        self.shutdown_hooks.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Bootstraps every entry in name order, stopping at the first failure.
    pub fn bootstrap(&mut self) -> Result<(), Error> {
        let _guard = self.span.enter();

        for (name, entry) in self.entries.iter_mut() {
            tracing::info!(entry = %name, kind = %entry.kind(), "bootstrapping entry");
            entry.bootstrap().map_err(|source| Error::Entry {
                name: name.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Shuts entries down in reverse name order, then runs the shutdown hooks
    /// in registration order.
    ///
    /// Every entry is asked to shut down even if an earlier one fails; the
    /// first failure is returned. Hooks run at most once.
    pub fn shutdown(&mut self) -> Result<(), Error> {
        let _guard = self.span.enter();
        let mut first_error = None;

        for (name, entry) in self.entries.iter_mut().rev() {
            tracing::info!(entry = %name, kind = %entry.kind(), "shutting down entry");
            if let Err(source) = entry.shutdown() {
                tracing::warn!(entry = %name, error = %source, "entry shutdown failed");
                first_error.get_or_insert(Error::Entry {
                    name: name.clone(),
                    source,
                });
            }
        }

        for (name, hook) in self.shutdown_hooks.drain(..) {
            tracing::debug!(hook = %name, "running shutdown hook");
            hook();
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl AppContext<()> {
    /// Creates a new builder for constructing an `AppContext`.
    pub fn builder() -> AppContextBuilder<()> {
        AppContextBuilder {
            name: DEFAULT_APP_NAME.to_string(),
            config: None,
            entries: Vec::new(),
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for AppContext<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("name", &self.name)
            .field("start_time", &self.start_time)
            .field("config", &self.config)
            .field("values", &self.value_keys())
            .field("raw_configs", &self.raw_configs.keys().collect::<Vec<_>>())
            .field("entries", &self.entry_names())
            .field("shutdown_hooks", &self.shutdown_hook_names())
            .finish()
    }
}

/// Builder for constructing an [`AppContext`].
///
/// The builder starts with no config (`AppContextBuilder<()>`) and transitions
/// to `AppContextBuilder<C>` when [`with_config`](Self::with_config) is called.
#[must_use = "builders do nothing until .build() is called"]
pub struct AppContextBuilder<C> {
    name: String,
    config: Option<C>,
    entries: Vec<Box<dyn Entry>>,
}

impl AppContextBuilder<()> {
    /// Attaches a configuration to the application context.
    ///
    /// The configuration should be the result of [`Config::builder().build()`](crate::Config::build).
    pub fn with_config<C>(self, config: C) -> AppContextBuilder<C> {
        AppContextBuilder {
            name: self.name,
            config: Some(config),
            entries: self.entries,
        }
    }
}

impl<C> AppContextBuilder<C> {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_entry(mut self, entry: impl Entry + 'static) -> Self {
        self.entries.push(Box::new(entry));
        self
    }

    /// Builds the `AppContext`.
    ///
    /// Returns an error if no configuration was provided.
    pub fn build(self) -> Result<AppContext<C>, Error> {
        let config = self.config.ok_or(Error::MissingConfig)?;
        let span = tracing::info_span!("app", name = %self.name);

        let mut ctx = AppContext {
            config,
            name: self.name,
            start_time: Utc::now(),
            span,
            values: HashMap::new(),
            raw_configs: BTreeMap::new(),
            entries: BTreeMap::new(),
            shutdown_hooks: Vec::new(),
        };
        for entry in self.entries {
            ctx.add_entry(entry);
        }
        Ok(ctx)
    }
}
