//! Boots a service from `demos/boot.yaml`.
//!
//! ```text
//! cargo run --example boot -- --set "servers[1].port=2008,app.debug=true"
//! ```

use serde::Deserialize;
use svc_fnd::context::BoxError;
use svc_fnd::info::{BasicInfo, ConfigInfo};
use svc_fnd::{AppContext, BootFlags, Config, Entry};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Deserialize)]
struct AppConfig {
    app: AppSection,
    servers: Vec<ServerSection>,
    database: DatabaseSection,
}

#[derive(Debug, Deserialize)]
struct AppSection {
    name: String,
    debug: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ServerSection {
    name: String,
    port: u16,
    enabled: bool,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct DatabaseSection {
    host: String,
    port: u16,
    name: String,
    url: String,
}

struct Server {
    config: ServerSection,
}

impl Entry for Server {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn kind(&self) -> &str {
        "server"
    }

    fn bootstrap(&mut self) -> Result<(), BoxError> {
        tracing::info!(name = %self.config.name, port = self.config.port, "server started");
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), BoxError> {
        tracing::info!(name = %self.config.name, "server stopped");
        Ok(())
    }
}

fn main() -> Result<(), svc_fnd::Error> {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .try_init();

    let flags = BootFlags::from_env()?;
    let raw = Config::builder()
        .with_boot_flags(&flags, "demos/boot.yaml")?
        .build_node()?;
    let config: AppConfig = raw.decode().map_err(svc_fnd::ConfigError::from)?;

    let servers: Vec<Server> = config
        .servers
        .iter()
        .filter(|s| s.enabled)
        .cloned()
        .map(|config| Server { config })
        .collect();

    let mut builder = AppContext::builder()
        .with_name(config.app.name.clone())
        .with_config(config);
    for server in servers {
        builder = builder.with_entry(server);
    }

    let mut ctx = builder.build()?;
    ctx.add_raw_config("boot", raw);
    ctx.add_shutdown_hook("flush", || tracing::info!("flushed"));

    ctx.bootstrap()?;

    println!("App: {} (debug={})", ctx.config().app.name, ctx.config().app.debug);
    println!("Database URL: {}", ctx.config().database.url);
    println!(
        "Host: {} ({})",
        svc_fnd::common::local_hostname(),
        svc_fnd::common::local_ip()
    );
    println!("{}", svc_fnd::common::to_json_pretty(&BasicInfo::collect(&ctx)));
    for info in ConfigInfo::collect(&ctx) {
        println!("{}", svc_fnd::common::to_json_pretty(&info));
    }

    ctx.shutdown()
}
