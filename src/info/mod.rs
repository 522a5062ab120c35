//! Serializable snapshots of the running application, for diagnostics
//! endpoints and startup logs.

use std::time::Duration;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;

/// Basic information about the running process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicInfo {
    /// `"unknown"` when the process user cannot be determined.
    pub uid: String,
    pub gid: String,
    pub username: String,
    pub start_time: String,
    pub up_time_sec: u64,
    pub up_time_str: String,
    pub application_name: String,
    pub realm: String,
    pub region: String,
    pub az: String,
    pub domain: String,
}

impl BasicInfo {
    /// Reads the process user, the context's timing and the raw
    /// `REALM`/`REGION`/`AZ`/`DOMAIN` variables (empty when unset).
    pub fn collect<C>(ctx: &AppContext<C>) -> Self {
        let user = ProcessUser::current();
        let up_time = ctx.up_time();

        Self {
            uid: user.uid,
            gid: user.gid,
            username: user.name,
            start_time: ctx.start_time().to_rfc3339_opts(SecondsFormat::Secs, true),
            up_time_sec: up_time.as_secs(),
            up_time_str: format_duration_short(up_time),
            application_name: ctx.name().to_string(),
            realm: env_value("REALM"),
            region: env_value("REGION"),
            az: env_value("AZ"),
            domain: env_value("DOMAIN"),
        }
    }
}

/// A raw config tree registered on the context, rendered as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigInfo {
    pub name: String,
    pub raw: String,
}

impl ConfigInfo {
    pub fn collect<C>(ctx: &AppContext<C>) -> Vec<Self> {
        ctx.raw_configs()
            .iter()
            .map(|(name, node)| Self {
                name: name.clone(),
                raw: serde_json::to_string(node).unwrap_or_default(),
            })
            .collect()
    }
}

const UNKNOWN: &str = "unknown";

struct ProcessUser {
    uid: String,
    gid: String,
    name: String,
}

impl ProcessUser {
    #[cfg(unix)]
    fn current() -> Self {
        use nix::unistd::{getgid, getuid, User};

        let uid = getuid();
        let name = User::from_uid(uid)
            .ok()
            .flatten()
            .map(|user| user.name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(env_username);

        Self {
            uid: uid.to_string(),
            gid: getgid().to_string(),
            name,
        }
    }

    #[cfg(not(unix))]
    fn current() -> Self {
        Self {
            uid: UNKNOWN.to_string(),
            gid: UNKNOWN.to_string(),
            name: env_username(),
        }
    }
}

fn env_username() -> String {
    ["USER", "USERNAME"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn env_value(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}

/// Formats the largest two units of a duration, e.g. `2h5m` or `45s`.
fn format_duration_short(duration: Duration) -> String {
    const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

    let mut remaining = duration.as_secs();
    let mut parts = Vec::new();

    for (size, suffix) in UNITS {
        let count = remaining / size;
        if count > 0 {
            parts.push(format!("{count}{suffix}"));
            remaining %= size;
        }
        if parts.len() == 2 {
            break;
        }
    }

    if parts.is_empty() {
        return format!("{}ms", duration.as_millis());
    }
    parts.concat()
}
