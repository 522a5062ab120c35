//! Small helpers shared by services: environment lookups, locale matching,
//! identifiers, host lookups, JSON conversions and file access.

mod fs;
mod host;
mod id;
mod json;
mod locale;

pub use fs::{file_exists, read_file, resolve_path, try_read_file};
pub use host::{local_hostname, local_ip, DEFAULT_LOCAL_IP};
pub use id::{rand_string, request_id, request_id_with_prefix};
pub use json::{json_str_to_map, to_json_map, to_json_pretty};
pub use locale::Locale;

/// Returns `default` when `value` is empty.
pub fn default_if_empty<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

/// Reads an environment variable, falling back to `default` when it is unset or empty.
pub fn env_or_default(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

/// Username part of a `username:password` pair, or `""` if malformed.
pub fn basic_auth_username(basic_auth: &str) -> &str {
    split_basic_auth(basic_auth).map_or("", |(user, _)| user)
}

/// Password part of a `username:password` pair, or `""` if malformed.
pub fn basic_auth_password(basic_auth: &str) -> &str {
    split_basic_auth(basic_auth).map_or("", |(_, password)| password)
}

fn split_basic_auth(basic_auth: &str) -> Option<(&str, &str)> {
    let mut tokens = basic_auth.split(':');
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(user), Some(password), None) => Some((user, password)),
        _ => None,
    }
}

/// `"http"` or `"https"` for matching URLs, `""` otherwise.
pub fn url_scheme(url: &str) -> &'static str {
    if url.starts_with("http://") {
        "http"
    } else if url.starts_with("https://") {
        "https"
    } else {
        ""
    }
}
