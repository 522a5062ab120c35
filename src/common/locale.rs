use std::fmt;

const WILDCARD: &str = "*";

/// Where a process runs, as `<realm>::<region>::<az>::<domain>`.
///
/// Each element comes from the `REALM`, `REGION`, `AZ` and `DOMAIN`
/// environment variables; unset or empty variables become the `*` wildcard.
///
/// Config files can then carry per-environment variants:
///
/// ```yaml
/// db:
///   - name: redis-default
///     locale: "*::*::*::*"
///   - name: redis-in-prod
///     locale: "*::*::*::prod"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub realm: String,
    pub region: String,
    pub az: String,
    pub domain: String,
}

impl Locale {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a locale from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let element = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| WILDCARD.to_string())
        };

        Self {
            realm: element("REALM"),
            region: element("REGION"),
            az: element("AZ"),
            domain: element("DOMAIN"),
        }
    }

    /// Checks a `realm::region::az::domain` pattern against this locale.
    ///
    /// A `*` element in the pattern matches anything. Patterns without
    /// exactly four elements never match.
    pub fn matches(&self, pattern: &str) -> bool {
        let tokens: Vec<&str> = pattern.split("::").collect();
        let [realm, region, az, domain] = tokens.as_slice() else {
            return false;
        };

        [
            (*realm, &self.realm),
            (*region, &self.region),
            (*az, &self.az),
            (*domain, &self.domain),
        ]
        .iter()
        .all(|(wanted, actual)| *wanted == WILDCARD || *wanted == actual.as_str())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}::{}", self.realm, self.region, self.az, self.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn locale(pairs: &[(&str, &str)]) -> Locale {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Locale::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_unset_elements_are_wildcards() {
        let locale = locale(&[("DOMAIN", "prod"), ("REGION", "")]);
        assert_eq!(locale.to_string(), "*::*::*::prod");
    }

    #[test]
    fn test_matches() {
        let locale = locale(&[
            ("REALM", "corp"),
            ("REGION", "us-east"),
            ("AZ", "us-east-1"),
            ("DOMAIN", "prod"),
        ]);

        assert!(locale.matches("*::*::*::*"));
        assert!(locale.matches("corp::us-east::us-east-1::prod"));
        assert!(locale.matches("*::*::*::prod"));
        assert!(locale.matches("corp::*::*::*"));
        assert!(!locale.matches("*::*::*::test"));
        assert!(!locale.matches("*::*::prod"));
        assert!(!locale.matches(""));
    }

    #[test]
    fn test_unset_domain_only_matches_wildcard() {
        let locale = locale(&[]);
        assert!(locale.matches("*::*::*::*"));
        assert!(!locale.matches("*::*::*::prod"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("DOMAIN", "staging");
        let locale = Locale::from_env();
        std::env::remove_var("DOMAIN");

        assert_eq!(locale.domain, "staging");
    }
}
