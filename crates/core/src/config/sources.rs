use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

/// Where a configuration value came from, for debugging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value interpolated from one or more environment variables
    EnvVar(Vec<String>),
    /// Default value used
    Default(String),
    /// Literal value from the configuration file
    File(String),
}

impl ConfigSource {
    /// Check if source is environment variable
    pub fn is_env_var(&self) -> bool {
        matches!(self, ConfigSource::EnvVar(_))
    }

    /// Check if source is default value
    pub fn is_default(&self) -> bool {
        matches!(self, ConfigSource::Default(_))
    }

    /// Get source description
    pub fn description(&self) -> String {
        match self {
            ConfigSource::EnvVar(vars) => format!("Environment variable: {}", vars.join(", ")),
            ConfigSource::Default(value) => format!("Default value: {}", value),
            ConfigSource::File(path) => format!("Configuration file: {}", path),
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Result of expanding `${VAR}` placeholders in a raw value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpolated {
    pub value: String,
    /// Variables referenced by the raw value, in order of appearance
    pub referenced: Vec<String>,
    /// Referenced variables that the lookup could not resolve
    pub missing: Vec<String>,
}

/// Expand every `${VAR}` placeholder in `raw` using `lookup`.
///
/// Unresolved variables are replaced by an empty string and reported in
/// `missing`; the caller decides whether that is fatal.
pub fn interpolate<F>(raw: &str, lookup: F) -> Interpolated
where
    F: Fn(&str) -> Option<String>,
{
    let mut referenced = Vec::new();
    let mut missing = Vec::new();

    let value = PLACEHOLDER
        .replace_all(raw, |caps: &Captures<'_>| {
            let var = caps[1].to_string();
            let resolved = lookup(&var);
            if resolved.is_none() {
                tracing::warn!("Environment variable {} not found", var);
                missing.push(var.clone());
            }
            referenced.push(var);
            resolved.unwrap_or_default()
        })
        .into_owned();

    Interpolated {
        value,
        referenced,
        missing,
    }
}

/// Environment lookup backed by the process environment
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_whole_value_placeholder() {
        let result = interpolate("${DATABASE_URL}", lookup_from(&[("DATABASE_URL", "postgres://db/app")]));
        assert_eq!(result.value, "postgres://db/app");
        assert_eq!(result.referenced, vec!["DATABASE_URL".to_string()]);
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_embedded_placeholders() {
        let lookup = lookup_from(&[("DB_USER", "app"), ("DB_HOST", "localhost")]);
        let result = interpolate("postgres://${DB_USER}@${DB_HOST}:5432/app", lookup);
        assert_eq!(result.value, "postgres://app@localhost:5432/app");
        assert_eq!(result.referenced.len(), 2);
    }

    #[test]
    fn test_missing_variable_becomes_empty() {
        let result = interpolate("${NOT_SET}", lookup_from(&[]));
        assert_eq!(result.value, "");
        assert_eq!(result.missing, vec!["NOT_SET".to_string()]);
    }

    #[test]
    fn test_literal_value_untouched() {
        let result = interpolate("migrations", lookup_from(&[]));
        assert_eq!(result.value, "migrations");
        assert!(result.referenced.is_empty());

        // Bare dollar signs and malformed placeholders are kept verbatim.
        let result = interpolate("cost$5 ${ not a var }", lookup_from(&[]));
        assert_eq!(result.value, "cost$5 ${ not a var }");
    }

    #[test]
    fn test_source_description() {
        let source = ConfigSource::EnvVar(vec!["DATABASE_URL".to_string()]);
        assert!(source.is_env_var());
        assert_eq!(source.to_string(), "Environment variable: DATABASE_URL");
        assert!(ConfigSource::Default("migoration_version".to_string()).is_default());
    }
}
