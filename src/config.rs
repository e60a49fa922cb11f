//! Environment-driven configuration helpers
//!
//! Every setting is read through a lookup function so configs can be built
//! from the process environment or from a plain map in tests.

/// Read a string setting, falling back to `default`
pub fn string_or<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, name).unwrap_or_else(|| default.to_string())
}

/// Read an optional setting. Empty values count as unset.
pub fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a setting with `FromStr`, falling back to `default` when unset
pub fn parsed_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match non_empty(lookup, name) {
        Some(raw) => raw.parse::<T>().map_err(|_| ConfigError::Invalid {
            name: name.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

/// Parse a boolean flag (`1/true/yes/on` or `0/false/no/off`)
pub fn flag_or<F>(lookup: &F, name: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, name) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                name: name.to_string(),
                value: raw,
            }),
        },
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {name}")]
    Invalid { name: String, value: String },

    #[error("Unknown timezone '{0}': {1}")]
    Timezone(String, String),
}
