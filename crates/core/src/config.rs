//! Environment-variable helpers shared by the server and database config.

use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not valid: '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Read a required variable.
pub fn env_required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

/// Read and parse an optional variable, falling back to `default` when unset.
pub fn env_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => parse_var(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_var<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parse_var_accepts_padded_numbers() {
        assert_eq!(parse_var::<u16>("PORT", " 8080 ").unwrap(), 8080);
    }

    #[test]
    fn parse_var_rejects_garbage() {
        assert_matches!(
            parse_var::<u16>("PORT", "eighty"),
            Err(ConfigError::Invalid { name: "PORT", .. })
        );
    }

    #[test]
    fn unset_variable_uses_default() {
        let value: u64 = env_or("GUPTA_TEST_SURELY_UNSET_VARIABLE", 30).unwrap();
        assert_eq!(value, 30);
        assert_matches!(
            env_required("GUPTA_TEST_SURELY_UNSET_VARIABLE"),
            Err(ConfigError::Missing(_))
        );
    }
}
