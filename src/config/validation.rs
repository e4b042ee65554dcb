use crate::config::types::{Config, FetchConfig, PatternEntry};
use crate::patterns::BUILTIN_NAMES;
use crate::{ConfigError, ConfigResult};
use regex::Regex;
use std::collections::HashSet;

const MAX_TIMEOUT_SECS: u64 = 300;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_fetch_config(&config.fetch)?;
    validate_pattern_entries(&config.patterns)?;
    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> ConfigResult<()> {
    if config.timeout_secs < 1 || config.timeout_secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and {}, got {}",
            MAX_TIMEOUT_SECS, config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 || config.connect_timeout_secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be between 1 and {}, got {}",
            MAX_TIMEOUT_SECS, config.connect_timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the extra named patterns
fn validate_pattern_entries(entries: &[PatternEntry]) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for entry in entries {
        let name = entry.name.trim();

        if name.is_empty() {
            return Err(ConfigError::InvalidPattern(
                "Pattern name cannot be empty".to_string(),
            ));
        }

        if BUILTIN_NAMES.contains(&name) {
            return Err(ConfigError::InvalidPattern(format!(
                "Pattern '{}' would shadow a built-in pattern",
                name
            )));
        }

        if !seen.insert(name) {
            return Err(ConfigError::InvalidPattern(format!(
                "Pattern '{}' is defined more than once",
                name
            )));
        }

        if entry.regex.is_empty() {
            return Err(ConfigError::InvalidPattern(format!(
                "Pattern '{}' has an empty regex",
                name
            )));
        }

        Regex::new(&entry.regex).map_err(|e| {
            ConfigError::InvalidPattern(format!("Pattern '{}' does not compile: {}", name, e))
        })?;
    }

    Ok(())
}
