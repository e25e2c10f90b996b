//! Configuration validation.
//!
//! Validates all config fields before any data is loaded.

use crate::domain::error::AnalyticsError;
use crate::domain::reducer::BuiltinReducer;
use crate::ports::config_port::ConfigPort;

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    validate_data_path(config)?;
    validate_reducer(config)?;
    validate_trailing_window(config)?;
    validate_pool_size(config)?;
    Ok(())
}

fn validate_data_path(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    match config.get_string("data", "path") {
        Some(p) if !p.trim().is_empty() => Ok(()),
        Some(_) => Err(AnalyticsError::ConfigInvalid {
            section: "data".to_string(),
            key: "path".to_string(),
            reason: "path must not be empty".to_string(),
        }),
        None => Err(AnalyticsError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

fn validate_reducer(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    let Some(name) = config
        .get_string("engine", "reducer")
        .filter(|s| !s.trim().is_empty())
    else {
        return Ok(());
    };
    name.parse::<BuiltinReducer>()
        .map(|_| ())
        .map_err(|e| AnalyticsError::ConfigInvalid {
            section: "engine".to_string(),
            key: "reducer".to_string(),
            reason: e.to_string(),
        })
}

fn validate_trailing_window(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    let value = config.get_int("engine", "trailing_window", 10);
    if value < 1 {
        return Err(AnalyticsError::ConfigInvalid {
            section: "engine".to_string(),
            key: "trailing_window".to_string(),
            reason: "trailing_window must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_pool_size(config: &dyn ConfigPort) -> Result<(), AnalyticsError> {
    let value = config.get_int("sqlite", "pool_size", 4);
    if value < 1 {
        return Err(AnalyticsError::ConfigInvalid {
            section: "sqlite".to_string(),
            key: "pool_size".to_string(),
            reason: "pool_size must be at least 1".to_string(),
        });
    }
    Ok(())
}
