use crate::config::types::{ApiConfig, BusConfig, Config, StoreConfig};
use crate::ConfigError;
use std::net::SocketAddr;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_store_config(&config.store)?;
    validate_bus_config(&config.bus)?;
    validate_api_config(&config.api)?;

    if config.crawler.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_bus_config(config: &BusConfig) -> Result<(), ConfigError> {
    if config.server_url.is_empty() {
        return Err(ConfigError::Validation(
            "server-url cannot be empty".to_string(),
        ));
    }

    for (name, subject) in [
        ("task-subject", &config.task_subject),
        ("delegation-subject", &config.delegation_subject),
    ] {
        if subject.is_empty() || subject.contains(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "{} must be a non-empty subject without whitespace, got '{}'",
                name, subject
            )));
        }
    }

    // The repeater republishes delegated tasks onto the task subject; the
    // two subjects must be distinct or every message loops forever.
    if config.task_subject == config.delegation_subject {
        return Err(ConfigError::Validation(format!(
            "task-subject and delegation-subject must differ, both are '{}'",
            config.task_subject
        )));
    }

    if config.worker_group.is_empty() {
        return Err(ConfigError::Validation(
            "worker-group cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    config
        .bind_addr
        .parse::<SocketAddr>()
        .map_err(|_| {
            ConfigError::Validation(format!(
                "bind-addr must be a host:port address, got '{}'",
                config.bind_addr
            ))
        })
        .map(|_| ())
}
