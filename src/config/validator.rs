use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub(super) fn require_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Discord ids are unsigned 64-bit snowflakes; zero is never issued.
pub(super) fn require_snowflake(field: &str, value: &str) -> Result<(), ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(id) if id > 0 => Ok(()),
        _ => Err(ConfigError::InvalidConfig(format!(
            "{field} must be a numeric discord id, got {value:?}"
        ))),
    }
}

pub(super) fn require_positive(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidConfig(format!(
            "{field} must be greater than zero"
        )));
    }
    Ok(())
}
