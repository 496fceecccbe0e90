//! Configuration validation logic.

use crate::config::schema::GatewayConfig;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validation error: {}", self.0)
    }
}

/// Validate a GatewayConfig for semantic correctness.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.port == 0 {
        errors.push(ValidationError("server.port must be non-zero".to_string()));
    }
    if config.server.read_timeout_secs == 0 {
        errors.push(ValidationError(
            "server.read_timeout_secs must be positive".to_string(),
        ));
    }
    if config.server.write_timeout_secs == 0 {
        errors.push(ValidationError(
            "server.write_timeout_secs must be positive".to_string(),
        ));
    }

    if config.routing.config_file.is_empty() {
        errors.push(ValidationError(
            "routing.config_file is required".to_string(),
        ));
    }

    const LEVELS: [&str; 4] = ["debug", "info", "warn", "error"];
    if !LEVELS.contains(&config.logging.level.as_str()) {
        errors.push(ValidationError(format!(
            "invalid log level: {}",
            config.logging.level
        )));
    }

    const FORMATS: [&str; 2] = ["json", "text"];
    if !FORMATS.contains(&config.logging.format.as_str()) {
        errors.push(ValidationError(format!(
            "invalid log format: {}",
            config.logging.format
        )));
    }

    if let Some(redis) = &config.redis {
        if redis.host.is_empty() {
            errors.push(ValidationError("redis.host is required".to_string()));
        }
        if redis.db < 0 {
            errors.push(ValidationError(
                "redis.db must be non-negative".to_string(),
            ));
        }
        // Admin endpoints are live once a session store exists; an empty
        // shared key would make the forced-revoke surface unguardable.
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError(
                "admin.api_key is required when redis is configured".to_string(),
            ));
        }
    }

    if let Some(jwt) = &config.jwt {
        if jwt.max_token_lifetime_secs == 0 {
            errors.push(ValidationError(
                "jwt.max_token_lifetime_secs must be positive".to_string(),
            ));
        }
        if !jwt.skip_validation && jwt.public_key_files.is_empty() {
            errors.push(ValidationError(
                "jwt.public_key_files is required unless skip_validation is set".to_string(),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
