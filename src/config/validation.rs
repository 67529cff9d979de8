//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check the bind address parses as a socket address
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: RuntimeConfig -> Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RuntimeConfig;

/// A single semantic validation failure.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a valid socket address")]
    BindAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("rate_limit.requests_per_second must be greater than zero when enabled")]
    ZeroRate,

    #[error("rate_limit.burst_size must be greater than zero when enabled")]
    ZeroBurst,

    #[error("auth.public_paths entry {0:?} must start with '/'")]
    PublicPath(String),

    #[error("cors.allow_credentials cannot be combined with a wildcard origin")]
    CredentialsWithWildcard,
}

/// Validate a deserialized configuration, collecting every failure.
pub fn validate_config(config: &RuntimeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.rate_limit.enabled {
        if config.rate_limit.requests_per_second == 0 {
            errors.push(ValidationError::ZeroRate);
        }
        if config.rate_limit.burst_size == 0 {
            errors.push(ValidationError::ZeroBurst);
        }
    }

    if config.cors.enabled
        && config.cors.allow_credentials
        && config.cors.allowed_origins.iter().any(|o| o == "*")
    {
        errors.push(ValidationError::CredentialsWithWildcard);
    }

    for path in &config.auth.public_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::PublicPath(path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
