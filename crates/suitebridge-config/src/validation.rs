//! Configuration validation.

use suitebridge_core::error::{GatewayError, GatewayResult};

use crate::schema::Config;

/// Validate a loaded configuration, eagerly rejecting anything the rest of
/// the gateway would otherwise fail on lazily mid-request.
pub fn validate(config: &Config) -> GatewayResult<()> {
    validate_credentials(config)?;
    validate_retry(config)?;
    validate_operational(config)?;
    Ok(())
}

fn validate_credentials(config: &Config) -> GatewayResult<()> {
    let erp = &config.erp;
    for (field, value) in [
        ("account_id", &erp.account_id),
        ("consumer_key", &erp.consumer_key),
        ("consumer_secret", &erp.consumer_secret),
        ("token_id", &erp.token_id),
        ("token_secret", &erp.token_secret),
    ] {
        if value.trim().is_empty() {
            return Err(GatewayError::validation(format!(
                "erp.{field} must be set (via SUITEBRIDGE_* env var or the config file)"
            )));
        }
    }
    Ok(())
}

fn validate_retry(config: &Config) -> GatewayResult<()> {
    if config.retry.max_retries == 0 {
        return Err(GatewayError::validation("retry.max_retries must be at least 1"));
    }
    if config.retry.backoff_multiplier <= 1.0 {
        return Err(GatewayError::validation(
            "retry.backoff_multiplier must be greater than 1.0",
        ));
    }
    if !(0.0..=1.0).contains(&config.retry.jitter_fraction) {
        return Err(GatewayError::validation(
            "retry.jitter_fraction must be between 0.0 and 1.0",
        ));
    }
    Ok(())
}

fn validate_operational(config: &Config) -> GatewayResult<()> {
    if config.operational.max_concurrent_erp_queries == 0 {
        return Err(GatewayError::validation(
            "operational.max_concurrent_erp_queries must be at least 1",
        ));
    }
    if config.operational.erp_row_cap == 0 {
        return Err(GatewayError::validation("operational.erp_row_cap must be at least 1"));
    }
    Ok(())
}
