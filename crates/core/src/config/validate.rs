use super::{types::Config, ConfigError};
use crate::remote::RAWG_MAX_PAGE_SIZE;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Import page size is within what RAWG accepts
/// - Remote timeout is not 0
/// - RAWG API key is not blank when the section is present
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Sync validation
    let page_size = config.sync.import_page_size;
    if page_size == 0 || page_size > RAWG_MAX_PAGE_SIZE {
        return Err(ConfigError::ValidationError(format!(
            "sync.import_page_size must be between 1 and {}, got {}",
            RAWG_MAX_PAGE_SIZE, page_size
        )));
    }
    if config.sync.remote_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "sync.remote_timeout_secs cannot be 0".to_string(),
        ));
    }

    // RAWG validation
    if let Some(rawg) = &config.rawg {
        if rawg.api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "rawg.api_key cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}
