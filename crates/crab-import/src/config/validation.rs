//! Configuration validation.

use super::Config;
use crate::core::identifier::validate_identifier;
use crate::error::{ImportError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.target.host.is_empty() {
        return Err(ImportError::Config("target.host is required".into()));
    }
    if config.target.database.is_empty() {
        return Err(ImportError::Config("target.database is required".into()));
    }
    if config.target.user.is_empty() {
        return Err(ImportError::Config("target.user is required".into()));
    }
    validate_identifier(&config.target.schema)
        .map_err(|e| ImportError::Config(format!("target.schema: {}", e)))?;

    if config.import.commit_threshold == 0 {
        return Err(ImportError::Config(
            "import.commit_threshold must be at least 1".into(),
        ));
    }
    let ext = &config.import.extension;
    if ext.is_empty() || ext.starts_with('.') || ext.contains(['/', '\\']) {
        return Err(ImportError::Config(format!(
            "import.extension must be a bare extension like 'dbf', got '{}'",
            ext
        )));
    }

    Ok(())
}
