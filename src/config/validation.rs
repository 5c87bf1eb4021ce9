use thiserror::Error;

use super::models::Config;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("downloads.workers must be at least 1")]
    ZeroWorkers,

    #[error("downloads.default_quality must not be empty")]
    EmptyQuality,

    #[error("engine.binary must not be empty")]
    EmptyEngineBinary,
}

pub fn validate(config: &Config) -> Result<(), ValidationError> {
    if config.downloads.workers == 0 {
        return Err(ValidationError::ZeroWorkers);
    }
    if config.downloads.default_quality.is_empty() {
        return Err(ValidationError::EmptyQuality);
    }
    if config.engine.binary.as_os_str().is_empty() {
        return Err(ValidationError::EmptyEngineBinary);
    }
    Ok(())
}
