//! Configuration validation.
//!
//! Serde handles the syntactic side; this covers what a well-formed file can
//! still get wrong. Validation is a pure function that reports every problem
//! at once and runs before any sink is opened.

use std::collections::HashSet;
use std::fmt;

use crate::config::schema::LogConfig;

/// A single semantic problem with a [`LogConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `sampling.initial` must let at least one record through.
    ZeroSamplingInitial,
    /// An entry of `outputPaths` is blank.
    EmptyOutputPath { index: usize },
    /// An entry of `errorOutputPaths` is blank.
    EmptyErrorOutputPath { index: usize },
    /// Two encoder keys share a name.
    DuplicateEncoderKey(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ZeroSamplingInitial => write!(f, "sampling.initial must be greater than zero"),
            ValidationError::EmptyOutputPath { index } => write!(f, "outputPaths[{}] is empty", index),
            ValidationError::EmptyErrorOutputPath { index } => {
                write!(f, "errorOutputPaths[{}] is empty", index)
            }
            ValidationError::DuplicateEncoderKey(key) => write!(f, "encoder key {:?} is used twice", key),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check a configuration for problems that would make a logger unusable.
pub fn validate_config(config: &LogConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if matches!(config.sampling, Some(sampling) if sampling.initial == 0) {
        errors.push(ValidationError::ZeroSamplingInitial);
    }

    for (index, path) in config.output_paths.iter().enumerate() {
        if path.trim().is_empty() {
            errors.push(ValidationError::EmptyOutputPath { index });
        }
    }
    for (index, path) in config.error_output_paths.iter().enumerate() {
        if path.trim().is_empty() {
            errors.push(ValidationError::EmptyErrorOutputPath { index });
        }
    }

    let mut seen = HashSet::new();
    for key in config.encoder_config.keys() {
        if !seen.insert(key) {
            errors.push(ValidationError::DuplicateEncoderKey(key.to_string()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::SamplingConfig;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&LogConfig::production()).is_ok());
        assert!(validate_config(&LogConfig::development()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = LogConfig::production();
        config.sampling = Some(SamplingConfig { initial: 0, thereafter: 10 });
        config.output_paths = vec!["stdout".into(), " ".into()];
        config.error_output_paths = vec![String::new()];
        config.encoder_config.message_key = "level".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroSamplingInitial,
                ValidationError::EmptyOutputPath { index: 1 },
                ValidationError::EmptyErrorOutputPath { index: 0 },
                ValidationError::DuplicateEncoderKey("level".into()),
            ]
        );
    }

    #[test]
    fn test_empty_keys_do_not_collide() {
        let mut config = LogConfig::production();
        config.encoder_config.name_key = String::new();
        config.encoder_config.caller_key = String::new();
        assert!(validate_config(&config).is_ok());
    }
}
