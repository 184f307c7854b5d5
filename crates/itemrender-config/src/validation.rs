//! Record and aggregate validation
//!
//! Errors block a save or a load; warnings never do. Malformed numeric
//! settings on the aggregate are repaired in place and reported as
//! warnings so a single bad value cannot keep the whole file from loading.

use std::collections::HashSet;

use tracing::warn;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{
    AggregateConfig, ConfigRecord, RenderSettings, RenderTarget, View,
    DEFAULT_AUTO_SAVE_INTERVAL, DEFAULT_CACHE_SIZE, DEFAULT_MAX_CONCURRENCY,
};

/// Outcome of a validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when there are no blocking errors
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Fold another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Convert blocking errors into a [`ConfigError::ValidationFailure`]
    pub fn into_result(self, id: &str) -> ConfigResult<Vec<String>> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(ConfigError::validation(id, self.errors))
        }
    }
}

/// Stateless validator for records and the aggregate
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a single record
    pub fn validate_record(&self, record: &ConfigRecord) -> ValidationResult {
        let mut result = ValidationResult::new();

        if record.id.trim().is_empty() {
            result.error("id must not be empty");
        }

        self.validate_target(&record.target, &mut result);
        self.validate_settings(View::FirstPerson, record.first_person.as_ref(), &mut result);
        self.validate_settings(View::ThirdPerson, record.third_person.as_ref(), &mut result);

        result
    }

    /// Validate the aggregate, repairing recoverable problems in place
    pub fn validate_aggregate(&self, config: &mut AggregateConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        let settings = &mut config.settings;
        if settings.auto_save_interval < 0 {
            result.warning(format!(
                "settings.autoSaveInterval {} is negative, reset to {}",
                settings.auto_save_interval, DEFAULT_AUTO_SAVE_INTERVAL
            ));
            settings.auto_save_interval = DEFAULT_AUTO_SAVE_INTERVAL;
        }
        if settings.cache_size <= 0 {
            result.warning(format!(
                "settings.cacheSize {} must be positive, reset to {}",
                settings.cache_size, DEFAULT_CACHE_SIZE
            ));
            settings.cache_size = DEFAULT_CACHE_SIZE;
        }
        if settings.max_concurrency <= 0 {
            result.warning(format!(
                "settings.maxConcurrency {} must be positive, reset to {}",
                settings.max_concurrency, DEFAULT_MAX_CONCURRENCY
            ));
            settings.max_concurrency = DEFAULT_MAX_CONCURRENCY;
        }

        let before = config.enabled_items.len();
        config.enabled_items.retain(|id| !id.trim().is_empty());
        if config.enabled_items.len() != before {
            result.warning(format!(
                "removed {} empty id(s) from enabledItems",
                before - config.enabled_items.len()
            ));
        }

        let mut seen = HashSet::new();
        let before = config.enabled_items.len();
        config.enabled_items.retain(|id| seen.insert(id.clone()));
        if config.enabled_items.len() != before {
            result.warning(format!(
                "removed {} duplicate id(s) from enabledItems",
                before - config.enabled_items.len()
            ));
        }

        for message in &result.warnings {
            warn!(warning = %message, "Aggregate configuration auto-corrected");
        }

        result
    }

    fn validate_target(&self, target: &RenderTarget, result: &mut ValidationResult) {
        match target {
            RenderTarget::AsBlock(block_id) if block_id.trim().is_empty() => {
                result.error("renderAsBlock is set but blockId is empty");
            }
            RenderTarget::AsEntity(entity_type) if entity_type.trim().is_empty() => {
                result.error("renderAsEntity is set but entityType is empty");
            }
            RenderTarget::Neither => {
                result.warning("neither renderAsBlock nor renderAsEntity is set");
            }
            _ => {}
        }
    }

    fn validate_settings(
        &self,
        view: View,
        settings: Option<&RenderSettings>,
        result: &mut ValidationResult,
    ) {
        match settings {
            None => result.error(format!("{} settings are missing", view.key())),
            Some(settings) if !settings.is_finite() => {
                result.error(format!("{} settings contain a non-finite value", view.key()));
            }
            Some(_) => {}
        }
    }
}
