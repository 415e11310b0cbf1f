//! Semantic configuration checks.
//!
//! Serde covers syntax; this covers values that parse but make no sense.

use std::fmt;

use crate::config::schema::AppConfig;

/// A single invalid configuration value.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidSetting {
    /// Dotted path of the offending key.
    pub field: &'static str,
    pub reason: String,
}

impl fmt::Display for InvalidSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

fn check_rate(field: &'static str, rate: f32, issues: &mut Vec<InvalidSetting>) {
    if !(0.0..=1.0).contains(&rate) {
        issues.push(InvalidSetting {
            field,
            reason: format!("must be within [0, 1], got {}", rate),
        });
    }
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<InvalidSetting>> {
    let mut issues = Vec::new();

    if config.listener.port == 0 {
        issues.push(InvalidSetting {
            field: "listener.port",
            reason: "must not be 0".to_string(),
        });
    }

    if config.timeouts.request_secs == 0 {
        issues.push(InvalidSetting {
            field: "timeouts.request_secs",
            reason: "must be at least 1".to_string(),
        });
    }

    check_rate("stages.validation_failure_rate", config.stages.validation_failure_rate, &mut issues);
    check_rate("stages.processing_failure_rate", config.stages.processing_failure_rate, &mut issues);
    check_rate("demo.database_failure_rate", config.demo.database_failure_rate, &mut issues);

    if config.observability.service_name.trim().is_empty() {
        issues.push(InvalidSetting {
            field: "observability.service_name",
            reason: "must not be empty".to_string(),
        });
    }

    if config.store.max_connections == 0 {
        issues.push(InvalidSetting {
            field: "store.max_connections",
            reason: "must be at least 1".to_string(),
        });
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
