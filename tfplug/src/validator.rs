//! Attribute validators run by `ResourceSchema::validate_config`

use crate::types::{Diagnostics, Dynamic};

pub trait Validator: Send + Sync {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics);
}

/// Bounds on the length of a string, in bytes
pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl StringLengthValidator {
    pub fn at_most(max: usize) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }
}

impl Validator for StringLengthValidator {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics) {
        let Some(s) = value.as_string() else {
            return;
        };
        if let Some(min) = self.min {
            if s.len() < min {
                diagnostics.add_error(
                    format!("{} must have minimum length of {}", attribute_path, min),
                    Some(format!("Got length {}", s.len())),
                );
            }
        }
        if let Some(max) = self.max {
            if s.len() > max {
                diagnostics.add_error(
                    format!("{} must have maximum length of {}", attribute_path, max),
                    Some(format!("Got length {}", s.len())),
                );
            }
        }
    }
}

pub struct StringPatternValidator {
    pub pattern: regex::Regex,
    pub description: String,
}

impl StringPatternValidator {
    pub fn new(pattern: &str, description: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: regex::Regex::new(pattern)?,
            description: description.into(),
        })
    }
}

impl Validator for StringPatternValidator {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_string() {
            if !self.pattern.is_match(s) {
                diagnostics.add_error(
                    format!("{} must match {}", attribute_path, self.description),
                    Some(format!("Value '{}' does not match pattern", s)),
                );
            }
        }
    }
}

/// Accepts only one of a fixed set of strings
pub struct StringInSliceValidator {
    pub allowed: Vec<String>,
}

impl StringInSliceValidator {
    pub fn new(allowed: &[&str]) -> Self {
        Self {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Validator for StringInSliceValidator {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics) {
        if let Some(s) = value.as_string() {
            if !self.allowed.iter().any(|a| a == s) {
                diagnostics.add_error(
                    format!(
                        "{} must be one of [{}]",
                        attribute_path,
                        self.allowed.join(", ")
                    ),
                    Some(format!("Got '{}'", s)),
                );
            }
        }
    }
}

/// Inclusive bounds on a number
pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberRangeValidator {
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }
}

impl Validator for NumberRangeValidator {
    fn validate(&self, value: &Dynamic, attribute_path: &str, diagnostics: &mut Diagnostics) {
        let Some(n) = value.as_number() else {
            return;
        };
        if let Some(min) = self.min {
            if n < min {
                diagnostics.add_error(
                    format!("{} must be at least {}", attribute_path, min),
                    Some(format!("Got {}", n)),
                );
            }
        }
        if let Some(max) = self.max {
            if n > max {
                diagnostics.add_error(
                    format!("{} must be at most {}", attribute_path, max),
                    Some(format!("Got {}", n)),
                );
            }
        }
    }
}
