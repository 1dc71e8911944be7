//! Synthesis options

use serde::Deserialize;

use crate::error::{SynthError, SynthResult};

/// Names the synthesizer keeps for itself (compared case-insensitively)
pub const RESERVED_METHOD_NAMES: &[&str] = &["__construct", "__call", "__callStatic"];

/// Prefix reserved for engine-internal members
pub const RESERVED_PREFIX: &str = "__mimic";

/// Options applied when synthesizing a class
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SynthOptions {
    /// Prefix of generated class names
    pub class_name_prefix: String,

    /// Method names rejected in addition to the built-in reserved names
    pub extra_reserved_names: Vec<String>,

    /// Reject calls with fewer arguments than required parameters
    pub check_arity: bool,

    /// Reject arguments that do not satisfy declared constraints
    pub check_argument_types: bool,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            class_name_prefix: "Mimic_".to_string(),
            extra_reserved_names: Vec::new(),
            check_arity: true,
            check_argument_types: true,
        }
    }
}

impl SynthOptions {
    /// Load options from a TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> SynthResult<Self> {
        let options: SynthOptions =
            toml::from_str(source).map_err(|e| SynthError::InvalidOptions(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Options with call-time argument checks disabled
    pub fn unchecked() -> Self {
        Self {
            check_arity: false,
            check_argument_types: false,
            ..Default::default()
        }
    }

    /// Replace the generated class name prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_name_prefix = prefix.into();
        self
    }

    /// Reserve an additional method name
    pub fn reserve(mut self, name: impl Into<String>) -> Self {
        self.extra_reserved_names.push(name.into());
        self
    }

    /// Check that generated names will be valid identifiers
    pub fn validate(&self) -> SynthResult<()> {
        let prefix = &self.class_name_prefix;
        let starts_ok = prefix
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !starts_ok || !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(SynthError::InvalidOptions(format!(
                "class_name_prefix '{}' is not an identifier prefix",
                prefix
            )));
        }
        Ok(())
    }

    /// Whether `name` may not be used for a synthesized method
    pub fn is_reserved(&self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        RESERVED_METHOD_NAMES
            .iter()
            .any(|r| r.eq_ignore_ascii_case(name))
            || lower.starts_with(RESERVED_PREFIX)
            || self
                .extra_reserved_names
                .iter()
                .any(|r| r.eq_ignore_ascii_case(name))
    }
}
