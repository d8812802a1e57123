//! Engine configuration
//!
//! Passed by value to [`Engine::new`](crate::engine::Engine::new) and carried by
//! every [`Diff`](crate::diff::Diff) the engine produces. There are no ambient
//! defaults beyond `Default`.

use crate::errors::{DiffError, Result};
use serde::{Deserialize, Serialize};

/// Engine options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EngineConfig {
    /// Inject the document store's bookkeeping allow-rules into at-most checks
    /// and treat the revision-id list as a single leaf when diffing.
    pub managed_store: bool,
    /// Make `Diff::evaluate` return the policy violation instead of `false`.
    pub strict_assertions: bool,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_managed_store(mut self, on: bool) -> Self {
        self.managed_store = on;
        self
    }

    pub fn with_strict_assertions(mut self, on: bool) -> Self {
        self.strict_assertions = on;
        self
    }

    /// Parse a TOML configuration document.
    ///
    /// ```toml
    /// managed_store = true
    /// strict_assertions = false
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for malformed TOML, wrong value types or
    /// unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| {
            DiffError::Config {
                message: e.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;

    #[test]
    fn test_defaults_are_off() {
        let config = EngineConfig::default();
        assert!(!config.managed_store);
        assert!(!config.strict_assertions);
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), config);
    }

    #[test]
    fn test_parse_toml() {
        let config = EngineConfig::from_toml_str("managed_store = true\n").unwrap();
        assert_eq!(config, EngineConfig::new().with_managed_store(true));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = EngineConfig::from_toml_str("managedStore = true").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidConfig);
    }

    #[test]
    fn test_wrong_type_rejected() {
        let err = EngineConfig::from_toml_str("strict_assertions = \"yes\"").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidConfig);
    }
}
