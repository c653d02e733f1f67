//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for the validation middleware.
//!
//! ## Environment Variables
//!
//! ### `OAG_VALIDATOR_CACHE`
//!
//! Caches one compiled request validator per operation. Set to `off`, `false`
//! or `0` to rebuild the validator on every request.
//!
//! Default: on
//!
//! ### `OAG_PRECOMPILE`
//!
//! Builds every operation's validator when the middleware is constructed, so an
//! invalid schema fails construction instead of the first matching request.
//! Has no effect when the cache is off.
//!
//! Default: on
//!
//! ### `OAG_VALIDATE_FORMATS`
//!
//! Asserts `format` keywords (`date`, `date-time`, `email`, ...). When off,
//! formats are annotations only.
//!
//! Default: on
//!
//! ## Usage
//!
//! ```rust
//! use openapi_guard::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("validator cache: {}", config.validator_cache);
//! ```
//!
//! ```bash
//! # Debug a slow start-up by skipping precompilation
//! export OAG_PRECOMPILE=off
//! ```

use std::env;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Cache compiled validators per operation (default: true)
    pub validator_cache: bool,
    /// Build all validators up front (default: true)
    pub precompile: bool,
    /// Assert `format` keywords (default: true)
    pub validate_formats: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            validator_cache: true,
            precompile: true,
            validate_formats: true,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |name: &str| lookup(name).map_or(true, |val| !is_off(&val));
        RuntimeConfig {
            validator_cache: flag("OAG_VALIDATOR_CACHE"),
            precompile: flag("OAG_PRECOMPILE"),
            validate_formats: flag("OAG_VALIDATE_FORMATS"),
        }
    }
}

fn is_off(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "off" | "false" | "0" | "no"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> RuntimeConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RuntimeConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_are_on() {
        assert_eq!(config(&[]), RuntimeConfig::default());
    }

    #[test]
    fn test_off_values() {
        for off in ["off", "OFF", "false", "0", " no "] {
            let cfg = config(&[("OAG_VALIDATOR_CACHE", off)]);
            assert!(!cfg.validator_cache, "{off:?} should disable the cache");
            assert!(cfg.precompile);
        }
    }

    #[test]
    fn test_unrecognised_value_keeps_default() {
        let cfg = config(&[("OAG_VALIDATE_FORMATS", "maybe"), ("OAG_PRECOMPILE", "off")]);
        assert!(cfg.validate_formats);
        assert!(!cfg.precompile);
    }
}
