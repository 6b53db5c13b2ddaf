//! # Configuration Management
//!
//! Process-wide settings consulted by every codec call.
//!
//! The live configuration is read at the moment each codec runs; there is no per-call
//! snapshot. A mutation through [`install`], [`update`] or [`reset`] is visible to the
//! very next read on any thread and is never rolled back.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()` / `from_toml()`
//! - Environment variables via `from_env()`
//! - Direct instantiation with defaults
//!
//! ## Safety Limits
//! - `max_container_size` / `max_string_size` are checked against decoded length
//!   prefixes before any allocation sized by them
//! - `max_recursion_depth` bounds the nesting of dispatched values

use crate::error::{constants, CodecError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::RwLock;
use tracing::debug;

/// Default maximum nesting depth of dispatched values
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 64;

/// Default maximum element count for sequences and maps (1 Mi entries)
pub const DEFAULT_MAX_CONTAINER_SIZE: usize = 1 << 20;

/// Default maximum byte length for strings and byte buffers (1 MiB)
pub const DEFAULT_MAX_STRING_SIZE: usize = 1 << 20;

/// Byte order used by fixed-width numeric codecs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}

/// How codecs react to recoverable violations.
///
/// Decode-side safety failures (truncated input, overlong varints, size limits, bad
/// discriminants, recursion limit, invalid UTF-8) and configuration errors raise under
/// every policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Raise immediately on any violation
    #[default]
    Strict,
    /// Truncate over-long values written under `FixedWidth(N)` (and zero-pad short
    /// byte buffers) instead of raising
    Medium,
    /// Everything `Medium` repairs, plus narrowing varint casts and trailing bytes
    /// under `strict_eof` only warn
    Ignore,
}

impl ErrorPolicy {
    /// Whether fixed-size shape mismatches on encode are repaired.
    pub fn repairs_shape(self) -> bool {
        matches!(self, ErrorPolicy::Medium | ErrorPolicy::Ignore)
    }

    /// Whether lossy decode conversions and trailing input are tolerated.
    pub fn tolerates_lossy_decode(self) -> bool {
        matches!(self, ErrorPolicy::Ignore)
    }
}

/// Global codec configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Byte order for fixed-width integers and floats
    pub byte_order: ByteOrder,

    /// Maximum nesting depth of dispatched values
    pub max_recursion_depth: usize,

    /// Maximum element count of a decoded sequence or map
    pub max_container_size: usize,

    /// Maximum byte length of a decoded string or byte buffer
    pub max_string_size: usize,

    /// Whether unread input after a complete value is an error
    pub strict_eof: bool,

    /// Reaction to recoverable violations
    pub error_policy: ErrorPolicy,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalConfig {
    /// Defaults: big endian, depth 64, 1 Mi elements, 1 MiB strings, lenient EOF, strict policy.
    pub const fn new() -> Self {
        Self {
            byte_order: ByteOrder::Big,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            max_container_size: DEFAULT_MAX_CONTAINER_SIZE,
            max_string_size: DEFAULT_MAX_STRING_SIZE,
            strict_eof: false,
            error_policy: ErrorPolicy::Strict,
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| CodecError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| CodecError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| CodecError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(order) = std::env::var("BYTESCHEMA_BYTE_ORDER") {
            config.byte_order = match order.to_ascii_lowercase().as_str() {
                "big" => ByteOrder::Big,
                "little" => ByteOrder::Little,
                other => {
                    return Err(CodecError::ConfigError(format!(
                        "Invalid BYTESCHEMA_BYTE_ORDER: '{other}' (expected 'big' or 'little')"
                    )))
                }
            };
        }

        if let Ok(depth) = std::env::var("BYTESCHEMA_MAX_RECURSION_DEPTH") {
            if let Ok(val) = depth.parse::<usize>() {
                config.max_recursion_depth = val;
            }
        }

        if let Ok(size) = std::env::var("BYTESCHEMA_MAX_CONTAINER_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                config.max_container_size = val;
            }
        }

        if let Ok(size) = std::env::var("BYTESCHEMA_MAX_STRING_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                config.max_string_size = val;
            }
        }

        if let Ok(strict) = std::env::var("BYTESCHEMA_STRICT_EOF") {
            if let Ok(val) = strict.parse::<bool>() {
                config.strict_eof = val;
            }
        }

        if let Ok(policy) = std::env::var("BYTESCHEMA_ERROR_POLICY") {
            config.error_policy = match policy.to_ascii_lowercase().as_str() {
                "strict" => ErrorPolicy::Strict,
                "medium" => ErrorPolicy::Medium,
                "ignore" => ErrorPolicy::Ignore,
                other => {
                    return Err(CodecError::ConfigError(format!(
                        "Invalid BYTESCHEMA_ERROR_POLICY: '{other}'"
                    )))
                }
            };
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CodecError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| CodecError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate configuration, returning a list of human-readable problems
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_recursion_depth == 0 {
            errors.push("Max recursion depth must be greater than 0".to_string());
        } else if self.max_recursion_depth > 10_000 {
            errors.push(format!(
                "Max recursion depth too large: {} (maximum: 10,000)",
                self.max_recursion_depth
            ));
        }

        if self.max_container_size > u32::MAX as usize {
            errors.push(format!(
                "Max container size too large: {} (maximum: {})",
                self.max_container_size,
                u32::MAX
            ));
        }

        if self.max_string_size > u32::MAX as usize {
            errors.push(format!(
                "Max string size too large: {} bytes (maximum: {})",
                self.max_string_size,
                u32::MAX
            ));
        }

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CodecError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

static GLOBAL: Lazy<RwLock<GlobalConfig>> = Lazy::new(|| RwLock::new(GlobalConfig::new()));

/// Read the live configuration.
pub fn current() -> Result<GlobalConfig> {
    GLOBAL
        .read()
        .map(|guard| *guard)
        .map_err(|_| CodecError::ConfigError(constants::ERR_LOCK_POISONED.to_string()))
}

/// Replace the live configuration after validating it.
pub fn install(config: GlobalConfig) -> Result<()> {
    config.validate_strict()?;
    let mut guard = GLOBAL
        .write()
        .map_err(|_| CodecError::ConfigError(constants::ERR_LOCK_POISONED.to_string()))?;
    *guard = config;
    debug!(?config, "Installed global codec configuration");
    Ok(())
}

/// Mutate the live configuration in place.
///
/// The write lock is held across the mutator, so concurrent updates never lose
/// each other's changes. A result that fails validation leaves the live value as it
/// was.
pub fn update<F>(mutator: F) -> Result<()>
where
    F: FnOnce(&mut GlobalConfig),
{
    let mut guard = GLOBAL
        .write()
        .map_err(|_| CodecError::ConfigError(constants::ERR_LOCK_POISONED.to_string()))?;
    let mut next = *guard;
    mutator(&mut next);
    next.validate_strict()?;
    *guard = next;
    debug!(config = ?next, "Updated global codec configuration");
    Ok(())
}

/// Restore the defaults.
pub fn reset() -> Result<()> {
    install(GlobalConfig::default())
}

/// Serializes tests that touch the process-wide configuration and resets it.
#[cfg(test)]
pub(crate) fn test_guard() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    let guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    *GLOBAL.write().unwrap_or_else(|e| e.into_inner()) = GlobalConfig::default();
    guard
}
