// wglcore/src/config.rs
//
//! Where the layer reads its user configuration from.

use log::warn;
use std::borrow::Cow;
use std::env::{self, VarError};

/// The environment variable `EnvConfig` reads by default.
pub const DISABLED_EXTENSIONS_VAR: &str = "WGLCORE_DISABLED_EXTENSIONS";

/// A source of user configuration.
///
/// Each `Wgl` asks its source once, the first time the value is needed.
pub trait ConfigSource: Send + Sync {
    /// Returns the space-separated list of extensions to hide from applications, if configured.
    fn disabled_extensions(&self) -> Option<String>;
}

/// Reads the configuration from the process environment.
#[derive(Clone, Debug)]
pub struct EnvConfig {
    variable: Cow<'static, str>,
}

impl EnvConfig {
    /// Reads `WGLCORE_DISABLED_EXTENSIONS`.
    #[inline]
    pub fn new() -> EnvConfig {
        EnvConfig { variable: Cow::Borrowed(DISABLED_EXTENSIONS_VAR) }
    }

    /// Reads the given variable instead.
    pub fn with_variable<S>(variable: S) -> EnvConfig
    where
        S: Into<Cow<'static, str>>,
    {
        EnvConfig { variable: variable.into() }
    }
}

impl Default for EnvConfig {
    fn default() -> EnvConfig {
        EnvConfig::new()
    }
}

impl ConfigSource for EnvConfig {
    fn disabled_extensions(&self) -> Option<String> {
        match env::var(&*self.variable) {
            Ok(value) => Some(value),
            Err(VarError::NotPresent) => None,
            Err(VarError::NotUnicode(_)) => {
                warn!("ignoring {}: not valid Unicode", self.variable);
                None
            }
        }
    }
}

/// A fixed configuration.
#[derive(Clone, Debug, Default)]
pub struct StaticConfig(pub Option<String>);

impl StaticConfig {
    /// Disables the given extensions.
    pub fn disabling(extensions: &str) -> StaticConfig {
        StaticConfig(Some(extensions.to_owned()))
    }
}

impl ConfigSource for StaticConfig {
    fn disabled_extensions(&self) -> Option<String> {
        self.0.clone()
    }
}
