//! Purpose: Decoder configuration: which module/function to resolve and how long to wait.
//! Exports: `DecoderConfig`, env var names.
//! Role: Layered config for the library, C ABI, and CLI (defaults < file < env < flags).
//! Invariants: Defaults resolve `ais.decode` and block indefinitely on the runtime lock.
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind};

pub const ENV_MODULE: &str = "AISCDEC_MODULE";
pub const ENV_FUNCTION: &str = "AISCDEC_FUNCTION";
pub const ENV_LOCK_TIMEOUT_MS: &str = "AISCDEC_LOCK_TIMEOUT_MS";

const DEFAULT_MODULE: &str = "ais";
const DEFAULT_FUNCTION: &str = "decode";

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoderConfig {
    pub module: String,
    pub function: String,
    pub lock_timeout_ms: Option<u64>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            module: DEFAULT_MODULE.to_string(),
            function: DEFAULT_FUNCTION.to_string(),
            lock_timeout_ms: None,
        }
    }
}

impl DecoderConfig {
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("invalid decoder config")
                .with_source(err)
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to read config {}", path.display()))
                .with_source(err)
        })?;
        Self::from_json_str(&text)
    }

    /// Applies `AISCDEC_*` overrides from the process environment.
    pub fn with_env(self) -> Result<Self, Error> {
        self.with_env_lookup(|name| std::env::var(name).ok())
    }

    pub fn with_env_lookup<F>(mut self, lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(module) = lookup(ENV_MODULE).filter(|value| !value.is_empty()) {
            self.module = module;
        }
        if let Some(function) = lookup(ENV_FUNCTION).filter(|value| !value.is_empty()) {
            self.function = function;
        }
        if let Some(raw) = lookup(ENV_LOCK_TIMEOUT_MS) {
            let ms = raw.trim().parse::<u64>().map_err(|err| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("{ENV_LOCK_TIMEOUT_MS} must be an integer"))
                    .with_source(err)
            })?;
            self.lock_timeout_ms = Some(ms);
        }
        Ok(self)
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.module.trim().is_empty() {
            return Err(Error::new(ErrorKind::Initialization).with_message("module name is empty"));
        }
        if self.function.trim().is_empty() {
            return Err(
                Error::new(ErrorKind::Initialization).with_message("function name is empty")
            );
        }
        Ok(())
    }
}
