//! Global configuration parsing and validation.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::models::countdown::has_time_tokens;
use crate::signin::BackendTemplate;
use crate::{AppError, Result};

/// Idle-session settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SessionConfig {
    /// Seconds of inactivity before the vault auto-locks; 0 disables the
    /// countdown entirely.
    #[serde(default = "default_idle_timeout_seconds")]
    pub idle_timeout_seconds: u64,
    /// Display format for the countdown. Recognized tokens are `{dd}`,
    /// `{hh}`, `{mm}`, and `{ss}`; anything else passes through verbatim.
    #[serde(default = "default_countdown_format")]
    pub countdown_format: String,
}

/// Upper bound on the configurable idle timeout (100 years). Keeps the
/// countdown's derived end instant far away from monotonic-clock overflow.
const MAX_IDLE_TIMEOUT_SECONDS: u64 = 100 * 365 * 86_400;

fn default_idle_timeout_seconds() -> u64 {
    600
}

fn default_countdown_format() -> String {
    "{hh}:{mm}:{ss}".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_seconds: default_idle_timeout_seconds(),
            countdown_format: default_countdown_format(),
        }
    }
}

/// Sign-in staging settings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SigninConfig {
    /// How the backend sign-in stage is presented.
    #[serde(default)]
    pub backend_template: BackendTemplate,
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Account name vault sessions are opened for.
    pub account: String,
    /// Idle-session settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Sign-in staging settings.
    #[serde(default)]
    pub signin: SigninConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides and re-validate the result.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if an overridden value fails validation.
    pub fn apply_overrides(
        &mut self,
        idle_timeout_seconds: Option<u64>,
        countdown_format: Option<String>,
    ) -> Result<()> {
        if let Some(timeout) = idle_timeout_seconds {
            self.session.idle_timeout_seconds = timeout;
        }
        if let Some(format) = countdown_format {
            self.session.countdown_format = format;
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.account.trim().is_empty() {
            return Err(AppError::Config("account must not be empty".into()));
        }

        if self.session.idle_timeout_seconds > MAX_IDLE_TIMEOUT_SECONDS {
            return Err(AppError::Config(format!(
                "idle_timeout_seconds must be at most {MAX_IDLE_TIMEOUT_SECONDS}"
            )));
        }

        // Legal but almost certainly a misconfiguration: the countdown
        // will render as a static label and never count down.
        if !has_time_tokens(&self.session.countdown_format) {
            warn!(
                format = %self.session.countdown_format,
                "countdown_format has no time tokens; display will be static"
            );
        }

        Ok(())
    }
}
