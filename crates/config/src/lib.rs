//! Configuration loading, env substitution, env-var overrides and validation.
//!
//! Config files: `pagekeep.toml`, `pagekeep.yaml` or `pagekeep.json`,
//! searched in `./` then `~/.config/pagekeep/`. Every key can also be set
//! through the environment (see [`loader::ENV_KEYS`]), which is how most
//! deployments configure the bot.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{ConfigError, Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{
        BackupConfig, BrowserConfig, CorrelationConfig, MetricsConfig, PagekeepConfig,
        RepositoryConfig, SummarizerConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate, validate_for_service},
};
