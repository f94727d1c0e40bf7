// src/config/validate.rs

use crate::config::model::{ConfigFile, KernelSection, RawConfigFile, ReplSection};
use crate::errors::{KernelError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::KernelError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.repl, raw.kernel))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_repl(&cfg.repl)?;
    validate_kernel(&cfg.kernel)?;
    Ok(())
}

fn validate_repl(repl: &ReplSection) -> Result<()> {
    if repl.binary.trim().is_empty() {
        return Err(config_error("[repl].binary must not be empty"));
    }

    if repl.prompt.is_empty() {
        return Err(config_error("[repl].prompt must not be empty"));
    }

    for (field, marker) in [
        ("prompt", &repl.prompt),
        ("continuation_prompt", &repl.continuation_prompt),
    ] {
        if marker.contains('\n') {
            return Err(KernelError::ConfigError(format!(
                "[repl].{field} must not contain a newline (got {marker:?})"
            )));
        }
    }

    if repl.continuation_prompt == repl.prompt {
        return Err(config_error(
            "[repl].continuation_prompt must differ from [repl].prompt",
        ));
    }

    if repl.startup_timeout_secs == 0 {
        return Err(config_error(
            "[repl].startup_timeout_secs must be >= 1 (got 0)",
        ));
    }

    if repl.command_timeout_secs == 0 {
        return Err(config_error(
            "[repl].command_timeout_secs must be >= 1 (got 0)",
        ));
    }

    Ok(())
}

fn validate_kernel(kernel: &KernelSection) -> Result<()> {
    for (field, marker) in [
        ("block_begin", &kernel.block_begin),
        ("block_end", &kernel.block_end),
    ] {
        if marker.trim().is_empty() {
            return Err(KernelError::ConfigError(format!(
                "[kernel].{field} must not be empty"
            )));
        }
        if marker.contains('\n') {
            return Err(KernelError::ConfigError(format!(
                "[kernel].{field} must be a single line (got {marker:?})"
            )));
        }
    }
    Ok(())
}

fn config_error(msg: &str) -> KernelError {
    KernelError::ConfigError(msg.to_string())
}
