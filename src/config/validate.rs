// src/config/validate.rs

use crate::config::model::{Manifest, RawManifest};
use crate::errors::{LocalFnError, Result};
use crate::runtime::RuntimeFamily;

impl TryFrom<RawManifest> for Manifest {
    type Error = LocalFnError;

    fn try_from(raw: RawManifest) -> std::result::Result<Self, Self::Error> {
        validate_raw_manifest(&raw)?;
        Ok(Manifest::new_unchecked(raw.config, raw.function))
    }
}

fn validate_raw_manifest(raw: &RawManifest) -> Result<()> {
    validate_global_config(raw)?;
    validate_functions(raw)?;
    Ok(())
}

fn validate_global_config(raw: &RawManifest) -> Result<()> {
    if raw.config.poll_interval_ms == 0 {
        return Err(LocalFnError::ConfigError(
            "[config].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_functions(raw: &RawManifest) -> Result<()> {
    for (id, func) in raw.function.iter() {
        for (field, value) in [
            ("runtime", &func.runtime),
            ("src", &func.src),
            ("handler", &func.handler),
        ] {
            if value.trim().is_empty() {
                return Err(LocalFnError::ConfigError(format!(
                    "function '{}' has an empty `{}`",
                    id, field
                )));
            }
        }

        // Surfaces as UnknownRuntime rather than a generic config error.
        RuntimeFamily::from_identifier(&func.runtime)?;
    }
    Ok(())
}
