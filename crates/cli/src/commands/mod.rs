//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;

use anyhow::{Context, Result};
use contracts::{JobBlueprint, Profile};

use crate::cli::JobSource;

/// Resolve the blueprint from a config file or from `--profile`/`--input`
///
/// A config file wins; `--input` still overrides its `job.input`.
pub(crate) fn load_blueprint(source: &JobSource) -> Result<JobBlueprint> {
    let mut blueprint = match &source.config {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            let profile: Profile = source
                .profile
                .context("either --config or --profile is required")?
                .into();
            let input = source
                .input
                .clone()
                .context("--input is required when no config file is given")?;
            JobBlueprint::for_profile(profile, input)
        }
    };

    if let Some(input) = &source.input {
        blueprint.job.input = input.clone();
    }
    Ok(blueprint)
}
