use anyhow::{Context, Result};

use crate::cli::services::Services;

/// Print the merged settings as YAML.
pub fn run_config_command(services: &Services) -> Result<()> {
    let rendered =
        serde_yaml::to_string(&services.config).context("Failed to render settings")?;
    print!("{rendered}");
    Ok(())
}
