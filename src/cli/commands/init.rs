//! Init command implementation.

use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the init command: write the default config and create data dirs.
pub fn run_init(settings: &Settings) -> Result<()> {
    let config_path = Settings::default_config_path();

    if config_path.exists() {
        Output::info(&format!("Config already exists at {}", config_path.display()));
    } else {
        settings.save()?;
        Output::success(&format!("Wrote default config to {}", config_path.display()));
    }

    std::fs::create_dir_all(settings.data_dir())?;
    Output::success(&format!("Data directory: {}", settings.data_dir().display()));

    Output::header("Next steps");
    Output::kv("Ingest", "cinerag ingest <movies.csv>");
    Output::kv("Ask", "cinerag ask \"Inception, who are actors in it?\"");
    Output::kv("Serve", "cinerag serve");

    Ok(())
}
