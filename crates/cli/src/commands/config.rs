//! Configuration commands

use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use std::path::Path;

use crate::config::{resolve_client_config, Config};
use crate::output::{print_json, print_success, OutputFormat};

/// Show the config file and the service URL the CLI would use
pub fn show(
    path: &Path,
    config: &Config,
    service_url: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let effective = resolve_client_config(service_url, config)?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "config_file": path.display().to_string(),
            "file": config,
            "effective_service_url": effective.service_url,
        }))?,
        OutputFormat::Table => {
            println!("{}", "Configuration".bold());
            println!("{}", "=".repeat(50));
            println!("Config file:  {}", path.display().to_string().cyan());
            println!(
                "Service URL:  {}",
                effective.service_url.cyan()
            );
            if let Some(format) = config.format {
                println!("Format:       {:?}", format);
            }
        }
    }

    Ok(())
}

/// Update the config file with the given settings
pub fn set(
    path: &Path,
    mut config: Config,
    service_url: Option<String>,
    format: Option<OutputFormat>,
) -> Result<()> {
    if let Some(url) = service_url {
        // Reject unusable URLs before they get persisted
        wq_lib::ClientConfig::new(url.clone()).base_url()?;
        config.service_url = Some(url);
    }
    if format.is_some() {
        config.format = format;
    }

    config.save(path)?;
    print_success(&format!("Configuration saved to {}", path.display()));

    Ok(())
}
