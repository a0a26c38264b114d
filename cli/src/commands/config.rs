// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use grantflow_core::domain::portal_config::PortalConfigManifest;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./grantflow-config.yaml)
        #[arg(short, long, default_value = "./grantflow-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = PortalConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. GRANTFLOW_CONFIG_PATH: {}",
            std::env::var("GRANTFLOW_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./grantflow-config.yaml");
        println!("  4. ~/.grantflow/config.yaml");
        println!("  5. /etc/grantflow/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Portal:".bold());
    println!("  Name: {}", config.metadata.name);
    if let Some(version) = &config.metadata.version {
        println!("  Version: {}", version);
    }
    println!();

    println!("{}", "Record Store:".bold());
    match &config.spec.database {
        Some(database) => {
            println!("  Backend: PostgreSQL");
            println!("  URL: {}", redact_credentials(&database.url));
            println!("  Max connections: {}", database.max_connections);
        }
        None => println!("  Backend: in-memory {}", "(records are lost on shutdown)".yellow()),
    }
    println!();

    println!("{}", "Access:".bold());
    if config.spec.access.admin_overrides.is_empty() {
        println!("  Admin overrides: {}", "(none)".dimmed());
    } else {
        println!("  Admin overrides:");
        for email in &config.spec.access.admin_overrides {
            println!("    - {}", email);
        }
    }
    println!();

    println!("{}", "Notifications:".bold());
    println!(
        "  Staff inbox: {}",
        config.spec.notifications.staff_email.as_deref().unwrap_or("(none)")
    );
    println!(
        "  Delivery webhook: {}",
        config
            .spec
            .notifications
            .webhook_url
            .as_deref()
            .unwrap_or("(none, intents are logged)")
    );
    println!();

    println!("{}", "API:".bold());
    println!("  Listen: {}:{}", config.spec.api.bind_address, config.spec.api.port);
    println!("  Log level: {}", config.log_level());
    if let Some(port) = config.spec.observability.as_ref().and_then(|o| o.metrics_port) {
        println!("  Metrics port: {}", port);
    }
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config =
        PortalConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!("{}", format!("✓ Configuration generated: {}", output.display()).green());

    Ok(())
}

/// Hide the password segment of a connection URL.
fn redact_credentials(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.split_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or_default();
            format!("{}://{}:****@{}", scheme, user, host)
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_are_valid_manifests() {
        for template in [
            include_str!("../../templates/config-minimal.yaml"),
            include_str!("../../templates/config-with-examples.yaml"),
        ] {
            let config = PortalConfigManifest::from_yaml_str(template).unwrap();
            config.validate().unwrap();
        }
    }

    #[test]
    fn test_redact_credentials() {
        assert_eq!(
            redact_credentials("postgres://grantflow:secret@db:5432/grantflow"),
            "postgres://grantflow:****@db:5432/grantflow"
        );
        assert_eq!(redact_credentials("postgres://db/grantflow"), "postgres://db/grantflow");
    }

    #[tokio::test]
    async fn test_generate_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("grantflow-config.yaml");
        generate(output.clone(), false).await.unwrap();
        let written = PortalConfigManifest::from_yaml_file(&output).unwrap();
        assert_eq!(written.kind, "PortalConfig");
    }
}
