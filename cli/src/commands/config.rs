// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use gang_admission_core::domain::config::{GangAdmissionConfig, StoreKind, CONFIG_PATH_ENV};

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
        /// Output path
        #[arg(short, long, default_value = "./gang-admission.yaml")]
        output: PathBuf,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output } => generate(output).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = GangAdmissionConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  --config flag: {}", path.display()),
            None => println!("  --config flag: {}", "(not set)".dimmed()),
        }
        if std::env::var(CONFIG_PATH_ENV).is_err() {
            println!("  {}: {}", CONFIG_PATH_ENV, "(not set)".dimmed());
        }
        for (i, path) in GangAdmissionConfig::search_paths().iter().enumerate() {
            let marker = if path.exists() { "found".green() } else { "missing".dimmed() };
            println!("  {}. {} ({})", i + 1, path.display(), marker);
        }
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!("  Wait timeout: {}", humantime_serde::re::humantime::format_duration(config.wait_timeout));
    println!("  Group annotation: {}", config.group_annotation);
    println!("  Quorum annotation: {}", config.min_available_annotation);
    match config.store.backend {
        StoreKind::Global => println!("  Store: global lock"),
        StoreKind::Sharded => println!("  Store: sharded ({} shards)", config.store.shards),
    }
    println!("  Event bus capacity: {}", config.event_bus_capacity);

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = GangAdmissionConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf) -> Result<()> {
    let sample = include_str!("../../templates/config-minimal.yaml");

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!("{} {}", "✓ Wrote sample configuration to".green(), output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_is_valid() {
        let config =
            GangAdmissionConfig::from_yaml_str(include_str!("../../templates/config-minimal.yaml"))
                .unwrap();
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_generate_writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gang-admission.yaml");

        generate(path.clone()).await.unwrap();

        let config = GangAdmissionConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config, GangAdmissionConfig::from_yaml_str(include_str!("../../templates/config-minimal.yaml")).unwrap());
    }
}
