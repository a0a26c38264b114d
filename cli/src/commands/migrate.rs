// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Database Migrate Command
//!
//! Applies the PostgreSQL schema for the grant record store.
//!
//! ```bash
//! # Apply all pending migrations
//! grantflow migrate
//!
//! # Preview migrations without applying
//! grantflow migrate --dry-run
//! ```
//!
//! The connection URL comes from `spec.database.url` in the portal
//! configuration or from `GRANTFLOW_DATABASE_URL`.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;

use grantflow_core::domain::portal_config::PortalConfigManifest;
use grantflow_core::domain::repository::StorageBackend;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Args)]
pub struct MigrateCommand {
    /// Perform a dry run without applying changes
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn execute(cmd: MigrateCommand, config_path: Option<PathBuf>) -> Result<()> {
    println!("{}", "grantflow migrate".bold().green());

    let config =
        PortalConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
    let postgres = match config.storage_backend() {
        StorageBackend::PostgreSQL(postgres) => postgres,
        StorageBackend::InMemory => anyhow::bail!(
            "No database configured. \
             Set spec.database.url or GRANTFLOW_DATABASE_URL before migrating."
        ),
    };

    println!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&postgres.connection_string)
        .await
        .context("Failed to connect to database")?;

    let applied_count = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success")
        .fetch_all(&pool)
        .await
        .map(|rows| rows.len())
        .unwrap_or(0);
    let total_migrations = MIGRATOR.iter().count();

    println!(
        "Migration status: {} applied, {} total available.",
        applied_count, total_migrations
    );

    if applied_count >= total_migrations {
        println!("{}", "✓ Database is up to date.".green());
        return Ok(());
    }

    if cmd.dry_run {
        println!("Pending migrations found (Dry Run):");
        for migration in MIGRATOR.iter().skip(applied_count) {
            println!(" - {} {}", migration.version, migration.description);
        }
        println!("Skipping application due to --dry-run");
        return Ok(());
    }

    println!("Applying pending migrations...");
    MIGRATOR.run(&pool).await.context("Failed to apply migrations")?;
    println!("{}", "✓ Database updated successfully.".green());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_schema_is_embedded() {
        assert!(MIGRATOR.iter().any(|m| m.description.contains("initial schema")));
    }
}
