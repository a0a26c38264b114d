// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Store Factory - Application Layer
//!
//! Builds the concrete persistence and notification adapters named by the
//! portal configuration, so the domain layer only ever sees trait objects.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::notification::NotificationSender;
use crate::domain::portal_config::NotificationConfig;
use crate::domain::repository::{GrantStore, StorageBackend};
use crate::infrastructure::db::Database;
use crate::infrastructure::notifications::{LoggingNotificationSender, WebhookNotificationSender};
use crate::infrastructure::repositories::{InMemoryGrantStore, PostgresGrantStore};

/// Creates a GrantStore implementation based on the configured backend
pub async fn create_grant_store(backend: &StorageBackend) -> Result<Arc<dyn GrantStore>> {
    match backend {
        StorageBackend::InMemory => {
            info!("Using in-memory grant store; records are lost on shutdown");
            Ok(Arc::new(InMemoryGrantStore::new()))
        }
        StorageBackend::PostgreSQL(config) => {
            let database = Database::new(config)
                .await
                .context("Failed to connect to PostgreSQL")?;
            info!(max_connections = config.max_connections, "Using PostgreSQL grant store");
            Ok(Arc::new(PostgresGrantStore::new(database.get_pool().clone())))
        }
    }
}

/// Creates the outbound notification sender. Without a webhook, intents are
/// only logged.
pub fn create_notification_sender(
    config: &NotificationConfig,
) -> Result<Arc<dyn NotificationSender>> {
    match config.webhook_url.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) => {
            let sender = WebhookNotificationSender::new(url, config.webhook_timeout())
                .context("Failed to build webhook notification sender")?;
            info!(timeout_secs = config.webhook_timeout_secs, "Using webhook notification sender");
            Ok(Arc::new(sender))
        }
        None => Ok(Arc::new(LoggingNotificationSender)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_backend_opens_units() {
        let store = create_grant_store(&StorageBackend::InMemory).await.unwrap();
        let uow = store.begin().await.unwrap();
        uow.commit().await.unwrap();
    }

    #[test]
    fn test_webhook_sender_selected_when_url_present() {
        let mut config = NotificationConfig::default();
        assert!(create_notification_sender(&config).is_ok());

        config.webhook_url = Some("https://mailer.example.org/hooks".to_string());
        config.webhook_timeout_secs = 3;
        assert!(create_notification_sender(&config).is_ok());
    }
}
