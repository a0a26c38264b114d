// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Notification Sender Adapters
//
// Anti-Corruption Layer between workflow notification intents and whatever
// actually delivers mail. The workflow only sees success or failure.

use crate::domain::notification::{NotificationError, NotificationIntent, NotificationSender};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

/// Logs each intent and reports success. Used when no webhook is configured.
#[derive(Debug, Default, Clone)]
pub struct LoggingNotificationSender;

#[async_trait]
impl NotificationSender for LoggingNotificationSender {
    async fn send(&self, intent: &NotificationIntent) -> Result<(), NotificationError> {
        info!(
            kind = intent.kind.as_str(),
            recipient = %intent.recipient,
            record = %intent.record,
            "Notification intent (no delivery webhook configured)"
        );
        Ok(())
    }
}

/// POSTs each intent as JSON to a delivery webhook. Every call is bounded by
/// the client timeout, so a silent endpoint cannot stall dispatch.
pub struct WebhookNotificationSender {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl WebhookNotificationSender {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                NotificationError::Unavailable(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> NotificationError {
        if err.is_timeout() {
            NotificationError::Unavailable(format!(
                "webhook did not answer within {}s",
                self.timeout.as_secs_f64()
            ))
        } else {
            NotificationError::Unavailable(err.to_string())
        }
    }
}

#[async_trait]
impl NotificationSender for WebhookNotificationSender {
    async fn send(&self, intent: &NotificationIntent) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(intent)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let error_text = response.text().await.unwrap_or_default();
        Err(if status.is_server_error() {
            NotificationError::Unavailable(format!("HTTP {}: {}", status, error_text))
        } else {
            NotificationError::Rejected(format!("HTTP {}: {}", status, error_text))
        })
    }
}

/// Keeps every intent in memory; can be told to fail. For tests and local runs.
#[derive(Clone, Default)]
pub struct RecordingNotificationSender {
    sent: Arc<Mutex<Vec<NotificationIntent>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut flag) = self.failing.lock() {
            *flag = failing;
        }
    }

    pub fn sent(&self) -> Vec<NotificationIntent> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotificationSender {
    async fn send(&self, intent: &NotificationIntent) -> Result<(), NotificationError> {
        let failing = self.failing.lock().map(|f| *f).unwrap_or(false);
        if failing {
            return Err(NotificationError::Unavailable("recording sender set to fail".to_string()));
        }
        self.sent
            .lock()
            .map_err(|_| NotificationError::Unavailable("Mutex poisoned".to_string()))?
            .push(intent.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::loi::LoiId;
    use crate::domain::notification::NotificationKind;
    use crate::domain::organization::OrganizationId;
    use crate::domain::status::RecordRef;

    fn intent() -> NotificationIntent {
        NotificationIntent::new(
            NotificationKind::Approved,
            "contact@riverbank.org",
            RecordRef::LetterOfInterest(LoiId::new()),
            OrganizationId::new(),
        )
    }

    #[tokio::test]
    async fn test_recording_sender_captures_and_fails_on_demand() {
        let sender = RecordingNotificationSender::new();
        sender.send(&intent()).await.unwrap();
        assert_eq!(sender.sent().len(), 1);

        sender.set_failing(true);
        assert!(sender.send(&intent()).await.is_err());
        assert_eq!(sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_webhook_sender_unreachable_is_unavailable() {
        let sender = WebhookNotificationSender::new(
            "http://127.0.0.1:9/notify",
            Duration::from_secs(2),
        )
        .unwrap();
        let err = sender.send(&intent()).await.unwrap_err();
        assert!(matches!(err, NotificationError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_webhook_sender_gives_up_on_silent_endpoint() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        // Accept and hold connections without ever answering.
        let silent = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let endpoint = format!("http://{}/notify", address);
        let sender = WebhookNotificationSender::new(endpoint, Duration::from_millis(300)).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), sender.send(&intent()))
            .await
            .expect("send must return once the client timeout elapses");
        match result {
            Err(NotificationError::Unavailable(message)) => {
                assert!(message.contains("did not answer"))
            }
            other => panic!("expected a timeout failure, got {:?}", other),
        }
        silent.abort();
    }
}
