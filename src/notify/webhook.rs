use std::time::Duration;

use reqwest::Client;

use super::error::NotifyError;
use super::{Notification, Notifier};

/// POSTs each notification as JSON to a mailer webhook.
#[derive(Debug)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
    timeout_ms: u64,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout_ms: u64) -> Self {
        Self {
            client: Client::new(),
            url,
            timeout_ms,
        }
    }
}

impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .timeout(Duration::from_millis(self.timeout_ms))
            .header("content-type", "application/json")
            .json(notification)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    NotifyError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}
