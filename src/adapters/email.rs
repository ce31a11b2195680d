//! Reqwest-backed email API adapter.

use crate::ports::{EmailRequest, NotificationError, Notifier};
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::info;

/// Posts [`EmailRequest`] payloads as JSON to one endpoint
pub struct HttpNotifier {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpNotifier {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, api_key: Option<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().build()?,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send_email(&self, request: &EmailRequest) -> Result<(), NotificationError> {
        let mut builder = self.client.post(self.endpoint.clone()).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| NotificationError::delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::delivery(format!(
                "email api returned {status}: {body}"
            )));
        }

        info!(kind = ?request.kind, order_id = %request.order_id, "email sent");
        Ok(())
    }
}
