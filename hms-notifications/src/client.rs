use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};

use hms_shared::types::AckResponse;
use hms_shared::{ClientError, ClientResult};

use crate::models::{NotificationRecord, NotificationsEnvelope};

/// The three backend calls the engine depends on.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// `GET /notifications`, newest first.
    async fn list_notifications(&self) -> ClientResult<Vec<NotificationRecord>>;

    /// `POST /notifications/{id}/read`
    async fn mark_read(&self, id: u64) -> ClientResult<()>;

    /// `POST /notifications/read-all`
    async fn mark_all_read(&self) -> ClientResult<()>;
}

/// reqwest-backed implementation talking to the HMS REST API.
#[derive(Debug, Clone)]
pub struct HttpNotificationApi {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpNotificationApi {
    pub fn new(
        base_url: &str,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> ClientResult<Self> {
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hms-notifications/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Turn a non-2xx response into `ClientError::Status`.
    async fn check(resp: Response) -> ClientResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.bytes().await?;
        Err(ClientError::from_response(status.as_u16(), &body))
    }

    async fn acknowledge(&self, path: &str) -> ClientResult<()> {
        let resp = self
            .authorize(self.client.post(self.url(path)))
            .send()
            .await?;
        let body = Self::check(resp).await?.bytes().await?;
        if body.is_empty() {
            return Ok(());
        }

        let ack: AckResponse = serde_json::from_slice(&body)?;
        if ack.success {
            Ok(())
        } else {
            Err(ClientError::Rejected(
                ack.message.unwrap_or_else(|| "acknowledgement refused".into()),
            ))
        }
    }
}

#[async_trait]
impl NotificationApi for HttpNotificationApi {
    async fn list_notifications(&self) -> ClientResult<Vec<NotificationRecord>> {
        let resp = self
            .authorize(self.client.get(self.url("/notifications")))
            .send()
            .await?;
        let body = Self::check(resp).await?.bytes().await?;
        let envelope: NotificationsEnvelope = serde_json::from_slice(&body)?;

        if !envelope.success {
            return Err(ClientError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "notification listing refused".into()),
            ));
        }

        Ok(envelope
            .notifications
            .into_iter()
            .map(NotificationRecord::from)
            .collect())
    }

    async fn mark_read(&self, id: u64) -> ClientResult<()> {
        self.acknowledge(&format!("/notifications/{id}/read")).await
    }

    async fn mark_all_read(&self) -> ClientResult<()> {
        self.acknowledge("/notifications/read-all").await
    }
}
