//! OneBot HTTP client.

use crate::error::OneBotError;
use crate::forward::ForwardPayload;
use crate::types::*;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// OneBot v11 HTTP API client (NapCat).
#[derive(Clone)]
pub struct OneBotClient {
    client: Client,
    base_url: String,
    token: Option<SecretString>,
}

#[derive(Serialize)]
struct ForwardRequest<'a> {
    #[serde(flatten)]
    target: ChatTarget,
    #[serde(flatten)]
    payload: &'a ForwardPayload,
}

impl OneBotClient {
    /// Create a new OneBot client. An empty token disables authentication.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, OneBotError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()).map(SecretString::new),
        })
    }

    fn post(&self, action: &str) -> RequestBuilder {
        let request = self.client.post(format!("{}/{}", self.base_url, action));
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Check if the OneBot API is reachable and online.
    pub async fn health_check(&self) -> bool {
        let request = self.client.get(format!("{}/get_status", self.base_url));
        let request = match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };

        match request.send().await {
            Ok(response) if response.status().is_success() => response
                .json::<ActionResponse<serde_json::Value>>()
                .await
                .map(|r| r.is_ok())
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Get the logged-in bot account.
    #[instrument(skip(self))]
    pub async fn get_login_info(&self) -> Result<LoginInfo, OneBotError> {
        self.call("get_login_info", &serde_json::json!({})).await
    }

    /// Send a message made of segments to a group or user.
    #[instrument(skip(self, segments), fields(segment_count = segments.len()))]
    pub async fn send_message(
        &self,
        target: ChatTarget,
        segments: &[Segment],
    ) -> Result<i64, OneBotError> {
        let action = if target.is_group() {
            "send_group_msg"
        } else {
            "send_private_msg"
        };
        let request = SendMessageRequest {
            target,
            message: segments,
        };

        let sent: MessageId = self.call(action, &request).await?;
        debug!("Sent message {} to {:?}", sent.message_id, target);
        Ok(sent.message_id)
    }

    /// Send plain text.
    pub async fn send_text(&self, target: ChatTarget, text: &str) -> Result<i64, OneBotError> {
        self.send_message(target, &[Segment::text(text)]).await
    }

    /// Send a merged-forward bundle.
    #[instrument(skip(self, payload), fields(nodes = payload.messages.len()))]
    pub async fn send_forward(
        &self,
        target: ChatTarget,
        payload: &ForwardPayload,
    ) -> Result<(), OneBotError> {
        let request = ForwardRequest { target, payload };
        let _: serde_json::Value = self.call_any("send_forward_msg", &request).await?;
        debug!("Sent forward bundle to {:?}", target);
        Ok(())
    }

    async fn call<B, T>(&self, action: &str, body: &B) -> Result<T, OneBotError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let data: Option<T> = self.call_raw(action, body).await?;
        data.ok_or_else(|| OneBotError::Api(format!("{} returned no data", action)))
    }

    /// Like `call`, but tolerates an absent `data` field.
    async fn call_any<B>(&self, action: &str, body: &B) -> Result<serde_json::Value, OneBotError>
    where
        B: Serialize + ?Sized,
    {
        let data: Option<serde_json::Value> = self.call_raw(action, body).await?;
        Ok(data.unwrap_or(serde_json::Value::Null))
    }

    async fn call_raw<B, T>(&self, action: &str, body: &B) -> Result<Option<T>, OneBotError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.post(action).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let msg = response.text().await.unwrap_or_default();
            warn!("{} failed with HTTP {}: {}", action, status, msg);
            return Err(OneBotError::Api(format!("HTTP {}: {}", status.as_u16(), msg)));
        }

        let envelope: ActionResponse<T> = response.json().await?;
        if !envelope.is_ok() {
            warn!(
                "{} rejected: retcode={} message={}",
                action,
                envelope.retcode,
                envelope
                    .wording
                    .as_deref()
                    .or(envelope.message.as_deref())
                    .unwrap_or("")
            );
            return Err(OneBotError::ActionFailed {
                action: action.to_string(),
                status: envelope.status,
                retcode: envelope.retcode,
            });
        }

        Ok(envelope.data)
    }
}
