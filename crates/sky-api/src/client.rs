//! Client for the daily Sky information APIs.

use crate::error::SkyApiError;
use crate::types::{error_from_response, unix_time, AncestorInfo, Endpoint, ImageData};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{debug, instrument, warn};

/// Images smaller than this are treated as error pages.
const MIN_IMAGE_BYTES: usize = 1024;

/// Hashtags the ancestor feed appends to its posts.
const ANCESTOR_HASHTAGS: [&str; 3] = ["#Sky光遇#", "#光遇旅行先祖#", "#sky光遇[超话]#"];

const RULE: &str = "━━━━━━━━━━━━━━━━";

#[derive(Deserialize)]
struct AncestorResponse {
    code: Option<i64>,
    msg: Option<String>,
    #[serde(default)]
    data: AncestorData,
}

#[derive(Deserialize, Default)]
struct AncestorData {
    #[serde(default)]
    image: Vec<String>,
    #[serde(default)]
    duantext: String,
    #[serde(default)]
    event_start: String,
    #[serde(default)]
    event_end: String,
    #[serde(default)]
    screen_name: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    msg: Option<serde_json::Value>,
}

/// HTTP client for the image, ancestor and server-status endpoints.
#[derive(Clone, Default)]
pub struct SkyApiClient {
    client: Client,
}

impl SkyApiClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Fetch one of the daily images (task, candles, magic, calendar, red stone).
    #[instrument(skip(self), fields(endpoint = %endpoint.name))]
    pub async fn fetch_daily_image(&self, endpoint: &Endpoint) -> Result<ImageData, SkyApiError> {
        let key = endpoint.key()?;
        let response = self
            .client
            .get(&endpoint.url)
            .query(&[("key", key), ("time", unix_time().as_str())])
            .timeout(endpoint.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(SkyApiError::EmptyImage);
        }
        if bytes.len() < MIN_IMAGE_BYTES {
            warn!("Image from {} is only {} bytes", endpoint.name, bytes.len());
            return Err(SkyApiError::ImageTooSmall);
        }

        debug!("Fetched {} bytes", bytes.len());
        Ok(ImageData(STANDARD.encode(&bytes)))
    }

    /// Fetch this week's travelling spirit: image plus description.
    #[instrument(skip(self), fields(endpoint = %endpoint.name))]
    pub async fn fetch_ancestor(&self, endpoint: &Endpoint) -> Result<AncestorInfo, SkyApiError> {
        let key = endpoint.key()?;
        let response = self
            .client
            .get(&endpoint.url)
            .query(&[("key", key), ("time", unix_time().as_str())])
            .timeout(endpoint.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: AncestorResponse = response.json().await?;
        if body.code != Some(200) {
            return Err(SkyApiError::Upstream(
                body.msg.unwrap_or_else(|| "未知错误".into()),
            ));
        }

        let image = match body.data.image.first() {
            Some(url) => self.download_image(url, endpoint).await,
            None => None,
        };

        Ok(AncestorInfo {
            image,
            text: format_ancestor(&body.data),
        })
    }

    /// Query the game server status.
    #[instrument(skip(self), fields(endpoint = %endpoint.name))]
    pub async fn fetch_server_status(&self, endpoint: &Endpoint) -> Result<String, SkyApiError> {
        let key = endpoint.key()?;
        let response = self
            .client
            .get(&endpoint.url)
            .query(&[("key", key), ("time", unix_time().as_str())])
            .timeout(endpoint.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: StatusResponse = response.json().await?;
        let status = match body.msg {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => return Err(SkyApiError::InvalidResponse("missing msg field".into())),
        };

        Ok(format!("🔍 服务器状态查询结果：\n{RULE}\n{status}\n{RULE}"))
    }

    /// Best-effort download; failures only drop the image.
    async fn download_image(&self, url: &str, endpoint: &Endpoint) -> Option<ImageData> {
        let response = match self.client.get(url).timeout(endpoint.timeout).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!("Image download returned HTTP {}", r.status());
                return None;
            }
            Err(e) => {
                warn!("Image download failed: {}", e);
                return None;
            }
        };

        match response.bytes().await {
            Ok(bytes) if !bytes.is_empty() => Some(ImageData(STANDARD.encode(&bytes))),
            _ => None,
        }
    }
}

fn newline_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n+").expect("valid regex"))
}

fn format_ancestor(data: &AncestorData) -> String {
    let mut text = data.duantext.clone();
    for tag in ANCESTOR_HASHTAGS {
        text = text.replace(tag, "");
    }
    let text = newline_runs().replace_all(text.trim(), "\n");

    let lines = [
        "✨ 本周复刻先祖信息".to_string(),
        RULE.to_string(),
        text.into_owned(),
        String::new(),
        format!("📅 开始时间: {}", data.event_start),
        format!("📅 结束时间: {}", data.event_end),
        format!("📱 信息来源: {}", data.screen_name),
        RULE.to_string(),
    ];

    lines
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
