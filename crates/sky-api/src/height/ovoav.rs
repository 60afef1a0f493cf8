//! Ovoav ("unicorn") height platform.

use super::{bad_identifier, game_id_or_friend_code, HeightPlatform, HeightQuery};
use crate::error::SkyApiError;
use crate::types::{error_from_response, Endpoint};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::sync::OnceLock;
use tracing::debug;


pub struct OvoavPlatform {
    client: Client,
    endpoint: Endpoint,
}

impl OvoavPlatform {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }
}

/// The platform answers with lightly formatted HTML; reduce it to plain text.
pub(crate) fn strip_markup(body: &str) -> String {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();

    let tags = TAGS.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"));
    let spaces = SPACES.get_or_init(|| Regex::new(r" +").expect("valid regex"));

    let text = tags.replace_all(body, "");
    spaces.replace_all(&text, " ").trim().to_string()
}

#[async_trait]
impl HeightPlatform for OvoavPlatform {
    fn name(&self) -> &str {
        "ovoav"
    }

    fn aliases(&self) -> &[&'static str] {
        &["独角兽", "djs"]
    }

    fn label(&self) -> &str {
        "独角兽平台"
    }

    fn requirement(&self) -> &str {
        "提供游戏长ID或好友码任选其一"
    }

    fn examples(&self) -> &[&'static str] {
        &[
            "ovoav xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx",
            "djs XXXX-XXXX-XXXX",
        ]
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Accepts either identifier in the first position.
    fn validate(
        &self,
        game_id: Option<&str>,
        friend_code: Option<&str>,
    ) -> Result<HeightQuery, SkyApiError> {
        game_id_or_friend_code(game_id, friend_code)
    }

    async fn query(&self, query: &HeightQuery) -> Result<String, SkyApiError> {
        let key = self.endpoint.key()?;
        let id = query
            .game_id
            .as_deref()
            .or(query.friend_code.as_deref())
            .ok_or_else(bad_identifier)?;

        debug!("Querying ovoav height");
        let response = self
            .client
            .get(&self.endpoint.url)
            .query(&[("key", key), ("id", id)])
            .timeout(self.endpoint.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response.text().await?;
        Ok(strip_markup(&body))
    }
}
