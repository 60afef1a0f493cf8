//! Yingtian height platform.

use super::{
    as_f64, display_field, game_id_or_friend_code, HeightPlatform, HeightQuery, RULE, UNKNOWN,
    UNKNOWN_ERROR,
};
use crate::error::SkyApiError;
use crate::types::{error_from_response, Endpoint};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

const DESC_PREFIX: &str = "当前身高：";
const GAME_ID_REQUIRED: &str = "❌ 请提供有效的游戏长ID";

const VALUE_FIELDS: [(&str, &str); 5] = [
    ("📊 体型值(s值)", "scale"),
    ("📊 身高值(h值)", "height"),
    ("✨ 当前身高", "currentHeight"),
    ("📈 最高身高", "maxHeight"),
    ("📉 最矮身高", "minHeight"),
];

const SCORE_FIELDS: [(&str, &str); 5] = [
    ("体型值评分", "scaleScore"),
    ("身高值评分", "heightScore"),
    ("当前身高评分", "currentHeightScore"),
    ("最高身高评分", "maxHeightScore"),
    ("最矮身高评分", "minHeightScore"),
];

const ADORN_FIELDS: [(&str, &str); 7] = [
    ("斗篷", "cloak"),
    ("发型", "hair"),
    ("面具", "mask"),
    ("裤子", "pants"),
    ("道具", "prop"),
    ("头饰", "horn"),
    ("项链", "neck"),
];

const ACTION_FIELDS: [(&str, &str); 2] = [("站姿", "attitude"), ("叫声", "voice")];

pub struct YingtianPlatform {
    client: Client,
    endpoint: Endpoint,
}

impl YingtianPlatform {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }
}

/// Integral values keep one decimal place (`2.0`), others print in full.
fn format_number(value: Option<&Value>) -> String {
    match as_f64(value) {
        Some(v) if v.fract() == 0.0 => format!("{:.1}", v),
        Some(v) => v.to_string(),
        None => UNKNOWN.to_string(),
    }
}

fn section(title: &str, group: Option<&Value>, fields: &[(&str, &str)], unit: &str) -> Vec<String> {
    let mut lines = vec![String::new(), title.to_string()];
    lines.extend(fields.iter().map(|(label, field)| {
        let value = display_field(group.and_then(|g| g.get(*field)));
        format!("  • {}: {}{}", label, value, unit)
    }));
    lines
}

pub(crate) fn format_report(body: &Value) -> String {
    let mut lines = vec!["✨ 应天平台 - 身高查询结果".to_string(), RULE.to_string()];

    let data = body.get("data");
    lines.extend(VALUE_FIELDS.iter().map(|(label, field)| {
        format!("{}: {}", label, format_number(data.and_then(|d| d.get(*field))))
    }));

    let desc = data
        .and_then(|d| d.get("heightDesc"))
        .and_then(Value::as_str)
        .map(|d| d.strip_prefix(DESC_PREFIX).unwrap_or(d).trim().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());
    lines.push(format!("🏷️ 身高描述: {}", desc));

    lines.extend(section("📊 评分信息:", body.get("score"), &SCORE_FIELDS, "分"));
    lines.extend(section("👗 装扮信息:", body.get("adorn"), &ADORN_FIELDS, ""));
    lines.extend(section("🎭 动作信息:", body.get("action"), &ACTION_FIELDS, ""));
    lines.push(RULE.to_string());

    lines
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl HeightPlatform for YingtianPlatform {
    fn name(&self) -> &str {
        "yingtian"
    }

    fn aliases(&self) -> &[&'static str] {
        &["应天", "yt"]
    }

    fn label(&self) -> &str {
        "应天平台"
    }

    fn requirement(&self) -> &str {
        "必须提供游戏长ID，好友码可选"
    }

    fn examples(&self) -> &[&'static str] {
        &[
            "yingtian xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx",
            "yt xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx XXXX-XXXX-XXXX",
        ]
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn validate(
        &self,
        game_id: Option<&str>,
        friend_code: Option<&str>,
    ) -> Result<HeightQuery, SkyApiError> {
        game_id_or_friend_code(game_id, friend_code)
    }

    async fn query(&self, query: &HeightQuery) -> Result<String, SkyApiError> {
        let key = self.endpoint.key()?;
        let game_id = query
            .game_id
            .as_deref()
            .ok_or_else(|| SkyApiError::InvalidArguments(GAME_ID_REQUIRED.into()))?;

        let mut params = vec![("key", key), ("cx", game_id)];
        if let Some(code) = query.friend_code.as_deref() {
            params.push(("code", code));
        }

        debug!("Querying yingtian height");
        let response = self
            .client
            .get(&self.endpoint.url)
            .query(&params)
            .timeout(self.endpoint.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: Value = response.json().await?;
        if body.get("code").and_then(Value::as_i64) != Some(200) {
            let message = body
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_ERROR);
            return Err(SkyApiError::Upstream(message.to_string()));
        }

        Ok(format_report(&body))
    }
}
