//! Mango Tool height platform.

use super::{
    as_f64, bad_game_id, normalize_friend_code, HeightPlatform, HeightQuery, RULE, UNKNOWN,
    UNKNOWN_ERROR,
};
use crate::error::SkyApiError;
use crate::types::{error_from_response, Endpoint};
use crate::validators::is_game_id;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

/// Reported when the response omits `max`.
const DEFAULT_MAX_HEIGHT: f64 = 1.0;
/// Reported when the response omits `min`.
const DEFAULT_MIN_HEIGHT: f64 = 14.0;

#[derive(Serialize)]
struct MangoRequest<'a> {
    key: &'a str,
    id: &'a str,
    #[serde(rename = "inviteCode", skip_serializing_if = "Option::is_none")]
    invite_code: Option<&'a str>,
}

pub struct MangoPlatform {
    client: Client,
    endpoint: Endpoint,
}

impl MangoPlatform {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }
}

/// Bucket a height by its relative position between the tallest and
/// shortest possible values.
pub(crate) fn height_type(height: Option<f64>, min: f64, max: f64) -> &'static str {
    let Some(height) = height else {
        return UNKNOWN;
    };
    let range = min - max;
    if range <= 0.0 {
        return "中等";
    }

    let position = (height - max) / range;
    if position < 0.2 {
        "非常高"
    } else if position < 0.4 {
        "高"
    } else if position < 0.6 {
        "中等"
    } else if position < 0.8 {
        "矮"
    } else {
        "非常矮"
    }
}

fn value_line(label: &str, value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}: {:.8}", label, v),
        None => format!("{}: {}", label, UNKNOWN),
    }
}

pub(crate) fn format_report(data: &serde_json::Value) -> String {
    let s = as_f64(data.get("s"));
    let h = as_f64(data.get("h"));
    let height = as_f64(data.get("height")).or(h);
    let max = as_f64(data.get("max")).unwrap_or(DEFAULT_MAX_HEIGHT);
    let min = as_f64(data.get("min")).unwrap_or(DEFAULT_MIN_HEIGHT);

    let to_min = height.map_or(0.0, |v| (min - v).max(0.0));
    let to_max = height.map_or(0.0, |v| (v - max).max(0.0));

    let lines = [
        "✨ 芒果平台 - 身高查询结果".to_string(),
        RULE.to_string(),
        value_line("📊 体型值(s值)", s),
        value_line("📊 身高值(h值)", h),
        value_line("📈 最高身高", Some(max)),
        value_line("📉 最矮身高", Some(min)),
        value_line("✨ 当前身高", height),
        format!("🏷️ 身高类型: {}", height_type(height, min, max)),
        String::new(),
        if to_min > 0.0 {
            format!("🎯 距离最矮: {:.8}", to_min)
        } else {
            "🎯 已达到最矮身高".to_string()
        },
        if to_max > 0.0 {
            format!("🎯 距离最高: {:.8}", to_max)
        } else {
            "🎯 已达到最高身高".to_string()
        },
        RULE.to_string(),
    ];
    lines.join("\n")
}

fn has_data(value: Option<&serde_json::Value>) -> bool {
    match value {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::Object(map)) => !map.is_empty(),
        Some(serde_json::Value::Array(items)) => !items.is_empty(),
        Some(serde_json::Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

#[async_trait]
impl HeightPlatform for MangoPlatform {
    fn name(&self) -> &str {
        "mango"
    }

    fn aliases(&self) -> &[&'static str] {
        &["mg", "芒果"]
    }

    fn label(&self) -> &str {
        "芒果平台"
    }

    fn requirement(&self) -> &str {
        "必须提供游戏长ID，好友码可选"
    }

    fn examples(&self) -> &[&'static str] {
        &[
            "mango xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx",
            "mg xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx XXXX-XXXX-XXXX",
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
        let game_id = game_id.filter(|id| is_game_id(id)).ok_or_else(bad_game_id)?;
        Ok(HeightQuery {
            game_id: Some(game_id.to_lowercase()),
            friend_code: normalize_friend_code(friend_code)?,
        })
    }

    async fn query(&self, query: &HeightQuery) -> Result<String, SkyApiError> {
        let key = self.endpoint.key()?;
        let game_id = query.game_id.as_deref().ok_or_else(bad_game_id)?;

        let request = MangoRequest {
            key,
            id: game_id,
            invite_code: query.friend_code.as_deref(),
        };

        debug!("Querying mango height");
        let response = self
            .client
            .post(&self.endpoint.url)
            .json(&request)
            .timeout(self.endpoint.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: serde_json::Value = response.json().await?;
        if !has_data(body.get("data")) {
            let message = body
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or(UNKNOWN_ERROR);
            return Err(SkyApiError::Upstream(message.to_string()));
        }

        Ok(format_report(&body["data"]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GAME_ID: &str = "1a2b3c4d-1111-2222-3333-444455556666";

    fn platform(server: &MockServer) -> MangoPlatform {
        MangoPlatform::new(Endpoint::new(
            "mango",
            format!("{}/sky/out/cn", server.uri()),
            Some("mango-key".into()),
            Duration::from_secs(5),
        ))
    }

    #[test]
    fn test_height_type_buckets() {
        // Tallest at max (1.0), shortest at min (14.0).
        assert_eq!(height_type(Some(1.5), 14.0, 1.0), "非常高");
        assert_eq!(height_type(Some(5.0), 14.0, 1.0), "高");
        assert_eq!(height_type(Some(7.5), 14.0, 1.0), "中等");
        assert_eq!(height_type(Some(10.0), 14.0, 1.0), "矮");
        assert_eq!(height_type(Some(13.9), 14.0, 1.0), "非常矮");
        assert_eq!(height_type(Some(2.0), 1.0, 1.0), "中等");
        assert_eq!(height_type(None, 14.0, 1.0), "未知");
    }

    #[test]
    fn test_validate_requires_game_id() {
        let offline = MangoPlatform::new(Endpoint::new(
            "mango",
            "http://localhost",
            None,
            Duration::from_secs(1),
        ));
        assert!(offline.validate(Some("ABCD-EFGH-1234"), None).is_err());
        assert!(offline.validate(None, None).is_err());

        let query = offline
            .validate(Some(&GAME_ID.to_uppercase()), Some("abcd-efgh-1234"))
            .unwrap();
        assert_eq!(query.game_id.as_deref(), Some(GAME_ID));
        assert_eq!(query.friend_code.as_deref(), Some("ABCD-EFGH-1234"));

        let err = offline.validate(Some(GAME_ID), Some("bad")).unwrap_err();
        assert!(err.user_message().contains("好友码格式错误"));
    }

    #[test]
    fn test_format_report() {
        let report = format_report(&serde_json::json!({
            "s": 0.5,
            "h": "2.25",
            "max": 1.0,
            "min": 14.0
        }));

        assert!(report.starts_with("✨ 芒果平台 - 身高查询结果"));
        assert!(report.contains("📊 体型值(s值): 0.50000000"));
        assert!(report.contains("✨ 当前身高: 2.25000000"));
        assert!(report.contains("🏷️ 身高类型: 非常高"));
        assert!(report.contains("🎯 距离最矮: 11.75000000"));
        assert!(report.contains("🎯 距离最高: 1.25000000"));
    }

    #[tokio::test]
    async fn test_query_posts_json() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/sky/out/cn"))
            .and(body_json(serde_json::json!({
                "key": "mango-key",
                "id": GAME_ID,
                "inviteCode": "ABCD-EFGH-1234"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"s": 0.1, "h": 3.0, "height": 3.0, "max": 1.0, "min": 14.0}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let platform = platform(&server);
        let query = platform
            .validate(Some(GAME_ID), Some("ABCD-EFGH-1234"))
            .unwrap();
        let report = platform.query(&query).await.unwrap();
        assert!(report.contains("✨ 当前身高: 3.00000000"));
    }

    #[tokio::test]
    async fn test_query_empty_data_is_upstream_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/sky/out/cn"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": null,
                "message": "record not found"
            })))
            .mount(&server)
            .await;

        let platform = platform(&server);
        let query = platform.validate(Some(GAME_ID), None).unwrap();
        let err = platform.query(&query).await.unwrap_err();
        assert!(err.is_record_not_found());
    }
}
