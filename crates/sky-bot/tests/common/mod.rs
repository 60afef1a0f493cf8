//! Common test utilities for integration tests.

#![allow(dead_code)]

use onebot_client::{BotMessage, NodeSender, OneBotClient};
use sky_api::Endpoint;
use sky_bot::config::SettingsConfig;
use sky_bot::delivery::Delivery;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{MockServer, ResponseTemplate};

pub const GROUP_ID: i64 = 42;
pub const BOT_ID: i64 = 10001;

/// Create a OneBot client configured for a mock NapCat server.
pub fn test_onebot_client(mock_server: &MockServer) -> OneBotClient {
    OneBotClient::new(mock_server.uri(), None, Duration::from_secs(5)).unwrap()
}

/// Delivery that bundles replies as forwards authored by the test bot.
pub fn test_delivery(mock_server: &MockServer) -> Arc<Delivery> {
    Arc::new(Delivery::new(
        test_onebot_client(mock_server),
        true,
        Some(NodeSender {
            user_id: BOT_ID,
            nickname: "光遇小助手".to_string(),
        }),
    ))
}

/// An API endpoint served by the mock Sky API server.
pub fn test_endpoint(mock_server: &MockServer, name: &str, route: &str) -> Endpoint {
    Endpoint::new(
        name,
        format!("{}{}", mock_server.uri(), route),
        Some("test-key".to_string()),
        Duration::from_secs(5),
    )
}

/// Settings with the given commands switched off.
pub fn settings_without(disabled: &[&str]) -> Arc<SettingsConfig> {
    Arc::new(SettingsConfig {
        enabled: disabled
            .iter()
            .map(|name| (name.to_string(), false))
            .collect::<HashMap<_, _>>(),
        ..SettingsConfig::default()
    })
}

/// A group message as NapCat would report it.
pub fn group_message(text: &str) -> BotMessage {
    BotMessage {
        self_id: BOT_ID,
        user_id: 123456,
        sender_name: Some("旅人".to_string()),
        text: text.to_string(),
        time: 1_700_000_000,
        group_id: Some(GROUP_ID),
        group_name: Some("光遇测试群".to_string()),
    }
}

/// A successful OneBot action response.
pub fn onebot_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "status": "ok",
        "retcode": 0,
        "data": {"message_id": 1}
    }))
}

/// A rejected OneBot action response.
pub fn onebot_failed() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "status": "failed",
        "retcode": 1200,
        "data": null,
        "message": "forward not supported"
    }))
}

/// PNG-looking bytes above the minimum image size.
pub fn image_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.resize(2048, 7);
    bytes
}
