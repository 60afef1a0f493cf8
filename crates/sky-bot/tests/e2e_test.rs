//! End-to-end integration tests for the Sky tools bot.

mod common;

use common::*;
use onebot_client::{ForwardItem, ForwardOptions, NodeSender, Segment};
use sky_api::height::{MangoPlatform, YingtianPlatform};
use sky_api::{PlatformRegistry, SkyApiClient};
use sky_bot::commands::{
    AllHandler, CommandDispatcher, HeightHandler, HelpHandler, ReportHandler,
};
use sky_bot::config::SettingsConfig;
use sky_bot::delivery::Delivery;
use sky_bot::metadata::CommandRegistry;
use sky_bot::reports::{ReportKind, ReportSources};
use std::sync::Arc;
use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GAME_ID: &str = "12345678-abcd-4def-8123-456789abcdef";

fn report_dispatcher(
    settings: Arc<SettingsConfig>,
    sources: ReportSources,
    delivery: Arc<Delivery>,
) -> CommandDispatcher {
    let commands = Arc::new(CommandRegistry::with_builtin().unwrap());
    let sources = Arc::new(sources);

    let mut dispatcher =
        CommandDispatcher::new("#", commands.clone(), settings.clone(), delivery.clone());
    for handler in ReportHandler::all(&sources, &delivery) {
        dispatcher.register(Arc::new(handler)).unwrap();
    }
    dispatcher
        .register(Arc::new(AllHandler::new(commands, settings, sources, delivery)))
        .unwrap();
    dispatcher
}

fn text_message(text: &str) -> serde_json::Value {
    serde_json::json!({
        "group_id": GROUP_ID,
        "message": [{"type": "text", "data": {"text": text}}]
    })
}

#[tokio::test]
async fn test_candle_report_sent_as_forward() {
    let napcat = MockServer::start().await;
    let sky = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sky/dl"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image_bytes()))
        .expect(1)
        .mount(&sky)
        .await;

    // Progress notice goes out directly
    Mock::given(method("POST"))
        .and(path("/send_group_msg"))
        .and(body_json(text_message("🔄 正在获取大蜡烛位置...")))
        .respond_with(onebot_ok())
        .expect(1)
        .mount(&napcat)
        .await;

    // The image is bundled as a forward node authored by the bot
    Mock::given(method("POST"))
        .and(path("/send_forward_msg"))
        .and(body_string_contains("\"type\":\"node\""))
        .and(body_string_contains("data:image/png;base64,"))
        .and(body_string_contains("光遇测试群的聊天记录"))
        .respond_with(onebot_ok())
        .expect(1)
        .mount(&napcat)
        .await;

    let mut sources = ReportSources::new(SkyApiClient::new());
    sources.insert(ReportKind::Candle, test_endpoint(&sky, "大蜡烛", "/sky/dl"));
    let dispatcher = report_dispatcher(
        Arc::new(SettingsConfig::default()),
        sources,
        test_delivery(&napcat),
    );

    let handled = dispatcher.dispatch(&group_message("#dl")).await.unwrap();
    assert!(handled);
}

#[tokio::test]
async fn test_forward_rejection_falls_back_to_direct_send() {
    let napcat = MockServer::start().await;
    let sky = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sky/mf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image_bytes()))
        .mount(&sky)
        .await;

    Mock::given(method("POST"))
        .and(path("/send_forward_msg"))
        .respond_with(onebot_failed())
        .expect(1)
        .mount(&napcat)
        .await;

    Mock::given(method("POST"))
        .and(path("/send_group_msg"))
        .and(body_json(text_message("🔄 正在获取每日魔法...")))
        .respond_with(onebot_ok())
        .expect(1)
        .mount(&napcat)
        .await;

    // The image itself, sent on its own after the bundle was refused
    Mock::given(method("POST"))
        .and(path("/send_group_msg"))
        .and(body_string_contains("data:image/png;base64,"))
        .respond_with(onebot_ok())
        .expect(1)
        .mount(&napcat)
        .await;

    let mut sources = ReportSources::new(SkyApiClient::new());
    sources.insert(ReportKind::Magic, test_endpoint(&sky, "每日魔法", "/sky/mf"));
    let dispatcher = report_dispatcher(
        Arc::new(SettingsConfig::default()),
        sources,
        test_delivery(&napcat),
    );

    assert!(dispatcher.dispatch(&group_message("#魔法")).await.unwrap());
}

#[tokio::test]
async fn test_disabled_command_replies_without_fetching() {
    let napcat = MockServer::start().await;
    let sky = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image_bytes()))
        .expect(0)
        .mount(&sky)
        .await;

    Mock::given(method("POST"))
        .and(path("/send_group_msg"))
        .and(body_json(text_message("❌ 每日魔法查询功能未启用")))
        .respond_with(onebot_ok())
        .expect(1)
        .mount(&napcat)
        .await;

    let mut sources = ReportSources::new(SkyApiClient::new());
    sources.insert(ReportKind::Magic, test_endpoint(&sky, "每日魔法", "/sky/mf"));
    let dispatcher = report_dispatcher(settings_without(&["magic"]), sources, test_delivery(&napcat));

    assert!(dispatcher.dispatch(&group_message("#magic")).await.unwrap());
}

#[tokio::test]
async fn test_missing_key_reported_before_fetch() {
    let napcat = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/send_group_msg"))
        .and(body_json(text_message("❌ 插件未配置红石API密钥")))
        .respond_with(onebot_ok())
        .expect(1)
        .mount(&napcat)
        .await;

    let mut sources = ReportSources::new(SkyApiClient::new());
    sources.insert(
        ReportKind::Redstone,
        sky_api::Endpoint::new("红石", "http://127.0.0.1:9/hs", None, std::time::Duration::from_secs(1)),
    );
    let dispatcher = report_dispatcher(
        Arc::new(SettingsConfig::default()),
        sources,
        test_delivery(&napcat),
    );

    assert!(dispatcher.dispatch(&group_message("#红石")).await.unwrap());
}

#[tokio::test]
async fn test_all_bundles_successes_and_failures() {
    let napcat = MockServer::start().await;
    let sky = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sky/dl"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image_bytes()))
        .mount(&sky)
        .await;
    Mock::given(method("GET"))
        .and(path("/sky/zt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"msg": "服务器正常"})),
        )
        .mount(&sky)
        .await;
    Mock::given(method("GET"))
        .and(path("/sky/mf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 16]))
        .mount(&sky)
        .await;

    Mock::given(method("POST"))
        .and(path("/send_group_msg"))
        .and(body_json(text_message("🔄 正在获取所有信息，请稍候...")))
        .respond_with(onebot_ok())
        .expect(1)
        .mount(&napcat)
        .await;

    // Seasonal candles are switched off, leaving seven entries
    Mock::given(method("POST"))
        .and(path("/send_forward_msg"))
        .and(body_string_contains("光遇日常信息汇总"))
        .and(body_string_contains("共 7 条消息"))
        .and(body_string_contains("💎 大蜡烛"))
        .and(body_string_contains("服务器正常"))
        .and(body_string_contains("🔮 每日魔法: ❌ 图片数据过小"))
        .and(body_string_contains("每日任务: ❌ 插件未配置每日任务API密钥"))
        .respond_with(onebot_ok())
        .expect(1)
        .mount(&napcat)
        .await;

    let mut sources = ReportSources::new(SkyApiClient::new());
    sources.insert(ReportKind::Candle, test_endpoint(&sky, "大蜡烛", "/sky/dl"));
    sources.insert(ReportKind::SkyTest, test_endpoint(&sky, "服务器状态", "/sky/zt"));
    sources.insert(ReportKind::Magic, test_endpoint(&sky, "每日魔法", "/sky/mf"));
    sources.insert(
        ReportKind::Task,
        sky_api::Endpoint::new("每日任务", "http://127.0.0.1:9/rw", None, std::time::Duration::from_secs(1)),
    );
    let dispatcher = report_dispatcher(
        settings_without(&["season_candle"]),
        sources,
        test_delivery(&napcat),
    );

    assert!(dispatcher.dispatch(&group_message("#汇总")).await.unwrap());
}

#[tokio::test]
async fn test_height_record_not_found_suggests_friend_code() {
    let napcat = MockServer::start().await;
    let sky = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sky/out/cn"))
        .and(body_string_contains(GAME_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": null,
            "message": "record not found"
        })))
        .expect(1)
        .mount(&sky)
        .await;

    Mock::given(method("POST"))
        .and(path("/send_forward_msg"))
        .and(body_string_contains("在 **mango** 平台未找到该玩家的身高记录"))
        .and(body_string_contains("#height <游戏ID> <好友码>"))
        .respond_with(onebot_ok())
        .expect(1)
        .mount(&napcat)
        .await;

    let mut platforms = PlatformRegistry::new();
    platforms
        .register(Arc::new(MangoPlatform::new(test_endpoint(
            &sky,
            "mango",
            "/sky/out/cn",
        ))))
        .unwrap();

    let commands = Arc::new(CommandRegistry::with_builtin().unwrap());
    let delivery = test_delivery(&napcat);
    let mut dispatcher = CommandDispatcher::new(
        "#",
        commands,
        Arc::new(SettingsConfig::default()),
        delivery.clone(),
    );
    dispatcher
        .register(Arc::new(HeightHandler::new(
            "#",
            Arc::new(platforms),
            "mango",
            delivery,
        )))
        .unwrap();

    let message = group_message(&format!("#身高 {}", GAME_ID));
    assert!(dispatcher.dispatch(&message).await.unwrap());
}

#[tokio::test]
async fn test_help_detail_by_alias() {
    let napcat = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/send_forward_msg"))
        .and(body_string_contains("📘 **#height** 命令详解"))
        .respond_with(onebot_ok())
        .expect(1)
        .mount(&napcat)
        .await;

    let commands = Arc::new(CommandRegistry::with_builtin().unwrap());
    let settings = Arc::new(SettingsConfig::default());
    let delivery = test_delivery(&napcat);
    let mut dispatcher =
        CommandDispatcher::new("#", commands.clone(), settings.clone(), delivery.clone());
    dispatcher
        .register(Arc::new(HelpHandler::new("#", commands, settings, delivery)))
        .unwrap();

    assert!(dispatcher.dispatch(&group_message("#help 身高")).await.unwrap());
}

#[tokio::test]
async fn test_plain_chat_is_ignored() {
    let napcat = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(onebot_ok())
        .expect(0)
        .mount(&napcat)
        .await;

    let dispatcher = report_dispatcher(
        Arc::new(SettingsConfig::default()),
        ReportSources::new(SkyApiClient::new()),
        test_delivery(&napcat),
    );

    for text in ["今天的大蜡烛在哪", "#candles", "dl"] {
        assert!(!dispatcher.dispatch(&group_message(text)).await.unwrap());
    }
}

#[tokio::test]
async fn test_image_send_failure_notifies_user() {
    let napcat = MockServer::start().await;
    let sky = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sky/dl"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image_bytes()))
        .mount(&sky)
        .await;

    Mock::given(method("POST"))
        .and(path("/send_forward_msg"))
        .respond_with(onebot_failed())
        .expect(1)
        .mount(&napcat)
        .await;
    Mock::given(method("POST"))
        .and(path("/send_group_msg"))
        .and(body_json(text_message("🔄 正在获取大蜡烛位置...")))
        .respond_with(onebot_ok())
        .expect(1)
        .mount(&napcat)
        .await;
    Mock::given(method("POST"))
        .and(path("/send_group_msg"))
        .and(body_json(text_message("❌ 发送图片失败")))
        .respond_with(onebot_ok())
        .expect(1)
        .mount(&napcat)
        .await;

    // NapCat refuses the image on the direct path as well
    Mock::given(method("POST"))
        .and(path("/send_group_msg"))
        .and(body_string_contains("data:image/png;base64,"))
        .respond_with(onebot_failed())
        .expect(1)
        .mount(&napcat)
        .await;

    let mut sources = ReportSources::new(SkyApiClient::new());
    sources.insert(ReportKind::Candle, test_endpoint(&sky, "大蜡烛", "/sky/dl"));
    let dispatcher = report_dispatcher(
        Arc::new(SettingsConfig::default()),
        sources,
        test_delivery(&napcat),
    );

    assert!(dispatcher.dispatch(&group_message("#candle")).await.unwrap());
}

#[tokio::test]
async fn test_all_send_failure_notifies_user() {
    let napcat = MockServer::start().await;
    let sky = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sky/dl"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image_bytes()))
        .mount(&sky)
        .await;

    Mock::given(method("POST"))
        .and(path("/send_forward_msg"))
        .respond_with(onebot_failed())
        .expect(1)
        .mount(&napcat)
        .await;
    Mock::given(method("POST"))
        .and(path("/send_group_msg"))
        .and(body_json(text_message("🔄 正在获取所有信息，请稍候...")))
        .respond_with(onebot_ok())
        .expect(1)
        .mount(&napcat)
        .await;
    Mock::given(method("POST"))
        .and(path("/send_group_msg"))
        .and(body_json(text_message("❌ 发送失败，请稍后重试")))
        .respond_with(onebot_ok())
        .expect(1)
        .mount(&napcat)
        .await;

    // Heading and image of the single entry both bounce
    Mock::given(method("POST"))
        .and(path("/send_group_msg"))
        .and(body_string_contains("💎 大蜡烛"))
        .respond_with(onebot_failed())
        .expect(1)
        .mount(&napcat)
        .await;
    Mock::given(method("POST"))
        .and(path("/send_group_msg"))
        .and(body_string_contains("data:image/png;base64,"))
        .respond_with(onebot_failed())
        .expect(1)
        .mount(&napcat)
        .await;

    let mut sources = ReportSources::new(SkyApiClient::new());
    sources.insert(ReportKind::Candle, test_endpoint(&sky, "大蜡烛", "/sky/dl"));
    let disabled: Vec<&str> = ReportKind::ALL
        .into_iter()
        .filter(|kind| *kind != ReportKind::Candle)
        .map(ReportKind::name)
        .collect();
    let dispatcher = report_dispatcher(settings_without(&disabled), sources, test_delivery(&napcat));

    assert!(dispatcher.dispatch(&group_message("#all")).await.unwrap());
}

fn mixed_items() -> Vec<ForwardItem> {
    vec![
        ForwardItem::Node(vec![Segment::text("💎 大蜡烛"), Segment::image("iVBORw0KGgo")]),
        ForwardItem::Single(Segment::text("🔍 服务器状态\n正常")),
    ]
}

async fn expect_direct_sends(napcat: &MockServer, count: u64) {
    Mock::given(method("POST"))
        .and(path("/send_forward_msg"))
        .respond_with(onebot_ok())
        .expect(0)
        .mount(napcat)
        .await;
    Mock::given(method("POST"))
        .and(path("/send_group_msg"))
        .respond_with(onebot_ok())
        .expect(count)
        .mount(napcat)
        .await;
}

#[tokio::test]
async fn test_forwarding_disabled_sends_each_segment() {
    let napcat = MockServer::start().await;
    expect_direct_sends(&napcat, 3).await;

    let delivery = Delivery::new(
        test_onebot_client(&napcat),
        false,
        Some(NodeSender {
            user_id: BOT_ID,
            nickname: "光遇小助手".to_string(),
        }),
    );

    let delivered = delivery
        .send_forward(&group_message("#all"), &mixed_items(), ForwardOptions::default())
        .await;
    assert!(delivered);
}

#[tokio::test]
async fn test_unknown_identity_sends_each_segment() {
    let napcat = MockServer::start().await;
    expect_direct_sends(&napcat, 3).await;

    let delivery = Delivery::new(test_onebot_client(&napcat), true, None);

    let delivered = delivery
        .send_forward(&group_message("#all"), &mixed_items(), ForwardOptions::default())
        .await;
    assert!(delivered);
}

#[tokio::test]
async fn test_delivery_reports_total_failure() {
    let napcat = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/send_forward_msg"))
        .respond_with(onebot_failed())
        .expect(1)
        .mount(&napcat)
        .await;
    Mock::given(method("POST"))
        .and(path("/send_group_msg"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&napcat)
        .await;

    let delivery = test_delivery(&napcat);

    let delivered = delivery
        .send_forward(&group_message("#all"), &mixed_items(), ForwardOptions::default())
        .await;
    assert!(!delivered);
}

#[tokio::test]
async fn test_height_friend_code_checks_key_before_query() {
    let napcat = MockServer::start().await;
    let sky = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&sky)
        .await;
    Mock::given(method("POST"))
        .and(path("/send_group_msg"))
        .and(body_json(text_message("❌ 插件未配置 yingtian 平台 API 密钥")))
        .respond_with(onebot_ok())
        .expect(1)
        .mount(&napcat)
        .await;

    let mut platforms = PlatformRegistry::new();
    platforms
        .register(Arc::new(YingtianPlatform::new(sky_api::Endpoint::new(
            "yingtian",
            format!("{}/sg", sky.uri()),
            None,
            std::time::Duration::from_secs(1),
        ))))
        .unwrap();

    let commands = Arc::new(CommandRegistry::with_builtin().unwrap());
    let delivery = test_delivery(&napcat);
    let mut dispatcher = CommandDispatcher::new(
        "#",
        commands,
        Arc::new(SettingsConfig::default()),
        delivery.clone(),
    );
    dispatcher
        .register(Arc::new(HeightHandler::new(
            "#",
            Arc::new(platforms),
            "yingtian",
            delivery,
        )))
        .unwrap();

    let message = group_message("#height yt abcd-efgh-1234");
    assert!(dispatcher.dispatch(&message).await.unwrap());
}
