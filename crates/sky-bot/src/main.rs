//! Sky Tools Bot - Main entry point.

use anyhow::Context;
use onebot_client::{MessageReceiver, NodeSender, OneBotClient};
use sky_api::height::{parse_alias_spec, MangoPlatform, OvoavPlatform, YingtianPlatform};
use sky_api::{Endpoint, HeightPlatform, PlatformRegistry, SkyApiClient};
use sky_bot::commands::*;
use sky_bot::config::{Config, HeightConfig};
use sky_bot::delivery::Delivery;
use sky_bot::error::AppResult;
use sky_bot::metadata::CommandRegistry;
use sky_bot::reports::ReportSources;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_NICKNAME: &str = "光遇小助手";

const MANGO_URL: &str = "https://api.mangotool.cn/sky/out/cn";
const OVOAV_URL: &str = "https://ovoav.com/api/sky/sgwz/sgv1";
const YINGTIAN_URL: &str = "https://api.t1qq.com/api/sky/sc/sg";

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.bot.log_level, config.bot.log_json);

    info!("Starting Sky Tools Bot...");

    let onebot = OneBotClient::new(
        &config.onebot.api_url,
        config.onebot.token.clone(),
        config.onebot.timeout,
    )
    .context("Failed to create OneBot client")?;

    if !onebot.health_check().await {
        error!("OneBot API not reachable at {}", config.onebot.api_url);
        return Err(anyhow::anyhow!("OneBot API not reachable").into());
    }
    info!("OneBot API healthy");

    let sender = resolve_identity(&onebot, &config).await;
    match &sender {
        Some(sender) => info!("Forward nodes authored as {} ({})", sender.nickname, sender.user_id),
        None => warn!("Bot identity unknown - replies will be sent without forwarding"),
    }

    let commands = Arc::new(CommandRegistry::with_builtin()?);
    let settings = Arc::new(config.settings.clone());
    let delivery = Arc::new(Delivery::new(
        onebot,
        config.onebot.forward_enabled,
        sender,
    ));

    let sky = SkyApiClient::new();
    let sources = Arc::new(ReportSources::from_config(sky, &config.apis, &commands));
    let platforms = Arc::new(build_platforms(&config.height)?);
    info!("Height platforms enabled: {:?}", platforms.enabled_names());

    // Create command handlers
    let prefix = config.bot.command_prefix.clone();
    let mut dispatcher = CommandDispatcher::new(
        prefix.clone(),
        commands.clone(),
        settings.clone(),
        delivery.clone(),
    );

    dispatcher.register(Arc::new(HelpHandler::new(
        prefix.clone(),
        commands.clone(),
        settings.clone(),
        delivery.clone(),
    )))?;
    dispatcher.register(Arc::new(HeightHandler::new(
        prefix.clone(),
        platforms.clone(),
        config.height.default_platform.clone(),
        delivery.clone(),
    )))?;
    for handler in ReportHandler::all(&sources, &delivery) {
        dispatcher.register(Arc::new(handler))?;
    }
    dispatcher.register(Arc::new(AllHandler::new(
        commands.clone(),
        settings.clone(),
        sources.clone(),
        delivery.clone(),
    )))?;

    info!("Registered {} command handlers", dispatcher.len());
    let dispatcher = Arc::new(dispatcher);

    // Start message receiver
    let listen_addr: SocketAddr = config
        .onebot
        .listen_addr
        .parse()
        .context("Invalid onebot.listen_addr")?;
    let receiver = MessageReceiver::new(listen_addr);
    let mut stream = Box::pin(receiver.stream().await?);
    info!("Listening for messages...");

    // Main message loop
    loop {
        tokio::select! {
            Some(message) = stream.next() => {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher.handle(&message).await;
                });
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Shutting down...");
    Ok(())
}

/// Node author for forward bundles: configured values first, then NapCat.
async fn resolve_identity(onebot: &OneBotClient, config: &Config) -> Option<NodeSender> {
    let nickname = config.bot.nickname.clone();

    if let Some(user_id) = config.bot.self_id {
        return Some(NodeSender {
            user_id,
            nickname: nickname.unwrap_or_else(|| DEFAULT_NICKNAME.into()),
        });
    }

    match onebot.get_login_info().await {
        Ok(info) => Some(NodeSender {
            user_id: info.user_id,
            nickname: nickname.unwrap_or(info.nickname),
        }),
        Err(e) => {
            warn!("Failed to fetch login info: {}", e);
            None
        }
    }
}

fn build_platforms(config: &HeightConfig) -> AppResult<PlatformRegistry> {
    let mut registry = PlatformRegistry::new();

    let platforms: [Arc<dyn HeightPlatform>; 3] = [
        Arc::new(MangoPlatform::new(platform_endpoint(config, "mango", MANGO_URL))),
        Arc::new(OvoavPlatform::new(platform_endpoint(config, "ovoav", OVOAV_URL))),
        Arc::new(YingtianPlatform::new(platform_endpoint(config, "yingtian", YINGTIAN_URL))),
    ];
    for platform in platforms {
        registry.register(platform)?;
    }

    for name in ["mango", "ovoav", "yingtian"] {
        if !config.platform(name).map_or(true, |p| p.enabled) {
            registry.disable(name);
        }
    }

    for spec in &config.platform_aliases {
        match parse_alias_spec(spec) {
            Some((name, aliases)) => {
                for alias in aliases {
                    if !registry.add_alias(&name, &alias) {
                        warn!("Ignoring alias {} for {}", alias, name);
                    }
                }
            }
            None => warn!("Ignoring malformed platform alias entry: {}", spec),
        }
    }

    if registry.enabled_names().is_empty() {
        warn!("All height platforms are disabled");
    }
    if !registry.is_enabled(&config.default_platform) {
        warn!(
            "Default platform {} is unknown or disabled",
            config.default_platform
        );
    }

    Ok(registry)
}

fn platform_endpoint(config: &HeightConfig, name: &str, default_url: &str) -> Endpoint {
    let section = config.platform(name);
    let url = section
        .and_then(|p| p.url.clone())
        .unwrap_or_else(|| default_url.to_string());
    let key = section.and_then(|p| p.key.clone());

    Endpoint::new(name, url, key, config.timeout)
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
