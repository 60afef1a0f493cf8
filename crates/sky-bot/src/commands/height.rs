//! Height command - player height lookup across platforms.

use crate::commands::{CommandArgs, CommandHandler};
use crate::delivery::Delivery;
use crate::error::AppResult;
use async_trait::async_trait;
use onebot_client::BotMessage;
use sky_api::{HeightPlatform, PlatformRegistry};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct HeightHandler {
    prefix: String,
    platforms: Arc<PlatformRegistry>,
    default_platform: String,
    delivery: Arc<Delivery>,
}

impl HeightHandler {
    pub fn new(
        prefix: impl Into<String>,
        platforms: Arc<PlatformRegistry>,
        default_platform: impl Into<String>,
        delivery: Arc<Delivery>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            platforms,
            default_platform: default_platform.into(),
            delivery,
        }
    }

    fn enabled_platforms(&self) -> Vec<Arc<dyn HeightPlatform>> {
        self.platforms
            .enabled_names()
            .into_iter()
            .filter_map(|name| self.platforms.get(name))
            .collect()
    }

    /// Usage text listing only the enabled platforms.
    pub fn help_text(&self) -> String {
        let prefix = &self.prefix;
        let platforms = self.enabled_platforms();

        let mut lines = vec![
            "📏 身高查询使用说明".to_string(),
            String::new(),
            "使用方法（两种格式）:".to_string(),
            format!("  1. 使用默认平台(当前默认:{}):", self.default_platform),
            format!("     {}height <游戏长ID> [好友码]", prefix),
            "  2. 指定平台:".to_string(),
            format!("     {}height <平台名> <游戏长ID> [好友码]", prefix),
            String::new(),
            "参数说明:".to_string(),
            "• 平台名: 支持以下平台和别名".to_string(),
        ];

        for platform in &platforms {
            let aliases = self.platforms.aliases_of(platform.name());
            let aliases = if aliases.is_empty() {
                "无".to_string()
            } else {
                aliases.join(", ")
            };
            lines.push(format!("  • {} (别名: {}) - ✅ 启用", platform.name(), aliases));
        }

        lines.extend([
            "• 游戏长ID: UUID格式的游戏ID".to_string(),
            "• 好友码: 可选的好友码参数".to_string(),
            String::new(),
            "平台要求:".to_string(),
        ]);
        for platform in &platforms {
            lines.push(format!("• {}: {}", platform.label(), platform.requirement()));
        }

        lines.extend([
            String::new(),
            "获取方式:".to_string(),
            "• 长ID: 游戏右上角设置→精灵→询问'长id'".to_string(),
            "• 好友码: 游戏右上角设置→好友→使用编号→设置昵称后获取".to_string(),
            String::new(),
            "示例:".to_string(),
        ]);
        for platform in &platforms {
            lines.push(format!("{}:", platform.label()));
            for example in platform.examples() {
                lines.push(format!("{}height {}", prefix, example));
            }
            lines.push(String::new());
        }

        lines.extend([
            "注意:".to_string(),
            "• 首次查询请提供好友码".to_string(),
            "• 请勿拉黑测身高好友，否则后续无法查询".to_string(),
        ]);
        lines.join("\n")
    }

    /// Reply for a lookup the platform has no record of.
    pub fn record_not_found(&self, platform: &str) -> String {
        [
            format!("❌ 在 **{}** 平台未找到该玩家的身高记录。", platform),
            String::new(),
            "📌 **首次查询请务必提供好友码**".to_string(),
            format!("   格式：`{}height <游戏ID> <好友码>`", self.prefix),
            String::new(),
            "🔗 **好友码获取方法**".to_string(),
            "   游戏设置 → 好友 → 使用编号 → 设置昵称后获取".to_string(),
            "   格式示例：`1234-5678-9012`".to_string(),
            String::new(),
            "💡 **为什么需要好友码？**".to_string(),
            "   好友码用于将游戏ID与你的查询绑定，".to_string(),
            "   首次提供后，后续可直接使用游戏ID查询。".to_string(),
            String::new(),
            "⚠️ **注意**：请勿拉黑测身高好友，否则后续无法查询。".to_string(),
        ]
        .join("\n")
    }
}

#[async_trait]
impl CommandHandler for HeightHandler {
    fn name(&self) -> &str {
        "height"
    }

    fn args_pattern(&self) -> &str {
        r"(?:\s+(?P<platform>\w+))?(?:\s+(?P<game_id>\S+)(?:\s+(?P<friend_code>\S+))?)?"
    }

    async fn execute(&self, message: &BotMessage, args: &CommandArgs) -> AppResult<()> {
        let game_id = match args.get("game_id") {
            Some(id) if !id.eq_ignore_ascii_case("help") => id,
            _ => {
                self.delivery.send_text(message, &self.help_text()).await;
                return Ok(());
            }
        };

        if self.platforms.enabled_names().is_empty() {
            self.delivery
                .send_text(message, "❌ 所有身高查询平台都未启用，请联系管理员启用")
                .await;
            return Ok(());
        }

        let Some(platform) = self
            .platforms
            .resolve(args.get("platform"), &self.default_platform)
        else {
            self.delivery
                .send_text(message, "❌ 平台名称错误或该平台未启用")
                .await;
            return Ok(());
        };

        let query = match platform.validate(Some(game_id), args.get("friend_code")) {
            Ok(query) => query,
            Err(e) => {
                self.delivery.send_text(message, &e.user_message()).await;
                return Ok(());
            }
        };

        if !platform.endpoint().is_configured() {
            self.delivery
                .send_text(
                    message,
                    &format!("❌ 插件未配置 {} 平台 API 密钥", platform.name()),
                )
                .await;
            return Ok(());
        }

        let reply = match platform.query(&query).await {
            Ok(report) => {
                info!(platform = platform.name(), "Height lookup succeeded");
                report
            }
            Err(e) if e.is_record_not_found() => self.record_not_found(platform.name()),
            Err(e) => {
                warn!(platform = platform.name(), "Height lookup failed: {}", e);
                e.user_message()
            }
        };

        if !self.delivery.send_forward_single(message, &reply).await {
            error!(platform = platform.name(), "Height result could not be delivered");
        }
        Ok(())
    }
}
