//! Help command - command overview and per-command details.

use crate::commands::{CommandArgs, CommandHandler};
use crate::config::SettingsConfig;
use crate::delivery::Delivery;
use crate::error::AppResult;
use crate::metadata::{CommandMetadata, CommandRegistry};
use async_trait::async_trait;
use onebot_client::BotMessage;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━";

pub struct HelpHandler {
    prefix: String,
    commands: Arc<CommandRegistry>,
    settings: Arc<SettingsConfig>,
    delivery: Arc<Delivery>,
}

impl HelpHandler {
    pub fn new(
        prefix: impl Into<String>,
        commands: Arc<CommandRegistry>,
        settings: Arc<SettingsConfig>,
        delivery: Arc<Delivery>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            commands,
            settings,
            delivery,
        }
    }

    /// Configured display order first, then everything else in registration
    /// order. The help command only shows up when listed explicitly.
    pub fn overview(&self) -> String {
        let enabled = self.commands.enabled(|name| self.settings.is_enabled(name));
        let mut shown = HashSet::new();
        let mut lines = vec![
            "✨ 光遇工具插件使用说明 ✨".to_string(),
            String::new(),
            "📋 可用命令:".to_string(),
        ];

        for name in &self.settings.display_order {
            if let Some(metadata) = enabled.iter().find(|m| m.name == name.as_str()) {
                if shown.insert(metadata.name) {
                    self.push_overview_entry(&mut lines, metadata);
                }
            }
        }

        for metadata in &enabled {
            if metadata.name != self.name() && shown.insert(metadata.name) {
                self.push_overview_entry(&mut lines, metadata);
            }
        }

        lines.push("💡 提示: 部分功能可能已被管理员禁用".to_string());
        lines.join("\n")
    }

    fn push_overview_entry(&self, lines: &mut Vec<String>, metadata: &CommandMetadata) {
        let words: Vec<String> = metadata
            .words()
            .map(|word| format!("{}{}", self.prefix, word))
            .collect();

        lines.push(format!("{} {}", metadata.icon, words.join(" 或 ")));
        lines.push(format!("   → {}", metadata.description));
        lines.push(String::new());
    }

    /// Detailed help for one command, looked up by name or alias.
    pub fn detail(&self, word: &str) -> String {
        let Some(metadata) = self.commands.lookup(word) else {
            return format!("❌ 未找到命令 `{}`", word);
        };
        if !self.settings.is_enabled(metadata.name) {
            return format!("❌ 命令 `{}` 当前已被管理员禁用", metadata.name);
        }

        let prefix = &self.prefix;
        let mut lines = vec![
            format!("📘 **{}{}** 命令详解", prefix, metadata.name),
            RULE.to_string(),
            String::new(),
            metadata.detailed.unwrap_or(metadata.description).to_string(),
            String::new(),
        ];

        if !metadata.examples.is_empty() {
            lines.push("**📌 使用示例**".to_string());
            lines.extend(
                metadata
                    .examples
                    .iter()
                    .map(|example| format!("  `{}{}`", prefix, example)),
            );
            lines.push(String::new());
        }

        if !metadata.parameters.is_empty() {
            lines.push("**🔧 参数说明**".to_string());
            lines.extend(
                metadata
                    .parameters
                    .iter()
                    .map(|(param, desc)| format!("  • `{}`: {}", param, desc)),
            );
            lines.push(String::new());
        }

        if !metadata.aliases.is_empty() {
            let aliases: Vec<String> = metadata
                .aliases
                .iter()
                .map(|alias| format!("`{}{}`", prefix, alias))
                .collect();
            lines.push(format!("**🔖 别名**：{}", aliases.join(", ")));
            lines.push(String::new());
        }

        if !metadata.notes.is_empty() {
            lines.push("**⚠️ 注意事项**".to_string());
            lines.extend(metadata.notes.iter().map(|note| format!("  • {}", note)));
            lines.push(String::new());
        }

        lines.push(RULE.to_string());
        lines.join("\n")
    }
}

#[async_trait]
impl CommandHandler for HelpHandler {
    fn name(&self) -> &str {
        "skytools"
    }

    fn args_pattern(&self) -> &str {
        r"(?:\s+(?P<command_name>\S+))?"
    }

    async fn execute(&self, message: &BotMessage, args: &CommandArgs) -> AppResult<()> {
        let text = match args.get("command_name") {
            Some(word) => self.detail(word),
            None => self.overview(),
        };

        if !self.delivery.send_forward_single(message, &text).await {
            warn!("Help text could not be delivered");
        }
        Ok(())
    }
}
