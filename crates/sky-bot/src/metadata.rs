//! Command metadata: names, aliases and help text for every command.
//!
//! The registry is the single source of truth for command words. Dispatch
//! patterns and both help views are generated from it.

use crate::error::{AppError, AppResult};
use std::collections::HashMap;

/// Static description of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMetadata {
    pub name: &'static str,
    /// Short display name, used in status lines.
    pub title: &'static str,
    pub icon: &'static str,
    /// One-line description for the overview.
    pub description: &'static str,
    /// Longer description for the detail view.
    pub detailed: Option<&'static str>,
    pub aliases: &'static [&'static str],
    /// Argument lists shown after the prefix, e.g. `help height`.
    pub examples: &'static [&'static str],
    pub parameters: &'static [(&'static str, &'static str)],
    pub notes: &'static [&'static str],
    pub category: &'static str,
}

impl CommandMetadata {
    /// Name followed by aliases.
    pub fn words(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }
}

/// Registered command metadata, kept in registration order.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<CommandMetadata>,
    aliases: HashMap<&'static str, &'static str>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every built-in command.
    pub fn with_builtin() -> AppResult<Self> {
        let mut registry = Self::new();
        for metadata in builtin() {
            registry.register(metadata)?;
        }
        Ok(registry)
    }

    /// Register a command. Names must be unique and an alias may belong to
    /// only one command.
    pub fn register(&mut self, metadata: CommandMetadata) -> AppResult<()> {
        if self.get_by_name(metadata.name).is_some() {
            return Err(AppError::Registry(format!("命令名称冲突: {}", metadata.name)));
        }
        for alias in metadata.aliases {
            if let Some(other) = self.aliases.get(*alias) {
                return Err(AppError::Registry(format!(
                    "别名冲突: '{}' 同时用于 '{}' 和 '{}'",
                    alias, metadata.name, other
                )));
            }
        }

        for alias in metadata.aliases {
            self.aliases.insert(*alias, metadata.name);
        }
        self.commands.push(metadata);
        Ok(())
    }

    pub fn get_by_name(&self, name: &str) -> Option<&CommandMetadata> {
        self.commands.iter().find(|m| m.name == name)
    }

    pub fn get_by_alias(&self, alias: &str) -> Option<&CommandMetadata> {
        self.aliases
            .get(alias)
            .and_then(|name| self.get_by_name(name))
    }

    /// Name first, then alias.
    pub fn lookup(&self, word: &str) -> Option<&CommandMetadata> {
        self.get_by_name(word).or_else(|| self.get_by_alias(word))
    }

    pub fn all(&self) -> &[CommandMetadata] {
        &self.commands
    }

    /// Commands whose switch is on, in registration order.
    pub fn enabled<F>(&self, is_enabled: F) -> Vec<&CommandMetadata>
    where
        F: Fn(&str) -> bool,
    {
        self.commands.iter().filter(|m| is_enabled(m.name)).collect()
    }
}

/// Built-in commands in registration order.
pub fn builtin() -> Vec<CommandMetadata> {
    vec![
        CommandMetadata {
            name: "skytools",
            title: "帮助",
            icon: "ℹ️",
            description: "显示本帮助信息",
            detailed: Some("显示所有命令的概览帮助，或通过指定命令名查看该命令的详细说明。"),
            aliases: &["help"],
            examples: &["skytools", "help", "help height"],
            parameters: &[],
            notes: &[],
            category: "帮助",
        },
        CommandMetadata {
            name: "height",
            title: "身高查询",
            icon: "📏",
            description: "查询光遇国服玩家身高数据",
            detailed: Some(
                "通过游戏长ID或好友码查询玩家的详细身高数据，包括体型值(s值)、身高值(h值)、\
                 当前身高、最矮/最高身高、身高类型、距离最矮/最高差距等。支持多个查询平台。",
            ),
            aliases: &["身高"],
            examples: &[
                "height xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx",
                "height mango xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx",
                "height djs XXXX-XXXX-XXXX",
                "height yt xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx XXXX-XXXX-XXXX",
            ],
            parameters: &[
                ("[平台]", "可选，指定查询平台（mango/独角兽/应天等），不填则使用默认平台"),
                ("<游戏长ID>", "UUID格式的游戏ID，可通过游戏内设置→精灵询问获取"),
                ("[好友码]", "可选，格式为 XXXX-XXXX-XXXX，首次查询建议提供"),
            ],
            notes: &[
                "芒果平台必须提供游戏长ID，好友码可选",
                "独角兽平台提供游戏长ID或好友码任选其一",
                "应天平台必须提供游戏长ID，好友码可选",
                "首次查询请提供好友码",
                "请勿拉黑测身高好友，否则后续无法查询",
            ],
            category: "数据查询",
        },
        CommandMetadata {
            name: "task",
            title: "每日任务",
            icon: "🖼️",
            description: "获取光遇每日任务图片",
            detailed: Some("获取当天光遇每日任务的攻略图片，包含任务位置和完成方法。"),
            aliases: &["rw", "任务", "每日任务"],
            examples: &["task", "rw", "每日任务"],
            parameters: &[],
            notes: &[],
            category: "日常查询",
        },
        CommandMetadata {
            name: "candle",
            title: "大蜡烛",
            icon: "💎",
            description: "获取光遇大蜡烛位置图片",
            detailed: Some("获取当天光遇大蜡烛的刷新位置图片，包含多个地图的详细标记。"),
            aliases: &["dl", "大蜡", "大蜡烛"],
            examples: &["candle", "dl", "大蜡烛"],
            parameters: &[],
            notes: &[],
            category: "日常查询",
        },
        CommandMetadata {
            name: "ancestor",
            title: "复刻先祖",
            icon: "🧭",
            description: "获取光遇复刻先祖位置图片",
            detailed: Some("获取本周光遇复刻先祖的位置图片、可兑换物品及所需蜡烛信息。"),
            aliases: &["fk", "复刻", "先祖", "复刻先祖"],
            examples: &["ancestor", "fk", "复刻"],
            parameters: &[],
            notes: &[],
            category: "活动查询",
        },
        CommandMetadata {
            name: "magic",
            title: "每日魔法",
            icon: "🔮",
            description: "获取光遇每日魔法图片",
            detailed: Some("获取当天光遇魔法商店可兑换的魔法列表及所需蜡烛/爱心数量。"),
            aliases: &["mf", "魔法", "每日魔法"],
            examples: &["magic", "mf", "每日魔法"],
            parameters: &[],
            notes: &[],
            category: "日常查询",
        },
        CommandMetadata {
            name: "season_candle",
            title: "季节蜡烛",
            icon: "🕯️",
            description: "获取光遇每日季蜡位置图片",
            detailed: Some("获取当天光遇季节蜡烛的刷新位置图片，包含多个地图的详细标记。"),
            aliases: &["scandel", "jl", "季蜡", "季节蜡烛", "季蜡位置"],
            examples: &["scandel", "jl", "季蜡"],
            parameters: &[],
            notes: &[],
            category: "日常查询",
        },
        CommandMetadata {
            name: "calendar",
            title: "活动日历",
            icon: "📅",
            description: "获取光遇日历图片",
            detailed: Some(
                "获取光遇当前月份的活动日历图片，包含复刻、活动、季节结束时间等信息。",
            ),
            aliases: &["rl", "日历", "活动日历"],
            examples: &["calendar", "rl", "日历"],
            parameters: &[],
            notes: &[],
            category: "活动查询",
        },
        CommandMetadata {
            name: "redstone",
            title: "红石",
            icon: "🔴",
            description: "获取光遇红石位置图片",
            detailed: Some("获取当天光遇红石/黑石的坠落位置图片，包含具体地图和坐标。"),
            aliases: &["hs", "红石", "红石位置"],
            examples: &["redstone", "hs", "红石"],
            parameters: &[],
            notes: &[],
            category: "日常查询",
        },
        CommandMetadata {
            name: "skytest",
            title: "服务器状态",
            icon: "🔍",
            description: "查询光遇服务器状态",
            detailed: Some("检测光遇国服服务器是否正常运行，返回当前服务器状态信息。"),
            aliases: &[],
            examples: &["skytest"],
            parameters: &[],
            notes: &[],
            category: "实用工具",
        },
        CommandMetadata {
            name: "all",
            title: "一键汇总",
            icon: "📊",
            description: "一键获取所有光遇日常信息",
            detailed: Some(
                "一次性获取每日任务、季节蜡烛、大蜡烛、红石、复刻先祖、每日魔法、活动日历、\
                 服务器状态等所有信息，合并为一条转发消息发送。",
            ),
            aliases: &["所有", "全部", "汇总", "每日", "日常", "rc", "mr"],
            examples: &["all", "所有", "汇总"],
            parameters: &[],
            notes: &[
                "此命令会同时调用所有已启用的查询功能",
                "复刻信息的图片和文字会合并为一条消息发送",
                "未启用的功能会自动跳过",
            ],
            category: "日常查询",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(name: &'static str, aliases: &'static [&'static str]) -> CommandMetadata {
        CommandMetadata {
            name,
            title: name,
            icon: "•",
            description: "",
            detailed: None,
            aliases,
            examples: &[],
            parameters: &[],
            notes: &[],
            category: "测试",
        }
    }

    #[test]
    fn test_builtin_registers_cleanly() {
        let registry = CommandRegistry::with_builtin().unwrap();
        assert_eq!(registry.all().len(), 11);
        assert_eq!(registry.all()[0].name, "skytools");
        assert_eq!(registry.lookup("help").unwrap().name, "skytools");
        assert_eq!(registry.lookup("季蜡").unwrap().name, "season_candle");
        assert_eq!(registry.lookup("rc").unwrap().name, "all");
        assert!(registry.lookup("nope").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = CommandRegistry::new();
        registry.register(metadata("task", &["rw"])).unwrap();

        let err = registry.register(metadata("task", &[])).unwrap_err();
        assert!(err.to_string().contains("命令名称冲突"));
    }

    #[test]
    fn test_shared_alias_rejected() {
        let mut registry = CommandRegistry::new();
        registry.register(metadata("task", &["rw"])).unwrap();

        let err = registry.register(metadata("other", &["x", "rw"])).unwrap_err();
        assert!(err.to_string().contains("别名冲突"));
        // Nothing from the rejected command is kept.
        assert!(registry.get_by_alias("x").is_none());
        assert!(registry.get_by_name("other").is_none());
    }

    #[test]
    fn test_enabled_filter_keeps_order() {
        let registry = CommandRegistry::with_builtin().unwrap();
        let enabled: Vec<&str> = registry
            .enabled(|name| name != "magic" && name != "task")
            .iter()
            .map(|m| m.name)
            .collect();

        assert_eq!(enabled[..3], ["skytools", "height", "candle"]);
        assert!(!enabled.contains(&"magic"));
    }
}
