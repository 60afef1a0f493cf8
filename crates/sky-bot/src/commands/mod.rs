//! Bot command handlers.

mod all;
mod height;
mod help;
mod report;

pub use all::AllHandler;
pub use height::HeightHandler;
pub use help::HelpHandler;
pub use report::ReportHandler;

use crate::config::SettingsConfig;
use crate::delivery::Delivery;
use crate::error::{AppError, AppResult};
use crate::metadata::CommandRegistry;
use async_trait::async_trait;
use onebot_client::BotMessage;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

const COMMAND_FAILED: &str = "❌ 命令执行出错，请稍后重试";

/// Named captures taken from the argument part of a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs(HashMap<String, String>);

impl CommandArgs {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Command handler trait.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name, matching its metadata entry (e.g. "candle").
    fn name(&self) -> &str;

    /// Regex matched right after the command word. Named groups become
    /// [`CommandArgs`]. Commands without arguments leave it empty.
    fn args_pattern(&self) -> &str {
        ""
    }

    /// Execute the command. Replies are sent by the handler itself.
    async fn execute(&self, message: &BotMessage, args: &CommandArgs) -> AppResult<()>;
}

struct Route {
    handler: Arc<dyn CommandHandler>,
    pattern: Regex,
}

/// Matches incoming text against every registered command.
pub struct CommandDispatcher {
    prefix: String,
    commands: Arc<CommandRegistry>,
    settings: Arc<SettingsConfig>,
    delivery: Arc<Delivery>,
    routes: Vec<Route>,
}

/// `^{prefix}(?:word|word…){args}$`
pub fn command_pattern<'a>(
    prefix: &str,
    words: impl IntoIterator<Item = &'a str>,
    args: &str,
) -> Result<Regex, regex::Error> {
    let words: Vec<String> = words.into_iter().map(regex::escape).collect();
    Regex::new(&format!(
        "^{}(?:{}){}$",
        regex::escape(prefix),
        words.join("|"),
        args
    ))
}

impl CommandDispatcher {
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
            routes: Vec::new(),
        }
    }

    /// Add a handler. Its command words come from the metadata registry.
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) -> AppResult<()> {
        let metadata = self.commands.get_by_name(handler.name()).ok_or_else(|| {
            AppError::Registry(format!("no metadata for command {}", handler.name()))
        })?;

        let pattern = command_pattern(&self.prefix, metadata.words(), handler.args_pattern())
            .map_err(|e| AppError::Registry(format!("bad pattern for {}: {}", metadata.name, e)))?;

        debug!("Registered {} as {}", metadata.name, pattern);
        self.routes.push(Route { handler, pattern });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the handler for `text` and extract its arguments.
    pub fn route(&self, text: &str) -> Option<(Arc<dyn CommandHandler>, CommandArgs)> {
        let text = text.trim();
        self.routes.iter().find_map(|route| {
            let captures = route.pattern.captures(text)?;
            let args = route
                .pattern
                .capture_names()
                .flatten()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|m| (name.to_string(), m.as_str().to_string()))
                })
                .collect();
            Some((route.handler.clone(), CommandArgs(args)))
        })
    }

    /// Run the command in `message`, if any. Returns whether a command matched.
    pub async fn dispatch(&self, message: &BotMessage) -> AppResult<bool> {
        let Some((handler, args)) = self.route(&message.text) else {
            return Ok(false);
        };

        let name = handler.name();
        if !self.settings.is_enabled(name) {
            let title = self.commands.get_by_name(name).map_or(name, |m| m.title);
            self.delivery
                .send_text(message, &format!("❌ {}查询功能未启用", title))
                .await;
            return Ok(true);
        }

        info!(command = name, user = message.user_id, "Running command");
        handler.execute(message, &args).await?;
        Ok(true)
    }

    /// Like [`dispatch`](Self::dispatch), but reports failures to the chat.
    pub async fn handle(&self, message: &BotMessage) {
        if let Err(e) = self.dispatch(message).await {
            error!("Handler error: {}", e);
            self.delivery.send_text(message, COMMAND_FAILED).await;
        }
    }
}
