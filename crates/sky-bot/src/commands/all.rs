//! All command - every enabled daily report in one forward bundle.

use crate::commands::{CommandArgs, CommandHandler};
use crate::config::SettingsConfig;
use crate::delivery::Delivery;
use crate::error::AppResult;
use crate::metadata::CommandRegistry;
use crate::reports::{Report, ReportKind, ReportSources};
use async_trait::async_trait;
use futures::future::join_all;
use onebot_client::{BotMessage, ForwardItem, ForwardOptions, Segment};
use sky_api::SkyApiError;
use std::sync::Arc;
use tracing::{error, info};

const PROMPT: &str = "光遇日常信息汇总";
const SEND_FAILED: &str = "❌ 发送失败，请稍后重试";

pub struct AllHandler {
    commands: Arc<CommandRegistry>,
    settings: Arc<SettingsConfig>,
    sources: Arc<ReportSources>,
    delivery: Arc<Delivery>,
}

impl AllHandler {
    pub fn new(
        commands: Arc<CommandRegistry>,
        settings: Arc<SettingsConfig>,
        sources: Arc<ReportSources>,
        delivery: Arc<Delivery>,
    ) -> Self {
        Self {
            commands,
            settings,
            sources,
            delivery,
        }
    }

    /// `"{icon} {title}"` for a report.
    fn heading(&self, kind: ReportKind) -> String {
        let title = self
            .commands
            .get_by_name(kind.name())
            .map_or(kind.name(), |metadata| metadata.title);
        format!("{} {}", kind.summary_icon(), title)
    }

    /// Turn one fetch result into a bundle entry.
    pub fn summary_item(&self, kind: ReportKind, result: Result<Report, SkyApiError>) -> ForwardItem {
        let heading = self.heading(kind);

        match result {
            Ok(Report::Ancestor(info)) => {
                let mut segments = vec![Segment::text(heading.clone())];
                if let Some(image) = &info.image {
                    segments.push(Segment::image(image.as_str()));
                }
                if !info.text.trim().is_empty() {
                    segments.push(Segment::text(info.text));
                }

                if segments.len() > 1 {
                    ForwardItem::Node(segments)
                } else {
                    ForwardItem::Single(Segment::text(format!("{}: 无数据", heading)))
                }
            }
            Ok(Report::Status(status)) => {
                ForwardItem::Single(Segment::text(format!("{}\n{}", heading, status)))
            }
            Ok(Report::Image(image)) => {
                ForwardItem::Node(vec![Segment::text(heading), Segment::image(image.as_str())])
            }
            Err(e) => {
                let reason = e.user_message();
                let reason = reason.trim_start_matches("❌ ");
                ForwardItem::Single(Segment::text(format!("{}: ❌ {}", heading, reason)))
            }
        }
    }
}

#[async_trait]
impl CommandHandler for AllHandler {
    fn name(&self) -> &str {
        "all"
    }

    async fn execute(&self, message: &BotMessage, _args: &CommandArgs) -> AppResult<()> {
        let kinds: Vec<ReportKind> = ReportKind::ALL
            .into_iter()
            .filter(|kind| self.settings.is_enabled(kind.name()))
            .collect();

        if kinds.is_empty() {
            self.delivery
                .send_text(message, "❌ 所有查询功能均未启用，无法执行一键查询")
                .await;
            return Ok(());
        }

        self.delivery
            .send_text(message, "🔄 正在获取所有信息，请稍候...")
            .await;

        let results = join_all(kinds.iter().map(|kind| self.sources.fetch(*kind))).await;
        let items: Vec<ForwardItem> = kinds
            .iter()
            .zip(results)
            .map(|(kind, result)| self.summary_item(*kind, result))
            .collect();

        info!("Collected {} summary entries", items.len());
        let options = ForwardOptions::default()
            .prompt(PROMPT)
            .summary(format!("共 {} 条消息", items.len()));

        if !self.delivery.send_forward(message, &items, options).await {
            error!("Summary could not be delivered");
            self.delivery.send_text(message, SEND_FAILED).await;
        }
        Ok(())
    }
}
