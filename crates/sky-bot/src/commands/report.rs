//! Daily report commands (task, candles, magic, calendar, red stone,
//! ancestor, server status).

use crate::commands::{CommandArgs, CommandHandler};
use crate::delivery::Delivery;
use crate::error::AppResult;
use crate::reports::{Report, ReportKind, ReportSources};
use async_trait::async_trait;
use onebot_client::{BotMessage, ForwardItem, ForwardOptions, Segment};
use sky_api::SkyApiError;
use std::sync::Arc;
use tracing::{error, warn};

const IMAGE_SEND_FAILED: &str = "❌ 发送图片失败";

pub struct ReportHandler {
    kind: ReportKind,
    sources: Arc<ReportSources>,
    delivery: Arc<Delivery>,
}

impl ReportHandler {
    pub fn new(kind: ReportKind, sources: Arc<ReportSources>, delivery: Arc<Delivery>) -> Self {
        Self {
            kind,
            sources,
            delivery,
        }
    }

    /// One handler per report kind.
    pub fn all(sources: &Arc<ReportSources>, delivery: &Arc<Delivery>) -> Vec<Self> {
        ReportKind::ALL
            .into_iter()
            .map(|kind| Self::new(kind, sources.clone(), delivery.clone()))
            .collect()
    }

    async fn deliver(&self, message: &BotMessage, item: ForwardItem) -> bool {
        let delivered = self
            .delivery
            .send_forward(message, &[item], ForwardOptions::default())
            .await;
        if !delivered {
            error!(report = self.kind.name(), "Report could not be delivered");
        }
        delivered
    }
}

#[async_trait]
impl CommandHandler for ReportHandler {
    fn name(&self) -> &str {
        self.kind.name()
    }

    async fn execute(&self, message: &BotMessage, _args: &CommandArgs) -> AppResult<()> {
        if !self.sources.is_configured(self.kind) {
            let name = self
                .sources
                .endpoint(self.kind)
                .map_or(self.kind.name(), |e| e.name.as_str());
            let reply = SkyApiError::NotConfigured(name.to_string()).user_message();
            self.delivery.send_text(message, &reply).await;
            return Ok(());
        }

        if let Some(progress) = self.kind.progress() {
            self.delivery.send_text(message, progress).await;
        }

        match self.sources.fetch(self.kind).await {
            Ok(Report::Image(image)) => {
                let item = ForwardItem::Single(Segment::image(image.as_str()));
                if !self.deliver(message, item).await {
                    self.delivery.send_text(message, IMAGE_SEND_FAILED).await;
                }
            }
            Ok(Report::Ancestor(info)) => {
                let mut segments = Vec::new();
                if let Some(image) = &info.image {
                    segments.push(Segment::image(image.as_str()));
                }
                if !info.text.trim().is_empty() {
                    segments.push(Segment::text(info.text));
                }

                if segments.is_empty() {
                    self.delivery
                        .send_text(message, "❌ 未找到复刻先祖信息")
                        .await;
                } else if !self.deliver(message, ForwardItem::Node(segments)).await {
                    self.delivery.send_text(message, IMAGE_SEND_FAILED).await;
                }
            }
            Ok(Report::Status(status)) => {
                self.deliver(message, ForwardItem::Single(Segment::text(status)))
                    .await;
            }
            Err(e) => {
                warn!(report = self.kind.name(), "Fetch failed: {}", e);
                self.deliver(message, ForwardItem::Single(Segment::text(e.user_message())))
                    .await;
            }
        }
        Ok(())
    }
}
