//! Daily information reports and the endpoints that serve them.

use crate::config::ApisConfig;
use crate::metadata::CommandRegistry;
use sky_api::{AncestorInfo, Endpoint, ImageData, SkyApiClient, SkyApiError};
use std::collections::HashMap;
use tracing::instrument;

/// A daily report command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Task,
    SeasonCandle,
    Candle,
    Redstone,
    Ancestor,
    Magic,
    Calendar,
    SkyTest,
}

impl ReportKind {
    /// Every report, in summary order.
    pub const ALL: [ReportKind; 8] = [
        ReportKind::Task,
        ReportKind::SeasonCandle,
        ReportKind::Candle,
        ReportKind::Redstone,
        ReportKind::Ancestor,
        ReportKind::Magic,
        ReportKind::Calendar,
        ReportKind::SkyTest,
    ];

    /// Command name, also the config section under `apis`.
    pub fn name(self) -> &'static str {
        match self {
            ReportKind::Task => "task",
            ReportKind::SeasonCandle => "season_candle",
            ReportKind::Candle => "candle",
            ReportKind::Redstone => "redstone",
            ReportKind::Ancestor => "ancestor",
            ReportKind::Magic => "magic",
            ReportKind::Calendar => "calendar",
            ReportKind::SkyTest => "skytest",
        }
    }

    pub fn default_url(self) -> &'static str {
        match self {
            ReportKind::Task => "https://ovoav.com/api/sky/rwtp/rwt",
            ReportKind::SeasonCandle => "https://ovoav.com/api/sky/jlwz/jl",
            ReportKind::Candle => "https://ovoav.com/api/sky/dlzwz/dl",
            ReportKind::Redstone => "https://ovoav.com/api/sky/hstp/hs",
            ReportKind::Ancestor => "https://ovoav.com/api/sky/fkxz/xz",
            ReportKind::Magic => "https://ovoav.com/api/sky/mftp/mf",
            ReportKind::Calendar => "https://ovoav.com/api/sky/rltp/rl",
            ReportKind::SkyTest => "https://ovoav.com/api/sky/gyzt/zt",
        }
    }

    /// Icon shown before the report title in the summary bundle.
    pub fn summary_icon(self) -> &'static str {
        match self {
            ReportKind::Task => "📋",
            ReportKind::SeasonCandle => "🕯️",
            ReportKind::Candle => "💎",
            ReportKind::Redstone => "🔴",
            ReportKind::Ancestor => "🧭",
            ReportKind::Magic => "🔮",
            ReportKind::Calendar => "🗓️",
            ReportKind::SkyTest => "🔍",
        }
    }

    /// Text sent while the report is fetched.
    pub fn progress(self) -> Option<&'static str> {
        match self {
            ReportKind::Task => Some("🔄 正在获取每日任务..."),
            ReportKind::SeasonCandle => Some("🔄 正在获取季节蜡烛位置..."),
            ReportKind::Candle => Some("🔄 正在获取大蜡烛位置..."),
            ReportKind::Redstone => Some("🔄 正在获取红石位置..."),
            ReportKind::Ancestor => Some("🔄 正在获取复刻先祖信息..."),
            ReportKind::Magic => Some("🔄 正在获取每日魔法..."),
            ReportKind::Calendar => Some("🔄 正在获取光遇日历..."),
            ReportKind::SkyTest => None,
        }
    }
}

/// A fetched report.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Image(ImageData),
    Ancestor(AncestorInfo),
    Status(String),
}

/// Endpoints for every configured report.
pub struct ReportSources {
    client: SkyApiClient,
    endpoints: HashMap<ReportKind, Endpoint>,
}

impl ReportSources {
    pub fn new(client: SkyApiClient) -> Self {
        Self {
            client,
            endpoints: HashMap::new(),
        }
    }

    /// Build endpoints from the `apis` config section. Endpoint names are the
    /// command titles so error messages read naturally.
    pub fn from_config(client: SkyApiClient, apis: &ApisConfig, commands: &CommandRegistry) -> Self {
        let mut sources = Self::new(client);

        for kind in ReportKind::ALL {
            let Some(section) = apis.endpoint(kind.name()) else {
                continue;
            };
            let title = commands
                .get_by_name(kind.name())
                .map_or(kind.name(), |m| m.title);
            let url = section
                .url
                .clone()
                .unwrap_or_else(|| kind.default_url().to_string());

            sources.insert(
                kind,
                Endpoint::new(title, url, section.key.clone(), section.timeout),
            );
        }
        sources
    }

    pub fn insert(&mut self, kind: ReportKind, endpoint: Endpoint) {
        self.endpoints.insert(kind, endpoint);
    }

    pub fn endpoint(&self, kind: ReportKind) -> Option<&Endpoint> {
        self.endpoints.get(&kind)
    }

    /// Whether the report has an endpoint with a usable key.
    pub fn is_configured(&self, kind: ReportKind) -> bool {
        self.endpoint(kind).is_some_and(Endpoint::is_configured)
    }

    #[instrument(skip(self))]
    pub async fn fetch(&self, kind: ReportKind) -> Result<Report, SkyApiError> {
        let endpoint = self
            .endpoint(kind)
            .ok_or_else(|| SkyApiError::NotConfigured(kind.name().to_string()))?;

        match kind {
            ReportKind::Ancestor => self.client.fetch_ancestor(endpoint).await.map(Report::Ancestor),
            ReportKind::SkyTest => self
                .client
                .fetch_server_status(endpoint)
                .await
                .map(Report::Status),
            _ => self
                .client
                .fetch_daily_image(endpoint)
                .await
                .map(Report::Image),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_from_config_uses_titles_and_defaults() {
        let config = Config::from_toml(
            r#"
            [apis.candle]
            key = "candle-key"

            [apis.magic]
            url = "http://localhost/mf"
            key = "你的每日魔法API密钥"
            "#,
        )
        .unwrap();
        let commands = CommandRegistry::with_builtin().unwrap();
        let sources = ReportSources::from_config(SkyApiClient::new(), &config.apis, &commands);

        let candle = sources.endpoint(ReportKind::Candle).unwrap();
        assert_eq!(candle.name, "大蜡烛");
        assert_eq!(candle.url, "https://ovoav.com/api/sky/dlzwz/dl");
        assert!(sources.is_configured(ReportKind::Candle));

        let magic = sources.endpoint(ReportKind::Magic).unwrap();
        assert_eq!(magic.url, "http://localhost/mf");
        assert!(!sources.is_configured(ReportKind::Magic));
        assert!(!sources.is_configured(ReportKind::Task));
    }

    #[tokio::test]
    async fn test_fetch_without_endpoint() {
        let sources = ReportSources::new(SkyApiClient::new());
        let err = sources.fetch(ReportKind::Calendar).await.unwrap_err();
        assert!(matches!(err, SkyApiError::NotConfigured(_)));
    }
}
