//! Merged-forward message assembly.
//!
//! A forward bundle is a list of nodes, each authored by the bot and holding
//! one or more segments. [`ForwardItem::Single`] produces a node with one
//! segment; [`ForwardItem::Node`] merges several segments into one node.

use crate::types::Segment;
use serde::Serialize;

const DEFAULT_PROMPT: &str = "群聊的聊天记录";
const DEFAULT_SOURCE: &str = "群聊的聊天记录";
const MAX_NEWS_PREVIEWS: usize = 4;
const MAX_PREVIEW_CHARS: usize = 50;

/// Raw base64 prefixes of common image formats (JPEG, PNG, GIF, PNG text, SVG).
const BASE64_IMAGE_PREFIXES: [&str; 5] = ["/9j/", "iVBORw", "R0lGOD", "UE5HDQ", "PHN2Zy"];

/// One entry of a forward bundle before node assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardItem {
    Single(Segment),
    Node(Vec<Segment>),
}

impl ForwardItem {
    /// Text or image, decided by [`is_image_data`]. Blank text yields `None`.
    pub fn detect(value: impl Into<String>) -> Option<Self> {
        Segment::detect(value).map(ForwardItem::Single)
    }

    /// Merge several strings into a single node, dropping blank entries.
    pub fn merged<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ForwardItem::Node(
            values
                .into_iter()
                .filter_map(|value| Segment::detect(value))
                .collect(),
        )
    }

    pub fn segments(&self) -> &[Segment] {
        match self {
            ForwardItem::Single(segment) => std::slice::from_ref(segment),
            ForwardItem::Node(segments) => segments,
        }
    }
}

/// Author shown on every node of a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSender {
    pub user_id: i64,
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ForwardNode {
    Node {
        user_id: i64,
        nickname: String,
        content: Vec<Segment>,
    },
}

impl ForwardNode {
    pub fn content(&self) -> &[Segment] {
        match self {
            ForwardNode::Node { content, .. } => content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsItem {
    pub text: String,
}

/// Optional header fields of a bundle.
#[derive(Debug, Clone, Default)]
pub struct ForwardOptions {
    pub prompt: Option<String>,
    pub summary: Option<String>,
    pub source: Option<String>,
}

impl ForwardOptions {
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Body of `send_forward_msg`, minus the target.
#[derive(Debug, Clone, Serialize)]
pub struct ForwardPayload {
    pub messages: Vec<ForwardNode>,
    pub news: Vec<NewsItem>,
    pub prompt: String,
    pub summary: String,
    pub source: String,
}

impl ForwardPayload {
    /// Assemble nodes and header fields. Items without content are skipped.
    pub fn build(items: &[ForwardItem], sender: &NodeSender, options: ForwardOptions) -> Self {
        let messages: Vec<ForwardNode> = items
            .iter()
            .filter(|item| !item.segments().is_empty())
            .map(|item| ForwardNode::Node {
                user_id: sender.user_id,
                nickname: sender.nickname.clone(),
                content: item.segments().to_vec(),
            })
            .collect();

        let news = build_news(&messages, &sender.nickname);
        let summary = options
            .summary
            .unwrap_or_else(|| format!("查看{}条转发消息", messages.len()));

        Self {
            news,
            prompt: options.prompt.unwrap_or_else(|| DEFAULT_PROMPT.into()),
            summary,
            source: options.source.unwrap_or_else(|| DEFAULT_SOURCE.into()),
            messages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Preview lines shown on the collapsed bundle.
pub fn build_news(nodes: &[ForwardNode], nickname: &str) -> Vec<NewsItem> {
    let mut news: Vec<NewsItem> = nodes
        .iter()
        .take(MAX_NEWS_PREVIEWS)
        .enumerate()
        .map(|(index, node)| {
            let preview: String = node
                .content()
                .iter()
                .filter_map(|segment| match segment {
                    Segment::Text { text } => {
                        let flat = text.replace('\n', " ").replace('\r', "");
                        let flat = flat.trim();
                        (!flat.is_empty()).then(|| flat.to_string())
                    }
                    Segment::Image { .. } => Some(" [图片]".to_string()),
                })
                .collect();

            let text = if preview.is_empty() {
                format!("{}: 消息{}", nickname, index + 1)
            } else {
                format!("{}: {}", nickname, truncate_preview(&preview))
            };
            NewsItem { text }
        })
        .collect();

    if news.is_empty() {
        news.push(NewsItem {
            text: format!("{}: [聊天记录]", nickname),
        });
    }
    news
}

fn truncate_preview(preview: &str) -> String {
    if preview.chars().count() > MAX_PREVIEW_CHARS {
        let head: String = preview.chars().take(MAX_PREVIEW_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        preview.to_string()
    }
}

/// Whether a string carries image data rather than text.
pub fn is_image_data(value: &str) -> bool {
    if value.starts_with("data:image/") || value.starts_with("base64,") {
        return true;
    }
    if value.chars().count() > 100 && value.contains("base64") {
        return true;
    }
    BASE64_IMAGE_PREFIXES
        .iter()
        .any(|prefix| value.starts_with(prefix))
}

/// Normalize image data into a `data:` URL.
pub fn to_data_url(value: &str) -> String {
    if value.starts_with("data:image/") {
        value.to_string()
    } else if let Some(rest) = value.strip_prefix("base64,") {
        format!("data:image/png;base64,{}", rest)
    } else if value.starts_with("/9j/") {
        format!("data:image/jpeg;base64,{}", value)
    } else {
        format!("data:image/png;base64,{}", value)
    }
}
