//! OneBot v11 API types.

use serde::{Deserialize, Serialize};

/// Event reported by the OneBot implementation over HTTP POST.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingEvent {
    pub post_type: String,
    #[serde(default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub self_id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub group_id: Option<i64>,
    /// Reported by NapCat, absent in plain OneBot v11.
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub raw_message: Option<String>,
    #[serde(default)]
    pub sender: Option<Sender>,
    #[serde(default)]
    pub time: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sender {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub card: Option<String>,
}

/// Where a message is delivered.
///
/// Serializes as `{"group_id": ..}` or `{"user_id": ..}` so it can be
/// flattened into action parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChatTarget {
    #[serde(rename = "group_id")]
    Group(i64),
    #[serde(rename = "user_id")]
    Private(i64),
}

impl ChatTarget {
    pub fn is_group(&self) -> bool {
        matches!(self, ChatTarget::Group(_))
    }
}

/// A single message segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Segment {
    Text {
        text: String,
    },
    Image {
        file: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
    },
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text { text: text.into() }
    }

    /// Image segment from a data URL or raw base64 payload.
    pub fn image(data: &str) -> Self {
        Segment::Image {
            file: crate::forward::to_data_url(data),
            summary: Some("[图片]".into()),
        }
    }

    /// Classify a string as image or text. Blank strings yield `None`.
    pub fn detect(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if crate::forward::is_image_data(&value) {
            Some(Segment::image(&value))
        } else if value.trim().is_empty() {
            None
        } else {
            Some(Segment::Text { text: value })
        }
    }
}

/// Parameters for `send_group_msg` / `send_private_msg`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    #[serde(flatten)]
    pub target: ChatTarget,
    pub message: &'a [Segment],
}

/// Generic action response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionResponse<T> {
    pub status: String,
    #[serde(default)]
    pub retcode: i64,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub wording: Option<String>,
}

impl<T> ActionResponse<T> {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageId {
    pub message_id: i64,
}

/// Result of `get_login_info`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInfo {
    pub user_id: i64,
    pub nickname: String,
}

/// Parsed message for bot processing.
#[derive(Debug, Clone)]
pub struct BotMessage {
    /// The bot account that received this message.
    pub self_id: i64,
    /// The user who sent the message.
    pub user_id: i64,
    /// Group card if set, otherwise nickname.
    pub sender_name: Option<String>,
    /// Raw message text.
    pub text: String,
    pub time: i64,
    pub group_id: Option<i64>,
    pub group_name: Option<String>,
}

impl BotMessage {
    /// Extract a bot message from a reported event.
    pub fn from_event(event: &IncomingEvent) -> Option<Self> {
        if event.post_type != "message" {
            return None;
        }
        let text = event.raw_message.clone()?;
        let user_id = event
            .user_id
            .or_else(|| event.sender.as_ref().and_then(|s| s.user_id))?;

        let group_id = match event.message_type.as_deref() {
            Some("group") => event.group_id,
            _ => None,
        };

        let sender_name = event.sender.as_ref().and_then(|s| {
            s.card
                .clone()
                .filter(|c| !c.is_empty())
                .or_else(|| s.nickname.clone().filter(|n| !n.is_empty()))
        });

        Some(Self {
            self_id: event.self_id,
            user_id,
            sender_name,
            text,
            time: event.time,
            group_id,
            group_name: event.group_name.clone().filter(|n| !n.is_empty()),
        })
    }

    pub fn is_group(&self) -> bool {
        self.group_id.is_some()
    }

    /// Get the reply target (group or sender).
    pub fn target(&self) -> ChatTarget {
        match self.group_id {
            Some(group_id) => ChatTarget::Group(group_id),
            None => ChatTarget::Private(self.user_id),
        }
    }

    /// Name of the conversation as shown in a forward bundle header.
    pub fn source_label(&self) -> Option<String> {
        if self.is_group() {
            self.group_name.as_ref().map(|name| format!("{}的聊天记录", name))
        } else {
            self.sender_name.as_ref().map(|name| format!("{}的聊天记录", name))
        }
    }
}
