//! Sky API errors.

use thiserror::Error;

/// Errors that can occur while querying a Sky data API.
#[derive(Error, Debug)]
pub enum SkyApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Endpoint answered with a non-success HTTP status.
    #[error("HTTP {status}: {detail}")]
    Api { status: u16, detail: String },

    /// Endpoint answered 200 but reported an error in its body.
    #[error("{0}")]
    Upstream(String),

    /// Endpoint has no usable API key.
    #[error("API key not configured: {0}")]
    NotConfigured(String),

    #[error("空图片数据")]
    EmptyImage,

    #[error("图片数据过小")]
    ImageTooSmall,

    /// Response body did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Caller-supplied arguments failed validation. The message is user-facing.
    #[error("{0}")]
    InvalidArguments(String),

    /// A height platform with this name is already registered.
    #[error("Platform already registered: {0}")]
    DuplicatePlatform(String),
}

impl SkyApiError {
    /// Chat-facing description of the failure.
    pub fn user_message(&self) -> String {
        match self {
            SkyApiError::Http(e) if e.is_timeout() => "❌ 请求超时".into(),
            SkyApiError::Http(e) => format!("❌ 网络错误: {}", e),
            SkyApiError::Json(e) => format!("❌ 解析响应失败: {}", e),
            SkyApiError::Api { detail, .. } => format!("❌ API请求失败: {}", detail),
            SkyApiError::Upstream(msg) => format!("❌ API返回错误: {}", msg),
            SkyApiError::NotConfigured(name) => format!("❌ 插件未配置{}API密钥", name),
            SkyApiError::EmptyImage => "❌ 图片数据为空".into(),
            SkyApiError::ImageTooSmall => "❌ 图片数据过小".into(),
            SkyApiError::InvalidResponse(_) => "❌ API返回数据格式错误".into(),
            SkyApiError::InvalidArguments(msg) => msg.clone(),
            SkyApiError::DuplicatePlatform(name) => format!("❌ 平台 {} 重复注册", name),
        }
    }

    /// Whether the upstream reported that it has no record for the player.
    pub fn is_record_not_found(&self) -> bool {
        const MARKERS: [&str; 4] = ["record not found", "未找到", "no record", "不存在"];
        let detail = match self {
            SkyApiError::Api { detail, .. } => detail.to_lowercase(),
            SkyApiError::Upstream(msg) => msg.to_lowercase(),
            _ => return false,
        };
        MARKERS.iter().any(|marker| detail.contains(marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_not_found_detection() {
        assert!(SkyApiError::Upstream("Record Not Found".into()).is_record_not_found());
        assert!(SkyApiError::Api {
            status: 404,
            detail: "玩家不存在".into()
        }
        .is_record_not_found());
        assert!(!SkyApiError::Upstream("key invalid".into()).is_record_not_found());
        assert!(!SkyApiError::EmptyImage.is_record_not_found());
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            SkyApiError::Api {
                status: 403,
                detail: "bad key".into()
            }
            .user_message(),
            "❌ API请求失败: bad key"
        );
        assert_eq!(
            SkyApiError::NotConfigured("大蜡烛".into()).user_message(),
            "❌ 插件未配置大蜡烛API密钥"
        );
    }
}
