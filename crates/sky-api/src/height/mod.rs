//! Player height lookup across third-party platforms.

mod mango;
mod ovoav;
mod registry;
mod yingtian;

pub use mango::MangoPlatform;
pub use ovoav::OvoavPlatform;
pub use registry::{parse_alias_spec, PlatformRegistry};
pub use yingtian::YingtianPlatform;

use crate::error::SkyApiError;
use crate::types::Endpoint;
use crate::validators::{is_friend_code, is_game_id};
use async_trait::async_trait;

pub(crate) const RULE: &str = "━━━━━━━━━━━━━━━━━━━━";
pub(crate) const UNKNOWN: &str = "未知";
pub(crate) const UNKNOWN_ERROR: &str = "未知错误";

const BAD_GAME_ID: &str = "❌ 游戏长ID格式错误。正确格式应为：xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx";
const BAD_FRIEND_CODE: &str = "❌ 好友码格式错误。正确格式应为：XXXX-XXXX-XXXX";
const BAD_IDENTIFIER: &str = "❌ 需要提供有效的游戏长ID或好友码（格式 XXXX-XXXX-XXXX）";

/// Normalized identifiers for one lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeightQuery {
    /// Lowercase UUID.
    pub game_id: Option<String>,
    /// Uppercase `XXXX-XXXX-XXXX`.
    pub friend_code: Option<String>,
}

/// A height lookup provider.
#[async_trait]
pub trait HeightPlatform: Send + Sync {
    /// Canonical platform name (e.g. "mango").
    fn name(&self) -> &str;

    /// Built-in aliases accepted in commands.
    fn aliases(&self) -> &[&'static str];

    /// Display name used in result headers and help.
    fn label(&self) -> &str;

    /// One-line description of the identifiers this platform needs.
    fn requirement(&self) -> &str;

    /// Example argument lists, without the command word.
    fn examples(&self) -> &[&'static str];

    fn endpoint(&self) -> &Endpoint;

    /// Check and normalize user input for this platform.
    fn validate(
        &self,
        game_id: Option<&str>,
        friend_code: Option<&str>,
    ) -> Result<HeightQuery, SkyApiError>;

    /// Run the lookup and return the formatted report.
    async fn query(&self, query: &HeightQuery) -> Result<String, SkyApiError>;
}

pub(crate) fn bad_game_id() -> SkyApiError {
    SkyApiError::InvalidArguments(BAD_GAME_ID.into())
}

pub(crate) fn bad_identifier() -> SkyApiError {
    SkyApiError::InvalidArguments(BAD_IDENTIFIER.into())
}

/// Accept a game id or a friend code in the first position. A second
/// argument friend code takes precedence over one given first.
pub(crate) fn game_id_or_friend_code(
    game_id: Option<&str>,
    friend_code: Option<&str>,
) -> Result<HeightQuery, SkyApiError> {
    let mut query = HeightQuery::default();

    match game_id {
        Some(id) if is_game_id(id) => query.game_id = Some(id.to_lowercase()),
        Some(code) if is_friend_code(code) => query.friend_code = Some(code.to_uppercase()),
        _ => return Err(bad_identifier()),
    }

    if let Some(code) = normalize_friend_code(friend_code)? {
        query.friend_code = Some(code);
    }

    Ok(query)
}

/// Validate an optional friend code argument and uppercase it.
pub(crate) fn normalize_friend_code(
    friend_code: Option<&str>,
) -> Result<Option<String>, SkyApiError> {
    match friend_code {
        Some(code) if !is_friend_code(code) => {
            Err(SkyApiError::InvalidArguments(BAD_FRIEND_CODE.into()))
        }
        Some(code) => Ok(Some(code.to_uppercase())),
        None => Ok(None),
    }
}

/// Numbers may arrive as JSON numbers or numeric strings.
pub(crate) fn as_f64(value: Option<&serde_json::Value>) -> Option<f64> {
    match value? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Display a JSON scalar as-is, or `未知` when absent.
pub(crate) fn display_field(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => UNKNOWN.into(),
        Some(other) => other.to_string(),
    }
}
