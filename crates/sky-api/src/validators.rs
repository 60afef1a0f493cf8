//! Player identifier validation.

use regex::Regex;
use std::sync::OnceLock;

/// Game long ID: a UUID, case-insensitive.
pub fn is_game_id(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
            .expect("valid regex")
    })
    .is_match(&value.to_lowercase())
}

/// Friend code: `XXXX-XXXX-XXXX`, alphanumeric, case-insensitive.
pub fn is_friend_code(value: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z0-9]{4}-[A-Z0-9]{4}-[A-Z0-9]{4}$").expect("valid regex"))
        .is_match(&value.to_uppercase())
}
