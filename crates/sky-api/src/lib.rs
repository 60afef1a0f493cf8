//! Clients for the Sky: Children of the Light data APIs.

mod client;
mod error;
pub mod height;
mod types;
mod validators;

pub use client::SkyApiClient;
pub use error::SkyApiError;
pub use height::{HeightPlatform, HeightQuery, PlatformRegistry};
pub use types::{AncestorInfo, Endpoint, ImageData};
pub use validators::{is_friend_code, is_game_id};
