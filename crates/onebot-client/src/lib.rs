//! OneBot v11 (NapCat) HTTP API client.

mod client;
mod error;
pub mod forward;
mod receiver;
mod types;

pub use client::OneBotClient;
pub use error::OneBotError;
pub use forward::{ForwardItem, ForwardOptions, ForwardPayload, NodeSender};
pub use receiver::MessageReceiver;
pub use types::*;
