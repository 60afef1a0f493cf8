//! Reply delivery: merged-forward bundles with a direct-send fallback.

use onebot_client::{
    BotMessage, ForwardItem, ForwardOptions, ForwardPayload, NodeSender, OneBotClient,
};
use tracing::{debug, error, info, warn};

/// Sends replies back to the chat a command came from.
pub struct Delivery {
    client: OneBotClient,
    forward_enabled: bool,
    sender: Option<NodeSender>,
}

impl Delivery {
    /// `sender` is the bot identity used as node author. Without it every
    /// bundle is sent message by message.
    pub fn new(client: OneBotClient, forward_enabled: bool, sender: Option<NodeSender>) -> Self {
        Self {
            client,
            forward_enabled,
            sender,
        }
    }

    /// Send plain text directly. Returns whether NapCat accepted it.
    pub async fn send_text(&self, message: &BotMessage, text: &str) -> bool {
        match self.client.send_text(message.target(), text).await {
            Ok(_) => true,
            Err(e) => {
                error!("Failed to send text to {:?}: {}", message.target(), e);
                false
            }
        }
    }

    /// Send `items` as one merged-forward bundle. Falls back to sending each
    /// segment on its own when forwarding is off, the bot identity is unknown,
    /// or NapCat rejects the bundle. Returns true if anything was delivered.
    pub async fn send_forward(
        &self,
        message: &BotMessage,
        items: &[ForwardItem],
        options: ForwardOptions,
    ) -> bool {
        if items.is_empty() {
            return false;
        }

        let sender = match (&self.sender, self.forward_enabled) {
            (Some(sender), true) => sender,
            (None, true) => {
                warn!("Bot identity unknown, sending messages directly");
                return self.fallback(message, items).await;
            }
            (_, false) => return self.fallback(message, items).await,
        };

        let options = match (options.source.is_none(), message.source_label()) {
            (true, Some(label)) => options.source(label),
            _ => options,
        };

        let payload = ForwardPayload::build(items, sender, options);
        if payload.is_empty() {
            return false;
        }

        match self.client.send_forward(message.target(), &payload).await {
            Ok(()) => {
                info!("Sent forward bundle with {} nodes", payload.messages.len());
                true
            }
            Err(e) => {
                warn!("Forward send failed, falling back to direct messages: {}", e);
                self.fallback(message, items).await
            }
        }
    }

    /// Shorthand for a bundle holding one text or image.
    pub async fn send_forward_single(&self, message: &BotMessage, content: &str) -> bool {
        match ForwardItem::detect(content) {
            Some(item) => {
                self.send_forward(message, &[item], ForwardOptions::default())
                    .await
            }
            None => false,
        }
    }

    async fn fallback(&self, message: &BotMessage, items: &[ForwardItem]) -> bool {
        let target = message.target();
        let mut delivered = 0usize;

        for segment in items.iter().flat_map(|item| item.segments()) {
            match self
                .client
                .send_message(target, std::slice::from_ref(segment))
                .await
            {
                Ok(_) => delivered += 1,
                Err(e) => error!("Direct send failed: {}", e),
            }
        }

        debug!("Direct fallback delivered {} segments", delivered);
        delivered > 0
    }
}
