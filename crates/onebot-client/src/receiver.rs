//! Event receiver for OneBot HTTP POST reporting.

use crate::error::OneBotError;
use crate::types::*;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

const CHANNEL_CAPACITY: usize = 256;

/// Message receiver that accepts events pushed by the OneBot implementation.
pub struct MessageReceiver {
    listen_addr: SocketAddr,
}

impl MessageReceiver {
    /// Create a new message receiver.
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self { listen_addr }
    }

    /// Build the event endpoint. Parsed messages are pushed into `sender`.
    pub fn router(sender: mpsc::Sender<BotMessage>) -> Router {
        Router::new()
            .route("/", post(handle_event))
            .layer(TraceLayer::new_for_http())
            .with_state(sender)
    }

    /// Bind the listener and start receiving messages as an async stream.
    pub async fn stream(self) -> Result<impl Stream<Item = BotMessage>, OneBotError> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let listener = TcpListener::bind(self.listen_addr).await?;
        info!("Listening for OneBot events on {}", self.listen_addr);

        let app = Self::router(tx);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Event listener stopped: {}", e);
            }
        });

        Ok(ReceiverStream::new(rx))
    }
}

async fn handle_event(
    State(sender): State<mpsc::Sender<BotMessage>>,
    Json(event): Json<IncomingEvent>,
) -> StatusCode {
    let Some(message) = BotMessage::from_event(&event) else {
        debug!("Ignoring {} event", event.post_type);
        return StatusCode::NO_CONTENT;
    };

    debug!(
        "Received: {} from {}",
        message.text.chars().take(50).collect::<String>(),
        message.user_id
    );

    if sender.send(message).await.is_err() {
        warn!("Message stream closed, dropping event");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::NO_CONTENT
}
