use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message as WsMessage, WebSocket},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use super::{protocol::ClientEvent, relay::Relay};

#[debug_handler(state = crate::AppState)]
pub async fn room_ws(State(relay): State<Arc<Relay>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |stream| serve_socket(relay, stream))
}

async fn serve_socket(relay: Arc<Relay>, stream: WebSocket) {
    let (connection_id, mut outbound) = relay.connect();
    info!(%connection_id, "socket connected");

    let (mut sender, mut receiver) = stream.split();

    let mut forward_task = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(%connection_id, error = %e, "failed to serialize event");
                    continue;
                }
            };
            if sender.send(WsMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut receive_task = {
        let relay = Arc::clone(&relay);
        tokio::spawn(async move {
            while let Some(Ok(msg)) = receiver.next().await {
                let text = match msg {
                    WsMessage::Text(text) => text,
                    WsMessage::Close(_) => break,
                    _ => continue,
                };
                let Ok(event) = serde_json::from_str::<ClientEvent>(text.as_str()) else {
                    debug!(%connection_id, frame = text.as_str(), "ignoring unreadable frame");
                    continue;
                };
                relay.handle(connection_id, event);
            }
        })
    };

    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    };

    relay.disconnect(connection_id);
    info!(%connection_id, "socket closed");
}
