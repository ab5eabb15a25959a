//! Live selection counter over a websocket.
//!
//! Browsers cannot set an `Authorization` header on a websocket upgrade, so
//! this route also accepts the organizer token as `?token=`.
//!
//! Server → client frames:
//!
//! ```json
//! {"type": "count", "count": 12}
//! ```
//!
//! One frame is sent on connect. Whenever the selection store reports a
//! counter value, the committed count is read back from the repository and
//! sent if it differs from the last frame, so clients follow commit order
//! even when outcomes are broadcast out of order.

use crate::error::AppError;
use crate::extractors::bearer_token;
use crate::middleware::authenticate;
use crate::state::{AppState, Services};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use eventdesk_core::providers::ParticipantRepository;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Query of the upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct LiveQuery {
    /// Organizer token, for clients that cannot send headers.
    pub token: Option<String>,
}

/// Frame pushed to live clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LiveMessage {
    /// Current number of selected participants.
    Count {
        /// Counter value.
        count: u64,
    },
}

impl LiveMessage {
    fn to_frame(self) -> Option<Message> {
        serde_json::to_string(&self).ok().map(Message::Text)
    }
}

/// `GET /api/selection/live`
///
/// # Errors
///
/// 401 when neither the header nor `?token=` carries a valid token.
pub async fn live<D: Services>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<D>>,
    Query(query): Query<LiveQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let token = bearer_token(&headers).or(query.token.as_deref());
    let organizer = authenticate(&state.organizers, token)?;

    tracing::info!(organizer = %organizer.name, "Live counter client connected");
    Ok(ws.on_upgrade(move |socket| stream_counts(socket, state)))
}

/// The committed counter, or `fallback` if the repository cannot be read.
async fn committed_count<P: ParticipantRepository>(participants: &P, fallback: Option<u64>) -> Option<u64> {
    match participants.selection_count().await {
        Ok(count) => Some(count),
        Err(error) => {
            tracing::warn!(error = %error, "Could not read selection count");
            fallback
        },
    }
}

async fn stream_counts<D: Services>(socket: WebSocket, state: AppState<D>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before reading the initial value so no update falls between.
    let mut actions = state.selection.subscribe_actions();
    let participants = state.participants.clone();

    let known = state.selection.state(|s| s.count).await;
    let mut last_sent = committed_count(&participants, known).await;
    if let Some(frame) = last_sent.and_then(|count| LiveMessage::Count { count }.to_frame()) {
        if sender.send(frame).await.is_err() {
            return;
        }
    }

    let mut send_task = tokio::spawn(async move {
        loop {
            let reported = match actions.recv().await {
                Ok(action) => match action.reported_count() {
                    Some(count) => Some(count),
                    None => continue,
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Live client lagged, resending current count");
                    None
                },
                Err(RecvError::Closed) => break,
            };

            // One read covers every update already queued.
            loop {
                match actions.try_recv() {
                    Ok(_) | Err(TryRecvError::Lagged(_)) => {},
                    Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                }
            }

            let Some(count) = committed_count(&participants, reported).await else {
                continue;
            };
            if last_sent == Some(count) {
                continue;
            }

            let Some(frame) = LiveMessage::Count { count }.to_frame() else {
                continue;
            };
            if sender.send(frame).await.is_err() {
                break;
            }
            last_sent = Some(count);
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::debug!("Live counter client disconnected");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use eventdesk_core::selection::SelectionAction;
    use eventdesk_testing::{fixtures, InMemoryParticipantRepository};
    use uuid::Uuid;

    #[test]
    fn test_count_frame_shape() {
        let json = serde_json::to_value(LiveMessage::Count { count: 12 }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "count", "count": 12}));
    }

    #[test]
    fn test_only_counter_actions_are_pushed() {
        let loaded = SelectionAction::CountLoaded {
            correlation_id: Uuid::new_v4(),
            count: 4,
        };
        let command = SelectionAction::LoadCount {
            correlation_id: Uuid::new_v4(),
        };

        assert_eq!(loaded.reported_count(), Some(4));
        assert_eq!(command.reported_count(), None);
    }

    #[tokio::test]
    async fn test_frames_carry_the_committed_count() {
        let repo = InMemoryParticipantRepository::with_participants(fixtures::roster());
        repo.set_counter(Some(2));

        // A stale outcome reporting 3 arrives after the commit that made it 2.
        assert_eq!(committed_count(&repo, Some(3)).await, Some(2));
    }

    #[tokio::test]
    async fn test_unwritten_counter_reads_as_zero() {
        let repo = InMemoryParticipantRepository::new();
        assert_eq!(committed_count(&repo, None).await, Some(0));
    }
}
