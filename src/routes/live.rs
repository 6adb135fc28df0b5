//! `GET /api/orders/live?token=<JWT>&statuses=調理中,提供可能`
//!
//! Browsers cannot set headers on a WebSocket handshake, so the JWT travels
//! in the query string. Every message is a full snapshot of the subscribed
//! statuses; monitors redraw on each one.

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use tokio::{sync::broadcast, time::Duration};

use crate::{
    domain::status::{OrderStatus, parse_status_list},
    dto::orders::LiveFeedQuery,
    error::{AppError, AppResult},
    live::{FeedMessage, FeedReason},
    middleware::auth::AuthUser,
    services::{auth_service::authenticate, order_service},
    state::AppState,
};

const PING_INTERVAL: Duration = Duration::from_secs(30);

pub async fn order_feed(
    State(state): State<AppState>,
    Query(query): Query<LiveFeedQuery>,
    ws: WebSocketUpgrade,
) -> AppResult<impl IntoResponse> {
    let (user, statuses) = authorize_feed(&state, &query).await?;
    Ok(ws.on_upgrade(move |socket| feed_session(socket, state, user, statuses)))
}

/// Checks the handshake query: a live account token and statuses the
/// account's role may watch.
pub async fn authorize_feed(
    state: &AppState,
    query: &LiveFeedQuery,
) -> AppResult<(AuthUser, Vec<OrderStatus>)> {
    let token = query.token.trim();
    let token = token.strip_prefix("Bearer ").unwrap_or(token);
    let user = authenticate(state, token).await.map_err(|e| match e {
        AppError::Unauthorized(reason) => {
            tracing::debug!(%reason, "live feed token rejected");
            AppError::Unauthorized("Invalid or expired token".into())
        }
        other => other,
    })?;

    let statuses = parse_status_list(&query.statuses)?;
    order_service::ensure_feed_access(state, &user, &statuses).await?;
    Ok((user, statuses))
}

async fn feed_session(socket: WebSocket, state: AppState, user: AuthUser, statuses: Vec<OrderStatus>) {
    let (mut sink, mut stream) = socket.split();
    tracing::info!(username = %user.username, ?statuses, "live feed connected");

    // subscribe before the first snapshot so no event falls in between
    let mut events = state.live.subscribe();
    if send_snapshot(&mut sink, &state, &statuses, FeedReason::Initial).await.is_err() {
        return;
    }

    let mut ping = tokio::time::interval(PING_INTERVAL);
    ping.tick().await;

    loop {
        tokio::select! {
            _ = ping.tick() => {
                if sink.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }

            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let Some(reason) = event.reason() else {
                            let _ = sink.send(Message::Close(None)).await;
                            break;
                        };
                        if event.touches(&statuses)
                            && send_snapshot(&mut sink, &state, &statuses, reason).await.is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(username = %user.username, lagged = n, "live feed lagged, resending snapshot");
                        events = state.live.subscribe();
                        if send_snapshot(&mut sink, &state, &statuses, FeedReason::Resync).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!(username = %user.username, "live feed disconnected");
}

async fn send_snapshot(
    sink: &mut SplitSink<WebSocket, Message>,
    state: &AppState,
    statuses: &[OrderStatus],
    reason: FeedReason,
) -> Result<(), axum::Error> {
    let message = match order_service::snapshot(&state.orm, statuses).await {
        Ok(orders) => FeedMessage::Snapshot {
            reason,
            statuses: statuses.to_vec(),
            orders,
        },
        Err(err) => {
            tracing::error!(error = ?err, "live feed snapshot failed");
            FeedMessage::Error {
                message: "Could not load orders".to_string(),
            }
        }
    };
    send_message(sink, &message).await
}

async fn send_message(
    sink: &mut SplitSink<WebSocket, Message>,
    message: &FeedMessage,
) -> Result<(), axum::Error> {
    match serde_json::to_string(message) {
        Ok(json) => sink.send(Message::Text(json.into())).await,
        Err(err) => {
            tracing::error!(error = %err, "live feed message could not be encoded");
            Ok(())
        }
    }
}
