use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::entities::room;
use crate::error::AppError;
use crate::feed::{ChangeEvent, ChangeFilter, ChangeKind, ROOM_TABLE};
use crate::state::AppState;
use crate::store::NewRoom;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the room route group: `/rooms/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_room).get(list_rooms))
        .route("/ws", get(ws_upgrade))
        .route("/{id}", get(get_room))
        .route("/{id}/complete", post(complete_room))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoomRequest {
    game_name: String,
    player_count: i32,
    rule: String,
    amount_per_person: f64,
    owner_address: String,
    contact_info: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoomResponse {
    id: Uuid,
    created_at: String,
    game_name: String,
    player_count: i32,
    rule: String,
    amount_per_person: f64,
    owner_address: String,
    status: String,
    contact_info: Option<String>,
}

#[derive(Deserialize)]
struct WsQueryParams {
    /// `insert` | `update` | `delete` | `*` (default `*`)
    event: Option<String>,
    #[serde(rename = "roomId")]
    room_id: Option<Uuid>,
}

/// Build a `RoomResponse` from a room model.
fn build_room_response(r: room::Model) -> RoomResponse {
    RoomResponse {
        id: r.id,
        created_at: r.created_at.to_rfc3339(),
        game_name: r.game_name,
        player_count: r.player_count,
        rule: r.rule,
        amount_per_person: r.amount_per_person,
        owner_address: r.owner_address,
        status: r.status,
        contact_info: r.contact_info,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/v1/rooms` — Publish a new game request.
async fn create_room(
    State(state): State<AppState>,
    Json(body): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomResponse>), AppError> {
    let inserted = state
        .store
        .create(NewRoom {
            game_name: body.game_name,
            player_count: body.player_count,
            rule: body.rule,
            amount_per_person: body.amount_per_person,
            owner_address: body.owner_address,
            contact_info: body.contact_info,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(build_room_response(inserted))))
}

/// `GET /api/v1/rooms` — Active rooms, newest first.
async fn list_rooms(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoomResponse>>, AppError> {
    let rooms = state.store.list_active().await?;
    Ok(Json(rooms.into_iter().map(build_room_response).collect()))
}

/// `GET /api/v1/rooms/{id}` — Room detail.
async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoomResponse>, AppError> {
    let found = state.store.get_by_id(id).await?;
    Ok(Json(build_room_response(found)))
}

/// `POST /api/v1/rooms/{id}/complete` — Flip an active room to completed.
///
/// This is the status-update half of settlement; the transfer itself happens
/// in the settling client's wallet before it calls here.
async fn complete_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.store.complete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────────────────────────
// WebSocket change feed
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/rooms/ws` — Subscribe to room change notifications.
///
/// Query parameters narrow the subscription: `event` (kind, `*` by default)
/// and `roomId` (a single row). Each matching change arrives as one JSON
/// text frame; clients re-fetch on receipt.
async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsQueryParams>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let kind = match params.event.as_deref() {
        None => None,
        Some(raw) => ChangeKind::parse_filter(raw).ok_or_else(|| {
            AppError::BadRequest(
                "Invalid event filter. Must be 'insert', 'update', 'delete', or '*'.".to_string(),
            )
        })?,
    };

    let filter = ChangeFilter {
        table: ROOM_TABLE.to_string(),
        kind,
        row_id: params.room_id,
    };

    // Subscribe before the handshake response goes out, so no change slips
    // between the 101 and the forwarding loop.
    let (subscription_id, rx) = state.store.feed().subscribe(filter);

    Ok(ws.on_upgrade(move |socket| handle_ws_connection(state, subscription_id, rx, socket)))
}

/// Forward feed events to one `WebSocket` client until it disconnects.
async fn handle_ws_connection(
    state: AppState,
    subscription_id: Uuid,
    mut rx: mpsc::UnboundedReceiver<ChangeEvent>,
    socket: WebSocket,
) {
    let (mut ws_sink, mut ws_stream) = socket.split();

    // Spawn task to forward change events to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let msg = serde_json::json!({
                "type": "change",
                "payload": event,
            });
            if ws_sink
                .send(Message::Text(msg.to_string().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    // Inbound traffic is ignored; the feed is one-way.
    while let Some(Ok(msg)) = ws_stream.next().await {
        if matches!(msg, Message::Close(_)) {
            break;
        }
    }

    // Cleanup on disconnect
    send_task.abort();
    state.store.feed().unsubscribe(subscription_id);
}
