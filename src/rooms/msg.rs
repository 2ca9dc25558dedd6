use axum::{
    debug_handler,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::{config::AppConfig, geo::Coordinate, region, AppResult};

use super::{gate::{self, Denial}, ChatRoom, LocationQuery};

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: i64,
    pub chat_room_id: i64,
    pub message: String,
    pub created_at: String,
}

#[derive(Deserialize)]
pub(crate) struct SendMessageBody {
    user_id: i64,
    message: String,
    latitude: f64,
    longitude: f64,
}

/// Insert-only accept path; callers must have passed the gate for `room`.
async fn store_message(
    db_pool: &SqlitePool,
    room: &ChatRoom,
    user_id: i64,
    message: &str,
) -> AppResult<ChatMessage> {
    let stored = sqlx::query_as(
        "INSERT INTO chats (user_id, chat_room_id, message) VALUES (?,?,?) \
         RETURNING id, user_id, chat_room_id, message, created_at",
    )
    .bind(user_id)
    .bind(room.id)
    .bind(message)
    .fetch_one(db_pool)
    .await?;

    info!("user {user_id} sent a message to {}", room.room_name);

    Ok(stored)
}

pub async fn messages_in_room(db_pool: &SqlitePool, room_id: i64) -> AppResult<Vec<ChatMessage>> {
    Ok(sqlx::query_as(
        "SELECT id, user_id, chat_room_id, message, created_at FROM chats \
         WHERE chat_room_id=? ORDER BY created_at DESC, id DESC",
    )
    .bind(room_id)
    .fetch_all(db_pool)
    .await?)
}

#[debug_handler]
pub(crate) async fn list(
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<i64>,
    Query(loc): Query<LocationQuery>,
) -> AppResult<Response> {
    if let Err(denial) = gate::check(&db_pool, room_id, loc.coord()).await? {
        return Ok(denial.into_response());
    }

    let messages = messages_in_room(&db_pool, room_id).await?;
    Ok(Json(messages).into_response())
}

#[debug_handler]
pub(crate) async fn send(
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<i64>,
    Json(body): Json<SendMessageBody>,
) -> AppResult<Response> {
    let user = Coordinate::new(body.latitude, body.longitude);
    let room = match gate::check(&db_pool, room_id, user).await? {
        Ok(room) => room,
        Err(denial) => return Ok(denial.into_response()),
    };

    let stored = store_message(&db_pool, &room, body.user_id, &body.message).await?;
    Ok(Json(stored).into_response())
}

/// Direct send without a room id: propose the nearest active room, then gate
/// it like any other request.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn send_nearest(
    State(db_pool): State<SqlitePool>,
    State(config): State<AppConfig>,
    Json(body): Json<SendMessageBody>,
) -> AppResult<Response> {
    let user = Coordinate::new(body.latitude, body.longitude);

    let Some(proposed) =
        region::select_nearest_room(&db_pool, user, config.default_search_radius_km).await?
    else {
        return Ok(Denial::NotFound.into_response());
    };

    let room = match gate::check(&db_pool, proposed.id, user).await? {
        Ok(room) => room,
        Err(denial) => return Ok(denial.into_response()),
    };

    let stored = store_message(&db_pool, &room, body.user_id, &body.message).await?;
    Ok(Json(stored).into_response())
}
