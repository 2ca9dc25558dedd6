pub mod gate;
pub mod msg;

use axum::{
    debug_handler,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    geo::{BoundingBox, Coordinate},
    region::{self, KakaoGeocoder, RegionRoomIndex},
    AppResult, AppState,
};

use self::gate::Denial;

const ROOM_COLUMNS: &str =
    "id, room_name, latitude, longitude, location_name, radius_km, is_active, created_at";

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct ChatRoom {
    pub id: i64,
    pub room_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: String,
    pub radius_km: f64,
    pub is_active: bool,
    pub created_at: String,
}

impl ChatRoom {
    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

pub async fn get_by_id(db_pool: &SqlitePool, id: i64) -> AppResult<Option<ChatRoom>> {
    Ok(
        sqlx::query_as(&format!("SELECT {ROOM_COLUMNS} FROM chat_rooms WHERE id=?"))
            .bind(id)
            .fetch_optional(db_pool)
            .await?,
    )
}

pub async fn list_active(db_pool: &SqlitePool) -> AppResult<Vec<ChatRoom>> {
    Ok(
        sqlx::query_as(&format!("SELECT {ROOM_COLUMNS} FROM chat_rooms WHERE is_active=1"))
            .fetch_all(db_pool)
            .await?,
    )
}

pub async fn find_by_location_name(
    db_pool: &SqlitePool,
    location_name: &str,
) -> AppResult<Option<ChatRoom>> {
    Ok(
        sqlx::query_as(&format!(
            "SELECT {ROOM_COLUMNS} FROM chat_rooms WHERE location_name=? AND is_active=1"
        ))
        .bind(location_name)
        .fetch_optional(db_pool)
        .await?,
    )
}

/// Active rooms whose center falls inside the bounding box around `user`,
/// ranked by squared degree-space distance (a deliberately cheap metric to
/// match the coarse box; the gate computes the exact distance later), room id
/// as tie-break.
pub async fn find_nearest_candidates(
    db_pool: &SqlitePool,
    user: Coordinate,
    search_radius_km: f64,
) -> AppResult<Vec<ChatRoom>> {
    let bb = BoundingBox::around(user, search_radius_km);

    Ok(
        sqlx::query_as(&format!(
            "SELECT {ROOM_COLUMNS} FROM chat_rooms \
             WHERE is_active=1 AND latitude BETWEEN ? AND ? AND longitude BETWEEN ? AND ? \
             ORDER BY (latitude-?)*(latitude-?) + (longitude-?)*(longitude-?) ASC, id ASC"
        ))
        .bind(bb.min_lat)
        .bind(bb.max_lat)
        .bind(bb.min_lon)
        .bind(bb.max_lon)
        .bind(user.latitude)
        .bind(user.latitude)
        .bind(user.longitude)
        .bind(user.longitude)
        .fetch_all(db_pool)
        .await?,
    )
}

pub async fn create(
    db_pool: &SqlitePool,
    room_name: &str,
    center: Coordinate,
    radius_km: f64,
    location_name: &str,
) -> AppResult<Result<ChatRoom, Denial>> {
    if radius_km <= 0.0 {
        return Ok(Err(Denial::InvalidArgument(format!(
            "radius_km must be positive, got {radius_km}"
        ))));
    }

    let room = sqlx::query_as(&format!(
        "INSERT INTO chat_rooms (room_name, latitude, longitude, location_name, radius_km, is_active) \
         VALUES (?,?,?,?,?,1) RETURNING {ROOM_COLUMNS}"
    ))
    .bind(room_name)
    .bind(center.latitude)
    .bind(center.longitude)
    .bind(location_name)
    .bind(radius_km)
    .fetch_one(db_pool)
    .await?;

    info!("created room {room_name} at ({}, {})", center.latitude, center.longitude);

    Ok(Ok(room))
}

/// Administrative flag flip; rooms are never deleted.
pub async fn set_active(db_pool: &SqlitePool, id: i64, active: bool) -> AppResult<()> {
    sqlx::query("UPDATE chat_rooms SET is_active=? WHERE id=?")
        .bind(active)
        .bind(id)
        .execute(db_pool)
        .await?;

    Ok(())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(resolve_room))
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/messages", post(msg::send_nearest))
        .route("/{room_id}", get(room))
        .route("/{room_id}/messages", get(msg::list).post(msg::send))
}

#[derive(Deserialize)]
pub(crate) struct LocationQuery {
    latitude: f64,
    longitude: f64,
}

impl LocationQuery {
    pub(crate) fn coord(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

#[debug_handler(state = AppState)]
async fn resolve_room(
    State(geocoder): State<KakaoGeocoder>,
    State(regions): State<RegionRoomIndex>,
    Query(loc): Query<LocationQuery>,
) -> Response {
    match region::select_room(&geocoder, &regions, loc.coord()).await {
        Some(room_id) => {
            info!("selected room {room_id} for ({}, {})", loc.latitude, loc.longitude);
            Json(json!({ "room_id": room_id })).into_response()
        }
        None => Denial::UnresolvableRegion.into_response(),
    }
}

#[debug_handler]
async fn room(
    State(db_pool): State<SqlitePool>,
    Path(room_id): Path<i64>,
    Query(loc): Query<LocationQuery>,
) -> AppResult<Response> {
    match gate::check(&db_pool, room_id, loc.coord()).await? {
        Ok(room) => Ok(Json(room).into_response()),
        Err(denial) => Ok(denial.into_response()),
    }
}

#[debug_handler]
async fn list_rooms(State(db_pool): State<SqlitePool>) -> AppResult<Json<Vec<ChatRoom>>> {
    Ok(Json(list_active(&db_pool).await?))
}

#[derive(Deserialize)]
struct CreateRoomBody {
    room_name: String,
    latitude: f64,
    longitude: f64,
    location_name: String,
    radius_km: f64,
}

#[debug_handler]
async fn create_room(
    State(db_pool): State<SqlitePool>,
    Json(body): Json<CreateRoomBody>,
) -> AppResult<Response> {
    let center = Coordinate::new(body.latitude, body.longitude);
    match create(&db_pool, &body.room_name, center, body.radius_km, &body.location_name).await? {
        Ok(room) => Ok(Json(room).into_response()),
        Err(denial) => Ok(denial.into_response()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db;
    use sqlx::sqlite::SqlitePoolOptions;

    /// In-memory pool pinned to one connection so every query sees the same
    /// database.
    pub(crate) async fn room_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::init(&pool).await.unwrap();
        pool
    }

    pub(crate) async fn insert_room(
        db_pool: &SqlitePool,
        id: i64,
        room_name: &str,
        center: Coordinate,
        radius_km: f64,
        active: bool,
    ) {
        sqlx::query(
            "INSERT INTO chat_rooms (id, room_name, latitude, longitude, location_name, radius_km, is_active) \
             VALUES (?,?,?,?,?,?,?)",
        )
        .bind(id)
        .bind(room_name)
        .bind(center.latitude)
        .bind(center.longitude)
        .bind(room_name)
        .bind(radius_km)
        .bind(active)
        .execute(db_pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn candidates_are_ordered_by_degree_distance_then_id() {
        let pool = room_pool().await;
        let user = Coordinate::new(37.0, 127.0);

        // offsets chosen exactly representable so the 1/3 tie is exact
        insert_room(&pool, 1, "far", Coordinate::new(37.25, 127.0), 10.0, true).await;
        insert_room(&pool, 2, "near", Coordinate::new(37.0625, 127.0), 10.0, true).await;
        insert_room(&pool, 3, "far mirror", Coordinate::new(36.75, 127.0), 10.0, true).await;

        let got = find_nearest_candidates(&pool, user, 50.0).await.unwrap();
        let ids: Vec<i64> = got.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[tokio::test]
    async fn candidates_skip_inactive_and_out_of_box_rooms() {
        let pool = room_pool().await;
        let user = Coordinate::new(37.0, 127.0);

        insert_room(&pool, 1, "disabled", Coordinate::new(37.01, 127.0), 10.0, false).await;
        // ~100 km north, outside a 15 km box
        insert_room(&pool, 2, "distant", Coordinate::new(37.9, 127.0), 10.0, true).await;

        let got = find_nearest_candidates(&pool, user, 15.0).await.unwrap();
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_non_positive_radius() {
        let pool = room_pool().await;
        let center = Coordinate::new(37.0, 127.0);

        let got = create(&pool, "bad", center, 0.0, "bad").await.unwrap();
        assert!(matches!(got, Err(Denial::InvalidArgument(_))));

        let got = create(&pool, "bad", center, -3.0, "bad").await.unwrap();
        assert!(matches!(got, Err(Denial::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn created_rooms_are_active_and_listed() {
        let pool = room_pool().await;
        let center = Coordinate::new(37.2636, 127.0286);

        let room = create(&pool, "수원시 채팅방", center, 10.0, "수원시")
            .await
            .unwrap()
            .unwrap();
        assert!(room.is_active);
        assert!(room.id > 0);

        let listed = list_active(&pool).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].room_name, "수원시 채팅방");

        set_active(&pool, room.id, false).await.unwrap();
        assert!(list_active(&pool).await.unwrap().is_empty());
        assert!(!get_by_id(&pool, room.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn lookup_by_location_name_only_sees_active_rooms() {
        let pool = room_pool().await;
        insert_room(&pool, 1, "수원시", Coordinate::new(37.2636, 127.0286), 10.0, true).await;
        insert_room(&pool, 2, "양평군", Coordinate::new(37.4917, 127.4875), 10.0, false).await;

        assert!(find_by_location_name(&pool, "수원시").await.unwrap().is_some());
        assert!(find_by_location_name(&pool, "양평군").await.unwrap().is_none());
    }
}
