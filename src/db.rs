//! Schema bootstrap and the Gyeonggi room seed. Room ids here line up with
//! the region index in [`crate::region`], so the region-mapping path and the
//! directory agree out of the box.

use sqlx::SqlitePool;
use tracing::info;

use crate::AppResult;

const SEED_RADIUS_KM: f64 = 10.0;

/// (room id, region key, center latitude, center longitude) for the 28
/// Gyeonggi-do rooms; centers are the respective city/county halls.
const SEED_ROOMS: [(i64, &str, f64, f64); 28] = [
    (1, "수원시", 37.2636, 127.0286),
    (2, "성남시", 37.4201, 127.1262),
    (3, "고양시", 37.6584, 126.8320),
    (4, "용인시", 37.2411, 127.1776),
    (5, "부천시", 37.5034, 126.7660),
    (6, "안산시", 37.3219, 126.8309),
    (7, "안양시", 37.3943, 126.9568),
    (8, "평택시", 36.9921, 127.1129),
    (9, "화성시", 37.1995, 126.8311),
    (10, "남양주시", 37.6360, 127.2165),
    (11, "파주시", 37.7600, 126.7798),
    (12, "김포시", 37.6152, 126.7159),
    (13, "이천시", 37.2720, 127.4350),
    (14, "안성시", 37.0080, 127.2797),
    (15, "의정부시", 37.7381, 127.0337),
    (16, "포천시", 37.8949, 127.2003),
    (17, "동두천시", 37.9036, 127.0606),
    (18, "광명시", 37.4786, 126.8644),
    (19, "군포시", 37.3616, 126.9352),
    (20, "양평군", 37.4917, 127.4875),
    (21, "양주시", 37.7852, 127.0459),
    (22, "구리시", 37.5943, 127.1296),
    (23, "오산시", 37.1499, 127.0775),
    (24, "하남시", 37.5393, 127.2148),
    (25, "광주시", 37.4293, 127.2553),
    (26, "연천군", 38.0966, 127.0750),
    (27, "여주시", 37.2984, 127.6370),
    (28, "가평군", 37.8315, 127.5105),
];

pub async fn init(db_pool: &SqlitePool) -> AppResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS chat_rooms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            room_name TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            location_name TEXT NOT NULL,
            radius_km REAL NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .execute(db_pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS chats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            chat_room_id INTEGER NOT NULL REFERENCES chat_rooms(id),
            message TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .execute(db_pool)
    .await?;

    Ok(())
}

/// Inserts the 28 regional rooms when the table is empty; reruns are no-ops.
pub async fn seed_rooms(db_pool: &SqlitePool) -> AppResult<()> {
    let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_rooms")
        .fetch_one(db_pool)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    for (id, region, latitude, longitude) in SEED_ROOMS {
        sqlx::query(
            "INSERT INTO chat_rooms (id, room_name, latitude, longitude, location_name, radius_km, is_active) \
             VALUES (?,?,?,?,?,?,1)",
        )
        .bind(id)
        .bind(format!("{region} 채팅방"))
        .bind(latitude)
        .bind(longitude)
        .bind(region)
        .bind(SEED_RADIUS_KM)
        .execute(db_pool)
        .await?;
    }

    info!("seeded {} regional chat rooms", SEED_ROOMS.len());

    Ok(())
}
