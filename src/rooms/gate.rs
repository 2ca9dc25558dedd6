//! Per-request geofence check. Every message read and write passes through
//! [`check`] with the coordinate supplied on that request; there is no
//! session-level shortcut, so leaving the fence revokes access on the next
//! request.

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::warn;

use crate::{geo::{self, Coordinate}, rooms::{self, ChatRoom}, AppResult};

/// Expected user-facing outcomes. These are results, not faults: "no room
/// here" and "you've left the area" are normal control flow.
#[derive(Debug, Clone, PartialEq)]
pub enum Denial {
    NotFound,
    Inactive,
    OutOfRange { distance_km: f64, radius_km: f64 },
    UnresolvableRegion,
    InvalidArgument(String),
}

impl Denial {
    fn status(&self) -> StatusCode {
        match self {
            Denial::NotFound | Denial::UnresolvableRegion => StatusCode::NOT_FOUND,
            Denial::Inactive | Denial::OutOfRange { .. } => StatusCode::FORBIDDEN,
            Denial::InvalidArgument(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for Denial {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Denial::NotFound => json!({ "error": "not_found" }),
            Denial::Inactive => json!({ "error": "inactive" }),
            Denial::OutOfRange { distance_km, radius_km } => json!({
                "error": "out_of_range",
                "distance_km": distance_km,
                "radius_km": radius_km,
            }),
            Denial::UnresolvableRegion => json!({ "error": "unresolvable_region" }),
            Denial::InvalidArgument(message) => json!({
                "error": "invalid_argument",
                "message": message,
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Decides whether a user at `user` may read/write `room_id`. Pure function
/// of the room row and the coordinate; performs no writes. The boundary is
/// inclusive: a user at exactly the radius is allowed.
pub async fn check(
    db_pool: &SqlitePool,
    room_id: i64,
    user: Coordinate,
) -> AppResult<Result<ChatRoom, Denial>> {
    let Some(room) = rooms::get_by_id(db_pool, room_id).await? else {
        return Ok(Err(Denial::NotFound));
    };

    if !room.is_active {
        return Ok(Err(Denial::Inactive));
    }

    let distance_km = geo::distance_km(user, room.center());
    if distance_km > room.radius_km {
        warn!(
            "user outside room {room_id}: distance {distance_km:.3} km, radius {} km",
            room.radius_km
        );
        return Ok(Err(Denial::OutOfRange {
            distance_km,
            radius_km: room.radius_km,
        }));
    }

    Ok(Ok(room))
}
