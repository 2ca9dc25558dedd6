pub mod config;
pub mod db;
pub mod geo;
pub mod region;
pub mod rooms;

use axum::{extract::FromRef, http::StatusCode, response::{IntoResponse, Response}};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::{config::AppConfig, region::{KakaoGeocoder, RegionRoomIndex}};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub geocoder: KakaoGeocoder,
    pub regions: RegionRoomIndex,
    pub config: AppConfig,
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> AppResult<String>;
    fn get_obj_field(&self, field: &str) -> AppResult<&Value>;
}

impl GetField for serde_json::Value {
    fn get_str_field(&self, field: &str) -> AppResult<String> {
        Ok(
            self.get(field)
            .ok_or_else(|| AppError::msg(format!("expected {field} in {self}")))?
            .as_str()
            .ok_or_else(|| AppError::msg(format!("expected {field} in {self} to be string")))?
            .to_owned()
        )
    }

    fn get_obj_field(&self, field: &str) -> AppResult<&Value> {
        self.get(field)
        .ok_or_else(|| AppError::msg(format!("expected {field} in {self}")))
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Infrastructure fault. Expected user-facing outcomes (unknown room,
/// out of range, unresolvable region) are [`rooms::gate::Denial`], not this.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn msg(msg: String) -> Self {
        Self(anyhow::Error::msg(msg))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{}\n\n{}", self.0, self.0.backtrace()),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
