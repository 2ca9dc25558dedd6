use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::cors::CorsLayer;

use tripchat::{config::AppConfig, db, region::{KakaoGeocoder, RegionRoomIndex}, rooms, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let config = AppConfig::from_env();

    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(dotenv::var("DATABASE_URL").unwrap().as_str())
        .await.unwrap();
    db::init(&db_pool).await.unwrap();
    db::seed_rooms(&db_pool).await.unwrap();

    let geocoder = KakaoGeocoder::new(&config).unwrap();
    let app_state = AppState {
        db_pool,
        geocoder,
        regions: RegionRoomIndex::default(),
        config,
    };

    let app = Router::new()
        .nest("/api/chat", rooms::router())
        .with_state(app_state)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
