use std::time::Duration;

const KAKAO_COORD2ADDRESS_URL: &str = "https://dapi.kakao.com/v2/local/geo/coord2address.json";
const DEFAULT_SEARCH_RADIUS_KM: f64 = 15.0;
const DEFAULT_GEOCODING_TIMEOUT_SECS: u64 = 3;

#[derive(Clone)]
pub struct AppConfig {
    pub geocoding_endpoint: String,
    pub geocoding_key: String,
    /// Upper bound on the reverse-geocoding call; a slow provider degrades
    /// to "no region" instead of hanging the request.
    pub geocoding_timeout: Duration,
    pub default_search_radius_km: f64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let geocoding_endpoint = dotenv::var("KAKAO_COORD2ADDRESS_URL")
            .unwrap_or_else(|_| KAKAO_COORD2ADDRESS_URL.to_owned());
        let geocoding_key = dotenv::var("KAKAO_REST_API_KEY").unwrap_or_default();
        let geocoding_timeout = dotenv::var("GEOCODING_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_GEOCODING_TIMEOUT_SECS));
        let default_search_radius_km = dotenv::var("SEARCH_RADIUS_KM")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SEARCH_RADIUS_KM);

        Self {
            geocoding_endpoint,
            geocoding_key,
            geocoding_timeout,
            default_search_radius_km,
        }
    }
}
