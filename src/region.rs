//! Maps a user coordinate to a community chat room: reverse-geocode the
//! coordinate to an administrative name, reduce it to a region key, and look
//! the key up in the fixed region table. The nearest-room search over the
//! room directory is the fallback when no regional mapping is wanted.

use std::collections::HashMap;

use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{config::AppConfig, geo::Coordinate, rooms::{self, ChatRoom}, AppResult, AppError, GetField};

/// Gyeonggi-do second-level regions and their room ids. Closed set: keys
/// outside this table fail the lookup, there is no fuzzy matching.
const GYEONGGI_REGION_ROOMS: [(&str, i64); 28] = [
    ("수원시", 1),
    ("성남시", 2),
    ("고양시", 3),
    ("용인시", 4),
    ("부천시", 5),
    ("안산시", 6),
    ("안양시", 7),
    ("평택시", 8),
    ("화성시", 9),
    ("남양주시", 10),
    ("파주시", 11),
    ("김포시", 12),
    ("이천시", 13),
    ("안성시", 14),
    ("의정부시", 15),
    ("포천시", 16),
    ("동두천시", 17),
    ("광명시", 18),
    ("군포시", 19),
    ("양평군", 20),
    ("양주시", 21),
    ("구리시", 22),
    ("오산시", 23),
    ("하남시", 24),
    ("광주시", 25),
    ("연천군", 26),
    ("여주시", 27),
    ("가평군", 28),
];

/// Reduces a raw second-level administrative name to its region key by
/// cutting at the first city (시) or county (군) suffix character, e.g.
/// "수원시 팔달구" becomes "수원시". Names without either suffix pass through
/// unchanged. Lossy when an earlier unrelated 시/군 occurs in the name.
pub fn region_key(raw: &str) -> &str {
    for (i, c) in raw.char_indices() {
        if c == '시' || c == '군' {
            return &raw[..i + c.len_utf8()];
        }
    }
    raw
}

#[derive(Clone)]
pub struct RegionRoomIndex {
    rooms: HashMap<&'static str, i64>,
}

impl Default for RegionRoomIndex {
    fn default() -> Self {
        Self {
            rooms: GYEONGGI_REGION_ROOMS.into_iter().collect(),
        }
    }
}

impl RegionRoomIndex {
    pub fn lookup(&self, key: &str) -> Option<i64> {
        self.rooms.get(key).copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'static str, i64)> + '_ {
        GYEONGGI_REGION_ROOMS.into_iter()
    }
}

/// The external reverse-geocoding collaborator. `None` covers every failure
/// mode (no match, malformed body, transport error); callers treat it as
/// "cannot auto-select" and fall back.
pub trait ReverseGeocoder {
    async fn region_name(&self, coord: Coordinate) -> Option<String>;
}

#[derive(Clone)]
pub struct KakaoGeocoder {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl KakaoGeocoder {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let http = reqwest::ClientBuilder::new()
            .timeout(config.geocoding_timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: config.geocoding_endpoint.clone(),
            api_key: config.geocoding_key.clone(),
        })
    }
}

impl ReverseGeocoder for KakaoGeocoder {
    async fn region_name(&self, coord: Coordinate) -> Option<String> {
        let url = format!(
            "{}?x={}&y={}&input_coord=WGS84",
            self.endpoint, coord.longitude, coord.latitude
        );

        let response = match self.http
            .get(&url)
            .header("Authorization", format!("KakaoAK {}", self.api_key))
            .send()
            .await
        {
            Ok(r) => r,
            Err(err) => {
                warn!("kakao coord2address call failed: {err}");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("kakao coord2address returned {}", response.status());
            return None;
        }

        let body: Value = match response.json().await {
            Ok(b) => b,
            Err(err) => {
                warn!("kakao coord2address body unreadable: {err}");
                return None;
            }
        };

        match extract_region_name(&body) {
            Ok(name) => {
                info!("resolved ({}, {}) to {name}", coord.latitude, coord.longitude);
                Some(name)
            }
            Err(err) => {
                warn!("kakao coord2address without region_2depth_name: {}", err.0);
                None
            }
        }
    }
}

fn extract_region_name(body: &Value) -> AppResult<String> {
    let meta = body.get_obj_field("meta")?;
    let total_count = meta.get("total_count").and_then(Value::as_i64).unwrap_or(0);
    if total_count == 0 {
        return Err(AppError::msg(format!("no address match in {body}")));
    }

    let document = body
        .get_obj_field("documents")?
        .get(0)
        .ok_or_else(|| AppError::msg(format!("expected documents[0] in {body}")))?;

    document.get_obj_field("address")?.get_str_field("region_2depth_name")
}

/// Primary selection path: region mapping. `None` at either step (provider
/// gave nothing, or the key is outside the covered set) short-circuits.
pub async fn select_room<G: ReverseGeocoder>(
    geocoder: &G,
    index: &RegionRoomIndex,
    user: Coordinate,
) -> Option<i64> {
    let raw = geocoder.region_name(user).await?;
    let key = region_key(&raw);

    let room_id = index.lookup(key);
    if room_id.is_none() {
        warn!("region {key} has no mapped room");
    }
    room_id
}

/// Fallback selection path: nearest active room by the directory's coarse
/// degree-space ranking. Proposes a room only; the access gate still decides
/// whether the caller is actually inside it.
pub async fn select_nearest_room(
    db_pool: &SqlitePool,
    user: Coordinate,
    search_radius_km: f64,
) -> AppResult<Option<ChatRoom>> {
    let candidates = rooms::find_nearest_candidates(db_pool, user, search_radius_km).await?;
    Ok(candidates.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedGeocoder(Option<&'static str>);

    impl ReverseGeocoder for FixedGeocoder {
        async fn region_name(&self, _coord: Coordinate) -> Option<String> {
            self.0.map(str::to_owned)
        }
    }

    fn seoul() -> Coordinate {
        Coordinate::new(37.5665, 126.9780)
    }

    #[test]
    fn region_key_cuts_at_city_suffix() {
        assert_eq!(region_key("수원시 팔달구"), "수원시");
    }

    #[test]
    fn region_key_keeps_bare_county_name() {
        assert_eq!(region_key("양평군"), "양평군");
    }

    #[test]
    fn region_key_passes_unsuffixed_names_through() {
        assert_eq!(region_key("종로구"), "종로구");
    }

    #[test]
    fn index_covers_all_28_regions() {
        let index = RegionRoomIndex::default();
        assert_eq!(index.lookup("수원시"), Some(1));
        assert_eq!(index.lookup("가평군"), Some(28));
        assert_eq!(index.entries().count(), 28);
    }

    #[test]
    fn index_fails_closed_outside_the_set() {
        let index = RegionRoomIndex::default();
        assert_eq!(index.lookup("종로구"), None);
        assert_eq!(index.lookup("부산시"), None);
    }

    #[tokio::test]
    async fn select_room_maps_a_covered_region() {
        let index = RegionRoomIndex::default();
        let got = select_room(&FixedGeocoder(Some("수원시 팔달구")), &index, seoul()).await;
        assert_eq!(got, Some(1));
    }

    #[tokio::test]
    async fn select_room_is_none_when_provider_fails() {
        let index = RegionRoomIndex::default();
        let got = select_room(&FixedGeocoder(None), &index, seoul()).await;
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn select_room_is_none_outside_the_covered_set() {
        let index = RegionRoomIndex::default();
        let got = select_room(&FixedGeocoder(Some("종로구")), &index, seoul()).await;
        assert_eq!(got, None);
    }
}
