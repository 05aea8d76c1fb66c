//! Lenient shapes of the upstream payloads.
//!
//! The SDP API mixes strings and numbers for the same field across endpoints
//! and versions, so every scalar goes through the coercion helpers below and
//! a value of the wrong shape reads as absent instead of failing the record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Player object as returned by the season listing, the per-season detail
/// endpoint and the all-variants lookup. The three share one shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiPlayer {
    #[serde(deserialize_with = "lenient::nested_or_default")]
    pub id: ApiPlayerId,
    #[serde(deserialize_with = "lenient::nested")]
    pub name: Option<ApiName>,
    #[serde(deserialize_with = "lenient::nested")]
    pub country: Option<ApiCountry>,
    #[serde(deserialize_with = "lenient::nested")]
    pub current_team: Option<ApiTeamRef>,
    #[serde(deserialize_with = "lenient::text")]
    pub position: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub preferred_foot: Option<String>,
    #[serde(deserialize_with = "lenient::uint")]
    pub shirt_num: Option<u64>,
    #[serde(deserialize_with = "lenient::uint")]
    pub height: Option<u64>,
    #[serde(deserialize_with = "lenient::uint")]
    pub weight: Option<u64>,
    #[serde(deserialize_with = "lenient::nested")]
    pub dates: Option<ApiDates>,
    #[serde(deserialize_with = "lenient::text")]
    pub country_of_birth: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiPlayerId {
    #[serde(deserialize_with = "lenient::uint")]
    pub player_id: Option<u64>,
    #[serde(deserialize_with = "lenient::text")]
    pub competition_id: Option<String>,
    #[serde(deserialize_with = "lenient::uint")]
    pub season_id: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiName {
    #[serde(deserialize_with = "lenient::text")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiCountry {
    #[serde(deserialize_with = "lenient::text")]
    pub country: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub iso_code: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub demonym: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiTeamRef {
    #[serde(deserialize_with = "lenient::uint")]
    pub id: Option<u64>,
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub short_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiDates {
    #[serde(deserialize_with = "lenient::text")]
    pub birth: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub joined_club: Option<String>,
}

/// One page of the cursor-paginated player listing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Page {
    pub data: Vec<Value>,
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Pagination {
    #[serde(rename = "_next", deserialize_with = "lenient::text")]
    pub next: Option<String>,
}

/// Team detail from the football API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TeamDetail {
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    pub grounds: Vec<Ground>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Ground {
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    /// Either an object carrying coordinates or a bare city name.
    pub city: Option<Value>,
}

impl Ground {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let city = self.city.as_ref()?.as_object()?;
        let lat = city.get("latitude").and_then(as_f64_any)?;
        let lon = city.get("longitude").and_then(as_f64_any)?;
        Some((lat, lon))
    }
}

/// Entry of the static club metadata resource.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClubMetadata {
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub stadium: Option<String>,
}

pub fn parse_player(raw: &Value) -> Option<ApiPlayer> {
    serde_json::from_value(raw.clone()).ok()
}

pub fn parse_team_detail(raw: &Value) -> Option<TeamDetail> {
    serde_json::from_value(raw.clone()).ok()
}

/// The metadata resource is an array; entries of the wrong shape are dropped.
pub fn parse_club_metadata(raw: &Value) -> Vec<ClubMetadata> {
    raw.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// The all-variants lookup answers either with a bare array or with the
/// array wrapped under `players`. Anything else means "no variants".
pub fn parse_variants(raw: &Value) -> Option<Vec<ApiPlayer>> {
    let items = match raw {
        Value::Array(items) => items,
        Value::Object(obj) => obj.get("players")?.as_array()?,
        _ => return None,
    };
    Some(items.iter().filter_map(parse_player).collect())
}

/// Statistics map from the v2 stats endpoint (`{"stats": {...}}`).
pub fn stats_object(raw: &Value) -> Option<&Map<String, Value>> {
    raw.get("stats")?.as_object()
}

pub fn as_u64_any(v: &Value) -> Option<u64> {
    if let Some(n) = v.as_u64() {
        return Some(n);
    }
    if let Some(f) = v.as_f64() {
        return (f >= 0.0 && f.fract() == 0.0).then_some(f as u64);
    }
    v.as_str()?.trim().parse::<u64>().ok()
}

pub fn as_f64_any(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return n.is_finite().then_some(n);
    }
    let parsed = v.as_str()?.trim().parse::<f64>().ok()?;
    parsed.is_finite().then_some(parsed)
}

pub fn as_text_any(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) mod lenient {
    use super::*;

    pub fn text<'de, D>(de: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(de)?;
        Ok(raw.as_ref().and_then(as_text_any))
    }

    pub fn uint<'de, D>(de: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(de)?;
        Ok(raw.as_ref().and_then(as_u64_any))
    }

    /// Nested object that reads as absent when it has the wrong shape.
    pub fn nested<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let raw = Option::<Value>::deserialize(de)?;
        Ok(raw.and_then(|v| serde_json::from_value(v).ok()))
    }

    pub fn nested_or_default<'de, D, T>(de: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(nested(de)?.unwrap_or_default())
    }

    pub fn uint32<'de, D>(de: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(de)?;
        Ok(raw
            .as_ref()
            .and_then(as_u64_any)
            .and_then(|n| u32::try_from(n).ok()))
    }
}
