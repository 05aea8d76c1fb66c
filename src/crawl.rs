use std::ops::RangeInclusive;

use tracing::{info, warn};

use crate::config::Endpoints;
use crate::fetch::{DetailCache, Fetcher};
use crate::key_index::KeyIndex;
use crate::merge::{Step, first_present, text};
use crate::model::{PlayerId, PlayerSeasonRecord, SeasonId};
use crate::names::join_name;
use crate::upstream::{ApiPlayer, parse_player};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub seasons_total: usize,
    pub seasons_listed: usize,
    pub entries_seen: usize,
    pub entries_skipped: usize,
    pub duplicates: usize,
    pub details_requested: usize,
    pub details_missing: usize,
    pub records: usize,
}

/// Listing entry and its per-season detail, the two sources of a raw record.
pub struct EntrySources<'a> {
    pub entry: &'a ApiPlayer,
    pub detail: Option<&'a ApiPlayer>,
}

fn shirt_number_chain<'a>() -> [Step<EntrySources<'a>, u64>; 2] {
    [
        Step::new("detail", |s: &EntrySources<'a>| {
            s.detail.and_then(|d| d.shirt_num).filter(|n| *n > 0)
        }),
        Step::new("listing", |s: &EntrySources<'a>| s.entry.shirt_num.filter(|n| *n > 0)),
    ]
}

fn position_chain<'a>() -> [Step<EntrySources<'a>, String>; 2] {
    [
        Step::new("listing", |s: &EntrySources<'a>| text(s.entry.position.as_ref())),
        Step::new("detail", |s: &EntrySources<'a>| {
            s.detail.and_then(|d| text(d.position.as_ref()))
        }),
    ]
}

fn preferred_foot_chain<'a>() -> [Step<EntrySources<'a>, String>; 2] {
    [
        Step::new("detail", |s: &EntrySources<'a>| {
            s.detail.and_then(|d| text(d.preferred_foot.as_ref()))
        }),
        Step::new("listing", |s: &EntrySources<'a>| text(s.entry.preferred_foot.as_ref())),
    ]
}

/// Builds the raw record for one listing entry. Physical attributes and
/// dates only exist on the detail resource.
pub fn merge_player_info(
    entry: &ApiPlayer,
    detail: Option<&ApiPlayer>,
    season_id: SeasonId,
    competition_id: u32,
) -> PlayerSeasonRecord {
    let sources = EntrySources { entry, detail };
    let name = entry.name.as_ref();
    let first_name = name.and_then(|n| text(n.first_name.as_ref()));
    let last_name = name.and_then(|n| text(n.last_name.as_ref()));
    let country = entry.country.as_ref();
    let team = entry.current_team.as_ref();
    let dates = detail.and_then(|d| d.dates.as_ref());

    PlayerSeasonRecord {
        player_id: entry.id.player_id,
        competition_id: Some(competition_id),
        season_id: Some(season_id),
        full_name: join_name(first_name.as_deref(), last_name.as_deref()),
        first_name,
        last_name,
        position: first_present(&position_chain(), &sources),
        preferred_foot: first_present(&preferred_foot_chain(), &sources),
        shirt_number: first_present(&shirt_number_chain(), &sources)
            .and_then(|n| u32::try_from(n).ok()),
        height_cm: detail
            .and_then(|d| d.height)
            .and_then(|h| u32::try_from(h).ok()),
        weight_kg: detail
            .and_then(|d| d.weight)
            .and_then(|w| u32::try_from(w).ok()),
        date_of_birth: dates.and_then(|d| d.birth.clone()),
        joined_club_date: dates.and_then(|d| d.joined_club.clone()),
        country: country.and_then(|c| c.country.clone()),
        country_iso: country.and_then(|c| c.iso_code.clone()),
        demonym: country.and_then(|c| c.demonym.clone()),
        country_of_birth: detail.and_then(|d| d.country_of_birth.clone()),
        current_team_id: team.and_then(|t| t.id),
        current_team_name: team.and_then(|t| t.name.clone()),
        current_team_short_name: team.and_then(|t| t.short_name.clone()),
    }
}

/// Crawls every season in `seasons`: the paginated listing, then the
/// per-season detail of each distinct player. A season whose listing fails
/// contributes nothing and the crawl moves on.
pub fn crawl_players(
    fetcher: &Fetcher,
    endpoints: &Endpoints,
    competition_id: u32,
    seasons: RangeInclusive<SeasonId>,
    page_limit: u32,
) -> (Vec<PlayerSeasonRecord>, CrawlSummary) {
    let mut summary = CrawlSummary::default();
    let details: DetailCache<(PlayerId, SeasonId), ApiPlayer> = DetailCache::new();
    let emitted = KeyIndex::new();
    let mut records = Vec::new();

    for season_id in seasons {
        summary.seasons_total += 1;
        let url = endpoints.season_players(competition_id, season_id);
        let Some(listing) = fetcher.get_paginated(&url, page_limit) else {
            warn!(season_id, "season listing unavailable, skipping season");
            continue;
        };
        summary.seasons_listed += 1;
        summary.entries_seen += listing.len();

        let mut entries = Vec::with_capacity(listing.len());
        for raw in &listing {
            match parse_player(raw) {
                Some(entry) if entry.id.player_id.is_some() => entries.push(entry),
                _ => summary.entries_skipped += 1,
            }
        }

        let keys: Vec<(PlayerId, SeasonId)> = entries
            .iter()
            .filter_map(|e| e.id.player_id.map(|p| (p, season_id)))
            .collect();
        summary.details_requested += details.warm(fetcher, keys, |(player_id, season_id)| {
            let url = endpoints.season_player(competition_id, *season_id, *player_id);
            fetcher.get_json(&url).as_ref().and_then(parse_player)
        });

        let before = records.len();
        for entry in &entries {
            let Some(player_id) = entry.id.player_id else {
                continue;
            };
            if !emitted.observe((player_id, season_id)) {
                summary.duplicates += 1;
                continue;
            }
            let detail = details.get(&(player_id, season_id));
            records.push(merge_player_info(
                entry,
                detail.as_ref(),
                season_id,
                competition_id,
            ));
        }
        info!(season_id, players = records.len() - before, "season crawled");
    }

    summary.details_missing = details.misses();
    summary.records = records.len();
    (records, summary)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn player(v: serde_json::Value) -> ApiPlayer {
        parse_player(&v).unwrap()
    }

    #[test]
    fn detail_overrides_shirt_and_foot_listing_keeps_position() {
        let entry = player(json!({
            "id": {"playerId": 7},
            "name": {"firstName": "Bukayo", "lastName": "Saka"},
            "position": "Forward",
            "preferredFoot": "Right",
            "shirtNum": 77,
            "country": {"country": "England", "isoCode": "GB-ENG", "demonym": "English"},
            "currentTeam": {"id": 3, "name": "Arsenal", "shortName": "ARS"}
        }));
        let detail = player(json!({
            "position": "Midfielder",
            "preferredFoot": "Left",
            "shirtNum": 7,
            "height": 178,
            "dates": {"birth": "2001-09-05", "joinedClub": "2019-01-01"}
        }));
        let rec = merge_player_info(&entry, Some(&detail), 2024, 8);
        assert_eq!(rec.full_name.as_deref(), Some("Bukayo Saka"));
        assert_eq!(rec.position.as_deref(), Some("Forward"));
        assert_eq!(rec.preferred_foot.as_deref(), Some("Left"));
        assert_eq!(rec.shirt_number, Some(7));
        assert_eq!(rec.height_cm, Some(178));
        assert_eq!(rec.date_of_birth.as_deref(), Some("2001-09-05"));
        assert_eq!(rec.current_team_id, Some(3));
        assert_eq!(rec.country_iso.as_deref(), Some("GB-ENG"));
    }

    #[test]
    fn missing_detail_falls_back_to_listing() {
        let entry = player(json!({
            "id": {"playerId": 7},
            "preferredFoot": "Right",
            "shirtNum": "77"
        }));
        let rec = merge_player_info(&entry, None, 2023, 8);
        assert_eq!(rec.preferred_foot.as_deref(), Some("Right"));
        assert_eq!(rec.shirt_number, Some(77));
        assert_eq!(rec.height_cm, None);
        assert_eq!(rec.full_name, None);
        assert_eq!(rec.season_key(), Some((7, 2023)));
    }

    #[test]
    fn blank_listing_position_uses_detail() {
        let entry = player(json!({"id": {"playerId": 1}, "position": " "}));
        let detail = player(json!({"position": "Defender"}));
        let rec = merge_player_info(&entry, Some(&detail), 2024, 8);
        assert_eq!(rec.position.as_deref(), Some("Defender"));
    }

    #[test]
    fn zero_shirt_number_is_unassigned() {
        let entry = player(json!({"id": {"playerId": 1}, "shirtNum": 14}));
        let detail = player(json!({"shirtNum": 0}));
        let rec = merge_player_info(&entry, Some(&detail), 2024, 8);
        assert_eq!(rec.shirt_number, Some(14));

        let entry = player(json!({"id": {"playerId": 1}, "shirtNum": "0"}));
        let rec = merge_player_info(&entry, None, 2024, 8);
        assert_eq!(rec.shirt_number, None);
    }
}
