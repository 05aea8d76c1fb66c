use tracing::info;

use crate::config::Endpoints;
use crate::fetch::{DetailCache, Fetcher};
use crate::key_index::dedup_by_key;
use crate::model::{PlayerId, PlayerSeasonRecord, PlayerSeasonStats, SeasonId, StatKey, StatLine};
use crate::stats_map::map_stats;
use crate::upstream::stats_object;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSummary {
    pub records_in: usize,
    pub keyless: usize,
    pub triples: usize,
    pub requests: usize,
    pub unavailable: usize,
}

/// Distinct (player, season, club) triples in first-seen order. Records
/// missing any of the three ids are left out.
pub fn unique_stat_keys(records: &[PlayerSeasonRecord]) -> Vec<StatKey> {
    dedup_by_key(records.iter().filter_map(PlayerSeasonRecord::stat_key), |k| Some(*k))
}

/// One stats record per observed triple, sorted by key. The stats resource
/// is per (player, season), so it is fetched once per pair even if the pair
/// shows up under several clubs. A triple whose stats never arrive still
/// gets a record, with every field unknown.
pub fn build_player_season_stats(
    fetcher: &Fetcher,
    endpoints: &Endpoints,
    competition_id: u32,
    records: &[PlayerSeasonRecord],
) -> (Vec<PlayerSeasonStats>, StatsSummary) {
    let mut keys = unique_stat_keys(records);
    keys.sort();

    let cache: DetailCache<(PlayerId, SeasonId), StatLine> = DetailCache::new();
    let requests = cache.warm(
        fetcher,
        keys.iter().map(|k| (k.player_id, k.season_id)),
        |(player_id, season_id)| {
            let url = endpoints.player_season_stats(competition_id, *season_id, *player_id);
            let body = fetcher.get_json(&url)?;
            stats_object(&body).map(map_stats)
        },
    );

    let stats: Vec<PlayerSeasonStats> = keys
        .iter()
        .map(|key| {
            let line = cache
                .get(&(key.player_id, key.season_id))
                .unwrap_or_default();
            PlayerSeasonStats::new(*key, line)
        })
        .collect();

    let summary = StatsSummary {
        records_in: records.len(),
        keyless: records.iter().filter(|r| r.stat_key().is_none()).count(),
        triples: keys.len(),
        requests,
        unavailable: cache.misses(),
    };
    info!(
        triples = summary.triples,
        requests = summary.requests,
        unavailable = summary.unavailable,
        "player season stats built"
    );
    (stats, summary)
}
