use std::collections::BTreeMap;

use crate::model::{PlayerSeasonStats, Season, SeasonId};

/// "2024/25" style label; the century wraps, so 1999 gives "1999/00".
pub fn season_name(season_id: SeasonId) -> String {
    format!("{season_id}/{:02}", end_year(season_id) % 100)
}

/// Calendar year the season ends in, pinned at the top of the id range.
pub fn end_year(season_id: SeasonId) -> SeasonId {
    season_id.saturating_add(1)
}

#[derive(Debug, Default)]
pub struct SeasonsBuilder {
    stats_by_season: BTreeMap<SeasonId, Vec<String>>,
}

impl SeasonsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, stats: &PlayerSeasonStats) {
        self.stats_by_season
            .entry(stats.season_id)
            .or_default()
            .push(stats.player_season_stats_id.clone());
    }

    /// Seasons ordered by id, each with its sorted stat ids.
    pub fn freeze(self) -> Vec<Season> {
        self.stats_by_season
            .into_iter()
            .map(|(season_id, mut ids)| {
                ids.sort();
                ids.dedup();
                Season {
                    season_id,
                    season_name: season_name(season_id),
                    start_year: season_id.to_string(),
                    end_year: end_year(season_id).to_string(),
                    includes_player_season_stats: ids,
                }
            })
            .collect()
    }
}

pub fn build_seasons(stats: &[PlayerSeasonStats]) -> Vec<Season> {
    let mut builder = SeasonsBuilder::new();
    for record in stats {
        builder.add(record);
    }
    builder.freeze()
}
