use std::collections::HashMap;

use crate::model::{Player, PlayerId, PlayerSeasonStats};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub appearances: f64,
    pub goals: f64,
    pub assists: f64,
}

impl Totals {
    fn add(&mut self, stats: &PlayerSeasonStats) {
        self.appearances += stats.line.appearances.unwrap_or(0.0);
        self.goals += stats.line.goals.unwrap_or(0.0);
        self.assists += stats.line.assists.unwrap_or(0.0);
    }
}

/// Career sums per player. Unknown values count as zero here and only here;
/// the stat records themselves are left untouched.
pub fn rollup(stats: &[PlayerSeasonStats]) -> HashMap<PlayerId, Totals> {
    let mut totals: HashMap<PlayerId, Totals> = HashMap::new();
    for record in stats {
        totals.entry(record.player_id).or_default().add(record);
    }
    totals
}

fn as_count(value: f64) -> u32 {
    value.round().clamp(0.0, u32::MAX as f64) as u32
}

/// Overwrites the totals of every player, zero for players without stats,
/// and lists each player's stat ids in `hasSeasonStats`.
pub fn apply_totals(players: &mut [Player], stats: &[PlayerSeasonStats]) {
    let totals = rollup(stats);
    let mut stat_ids: HashMap<PlayerId, Vec<String>> = HashMap::new();
    for record in stats {
        stat_ids
            .entry(record.player_id)
            .or_default()
            .push(record.player_season_stats_id.clone());
    }

    for player in players {
        let sums = totals.get(&player.player_id).copied().unwrap_or_default();
        player.total_appearances = Some(as_count(sums.appearances));
        player.total_goals = Some(as_count(sums.goals));
        player.total_assists = Some(as_count(sums.assists));

        let mut ids = stat_ids.remove(&player.player_id).unwrap_or_default();
        ids.sort();
        ids.dedup();
        player.has_season_stats = ids;
    }
}
