use std::collections::{BTreeMap, BTreeSet};

use crate::model::{ClubId, PlayerId, PlayerSeasonRecord, SeasonId};

/// Accumulates co-occurrence groups: the players sharing a (season, club).
#[derive(Debug, Default)]
pub struct TeammateGraphBuilder {
    groups: BTreeMap<(SeasonId, ClubId), BTreeSet<PlayerId>>,
}

impl TeammateGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: &PlayerSeasonRecord) {
        let Some(key) = record.stat_key() else {
            return;
        };
        self.groups
            .entry((key.season_id, key.club_id))
            .or_default()
            .insert(key.player_id);
    }

    /// Every pair inside a group becomes a symmetric edge.
    pub fn freeze(self) -> TeammateGraph {
        let mut edges: BTreeMap<PlayerId, BTreeSet<PlayerId>> = BTreeMap::new();
        for members in self.groups.values() {
            for player in members {
                let entry = edges.entry(*player).or_default();
                entry.extend(members.iter().filter(|other| *other != player));
            }
        }
        TeammateGraph {
            teammates: edges
                .into_iter()
                .map(|(player, set)| (player, set.into_iter().collect()))
                .collect(),
        }
    }
}

/// Frozen teammate relation; each list is sorted ascending without self.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeammateGraph {
    teammates: BTreeMap<PlayerId, Vec<PlayerId>>,
}

impl TeammateGraph {
    pub fn teammates_of(&self, player: PlayerId) -> &[PlayerId] {
        self.teammates.get(&player).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.teammates.keys().copied()
    }
}

pub fn build_teammate_graph(records: &[PlayerSeasonRecord]) -> TeammateGraph {
    let mut builder = TeammateGraphBuilder::new();
    for record in records {
        builder.add(record);
    }
    builder.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(player: u64, season: u32, club: u64) -> PlayerSeasonRecord {
        PlayerSeasonRecord {
            player_id: Some(player),
            season_id: Some(season),
            current_team_id: Some(club),
            ..PlayerSeasonRecord::default()
        }
    }

    #[test]
    fn groups_by_season_and_club() {
        let graph = build_teammate_graph(&[
            rec(1, 2024, 10),
            rec(2, 2024, 10),
            rec(3, 2024, 11),
            rec(3, 2023, 10),
            rec(1, 2023, 10),
            rec(1, 2023, 10),
        ]);
        assert_eq!(graph.teammates_of(1), &[2, 3]);
        assert_eq!(graph.teammates_of(2), &[1]);
        assert_eq!(graph.teammates_of(3), &[1]);
        assert!(graph.teammates_of(99).is_empty());
    }

    #[test]
    fn relation_is_symmetric_without_self_loops() {
        let mut records = Vec::new();
        for p in 0..30u64 {
            records.push(rec(p, 2020 + (p % 3) as u32, 10 + p % 4));
            records.push(rec(p, 2024, 10 + p % 2));
        }
        let graph = build_teammate_graph(&records);
        for a in graph.players() {
            assert!(!graph.teammates_of(a).contains(&a));
            for b in graph.teammates_of(a) {
                assert!(graph.teammates_of(*b).contains(&a), "{a} -> {b}");
            }
        }
    }

    #[test]
    fn records_without_club_are_ignored() {
        let mut lone = rec(5, 2024, 10);
        lone.current_team_id = None;
        let graph = build_teammate_graph(&[lone, rec(6, 2024, 10)]);
        assert!(graph.teammates_of(5).is_empty());
        assert!(graph.teammates_of(6).is_empty());
    }
}
