use std::fmt;

use serde::{Deserialize, Serialize};

use crate::upstream::lenient;

pub type PlayerId = u64;
pub type ClubId = u64;
pub type SeasonId = u32;

/// One player as listed for one season, merged with that season's detail.
/// Raw records are written once by the crawl and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerSeasonRecord {
    #[serde(deserialize_with = "lenient::uint")]
    pub player_id: Option<PlayerId>,
    #[serde(deserialize_with = "lenient::uint32")]
    pub competition_id: Option<u32>,
    #[serde(deserialize_with = "lenient::uint32")]
    pub season_id: Option<SeasonId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub preferred_foot: Option<String>,
    #[serde(deserialize_with = "lenient::uint32")]
    pub shirt_number: Option<u32>,
    #[serde(deserialize_with = "lenient::uint32")]
    pub height_cm: Option<u32>,
    #[serde(deserialize_with = "lenient::uint32")]
    pub weight_kg: Option<u32>,
    pub date_of_birth: Option<String>,
    pub joined_club_date: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "countryISO")]
    pub country_iso: Option<String>,
    pub demonym: Option<String>,
    pub country_of_birth: Option<String>,
    #[serde(deserialize_with = "lenient::uint")]
    pub current_team_id: Option<ClubId>,
    pub current_team_name: Option<String>,
    pub current_team_short_name: Option<String>,
}

impl PlayerSeasonRecord {
    pub fn season_key(&self) -> Option<(PlayerId, SeasonId)> {
        Some((self.player_id?, self.season_id?))
    }

    /// `None` when any of player, season or club is missing; such records
    /// take no part in stats, teammates or clubs.
    pub fn stat_key(&self) -> Option<StatKey> {
        Some(StatKey {
            player_id: self.player_id?,
            season_id: self.season_id?,
            club_id: self.current_team_id?,
        })
    }
}

/// Uniqueness boundary of a [`PlayerSeasonStats`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatKey {
    pub player_id: PlayerId,
    pub season_id: SeasonId,
    pub club_id: ClubId,
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.player_id, self.season_id, self.club_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub player_id: PlayerId,
    pub full_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub nationality: Option<String>,
    #[serde(rename = "nationalityISO")]
    pub nationality_iso: Option<String>,
    pub demonym: Option<String>,
    pub preferred_foot: Option<String>,
    pub height_cm: Option<u32>,
    pub weight_kg: Option<u32>,
    pub position: Option<String>,
    pub shirt_number: Option<u32>,
    pub joined_season: Option<SeasonId>,
    pub total_appearances: Option<u32>,
    pub total_goals: Option<u32>,
    pub total_assists: Option<u32>,
    pub plays_for: Option<ClubId>,
    pub has_position: Option<String>,
    pub has_nationality: Option<String>,
    #[serde(default)]
    pub has_season_stats: Vec<String>,
    #[serde(default)]
    pub teammate_with: Vec<PlayerId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    pub club_id: ClubId,
    pub club_name: String,
    pub foundation_year: Option<u32>,
    pub stadium: Option<String>,
    pub location: Option<Location>,
    #[serde(default)]
    pub has_player: Vec<PlayerId>,
    #[serde(default)]
    pub participates_in: Vec<SeasonId>,
    #[serde(default)]
    pub has_season_stats: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub season_id: SeasonId,
    pub season_name: String,
    pub start_year: String,
    pub end_year: String,
    #[serde(default)]
    pub includes_player_season_stats: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSeasonStats {
    pub player_season_stats_id: String,
    pub player_id: PlayerId,
    pub season_id: SeasonId,
    pub club_id: ClubId,
    #[serde(flatten)]
    pub line: StatLine,
}

impl PlayerSeasonStats {
    pub fn new(key: StatKey, line: StatLine) -> Self {
        Self {
            player_season_stats_id: key.to_string(),
            player_id: key.player_id,
            season_id: key.season_id,
            club_id: key.club_id,
            line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nationality {
    pub country_id: String,
    pub country_name: String,
    pub iso_code: Option<String>,
    pub demonym: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub position_id: String,
    pub position_name: String,
}

macro_rules! stat_fields {
    ($($variant:ident => $field:ident, $key:literal;)+) => {
        /// Statistic fields of the ontology, in output order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StatField {
            $($variant,)+
        }

        impl StatField {
            pub const ALL: &'static [StatField] = &[$(StatField::$variant,)+];

            /// Output key and predicate name.
            pub fn key(self) -> &'static str {
                match self {
                    $(StatField::$variant => $key,)+
                }
            }
        }

        /// Per-season statistic values. `None` means upstream never reported
        /// the field, which is kept distinct from a reported zero.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct StatLine {
            $(#[serde(default)] pub $field: Option<f64>,)+
        }

        impl StatLine {
            pub fn get(&self, field: StatField) -> Option<f64> {
                match field {
                    $(StatField::$variant => self.$field,)+
                }
            }

            pub fn set(&mut self, field: StatField, value: Option<f64>) {
                match field {
                    $(StatField::$variant => self.$field = value,)+
                }
            }
        }
    };
}

stat_fields! {
    Appearances => appearances, "appearances";
    Goals => goals, "goals";
    Assists => assists, "assists";
    ExpectedGoals => expected_goals, "expectedGoals";
    ExpectedAssists => expected_assists, "expectedAssists";
    TouchesInBox => touches_in_box, "touchesInBox";
    PenaltiesTaken => penalties_taken, "penaltiesTaken";
    HitWoodwork => hit_woodwork, "hitWoodwork";
    FreeKicksScored => free_kicks_scored, "freeKicksScored";
    CrossesCompleted => crosses_completed, "crossesCompleted";
    MinutesPlayed => minutes_played, "minutesPlayed";
    DribblesCompleted => dribbles_completed, "dribblesCompleted";
    DuelsWon => duels_won, "duelsWon";
    AerialDuelsWon => aerial_duels_won, "aerialDuelsWon";
    Tackles => tackles, "tackles";
    Interceptions => interceptions, "interceptions";
    Blocks => blocks, "blocks";
    RedCards => red_cards, "redCards";
    YellowCards => yellow_cards, "yellowCards";
    FoulsCommitted => fouls_committed, "foulsCommitted";
    Offsides => offsides, "offsides";
    OwnGoals => own_goals, "ownGoals";
    CornersTaken => corners_taken, "cornersTaken";
    PassesCompleted => passes_completed, "passesCompleted";
}
