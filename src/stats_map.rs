use serde_json::{Map, Value};

use crate::model::{StatField, StatLine};
use crate::upstream::as_f64_any;

/// How one ontology field is read from the upstream statistics map.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// First listed key that is present and numeric.
    First(&'static [&'static str]),
    /// Sum over every listed key that is present and numeric; absent when
    /// none of them is.
    Sum(&'static [&'static str]),
}

/// Upstream key names drift between API versions; each field lists the
/// spellings it accepts in preference order.
pub const STAT_RULES: &[(StatField, Rule)] = &[
    (StatField::Appearances, Rule::First(&["appearances"])),
    (StatField::Goals, Rule::First(&["goals"])),
    (StatField::Assists, Rule::First(&["assists"])),
    (
        StatField::ExpectedGoals,
        Rule::First(&["expectedGoals", "expectedGoalsOnTargetConceded"]),
    ),
    (StatField::ExpectedAssists, Rule::First(&["expectedAssists"])),
    (
        StatField::TouchesInBox,
        Rule::First(&["touchesInOppositionBox", "touches"]),
    ),
    (StatField::PenaltiesTaken, Rule::First(&["penaltiesTaken"])),
    (StatField::HitWoodwork, Rule::First(&["hitWoodwork"])),
    (StatField::FreeKicksScored, Rule::First(&["freeKicksScored"])),
    (
        StatField::CrossesCompleted,
        Rule::Sum(&[
            "successfulCrosses",
            "successfulCrossesAndCorners",
            "successfulCrossesOpenPlay",
        ]),
    ),
    (StatField::MinutesPlayed, Rule::First(&["timePlayed"])),
    (StatField::DribblesCompleted, Rule::First(&["successfulDribbles"])),
    (StatField::DuelsWon, Rule::First(&["duelsWon"])),
    (StatField::AerialDuelsWon, Rule::First(&["aerialDuelsWon"])),
    (StatField::Tackles, Rule::First(&["totalTackles"])),
    (StatField::Interceptions, Rule::First(&["interceptions"])),
    (StatField::Blocks, Rule::First(&["blocks"])),
    (StatField::RedCards, Rule::First(&["totalRedCards"])),
    (StatField::YellowCards, Rule::First(&["yellowCards"])),
    (StatField::FoulsCommitted, Rule::First(&["fouls", "foulsCommitted"])),
    (StatField::Offsides, Rule::First(&["offsides"])),
    (StatField::OwnGoals, Rule::First(&["ownGoals"])),
    (StatField::CornersTaken, Rule::First(&["corners"])),
    (
        StatField::PassesCompleted,
        Rule::Sum(&[
            "successfulPasses",
            "successfulShortPasses",
            "successfulLongPasses",
            "successfulLaunches",
            "successfulCrosses",
            "successfulCrossesAndCorners",
            "successfulCrossesOpenPlay",
        ]),
    ),
];

impl Rule {
    pub fn apply(self, stats: &Map<String, Value>) -> Option<f64> {
        let numeric = |key: &&str| stats.get(*key).and_then(as_f64_any);
        match self {
            Rule::First(keys) => keys.iter().find_map(numeric),
            Rule::Sum(keys) => keys
                .iter()
                .filter_map(numeric)
                .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v)),
        }
    }
}

/// Maps an upstream statistics payload onto the ontology fields. A value
/// that is not numeric reads as absent; the rest of the line is kept.
pub fn map_stats(stats: &Map<String, Value>) -> StatLine {
    let mut line = StatLine::default();
    for (field, rule) in STAT_RULES {
        line.set(*field, rule.apply(stats));
    }
    line
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn stats(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn every_field_has_exactly_one_rule() {
        for field in StatField::ALL {
            let n = STAT_RULES.iter().filter(|(f, _)| f == field).count();
            assert_eq!(n, 1, "{}", field.key());
        }
    }

    #[test]
    fn first_match_takes_preference_order() {
        let line = map_stats(&stats(json!({
            "fouls": 4,
            "foulsCommitted": 9,
            "touches": 300,
        })));
        assert_eq!(line.fouls_committed, Some(4.0));
        assert_eq!(line.touches_in_box, Some(300.0));
    }

    #[test]
    fn zero_counts_as_present() {
        let line = map_stats(&stats(json!({"touchesInOppositionBox": 0, "touches": 300})));
        assert_eq!(line.touches_in_box, Some(0.0));
    }

    #[test]
    fn first_match_skips_malformed_values() {
        let line = map_stats(&stats(json!({"fouls": "n/a", "foulsCommitted": "7"})));
        assert_eq!(line.fouls_committed, Some(7.0));
    }

    #[test]
    fn passes_are_summed_across_categories() {
        let line = map_stats(&stats(json!({
            "successfulShortPasses": 100,
            "successfulLongPasses": 20,
            "successfulCrosses": 5,
            "successfulLaunches": null,
        })));
        assert_eq!(line.passes_completed, Some(125.0));
        assert_eq!(line.crosses_completed, Some(5.0));
    }

    #[test]
    fn unreported_fields_stay_none() {
        let line = map_stats(&stats(json!({"goals": 3, "yellowCards": "bad"})));
        assert_eq!(line.goals, Some(3.0));
        assert_eq!(line.yellow_cards, None);
        assert_eq!(line.passes_completed, None);
        assert_eq!(line.appearances, None);
    }
}
