use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::config::Endpoints;
use crate::fetch::{DetailCache, Fetcher};
use crate::merge::{Step, first_present, text};
use crate::model::{Player, PlayerId, PlayerSeasonRecord};
use crate::names::join_name;
use crate::teammates::TeammateGraph;
use crate::upstream::{ApiPlayer, parse_variants};
use crate::variants::{ResolvedVariant, resolve_variants};
use crate::vocab::{nationality_id, position_entry};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayersSummary {
    pub candidates: usize,
    pub variant_requests: usize,
    pub without_variants: usize,
    pub outside_competition: usize,
    pub players: usize,
}

/// Resolved variant and the player's first raw record.
pub struct PlayerSources<'a> {
    pub variant: &'a ResolvedVariant,
    pub raw: &'a PlayerSeasonRecord,
}

type TextChain<'a> = [Step<PlayerSources<'a>, String>; 2];
type CountChain<'a> = [Step<PlayerSources<'a>, u32>; 2];

fn first_name_chain<'a>() -> TextChain<'a> {
    [
        Step::new("variant", |s: &PlayerSources<'a>| text(s.variant.first_name.as_ref())),
        Step::new("raw", |s: &PlayerSources<'a>| text(s.raw.first_name.as_ref())),
    ]
}

fn last_name_chain<'a>() -> TextChain<'a> {
    [
        Step::new("variant", |s: &PlayerSources<'a>| text(s.variant.last_name.as_ref())),
        Step::new("raw", |s: &PlayerSources<'a>| text(s.raw.last_name.as_ref())),
    ]
}

/// Name parts are joined within one source, never across sources.
fn full_name_chain<'a>() -> [Step<PlayerSources<'a>, String>; 3] {
    [
        Step::new("variant", |s: &PlayerSources<'a>| {
            join_name(
                s.variant.first_name.as_deref(),
                s.variant.last_name.as_deref(),
            )
        }),
        Step::new("raw", |s: &PlayerSources<'a>| {
            join_name(s.raw.first_name.as_deref(), s.raw.last_name.as_deref())
        }),
        Step::new("raw_full", |s: &PlayerSources<'a>| text(s.raw.full_name.as_ref())),
    ]
}

fn nationality_chain<'a>() -> TextChain<'a> {
    [
        Step::new("variant", |s: &PlayerSources<'a>| text(s.variant.nationality.as_ref())),
        Step::new("raw", |s: &PlayerSources<'a>| text(s.raw.country.as_ref())),
    ]
}

fn nationality_iso_chain<'a>() -> TextChain<'a> {
    [
        Step::new("variant", |s: &PlayerSources<'a>| {
            text(s.variant.nationality_iso.as_ref())
        }),
        Step::new("raw", |s: &PlayerSources<'a>| text(s.raw.country_iso.as_ref())),
    ]
}

fn demonym_chain<'a>() -> TextChain<'a> {
    [
        Step::new("variant", |s: &PlayerSources<'a>| text(s.variant.demonym.as_ref())),
        Step::new("raw", |s: &PlayerSources<'a>| text(s.raw.demonym.as_ref())),
    ]
}

fn preferred_foot_chain<'a>() -> TextChain<'a> {
    [
        Step::new("variant", |s: &PlayerSources<'a>| {
            text(s.variant.preferred_foot.as_ref())
        }),
        Step::new("raw", |s: &PlayerSources<'a>| text(s.raw.preferred_foot.as_ref())),
    ]
}

fn position_chain<'a>() -> TextChain<'a> {
    [
        Step::new("variant", |s: &PlayerSources<'a>| text(s.variant.position.as_ref())),
        Step::new("raw", |s: &PlayerSources<'a>| text(s.raw.position.as_ref())),
    ]
}

fn date_of_birth_chain<'a>() -> TextChain<'a> {
    [
        Step::new("variant", |s: &PlayerSources<'a>| {
            text(s.variant.date_of_birth.as_ref())
        }),
        Step::new("raw", |s: &PlayerSources<'a>| text(s.raw.date_of_birth.as_ref())),
    ]
}

fn height_chain<'a>() -> CountChain<'a> {
    [
        Step::new("variant", |s: &PlayerSources<'a>| s.variant.height_cm),
        Step::new("raw", |s: &PlayerSources<'a>| s.raw.height_cm),
    ]
}

fn weight_chain<'a>() -> CountChain<'a> {
    [
        Step::new("variant", |s: &PlayerSources<'a>| s.variant.weight_kg),
        Step::new("raw", |s: &PlayerSources<'a>| s.raw.weight_kg),
    ]
}

/// Merges one player from their resolved variant and raw season records
/// (in input order, at least one). Totals and `hasSeasonStats` are left
/// for the totals step.
pub fn assemble_player(
    player_id: PlayerId,
    variant: &ResolvedVariant,
    records: &[&PlayerSeasonRecord],
    teammates: &TeammateGraph,
) -> Player {
    let fallback = PlayerSeasonRecord::default();
    let raw = records.first().copied().unwrap_or(&fallback);
    let sources = PlayerSources { variant, raw };

    let first_name = first_present(&first_name_chain(), &sources);
    let last_name = first_present(&last_name_chain(), &sources);
    let full_name = first_present(&full_name_chain(), &sources)
        .unwrap_or_else(|| player_id.to_string());

    let nationality = first_present(&nationality_chain(), &sources);
    let nationality_iso = first_present(&nationality_iso_chain(), &sources);
    let position = first_present(&position_chain(), &sources);

    Player {
        player_id,
        full_name,
        first_name,
        last_name,
        date_of_birth: first_present(&date_of_birth_chain(), &sources),
        has_nationality: nationality_id(nationality.as_ref(), nationality_iso.as_ref()),
        nationality,
        nationality_iso,
        demonym: first_present(&demonym_chain(), &sources),
        preferred_foot: first_present(&preferred_foot_chain(), &sources),
        height_cm: first_present(&height_chain(), &sources),
        weight_kg: first_present(&weight_chain(), &sources),
        has_position: position_entry(position.as_ref()).map(|p| p.position_id),
        position,
        shirt_number: records
            .iter()
            .find_map(|r| r.shirt_number.filter(|n| *n > 0)),
        joined_season: variant.joined_season,
        total_appearances: None,
        total_goals: None,
        total_assists: None,
        plays_for: variant.current_team_id,
        has_season_stats: Vec::new(),
        teammate_with: teammates.teammates_of(player_id).to_vec(),
    }
}

/// One player per distinct id in `records`, ordered by id. Players whose
/// variant lookup fails, or who have no variant in the competition, are
/// left out.
pub fn build_players(
    fetcher: &Fetcher,
    endpoints: &Endpoints,
    competition_id: u32,
    records: &[PlayerSeasonRecord],
    teammates: &TeammateGraph,
) -> (Vec<Player>, PlayersSummary) {
    let mut by_player: BTreeMap<PlayerId, Vec<&PlayerSeasonRecord>> = BTreeMap::new();
    for record in records {
        if let Some(player_id) = record.player_id {
            by_player.entry(player_id).or_default().push(record);
        }
    }

    let variants: DetailCache<PlayerId, Vec<ApiPlayer>> = DetailCache::new();
    let variant_requests = variants.warm(fetcher, by_player.keys().copied(), |player_id| {
        fetcher
            .get_json(&endpoints.player_variants(*player_id))
            .as_ref()
            .and_then(parse_variants)
            .filter(|list| !list.is_empty())
    });

    let mut summary = PlayersSummary {
        candidates: by_player.len(),
        variant_requests,
        ..PlayersSummary::default()
    };
    let mut players = Vec::with_capacity(by_player.len());
    for (player_id, player_records) in &by_player {
        let Some(list) = variants.get(player_id) else {
            summary.without_variants += 1;
            debug!(player_id, "no variants, skipping player");
            continue;
        };
        let Some(resolved) = resolve_variants(&list, competition_id) else {
            summary.outside_competition += 1;
            debug!(player_id, competition_id, "no variant in competition, skipping player");
            continue;
        };
        players.push(assemble_player(*player_id, &resolved, player_records, teammates));
    }
    summary.players = players.len();
    info!(
        players = summary.players,
        skipped = summary.without_variants + summary.outside_competition,
        "players built"
    );
    (players, summary)
}
