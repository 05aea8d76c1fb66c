use crate::model::{ClubId, SeasonId};
use crate::upstream::ApiPlayer;

/// Facts about a player taken from their competition variants: current
/// attributes from the latest variant, the joined season from the earliest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedVariant {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub nationality: Option<String>,
    pub nationality_iso: Option<String>,
    pub demonym: Option<String>,
    pub preferred_foot: Option<String>,
    pub position: Option<String>,
    pub height_cm: Option<u32>,
    pub weight_kg: Option<u32>,
    pub current_team_id: Option<ClubId>,
    pub current_team_name: Option<String>,
    pub joined_season: Option<SeasonId>,
}

/// Variants of the target competition, ordered by season.
///
/// Competition ids are compared as strings because upstream mixes numeric
/// and string ids. The sort is stable: variants sharing a season keep the
/// order upstream returned them in.
pub fn competition_variants(variants: &[ApiPlayer], competition_id: u32) -> Vec<&ApiPlayer> {
    let target = competition_id.to_string();
    let mut matching: Vec<&ApiPlayer> = variants
        .iter()
        .filter(|v| v.id.competition_id.as_deref() == Some(target.as_str()))
        .collect();
    matching.sort_by_key(|v| v.id.season_id);
    matching
}

/// `None` when no variant belongs to the competition; the caller treats the
/// player as having no usable data.
pub fn resolve_variants(variants: &[ApiPlayer], competition_id: u32) -> Option<ResolvedVariant> {
    let ordered = competition_variants(variants, competition_id);
    let earliest = ordered.first()?;
    let latest = ordered.last()?;

    let name = latest.name.as_ref();
    let country = latest.country.as_ref();
    let team = latest.current_team.as_ref();
    Some(ResolvedVariant {
        first_name: name.and_then(|n| n.first_name.clone()),
        last_name: name.and_then(|n| n.last_name.clone()),
        date_of_birth: latest.dates.as_ref().and_then(|d| d.birth.clone()),
        nationality: country.and_then(|c| c.country.clone()),
        nationality_iso: country.and_then(|c| c.iso_code.clone()),
        demonym: country.and_then(|c| c.demonym.clone()),
        preferred_foot: latest.preferred_foot.clone(),
        position: latest.position.clone(),
        height_cm: latest.height.and_then(|h| u32::try_from(h).ok()),
        weight_kg: latest.weight.and_then(|w| u32::try_from(w).ok()),
        current_team_id: team.and_then(|t| t.id),
        current_team_name: team.and_then(|t| t.name.clone().or_else(|| t.short_name.clone())),
        joined_season: earliest
            .id
            .season_id
            .and_then(|s| SeasonId::try_from(s).ok()),
    })
}
