use tracing::info;

use crate::key_index::KeyIndex;
use crate::merge::text;
use crate::model::{Nationality, Player, Position};
use crate::names::{country_slug, position_slug, title_case};

/// Nationality id: the ISO code when present, else a slug of the country
/// name. `None` without a country name.
pub fn nationality_id(country: Option<&String>, iso_code: Option<&String>) -> Option<String> {
    let name = text(country)?;
    Some(text(iso_code).unwrap_or_else(|| country_slug(&name)))
}

/// Display name and id of a raw position string, e.g. " centre-back" gives
/// ("Centre-Back", "centre_back").
pub fn position_entry(raw: Option<&String>) -> Option<Position> {
    let name = title_case(&text(raw)?);
    Some(Position {
        position_id: position_slug(&name),
        position_name: name,
    })
}

/// Distinct nationalities of `players`, first-seen attributes per id,
/// sorted by country name.
pub fn build_nationalities(players: &[Player]) -> Vec<Nationality> {
    let seen = KeyIndex::new();
    let mut out: Vec<Nationality> = players
        .iter()
        .filter_map(|p| {
            let country_id = nationality_id(p.nationality.as_ref(), p.nationality_iso.as_ref())?;
            if !seen.observe(country_id.clone()) {
                return None;
            }
            Some(Nationality {
                country_id,
                country_name: text(p.nationality.as_ref())?,
                iso_code: text(p.nationality_iso.as_ref()),
                demonym: text(p.demonym.as_ref()),
            })
        })
        .collect();
    out.sort_by(|a, b| a.country_name.cmp(&b.country_name));
    info!(nationalities = out.len(), "nationalities built");
    out
}

/// Distinct positions of `players`, sorted by display name.
pub fn build_positions(players: &[Player]) -> Vec<Position> {
    let seen = KeyIndex::new();
    let mut out: Vec<Position> = players
        .iter()
        .filter_map(|p| position_entry(p.position.as_ref()))
        .filter(|pos| seen.observe(pos.position_id.clone()))
        .collect();
    out.sort_by(|a, b| a.position_name.cmp(&b.position_name));
    info!(positions = out.len(), "positions built");
    out
}
