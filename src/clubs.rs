use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info};

use crate::config::Endpoints;
use crate::fetch::{DetailCache, Fetcher};
use crate::merge::text;
use crate::model::{
    Club, ClubId, Location, PlayerId, PlayerSeasonRecord, PlayerSeasonStats, SeasonId,
};
use crate::names::normalize_name;
use crate::upstream::{ClubMetadata, TeamDetail, parse_club_metadata, parse_team_detail};

/// Stadium and location of a club, taken whole from a single source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Venue {
    pub source: VenueSource,
    pub stadium: Option<String>,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VenueSource {
    #[default]
    TeamDetail,
    Metadata,
}

/// Static metadata keyed by normalized club name.
#[derive(Debug, Default)]
pub struct MetadataIndex {
    by_name: HashMap<String, ClubMetadata>,
}

impl MetadataIndex {
    /// Later entries with the same normalized name replace earlier ones.
    pub fn new(entries: Vec<ClubMetadata>) -> Self {
        let by_name = entries
            .into_iter()
            .map(|item| (normalize_name(item.name.as_deref().unwrap_or_default()), item))
            .collect();
        Self { by_name }
    }

    pub fn lookup(&self, club_name: &str) -> Option<&ClubMetadata> {
        self.by_name.get(&normalize_name(club_name))
    }
}

/// Picks the venue source for a club. The team-detail response is used only
/// when its name matches the club name after normalization; it then wins
/// outright, even without grounds. Otherwise the metadata stadium is used.
/// Renamed clubs whose names no longer normalize equal fall through to the
/// metadata.
pub fn select_venue(
    club_name: &str,
    detail: Option<&TeamDetail>,
    metadata: &MetadataIndex,
) -> Option<Venue> {
    let wanted = normalize_name(club_name);
    let matching_detail = detail.filter(|d| {
        d.name
            .as_deref()
            .is_some_and(|name| normalize_name(name) == wanted)
    });
    if let Some(detail) = matching_detail {
        let ground = detail.grounds.first();
        return Some(Venue {
            source: VenueSource::TeamDetail,
            stadium: ground.and_then(|g| text(g.name.as_ref())),
            location: ground
                .and_then(|g| g.coordinates())
                .map(|(latitude, longitude)| Location {
                    latitude,
                    longitude,
                }),
        });
    }
    let meta = metadata.lookup(club_name)?;
    Some(Venue {
        source: VenueSource::Metadata,
        stadium: text(meta.stadium.as_ref()),
        location: None,
    })
}

#[derive(Debug)]
struct ClubDraft {
    club_name: String,
    players: BTreeSet<PlayerId>,
    seasons: BTreeSet<SeasonId>,
}

/// Accumulates club membership from raw season records.
#[derive(Debug, Default)]
pub struct ClubsBuilder {
    drafts: BTreeMap<ClubId, ClubDraft>,
}

impl ClubsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records without a club id or any club name are skipped. The first
    /// name seen for a club is kept.
    pub fn add(&mut self, record: &PlayerSeasonRecord) {
        let Some(club_id) = record.current_team_id else {
            return;
        };
        let Some(name) = text(record.current_team_name.as_ref())
            .or_else(|| text(record.current_team_short_name.as_ref()))
        else {
            return;
        };
        let draft = self.drafts.entry(club_id).or_insert_with(|| ClubDraft {
            club_name: name,
            players: BTreeSet::new(),
            seasons: BTreeSet::new(),
        });
        draft.players.extend(record.player_id);
        draft.seasons.extend(record.season_id);
    }

    pub fn club_ids(&self) -> Vec<ClubId> {
        self.drafts.keys().copied().collect()
    }

    /// Finalizes every club with the venue picked by `venue` and returns
    /// them sorted by name, then id.
    pub fn freeze<F>(self, venue: F) -> Vec<Club>
    where
        F: Fn(ClubId, &str) -> Option<Venue>,
    {
        let mut clubs: Vec<Club> = self
            .drafts
            .into_iter()
            .map(|(club_id, draft)| {
                let venue = venue(club_id, &draft.club_name).unwrap_or_default();
                Club {
                    club_id,
                    club_name: draft.club_name,
                    foundation_year: None,
                    stadium: venue.stadium,
                    location: venue.location,
                    has_player: draft.players.into_iter().collect(),
                    participates_in: draft.seasons.into_iter().collect(),
                    has_season_stats: Vec::new(),
                }
            })
            .collect();
        clubs.sort_by(|a, b| a.club_name.cmp(&b.club_name).then(a.club_id.cmp(&b.club_id)));
        clubs
    }
}

/// Clubs from raw season records, enriched with a venue from the team
/// detail API or, failing a name match there, the static metadata.
pub fn build_clubs(
    fetcher: &Fetcher,
    endpoints: &Endpoints,
    records: &[PlayerSeasonRecord],
) -> Vec<Club> {
    let mut builder = ClubsBuilder::new();
    for record in records {
        builder.add(record);
    }

    let metadata = MetadataIndex::new(
        fetcher
            .get_json(&endpoints.club_metadata_url)
            .map(|raw| parse_club_metadata(&raw))
            .unwrap_or_default(),
    );
    let details: DetailCache<ClubId, TeamDetail> = DetailCache::new();
    details.warm(fetcher, builder.club_ids(), |club_id| {
        fetcher
            .get_json(&endpoints.team(*club_id))
            .as_ref()
            .and_then(parse_team_detail)
    });

    let clubs = builder.freeze(|club_id, name| {
        let venue = select_venue(name, details.get(&club_id).as_ref(), &metadata);
        debug!(club_id, source = ?venue.as_ref().map(|v| v.source), "venue resolved");
        venue
    });
    info!(clubs = clubs.len(), "clubs built");
    clubs
}

/// Fills `hasSeasonStats` with the sorted stat ids recorded for each club.
pub fn attach_club_stats(clubs: &mut [Club], stats: &[PlayerSeasonStats]) {
    let mut by_club: HashMap<ClubId, Vec<&str>> = HashMap::new();
    for stat in stats {
        by_club
            .entry(stat.club_id)
            .or_default()
            .push(stat.player_season_stats_id.as_str());
    }
    for club in clubs {
        let mut ids: Vec<String> = by_club
            .get(&club.club_id)
            .map(|ids| ids.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();
        ids.sort();
        ids.dedup();
        club.has_season_stats = ids;
    }
}
