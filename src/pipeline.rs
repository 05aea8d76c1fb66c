use std::ops::RangeInclusive;

use chrono::{SecondsFormat, Utc};
use tracing::info;

use crate::clubs::{attach_club_stats, build_clubs};
use crate::config::PipelineConfig;
use crate::crawl::{CrawlSummary, crawl_players};
use crate::fetch::Fetcher;
use crate::key_index::dedup_by_key;
use crate::model::{
    Club, Nationality, Player, PlayerSeasonRecord, PlayerSeasonStats, Position, Season, SeasonId,
};
use crate::player_stats::{StatsSummary, build_player_season_stats};
use crate::players::{PlayersSummary, build_players};
use crate::seasons::build_seasons;
use crate::teammates::build_teammate_graph;
use crate::totals::apply_totals;
use crate::vocab::{build_nationalities, build_positions};

/// Every collection produced by one run, in output order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityGraph {
    pub records: Vec<PlayerSeasonRecord>,
    pub stats: Vec<PlayerSeasonStats>,
    pub players: Vec<Player>,
    pub clubs: Vec<Club>,
    pub seasons: Vec<Season>,
    pub nationalities: Vec<Nationality>,
    pub positions: Vec<Position>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub started_at: String,
    pub finished_at: String,
    pub crawl: Option<CrawlSummary>,
    pub stats: StatsSummary,
    pub players: PlayersSummary,
    pub clubs: usize,
    pub seasons: usize,
    pub nationalities: usize,
    pub positions: usize,
}

pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Crawls `seasons` and derives the full graph from the crawled records.
pub fn run(
    fetcher: &Fetcher,
    config: &PipelineConfig,
    seasons: RangeInclusive<SeasonId>,
) -> (EntityGraph, RunSummary) {
    let started_at = timestamp();
    let (records, crawl) = crawl_players(
        fetcher,
        &config.endpoints,
        config.competition_id,
        seasons,
        config.page_limit,
    );
    let (graph, mut summary) = assemble_graph(fetcher, config, records);
    summary.started_at = started_at;
    summary.crawl = Some(crawl);
    (graph, summary)
}

/// Derives every entity from already crawled raw records. Records without a
/// player or season are dropped, as are repeats of a (player, season, club)
/// triple, first one wins. A player listed under two clubs in one season
/// keeps both records.
pub fn assemble_graph(
    fetcher: &Fetcher,
    config: &PipelineConfig,
    records: Vec<PlayerSeasonRecord>,
) -> (EntityGraph, RunSummary) {
    let started_at = timestamp();
    let records = dedup_by_key(records, |record| {
        record
            .season_key()
            .map(|(player, season)| (player, season, record.current_team_id))
    });
    let endpoints = &config.endpoints;

    let (stats, stats_summary) =
        build_player_season_stats(fetcher, endpoints, config.competition_id, &records);
    let teammates = build_teammate_graph(&records);
    let (mut players, players_summary) =
        build_players(fetcher, endpoints, config.competition_id, &records, &teammates);
    apply_totals(&mut players, &stats);

    let mut clubs = build_clubs(fetcher, endpoints, &records);
    attach_club_stats(&mut clubs, &stats);
    let seasons = build_seasons(&stats);
    let nationalities = build_nationalities(&players);
    let positions = build_positions(&players);

    let summary = RunSummary {
        started_at,
        finished_at: timestamp(),
        crawl: None,
        stats: stats_summary,
        players: players_summary,
        clubs: clubs.len(),
        seasons: seasons.len(),
        nationalities: nationalities.len(),
        positions: positions.len(),
    };
    info!(
        records = records.len(),
        stats = stats.len(),
        players = players.len(),
        clubs = summary.clubs,
        seasons = summary.seasons,
        "entity graph assembled"
    );

    let graph = EntityGraph {
        records,
        stats,
        players,
        clubs,
        seasons,
        nationalities,
        positions,
    };
    (graph, summary)
}
