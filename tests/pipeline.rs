use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};

use pl_entity_graph::config::{Endpoints, PipelineConfig};
use pl_entity_graph::fetch::{Fetcher, HttpResponse, RetryPolicy, Sleeper, Transport, TransportError};
use pl_entity_graph::persist::{read_graph, write_graph};
use pl_entity_graph::model::PlayerSeasonRecord;
use pl_entity_graph::pipeline::{EntityGraph, assemble_graph, run};
use pl_entity_graph::rdf::graph_to_turtle;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Serves fixture bodies by exact URL; anything else is a 404.
#[derive(Clone)]
struct Routes {
    bodies: Arc<HashMap<String, String>>,
    hits: Arc<Mutex<Vec<String>>>,
}

impl Routes {
    fn load() -> Self {
        let raw = fs::read_to_string(fixture_path("upstream.json")).expect("read fixture");
        let map: HashMap<String, Value> = serde_json::from_str(&raw).expect("parse fixture");
        let bodies = map
            .into_iter()
            .map(|(url, body)| (url, body.to_string()))
            .collect();
        Self {
            bodies: Arc::new(bodies),
            hits: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn hits_for(&self, url: &str) -> usize {
        self.hits.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

impl Transport for Routes {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.hits.lock().unwrap().push(url.to_string());
        Ok(match self.bodies.get(url) {
            Some(body) => HttpResponse {
                status: 200,
                body: body.clone(),
            },
            None => HttpResponse {
                status: 404,
                body: "{}".into(),
            },
        })
    }
}

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

fn config() -> PipelineConfig {
    PipelineConfig {
        endpoints: Endpoints {
            api_base: "http://api.test/api".into(),
            team_api_base: "http://teams.test".into(),
            club_metadata_url: "http://meta.test/clubs.json".into(),
        },
        ..PipelineConfig::default()
    }
}

fn fetcher(routes: &Routes, parallelism: usize) -> Fetcher {
    Fetcher::new(
        Box::new(routes.clone()),
        Box::new(NoSleep),
        RetryPolicy::default(),
    )
    .with_parallelism(parallelism)
}

fn run_fixture(parallelism: usize) -> (EntityGraph, Routes) {
    let routes = Routes::load();
    let (graph, _) = run(&fetcher(&routes, parallelism), &config(), 2023..=2024);
    (graph, routes)
}

fn render(graph: &EntityGraph) -> String {
    [
        serde_json::to_string_pretty(&graph.records).unwrap(),
        serde_json::to_string_pretty(&graph.stats).unwrap(),
        serde_json::to_string_pretty(&graph.players).unwrap(),
        serde_json::to_string_pretty(&graph.clubs).unwrap(),
        serde_json::to_string_pretty(&graph.seasons).unwrap(),
        serde_json::to_string_pretty(&graph.nationalities).unwrap(),
        serde_json::to_string_pretty(&graph.positions).unwrap(),
    ]
    .join("\n")
}

#[test]
fn crawl_skips_failed_season_duplicates_and_keyless_entries() {
    let routes = Routes::load();
    let (graph, summary) = run(&fetcher(&routes, 1), &config(), 2023..=2024);
    let crawl = summary.crawl.expect("crawl summary");

    assert_eq!(crawl.seasons_total, 2);
    assert_eq!(crawl.seasons_listed, 1);
    assert_eq!(crawl.entries_seen, 5);
    assert_eq!(crawl.entries_skipped, 1);
    assert_eq!(crawl.duplicates, 1);
    assert_eq!(crawl.details_requested, 3);
    assert_eq!(crawl.details_missing, 1);

    let ids: Vec<_> = graph.records.iter().map(|r| r.season_key()).collect();
    assert_eq!(ids, vec![Some((1, 2024)), Some((2, 2024)), Some((3, 2024))]);

    let saka = &graph.records[0];
    assert_eq!(saka.shirt_number, Some(7));
    assert_eq!(saka.preferred_foot.as_deref(), Some("Right"));
    assert_eq!(saka.position.as_deref(), Some("Forward"));
    assert_eq!(saka.height_cm, Some(178));
    assert_eq!(saka.joined_club_date.as_deref(), Some("2018-07-01"));
}

#[test]
fn every_detail_resource_is_requested_once() {
    let (_, routes) = run_fixture(1);
    for url in [
        "http://api.test/api/v1/competitions/8/seasons/2024/players/1",
        "http://api.test/api/v1/players/1",
        "http://api.test/api/v2/competitions/8/seasons/2024/players/1/stats",
        "http://teams.test/teams/10",
        "http://meta.test/clubs.json",
    ] {
        assert_eq!(routes.hits_for(url), 1, "{url}");
    }
    // 404 is not retried
    assert_eq!(
        routes.hits_for("http://api.test/api/v1/competitions/8/seasons/2023/players?_limit=20"),
        1
    );
}

#[test]
fn shared_club_and_season_make_mutual_teammates() {
    let (graph, _) = run_fixture(1);

    let arsenal = graph.clubs.iter().find(|c| c.club_id == 10).expect("club 10");
    assert_eq!(arsenal.has_player, vec![1, 2]);
    assert_eq!(arsenal.participates_in, vec![2024]);

    let ids: Vec<u64> = graph.players.iter().map(|p| p.player_id).collect();
    assert_eq!(ids, vec![1, 2], "player 3 has no variant in the competition");
    assert_eq!(graph.players[0].teammate_with, vec![2]);
    assert_eq!(graph.players[1].teammate_with, vec![1]);
}

#[test]
fn players_merge_variants_raw_records_and_totals() {
    let (graph, _) = run_fixture(1);
    let saka = &graph.players[0];
    assert_eq!(saka.full_name, "Bukayo Saka");
    assert_eq!(saka.preferred_foot.as_deref(), Some("Left"));
    assert_eq!(saka.shirt_number, Some(7));
    assert_eq!(saka.joined_season, Some(2018));
    assert_eq!(saka.plays_for, Some(10));
    assert_eq!(saka.has_nationality.as_deref(), Some("GB-ENG"));
    assert_eq!(saka.has_position.as_deref(), Some("forward"));
    assert_eq!(saka.total_goals, Some(2));
    assert_eq!(saka.total_appearances, Some(30));
    assert_eq!(saka.total_assists, Some(0));
    assert_eq!(saka.has_season_stats, vec!["1-2024-10"]);

    let eddie = &graph.players[1];
    assert_eq!(eddie.nationality.as_deref(), Some("Ivory Coast"));
    assert_eq!(eddie.has_nationality.as_deref(), Some("ivory_coast"));
    assert_eq!(eddie.has_position.as_deref(), Some("centre_back"));
    assert_eq!(eddie.total_goals, Some(0));
}

#[test]
fn stats_keep_unknowns_null_and_sum_passes() {
    let (graph, _) = run_fixture(1);
    let ids: Vec<&str> = graph
        .stats
        .iter()
        .map(|s| s.player_season_stats_id.as_str())
        .collect();
    assert_eq!(ids, vec!["1-2024-10", "2-2024-10", "3-2024-11"]);

    let saka = serde_json::to_value(&graph.stats[0]).unwrap();
    assert_eq!(saka["goals"], json!(2.0));
    assert_eq!(saka["expectedGoals"], json!(7.5));
    assert_eq!(saka["passesCompleted"], json!(150.0));
    assert_eq!(saka["minutesPlayed"], json!(2500.0));
    assert_eq!(saka["assists"], Value::Null);

    let missing = serde_json::to_value(&graph.stats[1]).unwrap();
    assert_eq!(missing["goals"], Value::Null);
    assert!(missing.as_object().unwrap().contains_key("passesCompleted"));
}

#[test]
fn clubs_take_venue_from_one_source_only() {
    let (graph, _) = run_fixture(1);
    let names: Vec<&str> = graph.clubs.iter().map(|c| c.club_name.as_str()).collect();
    assert_eq!(names, vec!["Arsenal", "Brighton & Hove Albion"]);

    let arsenal = &graph.clubs[0];
    assert_eq!(arsenal.stadium.as_deref(), Some("Emirates Stadium"));
    assert!(arsenal.location.is_some());
    assert_eq!(arsenal.has_season_stats, vec!["1-2024-10", "2-2024-10"]);

    let brighton = &graph.clubs[1];
    assert_eq!(brighton.stadium.as_deref(), Some("American Express Stadium"));
    assert_eq!(brighton.location, None);
    assert_eq!(brighton.foundation_year, None);
}

#[test]
fn seasons_and_vocabularies() {
    let (graph, _) = run_fixture(1);
    assert_eq!(graph.seasons.len(), 1);
    let season = &graph.seasons[0];
    assert_eq!(season.season_name, "2024/25");
    assert_eq!(
        season.includes_player_season_stats,
        vec!["1-2024-10", "2-2024-10", "3-2024-11"]
    );

    let countries: Vec<&str> = graph
        .nationalities
        .iter()
        .map(|n| n.country_id.as_str())
        .collect();
    assert_eq!(countries, vec!["GB-ENG", "ivory_coast"]);
    let positions: Vec<&str> = graph
        .positions
        .iter()
        .map(|p| p.position_name.as_str())
        .collect();
    assert_eq!(positions, vec!["Centre-Back", "Forward"]);
}

#[test]
fn output_is_identical_across_runs_and_pool_sizes() {
    let (sequential, _) = run_fixture(1);
    let (again, _) = run_fixture(1);
    let (pooled, _) = run_fixture(4);
    assert_eq!(render(&sequential), render(&again));
    assert_eq!(render(&sequential), render(&pooled));
    assert_eq!(graph_to_turtle(&sequential), graph_to_turtle(&pooled));
}

#[test]
fn written_graph_reads_back() {
    let (graph, _) = run_fixture(1);
    let dir = tempfile::tempdir().unwrap();
    let written = write_graph(dir.path(), &graph).unwrap();
    assert_eq!(written.len(), 7);

    let back = read_graph(dir.path()).unwrap();
    assert_eq!(back.records, graph.records);
    assert_eq!(back.players, graph.players);
    assert_eq!(back.seasons, graph.seasons);
    assert_eq!(back.nationalities, graph.nationalities);

    let players: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("players.json")).unwrap()).unwrap();
    assert_eq!(players[0]["teammateWith"], json!([2]));
    assert_eq!(players[0]["nationalityISO"], json!("GB-ENG"));
}

#[test]
fn turtle_links_entities() {
    let (graph, _) = run_fixture(1);
    let ttl = graph_to_turtle(&graph);
    assert!(ttl.contains("ex:player_1 rdf:type ex:Player ;"));
    assert!(ttl.contains("ex:teammateWith ex:player_2"));
    assert!(ttl.contains("ex:club_10 rdf:type ex:Club ;"));
    assert!(ttl.contains("ex:hasPlayer ex:player_1"));
    assert!(ttl.contains(r#"ex:startYear "2024"^^xsd:gYear"#));
    assert!(ttl.contains("ex:ivory_coast rdf:type ex:Nationality ;"));
    assert!(ttl.contains(r#"rdfs:label "Centre-Back""#));
}

fn record(player: u64, season: u32, club: u64, club_name: &str) -> PlayerSeasonRecord {
    PlayerSeasonRecord {
        player_id: Some(player),
        season_id: Some(season),
        current_team_id: Some(club),
        current_team_name: Some(club_name.into()),
        ..PlayerSeasonRecord::default()
    }
}

#[test]
fn player_under_two_clubs_in_one_season_keeps_both() {
    let routes = Routes::load();
    let records = vec![
        record(1, 2024, 10, "Arsenal"),
        record(1, 2024, 11, "Brighton & Hove Albion"),
        record(2, 2024, 11, "Brighton & Hove Albion"),
        record(2, 2024, 11, "Brighton & Hove Albion"),
    ];
    let (graph, _) = assemble_graph(&fetcher(&routes, 1), &config(), records);

    assert_eq!(graph.records.len(), 3);
    let ids: Vec<&str> = graph
        .stats
        .iter()
        .map(|s| s.player_season_stats_id.as_str())
        .collect();
    assert_eq!(ids, vec!["1-2024-10", "1-2024-11", "2-2024-11"]);

    let brighton = graph.clubs.iter().find(|c| c.club_id == 11).expect("club 11");
    assert_eq!(brighton.has_player, vec![1, 2]);
    let saka = graph.players.iter().find(|p| p.player_id == 1).expect("player 1");
    assert_eq!(saka.teammate_with, vec![2]);
}
