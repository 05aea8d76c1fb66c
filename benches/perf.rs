use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::{Map, Value, json};
use std::hint::black_box;

use pl_entity_graph::clubs::ClubsBuilder;
use pl_entity_graph::model::{PlayerSeasonRecord, PlayerSeasonStats, StatKey};
use pl_entity_graph::rdf::TurtleDocument;
use pl_entity_graph::stats_map::map_stats;
use pl_entity_graph::teammates::build_teammate_graph;
use pl_entity_graph::upstream::parse_player;

// 20 clubs, 30 players each, 10 seasons.
fn synthetic_records() -> Vec<PlayerSeasonRecord> {
    let mut records = Vec::new();
    for season in 2015..2025u32 {
        for club in 0..20u64 {
            for slot in 0..30u64 {
                let player = club * 100 + (slot + u64::from(season)) % 45;
                records.push(PlayerSeasonRecord {
                    player_id: Some(player),
                    season_id: Some(season),
                    current_team_id: Some(club),
                    current_team_name: Some(format!("Club {club}")),
                    ..PlayerSeasonRecord::default()
                });
            }
        }
    }
    records
}

fn stats_payload() -> Map<String, Value> {
    let raw = json!({
        "appearances": 34, "goals": 12, "assists": "7", "expectedGoals": 10.4,
        "touchesInOppositionBox": 160, "timePlayed": 2870, "successfulDribbles": 41,
        "duelsWon": 120, "aerialDuelsWon": 18, "totalTackles": 22, "interceptions": 9,
        "yellowCards": 3, "fouls": 15, "offsides": 11, "corners": 40,
        "successfulPasses": 900, "successfulShortPasses": 640, "successfulLongPasses": 50,
        "successfulCrosses": 31, "successfulCrossesOpenPlay": 20
    });
    raw.as_object().cloned().unwrap_or_default()
}

fn bench_teammate_graph(c: &mut Criterion) {
    let records = synthetic_records();
    c.bench_function("teammate_graph", |b| {
        b.iter(|| {
            let graph = build_teammate_graph(black_box(&records));
            black_box(graph.teammates_of(101).len());
        })
    });
}

fn bench_clubs_builder(c: &mut Criterion) {
    let records = synthetic_records();
    c.bench_function("clubs_builder", |b| {
        b.iter(|| {
            let mut builder = ClubsBuilder::new();
            for record in black_box(&records) {
                builder.add(record);
            }
            black_box(builder.freeze(|_, _| None).len());
        })
    });
}

fn bench_stat_mapping(c: &mut Criterion) {
    let payload = stats_payload();
    c.bench_function("stat_mapping", |b| {
        b.iter(|| {
            let line = map_stats(black_box(&payload));
            black_box(line.passes_completed);
        })
    });
}

fn bench_player_parse(c: &mut Criterion) {
    let raw = json!({
        "id": {"playerId": "223094", "competitionId": 8, "seasonId": 2024},
        "name": {"firstName": "Bukayo", "lastName": "Saka"},
        "country": {"country": "England", "isoCode": "GB-ENG", "demonym": "English"},
        "currentTeam": {"id": 3, "name": "Arsenal", "shortName": "ARS"},
        "position": "Forward", "preferredFoot": "Left", "shirtNum": "7", "height": 178
    });
    c.bench_function("player_parse", |b| {
        b.iter(|| {
            let player = parse_player(black_box(&raw));
            black_box(player.map(|p| p.id.player_id));
        })
    });
}

fn bench_turtle_stats(c: &mut Criterion) {
    let line = map_stats(&stats_payload());
    let stats: Vec<PlayerSeasonStats> = (0..500u64)
        .map(|player| {
            let key = StatKey {
                player_id: player,
                season_id: 2024,
                club_id: player % 20,
            };
            PlayerSeasonStats::new(key, line.clone())
        })
        .collect();
    c.bench_function("turtle_stats", |b| {
        b.iter(|| {
            let ttl = TurtleDocument::new().stats(black_box(&stats)).finish();
            black_box(ttl.len());
        })
    });
}

criterion_group!(
    perf,
    bench_teammate_graph,
    bench_clubs_builder,
    bench_stat_mapping,
    bench_player_parse,
    bench_turtle_stats
);
criterion_main!(perf);
