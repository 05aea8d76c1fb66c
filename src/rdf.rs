//! Turtle rendering of the entity collections.
//!
//! Subjects live in the `ex:` namespace. Absent values emit no triple, and
//! every subject block lists its predicates in a fixed order so the output
//! is byte-stable for a given input.

use std::fmt::Write as _;

use chrono::NaiveDate;

use crate::model::{Club, Nationality, Player, PlayerSeasonStats, Position, Season, StatField};
use crate::pipeline::EntityGraph;

pub const EX_NAMESPACE: &str = "http://example.org/premierleague/";

const PREFIXES: &[(&str, &str)] = &[
    ("ex", EX_NAMESPACE),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
];

#[derive(Debug, Clone, PartialEq)]
enum Object {
    Node(String),
    Text(String),
    Typed(String, &'static str),
}

struct Subject {
    term: String,
    class: &'static str,
    triples: Vec<(String, Object)>,
}

impl Subject {
    fn new(term: String, class: &'static str) -> Self {
        Self {
            term,
            class,
            triples: Vec::new(),
        }
    }

    fn node(&mut self, predicate: impl Into<String>, local: &str) {
        self.triples.push((predicate.into(), Object::Node(ex_term(local))));
    }

    fn text(&mut self, predicate: impl Into<String>, value: Option<&String>) {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.triples.push((predicate.into(), Object::Text(value.clone())));
        }
    }

    fn integer(&mut self, predicate: impl Into<String>, value: Option<impl ToString>) {
        if let Some(value) = value {
            self.typed(predicate, value.to_string(), "xsd:integer");
        }
    }

    fn typed(&mut self, predicate: impl Into<String>, lexical: String, datatype: &'static str) {
        self.triples
            .push((predicate.into(), Object::Typed(lexical, datatype)));
    }

    fn render(&self, out: &mut String) {
        let _ = write!(out, "{} rdf:type ex:{}", self.term, self.class);
        for (predicate, object) in &self.triples {
            let _ = write!(out, " ;\n    {predicate} {}", render_object(object));
        }
        out.push_str(" .\n\n");
    }
}

fn render_object(object: &Object) -> String {
    match object {
        Object::Node(term) => term.clone(),
        Object::Text(value) => format!("\"{}\"", escape_literal(value)),
        Object::Typed(lexical, datatype) => format!("\"{}\"^^{datatype}", escape_literal(lexical)),
    }
}

pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// `ex:` prefixed name when `local` is a plain name, otherwise the full IRI
/// with unsafe characters percent-encoded.
pub fn ex_term(local: &str) -> String {
    let plain = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && !local.starts_with('-');
    if plain {
        return format!("ex:{local}");
    }
    let mut iri = String::from(EX_NAMESPACE);
    for byte in local.replace(' ', "_").bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            iri.push(byte as char);
        } else {
            let _ = write!(iri, "%{byte:02X}");
        }
    }
    format!("<{iri}>")
}

/// `xsd:date` only for a real calendar date in `YYYY-MM-DD` form.
fn valid_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn decimal_lexical(value: f64) -> (String, &'static str) {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        (format!("{}", value as i64), "xsd:integer")
    } else {
        (format!("{value}"), "xsd:decimal")
    }
}

fn player_subject(player: &Player) -> Subject {
    let mut s = Subject::new(ex_term(&format!("player_{}", player.player_id)), "Player");
    s.text("ex:hasName", Some(&player.full_name));
    if let Some(dob) = player.date_of_birth.as_ref().filter(|d| valid_date(d)) {
        s.typed("ex:dateOfBirth", dob.clone(), "xsd:date");
    }
    s.text("ex:preferredFoot", player.preferred_foot.as_ref());
    s.integer("ex:height", player.height_cm);
    s.integer("ex:weight", player.weight_kg);
    s.integer("ex:shirtNumber", player.shirt_number);
    s.integer("ex:joinedSeason", player.joined_season);
    s.integer("ex:totalGoals", player.total_goals);
    s.integer("ex:totalAssists", player.total_assists);
    s.integer("ex:totalAppearances", player.total_appearances);
    if let Some(position) = &player.has_position {
        s.node("ex:hasPosition", position);
    }
    if let Some(nationality) = &player.has_nationality {
        s.node("ex:hasNationality", nationality);
    }
    if let Some(club) = player.plays_for {
        s.node("ex:playsFor", &format!("club_{club}"));
    }
    for stat in &player.has_season_stats {
        s.node("ex:hasSeasonStats", &format!("stat_{stat}"));
    }
    for mate in &player.teammate_with {
        s.node("ex:teammateWith", &format!("player_{mate}"));
    }
    s
}

fn club_subject(club: &Club) -> Subject {
    let mut s = Subject::new(ex_term(&format!("club_{}", club.club_id)), "Club");
    s.text("ex:clubName", Some(&club.club_name));
    s.integer("ex:foundationYear", club.foundation_year);
    s.text("ex:stadium", club.stadium.as_ref());
    if let Some(location) = club.location {
        s.typed("ex:latitude", location.latitude.to_string(), "xsd:double");
        s.typed("ex:longitude", location.longitude.to_string(), "xsd:double");
    }
    for season in &club.participates_in {
        s.node("ex:participatesIn", &format!("season_{season}"));
    }
    for player in &club.has_player {
        s.node("ex:hasPlayer", &format!("player_{player}"));
    }
    for stat in &club.has_season_stats {
        s.node("ex:hasSeasonStats", &format!("stat_{stat}"));
    }
    s
}

fn season_subject(season: &Season) -> Subject {
    let mut s = Subject::new(ex_term(&format!("season_{}", season.season_id)), "Season");
    s.text("ex:seasonName", Some(&season.season_name));
    s.typed("ex:startYear", season.start_year.clone(), "xsd:gYear");
    s.typed("ex:endYear", season.end_year.clone(), "xsd:gYear");
    for stat in &season.includes_player_season_stats {
        s.node("ex:includesPlayerSeasonStats", &format!("stat_{stat}"));
    }
    s
}

fn stats_subject(stats: &PlayerSeasonStats) -> Subject {
    let term = ex_term(&format!("stat_{}", stats.player_season_stats_id));
    let mut s = Subject::new(term, "PlayerSeasonStats");
    s.node("ex:forPlayer", &format!("player_{}", stats.player_id));
    s.node("ex:forClub", &format!("club_{}", stats.club_id));
    s.node("ex:inSeason", &format!("season_{}", stats.season_id));
    for field in StatField::ALL {
        if let Some(value) = stats.line.get(*field) {
            let (lexical, datatype) = decimal_lexical(value);
            s.typed(format!("ex:{}", field.key()), lexical, datatype);
        }
    }
    s
}

fn nationality_subject(nationality: &Nationality) -> Subject {
    let mut s = Subject::new(ex_term(&nationality.country_id), "Nationality");
    s.text("rdfs:label", Some(&nationality.country_name));
    s.text("ex:isoCode", nationality.iso_code.as_ref());
    s.text("ex:demonym", nationality.demonym.as_ref());
    s
}

fn position_subject(position: &Position) -> Subject {
    let mut s = Subject::new(ex_term(&position.position_id), "Position");
    s.text("rdfs:label", Some(&position.position_name));
    s
}

/// Accumulates subject blocks under a single prefix header.
#[derive(Debug, Default)]
pub struct TurtleDocument {
    body: String,
}

impl TurtleDocument {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, subject: Subject) {
        subject.render(&mut self.body);
    }

    pub fn players(mut self, players: &[Player]) -> Self {
        players.iter().for_each(|p| self.push(player_subject(p)));
        self
    }

    pub fn clubs(mut self, clubs: &[Club]) -> Self {
        clubs.iter().for_each(|c| self.push(club_subject(c)));
        self
    }

    pub fn seasons(mut self, seasons: &[Season]) -> Self {
        seasons.iter().for_each(|s| self.push(season_subject(s)));
        self
    }

    pub fn stats(mut self, stats: &[PlayerSeasonStats]) -> Self {
        stats.iter().for_each(|s| self.push(stats_subject(s)));
        self
    }

    pub fn nationalities(mut self, nationalities: &[Nationality]) -> Self {
        nationalities
            .iter()
            .for_each(|n| self.push(nationality_subject(n)));
        self
    }

    pub fn positions(mut self, positions: &[Position]) -> Self {
        positions.iter().for_each(|p| self.push(position_subject(p)));
        self
    }

    pub fn finish(self) -> String {
        let mut out = String::new();
        for (prefix, iri) in PREFIXES {
            let _ = writeln!(out, "@prefix {prefix}: <{iri}> .");
        }
        out.push('\n');
        out.push_str(&self.body);
        out
    }
}

/// The whole graph as one Turtle document.
pub fn graph_to_turtle(graph: &EntityGraph) -> String {
    TurtleDocument::new()
        .players(&graph.players)
        .clubs(&graph.clubs)
        .seasons(&graph.seasons)
        .stats(&graph.stats)
        .nationalities(&graph.nationalities)
        .positions(&graph.positions)
        .finish()
}
