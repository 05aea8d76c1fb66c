use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pl_entity_graph::clubs::{attach_club_stats, build_clubs};
use pl_entity_graph::config::PipelineConfig;
use pl_entity_graph::crawl::crawl_players;
use pl_entity_graph::model::{Player, PlayerSeasonRecord, PlayerSeasonStats, SeasonId};
use pl_entity_graph::persist::{read_graph, read_json, write_graph, write_json_atomic, write_text_atomic};
use pl_entity_graph::pipeline::{self, RunSummary};
use pl_entity_graph::player_stats::build_player_season_stats;
use pl_entity_graph::players::build_players;
use pl_entity_graph::rdf::graph_to_turtle;
use pl_entity_graph::seasons::build_seasons;
use pl_entity_graph::teammates::build_teammate_graph;
use pl_entity_graph::totals::apply_totals;
use pl_entity_graph::vocab::{build_nationalities, build_positions};

/// Premier League entity graph builder
#[derive(Parser)]
#[command(name = "pl_entity_graph")]
#[command(about = "Crawl the Premier League player API and derive a linked entity graph")]
struct Cli {
    /// Competition id, overrides PL_COMPETITION_ID
    #[arg(long, global = true)]
    competition_id: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SeasonArgs {
    /// Single season to crawl (start year, e.g. 2024 for 2024/25)
    #[arg(long, conflicts_with_all = ["start_season", "end_season"])]
    season: Option<SeasonId>,
    /// First season of an inclusive range
    #[arg(long, requires = "end_season")]
    start_season: Option<SeasonId>,
    /// Last season of an inclusive range
    #[arg(long, requires = "start_season")]
    end_season: Option<SeasonId>,
}

impl SeasonArgs {
    fn range(&self) -> Result<RangeInclusive<SeasonId>> {
        match (self.season, self.start_season, self.end_season) {
            (Some(season), _, _) => Ok(season..=season),
            (None, Some(start), Some(end)) if start <= end => Ok(start..=end),
            (None, Some(start), Some(end)) => bail!("--start-season {start} is after --end-season {end}"),
            _ => bail!("either --season or both --start-season and --end-season are required"),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Crawl season listings and per-season details into raw records
    Crawl {
        #[command(flatten)]
        seasons: SeasonArgs,
        #[arg(long)]
        output: PathBuf,
    },
    /// Fetch per-season statistics for every (player, season, club)
    Stats {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Resolve player variants and merge them with the raw records
    Players {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Build clubs from the raw records
    Clubs {
        #[arg(long)]
        input: PathBuf,
        /// Player season stats, used for hasSeasonStats
        #[arg(long)]
        stats: Option<PathBuf>,
        #[arg(long)]
        output: PathBuf,
    },
    /// Build seasons from player season stats
    Seasons {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Distinct nationalities of the built players
    Nationalities {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Distinct positions of the built players
    Positions {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Roll statistic totals up onto the players
    Totals {
        #[arg(long)]
        stats: PathBuf,
        #[arg(long)]
        players: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Render an output directory as one Turtle document
    Rdf {
        #[arg(long)]
        input_dir: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Run every stage and write all collections at the end
    All {
        #[command(flatten)]
        seasons: SeasonArgs,
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,
        /// Also write the graph as Turtle into the output directory
        #[arg(long)]
        rdf: bool,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = PipelineConfig::from_env();
    if let Some(competition_id) = cli.competition_id {
        config.competition_id = competition_id;
    }

    match cli.command {
        Command::Crawl { seasons, output } => {
            let range = seasons.range()?;
            let fetcher = config.build_fetcher()?;
            let (records, summary) = crawl_players(
                &fetcher,
                &config.endpoints,
                config.competition_id,
                range,
                config.page_limit,
            );
            write_json_atomic(&output, &records)?;
            println!("Crawl complete");
            println!("Seasons listed: {}/{}", summary.seasons_listed, summary.seasons_total);
            println!("Records: {} (skipped {}, duplicates {})", summary.records, summary.entries_skipped, summary.duplicates);
            println!("Details missing: {}/{}", summary.details_missing, summary.details_requested);
        }
        Command::Stats { input, output } => {
            let records: Vec<PlayerSeasonRecord> = read_json(&input)?;
            let fetcher = config.build_fetcher()?;
            let (stats, summary) =
                build_player_season_stats(&fetcher, &config.endpoints, config.competition_id, &records);
            write_json_atomic(&output, &stats)?;
            println!("Stats records: {} (unavailable {})", stats.len(), summary.unavailable);
        }
        Command::Players { input, output } => {
            let records: Vec<PlayerSeasonRecord> = read_json(&input)?;
            let fetcher = config.build_fetcher()?;
            let teammates = build_teammate_graph(&records);
            let (players, summary) = build_players(
                &fetcher,
                &config.endpoints,
                config.competition_id,
                &records,
                &teammates,
            );
            write_json_atomic(&output, &players)?;
            println!(
                "Players: {}/{} (no variants {}, outside competition {})",
                summary.players, summary.candidates, summary.without_variants, summary.outside_competition
            );
        }
        Command::Clubs { input, stats, output } => {
            let records: Vec<PlayerSeasonRecord> = read_json(&input)?;
            let fetcher = config.build_fetcher()?;
            let mut clubs = build_clubs(&fetcher, &config.endpoints, &records);
            if let Some(stats) = stats {
                let stats: Vec<PlayerSeasonStats> = read_json(&stats)?;
                attach_club_stats(&mut clubs, &stats);
            }
            write_json_atomic(&output, &clubs)?;
            println!("Clubs: {}", clubs.len());
        }
        Command::Seasons { input, output } => {
            let stats: Vec<PlayerSeasonStats> = read_json(&input)?;
            let seasons = build_seasons(&stats);
            write_json_atomic(&output, &seasons)?;
            println!("Seasons: {}", seasons.len());
        }
        Command::Nationalities { input, output } => {
            let players: Vec<Player> = read_json(&input)?;
            let nationalities = build_nationalities(&players);
            write_json_atomic(&output, &nationalities)?;
            println!("Nationalities: {}", nationalities.len());
        }
        Command::Positions { input, output } => {
            let players: Vec<Player> = read_json(&input)?;
            let positions = build_positions(&players);
            write_json_atomic(&output, &positions)?;
            println!("Positions: {}", positions.len());
        }
        Command::Totals { stats, players, output } => {
            let stats: Vec<PlayerSeasonStats> = read_json(&stats)?;
            let mut players: Vec<Player> = read_json(&players)?;
            apply_totals(&mut players, &stats);
            write_json_atomic(&output, &players)?;
            println!("Totals applied to {} players", players.len());
        }
        Command::Rdf { input_dir, output } => {
            let graph = read_graph(&input_dir)?;
            write_text_atomic(&output, &graph_to_turtle(&graph))?;
            println!("Turtle written to {}", output.display());
        }
        Command::All { seasons, out_dir, rdf } => {
            let range = seasons.range()?;
            let fetcher = config.build_fetcher()?;
            let (graph, summary) = pipeline::run(&fetcher, &config, range);
            let written = write_graph(&out_dir, &graph)?;
            if rdf {
                write_text_atomic(&out_dir.join("graph.ttl"), &graph_to_turtle(&graph))?;
            }
            info!(files = written.len(), dir = %out_dir.display(), "outputs written");
            print_summary(&summary, &out_dir);
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary, out_dir: &Path) {
    println!("Run complete");
    println!("Output: {}", out_dir.display());
    println!("Started: {}", summary.started_at);
    println!("Finished: {}", summary.finished_at);
    if let Some(crawl) = &summary.crawl {
        println!("Seasons listed: {}/{}", crawl.seasons_listed, crawl.seasons_total);
        println!(
            "Raw records: {} (skipped {}, duplicates {}, details missing {})",
            crawl.records, crawl.entries_skipped, crawl.duplicates, crawl.details_missing
        );
    }
    println!(
        "Stats records: {} (requests {}, unavailable {})",
        summary.stats.triples, summary.stats.requests, summary.stats.unavailable
    );
    println!(
        "Players: {}/{} (no variants {}, outside competition {})",
        summary.players.players,
        summary.players.candidates,
        summary.players.without_variants,
        summary.players.outside_competition
    );
    println!("Clubs: {}", summary.clubs);
    println!("Seasons: {}", summary.seasons);
    println!("Nationalities: {}", summary.nationalities);
    println!("Positions: {}", summary.positions);
}
