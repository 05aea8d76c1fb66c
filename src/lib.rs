pub mod clubs;
pub mod config;
pub mod crawl;
pub mod fetch;
pub mod http_client;
pub mod key_index;
pub mod merge;
pub mod model;
pub mod names;
pub mod persist;
pub mod pipeline;
pub mod player_stats;
pub mod players;
pub mod rdf;
pub mod seasons;
pub mod stats_map;
pub mod teammates;
pub mod totals;
pub mod upstream;
pub mod variants;
pub mod vocab;
