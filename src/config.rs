use std::env;
use std::time::Duration;

use anyhow::Result;

use crate::fetch::{Fetcher, ReqwestTransport, RetryPolicy, ThreadSleeper, fetch_parallelism};
use crate::http_client::http_client;

pub const PREMIER_LEAGUE_COMPETITION_ID: u32 = 8;

const DEFAULT_API_BASE: &str = "https://sdp-prem-prod.premier-league-prod.pulselive.com/api";
const DEFAULT_TEAM_API_BASE: &str = "https://footballapi.pulselive.com/football";
const DEFAULT_CLUB_METADATA_URL: &str =
    "https://resources.premierleague.com/premierleague25/config/clubs-metadata.json";

/// URLs of every upstream resource the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_base: String,
    pub team_api_base: String,
    pub club_metadata_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            team_api_base: DEFAULT_TEAM_API_BASE.to_string(),
            club_metadata_url: DEFAULT_CLUB_METADATA_URL.to_string(),
        }
    }
}

impl Endpoints {
    pub fn season_players(&self, competition_id: u32, season_id: u32) -> String {
        format!(
            "{}/v1/competitions/{competition_id}/seasons/{season_id}/players",
            self.api_base
        )
    }

    pub fn season_player(&self, competition_id: u32, season_id: u32, player_id: u64) -> String {
        format!(
            "{}/v1/competitions/{competition_id}/seasons/{season_id}/players/{player_id}",
            self.api_base
        )
    }

    pub fn player_variants(&self, player_id: u64) -> String {
        format!("{}/v1/players/{player_id}", self.api_base)
    }

    pub fn player_season_stats(&self, competition_id: u32, season_id: u32, player_id: u64) -> String {
        format!(
            "{}/v2/competitions/{competition_id}/seasons/{season_id}/players/{player_id}/stats",
            self.api_base
        )
    }

    pub fn team(&self, team_id: u64) -> String {
        format!("{}/teams/{team_id}", self.team_api_base)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub competition_id: u32,
    pub endpoints: Endpoints,
    pub page_limit: u32,
    pub retry: RetryPolicy,
    pub polite_delay: Duration,
    pub parallelism: usize,
    pub http_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            competition_id: PREMIER_LEAGUE_COMPETITION_ID,
            endpoints: Endpoints::default(),
            page_limit: 20,
            retry: RetryPolicy::default(),
            polite_delay: Duration::from_millis(200),
            parallelism: 1,
            http_timeout: Duration::from_secs(10),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let endpoints = Endpoints {
            api_base: env_string("PL_API_BASE").unwrap_or(defaults.endpoints.api_base),
            team_api_base: env_string("PL_TEAM_API_BASE")
                .unwrap_or(defaults.endpoints.team_api_base),
            club_metadata_url: env_string("PL_CLUB_METADATA_URL")
                .unwrap_or(defaults.endpoints.club_metadata_url),
        };
        let retry = RetryPolicy {
            max_attempts: env_u64("PL_RETRY_ATTEMPTS").map_or(3, |v| v.clamp(1, 10) as u32),
            base_delay: Duration::from_millis(env_u64("PL_RETRY_DELAY_MS").unwrap_or(1000)),
            rate_limit_factor: env_u64("PL_RATE_LIMIT_FACTOR").map_or(3, |v| v.clamp(3, 60) as u32),
        };

        Self {
            competition_id: env_u64("PL_COMPETITION_ID")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.competition_id),
            endpoints,
            page_limit: env_u64("PL_PAGE_LIMIT").map_or(defaults.page_limit, |v| v.clamp(1, 100) as u32),
            retry,
            polite_delay: env_u64("PL_POLITE_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.polite_delay),
            parallelism: fetch_parallelism(),
            http_timeout: env_u64("PL_HTTP_TIMEOUT_SECS")
                .map(|v| Duration::from_secs(v.clamp(1, 300)))
                .unwrap_or(defaults.http_timeout),
        }
    }

    /// Fetcher over the shared blocking client with this config's retry,
    /// politeness and pool settings.
    pub fn build_fetcher(&self) -> Result<Fetcher> {
        let client = http_client(self.http_timeout)?;
        Ok(Fetcher::new(
            Box::new(ReqwestTransport::new(client)),
            Box::new(ThreadSleeper),
            self.retry,
        )
        .with_polite_delay(self.polite_delay)
        .with_parallelism(self.parallelism))
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.trim().parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_urls() {
        let e = Endpoints::default();
        assert_eq!(
            e.season_players(8, 2024),
            "https://sdp-prem-prod.premier-league-prod.pulselive.com/api/v1/competitions/8/seasons/2024/players"
        );
        assert!(e.player_season_stats(8, 2024, 5).ends_with("/v2/competitions/8/seasons/2024/players/5/stats"));
        assert_eq!(e.team(1), "https://footballapi.pulselive.com/football/teams/1");
    }

    #[test]
    fn defaults_match_upstream_contract() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.competition_id, 8);
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.page_limit, 20);
        assert_eq!(cfg.polite_delay, Duration::from_millis(200));
    }
}
