//! Configuration objects for the pipeline.
//!
//! Two layers:
//! - [`AppConfig`]: credentials and file paths, filled from the CLI (which
//!   itself reads environment variables). Owned by the orchestrator and
//!   passed into constructors; nothing in the crate reads the process
//!   environment directly.
//! - [`DomainProfile`]: the per-domain tuning record driving the trend
//!   aggregator — exclusion keywords, word ceilings, indicator keywords
//!   and the weighted source table. The built-in profiles carry the
//!   hand-tuned production weights; a YAML file can override either
//!   profile wholesale.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::models::Domain;

/// Credentials and paths for one process run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub groq_api_key: Option<String>,
    /// Comma-separated model chain, tried in order.
    pub groq_models: Vec<String>,
    /// Appended to the chain when a model is reported decommissioned.
    pub recommended_model: String,
    pub hashnode_publication_id: Option<String>,
    pub hashnode_access_token: Option<String>,
    pub last_draft_path: PathBuf,
    pub prompt_log_path: PathBuf,
    pub profile_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        let groq_models: Vec<String> = cli
            .groq_model
            .split(',')
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();

        Self {
            groq_api_key: cli.groq_api_key.clone(),
            groq_models,
            recommended_model: cli.groq_recommended_model.clone(),
            hashnode_publication_id: cli.hashnode_publication_id.clone(),
            hashnode_access_token: cli.hashnode_access_token.clone(),
            last_draft_path: cli.last_draft_file.clone(),
            prompt_log_path: cli.prompt_log_file.clone(),
            profile_path: cli.profile_file.clone(),
        }
    }
}

/// Which scraper implementation a [`SourceTuning`] entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Daily search-trends feed.
    SearchTrends,
    /// Community discussion feeds (subreddit hot pages).
    CommunityFeed,
    /// Popular-films listing (Letterboxd weekly).
    PopularFilms,
    /// Miniseries search listing (Letterboxd).
    MiniseriesSearch,
    /// Authoritative ranking chart (IMDb meter pages).
    ChartRanking,
    /// Trending-shows listing (Trakt).
    TrendingShows,
}

fn default_item_weight() -> u64 {
    1
}

/// Tuning for one configured source.
///
/// The weights and caps are hand-tuned values preserved from production
/// runs; they are data, not policy — change them here, not in code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTuning {
    pub kind: SourceKind,
    /// Scaling factor applied to every item weight during accumulation.
    pub multiplier: u64,
    /// How many of the source's leading items the aggregator merges.
    #[serde(default)]
    pub take: Option<usize>,
    /// Weight the scraper assigns per occurrence.
    #[serde(default = "default_item_weight")]
    pub item_weight: u64,
    /// How many entries the scraper itself keeps after tallying.
    #[serde(default)]
    pub keep: Option<usize>,
}

/// Per-domain tuning record for extraction, filtering and aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainProfile {
    pub domain: Domain,
    /// Case-insensitive substrings that disqualify a candidate title.
    pub exclude_keywords: Vec<String>,
    /// A trends-feed entry must mention one of these to be considered.
    pub feed_indicators: Vec<String>,
    /// Titles with more words than this are discussion posts, not titles.
    pub max_words: usize,
    /// Minimum number of words starting with an uppercase letter.
    #[serde(default = "DomainProfile::default_min_capitalized")]
    pub min_capitalized: usize,
    /// Lowercased first words that mark a question/post, not a title.
    pub reject_leading: Vec<String>,
    pub sources: Vec<SourceTuning>,
}

impl DomainProfile {
    fn default_min_capitalized() -> usize {
        2
    }

    pub fn for_domain(domain: Domain) -> Self {
        match domain {
            Domain::Movie => Self::movie(),
            Domain::Tv => Self::tv(),
        }
    }

    /// Built-in profile, optionally replaced by a YAML file holding a
    /// `movie:` / `tv:` mapping of profiles.
    pub fn load_or_default(
        domain: Domain,
        path: Option<&Path>,
    ) -> Result<Self, serde_yaml::Error> {
        let Some(path) = path else {
            return Ok(Self::for_domain(domain));
        };
        let Ok(raw) = std::fs::read_to_string(path) else {
            return Ok(Self::for_domain(domain));
        };
        let overrides: ProfileOverrides = serde_yaml::from_str(&raw)?;
        let chosen = match domain {
            Domain::Movie => overrides.movie,
            Domain::Tv => overrides.tv,
        };
        Ok(chosen.unwrap_or_else(|| Self::for_domain(domain)))
    }

    pub fn movie() -> Self {
        Self {
            domain: Domain::Movie,
            exclude_keywords: to_strings(&[
                "cakeday",
                "megathread",
                "discussion",
                "official",
                "trailer",
                "review",
                "question",
                "help",
                "where",
                "how",
                "what",
                "why",
                "reddit",
                "post",
                "thread",
                "ama",
                "announcement",
            ]),
            feed_indicators: to_strings(&["movie", "film"]),
            max_words: 8,
            min_capitalized: 2,
            reject_leading: to_strings(&[
                "how", "what", "where", "why", "when", "is", "are", "do", "does",
            ]),
            sources: vec![
                SourceTuning {
                    kind: SourceKind::SearchTrends,
                    multiplier: 4,
                    take: None,
                    item_weight: 10,
                    keep: Some(8),
                },
                SourceTuning {
                    kind: SourceKind::CommunityFeed,
                    multiplier: 2,
                    take: None,
                    item_weight: 2,
                    keep: Some(12),
                },
                SourceTuning {
                    kind: SourceKind::PopularFilms,
                    multiplier: 15,
                    take: Some(8),
                    item_weight: 1,
                    keep: Some(15),
                },
                SourceTuning {
                    kind: SourceKind::ChartRanking,
                    multiplier: 12,
                    take: Some(5),
                    item_weight: 1,
                    keep: Some(10),
                },
            ],
        }
    }

    pub fn tv() -> Self {
        Self {
            domain: Domain::Tv,
            exclude_keywords: to_strings(&[
                "cakeday",
                "megathread",
                "help",
                "where",
                "how",
                "what",
                "why",
                "reddit",
                "post",
                "thread",
                "ama",
                "announcement",
                "trailer only",
            ]),
            feed_indicators: to_strings(&[
                "series",
                "season",
                "episode",
                "tv show",
                "television",
                "streaming",
                "netflix",
                "hbo",
                "apple tv",
                "prime video",
            ]),
            max_words: 10,
            min_capitalized: 2,
            reject_leading: to_strings(&[
                "how", "what", "where", "why", "when", "is", "are", "do", "does", "can",
            ]),
            sources: vec![
                SourceTuning {
                    kind: SourceKind::CommunityFeed,
                    multiplier: 3,
                    take: None,
                    item_weight: 2,
                    keep: Some(15),
                },
                SourceTuning {
                    kind: SourceKind::ChartRanking,
                    multiplier: 20,
                    take: Some(8),
                    item_weight: 1,
                    keep: Some(15),
                },
                SourceTuning {
                    kind: SourceKind::TrendingShows,
                    multiplier: 15,
                    take: Some(10),
                    item_weight: 1,
                    keep: Some(15),
                },
                SourceTuning {
                    kind: SourceKind::MiniseriesSearch,
                    multiplier: 12,
                    take: Some(8),
                    item_weight: 1,
                    keep: Some(10),
                },
                SourceTuning {
                    kind: SourceKind::SearchTrends,
                    multiplier: 2,
                    take: None,
                    item_weight: 8,
                    keep: Some(10),
                },
            ],
        }
    }
}

/// Shape of the optional profile override file.
#[derive(Debug, Default, Deserialize)]
struct ProfileOverrides {
    #[serde(default)]
    movie: Option<DomainProfile>,
    #[serde(default)]
    tv: Option<DomainProfile>,
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
