//! Data models shared across the pipeline.
//!
//! This module defines the core data structures used throughout the
//! application:
//! - [`Domain`]: which kind of media a run is about (movies or TV shows)
//! - [`Signal`]: one weighted title mention yielded by a source scraper
//! - [`RankedTitle`]: an entry of the final ranked trending list
//! - [`TrendingPick`]: a title resolved to its canonical detail page
//! - [`TitleDetails`]: scraped detail-page metadata

use serde::{Deserialize, Serialize};

/// The kind of media a pipeline run is about.
///
/// Keyword lists, source weights and prompt wording all differ between the
/// two domains; everything else is shared. The per-domain tuning lives in
/// [`crate::config::DomainProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Movie,
    Tv,
}

impl Domain {
    /// Key under which last-draft records for this domain are stored.
    pub fn kind_key(&self) -> &'static str {
        match self {
            Domain::Movie => "movie",
            Domain::Tv => "tv",
        }
    }

    pub fn is_tv(&self) -> bool {
        matches!(self, Domain::Tv)
    }

    /// Human label used in log lines and prompt wording.
    pub fn label(&self) -> &'static str {
        match self {
            Domain::Movie => "movie",
            Domain::Tv => "TV show",
        }
    }
}

/// One weighted title mention produced by a source scraper.
///
/// The weight is source-local: the aggregator multiplies it by the
/// per-source multiplier before merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub title: String,
    pub weight: u64,
}

impl Signal {
    pub fn new(title: impl Into<String>, weight: u64) -> Self {
        Self {
            title: title.into(),
            weight,
        }
    }
}

/// An entry of the final ranked trending list.
///
/// Produced only at the end of aggregation and immutable afterwards.
/// `rank` is the 1-based position in the returned list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedTitle {
    pub title: String,
    pub buzz_score: u64,
    pub rank: usize,
}

/// A candidate resolved to its canonical detail page on the reference site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingPick {
    pub title: String,
    pub url: String,
}

/// Metadata scraped from a resolved detail page.
#[derive(Debug, Clone)]
pub struct TitleDetails {
    pub plot: String,
}
