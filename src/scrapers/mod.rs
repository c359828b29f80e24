//! Source scrapers feeding the trend aggregator.
//!
//! Each submodule scrapes one external listing and yields weighted title
//! mentions. All scrapers follow the same shape:
//!
//! - an async `fetch` wrapper that downloads the page(s), and
//! - sync `parse_*` functions over the fetched markup, so parsing is
//!   unit-testable against embedded HTML and the `scraper` DOM never
//!   lives across an await point.
//!
//! Selector lookup is attempted against an ordered list of candidates;
//! the first selector yielding at least one result wins (listing sites
//! change their markup often, so every scraper carries fallbacks).
//! Failures never propagate past a source: the aggregator turns them
//! into empty contributions.

pub mod google_trends;
pub mod imdb;
pub mod letterboxd;
pub mod reddit;
pub mod trakt;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{DomainProfile, SourceKind, SourceTuning};
use crate::fetch::{FetchError, PageClient};
use crate::models::Signal;

/// One external listing the aggregator can pull signals from.
///
/// Implementations are stateless between calls; a fetch either yields an
/// ordered list of weighted mentions or a single error for the whole
/// source.
#[async_trait]
pub trait SignalSource: Send + Sync {
    fn id(&self) -> &'static str;

    async fn fetch(&self) -> Result<Vec<Signal>, FetchError>;
}

/// Build the scraper a tuning entry refers to.
pub fn build_source(
    tuning: &SourceTuning,
    profile: Arc<DomainProfile>,
    client: PageClient,
) -> Box<dyn SignalSource> {
    match tuning.kind {
        SourceKind::SearchTrends => {
            Box::new(google_trends::SearchTrendsSource::new(client, profile, tuning))
        }
        SourceKind::CommunityFeed => {
            Box::new(reddit::CommunityFeedSource::new(client, profile, tuning))
        }
        SourceKind::PopularFilms => {
            Box::new(letterboxd::PopularFilmsSource::new(client, tuning))
        }
        SourceKind::MiniseriesSearch => {
            Box::new(letterboxd::MiniseriesSearchSource::new(client, tuning))
        }
        SourceKind::ChartRanking => {
            Box::new(imdb::ChartRankingSource::new(client, profile.domain, tuning))
        }
        SourceKind::TrendingShows => {
            Box::new(trakt::TrendingShowsSource::new(client, tuning))
        }
    }
}

/// Insertion-ordered counter.
///
/// Accumulates weights per exact title string and can report the highest
/// scored entries with ties broken by first-seen order (stable sort over
/// the insertion sequence).
#[derive(Debug, Default)]
pub struct Tally {
    index: HashMap<String, usize>,
    entries: Vec<(String, u64)>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, title: &str, amount: u64) {
        match self.index.get(title) {
            Some(&i) => self.entries[i].1 += amount,
            None => {
                self.index.insert(title.to_string(), self.entries.len());
                self.entries.push((title.to_string(), amount));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The `n` highest-scored entries, descending, first-seen order on ties.
    pub fn most_common(&self, n: usize) -> Vec<(String, u64)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.truncate(n);
        sorted
    }

    /// Drain into weighted signals, highest first, capped at `keep`.
    pub fn into_signals(self, keep: usize) -> Vec<Signal> {
        self.most_common(keep)
            .into_iter()
            .map(|(title, weight)| Signal { title, weight })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_accumulates() {
        let mut tally = Tally::new();
        tally.add("Dune", 10);
        tally.add("Dune", 5);
        tally.add("Barbie", 3);
        assert_eq!(tally.len(), 2);
        assert_eq!(tally.most_common(10), vec![
            ("Dune".to_string(), 15),
            ("Barbie".to_string(), 3),
        ]);
    }

    #[test]
    fn test_tally_ties_keep_insertion_order() {
        let mut tally = Tally::new();
        tally.add("First", 5);
        tally.add("Second", 5);
        tally.add("Third", 7);
        let top = tally.most_common(3);
        assert_eq!(top[0].0, "Third");
        assert_eq!(top[1].0, "First");
        assert_eq!(top[2].0, "Second");
    }

    #[test]
    fn test_tally_most_common_caps() {
        let mut tally = Tally::new();
        for (i, name) in ["A", "B", "C", "D"].iter().enumerate() {
            tally.add(name, (10 - i) as u64);
        }
        assert_eq!(tally.most_common(2).len(), 2);
    }

    #[test]
    fn test_into_signals() {
        let mut tally = Tally::new();
        tally.add("The Bear", 8);
        let signals = tally.into_signals(5);
        assert_eq!(signals, vec![Signal::new("The Bear", 8)]);
    }
}
