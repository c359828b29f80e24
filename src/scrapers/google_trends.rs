//! Daily search-trends feed scraper.
//!
//! Trend entries are free text ("Dune Part Two movie tickets"), so this
//! source runs the loose feed extractor over every entry that mentions
//! one of the profile's indicator keywords, and weights titles by how
//! often they recur in the feed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

use crate::config::{DomainProfile, SourceTuning};
use crate::extract::extract_feed_title;
use crate::fetch::{FetchError, PageClient};
use crate::filter::is_plausible;
use crate::models::{Domain, Signal};
use crate::scrapers::{SignalSource, Tally};

const FEED_URL: &str = "https://trends.google.com/trends/trendingsearches/daily?geo=US";
const FEED_TIMEOUT: Duration = Duration::from_secs(15);
/// At most this many feed entries are considered per selector.
const MAX_FEED_ITEMS: usize = 20;

/// The feed markup changes regularly; selectors are tried in order and
/// the first one yielding any entries wins.
const MOVIE_SELECTORS: [&str; 4] = [
    "div.feed-item span.title",
    "div.title a",
    r#"div[class*="title"]"#,
    r#"span[class*="title"]"#,
];
const TV_SELECTORS: [&str; 3] = [
    "div.feed-item span.title",
    "div.title a",
    r#"div[class*="title"]"#,
];

pub struct SearchTrendsSource {
    client: PageClient,
    profile: Arc<DomainProfile>,
    item_weight: u64,
    keep: usize,
}

impl SearchTrendsSource {
    pub fn new(client: PageClient, profile: Arc<DomainProfile>, tuning: &SourceTuning) -> Self {
        Self {
            client,
            profile,
            item_weight: tuning.item_weight,
            keep: tuning.keep.unwrap_or(usize::MAX),
        }
    }
}

#[async_trait]
impl SignalSource for SearchTrendsSource {
    fn id(&self) -> &'static str {
        "search_trends"
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch(&self) -> Result<Vec<Signal>, FetchError> {
        let html = self.client.get_text(FEED_URL, FEED_TIMEOUT).await?;
        Ok(parse_feed(&html, &self.profile, self.item_weight, self.keep))
    }
}

pub(crate) fn parse_feed(
    html: &str,
    profile: &DomainProfile,
    item_weight: u64,
    keep: usize,
) -> Vec<Signal> {
    let document = Html::parse_document(html);
    let selectors: &[&str] = match profile.domain {
        Domain::Movie => &MOVIE_SELECTORS,
        Domain::Tv => &TV_SELECTORS,
    };

    let mut tally = Tally::new();
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let entries: Vec<String> = document
            .select(&selector)
            .take(MAX_FEED_ITEMS)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect();
        if entries.is_empty() {
            continue;
        }

        for text in &entries {
            let lower = text.to_lowercase();
            if !profile
                .feed_indicators
                .iter()
                .any(|ind| lower.contains(ind.as_str()))
            {
                continue;
            }
            if let Some(title) = extract_feed_title(text, profile.domain) {
                if is_plausible(&title, profile) {
                    tally.add(&title, item_weight);
                }
            }
        }
        debug!(selector = raw, entries = entries.len(), "Parsed trends feed");
        break;
    }

    tally.into_signals(keep)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie_profile() -> DomainProfile {
        DomainProfile::movie()
    }

    #[test]
    fn test_parse_feed_extracts_indicator_entries() {
        let html = r#"
            <div class="feed-item"><span class="title">Godzilla Minus One movie showtimes</span></div>
            <div class="feed-item"><span class="title">taylor swift tour dates</span></div>
            <div class="feed-item"><span class="title">Godzilla Minus One movie review bombing</span></div>
        "#;
        let signals = parse_feed(html, &movie_profile(), 10, 8);
        assert_eq!(signals, vec![Signal::new("Godzilla Minus One", 20)]);
    }

    #[test]
    fn test_parse_feed_selector_fallback() {
        // No feed-item spans; the second selector candidate picks up the
        // plain title links.
        let html = r#"
            <div class="title"><a>Dune Part Two movie tickets</a></div>
        "#;
        let signals = parse_feed(html, &movie_profile(), 10, 8);
        assert_eq!(signals, vec![Signal::new("Dune Part Two", 10)]);
    }

    #[test]
    fn test_parse_feed_ignores_non_indicator_text() {
        let html = r#"
            <div class="feed-item"><span class="title">Big Sports Game Tonight Live</span></div>
        "#;
        let signals = parse_feed(html, &movie_profile(), 10, 8);
        assert!(signals.is_empty());
    }

    #[test]
    fn test_parse_feed_empty_document() {
        assert!(parse_feed("<html></html>", &movie_profile(), 10, 8).is_empty());
    }

    #[test]
    fn test_parse_feed_tv_indicators() {
        let profile = DomainProfile::tv();
        let html = r#"
            <div class="feed-item"><span class="title">Slow Horses Apple TV season finale</span></div>
        "#;
        let signals = parse_feed(html, &profile, 8, 10);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].weight, 8);
    }
}
