//! Community discussion feed scraper (subreddit hot pages).
//!
//! Post titles are the noisiest input in the pipeline, so everything goes
//! through the community-pattern extractor before counting. A failing
//! subreddit is skipped; the source only fails as a whole if every page
//! fetch fails, and even then the aggregator degrades it to zero signal.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};

use crate::config::{DomainProfile, SourceTuning};
use crate::extract::extract_community_title;
use crate::fetch::{FetchError, PageClient};
use crate::filter::is_plausible;
use crate::models::{Domain, Signal};
use crate::scrapers::{SignalSource, Tally};

const PAGE_TIMEOUT: Duration = Duration::from_secs(12);
/// Per-page ceiling on scraped posts.
const MAX_POSTS: usize = 25;

const MOVIE_SUBREDDITS: [&str; 4] = ["movies", "flicks", "TrueFilm", "MovieSuggestions"];
const TV_SUBREDDITS: [&str; 10] = [
    "television",
    "tvshows",
    "NetflixBestOf",
    "TVDetails",
    "TheLastOfUsHBO",
    "HouseOfTheDragon",
    "Severance",
    "SuccessionTV",
    "TheBear",
    "TheBoysTV",
];

const MOVIE_AGENT: &str = "Mozilla/5.0 (compatible; MovieBot/1.0)";
const TV_AGENT: &str = "Mozilla/5.0 (compatible; TVBot/1.0)";

pub struct CommunityFeedSource {
    client: PageClient,
    profile: Arc<DomainProfile>,
    item_weight: u64,
    keep: usize,
}

impl CommunityFeedSource {
    pub fn new(client: PageClient, profile: Arc<DomainProfile>, tuning: &SourceTuning) -> Self {
        Self {
            client,
            profile,
            item_weight: tuning.item_weight,
            keep: tuning.keep.unwrap_or(usize::MAX),
        }
    }

    fn subreddits(&self) -> &'static [&'static str] {
        match self.profile.domain {
            Domain::Movie => &MOVIE_SUBREDDITS,
            Domain::Tv => &TV_SUBREDDITS,
        }
    }

    fn agent(&self) -> &'static str {
        match self.profile.domain {
            Domain::Movie => MOVIE_AGENT,
            Domain::Tv => TV_AGENT,
        }
    }
}

#[async_trait]
impl SignalSource for CommunityFeedSource {
    fn id(&self) -> &'static str {
        "community_feed"
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch(&self) -> Result<Vec<Signal>, FetchError> {
        // Pages are fetched one after another; a failing subreddit just
        // contributes nothing.
        let mut posts: Vec<String> = Vec::new();
        for subreddit in self.subreddits().iter().copied() {
            posts.extend(self.fetch_page_titles(subreddit).await);
        }

        let mut tally = Tally::new();
        for text in posts {
            if let Some(title) = extract_community_title(&text, self.profile.domain) {
                if is_plausible(&title, &self.profile) {
                    tally.add(&title, self.item_weight);
                }
            }
        }

        Ok(tally.into_signals(self.keep))
    }
}

impl CommunityFeedSource {
    /// Fetch and parse one subreddit's hot page. A failing fetch yields no
    /// titles rather than propagating, so one dead subreddit can't sink the
    /// whole source.
    async fn fetch_page_titles(&self, subreddit: &'static str) -> Vec<String> {
        let url = format!("https://old.reddit.com/r/{subreddit}/hot/");
        match self.client.get_text_as(&url, PAGE_TIMEOUT, self.agent()).await {
            Ok(html) => {
                let titles = collect_post_titles(&html);
                debug!(subreddit, posts = titles.len(), "Scraped community page");
                titles
            }
            Err(e) => {
                warn!(subreddit, error = %e, "Community page fetch failed; skipping");
                Vec::new()
            }
        }
    }
}

/// Pull the post titles out of an old-style listing page.
pub(crate) fn collect_post_titles(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let post_selector = Selector::parse("div.thing").unwrap();
    let title_selector = Selector::parse("a.title").unwrap();

    document
        .select(&post_selector)
        .take(MAX_POSTS)
        .filter_map(|post| {
            post.select(&title_selector)
                .next()
                .map(|a| a.text().collect::<String>().trim().to_string())
        })
        .filter(|text| !text.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_post_titles() {
        let html = r#"
            <div class="thing"><a class="title">[Discussion] The Brutalist</a></div>
            <div class="thing"><p>no link here</p></div>
            <div class="thing"><a class="title">What should I watch tonight?</a></div>
        "#;
        let titles = collect_post_titles(html);
        assert_eq!(titles, vec![
            "[Discussion] The Brutalist".to_string(),
            "What should I watch tonight?".to_string(),
        ]);
    }

    #[test]
    fn test_collect_post_titles_caps_at_ceiling() {
        let mut html = String::new();
        for i in 0..40 {
            html.push_str(&format!(
                r#"<div class="thing"><a class="title">Post Number {i}</a></div>"#
            ));
        }
        assert_eq!(collect_post_titles(&html).len(), MAX_POSTS);
    }

    #[test]
    fn test_collect_post_titles_empty_page() {
        assert!(collect_post_titles("<html><body></body></html>").is_empty());
    }
}
