//! Trakt trending-shows listing scraper.

use std::time::Duration;

use async_trait::async_trait;
use itertools::Itertools;
use scraper::{Html, Selector};
use tracing::instrument;

use crate::config::SourceTuning;
use crate::fetch::{FetchError, PageClient};
use crate::models::Signal;
use crate::scrapers::SignalSource;

const PAGE_TIMEOUT: Duration = Duration::from_secs(12);
const TRENDING_URL: &str = "https://trakt.tv/shows/trending";

const SELECTORS: [&str; 3] = [
    "h3.show-title a",
    "div.titles h3 a",
    r#"a[href*="/shows/"]"#,
];
/// Stop trying further selectors once this many titles are collected.
const ENOUGH: usize = 8;

pub struct TrendingShowsSource {
    client: PageClient,
    item_weight: u64,
    keep: usize,
}

impl TrendingShowsSource {
    pub fn new(client: PageClient, tuning: &SourceTuning) -> Self {
        Self {
            client,
            item_weight: tuning.item_weight,
            keep: tuning.keep.unwrap_or(usize::MAX),
        }
    }
}

#[async_trait]
impl SignalSource for TrendingShowsSource {
    fn id(&self) -> &'static str {
        "trending_shows"
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch(&self) -> Result<Vec<Signal>, FetchError> {
        let html = self.client.get_text(TRENDING_URL, PAGE_TIMEOUT).await?;
        Ok(parse_trending(&html)
            .into_iter()
            .unique()
            .take(self.keep)
            .map(|title| Signal::new(title, self.item_weight))
            .collect())
    }
}

pub(crate) fn parse_trending(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut titles = Vec::new();
    for raw in SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in document.select(&selector) {
            let title = element.text().collect::<String>().trim().to_string();
            if title.chars().count() > 2 {
                titles.push(title);
            }
        }
        if titles.len() > ENOUGH {
            break;
        }
    }

    titles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trending_show_titles() {
        let html = r#"
            <h3 class="show-title"><a>The Last of Us</a></h3>
            <h3 class="show-title"><a>Severance</a></h3>
        "#;
        let titles = parse_trending(html);
        assert_eq!(titles, vec!["The Last of Us".to_string(), "Severance".to_string()]);
    }

    #[test]
    fn test_parse_trending_href_fallback() {
        let html = r#"
            <a href="/shows/the-bear">The Bear</a>
            <a href="/movies/anora">Anora</a>
        "#;
        let titles = parse_trending(html);
        assert_eq!(titles, vec!["The Bear".to_string()]);
    }

    #[test]
    fn test_parse_trending_empty() {
        assert!(parse_trending("<html></html>").is_empty());
    }
}
