//! Letterboxd listing scrapers.
//!
//! Two sources live here: the popular-this-week films listing and the
//! miniseries search listing used by the TV domain. Both yield already
//! clean titles, weighted uniformly; the aggregator applies the fixed
//! per-source weight via its multiplier.

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
const POPULAR_URL: &str = "https://letterboxd.com/films/popular/this/week/";
const MINISERIES_URL: &str = "https://letterboxd.com/search/miniseries/";

/// Selectors accumulate until enough titles are collected; poster images
/// carry the film name in their alt text when the headline markup is
/// absent.
const POPULAR_SELECTORS: [&str; 3] = [
    "h2.headline-2",
    "img.image",
    r#"a[href*="/film/"]"#,
];
/// Stop trying further selectors once this many raw titles are collected.
const POPULAR_ENOUGH: usize = 10;

pub struct PopularFilmsSource {
    client: PageClient,
    item_weight: u64,
    keep: usize,
}

impl PopularFilmsSource {
    pub fn new(client: PageClient, tuning: &SourceTuning) -> Self {
        Self {
            client,
            item_weight: tuning.item_weight,
            keep: tuning.keep.unwrap_or(usize::MAX),
        }
    }
}

#[async_trait]
impl SignalSource for PopularFilmsSource {
    fn id(&self) -> &'static str {
        "popular_films"
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch(&self) -> Result<Vec<Signal>, FetchError> {
        let html = self.client.get_text(POPULAR_URL, PAGE_TIMEOUT).await?;
        Ok(to_signals(parse_popular(&html), self.item_weight, self.keep))
    }
}

pub struct MiniseriesSearchSource {
    client: PageClient,
    item_weight: u64,
    keep: usize,
}

impl MiniseriesSearchSource {
    pub fn new(client: PageClient, tuning: &SourceTuning) -> Self {
        Self {
            client,
            item_weight: tuning.item_weight,
            keep: tuning.keep.unwrap_or(usize::MAX),
        }
    }
}

#[async_trait]
impl SignalSource for MiniseriesSearchSource {
    fn id(&self) -> &'static str {
        "miniseries_search"
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch(&self) -> Result<Vec<Signal>, FetchError> {
        let html = self.client.get_text(MINISERIES_URL, PAGE_TIMEOUT).await?;
        Ok(to_signals(parse_film_links(&html), self.item_weight, self.keep))
    }
}

fn to_signals(titles: Vec<String>, item_weight: u64, keep: usize) -> Vec<Signal> {
    titles
        .into_iter()
        .unique()
        .take(keep)
        .map(|title| Signal::new(title, item_weight))
        .collect()
}

pub(crate) fn parse_popular(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut titles = Vec::new();

    for raw in POPULAR_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in document.select(&selector) {
            let title = if raw == "img.image" {
                element.value().attr("alt").unwrap_or("").trim().to_string()
            } else {
                element.text().collect::<String>().trim().to_string()
            };
            if title.chars().count() > 2 {
                titles.push(title);
            }
        }
        if titles.len() > POPULAR_ENOUGH {
            break;
        }
    }

    titles
}

pub(crate) fn parse_film_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(r#"a[href*="/film/"]"#) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|a| a.text().collect::<String>().trim().to_string())
        .filter(|title| title.chars().count() > 2)
        .collect()
}
