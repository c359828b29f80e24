//! IMDb meter chart scraper (the authoritative ranking source).
//!
//! The meter pages have shipped at least two markup generations; the
//! selector chain covers both the legacy table layout and the current
//! ipc components. Row text arrives as "1. The Title", so rank prefixes
//! are stripped before the title is kept.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::instrument;

use crate::config::SourceTuning;
use crate::fetch::{FetchError, PageClient};
use crate::models::{Domain, Signal};
use crate::scrapers::SignalSource;

const CHART_TIMEOUT: Duration = Duration::from_secs(12);
const MOVIE_METER_URL: &str = "https://www.imdb.com/chart/moviemeter/";
const TV_METER_URL: &str = "https://www.imdb.com/chart/tvmeter/";

const MOVIE_SELECTORS: [&str; 3] = [
    "td.titleColumn a",
    "h3.ipc-title__text",
    "a.ipc-title-link-wrapper",
];
const TV_SELECTORS: [&str; 4] = [
    "td.titleColumn a",
    "h3.ipc-title__text",
    "a.ipc-title-link-wrapper",
    "li.ipc-metadata-list-summary-item a",
];

/// Stop trying further selectors once this many rows are collected.
const CHART_ENOUGH: usize = 5;

static RANK_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s*").unwrap());

pub struct ChartRankingSource {
    client: PageClient,
    domain: Domain,
    item_weight: u64,
    keep: usize,
}

impl ChartRankingSource {
    pub fn new(client: PageClient, domain: Domain, tuning: &SourceTuning) -> Self {
        Self {
            client,
            domain,
            item_weight: tuning.item_weight,
            keep: tuning.keep.unwrap_or(usize::MAX),
        }
    }
}

#[async_trait]
impl SignalSource for ChartRankingSource {
    fn id(&self) -> &'static str {
        "chart_ranking"
    }

    #[instrument(level = "info", skip_all)]
    async fn fetch(&self) -> Result<Vec<Signal>, FetchError> {
        let url = match self.domain {
            Domain::Movie => MOVIE_METER_URL,
            Domain::Tv => TV_METER_URL,
        };
        let html = self.client.get_text(url, CHART_TIMEOUT).await?;
        let titles = parse_chart(&html, self.domain);
        Ok(titles
            .into_iter()
            .take(self.keep)
            .map(|title| Signal::new(title, self.item_weight))
            .collect())
    }
}

pub(crate) fn parse_chart(html: &str, domain: Domain) -> Vec<String> {
    let document = Html::parse_document(html);
    let selectors: &[&str] = match domain {
        Domain::Movie => &MOVIE_SELECTORS,
        Domain::Tv => &TV_SELECTORS,
    };

    let mut titles = Vec::new();
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in document.select(&selector) {
            let text = element.text().collect::<String>();
            let title = RANK_PREFIX.replace(text.trim(), "").trim().to_string();
            if title.chars().count() > 2 && !title.chars().all(|c| c.is_ascii_digit()) {
                titles.push(title);
            }
        }
        if titles.len() > CHART_ENOUGH {
            break;
        }
    }

    titles
}
