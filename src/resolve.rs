//! Detail-page resolution and detail scraping on the reference site.
//!
//! The aggregator only produces title strings; everything that turns a
//! string into something reviewable lives here:
//!
//! - [`DetailResolver::resolve_title`]: title → canonical `/title/ttNNN/`
//!   URL via the find page;
//! - [`DetailResolver::chart_top_pick`]: authoritative fallback — the
//!   first row of the meter charts when no ranked candidate resolves;
//! - [`DetailResolver::fetch_details`]: plot summary from a title page;
//! - [`DetailResolver::reference_reviews`]: user-review snippets fed into
//!   the prompt as reference material.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, instrument, warn};
use url::Url;

use crate::fetch::{FetchError, PageClient};
use crate::models::{Domain, TitleDetails, TrendingPick};

const DETAIL_TIMEOUT: Duration = Duration::from_secs(10);
const BASE_URL: &str = "https://www.imdb.com";

/// Find-page result links, newest layout first.
const FIND_SELECTORS: [&str; 3] = [
    "a.ipc-metadata-list-summary-item__t",
    "td.result_text a",
    r#"a[href^="/title/"]"#,
];

/// Chart first-row candidates, most specific first.
const MOVIE_PICK_SELECTORS: [&str; 6] = [
    "table.chart.full-width tr td.titleColumn a",
    "td.titleColumn a",
    ".lister-list .lister-item-header a",
    "h3.lister-item-header a",
    r#"a[data-testid="title-link"]"#,
    r#"a[href^="/title/"]"#,
];
const TV_PICK_SELECTORS: [&str; 4] = [
    "table.chart.full-width tr td.titleColumn a",
    "td.titleColumn a",
    r#"a[data-testid="title-link"]"#,
    r#"a[href^="/title/"]"#,
];

const MOVIE_CHART_URLS: [&str; 2] = [
    "https://www.imdb.com/chart/moviemeter/",
    "https://www.imdb.com/chart/top/",
];
const TV_CHART_URLS: [&str; 1] = ["https://www.imdb.com/chart/tvmeter/"];

static IMDB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/title/(tt\d+)").unwrap());

const REVIEW_SELECTORS: [&str; 3] = [
    "div.review-container div.content div.text",
    "div.text.show-more__control",
    "div.review-container .content",
];

/// Extract the `ttNNN` identifier from a title URL.
pub fn extract_imdb_id(url: &str) -> Option<&str> {
    IMDB_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

#[derive(Debug, Clone)]
pub struct DetailResolver {
    client: PageClient,
}

impl DetailResolver {
    pub fn new(client: PageClient) -> Self {
        Self { client }
    }

    /// Resolve a bare title to its canonical detail page via search.
    ///
    /// Returns `None` on any failure; the orchestrator falls through to
    /// the next ranked candidate.
    #[instrument(level = "info", skip(self))]
    pub async fn resolve_title(&self, title: &str, domain: Domain) -> Option<TrendingPick> {
        let url = format!(
            "{BASE_URL}/find/?q={}&s=tt",
            urlencoding::encode(title)
        );
        let html = match self.client.get_text(&url, DETAIL_TIMEOUT).await {
            Ok(html) => html,
            Err(e) => {
                warn!(title, error = %e, "Find page fetch failed");
                return None;
            }
        };

        match parse_find_result(&html) {
            Some((text, href)) => {
                let pick = TrendingPick {
                    title: if text.is_empty() { title.to_string() } else { text },
                    url: absolutize(&href),
                };
                info!(title = %pick.title, url = %pick.url, "Resolved title to detail page");
                Some(pick)
            }
            None => {
                warn!(title, domain = domain.kind_key(), "No find result matched");
                None
            }
        }
    }

    /// Authoritative fallback: first row of the meter chart(s).
    ///
    /// Pages are tried in order of preference; the first page where any
    /// selector yields a row wins.
    #[instrument(level = "info", skip(self))]
    pub async fn chart_top_pick(&self, domain: Domain) -> Option<TrendingPick> {
        let urls: &[&str] = match domain {
            Domain::Movie => &MOVIE_CHART_URLS,
            Domain::Tv => &TV_CHART_URLS,
        };

        for url in urls {
            let html = match self.client.get_text(url, DETAIL_TIMEOUT).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(%url, error = %e, "Chart page fetch failed");
                    continue;
                }
            };
            if let Some(pick) = parse_chart_first_row(&html, domain) {
                info!(title = %pick.title, url = %pick.url, "Selected chart top pick");
                return Some(pick);
            }
        }

        warn!(
            domain = domain.kind_key(),
            "Could not find a top pick on any chart page"
        );
        None
    }

    /// Scrape the plot summary from a resolved detail page.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_details(&self, url: &str) -> Result<TitleDetails, FetchError> {
        let html = self.client.get_text(url, DETAIL_TIMEOUT).await?;
        Ok(TitleDetails {
            plot: parse_plot(&html),
        })
    }

    /// Scrape up to `max_reviews` user-review snippets for the title.
    ///
    /// Best effort: any failure yields an empty list.
    #[instrument(level = "info", skip(self))]
    pub async fn reference_reviews(&self, url: &str, max_reviews: usize) -> Vec<String> {
        let Some(tt) = extract_imdb_id(url) else {
            return Vec::new();
        };
        let reviews_url = format!("{BASE_URL}/title/{tt}/reviews");
        let html = match self.client.get_text(&reviews_url, DETAIL_TIMEOUT).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %reviews_url, error = %e, "Reviews page fetch failed");
                return Vec::new();
            }
        };
        parse_review_snippets(&html, max_reviews)
    }
}

fn absolutize(href: &str) -> String {
    let path = href.split('?').next().unwrap_or(href);
    if path.starts_with("http") {
        return path.to_string();
    }
    match Url::parse(BASE_URL).and_then(|base| base.join(path)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => format!("{BASE_URL}{path}"),
    }
}

/// Text, `title`/`aria-label` attribute, or descendant image alt —
/// whichever is present first. Some chart rows carry no visible text.
fn element_title(element: ElementRef<'_>) -> String {
    let text = element.text().collect::<String>().trim().to_string();
    if !text.is_empty() {
        return text;
    }
    for attr in ["title", "aria-label"] {
        if let Some(value) = element.value().attr(attr) {
            let value = value.trim();
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }
    let img = Selector::parse("img").unwrap();
    element
        .select(&img)
        .find_map(|i| i.value().attr("alt"))
        .map(|alt| alt.trim().to_string())
        .unwrap_or_default()
}

pub(crate) fn parse_find_result(html: &str) -> Option<(String, String)> {
    let document = Html::parse_document(html);
    for raw in FIND_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let href = element.value().attr("href")?.to_string();
            return Some((element_title(element), href));
        }
    }
    None
}

pub(crate) fn parse_chart_first_row(html: &str, domain: Domain) -> Option<TrendingPick> {
    let document = Html::parse_document(html);
    let selectors: &[&str] = match domain {
        Domain::Movie => &MOVIE_PICK_SELECTORS,
        Domain::Tv => &TV_PICK_SELECTORS,
    };

    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let title = element_title(element);
            let href = element.value().attr("href").unwrap_or("");
            if title.is_empty() || href.is_empty() {
                continue;
            }
            return Some(TrendingPick {
                title,
                url: absolutize(href),
            });
        }
    }
    None
}

pub(crate) fn parse_plot(html: &str) -> String {
    let document = Html::parse_document(html);
    for raw in [
        r#"span[data-testid="plot-l"]"#,
        r#"span[data-testid="plot-xl"]"#,
    ] {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let plot = element.text().collect::<String>().trim().to_string();
            if !plot.is_empty() {
                return plot;
            }
        }
    }
    "Plot not found.".to_string()
}

pub(crate) fn parse_review_snippets(html: &str, max_reviews: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut snippets = Vec::new();

    'outer: for raw in REVIEW_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in document.select(&selector) {
            let text = element
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if !text.is_empty() {
                snippets.push(text);
            }
            if snippets.len() >= max_reviews {
                break 'outer;
            }
        }
        if snippets.len() >= max_reviews {
            break;
        }
    }

    if snippets.is_empty() {
        let Ok(selector) = Selector::parse(".ipl-zebra-list__item p") else {
            return snippets;
        };
        for p in document.select(&selector) {
            let text = p.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                snippets.push(text);
            }
            if snippets.len() >= max_reviews {
                break;
            }
        }
    }

    snippets.truncate(max_reviews);
    snippets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_imdb_id() {
        assert_eq!(
            extract_imdb_id("https://www.imdb.com/title/tt15398776/"),
            Some("tt15398776")
        );
        assert_eq!(extract_imdb_id("https://www.imdb.com/chart/top/"), None);
    }

    #[test]
    fn test_absolutize_strips_query() {
        assert_eq!(
            absolutize("/title/tt0111161/?ref_=chttp_t_1"),
            "https://www.imdb.com/title/tt0111161/"
        );
        assert_eq!(
            absolutize("https://www.imdb.com/title/tt0111161/"),
            "https://www.imdb.com/title/tt0111161/"
        );
    }

    #[test]
    fn test_parse_find_result() {
        let html = r#"
            <a class="ipc-metadata-list-summary-item__t" href="/title/tt15398776/?ref_=fn_al">Oppenheimer</a>
        "#;
        let (title, href) = parse_find_result(html).unwrap();
        assert_eq!(title, "Oppenheimer");
        assert!(href.starts_with("/title/tt15398776/"));
    }

    #[test]
    fn test_parse_find_result_legacy_layout() {
        let html = r#"
            <td class="result_text"><a href="/title/tt1160419/">Dune</a></td>
        "#;
        let (title, _) = parse_find_result(html).unwrap();
        assert_eq!(title, "Dune");
    }

    #[test]
    fn test_parse_chart_first_row_image_alt_fallback() {
        let html = r#"
            <a data-testid="title-link" href="/title/tt0903747/?ref_=chtvm">
                <img alt="Breaking Bad" src="poster.jpg">
            </a>
        "#;
        let pick = parse_chart_first_row(html, Domain::Tv).unwrap();
        assert_eq!(pick.title, "Breaking Bad");
        assert_eq!(pick.url, "https://www.imdb.com/title/tt0903747/");
    }

    #[test]
    fn test_parse_chart_first_row_none_on_empty() {
        assert!(parse_chart_first_row("<html></html>", Domain::Movie).is_none());
    }

    #[test]
    fn test_parse_plot() {
        let html = r#"<span data-testid="plot-xl">A scientist races to build the bomb.</span>"#;
        assert_eq!(parse_plot(html), "A scientist races to build the bomb.");
        assert_eq!(parse_plot("<html></html>"), "Plot not found.");
    }

    #[test]
    fn test_parse_review_snippets_caps_and_falls_back() {
        let html = r#"
            <div class="review-container"><div class="content"><div class="text">First review body.</div></div></div>
            <div class="review-container"><div class="content"><div class="text">Second review body.</div></div></div>
            <div class="review-container"><div class="content"><div class="text">Third review body.</div></div></div>
            <div class="review-container"><div class="content"><div class="text">Fourth review body.</div></div></div>
        "#;
        let snippets = parse_review_snippets(html, 3);
        assert_eq!(snippets.len(), 3);
        assert_eq!(snippets[0], "First review body.");

        let fallback_html = r#"
            <div class="ipl-zebra-list__item"><p>Paragraph review.</p></div>
        "#;
        let snippets = parse_review_snippets(fallback_html, 3);
        assert_eq!(snippets, vec!["Paragraph review.".to_string()]);
    }
}
