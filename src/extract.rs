//! Heuristic title extraction from noisy feed and forum text.
//!
//! Two extractors, both "first matching rule wins":
//!
//! - [`extract_community_title`] understands the patterns people use in
//!   discussion-post titles (quotes, release years, episode markers,
//!   bracket tags, "just watched ..." phrasing). The rule order is a
//!   pinned behavioral contract: reordering changes observable output.
//! - [`extract_feed_title`] is the looser fallback for search-trends feed
//!   entries, ending in a capitalized-word-run heuristic.
//!
//! Extraction only guesses a candidate string; plausibility is judged
//! separately by [`crate::filter::is_plausible`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Domain;

static QUOTED_MOVIE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["']([A-Z][^"']{3,50})["']"#).unwrap());
static QUOTED_TV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["']([A-Z][^"']{3,60})["']"#).unwrap());
static TITLE_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z][A-Za-z\s':&-]{3,50})\s*\((202[0-9])\)").unwrap());
static SEASON_DASH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z][A-Za-z\s':&-]{3,50})\s*[-–]\s*[Ss](?:eason)?\s*\d+").unwrap()
});
static EPISODE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z][A-Za-z\s':&-]{3,50})\s*[Ss]\d+[Ee]\d+").unwrap());
static EPISODE_CROSS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z][A-Za-z\s':&-]{3,50})\s*\d+x\d+").unwrap());
static BRACKET_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(?:Discussion|Review|Official)\]\s*([A-Z][A-Za-z\s':&-]{3,50})").unwrap()
});
static BRACKET_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z][A-Za-z\s':&-]{3,50})\s*\[(?:Discussion|Review)").unwrap()
});
static BRACKET_ANY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([A-Z][A-Za-z\s':&-]{3,50})\]").unwrap());
static VERB_MOVIE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?:watched|saw|loved|hated)\s+["']?([A-Z][A-Za-z\s':&-]{3,50})["']?(?:\s+(?:is|was|and))?"#,
    )
    .unwrap()
});
static VERB_TV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?:watched|binged|finished|loved|hated)\s+["']?([A-Z][A-Za-z\s':&-]{3,50})["']?(?:\s+(?:is|was|and))?"#,
    )
    .unwrap()
});

/// Words inside quotes that mark a quoted line of dialogue rather than a
/// show title.
const ATTRIBUTION_VERBS: [&str; 4] = ["said", "says", "told", "revealed"];

static QUOTED_ANY: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["']([^"']{3,})["']"#).unwrap());
static FEED_TITLE_MOVIE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z][a-zA-Z\s':&-]{3,50})\s*\(202[0-9]\)").unwrap());
static FEED_TITLE_TV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z][a-zA-Z\s':&-]{3,50})\s*(?:\(202[0-9]\)|[-–]\s*[Ss]eason)").unwrap()
});
static CAPITALIZED_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-zA-Z]{2,}\b").unwrap());

fn capture_trimmed(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Guess a media title embedded in a discussion-post title.
///
/// Rules are tried in order; the first match is returned even if a later
/// rule would produce a "better" candidate.
pub fn extract_community_title(text: &str, domain: Domain) -> Option<String> {
    // 1. Quoted substring starting with an uppercase letter. For TV a
    //    quote containing attribution verbs is a line of dialogue, not a
    //    title, and extraction falls through to the remaining rules.
    let quoted = match domain {
        Domain::Movie => &QUOTED_MOVIE,
        Domain::Tv => &QUOTED_TV,
    };
    if let Some(candidate) = capture_trimmed(quoted, text) {
        match domain {
            Domain::Movie => return Some(candidate),
            Domain::Tv => {
                let lower = candidate.to_lowercase();
                if !ATTRIBUTION_VERBS.iter().any(|verb| lower.contains(verb)) {
                    return Some(candidate);
                }
            }
        }
    }

    // 2. Title (YYYY) with a 202x year.
    if let Some(candidate) = capture_trimmed(&TITLE_YEAR, text) {
        return Some(candidate);
    }

    // 3. Episode markers: "Title - Season N", "Title S01E01", "Title 1x01".
    if domain.is_tv() {
        for re in [&SEASON_DASH, &EPISODE_CODE, &EPISODE_CROSS] {
            if let Some(candidate) = capture_trimmed(re, text) {
                return Some(candidate);
            }
        }
    }

    // 4. Bracket tags.
    match domain {
        Domain::Movie => {
            for re in [&BRACKET_PREFIX, &BRACKET_SUFFIX] {
                if let Some(candidate) = capture_trimmed(re, text) {
                    return Some(candidate);
                }
            }
        }
        Domain::Tv => {
            if let Some(candidate) = capture_trimmed(&BRACKET_ANY, text) {
                return Some(candidate);
            }
        }
    }

    // 5. "just watched/binged Title is ..." phrasing.
    let verb = match domain {
        Domain::Movie => &VERB_MOVIE,
        Domain::Tv => &VERB_TV,
    };
    capture_trimmed(verb, text)
}

/// Looser extraction for trends-feed entries.
///
/// Tries quoted substrings, then `Title (year)` (TV also accepts a
/// season marker), then falls back to joining capitalized words.
pub fn extract_feed_title(text: &str, domain: Domain) -> Option<String> {
    if text.chars().count() < 5 {
        return None;
    }

    if let Some(candidate) = capture_trimmed(&QUOTED_ANY, text) {
        return Some(candidate);
    }

    let anchored = match domain {
        Domain::Movie => &FEED_TITLE_MOVIE,
        Domain::Tv => &FEED_TITLE_TV,
    };
    if let Some(candidate) = capture_trimmed(anchored, text) {
        return Some(candidate);
    }

    let words: Vec<&str> = CAPITALIZED_TOKEN
        .find_iter(text)
        .map(|m| m.as_str())
        .collect();
    match domain {
        Domain::Movie => {
            if words.len() >= 2 {
                let title = words[..words.len().min(6)].join(" ");
                let len = title.chars().count();
                if (8..=60).contains(&len) {
                    return Some(title);
                }
            }
        }
        Domain::Tv => {
            if (2..=8).contains(&words.len()) {
                let title = words[..words.len().min(8)].join(" ");
                let len = title.chars().count();
                if (8..=80).contains(&len) {
                    return Some(title);
                }
            }
        }
    }

    None
}
