//! Plausibility filtering for extracted title candidates.
//!
//! Extraction is permissive by design; this filter is what keeps
//! "official trailer discussion" out of the ranked list. All conditions
//! are pure functions of the string and the domain profile.

use crate::config::DomainProfile;

/// Decide whether a candidate string plausibly names a real title rather
/// than discussion noise.
///
/// Rejects when any of the following hold:
/// - fewer than 3 characters;
/// - contains an exclusion keyword (case-insensitive substring);
/// - more words than the profile ceiling;
/// - fewer capitalized words than the profile minimum;
/// - the first word (lowercased) is an interrogative/auxiliary.
pub fn is_plausible(title: &str, profile: &DomainProfile) -> bool {
    let title = title.trim();
    if title.chars().count() < 3 {
        return false;
    }

    let lower = title.to_lowercase();
    if profile
        .exclude_keywords
        .iter()
        .any(|keyword| lower.contains(keyword.as_str()))
    {
        return false;
    }

    let words: Vec<&str> = title.split_whitespace().collect();
    if words.is_empty() || words.len() > profile.max_words {
        return false;
    }

    let capitalized = words
        .iter()
        .filter(|word| word.chars().next().is_some_and(|c| c.is_uppercase()))
        .count();
    if capitalized < profile.min_capitalized {
        return false;
    }

    let first_word = words[0].to_lowercase();
    if profile.reject_leading.iter().any(|r| *r == first_word) {
        return false;
    }

    true
}
