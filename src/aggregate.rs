//! The buzz aggregator: merges weighted title mentions from every
//! configured source into one ranked trending list.
//!
//! Sources run strictly one after another; a failing source contributes
//! zero signal for the run and is never retried. The aggregator itself
//! has no failure path — it always returns a (possibly empty) ranked
//! list.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::DomainProfile;
use crate::fetch::PageClient;
use crate::filter::is_plausible;
use crate::models::RankedTitle;
use crate::scrapers::{self, SignalSource, Tally};

/// A source together with its aggregation tuning.
pub struct WeightedSource {
    pub source: Box<dyn SignalSource>,
    /// Applied to every item weight during accumulation.
    pub multiplier: u64,
    /// Only this many leading items of the source are merged.
    pub take: Option<usize>,
}

/// Generic trend aggregator, parameterized by a [`DomainProfile`].
pub struct TrendAnalyst {
    profile: Arc<DomainProfile>,
    sources: Vec<WeightedSource>,
}

impl TrendAnalyst {
    /// Build the analyst with the scrapers the profile's source table
    /// names.
    pub fn from_profile(profile: DomainProfile, client: &PageClient) -> Self {
        let profile = Arc::new(profile);
        let sources = profile
            .sources
            .iter()
            .map(|tuning| WeightedSource {
                multiplier: tuning.multiplier,
                take: tuning.take,
                source: scrapers::build_source(tuning, Arc::clone(&profile), client.clone()),
            })
            .collect();
        Self { profile, sources }
    }

    /// Build the analyst over caller-provided sources. Used with stub
    /// sources in tests and available for custom wiring.
    pub fn with_sources(profile: DomainProfile, sources: Vec<WeightedSource>) -> Self {
        Self {
            profile: Arc::new(profile),
            sources,
        }
    }

    /// Collect signals from every source and return the top candidates.
    ///
    /// The result is at most `top_n` long, sorted by descending buzz
    /// score with ties in first-seen order, and free of duplicates by
    /// construction (accumulation merges exact title strings).
    #[instrument(level = "info", skip_all, fields(domain = self.profile.domain.kind_key(), top_n = top_n))]
    pub async fn analyze_trending(&self, top_n: usize) -> Vec<RankedTitle> {
        let mut tally = Tally::new();

        for weighted in &self.sources {
            match weighted.source.fetch().await {
                Ok(signals) => {
                    let take = weighted.take.unwrap_or(usize::MAX);
                    let mut merged = 0usize;
                    for signal in signals.iter().take(take) {
                        let title = signal.title.trim();
                        if title.is_empty() {
                            continue;
                        }
                        tally.add(title, signal.weight * weighted.multiplier);
                        merged += 1;
                    }
                    info!(
                        source = weighted.source.id(),
                        yielded = signals.len(),
                        merged,
                        "Merged source signals"
                    );
                }
                Err(e) => {
                    warn!(
                        source = weighted.source.id(),
                        error = %e,
                        "Source yielded no signal for this run"
                    );
                }
            }
        }

        if tally.is_empty() {
            info!("No signals collected from any source");
        }

        // Shortlist three times the requested count, then keep the first
        // top_n that survive plausibility filtering.
        let shortlist = tally.most_common(top_n.saturating_mul(3));
        let mut ranked = Vec::with_capacity(top_n);
        for (title, buzz_score) in shortlist {
            if ranked.len() == top_n {
                break;
            }
            if is_plausible(&title, &self.profile) {
                ranked.push(RankedTitle {
                    rank: ranked.len() + 1,
                    title,
                    buzz_score,
                });
            }
        }

        info!(candidates = tally.len(), ranked = ranked.len(), "Trend analysis complete");
        ranked
    }
}
