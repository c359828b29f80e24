//! The pipeline orchestrator: trend analysis → resolution → details →
//! review → draft.
//!
//! Candidate handling is a fall-through chain: the top ranked title that
//! both resolves and yields details wins; when none does, the
//! authoritative chart pick is tried; when even that fails the kind is
//! given up for this run (logged, never fatal). Draft creation is
//! suppressed when the same item was drafted recently and the draft still
//! exists remotely.

use std::error::Error;
use std::io::{self, Write};

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::aggregate::TrendAnalyst;
use crate::config::{AppConfig, DomainProfile};
use crate::fetch::PageClient;
use crate::hashnode::{HashnodeClient, PublishOutcome};
use crate::models::{Domain, TitleDetails, TrendingPick};
use crate::resolve::DetailResolver;
use crate::review::ReviewWriter;
use crate::storage::{DraftLedger, append_video_prompt, build_video_prompt};

/// How many ranked candidates the fall-through chain may try.
const TOP_CANDIDATES: usize = 5;
/// How many reference review snippets feed the prompt.
const MAX_REFERENCE_REVIEWS: usize = 3;

pub struct Pipeline {
    config: AppConfig,
    client: PageClient,
    resolver: DetailResolver,
    writer: ReviewWriter,
    publisher: HashnodeClient,
    ledger: DraftLedger,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Result<Self, Box<dyn Error>> {
        let client = PageClient::new()?;
        let resolver = DetailResolver::new(client.clone());
        let writer = ReviewWriter::new(&config)?;
        let publisher = HashnodeClient::new(&config)?;
        let ledger = DraftLedger::new(config.last_draft_path.clone());
        Ok(Self {
            config,
            client,
            resolver,
            writer,
            publisher,
            ledger,
        })
    }

    /// Run the full pipeline for each requested kind in order.
    ///
    /// A failing kind never aborts the others.
    pub async fn run(&self, kinds: &[Domain], approve: bool) {
        for domain in kinds {
            if let Err(e) = self.run_kind(*domain, approve).await {
                error!(kind = domain.kind_key(), error = %e, "Pipeline run failed");
            }
        }
    }

    #[instrument(level = "info", skip_all, fields(kind = domain.kind_key()))]
    async fn run_kind(&self, domain: Domain, approve: bool) -> Result<(), Box<dyn Error>> {
        info!("Phase 1: finding trending {}", domain.label());
        let Some((pick, details)) = self.select_candidate(domain).await else {
            warn!("No trending {} found this run", domain.label());
            return Ok(());
        };
        info!(title = %pick.title, url = %pick.url, "Selected candidate");

        info!("Phase 2: generating review");
        let references = self
            .resolver
            .reference_reviews(&pick.url, MAX_REFERENCE_REVIEWS)
            .await;
        let review = self
            .writer
            .review(&pick.title, &details.plot, domain, &references)
            .await?;
        info!(chars = review.len(), references = references.len(), "Review ready");

        let publish = if approve {
            println!("\n=== GENERATED REVIEW ===\n");
            println!("{review}");
            println!("\n========================\n");
            if !ask_approval()? {
                info!("Review not approved; nothing published");
                return Ok(());
            }
            true
        } else {
            if self.should_skip_draft(domain, &pick).await {
                return Ok(());
            }
            false
        };

        info!("Phase 3: submitting to Hashnode (publish = {publish})");
        let outcome = self
            .publisher
            .submit_review(&pick.title, &review, publish)
            .await?;
        info!(?outcome, "Submission complete");

        if !matches!(outcome, PublishOutcome::Skipped { .. }) {
            self.ledger
                .record(
                    domain.kind_key(),
                    pick.clone(),
                    outcome.draft_id().map(str::to_string),
                )
                .await?;

            let prompt = build_video_prompt(&pick.title, &review, domain);
            append_video_prompt(&self.config.prompt_log_path, &prompt).await?;
        }

        Ok(())
    }

    /// Fall-through candidate selection: ranked candidates first, then
    /// the authoritative chart pick.
    async fn select_candidate(&self, domain: Domain) -> Option<(TrendingPick, TitleDetails)> {
        let profile =
            match DomainProfile::load_or_default(domain, self.config.profile_path.as_deref()) {
                Ok(profile) => profile,
                Err(e) => {
                    warn!(error = %e, "Profile override unreadable; using built-in profile");
                    DomainProfile::for_domain(domain)
                }
            };
        let analyst = TrendAnalyst::from_profile(profile, &self.client);
        let ranked = analyst.analyze_trending(TOP_CANDIDATES).await;
        info!(candidates = ranked.len(), "Trend analysis returned candidates");

        for candidate in &ranked {
            let Some(pick) = self.resolver.resolve_title(&candidate.title, domain).await else {
                continue;
            };
            match self.resolver.fetch_details(&pick.url).await {
                Ok(details) => return Some((pick, details)),
                Err(e) => {
                    warn!(title = %pick.title, error = %e, "Detail fetch failed; trying next candidate");
                }
            }
        }

        info!("No ranked candidate resolved; falling back to chart pick");
        let pick = self.resolver.chart_top_pick(domain).await?;
        match self.resolver.fetch_details(&pick.url).await {
            Ok(details) => Some((pick, details)),
            Err(e) => {
                warn!(title = %pick.title, error = %e, "Chart pick details failed");
                None
            }
        }
    }

    /// Duplicate suppression for draft-only runs.
    ///
    /// Skips when the same item was drafted inside the window and the
    /// draft still exists remotely; a deleted draft or a record without a
    /// draft id allows recreation.
    async fn should_skip_draft(&self, domain: Domain, pick: &TrendingPick) -> bool {
        let Some(last) = self.ledger.last(domain.kind_key()).await else {
            return false;
        };
        if last.item.url != pick.url {
            return false;
        }
        if !last.is_recent(Utc::now()) {
            return false;
        }

        match last.draft_id.as_deref() {
            Some(draft_id) => {
                if self.publisher.draft_exists(draft_id).await {
                    let age_days = (Utc::now() - last.timestamp).num_days();
                    info!(
                        title = %pick.title,
                        age_days,
                        "Skipping draft: same item was drafted recently"
                    );
                    true
                } else {
                    warn!("Previous draft missing remotely; recreating");
                    false
                }
            }
            None => {
                warn!("No draft id recorded for last item; recreating");
                false
            }
        }
    }
}

fn ask_approval() -> io::Result<bool> {
    print!("Approve this review for publishing? (y/n): ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LastDraftRecord;
    use chrono::Duration as ChronoDuration;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn test_config(dir: &std::path::Path) -> AppConfig {
        AppConfig {
            groq_api_key: None,
            groq_models: vec!["test-model".to_string()],
            recommended_model: "test-model".to_string(),
            hashnode_publication_id: None,
            hashnode_access_token: None,
            last_draft_path: dir.join("last_draft.json"),
            prompt_log_path: dir.join("prompts.md"),
            profile_path: None,
        }
    }

    fn pick() -> TrendingPick {
        TrendingPick {
            title: "Oppenheimer".to_string(),
            url: "https://www.imdb.com/title/tt15398776/".to_string(),
        }
    }

    async fn write_record(path: &PathBuf, kind: &str, record: LastDraftRecord) {
        let mut map = HashMap::new();
        map.insert(kind.to_string(), record);
        tokio::fs::write(path, serde_json::to_string_pretty(&map).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_no_record_means_no_skip() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(test_config(dir.path())).unwrap();
        assert!(!pipeline.should_skip_draft(Domain::Movie, &pick()).await);
    }

    #[tokio::test]
    async fn test_different_url_means_no_skip() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        write_record(
            &config.last_draft_path,
            "movie",
            LastDraftRecord {
                item: TrendingPick {
                    title: "Barbie".to_string(),
                    url: "https://www.imdb.com/title/tt1517268/".to_string(),
                },
                draft_id: Some("d1".to_string()),
                timestamp: Utc::now(),
            },
        )
        .await;

        let pipeline = Pipeline::new(config).unwrap();
        assert!(!pipeline.should_skip_draft(Domain::Movie, &pick()).await);
    }

    #[tokio::test]
    async fn test_stale_record_means_no_skip() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        write_record(
            &config.last_draft_path,
            "movie",
            LastDraftRecord {
                item: pick(),
                draft_id: Some("d1".to_string()),
                timestamp: Utc::now() - ChronoDuration::days(8),
            },
        )
        .await;

        let pipeline = Pipeline::new(config).unwrap();
        assert!(!pipeline.should_skip_draft(Domain::Movie, &pick()).await);
    }

    #[tokio::test]
    async fn test_recent_record_without_draft_id_recreates() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        write_record(
            &config.last_draft_path,
            "movie",
            LastDraftRecord {
                item: pick(),
                draft_id: None,
                timestamp: Utc::now(),
            },
        )
        .await;

        let pipeline = Pipeline::new(config).unwrap();
        assert!(!pipeline.should_skip_draft(Domain::Movie, &pick()).await);
    }

    #[tokio::test]
    async fn test_kinds_are_isolated() {
        // A recent TV record never suppresses a movie draft.
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        write_record(
            &config.last_draft_path,
            "tv",
            LastDraftRecord {
                item: pick(),
                draft_id: Some("d1".to_string()),
                timestamp: Utc::now(),
            },
        )
        .await;

        let pipeline = Pipeline::new(config).unwrap();
        assert!(!pipeline.should_skip_draft(Domain::Movie, &pick()).await);
    }
}
