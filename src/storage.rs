//! Local bookkeeping: the last-draft record and the video prompt log.
//!
//! The last-draft file is one small JSON object keyed by content kind
//! (`movie` / `tv`), holding the item, the remote draft id, and when the
//! draft was created. It exists purely to suppress duplicate drafts; any
//! read failure degrades to "no record" and the pipeline carries on.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::models::{Domain, TrendingPick};

/// Drafts younger than this for the same item are not recreated.
pub const DUPLICATE_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LastDraftRecord {
    pub item: TrendingPick,
    pub draft_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl LastDraftRecord {
    /// Whether the record is still inside the duplicate-suppression window.
    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        now - self.timestamp < ChronoDuration::days(DUPLICATE_WINDOW_DAYS)
    }
}

/// The last-draft JSON file.
#[derive(Debug, Clone)]
pub struct DraftLedger {
    path: PathBuf,
}

impl DraftLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The stored record for a kind, or `None` when absent or unreadable.
    pub async fn last(&self, kind: &str) -> Option<LastDraftRecord> {
        let raw = fs::read_to_string(&self.path).await.ok()?;
        match serde_json::from_str::<HashMap<String, LastDraftRecord>>(&raw) {
            Ok(mut records) => records.remove(kind),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Last-draft file unreadable; ignoring");
                None
            }
        }
    }

    /// Store the record for a kind, preserving the other kinds' entries.
    pub async fn record(
        &self,
        kind: &str,
        item: TrendingPick,
        draft_id: Option<String>,
    ) -> Result<(), StorageError> {
        let mut records: HashMap<String, LastDraftRecord> =
            match fs::read_to_string(&self.path).await {
                Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
                Err(_) => HashMap::new(),
            };

        records.insert(
            kind.to_string(),
            LastDraftRecord {
                item,
                draft_id,
                timestamp: Utc::now(),
            },
        );

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&records)?).await?;
        debug!(path = %self.path.display(), kind, "Recorded last draft");
        Ok(())
    }
}

/// Build the video prompt that accompanies a drafted review.
pub fn build_video_prompt(title: &str, review: &str, domain: Domain) -> String {
    let kind = match domain {
        Domain::Movie => "Movie Review",
        Domain::Tv => "TV Review",
    };
    format!(
        "Create a fast paced video for YouTube Shorts about {title} {kind}. \
         Review text for reference is as below:\n\n\
         {review}\n\n\
         Settings:\n\
         Make the background music Trendy and Catchy\n\
         Add any subtitle"
    )
}

/// Append a prompt to the Markdown prompt log, creating it on first use.
pub async fn append_video_prompt(path: &Path, prompt: &str) -> Result<(), StorageError> {
    let mut log = match fs::read_to_string(path).await {
        Ok(existing) => existing,
        Err(_) => "# Video prompts\n".to_string(),
    };

    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    log.push_str(&format!("\n## {timestamp}\n\n{prompt}\n"));

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(path, log).await?;
    info!(path = %path.display(), "Appended video prompt");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ledger_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DraftLedger::new(dir.path().join("last_draft.json"));

        let pick = TrendingPick {
            title: "Oppenheimer".to_string(),
            url: "https://www.imdb.com/title/tt15398776/".to_string(),
        };
        ledger
            .record("movie", pick.clone(), Some("draft-1".to_string()))
            .await
            .unwrap();

        let stored = ledger.last("movie").await.unwrap();
        assert_eq!(stored.item, pick);
        assert_eq!(stored.draft_id.as_deref(), Some("draft-1"));
        assert!(stored.is_recent(Utc::now()));
        assert!(ledger.last("tv").await.is_none());
    }

    #[tokio::test]
    async fn test_ledger_preserves_other_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DraftLedger::new(dir.path().join("last_draft.json"));

        let movie = TrendingPick {
            title: "Dune".to_string(),
            url: "https://www.imdb.com/title/tt1160419/".to_string(),
        };
        let tv = TrendingPick {
            title: "Severance".to_string(),
            url: "https://www.imdb.com/title/tt11280740/".to_string(),
        };
        ledger.record("movie", movie.clone(), None).await.unwrap();
        ledger.record("tv", tv, Some("d2".to_string())).await.unwrap();

        assert_eq!(ledger.last("movie").await.unwrap().item, movie);
        assert_eq!(
            ledger.last("tv").await.unwrap().draft_id.as_deref(),
            Some("d2")
        );
    }

    #[tokio::test]
    async fn test_ledger_missing_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_draft.json");
        let ledger = DraftLedger::new(&path);
        assert!(ledger.last("movie").await.is_none());

        fs::write(&path, "{not json").await.unwrap();
        assert!(ledger.last("movie").await.is_none());
    }

    #[test]
    fn test_is_recent_window() {
        let record = LastDraftRecord {
            item: TrendingPick {
                title: "Dune".to_string(),
                url: "https://example.com".to_string(),
            },
            draft_id: None,
            timestamp: Utc::now() - ChronoDuration::days(8),
        };
        assert!(!record.is_recent(Utc::now()));

        let fresh = LastDraftRecord {
            timestamp: Utc::now() - ChronoDuration::days(6),
            ..record
        };
        assert!(fresh.is_recent(Utc::now()));
    }

    #[test]
    fn test_build_video_prompt_wording() {
        let prompt = build_video_prompt("Oppenheimer", "A stellar film.", Domain::Movie);
        assert!(prompt.contains("about Oppenheimer Movie Review"));
        assert!(prompt.contains("A stellar film."));
        assert!(prompt.contains("Trendy and Catchy"));

        let tv = build_video_prompt("The Bear", "Yes chef.", Domain::Tv);
        assert!(tv.contains("The Bear TV Review"));
    }

    #[tokio::test]
    async fn test_append_video_prompt_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts").join("prompts.md");

        append_video_prompt(&path, "first prompt").await.unwrap();
        append_video_prompt(&path, "second prompt").await.unwrap();

        let log = fs::read_to_string(&path).await.unwrap();
        assert!(log.starts_with("# Video prompts"));
        assert!(log.contains("first prompt"));
        assert!(log.contains("second prompt"));
    }
}
