//! Hashnode GraphQL client for creating and publishing drafts.
//!
//! The createDraft schema has shipped under several content field names;
//! the client tries each candidate in order until a draft id comes back.
//! Missing credentials are an outcome, not an error — the pipeline keeps
//! running and simply reports the draft as skipped.

use std::time::Duration;

use chrono::Local;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::utils::truncate_for_log;

const GRAPHQL_URL: &str = "https://gql.hashnode.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Pause between createDraft and publishDraft to respect rate limits.
const PUBLISH_PAUSE: Duration = Duration::from_secs(2);

/// Content field names the createDraft input has accepted, tried in order.
const CONTENT_FIELDS: [&str; 4] = ["contentMarkdown", "body", "content", "bodyMarkdown"];

const CREATE_DRAFT_MUTATION: &str = r#"
mutation createDraft($input: CreateDraftInput!) {
  createDraft(input: $input) {
    draft {
      id
    }
  }
}
"#;

const PUBLISH_DRAFT_MUTATION: &str = r#"
mutation publishDraft($input: PublishDraftInput!) {
  publishDraft(input: $input) {
    story {
      id
      title
      slug
      url
    }
  }
}
"#;

const DRAFT_QUERY: &str = r#"
query getDraft($id: ID!) {
  draft(id: $id) {
    id
  }
}
"#;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("draft request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("no draft id returned; last response: {last_response}")]
    NoDraftId { last_response: String },
    #[error("publish returned status {0}")]
    PublishStatus(u16),
    #[error("publish returned no story: {response}")]
    NoStory { response: String },
}

/// What happened to a submitted review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Skipped { reason: String },
    DraftCreated { draft_id: String },
    Published {
        draft_id: String,
        post_id: String,
        live_url: String,
    },
}

impl PublishOutcome {
    pub fn draft_id(&self) -> Option<&str> {
        match self {
            PublishOutcome::Skipped { .. } => None,
            PublishOutcome::DraftCreated { draft_id }
            | PublishOutcome::Published { draft_id, .. } => Some(draft_id),
        }
    }
}

pub struct HashnodeClient {
    http: reqwest::Client,
    publication_id: Option<String>,
    access_token: Option<String>,
}

impl HashnodeClient {
    pub fn new(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            publication_id: config.hashnode_publication_id.clone(),
            access_token: config.hashnode_access_token.clone(),
        })
    }

    /// Create a draft for the review and optionally publish it.
    #[instrument(level = "info", skip_all, fields(title = %title, publish = publish))]
    pub async fn submit_review(
        &self,
        title: &str,
        review: &str,
        publish: bool,
    ) -> Result<PublishOutcome, PublishError> {
        let (Some(publication_id), Some(token)) =
            (self.publication_id.as_deref(), self.access_token.as_deref())
        else {
            info!("Hashnode credentials missing; skipping draft");
            return Ok(PublishOutcome::Skipped {
                reason: "Missing credentials".to_string(),
            });
        };

        let body_html = format_review_html(title, review);

        let mut draft_id = None;
        let mut last_response = String::new();
        for field in CONTENT_FIELDS {
            // The content field name varies by schema generation, so the
            // input object is assembled dynamically.
            let mut input = serde_json::Map::new();
            input.insert("publicationId".to_string(), json!(publication_id));
            input.insert("title".to_string(), json!(title));
            input.insert(field.to_string(), json!(body_html.as_str()));
            let payload = json!({
                "query": CREATE_DRAFT_MUTATION,
                "variables": { "input": input }
            });

            let response = self
                .http
                .post(GRAPHQL_URL)
                .bearer_auth(token)
                .json(&payload)
                .send()
                .await?;
            if response.status().as_u16() != 200 {
                last_response = format!("status {}", response.status());
                continue;
            }

            let value: Value = match response.json().await {
                Ok(value) => value,
                Err(e) => {
                    last_response = e.to_string();
                    continue;
                }
            };
            last_response = value.to_string();
            if let Some(id) = draft_id_from(&value) {
                info!(draft_id = %id, field, "Draft created");
                draft_id = Some(id);
                break;
            }
        }

        let Some(draft_id) = draft_id else {
            return Err(PublishError::NoDraftId {
                last_response: truncate_for_log(&last_response, 300),
            });
        };

        if !publish {
            return Ok(PublishOutcome::DraftCreated { draft_id });
        }

        sleep(PUBLISH_PAUSE).await;

        let payload = json!({
            "query": PUBLISH_DRAFT_MUTATION,
            "variables": { "input": { "id": draft_id } }
        });
        let response = self
            .http
            .post(GRAPHQL_URL)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(PublishError::PublishStatus(status));
        }

        let value: Value = response.json().await?;
        let story = &value["data"]["publishDraft"]["story"];
        let Some(post_id) = story["id"].as_str() else {
            return Err(PublishError::NoStory {
                response: truncate_for_log(&value.to_string(), 300),
            });
        };

        let live_url = story["url"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| {
                format!(
                    "https://flicktalkies.hashnode.dev/{}",
                    story["slug"].as_str().unwrap_or("post")
                )
            });
        info!(post_id, %live_url, "Draft published");

        Ok(PublishOutcome::Published {
            draft_id,
            post_id: post_id.to_string(),
            live_url,
        })
    }

    /// Check whether a previously created draft still exists remotely.
    ///
    /// Best effort: any failure reads as "missing".
    #[instrument(level = "info", skip(self))]
    pub async fn draft_exists(&self, draft_id: &str) -> bool {
        let Some(token) = self.access_token.as_deref() else {
            return false;
        };
        if draft_id.is_empty() {
            return false;
        }

        let payload = json!({
            "query": DRAFT_QUERY,
            "variables": { "id": draft_id }
        });
        let response = match self
            .http
            .post(GRAPHQL_URL)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Draft existence probe failed");
                return false;
            }
        };
        if response.status().as_u16() != 200 {
            return false;
        }

        match response.json::<Value>().await {
            Ok(value) => value["data"]["draft"]["id"].as_str().is_some(),
            Err(_) => false,
        }
    }
}

fn draft_id_from(value: &Value) -> Option<String> {
    value["data"]["createDraft"]["draft"]["id"]
        .as_str()
        .map(str::to_string)
}

/// Wrap the review in the HTML shell the blog expects.
pub(crate) fn format_review_html(title: &str, content: &str) -> String {
    let content = content.replace("``````", "");
    let date = Local::now().format("%B %d, %Y");
    format!(
        r#"<h1 style="color:#2c3e50;">🎬 {title}</h1>
<div style="font-size:18px;line-height:1.7;color:#333;max-width:800px;">
    {content}
</div>
<hr style="margin:40px 0;border:none;height:2px;background:#eee;">
<p style="color:#777;font-size:14px;text-align:center;">
    🤖 <strong>Reel Buzz Review Agent</strong><br>
    {date}
</p>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_review_html_embeds_title_and_content() {
        let html = format_review_html("Oppenheimer", "A stellar film.");
        assert!(html.contains("🎬 Oppenheimer"));
        assert!(html.contains("A stellar film."));
        assert!(html.contains("Reel Buzz Review Agent"));
    }

    #[test]
    fn test_format_review_html_strips_empty_code_fences() {
        let html = format_review_html("Dune", "Before``````After");
        assert!(html.contains("BeforeAfter"));
    }

    #[test]
    fn test_draft_id_from_response() {
        let value: Value = serde_json::from_str(
            r#"{ "data": { "createDraft": { "draft": { "id": "abc123" } } } }"#,
        )
        .unwrap();
        assert_eq!(draft_id_from(&value), Some("abc123".to_string()));

        let missing: Value = serde_json::from_str(r#"{ "data": {} }"#).unwrap();
        assert_eq!(draft_id_from(&missing), None);
    }

    #[test]
    fn test_outcome_draft_id_accessor() {
        assert_eq!(
            PublishOutcome::DraftCreated {
                draft_id: "d1".to_string()
            }
            .draft_id(),
            Some("d1")
        );
        assert_eq!(
            PublishOutcome::Skipped {
                reason: "Missing credentials".to_string()
            }
            .draft_id(),
            None
        );
    }
}
