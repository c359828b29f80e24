//! AI review generation against an OpenAI-compatible chat-completions API.
//!
//! The writer walks a configured model chain: a model reported as
//! decommissioned appends the recommended replacement to the chain, a
//! missing model is skipped, and an authentication failure aborts the
//! whole attempt. Transient failures (network, rate limits, server
//! errors) are retried per model with exponential backoff and jitter.
//! Without an API key the writer produces a canned offline review so the
//! rest of the pipeline stays exercisable.

use std::time::{Duration, Instant};

use rand::{Rng, rng};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::config::AppConfig;
use crate::models::Domain;
use crate::utils::{prefix_chars, truncate_for_log};

const CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const MAX_RETRIES: usize = 5;
const BASE_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Reference snippets longer than this are cut before entering the prompt.
const SNIPPET_CHARS: usize = 800;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("chat API authentication failed: check GROQ_API_KEY")]
    Auth,
    #[error("chat API rejected the request: {0}")]
    Rejected(String),
    #[error("no completion produced; models tried: {tried}")]
    Exhausted { tried: String },
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Per-attempt outcome, steering the model-chain walk.
#[derive(Debug)]
enum AskError {
    /// The model has been retired; append the recommended one and move on.
    Decommissioned,
    /// Unknown model name; try the next one in the chain.
    ModelNotFound,
    Auth,
    /// Malformed request or response; not worth retrying anywhere.
    Fatal(String),
    /// Worth retrying against the same model after a backoff.
    Retryable(String),
}

pub struct ReviewWriter {
    http: reqwest::Client,
    api_key: Option<String>,
    models: Vec<String>,
    recommended: String,
}

impl ReviewWriter {
    pub fn new(config: &AppConfig) -> Result<Self, ReviewError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: config.groq_api_key.clone(),
            models: config.groq_models.clone(),
            recommended: config.recommended_model.clone(),
        })
    }

    /// Generate a review for a resolved title.
    #[instrument(level = "info", skip_all, fields(title = %title, domain = domain.kind_key()))]
    pub async fn review(
        &self,
        title: &str,
        plot: &str,
        domain: Domain,
        references: &[String],
    ) -> Result<String, ReviewError> {
        let Some(api_key) = self.api_key.as_deref() else {
            info!("No API key configured; producing offline review");
            return Ok(offline_review(title, plot, domain));
        };

        let prompt = build_prompt(title, plot, domain, references);
        let system = match domain {
            Domain::Movie => "You are a witty, insightful film critic.",
            Domain::Tv => "You are a witty, insightful TV critic.",
        };

        let mut models = self.models.clone();
        if models.is_empty() {
            models.push(self.recommended.clone());
        }

        let mut tried = Vec::new();
        let mut i = 0;
        while i < models.len() {
            let model = models[i].clone();
            tried.push(model.clone());
            i += 1;

            match self.ask_with_backoff(api_key, &model, system, &prompt).await {
                Ok(content) => {
                    info!(%model, chars = content.len(), "Review generated");
                    return Ok(content);
                }
                Err(AskError::Decommissioned) => {
                    warn!(%model, "Model decommissioned");
                    if !models.contains(&self.recommended) {
                        info!(recommended = %self.recommended, "Appending recommended model to chain");
                        models.push(self.recommended.clone());
                    }
                }
                Err(AskError::ModelNotFound) => {
                    warn!(%model, "Model not found; trying next");
                }
                Err(AskError::Auth) => {
                    error!("Chat API authentication failed");
                    return Err(ReviewError::Auth);
                }
                Err(AskError::Fatal(reason)) => {
                    error!(%model, %reason, "Chat request rejected");
                    return Err(ReviewError::Rejected(reason));
                }
                Err(AskError::Retryable(reason)) => {
                    warn!(%model, %reason, "Model kept failing after retries; trying next");
                }
            }
        }

        Err(ReviewError::Exhausted {
            tried: tried.join(","),
        })
    }

    /// Retry transient failures with exponential backoff and jitter.
    async fn ask_with_backoff(
        &self,
        api_key: &str,
        model: &str,
        system: &str,
        prompt: &str,
    ) -> Result<String, AskError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.ask_once(api_key, model, system, prompt).await {
                Ok(content) => return Ok(content),
                Err(AskError::Retryable(reason)) => {
                    attempt += 1;
                    if attempt > MAX_RETRIES {
                        error!(
                            attempt,
                            max = MAX_RETRIES,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u128,
                            %reason,
                            "Chat request exhausted retries"
                        );
                        return Err(AskError::Retryable(reason));
                    }

                    let mut delay = BASE_DELAY.saturating_mul(1 << (attempt - 1));
                    if delay > MAX_DELAY {
                        delay = MAX_DELAY;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);

                    warn!(attempt, max = MAX_RETRIES, ?delay, %reason, "Chat attempt failed; backing off");
                    sleep(delay).await;
                }
                Err(other) => return Err(other),
            }
        }
    }

    async fn ask_once(
        &self,
        api_key: &str,
        model: &str,
        system: &str,
        prompt: &str,
    ) -> Result<String, AskError> {
        let body = json!({
            "model": model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
            "temperature": 0.8,
            "max_tokens": 800,
        });

        let response = self
            .http
            .post(CHAT_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AskError::Retryable(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AskError::Retryable(e.to_string()))?;

        match status.as_u16() {
            200 => {}
            401 | 403 => return Err(AskError::Auth),
            404 => return Err(AskError::ModelNotFound),
            400 => {
                let lower = text.to_lowercase();
                if lower.contains("decommissioned") || lower.contains("model_decommissioned") {
                    return Err(AskError::Decommissioned);
                }
                return Err(AskError::Fatal(format!(
                    "bad request: {}",
                    truncate_for_log(&text, 300)
                )));
            }
            code => {
                return Err(AskError::Retryable(format!("status {code}")));
            }
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            AskError::Fatal(format!(
                "unparseable response ({e}): {}",
                truncate_for_log(&text, 300)
            ))
        })?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AskError::Fatal("no completion returned".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Assemble the user prompt for a review.
pub(crate) fn build_prompt(
    title: &str,
    plot: &str,
    domain: Domain,
    references: &[String],
) -> String {
    let mut prompt = match domain {
        Domain::Movie => format!(
            "Write a 400-600 word original movie review for '{title}'.\n\n\
             PLOT SUMMARY: {plot}\n\n\
             Your review should:\n\
             1. Start with an engaging hook\n\
             2. Analyze themes, characters, direction\n\
             3. Give honest critique (strengths + weaknesses)\n\
             4. End with rating (★ out of ★★★★★) and recommendation\n\n\
             Write in engaging, conversational style like a professional film critic."
        ),
        Domain::Tv => format!(
            "Write a 400-600 word original TV show review for '{title}'.\n\n\
             SERIES SUMMARY: {plot}\n\n\
             Your review should:\n\
             1. Start with an engaging hook\n\
             2. Discuss season/episode structure, performances, themes\n\
             3. Give honest critique (strengths + weaknesses)\n\
             4. End with rating (★ out of ★★★★★) and recommendation\n\n\
             Write in engaging, conversational style like a professional TV critic."
        ),
    };

    if !references.is_empty() {
        prompt.push_str("\n\nREFERENCE REVIEWS:\n");
        for (i, reference) in references.iter().enumerate() {
            let snippet = prefix_chars(reference.trim(), SNIPPET_CHARS).replace('\n', " ");
            prompt.push_str(&format!("{}) {snippet}\n", i + 1));
        }
    }

    prompt
}

/// Stand-in review used when no API key is configured.
pub(crate) fn offline_review(title: &str, plot: &str, domain: Domain) -> String {
    let preview = prefix_chars(plot, 100);
    match domain {
        Domain::Movie => format!(
            "## {title} - AI Movie Review\n\n\
             This film tells {preview}... \n\n\
             **Rating: ★★★★☆** \n\
             A timeless classic that resonates with audiences worldwide."
        ),
        Domain::Tv => format!(
            "## {title} - AI TV Review\n\n\
             A TV show about {preview}...\n\n\
             **Rating: ★★★★☆**"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_movie_without_references() {
        let prompt = build_prompt("Oppenheimer", "A scientist builds the bomb.", Domain::Movie, &[]);
        assert!(prompt.contains("movie review for 'Oppenheimer'"));
        assert!(prompt.contains("PLOT SUMMARY: A scientist builds the bomb."));
        assert!(!prompt.contains("REFERENCE REVIEWS"));
    }

    #[test]
    fn test_build_prompt_tv_wording() {
        let prompt = build_prompt("The Bear", "A chef returns home.", Domain::Tv, &[]);
        assert!(prompt.contains("TV show review for 'The Bear'"));
        assert!(prompt.contains("SERIES SUMMARY:"));
        assert!(prompt.contains("season/episode structure"));
    }

    #[test]
    fn test_build_prompt_numbers_references_and_flattens_newlines() {
        let references = vec![
            "Great movie.\nLoved it.".to_string(),
            "Overrated.".to_string(),
        ];
        let prompt = build_prompt("Dune", "Spice.", Domain::Movie, &references);
        assert!(prompt.contains("REFERENCE REVIEWS:"));
        assert!(prompt.contains("1) Great movie. Loved it."));
        assert!(prompt.contains("2) Overrated."));
    }

    #[test]
    fn test_build_prompt_truncates_long_references() {
        let references = vec!["x".repeat(2000)];
        let prompt = build_prompt("Dune", "Spice.", Domain::Movie, &references);
        let line = prompt
            .lines()
            .find(|l| l.starts_with("1)"))
            .unwrap();
        assert!(line.len() <= SNIPPET_CHARS + 3);
    }

    #[test]
    fn test_offline_review_previews_plot() {
        let review = offline_review("Oppenheimer", &"p".repeat(300), Domain::Movie);
        assert!(review.starts_with("## Oppenheimer - AI Movie Review"));
        assert!(review.contains(&"p".repeat(100)));
        assert!(!review.contains(&"p".repeat(101)));
    }

    #[test]
    fn test_chat_response_parsing() {
        let json = r#"{
            "choices": [
                { "message": { "role": "assistant", "content": "  A stellar film.  " } }
            ]
        }"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content.trim(), "A stellar film.");
    }
}
