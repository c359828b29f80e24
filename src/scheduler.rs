//! Scheduled pipeline runs: cron expressions or a fixed interval.
//!
//! Both loops run forever; a failing pipeline run is logged and the loop
//! keeps going. Runs are always draft-only — there is nobody at the
//! keyboard to approve.

use std::error::Error;
use std::time::Duration;

use chrono::Utc;
use croner::Cron;
use tokio::time::sleep;
use tracing::{error, info};

use crate::models::Domain;
use crate::pipeline::Pipeline;

/// Run the pipeline whenever the cron expression fires.
pub async fn run_on_cron(
    pipeline: &Pipeline,
    expression: &str,
    kinds: &[Domain],
) -> Result<(), Box<dyn Error>> {
    let cron = Cron::new(expression)
        .parse()
        .map_err(|e| format!("invalid cron expression '{expression}': {e}"))?;

    info!(expression, "Cron schedule started");
    loop {
        let now = Utc::now();
        let next = match cron.find_next_occurrence(&now, false) {
            Ok(next) => next,
            Err(e) => {
                error!(error = %e, "Failed to compute next cron occurrence");
                sleep(Duration::from_secs(60)).await;
                continue;
            }
        };

        let wait = (next - now).to_std().unwrap_or(Duration::from_secs(1));
        info!(next = %next.format("%Y-%m-%d %H:%M:%S UTC"), "Sleeping until next scheduled run");
        sleep(wait).await;

        // Guard against premature wake from sleep imprecision
        let now_after = Utc::now();
        if now_after < next {
            let remaining = (next - now_after).to_std().unwrap_or_default();
            sleep(remaining).await;
        }

        info!("Scheduled run firing");
        pipeline.run(kinds, false).await;
        info!("Scheduled run finished");
    }
}

/// Run the pipeline immediately and then every `minutes` minutes.
pub async fn run_every(pipeline: &Pipeline, minutes: u64, kinds: &[Domain]) {
    let minutes = minutes.max(1);
    let mut ticker = tokio::time::interval(Duration::from_secs(minutes * 60));
    info!(minutes, "Interval schedule started");

    loop {
        ticker.tick().await;
        info!("Scheduled run firing");
        pipeline.run(kinds, false).await;
        info!("Scheduled run finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cron_expression_parses() {
        // Saturday 10:00, the production schedule.
        assert!(Cron::new("0 10 * * 6").parse().is_ok());
    }

    #[test]
    fn test_invalid_cron_expression_rejected() {
        assert!(Cron::new("not a cron").parse().is_err());
    }

    #[test]
    fn test_next_occurrence_is_in_the_future() {
        let cron = Cron::new("*/5 * * * *").parse().unwrap();
        let now = Utc::now();
        let next = cron.find_next_occurrence(&now, false).unwrap();
        assert!(next > now);
    }
}
