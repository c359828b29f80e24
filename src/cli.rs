//! Command-line interface definitions.
//!
//! All credentials can be provided via command-line flags or environment
//! variables; a `.env` file is loaded before parsing. The subcommands:
//!
//! ```sh
//! # Print the ranked trending list as JSON
//! reel_buzz trends --domain movie --top-n 5
//!
//! # Run the full pipeline once, drafting without publishing
//! reel_buzz run --kind both
//!
//! # Interactive: show the review and ask before publishing
//! reel_buzz run --kind movie --approve
//!
//! # Keep running on a schedule (drafts only)
//! reel_buzz schedule --cron "0 10 * * 6"
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::models::Domain;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Groq API key; without it reviews fall back to canned text
    #[arg(long, env = "GROQ_API_KEY")]
    pub groq_api_key: Option<String>,

    /// Comma-separated chat model chain, tried in order
    #[arg(long, env = "GROQ_MODEL", default_value = "llama-3.3-70b-versatile")]
    pub groq_model: String,

    /// Fallback model appended when one is reported decommissioned
    #[arg(
        long,
        env = "GROQ_RECOMMENDED_MODEL",
        default_value = "llama-3.3-70b-versatile"
    )]
    pub groq_recommended_model: String,

    /// Hashnode publication to draft into
    #[arg(long, env = "HASHNODE_PUBLICATION_ID")]
    pub hashnode_publication_id: Option<String>,

    /// Hashnode personal access token
    #[arg(long, env = "HASHNODE_ACCESS_TOKEN")]
    pub hashnode_access_token: Option<String>,

    /// Path of the last-draft bookkeeping file
    #[arg(long, default_value = "last_draft.json")]
    pub last_draft_file: PathBuf,

    /// Path of the video prompt log
    #[arg(long, default_value = "outputs/prompts/prompts.md")]
    pub prompt_log_file: PathBuf,

    /// Optional YAML file overriding the built-in domain profiles
    #[arg(long)]
    pub profile_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze trending titles and print the ranked list as JSON
    Trends {
        #[arg(long, value_enum, default_value_t = DomainArg::Movie)]
        domain: DomainArg,

        /// Maximum number of ranked titles to return
        #[arg(long, default_value_t = 5)]
        top_n: usize,
    },
    /// Run the full pipeline once
    Run {
        #[arg(long, value_enum, default_value_t = KindArg::Both)]
        kind: KindArg,

        /// Show the review and ask before publishing (otherwise draft only)
        #[arg(long)]
        approve: bool,
    },
    /// Run the pipeline on a schedule (drafts only)
    Schedule {
        /// Cron expression, e.g. "0 10 * * 6"
        #[arg(long, conflicts_with = "every_minutes")]
        cron: Option<String>,

        /// Fixed interval in minutes
        #[arg(long)]
        every_minutes: Option<u64>,

        #[arg(long, value_enum, default_value_t = KindArg::Both)]
        kind: KindArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomainArg {
    Movie,
    Tv,
}

impl DomainArg {
    pub fn domain(self) -> Domain {
        match self {
            DomainArg::Movie => Domain::Movie,
            DomainArg::Tv => Domain::Tv,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    Movie,
    Tv,
    Both,
}

impl KindArg {
    pub fn domains(self) -> Vec<Domain> {
        match self {
            KindArg::Movie => vec![Domain::Movie],
            KindArg::Tv => vec![Domain::Tv],
            KindArg::Both => vec![Domain::Movie, Domain::Tv],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trends_defaults() {
        let cli = Cli::parse_from(["reel_buzz", "trends"]);
        match cli.command {
            Command::Trends { domain, top_n } => {
                assert_eq!(domain, DomainArg::Movie);
                assert_eq!(top_n, 5);
            }
            _ => panic!("expected trends subcommand"),
        }
    }

    #[test]
    fn test_trends_tv_domain() {
        let cli = Cli::parse_from(["reel_buzz", "trends", "--domain", "tv", "--top-n", "3"]);
        match cli.command {
            Command::Trends { domain, top_n } => {
                assert_eq!(domain.domain(), Domain::Tv);
                assert_eq!(top_n, 3);
            }
            _ => panic!("expected trends subcommand"),
        }
    }

    #[test]
    fn test_run_kind_both_expands() {
        let cli = Cli::parse_from(["reel_buzz", "run"]);
        match cli.command {
            Command::Run { kind, approve } => {
                assert_eq!(kind.domains(), vec![Domain::Movie, Domain::Tv]);
                assert!(!approve);
            }
            _ => panic!("expected run subcommand"),
        }
    }

    #[test]
    fn test_schedule_cron_flag() {
        let cli = Cli::parse_from(["reel_buzz", "schedule", "--cron", "0 10 * * 6"]);
        match cli.command {
            Command::Schedule { cron, every_minutes, .. } => {
                assert_eq!(cron.as_deref(), Some("0 10 * * 6"));
                assert!(every_minutes.is_none());
            }
            _ => panic!("expected schedule subcommand"),
        }
    }

    #[test]
    fn test_schedule_cron_and_interval_conflict() {
        let result = Cli::try_parse_from([
            "reel_buzz",
            "schedule",
            "--cron",
            "0 10 * * 6",
            "--every-minutes",
            "30",
        ]);
        assert!(result.is_err());
    }
}
