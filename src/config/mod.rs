pub mod json_store;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command, SkillOffer};

#[cfg(feature = "cli")]
mod cli {
    use super::toml_config::TomlConfig;
    use crate::domain::model::{normalize_tag, Priority, Proficiency};
    use crate::utils::error::Result;
    use crate::utils::validation::Validate;
    use clap::{Parser, Subcommand};

    #[derive(Debug, Clone, Parser)]
    #[command(name = "skillswap")]
    #[command(about = "Peer-to-peer skill exchange directory")]
    pub struct CliConfig {
        /// JSON document holding users and requests
        #[arg(long, global = true)]
        pub data_file: Option<String>,

        /// Optional TOML settings file
        #[arg(short, long, global = true)]
        pub config: Option<String>,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Emit logs as JSON lines")]
        pub json_logs: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Create an empty data file if none exists
        Init,
        /// Platform totals
        Stats,
        /// Rank other users by compatibility
        Matches {
            /// User id or exact name
            user: String,
            #[arg(long)]
            search: Option<String>,
            #[arg(long)]
            min_score: Option<f64>,
            #[arg(long)]
            limit: Option<usize>,
        },
        /// Send a swap request
        Request {
            sender: String,
            receiver: String,
            #[arg(long)]
            offer: String,
            #[arg(long)]
            want: String,
            #[arg(long, default_value = "")]
            message: String,
            #[arg(long, default_value = "Medium", value_parser = parse_priority)]
            priority: Priority,
        },
        /// Accept a pending request
        Accept { request: String },
        /// Decline a pending request
        Reject { request: String },
        /// Complete an accepted request and credit both users
        Complete { request: String },
        /// Accept every pending request
        AcceptAll,
        /// Complete every accepted request
        CompleteAll,
        /// Show a request and mark it as viewed
        View { request: String },
        /// Drop completed requests from the data file
        ClearCompleted,
        /// Create a profile
        AddUser {
            name: String,
            #[arg(long, default_value = "")]
            email: String,
            #[arg(long, default_value = "")]
            bio: String,
            #[arg(long, default_value = "")]
            location: String,
            /// Repeatable
            #[arg(long = "interest")]
            interests: Vec<String>,
            /// Repeatable, `skill` or `skill:Level`
            #[arg(long = "offer", value_parser = parse_offer)]
            offers: Vec<SkillOffer>,
            /// Repeatable
            #[arg(long = "want")]
            wants: Vec<String>,
        },
        /// Delete a user together with their requests
        RemoveUser { user: String },
        /// Endorse another user's skill
        Endorse {
            from: String,
            to: String,
            skill: String,
        },
        /// Level and progress toward the next one
        Level { user: String },
        /// Users ranked by swaps, then rating
        Leaderboard {
            #[arg(long, default_value = "10")]
            top: usize,
        },
        /// Most offered skills
        Popular {
            #[arg(long, default_value = "10")]
            top: usize,
        },
        /// Add the sample profiles that are not there yet
        Demo,
        /// Erase every user, request and log entry
        Reset {
            #[arg(long)]
            yes: bool,
        },
    }

    /// An offered skill with an optional self-declared level.
    #[derive(Debug, Clone, PartialEq)]
    pub struct SkillOffer {
        pub skill: String,
        pub level: Option<Proficiency>,
    }

    fn parse_offer(raw: &str) -> std::result::Result<SkillOffer, String> {
        let (skill, level) = match raw.split_once(':') {
            Some((skill, level)) => {
                let level = Proficiency::parse(level).ok_or_else(|| {
                    format!("unknown level '{}' (Beginner, Intermediate, Expert)", level.trim())
                })?;
                (skill, Some(level))
            }
            None => (raw, None),
        };
        let skill = normalize_tag(skill).ok_or_else(|| format!("empty skill in '{}'", raw))?;
        Ok(SkillOffer { skill, level })
    }

    fn parse_priority(raw: &str) -> std::result::Result<Priority, String> {
        Priority::parse(raw).ok_or_else(|| format!("unknown priority '{}' (Low, Medium, High)", raw))
    }

    impl CliConfig {
        /// File settings with command line overrides applied, validated.
        pub fn settings(&self) -> Result<TomlConfig> {
            let mut settings = match &self.config {
                Some(path) => TomlConfig::from_file(path)?,
                None => TomlConfig::default(),
            };
            if let Some(data_file) = &self.data_file {
                settings.storage.data_file = Some(data_file.clone());
            }
            if let Command::Matches {
                min_score: Some(min_score),
                ..
            } = &self.command
            {
                settings.matching.min_score = *min_score;
            }
            if let Command::Matches { limit: Some(limit), .. } = &self.command {
                settings.matching.limit = Some(*limit);
            }
            settings.validate()?;
            Ok(settings)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_flags_override_defaults() {
            let cli = CliConfig::parse_from([
                "skillswap",
                "--data-file",
                "/tmp/swap.json",
                "matches",
                "Ana",
                "--min-score",
                "60",
            ]);
            let settings = cli.settings().unwrap();
            assert_eq!(settings.data_file(), "/tmp/swap.json");
            assert_eq!(settings.matching.min_score, 60.0);
        }

        #[test]
        fn test_bad_priority_is_rejected() {
            let parsed = CliConfig::try_parse_from([
                "skillswap", "request", "a", "b", "--offer", "x", "--want", "y", "--priority", "urgent",
            ]);
            assert!(parsed.is_err());
        }

        #[test]
        fn test_add_user_offers_with_levels() {
            let cli = CliConfig::parse_from([
                "skillswap", "add-user", "Ana", "--email", "ana@example.com", "--offer", "Python:expert",
                "--offer", "sql", "--want", "react", "--interest", "chess",
            ]);
            let Command::AddUser { name, offers, wants, .. } = cli.command else {
                panic!("expected add-user");
            };
            assert_eq!(name, "Ana");
            assert_eq!(
                offers,
                vec![
                    SkillOffer { skill: "python".into(), level: Some(Proficiency::Expert) },
                    SkillOffer { skill: "sql".into(), level: None },
                ]
            );
            assert_eq!(wants, vec!["react".to_string()]);
        }

        #[test]
        fn test_bad_offer_level_is_rejected() {
            let parsed = CliConfig::try_parse_from(["skillswap", "add-user", "Ana", "--offer", "python:guru"]);
            assert!(parsed.is_err());
            let parsed = CliConfig::try_parse_from(["skillswap", "add-user", "Ana", "--offer", " :Expert"]);
            assert!(parsed.is_err());
        }

        #[test]
        fn test_min_score_out_of_range() {
            let cli = CliConfig::parse_from(["skillswap", "matches", "Ana", "--min-score", "120"]);
            assert!(cli.settings().is_err());
        }
    }
}
