use clap::Parser;
use skillswap::config::Command;
use skillswap::core::directory::{MatchQuery, SkillDirectory};
use skillswap::core::lifecycle::RequestDraft;
use skillswap::core::DocumentStore;
use skillswap::utils::error::{ErrorSeverity, SwapError};
use skillswap::utils::logger;
use skillswap::{CliConfig, JsonFileStore, UserProfile};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            logger::init_cli_logger(cli.verbose, None);
            exit_with(&e)
        }
    };

    let level = settings.logging.level.as_deref();
    if cli.json_logs || settings.logging.json {
        logger::init_json_logger(cli.verbose, level);
    } else {
        logger::init_cli_logger(cli.verbose, level);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let store = JsonFileStore::new(settings.data_file()).with_pretty(settings.storage.pretty);
    let document = match store.load().await {
        Ok(document) => document,
        Err(e) => exit_with(&e),
    };
    let mut directory = SkillDirectory::new(document);

    match run(&cli.command, &mut directory, &settings) {
        Ok(changed) => {
            if changed {
                if let Err(e) = store.save(directory.document()).await {
                    exit_with(&e);
                }
            }
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}

/// Runs one command; returns whether the document needs saving.
fn run(
    command: &Command,
    directory: &mut SkillDirectory,
    settings: &skillswap::TomlConfig,
) -> skillswap::Result<bool> {
    match command {
        Command::Init => {
            println!("✅ Data file ready");
            Ok(false)
        }
        Command::Stats => {
            let stats = directory.stats();
            println!("👥 Users: {}", stats.total_users);
            println!("🎓 Skills offered: {}", stats.total_skills_offered);
            println!(
                "📬 Requests: {} (⏳ {} pending, 🤝 {} accepted, ✅ {} completed, ❌ {} rejected)",
                stats.total_requests, stats.pending, stats.accepted, stats.completed, stats.rejected
            );
            println!("⭐ Average rating: {:.2}", stats.average_rating);
            Ok(false)
        }
        Command::Matches { user, search, .. } => {
            let query = MatchQuery {
                search: search.clone(),
                ..MatchQuery::from_settings(settings)
            };
            let me = directory.resolve_user(user)?.id.clone();
            let candidates = directory.find_matches(&me, &query)?;
            if candidates.is_empty() {
                println!("🔍 No matches found. Try lowering --min-score");
            }
            for candidate in candidates {
                let skills: Vec<&str> = candidate.breakdown.mutual_skills.iter().map(String::as_str).collect();
                println!(
                    "{:>5.1}  {}  [{}]{}",
                    candidate.score,
                    candidate.name,
                    skills.join(", "),
                    if candidate.breakdown.location_match { "  📍" } else { "" }
                );
            }
            Ok(false)
        }
        Command::Request {
            sender,
            receiver,
            offer,
            want,
            message,
            priority,
        } => {
            let sender_id = directory.resolve_user(sender)?.id.clone();
            let receiver_id = directory.resolve_user(receiver)?.id.clone();
            let request = directory.request_swap(RequestDraft {
                sender_id,
                receiver_id,
                skill_offered: offer.clone(),
                skill_wanted: want.clone(),
                message: message.clone(),
                priority: *priority,
            });
            println!("✅ Request sent: {}", request.id);
            Ok(true)
        }
        Command::Accept { request } => {
            directory.accept(request)?;
            println!("🤝 Accepted {}", request);
            Ok(true)
        }
        Command::Reject { request } => {
            directory.reject(request)?;
            println!("❌ Rejected {}", request);
            Ok(true)
        }
        Command::Complete { request } => {
            let done = directory.complete(request)?;
            println!("🎉 Swap completed between {} and {}", done.sender.name, done.receiver.name);
            for (user, badge) in done.earned() {
                println!("🏅 {} earned {}", user.name, badge);
            }
            Ok(true)
        }
        Command::AcceptAll => {
            let report = directory.accept_all_pending();
            println!("✅ Accepted {} requests", report.applied);
            Ok(report.applied > 0)
        }
        Command::CompleteAll => {
            let report = directory.complete_all_accepted();
            println!("🎉 Completed {} swaps", report.applied);
            for (id, e) in &report.failed {
                eprintln!("⚠️  {}: {}", id, e.user_friendly_message());
            }
            Ok(report.applied > 0)
        }
        Command::View { request } => {
            let request = directory.mark_viewed(request)?;
            println!(
                "{} [{}] {} → {}: offers {}, wants {} ({:?} priority)",
                request.id,
                request.status,
                request.sender_id,
                request.receiver_id,
                request.skill_offered,
                request.skill_wanted,
                request.priority
            );
            if !request.message.is_empty() {
                println!("💬 {}", request.message);
            }
            Ok(true)
        }
        Command::ClearCompleted => {
            let removed = directory.clear_completed();
            println!("🧹 Removed {} completed requests", removed);
            Ok(removed > 0)
        }
        Command::AddUser {
            name,
            email,
            bio,
            location,
            interests,
            offers,
            wants,
        } => {
            let mut profile = UserProfile::new(name.clone(), email.clone())
                .with_bio(bio.clone())
                .located_in(location.clone())
                .with_interests(interests.iter().cloned());
            for offer in offers {
                profile = profile.offering(&offer.skill, offer.level);
            }
            for want in wants {
                profile = profile.wanting(want);
            }
            let added = directory.add_user(profile)?;
            println!("✅ Created {} ({})", added.name, added.id);
            Ok(true)
        }
        Command::RemoveUser { user } => {
            let id = directory.resolve_user(user)?.id.clone();
            let removed = directory.remove_user(&id)?;
            println!("🗑️  Removed {} and {} of their requests", user, removed);
            Ok(true)
        }
        Command::Endorse { from, to, skill } => {
            let from_id = directory.resolve_user(from)?.id.clone();
            let to_id = directory.resolve_user(to)?.id.clone();
            let endorsement = directory.endorse(&from_id, &to_id, skill)?;
            println!("👍 {} endorsed {} for {}", from, to, endorsement.skill);
            Ok(true)
        }
        Command::Level { user } => {
            let progress = directory.level_progress(user)?;
            println!(
                "Level {}  {}/{} XP ({:.0}%)",
                progress.level,
                progress.into_level,
                progress.level_span,
                progress.percent()
            );
            Ok(false)
        }
        Command::Leaderboard { top } => {
            for (idx, user) in directory.leaderboard(*top).into_iter().enumerate() {
                let medal = match idx {
                    0 => "🥇".to_string(),
                    1 => "🥈".to_string(),
                    2 => "🥉".to_string(),
                    n => format!("#{}", n + 1),
                };
                println!(
                    "{} {}  ⭐ {:.1} | {} swaps | Level {} | {} XP",
                    medal, user.name, user.rating, user.swaps_completed, user.level, user.experience_points
                );
            }
            Ok(false)
        }
        Command::Popular { top } => {
            for (skill, count) in directory.skill_popularity().into_iter().take(*top) {
                println!("{}: {} users", skill, count);
            }
            Ok(false)
        }
        Command::Demo => {
            let added = directory.seed_demo();
            println!("🎲 Added {} demo profiles", added);
            Ok(added > 0)
        }
        Command::Reset { yes } => {
            if !yes {
                return Err(SwapError::ValidationError {
                    field: "yes".to_string(),
                    value: "false".to_string(),
                    reason: "reset erases every record; pass --yes to confirm".to_string(),
                });
            }
            directory.reset();
            println!("🗑️  All data cleared");
            Ok(true)
        }
    }
}

fn exit_with(e: &SwapError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
