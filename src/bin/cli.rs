use clap::{Parser, Subcommand};
use score_engine::{EngineConfig, GameResult, ScoreEngine};

#[derive(Parser)]
#[command(name = "score-engine-cli")]
#[command(about = "Score Engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Durable store path
    #[arg(short, long, default_value = "scores.db")]
    db: String,

    /// Local cache path
    #[arg(long, default_value = "scores-cache.db")]
    cache_db: String,

    /// YAML config file
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a finished game
    Submit {
        /// Player name (defaults to the saved display name)
        #[arg(short, long)]
        player: Option<String>,

        /// Game mode (words per game)
        #[arg(short, long)]
        mode: u32,

        /// Score
        #[arg(short, long)]
        score: f64,

        /// Letters per second
        #[arg(long, default_value = "0")]
        lps: f64,

        /// Accuracy percentage
        #[arg(long, default_value = "100")]
        accuracy: f64,

        /// Skill tier label
        #[arg(long, default_value = "")]
        rank: String,

        /// Elapsed seconds
        #[arg(long, default_value = "1")]
        time: f64,

        /// Milliseconds per letter
        #[arg(long, default_value = "1")]
        ms_per_letter: f64,
    },

    /// Show the leaderboard for a mode
    Leaderboard {
        /// Game mode
        mode: u32,

        /// Maximum entries
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show a player's stored best for a mode
    Best {
        player: String,
        mode: u32,
    },

    /// Show a player's best cached score across modes
    Profile { player: String },

    /// Forget cached bests for a player
    ClearCache { player: String },

    /// Show or set the display name
    Name { name: Option<String> },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_yaml_file(path)?,
        None => EngineConfig::from_env(),
    };

    let engine = ScoreEngine::open(&cli.db, &cli.cache_db, config).await?;

    match cli.command {
        Commands::Submit {
            player,
            mode,
            score,
            lps,
            accuracy,
            rank,
            time,
            ms_per_letter,
        } => {
            let player = player
                .or_else(|| engine.display_name())
                .ok_or_else(|| anyhow::anyhow!("no --player given and no display name saved"))?;

            let result = GameResult::new(player, mode, score)
                .with_metrics(lps, accuracy)
                .with_timing(time, ms_per_letter)
                .with_rank_label(rank);

            let outcome = engine.submit(&result).await?;

            if !outcome.accepted {
                println!("❌ Not saved: {}", outcome.error.unwrap_or_default());
            } else if outcome.is_new_best {
                println!("🏆 New best! {} (record {:?})", result.display(), outcome.record_id);
            } else {
                println!("✅ Recorded, best unchanged (record {:?})", outcome.record_id);
            }
        }

        Commands::Leaderboard { mode, limit } => {
            let entries = engine.leaderboard_entries(mode, limit).await?;

            if entries.is_empty() {
                println!("No scores yet for {} words mode.", mode);
            } else {
                println!("🏁 Leaderboard ({} words):", mode);
                for e in entries {
                    println!(
                        "   {:>2}. {:<20} {:>8.2}  {:>5.2} lps  {:>5.1}%  {}",
                        e.position, e.player_name, e.score, e.lps, e.accuracy, e.rank
                    );
                }
            }
        }

        Commands::Best { player, mode } => match engine.best_score(&player, mode).await? {
            Some(record) => {
                println!("📊 {} [{}w]", record.player_name, record.game_mode);
                println!("   Score: {:.2}", record.score);
                println!("   LPS: {:.2}", record.lps);
                println!("   Accuracy: {:.1}%", record.accuracy);
                println!("   Since: {}", record.created_at.format("%Y-%m-%d %H:%M:%S"));
            }
            None => println!("No record for {} in {} words mode.", player, mode),
        },

        Commands::Profile { player } => {
            let profile = engine.profile(&player);
            match (profile.best_score, profile.best_game_mode) {
                (Some(score), Some(mode)) => println!("👤 {}: best {:.2} ({} words)", profile.name, score, mode),
                _ => println!("👤 {}: no cached scores", profile.name),
            }
        }

        Commands::ClearCache { player } => {
            engine.clear_cache(&player);
            println!("🧹 Cleared cached bests for {}", player);
        }

        Commands::Name { name } => match name {
            Some(name) => {
                engine.set_display_name(&name);
                println!("✅ Display name set to {}", name.trim());
            }
            None => println!("{}", engine.display_name().unwrap_or_else(|| "(not set)".to_string())),
        },
    }

    Ok(())
}
