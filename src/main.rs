//! Cycletrack CLI
//!
//! Command-line interface for recording cycle start dates and reading
//! statistics and predictions:
//! - Toggle or remove recorded dates
//! - Show status, history and predictions
//! - Generate a default config file

use clap::{Parser, Subcommand};
use cycletrack::analysis::CycleAnalysis;
use cycletrack::config::{generate_default_config, Config, LoggingConfig};
use cycletrack::{
    Clock, CycleTracker, FixedClock, RecordedDate, RemoveOutcome, SystemClock, ToggleOutcome,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "cycletrack")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Record cycle start dates and predict the next ones")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Pretend today is this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub today: Option<RecordedDate>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show cycle statistics
    Status,

    /// Record a date, or remove it if already recorded
    Toggle {
        /// Date (YYYY-MM-DD)
        date: RecordedDate,
    },

    /// Remove a recorded date
    Remove {
        /// Date (YYYY-MM-DD)
        date: RecordedDate,
    },

    /// List recorded dates with cycle lengths, newest first
    History,

    /// List predicted dates
    Predict,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => {
            let config = Config::load_with_env(path)?;
            init_logging(&config.logging);
            config
        }
        None => {
            let search = Config::load_default();
            init_logging(&search.config.logging);
            search.report();
            search.config
        }
    };

    let clock: Arc<dyn Clock> = match cli.today {
        Some(today) => Arc::new(FixedClock(today)),
        None => Arc::new(SystemClock),
    };

    let source = config.source.build(clock.clone())?;
    tracing::info!(source = source.name(), "Using date source");

    let tracker = CycleTracker::new(source)
        .with_clock(clock)
        .with_params(config.cycle)
        .with_policy(config.tracker.mutation_policy);

    tracker.ensure_loaded().await;
    let json = cli.format == "json";

    match cli.command {
        Commands::Status => {
            let analysis = tracker.analysis().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis.status_report())?);
            } else {
                print_status(&analysis);
            }
        }

        Commands::Toggle { date } => {
            let outcome = tracker.toggle(date).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                match outcome {
                    ToggleOutcome::Added => println!("Recorded {}", date),
                    ToggleOutcome::Removed => println!("Removed {}", date),
                    ToggleOutcome::Skipped(reason) => println!("Not recorded: {}", reason),
                    ToggleOutcome::Resynced => {}
                }
            }
            if outcome == ToggleOutcome::Resynced {
                eprintln!("Could not save {}; local data reloaded from source", date);
                std::process::exit(1);
            }
        }

        Commands::Remove { date } => match tracker.remove(date).await {
            RemoveOutcome::Removed => println!("Removed {}", date),
            RemoveOutcome::Resynced => {
                eprintln!("Could not remove {}; local data reloaded from source", date);
                std::process::exit(1);
            }
        },

        Commands::History => {
            let history = tracker.history().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else if history.is_empty() {
                println!("No dates recorded yet.");
                println!();
                println!("Record one with:");
                println!("  cycletrack toggle YYYY-MM-DD");
            } else {
                println!("{:<12} {}", "Date", "Cycle length");
                println!("{}", "-".repeat(26));
                for entry in history {
                    let length = entry
                        .cycle_duration
                        .map(|days| format!("{} days", days))
                        .unwrap_or_else(|| "-".to_string());
                    println!("{:<12} {}", entry.date, length);
                }
            }
        }

        Commands::Predict => {
            let predictions = tracker.predictions().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&predictions)?);
            } else if predictions.is_empty() {
                println!("Not enough data: record at least two dates one cycle apart.");
            } else {
                println!("{:<12} {}", "Date", "Confidence");
                println!("{}", "-".repeat(24));
                for prediction in predictions {
                    println!("{:<12} {}", prediction.date, prediction.confidence);
                }
            }
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cycletrack={}", config.level)));

    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_status(analysis: &CycleAnalysis) {
    let stats = analysis.stats();

    println!("Cycletrack v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Today:            {}", analysis.today);
    println!("Recorded dates:   {}", stats.total_entries);

    match stats.average_cycle_length {
        Some(avg) => println!("Average cycle:    {} days", avg),
        None => println!("Average cycle:    -"),
    }
    match stats.confidence {
        Some(confidence) => println!("Confidence:       {}", confidence),
        None => println!("Confidence:       -"),
    }

    if let (Some(next), Some(days)) = (stats.next_period_date, stats.days_until_next) {
        println!();
        if days < 0 {
            println!("Next expected:    {} ({} days late)", next, -days);
        } else {
            println!("Next expected:    {} (in {} days)", next, days);
        }
    }

    if let (Some(day), Some(progress)) = (analysis.current_cycle_day, analysis.cycle_progress) {
        let filled = (progress * 20.0).round() as usize;
        println!(
            "Cycle day:        {} [{}{}] {:.0}%",
            day,
            "#".repeat(filled),
            ".".repeat(20 - filled),
            progress * 100.0
        );
    }
}
