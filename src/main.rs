use anyhow::{Result, bail};
use byteforge::progress::KeyValueStore;
use byteforge::{Config, ProgressStore, Topic};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "byteforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List topics, optionally filtered
    Topics {
        /// Case-insensitive search text
        query: Option<String>,
    },
    /// Show progress for one topic or all of them
    Status {
        /// Topic identifier
        topic: Option<String>,
    },
    /// Mark a subtopic as complete
    Complete {
        /// Topic identifier
        topic: String,
        /// Subtopic label or key
        subtopic: String,
    },
    /// Record a quiz score (0-100)
    Quiz {
        /// Topic identifier
        topic: String,
        /// Score in percent
        #[arg(allow_hyphen_values = true)]
        score: i32,
    },
    /// List topics with low quiz scores
    Weak {
        /// Report scores below this (defaults to the configured threshold)
        #[arg(long)]
        below: Option<u8>,
    },
    /// Erase all progress
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "byteforge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let mut store = config.open_progress_store()?;

    match cli.command {
        Some(Commands::Topics { query }) => {
            for topic in store.catalog().search(query.as_deref().unwrap_or("")) {
                println!("{:<14} {}", topic.id, topic.title);
            }
        }
        Some(Commands::Status { topic: Some(id) }) => {
            let Some(topic) = store.catalog().find(&id).cloned() else {
                bail!("Unknown topic: {}", id);
            };
            print_topic_detail(&store, &topic);
        }
        Some(Commands::Complete { topic, subtopic }) => {
            store.mark_subtopic_complete(&topic, &subtopic)?;
            println!("{}: {}% complete", topic, store.completion_percentage(&topic));
        }
        Some(Commands::Quiz { topic, score }) => {
            store.update_quiz_score(&topic, score)?;
            println!("{}: quiz score {}%", topic, score);
        }
        Some(Commands::Weak { below }) => {
            let threshold = below.unwrap_or(config.weak_score_threshold);
            for (topic, score) in store.weak_topics(threshold) {
                println!("{:<14} {:>3}%", topic, score);
            }
        }
        Some(Commands::Reset { yes }) => {
            if !yes {
                bail!("Reset erases all progress; rerun with --yes to confirm");
            }
            store.reset_progress()?;
            println!("Progress reset");
        }
        Some(Commands::Status { topic: None }) | None => print_overview(&store),
    }

    Ok(())
}

fn print_overview<S: KeyValueStore>(store: &ProgressStore<S>) {
    for topic in &store.catalog().topics {
        let marker = if store.is_topic_complete(&topic.id) { "x" } else { " " };
        println!(
            "[{}] {:<14} {:>3}%  {}",
            marker,
            topic.id,
            store.completion_percentage(&topic.id),
            topic.title
        );
    }
    println!("Overall: {}%", store.overall_percentage());
}

fn print_topic_detail<S: KeyValueStore>(store: &ProgressStore<S>, topic: &Topic) {
    println!("{} ({}%)", topic.title, store.completion_percentage(&topic.id));
    for label in &topic.subtopics {
        let marker = if store.is_subtopic_complete(&topic.id, label) { "x" } else { " " };
        println!("  [{}] {}", marker, label);
    }
    if let Some(score) = store.topic(&topic.id).and_then(|p| p.quiz_score) {
        println!("  Quiz: {}%", score);
    }
}
