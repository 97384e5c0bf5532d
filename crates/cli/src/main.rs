//! Taskweave CLI: the main entry point.
//!
//! Commands:
//! - `run`            Run a goal, optionally as an explicit task chain
//! - `personas`       List the persona catalog
//! - `tools`          List registered tools
//! - `conversation`   Start a conversation or show its history
//! - `memory`         Show or edit a user's memory
//! - `config`         Print the default configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "taskweave",
    about = "Taskweave: task-chain agent with tools and per-user memory",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a goal through the agent
    Run {
        /// The overall goal
        goal: String,

        /// A sub-goal of the task chain (repeat for each step, in order)
        #[arg(short, long = "step")]
        steps: Vec<String>,

        /// Persona id (unknown ids fall back to the default persona)
        #[arg(short, long)]
        persona: Option<String>,

        /// User whose memory the run reads and writes
        #[arg(short, long)]
        user: Option<String>,

        /// Conversation to seed from and record into
        #[arg(short, long)]
        conversation: Option<i64>,

        /// Completion backend (e.g. openai)
        #[arg(short, long)]
        backend: Option<String>,

        /// Print the full run result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available personas
    Personas,

    /// List registered tools
    Tools,

    /// Manage conversations
    #[command(subcommand)]
    Conversation(ConversationCommand),

    /// Inspect or edit per-user memory
    #[command(subcommand)]
    Memory(MemoryCommand),

    /// Print the default configuration as TOML
    Config,
}

#[derive(Subcommand)]
enum ConversationCommand {
    /// Create a new conversation and print its id
    Start {
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Print the turns of a conversation
    History { id: i64 },
}

#[derive(Subcommand)]
enum MemoryCommand {
    /// Show a user's memory
    Show {
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Set one memory entry
    Set {
        key: String,
        value: String,
        #[arg(short, long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            goal,
            steps,
            persona,
            user,
            conversation,
            backend,
            json,
        } => {
            let args = commands::run::RunArgs {
                goal,
                steps,
                persona,
                user,
                conversation,
                backend,
                json,
                verbose: cli.verbose,
            };
            commands::run::run(args).await?
        }
        Commands::Personas => commands::personas::run().await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Conversation(ConversationCommand::Start { title }) => {
            commands::conversation::start(title).await?
        }
        Commands::Conversation(ConversationCommand::History { id }) => {
            commands::conversation::history(id).await?
        }
        Commands::Memory(MemoryCommand::Show { user }) => commands::memory::show(user).await?,
        Commands::Memory(MemoryCommand::Set { key, value, user }) => {
            commands::memory::set(key, value, user).await?
        }
        Commands::Config => commands::config_cmd::run().await?,
    }

    Ok(())
}
