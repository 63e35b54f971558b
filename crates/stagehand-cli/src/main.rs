mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

#[derive(Parser)]
#[command(
    name = "stagehand",
    about = "Git-aware feature planning: walk a plan through its stages one checkbox at a time",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .stagehand/ or .git/)
    #[arg(long, global = true, env = "STAGEHAND_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize stagehand in the current project
    Init {
        /// Also create this plan
        plan: Option<String>,
    },

    /// Create a new plan
    New {
        /// Plan name (lowercase letters, digits and hyphens)
        plan: Option<String>,
    },

    /// Check a plan against every workflow rule
    Lint {
        /// Plan name (omit when only one plan exists)
        plan: Option<String>,

        /// Skip reference link checks
        #[arg(long)]
        offline: bool,
    },

    /// Lint, then perform the single next step for a plan
    Next {
        /// Plan name (omit when only one plan exists)
        plan: Option<String>,

        /// Skip reference link checks
        #[arg(long)]
        offline: bool,

        /// Stage the file the step wrote
        #[arg(long)]
        stage: bool,
    },

    /// Show plan progress without changing anything
    Status {
        /// Plan name (omit to pick the only plan, or list all)
        plan: Option<String>,
    },

    /// Restore a plan's checklist to its committed content
    Reset {
        /// Plan name (omit when only one plan exists)
        plan: Option<String>,
    },

    /// Inspect the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { plan } => cmd::init::run(&root, plan.as_deref()),
        Commands::New { plan } => cmd::new::run(&root, plan.as_deref(), cli.json),
        Commands::Lint { plan, offline } => {
            cmd::lint::run(&root, plan.as_deref(), offline, cli.json)
        }
        Commands::Next {
            plan,
            offline,
            stage,
        } => cmd::next::run(&root, plan.as_deref(), offline, stage, cli.json),
        Commands::Status { plan } => cmd::status::run(&root, plan.as_deref(), cli.json),
        Commands::Reset { plan } => cmd::reset::run(&root, plan.as_deref()),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
