use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "upkeep")]
#[command(about = "Upkeep - maintenance deadline notifier", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print tasks due within the horizon
    Due {
        /// Horizon in days (defaults to MAINTENANCE_WITHIN)
        #[arg(long)]
        within: Option<u32>,
    },

    /// Notify recipients about due tasks
    Send {
        /// Horizon in days (defaults to MAINTENANCE_WITHIN)
        #[arg(long)]
        within: Option<u32>,

        /// Cooldown per task and recipient in days (defaults to MAINTENANCE_THROTTLE)
        #[arg(long)]
        throttle: Option<u32>,

        /// Render and log, but send nothing
        #[arg(long)]
        dry_run: bool,

        /// Do not insert AUTO_RESET events after sending
        #[arg(long)]
        no_advance: bool,
    },

    /// Record a manual completion event
    MarkDone {
        /// Task ID
        task_id: i64,

        /// Operator who did the work
        #[arg(long)]
        operator_id: Option<i64>,

        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Show the event history of a task
    Events {
        /// Task ID
        task_id: i64,
    },

    /// Rebuild the reporting warehouse
    DwhRefresh {
        /// Parse and list statements without executing them
        #[arg(long)]
        dry_run: bool,
    },
}
