use clap::{Parser, Subcommand};
use std::path::PathBuf;
use triage_core::model::{StageKind, Verdict};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "triage", version, about = "Run-scoped video review pipeline")]
pub struct Cli {
    /// Settings file (YAML). Defaults are used when the file is absent.
    #[arg(long, global = true, default_value = "triage.yaml")]
    pub settings: PathBuf,

    /// Override the artifact store root from the settings file.
    #[arg(long, global = true, env = "TRIAGE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a run, optionally with a days-back pull window
    CreateRun {
        #[arg(long)]
        days_back: Option<u32>,
    },
    /// Execute one stage for a run and variant
    RunStage {
        run_id: Uuid,
        variant: String,
        stage: StageKind,
    },
    /// List the 12 model variants in catalog order
    Variants,
    /// List known run ids
    Runs,
    /// Print a stage artifact as JSON
    Show {
        run_id: Uuid,
        variant: String,
        stage: StageKind,
    },
    /// Print the Yes / N/A / No / Unjudged counts for a variant
    Summary { run_id: Uuid, variant: String },
    /// Report per-variant progress and staleness for a run
    Status {
        run_id: Uuid,
        /// Limit to a single variant
        #[arg(long)]
        variant: Option<String>,
    },
    /// Manually override one judge verdict
    Override {
        run_id: Uuid,
        variant: String,
        video_id: String,
        verdict: Verdict,
    },
}
