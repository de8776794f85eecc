//! CLI command definitions.

use clap::Subcommand;
use vista_core::{DatasetId, ReportId, WorkspaceId};

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Issue embed parameters for one report
    Embed {
        /// Workspace ID (defaults to power_bi.default_workspace_id)
        #[arg(short, long)]
        workspace: Option<WorkspaceId>,

        /// Report ID (defaults to power_bi.default_report_id)
        #[arg(short, long)]
        report: Option<ReportId>,

        /// Username bound to the RLS identity
        #[arg(short, long, default_value = "")]
        user: String,

        /// Extra dataset to include in the token
        #[arg(long)]
        additional_dataset: Option<DatasetId>,
    },

    /// Issue embed parameters for several reports under one token
    EmbedBatch {
        /// Workspace ID (defaults to power_bi.default_workspace_id)
        #[arg(short, long)]
        workspace: Option<WorkspaceId>,

        /// Report IDs, in display order
        #[arg(short, long = "report", required = true)]
        reports: Vec<ReportId>,

        /// Extra datasets to include in the token
        #[arg(long = "additional-dataset")]
        additional_datasets: Vec<DatasetId>,
    },

    /// Check service-principal credentials
    Token,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration with secrets redacted
    Show,
}
