//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    cluster::ClusterCommands, completions::CompletionsArgs, group::GroupCommands,
    init::InitArgs, meeting::MeetingCommands, member::MemberCommands, report::ReportCommands,
    staff::StaffCommands, survey::SurveyCommands,
};
use crate::core::Config;

#[derive(Parser)]
#[command(name = "shg")]
#[command(author, version, about = "SHG Ledger - self-help group case management and reporting")]
#[command(long_about = "Track staff, clusters, self-help groups, members, surveys and meetings in a local SQLite workspace, and produce filtered aggregate reports.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(long, short = 'o', global = true)]
    pub output: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .shg/)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,
}

impl GlobalOpts {
    /// Fill in an `auto` format from the configured default
    pub fn with_config(mut self, config: &Config) -> Self {
        if self.format == OutputFormat::Auto {
            if let Some(configured) = config
                .default_format
                .as_deref()
                .and_then(|f| OutputFormat::from_str(f, true).ok())
            {
                self.format = configured;
            }
        }
        self
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new SHG workspace
    Init(InitArgs),

    /// Staff management (facilitators, cluster managers, group leads)
    #[command(subcommand)]
    Staff(StaffCommands),

    /// Cluster management
    #[command(subcommand)]
    Cluster(ClusterCommands),

    /// Self-help group management
    #[command(subcommand)]
    Group(GroupCommands),

    /// Group member management
    #[command(subcommand)]
    Member(MemberCommands),

    /// Member and group surveys
    #[command(subcommand)]
    Survey(SurveyCommands),

    /// Meetings and attendance
    #[command(subcommand)]
    Meeting(MeetingCommands),

    /// Aggregate reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, table for lists)
    #[default]
    Auto,
    /// Human-readable table
    Table,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Standalone HTML document
    Html,
    /// Just IDs, one per line
    Id,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_format_from_config() {
        let global = GlobalOpts {
            format: OutputFormat::Auto,
            output: None,
            quiet: false,
            verbose: false,
            workspace: None,
        };
        let config = Config {
            default_format: Some("CSV".to_string()),
            ..Default::default()
        };
        assert_eq!(global.clone().with_config(&config).format, OutputFormat::Csv);

        let explicit = GlobalOpts {
            format: OutputFormat::Json,
            ..global
        };
        assert_eq!(explicit.with_config(&config).format, OutputFormat::Json);
    }
}
