//! `shg init` command - Initialize a new SHG workspace

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::core::project::{Workspace, WorkspaceError};
use crate::core::{Config, ShgError, Store};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Rewrite the workspace config even if .shg/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let workspace = if args.force {
        Workspace::init_force(&path)
    } else {
        Workspace::init(&path)
    };

    match workspace {
        Ok(workspace) => {
            let config = Config::load(Some(workspace.root()));
            let db_path = workspace.database_path(config.database.as_deref());
            Store::open(&db_path)?;

            println!(
                "{} Initialized SHG workspace at {}",
                style("✓").green(),
                style(workspace.root().display()).cyan()
            );
            println!();
            println!("Created workspace structure:");
            print_structure(workspace.root(), &db_path);
            println!();
            println!("Next steps:");
            println!(
                "  {} Register a facilitator",
                style("shg staff new --name <NAME> --role facilitator").yellow()
            );
            println!(
                "  {} Create a cluster",
                style("shg cluster new --name <NAME>").yellow()
            );
            println!(
                "  {} Summarize everything",
                style("shg report scope").yellow()
            );
            Ok(())
        }
        Err(WorkspaceError::AlreadyExists(path)) => {
            println!(
                "{} SHG workspace already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("shg init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(ShgError::from(e).into()),
    }
}

fn print_structure(root: &Path, db_path: &Path) {
    let entries = [
        root.join(".shg"),
        root.join(".shg/config.yaml"),
        root.join(".shg/reports"),
        db_path.to_path_buf(),
    ];

    for entry in entries {
        if entry.exists() {
            let shown = entry.strip_prefix(root).unwrap_or(&entry);
            let suffix = if entry.is_dir() { "/" } else { "" };
            println!("  {}{}", style(shown.display()).dim(), suffix);
        }
    }
}
