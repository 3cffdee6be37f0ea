//! SHG Ledger: case management and aggregate reporting for self-help-group
//! microfinance programs.
//!
//! Staff, clusters, groups, members, surveys and meetings live in a SQLite
//! workspace (`.shg/`). The [`analytics`] module turns them into filtered
//! aggregate reports.

pub mod analytics;
pub mod cli;
pub mod core;
pub mod entities;
