//! Shared helper functions for CLI commands
//!
//! Workspace/store setup, id resolution and confirmation prompts used across
//! the command modules.

use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};

use crate::cli::GlobalOpts;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::{Config, Store, Workspace};

/// An open workspace with its configuration and database
pub struct Session {
    pub workspace: Workspace,
    pub config: Config,
    pub store: Store,
}

impl Session {
    /// Discover the workspace (or use `--workspace`) and open its database
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let workspace = match &global.workspace {
            Some(dir) => Workspace::discover_from(dir),
            None => Workspace::discover(),
        }
        .map_err(crate::core::ShgError::from)?;

        let config = Config::load(Some(workspace.root()));
        let db_path = workspace.database_path(config.database.as_deref());
        tracing::debug!(path = %db_path.display(), "opening ledger");
        let store = Store::open(&db_path)?;

        Ok(Self {
            workspace,
            config,
            store,
        })
    }

    /// Resolve a full or short id of the expected kind
    pub fn resolve(&self, input: &str, expected: EntityPrefix) -> Result<EntityId> {
        Ok(self.store.resolve_id(input, expected)?)
    }

    pub fn resolve_opt(&self, input: Option<&str>, expected: EntityPrefix) -> Result<Option<EntityId>> {
        input.map(|s| self.resolve(s, expected)).transpose()
    }
}

/// Ask before a destructive action; `--yes` answers for the user
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

/// Treat a blank string as absent
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("ሰላም ለሁሉም", 5), "ሰላ...");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some("x".to_string())), Some("x".to_string()));
    }

    #[test]
    fn test_confirm_with_yes_skips_prompt() {
        assert!(confirm("Delete?", true).unwrap());
    }
}
