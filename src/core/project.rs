//! Workspace discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the directory that marks a workspace root
pub const WORKSPACE_DIR: &str = ".shg";

/// Default database file name inside the workspace directory
pub const DEFAULT_DATABASE: &str = "ledger.db";

/// Represents an SHG ledger workspace
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Root directory of the workspace (parent of .shg/)
    root: PathBuf,
}

impl Workspace {
    /// Find workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current =
            std::env::current_dir().map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::IoError(format!("{}: {}", start.display(), e)))?;

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new workspace at the given path
    pub fn init(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if root.join(WORKSPACE_DIR).exists() {
            return Err(WorkspaceError::AlreadyExists(root));
        }
        Self::init_force(&root)
    }

    /// Initialize even if .shg/ exists; the config file is rewritten, data is kept
    pub fn init_force(path: &Path) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let shg_dir = root.join(WORKSPACE_DIR);

        std::fs::create_dir_all(shg_dir.join("reports"))
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        std::fs::write(shg_dir.join("config.yaml"), Self::default_config())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# SHG ledger workspace configuration

# Default output format (auto, table, json, csv, md, html, id)
# default_format: auto

# Database file, relative to .shg/
# database: ledger.db

# Log level (error, warn, info, debug, trace)
# log_level: warn

# Title printed at the top of rendered reports
# report_title: ""
"#
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .shg directory
    pub fn shg_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.shg_dir().join("config.yaml")
    }

    /// Default location for exported report files
    pub fn reports_dir(&self) -> PathBuf {
        self.shg_dir().join("reports")
    }

    /// Resolve the database path; relative paths are taken from .shg/
    pub fn database_path(&self, configured: Option<&str>) -> PathBuf {
        let name = configured.unwrap_or(DEFAULT_DATABASE);
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.shg_dir().join(path)
        }
    }
}

/// Errors that can occur during workspace operations
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not an SHG workspace (searched from {searched_from:?}). Run 'shg init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("SHG workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_workspace_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();

        assert!(ws.shg_dir().is_dir());
        assert!(ws.config_path().exists());
        assert!(ws.reports_dir().is_dir());
    }

    #[test]
    fn test_workspace_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Workspace::init(tmp.path()).unwrap();

        let err = Workspace::init(tmp.path()).unwrap_err();
        assert!(matches!(err, WorkspaceError::AlreadyExists(_)));
        assert!(Workspace::init_force(tmp.path()).is_ok());
    }

    #[test]
    fn test_workspace_discover_from_nested_dir() {
        let tmp = tempdir().unwrap();
        Workspace::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("reports/2024/q1");
        std::fs::create_dir_all(&subdir).unwrap();

        let ws = Workspace::discover_from(&subdir).unwrap();
        assert_eq!(
            ws.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_workspace_discover_fails_without_marker() {
        let tmp = tempdir().unwrap();
        let err = Workspace::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, WorkspaceError::NotFound { .. }));
    }

    #[test]
    fn test_database_path_resolution() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::init(tmp.path()).unwrap();

        assert_eq!(ws.database_path(None), ws.shg_dir().join("ledger.db"));
        assert_eq!(ws.database_path(Some("alt.db")), ws.shg_dir().join("alt.db"));

        let abs = tmp.path().join("elsewhere.db");
        let abs_str = abs.to_string_lossy().to_string();
        assert_eq!(ws.database_path(Some(&abs_str)), abs);
    }
}
