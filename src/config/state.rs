// Application state module
// Immutable state shared by every connection

use std::path::PathBuf;

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Canonical document root
    pub root: PathBuf,
}

impl AppState {
    /// Create `AppState` serving files below `root`
    pub fn new(config: Config, root: PathBuf) -> std::io::Result<Self> {
        let root = root.canonicalize()?;
        Ok(Self { config, root })
    }
}
