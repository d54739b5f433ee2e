use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use eventmap_core::Event;
use serde::Deserialize;

/// On-disk shape of the event collection.
#[derive(Deserialize)]
struct EventFile {
    #[serde(default)]
    events: Vec<Event>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    // Read on every request so edits to the file show up without a restart
    data_file: Arc<PathBuf>,
}

impl AppState {
    pub fn new(data_file: PathBuf) -> Self {
        AppState {
            data_file: Arc::new(data_file),
        }
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn events(&self) -> Result<Vec<Event>> {
        let raw = std::fs::read_to_string(self.data_file.as_path())
            .with_context(|| format!("Could not read {}", self.data_file.display()))?;
        let file: EventFile = serde_json::from_str(&raw)
            .with_context(|| format!("Could not parse {}", self.data_file.display()))?;
        Ok(file.events)
    }
}
