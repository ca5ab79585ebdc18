//! JSON-file persistence for the CLI.
//!
//! One file holds everything the commands need: the workflow state
//! (documents, audit trail, reference sequences) and the budget ledger
//! table. A missing file is an empty store; every mutating command
//! rewrites the file on success.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use chaine_engine::TableLedger;
use chaine_storage::MemoryState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StoreFile {
    pub workflow: MemoryState,
    pub budget: TableLedger,
}

pub(crate) fn load(path: &Path) -> Result<StoreFile, String> {
    if !path.exists() {
        return Ok(StoreFile::default());
    }
    let text = fs::read_to_string(path)
        .map_err(|e| format!("error reading store '{}': {}", path.display(), e))?;
    serde_json::from_str(&text)
        .map_err(|e| format!("error parsing store '{}': {}", path.display(), e))
}

pub(crate) fn save(path: &Path, store: &StoreFile) -> Result<(), String> {
    let text = serde_json::to_string_pretty(store)
        .map_err(|e| format!("error serializing store: {}", e))?;
    fs::write(path, text).map_err(|e| format!("error writing store '{}': {}", path.display(), e))
}
