use chaine_core::Document;
use serde::{Deserialize, Serialize};

/// A stored document with its OCC version.
///
/// `version` starts at 0 on creation and increments by one on every
/// committed update. All writes are conditional on the expected version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub document: Document,
    pub version: i64,
}

impl DocumentRecord {
    pub fn new(document: Document) -> Self {
        DocumentRecord {
            document,
            version: 0,
        }
    }
}
