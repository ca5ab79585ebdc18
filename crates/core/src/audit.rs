//! Append-only audit trail entries.
//!
//! One entry per accepted transition: who, what, when, why. Entries are
//! never mutated or deleted. Each entry carries a SHA-256 integrity
//! hash over its identifying fields so a tampered trail is detectable.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::status::Action;

/// Immutable record of one accepted workflow transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub entity_id: String,
    pub actor_id: String,
    pub action: Action,
    /// RFC 3339.
    pub timestamp: String,
    /// Motif for reject/defer; override justification on submit.
    pub reason: Option<String>,
    /// Free-text comment on verify/validate.
    pub comment: Option<String>,
    /// SHA-256 (hex) over `entity_id|actor_id|action|timestamp|reason`.
    pub integrity_hash: String,
}

impl AuditEntry {
    pub fn new(
        id: impl Into<String>,
        entity_id: impl Into<String>,
        actor_id: impl Into<String>,
        action: Action,
        timestamp: impl Into<String>,
        reason: Option<String>,
        comment: Option<String>,
    ) -> Self {
        let id = id.into();
        let entity_id = entity_id.into();
        let actor_id = actor_id.into();
        let timestamp = timestamp.into();
        let integrity_hash = integrity_hash(&entity_id, &actor_id, action, &timestamp, reason.as_deref());
        AuditEntry {
            id,
            entity_id,
            actor_id,
            action,
            timestamp,
            reason,
            comment,
            integrity_hash,
        }
    }

    /// Recompute the hash and compare. False means the entry was altered
    /// after creation.
    pub fn verify_integrity(&self) -> bool {
        self.integrity_hash
            == integrity_hash(
                &self.entity_id,
                &self.actor_id,
                self.action,
                &self.timestamp,
                self.reason.as_deref(),
            )
    }
}

fn integrity_hash(
    entity_id: &str,
    actor_id: &str,
    action: Action,
    timestamp: &str,
    reason: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(entity_id.as_bytes());
    hasher.update(b"|");
    hasher.update(actor_id.as_bytes());
    hasher.update(b"|");
    hasher.update(action.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(timestamp.as_bytes());
    hasher.update(b"|");
    hasher.update(reason.unwrap_or("").as_bytes());
    let digest = hasher.finalize();
    digest.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{:02x}", b);
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_hash_is_stable() {
        let a = AuditEntry::new(
            "a-1",
            "eb-1",
            "u-cb",
            Action::Reject,
            "2026-02-01T10:00:00Z",
            Some("Budget insuffisant - dossier incomplet".to_string()),
            None,
        );
        let b = AuditEntry::new(
            "a-2",
            "eb-1",
            "u-cb",
            Action::Reject,
            "2026-02-01T10:00:00Z",
            Some("Budget insuffisant - dossier incomplet".to_string()),
            None,
        );
        // Same identifying fields, same hash; entry id is not part of it.
        assert_eq!(a.integrity_hash, b.integrity_hash);
        assert_eq!(a.integrity_hash.len(), 64);
        assert!(a.verify_integrity());
    }

    #[test]
    fn tampering_breaks_verification() {
        let mut entry = AuditEntry::new(
            "a-1",
            "eb-1",
            "u-cb",
            Action::Validate,
            "2026-02-01T10:00:00Z",
            None,
            Some("Conforme".to_string()),
        );
        assert!(entry.verify_integrity());
        entry.actor_id = "u-impostor".to_string();
        assert!(!entry.verify_integrity());
    }
}
