use chrono::{DateTime, Utc};
use platform_api::{Page, PageRequest};
use serde::{Deserialize, Serialize};

use crate::{HrStore, Tables};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: String,
    pub actor: String,
    pub action: String,
    pub entity: String,
    pub entity_id: String,
    pub summary: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub actor: String,
    pub action: String,
    pub entity: String,
    pub entity_id: String,
    pub summary: String,
}

impl Tables {
    pub fn append_audit(&mut self, entry: AuditEntry) -> AuditLog {
        let log = AuditLog {
            id: self.next_id("AUD"),
            actor: entry.actor,
            action: entry.action,
            entity: entry.entity,
            entity_id: entry.entity_id,
            summary: entry.summary,
            at: Utc::now(),
        };
        self.audit.push(log.clone());
        log
    }
}

impl HrStore {
    /// Append-only; entries are never edited or removed.
    pub async fn record_audit(&self, entry: AuditEntry) -> AuditLog {
        self.tables.write().await.append_audit(entry)
    }

    pub async fn audit_logs(&self, page: PageRequest) -> Page<AuditLog> {
        let tables = self.tables.read().await;
        let newest_first = tables.audit.iter().rev().cloned().collect();
        Page::from_vec(newest_first, page)
    }
}
