use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of admin actions kept; older entries are dropped first
pub const AUDIT_LOG_CAPACITY: usize = 50;

/// One administrative action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub action: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
    pub admin: String,
}

impl AuditEntry {
    pub fn new(action: impl Into<String>, details: impl Into<String>, admin: &str) -> Self {
        Self {
            action: action.into(),
            details: details.into(),
            timestamp: Utc::now(),
            admin: admin.to_string(),
        }
    }
}

/// Admin actions, most recent first, never longer than [`AUDIT_LOG_CAPACITY`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct AuditLog(Vec<AuditEntry>);

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: AuditEntry) {
        self.0.insert(0, entry);
        self.0.truncate(AUDIT_LOG_CAPACITY);
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_prepends() {
        let mut log = AuditLog::new();
        log.push(AuditEntry::new("first", "", "admin"));
        log.push(AuditEntry::new("second", "", "admin"));

        assert_eq!(log.entries()[0].action, "second");
        assert_eq!(log.entries()[1].action, "first");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut log = AuditLog::new();
        for i in 0..=AUDIT_LOG_CAPACITY {
            log.push(AuditEntry::new(format!("action-{}", i), "", "admin"));
        }

        assert_eq!(log.len(), AUDIT_LOG_CAPACITY);
        assert_eq!(log.entries()[0].action, "action-50");
        assert!(log.entries().iter().all(|e| e.action != "action-0"));
    }

    #[test]
    fn test_json_is_plain_list() {
        let mut log = AuditLog::new();
        log.push(AuditEntry::new("Score updated", "Movie: X", "lemany01"));

        let json = serde_json::to_value(&log).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["admin"], "lemany01");
    }
}
