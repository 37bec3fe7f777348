//! Ticket applications
//!
//! A viewer applies with a name and the name on their bank deposit; an admin
//! approves the application, which issues an access token; the viewer then
//! enters with name and token. Storage sits behind [`TicketRegistry`].

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::info;
use uuid::Uuid;

use crate::{ControlError, Result};

/// Application identifier
pub type ApplicationId = u64;

/// Approval state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Pending,
    Approved,
}

/// One ticket application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketApplication {
    pub id: ApplicationId,
    pub name: String,
    pub depositor_name: String,
    pub status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}

/// Storage for ticket applications
pub trait TicketRegistry: Send + Sync {
    /// Register a pending application
    fn apply(&self, name: &str, depositor_name: &str) -> Result<ApplicationId>;

    /// Pending applications, newest first
    fn pending(&self) -> Vec<TicketApplication>;

    /// Approve an application and return its new access token
    fn approve(&self, id: ApplicationId) -> Result<String>;

    /// Whether `name` and `token` belong to one approved application
    fn verify(&self, name: &str, token: &str) -> bool;
}

/// Process-lifetime registry; nothing is persisted
#[derive(Debug, Default)]
pub struct InMemoryTicketRegistry {
    inner: Mutex<Applications>,
}

#[derive(Debug, Default)]
struct Applications {
    next_id: ApplicationId,
    entries: Vec<TicketApplication>,
}

impl InMemoryTicketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of applications in any state
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TicketRegistry for InMemoryTicketRegistry {
    fn apply(&self, name: &str, depositor_name: &str) -> Result<ApplicationId> {
        let name = name.trim();
        let depositor_name = depositor_name.trim();
        if name.is_empty() || depositor_name.is_empty() {
            return Err(ControlError::InvalidParameter(
                "name and depositor_name are required".to_string(),
            ));
        }

        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.entries.push(TicketApplication {
            id,
            name: name.to_string(),
            depositor_name: depositor_name.to_string(),
            status: TicketStatus::Pending,
            access_token: None,
            created_at: Utc::now(),
            approved_at: None,
        });
        info!("Ticket application {} registered", id);
        Ok(id)
    }

    fn pending(&self) -> Vec<TicketApplication> {
        self.inner
            .lock()
            .entries
            .iter()
            .rev()
            .filter(|app| app.status == TicketStatus::Pending)
            .cloned()
            .collect()
    }

    fn approve(&self, id: ApplicationId) -> Result<String> {
        let mut inner = self.inner.lock();
        let app = inner
            .entries
            .iter_mut()
            .find(|app| app.id == id)
            .ok_or_else(|| ControlError::NotFound(format!("application {}", id)))?;

        // Approving again replaces the token
        let token = Uuid::new_v4().to_string();
        app.status = TicketStatus::Approved;
        app.access_token = Some(token.clone());
        app.approved_at = Some(Utc::now());
        info!("Ticket application {} approved", id);
        Ok(token)
    }

    fn verify(&self, name: &str, token: &str) -> bool {
        // Names are stored trimmed
        let name = name.trim();
        self.inner.lock().entries.iter().any(|app| {
            app.status == TicketStatus::Approved
                && app.name == name
                && app
                    .access_token
                    .as_deref()
                    .is_some_and(|issued| bool::from(issued.as_bytes().ct_eq(token.as_bytes())))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_and_list_pending() {
        let registry = InMemoryTicketRegistry::new();
        let first = registry.apply("Mina", "Kim Mina").unwrap();
        let second = registry.apply("Joon", "Park Joon").unwrap();
        assert_ne!(first, second);

        let pending = registry.pending();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, second);
        assert_eq!(pending[1].name, "Mina");
    }

    #[test]
    fn test_blank_fields_rejected() {
        let registry = InMemoryTicketRegistry::new();
        assert!(matches!(
            registry.apply("  ", "Kim"),
            Err(ControlError::InvalidParameter(_))
        ));
        assert!(registry.apply("Mina", "").is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_approve_and_verify() {
        let registry = InMemoryTicketRegistry::new();
        let id = registry.apply("Mina", "Kim Mina").unwrap();
        assert!(!registry.verify("Mina", ""));

        let token = registry.approve(id).unwrap();
        assert!(registry.pending().is_empty());
        assert!(registry.verify("Mina", &token));
        assert!(!registry.verify("Joon", &token));
        assert!(!registry.verify("Mina", "forged"));
    }

    #[test]
    fn test_verify_matches_trimmed_name() {
        let registry = InMemoryTicketRegistry::new();
        let id = registry.apply(" Mina ", "Kim").unwrap();
        let token = registry.approve(id).unwrap();
        assert!(registry.verify(" Mina ", &token));
        assert!(registry.verify("Mina", &token));
        assert!(!registry.verify("Mi na", &token));
    }

    #[test]
    fn test_verify_rejects_token_prefix() {
        let registry = InMemoryTicketRegistry::new();
        let id = registry.apply("Mina", "Kim Mina").unwrap();
        let token = registry.approve(id).unwrap();
        assert!(!registry.verify("Mina", &token[..8]));
        assert!(!registry.verify("Mina", &format!("{}x", token)));
    }

    #[test]
    fn test_reapproval_rotates_token() {
        let registry = InMemoryTicketRegistry::new();
        let id = registry.apply("Mina", "Kim Mina").unwrap();
        let old = registry.approve(id).unwrap();
        let new = registry.approve(id).unwrap();
        assert!(!registry.verify("Mina", &old));
        assert!(registry.verify("Mina", &new));
    }

    #[test]
    fn test_approve_unknown() {
        let registry = InMemoryTicketRegistry::new();
        assert!(matches!(
            registry.approve(42),
            Err(ControlError::NotFound(_))
        ));
    }
}
