use std::collections::HashMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

// ============================================================================
// Session - the acting user, passed explicitly into every component call
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Director,
    OperationsManager,
    BranchHead,
    Admin,
    Checker,
    Courier,
    Finance,
}

impl Role {
    /// Central roles see and filter across every branch
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Director | Role::OperationsManager)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Director => "director",
            Role::OperationsManager => "operations_manager",
            Role::BranchHead => "branch_head",
            Role::Admin => "admin",
            Role::Checker => "checker",
            Role::Courier => "courier",
            Role::Finance => "finance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub user_name: String,
    pub role: Role,
    pub branch_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(user_id: Uuid, user_name: impl Into<String>, role: Role, branch_id: Uuid) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
            role,
            branch_id,
            expires_at: None,
        }
    }

    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Session-level failures, reported before any component runs
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SessionError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Unknown session token")]
    UnknownToken,

    #[error("Session expired")]
    Expired,
}

/// Token -> session table. Issuing tokens belongs to the authentication
/// service; this store only resolves them.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, token: impl Into<String>, session: Session) {
        self.sessions.write().await.insert(token.into(), session);
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    pub async fn resolve(&self, token: Option<&str>) -> Result<Session, SessionError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(SessionError::MissingToken)?;

        let sessions = self.sessions.read().await;
        let session = sessions.get(token).ok_or(SessionError::UnknownToken)?;

        if session.is_expired(Utc::now()) {
            return Err(SessionError::Expired);
        }

        Ok(session.clone())
    }
}
