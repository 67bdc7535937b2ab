//! In-memory role/permission store with a session ledger.
//!
//! Follows the user → role → permissions model: a user holds exactly one
//! role, a role grants a fixed permission set. Gating happens at the call
//! site through the `PermissionGate` trait; the protected code itself never
//! inspects its arguments for identity.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

use securenet_common::{PermissionGate, SecureNetError, SecureNetResult};

/// Default roles, in decreasing order of privilege.
const DEFAULT_ROLES: &[(&str, &str)] = &[
    ("admin", "read,write,delete,manage_users,view_logs"),
    ("analyst", "read,write,view_logs"),
    ("operator", "read,write"),
    ("viewer", "read"),
    ("guest", "read_limited"),
];

/// Users seeded with the admin role on a fresh store.
pub const DEFAULT_ADMIN_USERS: &[&str] = &["admin", "security-admin"];

#[derive(Debug, Clone)]
pub struct Session {
    pub id: u64,
    pub username: String,
    pub started_at: DateTime<Utc>,
    pub active: bool,
}

#[derive(Default)]
struct Inner {
    /// role name -> granted permissions
    roles: HashMap<String, Vec<String>>,
    /// username -> role name
    users: HashMap<String, String>,
    sessions: Vec<Session>,
    next_session_id: u64,
}

pub struct RoleStore {
    inner: RwLock<Inner>,
}

impl RoleStore {
    /// Store with the default role table loaded and no users assigned.
    pub fn new() -> Self {
        let mut inner = Inner {
            next_session_id: 1,
            ..Inner::default()
        };
        for (role, permissions) in DEFAULT_ROLES {
            inner.roles.insert(
                (*role).to_string(),
                permissions.split(',').map(str::to_string).collect(),
            );
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Store with the default admin users pre-assigned.
    pub fn with_default_users() -> Self {
        let store = Self::new();
        for username in DEFAULT_ADMIN_USERS {
            // Role table is seeded above, so this cannot fail.
            let _ = store.assign_role(username, "admin");
        }
        store
    }

    /// Assign `role` to `username`, replacing any previous assignment.
    /// Unknown roles are rejected.
    pub fn assign_role(&self, username: &str, role: &str) -> SecureNetResult<()> {
        let mut inner = self.inner.write();
        if !inner.roles.contains_key(role) {
            return Err(SecureNetError::Config(format!("unknown role '{role}'")));
        }
        inner.users.insert(username.to_string(), role.to_string());
        info!(username, role, "role assigned");
        Ok(())
    }

    /// All permissions granted to `username`, empty for unknown users.
    pub fn permissions_of(&self, username: &str) -> Vec<String> {
        let inner = self.inner.read();
        inner
            .users
            .get(username)
            .and_then(|role| inner.roles.get(role))
            .cloned()
            .unwrap_or_default()
    }

    /// Open a session for a known user and return its id.
    pub fn create_session(&self, username: &str) -> SecureNetResult<u64> {
        let mut inner = self.inner.write();
        if !inner.users.contains_key(username) {
            return Err(SecureNetError::PermissionDenied(format!(
                "unknown user '{username}'"
            )));
        }
        let id = inner.next_session_id;
        inner.next_session_id += 1;
        inner.sessions.push(Session {
            id,
            username: username.to_string(),
            started_at: Utc::now(),
            active: true,
        });
        info!(session = id, username, "session created");
        Ok(id)
    }

    /// Mark a session inactive. Returns false if no such active session.
    pub fn end_session(&self, id: u64) -> bool {
        let mut inner = self.inner.write();
        match inner.sessions.iter_mut().find(|s| s.id == id && s.active) {
            Some(session) => {
                session.active = false;
                true
            }
            None => false,
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.inner.read().sessions.iter().filter(|s| s.active).count()
    }
}

impl Default for RoleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionGate for RoleStore {
    fn has_permission(&self, username: &str, permission: &str) -> bool {
        let inner = self.inner.read();
        let granted = inner
            .users
            .get(username)
            .and_then(|role| inner.roles.get(role))
            .map(|perms| perms.iter().any(|p| p == permission))
            .unwrap_or(false);
        debug!(username, permission, granted, "permission check");
        granted
    }

    fn current_role(&self, username: &str) -> Option<String> {
        self.inner.read().users.get(username).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_full_permissions() {
        let store = RoleStore::with_default_users();
        assert!(store.has_permission("admin", "manage_users"));
        assert!(store.has_permission("security-admin", "view_logs"));
        assert_eq!(store.current_role("admin").as_deref(), Some("admin"));
    }

    #[test]
    fn viewer_is_read_only() {
        let store = RoleStore::new();
        store.assign_role("alex", "viewer").unwrap();
        assert!(store.has_permission("alex", "read"));
        assert!(!store.has_permission("alex", "write"));
        assert_eq!(store.permissions_of("alex"), vec!["read".to_string()]);
    }

    #[test]
    fn unknown_user_has_nothing() {
        let store = RoleStore::new();
        assert!(!store.has_permission("nobody", "read"));
        assert!(store.current_role("nobody").is_none());
        assert!(store.permissions_of("nobody").is_empty());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let store = RoleStore::new();
        let err = store.assign_role("alex", "superuser").unwrap_err();
        assert!(matches!(err, SecureNetError::Config(_)));
    }

    #[test]
    fn reassignment_replaces_the_role() {
        let store = RoleStore::new();
        store.assign_role("alex", "viewer").unwrap();
        store.assign_role("alex", "analyst").unwrap();
        assert!(store.has_permission("alex", "view_logs"));
    }

    #[test]
    fn session_ledger_tracks_active_sessions() {
        let store = RoleStore::with_default_users();
        let first = store.create_session("admin").unwrap();
        let second = store.create_session("admin").unwrap();
        assert_ne!(first, second);
        assert_eq!(store.active_sessions(), 2);

        assert!(store.end_session(first));
        assert!(!store.end_session(first));
        assert_eq!(store.active_sessions(), 1);
    }

    #[test]
    fn sessions_require_a_known_user() {
        let store = RoleStore::new();
        let err = store.create_session("ghost").unwrap_err();
        assert!(matches!(err, SecureNetError::PermissionDenied(_)));
    }
}
