//! SecureNet Auth - role-based permission gate
//!
//! Key-value user → role → permission lookups plus a session ledger. The
//! scanning and monitoring core consults this through the `PermissionGate`
//! trait and never mutates it.

pub mod store;

pub use store::{RoleStore, Session, DEFAULT_ADMIN_USERS};
