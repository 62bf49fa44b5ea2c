//! Logged-in identity, kept behind an explicit store.
//!
//! [`SessionStore`] persists at most one [`Session`]. [`FileSessionStore`]
//! writes it as JSON on disk, [`MemorySessionStore`] keeps it in memory.
//! [`SessionContext`] is what callers hold: it is initialised from a store and
//! torn down with [`SessionContext::logout`].

mod context;
mod file;
mod memory;

pub use context::SessionContext;
pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which portal a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Principal,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => f.write_str("student"),
            Role::Principal => f.write_str("principal"),
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "principal" => Ok(Role::Principal),
            other => Err(anyhow::anyhow!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub user_name: String,
    pub role: Role,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: &str, user_name: &str, role: Role) -> Self {
        Self {
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            role,
            logged_in_at: Utc::now(),
        }
    }
}

/// Persistence for the current session.
pub trait SessionStore {
    /// Returns the saved session, if any.
    fn load(&self) -> Result<Option<Session>>;
    fn save(&self, session: &Session) -> Result<()>;
    /// Removes any saved session. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;
}
