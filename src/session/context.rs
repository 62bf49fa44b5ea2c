use anyhow::Result;
use tracing::info;

use super::{Role, Session, SessionStore};

/// The current session together with the store backing it.
pub struct SessionContext<S: SessionStore> {
    store: S,
    current: Option<Session>,
}

impl<S: SessionStore> SessionContext<S> {
    /// Opens a context, restoring whatever session `store` has saved.
    pub fn init(store: S) -> Result<Self> {
        let current = store.load()?;
        Ok(Self { store, current })
    }

    pub fn login(&mut self, user_id: &str, user_name: &str, role: Role) -> Result<&Session> {
        let session = Session::new(user_id, user_name, role);
        self.store.save(&session)?;
        info!(user_id, %role, "Logged in");
        Ok(self.current.insert(session))
    }

    /// Forgets the session, in memory and in the store.
    pub fn logout(&mut self) -> Result<()> {
        self.store.clear()?;
        if let Some(session) = self.current.take() {
            info!(user_id = %session.user_id, "Logged out");
        }
        Ok(())
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.current.as_ref().map(|s| s.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Tears the context down, handing back the store.
    pub fn into_store(self) -> S {
        self.store
    }
}
