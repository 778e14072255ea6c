//! Login flag handling and the guard in front of the task list.
//!
//! The login check is a placeholder against a fixed credential pair. Nothing
//! here authenticates anyone; it only decides which view a visitor lands on.

use crate::storage::{KeyValueStore, StorageError};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const LOGGED_IN_KEY: &str = "loggedIn";
pub const TOKEN_KEY: &str = "token";

const LOGGED_IN_VALUE: &str = "true";
const FIXED_USER: &str = "admin";
const FIXED_PASSWORD: &str = "123";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Incorrect username or password")]
    InvalidCredentials,
    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Stay,
    RedirectTo(View),
}

/// Login state kept in an injected key-value store.
pub struct Session<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// A missing flag, any value other than `"true"`, or an unreadable store
    /// all count as logged out.
    pub fn is_logged_in(&self) -> bool {
        match self.store.get(LOGGED_IN_KEY) {
            Ok(flag) => flag.as_deref() == Some(LOGGED_IN_VALUE),
            Err(e) => {
                warn!(error = %e, "could not read session, treating as logged out");
                false
            }
        }
    }

    pub fn login(&self, user: &str, password: &str) -> Result<View, SessionError> {
        if user != FIXED_USER || password != FIXED_PASSWORD {
            debug!(user, "rejected login");
            return Err(SessionError::InvalidCredentials);
        }
        self.store.set(LOGGED_IN_KEY, LOGGED_IN_VALUE)?;
        info!(user, "logged in");
        Ok(View::Main)
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        self.store.remove(LOGGED_IN_KEY)?;
        self.store.remove(TOKEN_KEY)?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }
}

/// Keeps logged-out visitors on the login view.
pub struct SessionGuard<'a, S: KeyValueStore> {
    session: &'a Session<S>,
}

impl<'a, S: KeyValueStore> SessionGuard<'a, S> {
    pub fn new(session: &'a Session<S>) -> Self {
        Self { session }
    }

    pub fn check(&self, current: View) -> Navigation {
        if current == View::Login || self.session.is_logged_in() {
            return Navigation::Stay;
        }
        debug!(?current, "not logged in, redirecting to login");
        Navigation::RedirectTo(View::Login)
    }

    pub fn logout(&self) -> Result<Navigation, SessionError> {
        self.session.clear()?;
        info!("logged out");
        Ok(Navigation::RedirectTo(View::Login))
    }
}
