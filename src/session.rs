// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Who is signed in, and which screen that implies.
//!
//! The shell is created once at start-up from the locally persisted session
//! and handed to whatever needs it; there is no global.

use std::sync::mpsc::{channel, Receiver, Sender};

use rusqlite::Connection;

use crate::db::{delete_setting, get_setting, set_setting};
use crate::error::{Result, TrackerError};
use crate::remote::{AuthService, AuthSession};

/// Placeholder domain for the synthetic sign-in address.
pub const ACCOUNT_DOMAIN: &str = "moneytracker.local";

const SESSION_KEY: &str = "session";

/// `" Mg Mg "` becomes `mgmg@moneytracker.local`.
pub fn account_email(username: &str) -> String {
    let clean: String = username
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    format!("{}@{}", clean, ACCOUNT_DOMAIN)
}

/// Emitted on every sign-in/sign-out, and once on subscribe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChange {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Auth,
    Dashboard { display_name: String },
}

/// The signed-in identity handed to session-scoped components.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub session: AuthSession,
}

impl SessionContext {
    pub fn display_name(&self) -> &str {
        &self.session.display_name
    }

    /// Key under which account-local state (the budget) is stored.
    pub fn account(&self) -> &str {
        &self.session.display_name
    }
}

pub struct SessionShell<'a, A: AuthService + ?Sized> {
    auth: &'a A,
    conn: &'a Connection,
    current: Option<AuthSession>,
    listeners: Vec<Sender<SessionChange>>,
}

impl<'a, A: AuthService + ?Sized> SessionShell<'a, A> {
    /// Restores whatever session was persisted by a previous run.
    pub fn start(auth: &'a A, conn: &'a Connection) -> Result<Self> {
        let current = match get_setting(conn, SESSION_KEY)? {
            Some(raw) => match serde_json::from_str::<AuthSession>(&raw) {
                Ok(s) => Some(s),
                Err(e) => {
                    log::warn!("discarding unreadable persisted session: {}", e);
                    delete_setting(conn, SESSION_KEY)?;
                    None
                }
            },
            None => None,
        };
        if let Some(s) = &current {
            log::info!("restored session for {}", s.display_name);
        }
        Ok(SessionShell {
            auth,
            conn,
            current,
            listeners: Vec::new(),
        })
    }

    pub fn subscribe(&mut self) -> Receiver<SessionChange> {
        let (tx, rx) = channel();
        let _ = tx.send(self.change());
        self.listeners.push(tx);
        rx
    }

    fn change(&self) -> SessionChange {
        SessionChange {
            display_name: self.current.as_ref().map(|s| s.display_name.clone()),
        }
    }

    fn notify(&mut self) {
        let change = self.change();
        self.listeners.retain(|l| l.send(change.clone()).is_ok());
    }

    fn establish(&mut self, session: AuthSession) -> Result<()> {
        set_setting(self.conn, SESSION_KEY, &serde_json::to_string(&session)?)?;
        log::info!("signed in as {}", session.display_name);
        self.current = Some(session);
        self.notify();
        Ok(())
    }

    /// Returns the resulting screen: the dashboard when the service issued a
    /// session straight away, otherwise the auth screen for a sign-in.
    pub fn sign_up(&mut self, username: &str, password: &str) -> Result<Screen> {
        validate_credentials(username, password)?;
        let email = account_email(username);
        match self.auth.sign_up(&email, password, username.trim())? {
            Some(session) => self.establish(session)?,
            None => log::info!("account {} created without a session", email),
        }
        Ok(self.screen())
    }

    pub fn sign_in(&mut self, username: &str, password: &str) -> Result<Screen> {
        validate_credentials(username, password)?;
        let session = self.auth.sign_in(&account_email(username), password)?;
        self.establish(session)?;
        Ok(self.screen())
    }

    /// The local session is dropped even if the service call fails.
    pub fn sign_out(&mut self) -> Result<()> {
        if let Some(session) = self.current.take() {
            if let Err(e) = self.auth.sign_out(&session) {
                log::warn!("remote sign-out failed: {}", e);
            }
        }
        delete_setting(self.conn, SESSION_KEY)?;
        self.notify();
        Ok(())
    }

    pub fn screen(&self) -> Screen {
        match &self.current {
            Some(s) => Screen::Dashboard {
                display_name: s.display_name.clone(),
            },
            None => Screen::Auth,
        }
    }

    pub fn context(&self) -> Option<SessionContext> {
        self.current.clone().map(|session| SessionContext { session })
    }

    pub fn require(&self) -> Result<SessionContext> {
        self.context().ok_or_else(|| {
            TrackerError::Auth("Not signed in. Run `moneytracker login` first.".into())
        })
    }
}

fn validate_credentials(username: &str, password: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(TrackerError::Validation("Username is required".into()));
    }
    if password.is_empty() {
        return Err(TrackerError::Validation("Password is required".into()));
    }
    Ok(())
}
