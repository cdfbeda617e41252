// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use serde::Serialize;

use crate::db::{get_setting, set_setting};
use crate::error::{Result, TrackerError};

pub const DEFAULT_API_BASE: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Settable keys and the environment variables that override them.
pub const KEYS: &[(&str, &str)] = &[
    ("supabase_url", "MONEYTRACKER_SUPABASE_URL"),
    ("supabase_anon_key", "MONEYTRACKER_SUPABASE_ANON_KEY"),
    ("api_base", "MONEYTRACKER_API_BASE"),
    ("http_timeout_secs", "MONEYTRACKER_HTTP_TIMEOUT_SECS"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub api_base: String,
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn load(conn: &Connection) -> Result<Self> {
        Self::resolve(conn, |var| std::env::var(var).ok())
    }

    /// Environment first, then the settings table, then defaults.
    pub fn resolve<F>(conn: &Connection, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| -> Result<Option<String>> {
            let var = KEYS
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| *v)
                .unwrap_or_default();
            if let Some(v) = env(var).filter(|v| !v.trim().is_empty()) {
                return Ok(Some(v.trim().to_string()));
            }
            Ok(get_setting(conn, key)?.filter(|v| !v.trim().is_empty()))
        };

        let http_timeout_secs = match lookup("http_timeout_secs")? {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                TrackerError::Config(format!("Invalid http_timeout_secs '{}'", raw))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Config {
            supabase_url: lookup("supabase_url")?.map(|u| u.trim_end_matches('/').to_string()),
            supabase_anon_key: lookup("supabase_anon_key")?,
            api_base: lookup("api_base")?
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            http_timeout_secs,
        })
    }

    pub fn supabase(&self) -> Result<(&str, &str)> {
        let url = self.supabase_url.as_deref().ok_or_else(|| {
            TrackerError::Config(
                "Supabase URL is missing; set MONEYTRACKER_SUPABASE_URL or run `moneytracker config set supabase_url <url>`".into(),
            )
        })?;
        let key = self.supabase_anon_key.as_deref().ok_or_else(|| {
            TrackerError::Config(
                "Supabase anon key is missing; set MONEYTRACKER_SUPABASE_ANON_KEY or run `moneytracker config set supabase_anon_key <key>`".into(),
            )
        })?;
        Ok((url, key))
    }
}

pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    if !KEYS.iter().any(|(k, _)| *k == key) {
        let known: Vec<&str> = KEYS.iter().map(|(k, _)| *k).collect();
        return Err(TrackerError::Validation(format!(
            "Unknown config key '{}' (use {})",
            key,
            known.join("|")
        )));
    }
    if key == "http_timeout_secs" && value.trim().parse::<u64>().is_err() {
        return Err(TrackerError::Validation(format!(
            "Invalid http_timeout_secs '{}'",
            value
        )));
    }
    set_setting(conn, key, value.trim())
}

/// Shows the first four characters only.
pub fn mask(secret: &str) -> String {
    let head: String = secret.chars().take(4).collect();
    format!("{}****", head)
}
