// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Hosted auth and transaction table (Supabase: GoTrue + PostgREST).
//!
//! The rest of the crate only sees [`AuthService`] and [`TransactionStore`];
//! row-level security on the server scopes every call to the signed-in
//! account.

use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{Result, TrackerError};
use crate::models::{
    is_valid_amount, parse_iso_date, NewTransaction, Transaction, TransactionKind,
};
use crate::utils::http_client;

const TABLE: &str = "transactions";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user_id: String,
    pub display_name: String,
}

pub trait AuthService {
    /// `Ok(None)` when the account was created but no session was issued.
    fn sign_up(&self, email: &str, password: &str, display_name: &str)
    -> Result<Option<AuthSession>>;
    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;
    fn sign_out(&self, session: &AuthSession) -> Result<()>;
}

pub trait TransactionStore {
    /// All rows of the account, date ascending.
    fn list_all(&self) -> Result<Vec<Transaction>>;
    fn insert(&self, tx: &NewTransaction) -> Result<Transaction>;
    /// Single request; the store accepts all rows or none.
    fn insert_batch(&self, txs: &[NewTransaction]) -> Result<Vec<Transaction>>;
    fn update(&self, tx: &Transaction) -> Result<()>;
    fn delete(&self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: String,
    anon_key: String,
    session: Option<AuthSession>,
}

impl SupabaseClient {
    pub fn new(config: &Config) -> Result<Self> {
        let (url, key) = config.supabase()?;
        Ok(SupabaseClient {
            http: http_client(config.http_timeout_secs)?,
            base_url: url.to_string(),
            anon_key: key.to_string(),
            session: None,
        })
    }

    pub fn with_session(mut self, session: AuthSession) -> Self {
        self.session = Some(session);
        self
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let token = self
            .session
            .as_ref()
            .map(|s| s.access_token.as_str())
            .unwrap_or(&self.anon_key);
        log::debug!("{} {}", method, url);
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, TABLE)
    }

    fn session(&self) -> Result<&AuthSession> {
        self.session.as_ref().ok_or_else(|| {
            TrackerError::Auth("User session not found. Please login again.".into())
        })
    }

    fn insert_rows(&self, txs: &[NewTransaction]) -> Result<Vec<Transaction>> {
        let session = self.session()?;
        let body: Vec<InsertRow<'_>> = txs
            .iter()
            .map(|tx| InsertRow {
                user_id: &session.user_id,
                tx,
            })
            .collect();
        let resp = self
            .request(Method::POST, self.table_url())
            .header("Prefer", "return=representation")
            .json(&body)
            .send()?;
        let values: Vec<Value> = store_result(resp)?.json()?;
        let rows = decode_rows(values);
        if rows.len() != txs.len() {
            return Err(TrackerError::Persistence(format!(
                "Store returned {} of {} inserted rows",
                rows.len(),
                txs.len()
            )));
        }
        Ok(rows)
    }
}

#[derive(Serialize)]
struct InsertRow<'a> {
    user_id: &'a str,
    #[serde(flatten)]
    tx: &'a NewTransaction,
}

#[derive(Deserialize)]
struct StoredRow {
    id: Value,
    amount: Decimal,
    label: String,
    date: String,
    #[serde(rename = "type")]
    kind: TransactionKind,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

impl TryFrom<StoredRow> for Transaction {
    type Error = String;

    fn try_from(row: StoredRow) -> std::result::Result<Self, Self::Error> {
        let id = match row.id {
            Value::String(s) if !s.is_empty() => s,
            Value::Number(n) => n.to_string(),
            other => return Err(format!("unusable id {}", other)),
        };
        let date = parse_iso_date(&row.date)
            .ok_or_else(|| format!("row {} has malformed date '{}'", id, row.date))?;
        if !is_valid_amount(&row.amount) {
            return Err(format!("row {} has out-of-range amount {}", id, row.amount));
        }
        Ok(Transaction {
            id,
            amount: row.amount,
            label: row.label,
            date,
            kind: row.kind,
            created_at: row.created_at,
            user_id: row.user_id,
        })
    }
}

/// Converts store rows, skipping (and logging) any that do not parse.
pub fn decode_rows(values: Vec<Value>) -> Vec<Transaction> {
    let mut out = Vec::with_capacity(values.len());
    let mut skipped = 0usize;
    for v in values {
        let parsed = serde_json::from_value::<StoredRow>(v)
            .map_err(|e| e.to_string())
            .and_then(Transaction::try_from);
        match parsed {
            Ok(t) => out.push(t),
            Err(e) => {
                skipped += 1;
                log::warn!("skipping transaction row: {}", e);
            }
        }
    }
    if skipped > 0 {
        log::warn!("{} malformed transaction rows ignored", skipped);
    }
    out
}

/// Pulls the human-readable message out of a GoTrue/PostgREST error body.
fn error_message(resp: Response) -> String {
    let status = resp.status();
    let body: Value = resp.json().unwrap_or(Value::Null);
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {}", status))
}

fn auth_result(resp: Response) -> Result<Response> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(TrackerError::Auth(error_message(resp)))
    }
}

fn store_result(resp: Response) -> Result<Response> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(TrackerError::Persistence(error_message(resp)))
    }
}

/// Reads a GoTrue session payload; `None` when it carries no token.
pub fn session_from_auth_payload(body: &Value) -> Option<AuthSession> {
    let token = body.get("access_token")?.as_str()?;
    let user = body.get("user")?;
    let user_id = user.get("id")?.as_str()?;
    let display_name = user
        .get("user_metadata")
        .and_then(|m| m.get("display_name"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("User");
    Some(AuthSession {
        access_token: token.to_string(),
        user_id: user_id.to_string(),
        display_name: display_name.to_string(),
    })
}

impl AuthService for SupabaseClient {
    fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Option<AuthSession>> {
        let resp = self
            .request(Method::POST, self.auth_url("signup"))
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "display_name": display_name },
            }))
            .send()?;
        let body: Value = auth_result(resp)?.json()?;
        Ok(session_from_auth_payload(&body))
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let resp = self
            .request(Method::POST, self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()?;
        let body: Value = auth_result(resp)?.json()?;
        session_from_auth_payload(&body)
            .ok_or_else(|| TrackerError::Auth("Sign-in response carried no session".into()))
    }

    fn sign_out(&self, session: &AuthSession) -> Result<()> {
        let resp = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()?;
        auth_result(resp)?;
        Ok(())
    }
}

impl TransactionStore for SupabaseClient {
    fn list_all(&self) -> Result<Vec<Transaction>> {
        let resp = self
            .request(Method::GET, self.table_url())
            .query(&[("select", "*"), ("order", "date.asc")])
            .send()?;
        let values: Vec<Value> = store_result(resp)?.json()?;
        Ok(decode_rows(values))
    }

    fn insert(&self, tx: &NewTransaction) -> Result<Transaction> {
        self.insert_rows(std::slice::from_ref(tx))?
            .pop()
            .ok_or_else(|| TrackerError::Persistence("Store returned no row".into()))
    }

    fn insert_batch(&self, txs: &[NewTransaction]) -> Result<Vec<Transaction>> {
        if txs.is_empty() {
            return Ok(Vec::new());
        }
        self.insert_rows(txs)
    }

    fn update(&self, tx: &Transaction) -> Result<()> {
        let resp = self
            .request(Method::PATCH, self.table_url())
            .query(&[("id", format!("eq.{}", tx.id))])
            .header("Prefer", "return=representation")
            .json(&json!({
                "amount": tx.amount,
                "label": tx.label,
                "date": tx.date,
                "type": tx.kind,
            }))
            .send()?;
        let values: Vec<Value> = store_result(resp)?.json()?;
        if values.is_empty() {
            return Err(TrackerError::Persistence(format!(
                "Transaction {} not found",
                tx.id
            )));
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<()> {
        let resp = self
            .request(Method::DELETE, self.table_url())
            .query(&[("id", format!("eq.{}", id))])
            .send()?;
        store_result(resp)?;
        Ok(())
    }
}
