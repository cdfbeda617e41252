// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use moneytracker::ai::{AudioClip, TransactionParser, Transcriber};
use moneytracker::error::{Result, TrackerError};
use moneytracker::models::{
    NewTransaction, ParsedVoiceTransaction, Transaction, TransactionKind,
};
use moneytracker::remote::{AuthService, AuthSession, TransactionStore};
use moneytracker::session::SessionContext;
use moneytracker::voice::{AudioSource, AudioStream};
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn tx(id: &str, d: &str, label: &str, amount: i64, kind: TransactionKind) -> Transaction {
    Transaction {
        id: id.to_string(),
        amount: Decimal::from(amount),
        label: label.to_string(),
        date: date(d),
        kind,
        created_at: None,
        user_id: Some("u1".into()),
    }
}

pub fn expense(id: &str, d: &str, label: &str, amount: i64) -> Transaction {
    tx(id, d, label, amount, TransactionKind::Expense)
}

pub fn income(id: &str, d: &str, label: &str, amount: i64) -> Transaction {
    tx(id, d, label, amount, TransactionKind::Income)
}

pub fn context(name: &str) -> SessionContext {
    SessionContext {
        session: AuthSession {
            access_token: "token".into(),
            user_id: "u1".into(),
            display_name: name.into(),
        },
    }
}

pub fn conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    moneytracker::db::init_schema(&conn).unwrap();
    conn
}

/// Transaction table kept in memory; `fail` makes every mutation error out.
#[derive(Default)]
pub struct MemoryStore {
    pub rows: RefCell<Vec<Transaction>>,
    pub next_id: Cell<u64>,
    pub fail: Cell<bool>,
}

impl MemoryStore {
    pub fn with_rows(rows: Vec<Transaction>) -> Self {
        let store = MemoryStore::default();
        store.next_id.set(rows.len() as u64 + 100);
        *store.rows.borrow_mut() = rows;
        store
    }

    fn check(&self) -> Result<()> {
        if self.fail.get() {
            Err(TrackerError::Persistence("database is unavailable".into()))
        } else {
            Ok(())
        }
    }

    fn materialize(&self, new_tx: &NewTransaction) -> Transaction {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        Transaction {
            id: format!("id-{}", id),
            amount: new_tx.amount,
            label: new_tx.label.clone(),
            date: new_tx.date,
            kind: new_tx.kind,
            created_at: Some(format!("2024-01-01T00:00:{:02}Z", id % 60)),
            user_id: Some("u1".into()),
        }
    }
}

impl TransactionStore for MemoryStore {
    fn list_all(&self) -> Result<Vec<Transaction>> {
        let mut rows = self.rows.borrow().clone();
        rows.sort_by_key(|t| t.date);
        Ok(rows)
    }

    fn insert(&self, new_tx: &NewTransaction) -> Result<Transaction> {
        self.check()?;
        let row = self.materialize(new_tx);
        self.rows.borrow_mut().push(row.clone());
        Ok(row)
    }

    fn insert_batch(&self, txs: &[NewTransaction]) -> Result<Vec<Transaction>> {
        self.check()?;
        let created: Vec<Transaction> = txs.iter().map(|t| self.materialize(t)).collect();
        self.rows.borrow_mut().extend(created.iter().cloned());
        Ok(created)
    }

    fn update(&self, updated: &Transaction) -> Result<()> {
        self.check()?;
        let mut rows = self.rows.borrow_mut();
        match rows.iter_mut().find(|t| t.id == updated.id) {
            Some(slot) => {
                *slot = updated.clone();
                Ok(())
            }
            None => Err(TrackerError::Persistence(format!(
                "Transaction {} not found",
                updated.id
            ))),
        }
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.check()?;
        self.rows.borrow_mut().retain(|t| t.id != id);
        Ok(())
    }
}

/// Accounts keyed by email; `autoconfirm` decides whether sign-up yields a session.
#[derive(Default)]
pub struct FakeAuth {
    pub users: RefCell<HashMap<String, (String, String)>>,
    pub autoconfirm: bool,
    pub sign_outs: Cell<usize>,
}

impl FakeAuth {
    fn session_for(email: &str, display_name: &str) -> AuthSession {
        AuthSession {
            access_token: format!("token-{}", email),
            user_id: format!("uid-{}", email),
            display_name: display_name.to_string(),
        }
    }
}

impl AuthService for FakeAuth {
    fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Option<AuthSession>> {
        let mut users = self.users.borrow_mut();
        if users.contains_key(email) {
            return Err(TrackerError::Auth("User already registered".into()));
        }
        users.insert(
            email.to_string(),
            (password.to_string(), display_name.to_string()),
        );
        Ok(self
            .autoconfirm
            .then(|| Self::session_for(email, display_name)))
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        match self.users.borrow().get(email) {
            Some((pw, name)) if pw == password => Ok(Self::session_for(email, name)),
            _ => Err(TrackerError::Auth("Invalid login credentials".into())),
        }
    }

    fn sign_out(&self, _session: &AuthSession) -> Result<()> {
        self.sign_outs.set(self.sign_outs.get() + 1);
        Ok(())
    }
}

/// Canned transcription and parsing results plus call counters.
pub struct FakeVoiceApi {
    pub transcript: std::result::Result<String, String>,
    pub parsed: std::result::Result<Vec<ParsedVoiceTransaction>, String>,
    pub transcribe_calls: AtomicUsize,
    pub parse_calls: AtomicUsize,
    pub last_mime: std::sync::Mutex<Option<String>>,
}

impl FakeVoiceApi {
    pub fn new(
        transcript: std::result::Result<String, String>,
        parsed: std::result::Result<Vec<ParsedVoiceTransaction>, String>,
    ) -> Self {
        FakeVoiceApi {
            transcript,
            parsed,
            transcribe_calls: AtomicUsize::new(0),
            parse_calls: AtomicUsize::new(0),
            last_mime: std::sync::Mutex::new(None),
        }
    }
}

impl Transcriber for FakeVoiceApi {
    fn transcribe(&self, clip: &AudioClip) -> Result<String> {
        self.transcribe_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_mime.lock().unwrap() = Some(clip.mime_type.clone());
        self.transcript.clone().map_err(TrackerError::Pipeline)
    }
}

impl TransactionParser for FakeVoiceApi {
    fn parse(&self, _text: &str) -> Result<Vec<ParsedVoiceTransaction>> {
        self.parse_calls.fetch_add(1, Ordering::SeqCst);
        self.parsed.clone().map_err(TrackerError::Pipeline)
    }
}

pub fn parsed(
    label: &str,
    amount: i64,
    kind: TransactionKind,
    category: &str,
) -> ParsedVoiceTransaction {
    ParsedVoiceTransaction {
        label: label.into(),
        amount: Decimal::from(amount),
        kind,
        category: category.into(),
    }
}

/// Microphone stand-in that yields fixed chunks, or refuses to open.
pub struct MemoryAudio {
    pub chunks: Vec<Vec<u8>>,
    pub deny: bool,
    pub released: Arc<AtomicBool>,
}

impl MemoryAudio {
    pub fn with_chunks(chunks: Vec<Vec<u8>>) -> Self {
        MemoryAudio {
            chunks,
            deny: false,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn denied() -> Self {
        MemoryAudio {
            chunks: Vec::new(),
            deny: true,
            released: Arc::new(AtomicBool::new(false)),
        }
    }
}

pub struct MemoryStream {
    chunks: std::vec::IntoIter<Vec<u8>>,
    released: Arc<AtomicBool>,
}

impl AudioSource for MemoryAudio {
    type Stream = MemoryStream;

    fn open(&mut self) -> Result<MemoryStream> {
        if self.deny {
            return Err(TrackerError::Device("Permission denied".into()));
        }
        Ok(MemoryStream {
            chunks: self.chunks.clone().into_iter(),
            released: Arc::clone(&self.released),
        })
    }
}

impl AudioStream for MemoryStream {
    fn mime_type(&self) -> &str {
        "audio/webm"
    }

    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.chunks.next())
    }

    fn close(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}
