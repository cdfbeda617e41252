// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Session-scoped owner of the transaction list.
//!
//! The list is loaded once per session and only mutated here, after the
//! store has confirmed the change. Derived views come from [`crate::engine`].

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::budget::{load_budget, parse_budget, save_budget, BudgetProgress};
use crate::engine::{DashboardView, SortConfig, SortKey, ViewCache, ViewQuery};
use crate::error::Result;
use crate::models::{MonthKey, Transaction};
use crate::remote::TransactionStore;
use crate::session::SessionContext;
use crate::voice::ReviewBatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient notification shown after a save, update, delete or batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

pub struct Dashboard {
    context: SessionContext,
    transactions: Vec<Transaction>,
    query: ViewQuery,
    budget_limit: u64,
    revision: u64,
    cache: ViewCache,
}

impl Dashboard {
    /// Current month selected, newest first.
    pub fn new(context: SessionContext, transactions: Vec<Transaction>, budget_limit: u64) -> Self {
        Dashboard {
            context,
            transactions,
            query: ViewQuery::for_month(MonthKey::current()),
            budget_limit,
            revision: 0,
            cache: ViewCache::default(),
        }
    }

    /// Reads the local budget, then loads the full list from the store.
    pub fn open<S: TransactionStore + ?Sized>(
        context: SessionContext,
        store: &S,
        conn: &Connection,
    ) -> Result<Self> {
        let budget_limit = load_budget(conn, context.account())?;
        let transactions = store.list_all()?;
        log::info!(
            "loaded {} transactions for {}",
            transactions.len(),
            context.display_name()
        );
        Ok(Self::new(context, transactions, budget_limit))
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn find(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn select_month(&mut self, month: MonthKey) {
        self.query.month = month;
    }

    pub fn back_to_current_month(&mut self) {
        self.query.month = MonthKey::current();
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
    }

    pub fn set_sort(&mut self, sort: SortConfig) {
        self.query.sort = sort;
    }

    pub fn toggle_sort(&mut self, key: SortKey) {
        self.query.sort = self.query.sort.toggle(key);
    }

    pub fn view(&mut self) -> &DashboardView {
        self.cache
            .get_or_compute(self.revision, &self.transactions, &self.query)
    }

    pub fn budget_limit(&self) -> u64 {
        self.budget_limit
    }

    /// Against the selected month's expense total.
    pub fn budget_progress(&mut self) -> Option<BudgetProgress> {
        let spent = self.view().stats.expense;
        BudgetProgress::compute(self.budget_limit, spent)
    }

    pub fn save_budget(&mut self, conn: &Connection, input: &str) -> Result<Notice> {
        let limit = parse_budget(input)?;
        save_budget(conn, self.context.account(), limit)?;
        self.budget_limit = limit;
        Ok(Notice::success("Budget saved"))
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.cache.invalidate();
    }

    pub fn apply_created(&mut self, tx: Transaction) {
        self.transactions.push(tx);
        self.touch();
    }

    pub fn apply_created_batch(&mut self, txs: Vec<Transaction>) {
        self.transactions.extend(txs);
        self.touch();
    }

    /// Replaces the row with the same id; false if none matched.
    pub fn apply_updated(&mut self, tx: Transaction) -> bool {
        match self.transactions.iter_mut().find(|t| t.id == tx.id) {
            Some(slot) => {
                *slot = tx;
                self.touch();
                true
            }
            None => false,
        }
    }

    pub fn apply_removed(&mut self, id: &str) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id != id);
        let removed = self.transactions.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    pub fn delete<S: TransactionStore + ?Sized>(&mut self, store: &S, id: &str) -> Notice {
        if self.find(id).is_none() {
            return Notice::error(format!("Transaction {} not found", id));
        }
        match store.delete(id) {
            Ok(()) => {
                self.apply_removed(id);
                Notice::success("Transaction deleted")
            }
            Err(e) => Notice::error(format!("Could not delete: {}", e)),
        }
    }

    /// Creates every reviewed entry in one store call; on failure nothing is
    /// added to the list.
    pub fn confirm_voice_batch<S: TransactionStore + ?Sized>(
        &mut self,
        store: &S,
        batch: ReviewBatch,
        today: NaiveDate,
    ) -> Notice {
        let requests = batch.confirm(today);
        let count = requests.len();
        match store.insert_batch(&requests) {
            Ok(created) => {
                self.apply_created_batch(created);
                Notice::success(format!("Saved {} transactions", count))
            }
            Err(e) => Notice::error(format!("Could not save transactions: {}", e)),
        }
    }
}
