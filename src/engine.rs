// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Derived views over the in-memory transaction list.
//!
//! Every function here is pure: same inputs, same output. The dashboard
//! re-invokes them on demand and [`ViewCache`] memoizes the full set of views
//! by input equality.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::TrackerError;
use crate::models::{MonthKey, Transaction, TransactionKind};
use crate::utils::amount_string;

/// Trailing history never shows more than this many months.
pub const HISTORY_MONTHS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Date,
    Label,
    Amount,
}

impl FromStr for SortKey {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "label" => Ok(SortKey::Label),
            "amount" => Ok(SortKey::Amount),
            other => Err(TrackerError::Validation(format!(
                "Invalid sort key '{}', expected date|label|amount",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(TrackerError::Validation(format!(
                "Invalid sort order '{}', expected asc|desc",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    /// Newest first.
    fn default() -> Self {
        SortConfig {
            key: SortKey::Date,
            direction: SortDirection::Desc,
        }
    }
}

impl SortConfig {
    /// Selecting the active key flips the direction; a new key starts ascending.
    pub fn toggle(self, key: SortKey) -> Self {
        if self.key == key {
            SortConfig {
                key,
                direction: self.direction.flipped(),
            }
        } else {
            SortConfig {
                key,
                direction: SortDirection::Asc,
            }
        }
    }
}

/// User-controlled filter state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewQuery {
    pub month: MonthKey,
    pub search: String,
    pub sort: SortConfig,
}

impl ViewQuery {
    pub fn for_month(month: MonthKey) -> Self {
        ViewQuery {
            month,
            search: String::new(),
            sort: SortConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MonthlyStats {
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

impl MonthlyStats {
    fn add(&mut self, kind: TransactionKind, amount: Decimal) {
        match kind {
            TransactionKind::Income => self.income = self.income.saturating_add(amount),
            TransactionKind::Expense => self.expense = self.expense.saturating_add(amount),
        }
        self.net = self.net.saturating_add(kind.signed(amount));
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub day: u32,
    pub income: Decimal,
    pub expense: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    pub month: MonthKey,
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub label: String,
    pub total: Decimal,
    /// Share of the month's expense total, 0..=100, two decimals.
    pub share: Decimal,
}

/// Everything the dashboard renders for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub month: MonthKey,
    pub visible: Vec<Transaction>,
    pub stats: MonthlyStats,
    pub daily: Vec<DayBucket>,
    pub history: Vec<MonthSummary>,
    pub categories: Vec<CategoryTotal>,
}

impl DashboardView {
    pub fn compute(transactions: &[Transaction], query: &ViewQuery) -> Self {
        DashboardView {
            month: query.month,
            visible: filter_and_sort(transactions, query),
            stats: monthly_stats(transactions, query.month),
            daily: daily_series(transactions, query.month),
            history: history_summaries(transactions, query.month),
            categories: category_breakdown(transactions, query.month),
        }
    }
}

pub fn month_filter(transactions: &[Transaction], month: MonthKey) -> Vec<&Transaction> {
    transactions
        .iter()
        .filter(|t| month.contains(t.date))
        .collect()
}

/// Case-insensitive substring match on the label or the plain amount text.
pub fn matches_search(t: &Transaction, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let q = search.to_lowercase();
    t.label.to_lowercase().contains(&q) || amount_string(&t.amount).contains(&q)
}

fn compare(a: &Transaction, b: &Transaction, key: SortKey) -> Ordering {
    match key {
        SortKey::Date => match a.date.cmp(&b.date) {
            Ordering::Equal => match (&a.created_at, &b.created_at) {
                (Some(ca), Some(cb)) => ca.cmp(cb),
                _ => Ordering::Equal,
            },
            other => other,
        },
        SortKey::Label => a.label.to_lowercase().cmp(&b.label.to_lowercase()),
        SortKey::Amount => a.amount.cmp(&b.amount),
    }
}

pub fn sort_transactions(rows: &mut [Transaction], sort: SortConfig) {
    // stable: ties keep list order across re-renders
    rows.sort_by(|a, b| {
        let ord = compare(a, b, sort.key);
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

/// Month filter, then search, then sort.
pub fn filter_and_sort(transactions: &[Transaction], query: &ViewQuery) -> Vec<Transaction> {
    let mut rows: Vec<Transaction> = month_filter(transactions, query.month)
        .into_iter()
        .filter(|t| matches_search(t, &query.search))
        .cloned()
        .collect();
    sort_transactions(&mut rows, query.sort);
    rows
}

/// Totals over the month only; search never narrows them. Sums saturate at
/// `Decimal::MAX` rather than overflow.
pub fn monthly_stats(transactions: &[Transaction], month: MonthKey) -> MonthlyStats {
    let mut stats = MonthlyStats::default();
    for t in month_filter(transactions, month) {
        stats.add(t.kind, t.amount);
    }
    stats
}

/// One bucket per calendar day of `month`, day 1 first, zero-filled.
pub fn daily_series(transactions: &[Transaction], month: MonthKey) -> Vec<DayBucket> {
    let mut buckets: Vec<DayBucket> = (1..=month.days_in_month())
        .map(|day| DayBucket {
            day,
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
        })
        .collect();
    for t in month_filter(transactions, month) {
        let idx = t.date.day() as usize - 1;
        if let Some(bucket) = buckets.get_mut(idx) {
            let slot = match t.kind {
                TransactionKind::Income => &mut bucket.income,
                TransactionKind::Expense => &mut bucket.expense,
            };
            *slot = slot.saturating_add(t.amount);
        }
    }
    buckets
}

/// Every other month, most recent first, capped at [`HISTORY_MONTHS`].
pub fn history_summaries(transactions: &[Transaction], selected: MonthKey) -> Vec<MonthSummary> {
    let mut map: BTreeMap<MonthKey, MonthlyStats> = BTreeMap::new();
    for t in transactions {
        let key = t.month_key();
        if key == selected {
            continue;
        }
        map.entry(key).or_default().add(t.kind, t.amount);
    }
    map.into_iter()
        .rev()
        .take(HISTORY_MONTHS)
        .map(|(month, s)| MonthSummary {
            month,
            income: s.income,
            expense: s.expense,
            net: s.net,
        })
        .collect()
}

/// Expense totals per label for the month, largest first.
pub fn category_breakdown(transactions: &[Transaction], month: MonthKey) -> Vec<CategoryTotal> {
    let mut agg: HashMap<&str, Decimal> = HashMap::new();
    let mut total = Decimal::ZERO;
    for t in month_filter(transactions, month) {
        if t.kind == TransactionKind::Expense {
            let slot = agg.entry(t.label.as_str()).or_insert(Decimal::ZERO);
            *slot = slot.saturating_add(t.amount);
            total = total.saturating_add(t.amount);
        }
    }
    let mut items: Vec<CategoryTotal> = agg
        .into_iter()
        .map(|(label, amt)| CategoryTotal {
            label: label.to_string(),
            total: amt,
            share: if total.is_zero() {
                Decimal::ZERO
            } else {
                (amt / total)
                    .saturating_mul(Decimal::ONE_HUNDRED)
                    .min(Decimal::ONE_HUNDRED)
                    .round_dp(2)
            },
        })
        .collect();
    items.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.label.cmp(&b.label)));
    items
}

/// Memoizes [`DashboardView`] by (list revision, query). The owner bumps the
/// revision on every list mutation.
#[derive(Debug, Default)]
pub struct ViewCache {
    key: Option<(u64, ViewQuery)>,
    view: Option<DashboardView>,
}

impl ViewCache {
    pub fn get_or_compute(
        &mut self,
        revision: u64,
        transactions: &[Transaction],
        query: &ViewQuery,
    ) -> &DashboardView {
        let fresh = matches!(&self.key, Some((rev, q)) if *rev == revision && q == query);
        if !fresh {
            log::debug!("recomputing dashboard view for {} (rev {})", query.month, revision);
            self.key = Some((revision, query.clone()));
            self.view = Some(DashboardView::compute(transactions, query));
        }
        self.view
            .get_or_insert_with(|| DashboardView::compute(transactions, query))
    }

    pub fn invalidate(&mut self) {
        self.key = None;
        self.view = None;
    }

    pub fn is_warm(&self) -> bool {
        self.view.is_some()
    }
}
