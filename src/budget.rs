// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Monthly spending limit, one integer per account, kept locally.
//! Read once when a dashboard opens and overwritten on explicit save.

use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::db::{get_setting, set_setting};
use crate::error::{Result, TrackerError};

fn budget_key(account: &str) -> String {
    format!("budget_{}", account)
}

/// Missing or unreadable values count as "not set" (0).
pub fn load_budget(conn: &Connection, account: &str) -> Result<u64> {
    let raw = get_setting(conn, &budget_key(account))?;
    Ok(raw.and_then(|s| s.trim().parse::<u64>().ok()).unwrap_or(0))
}

pub fn save_budget(conn: &Connection, account: &str, limit: u64) -> Result<()> {
    set_setting(conn, &budget_key(account), &limit.to_string())?;
    log::info!("budget for {} set to {}", account, limit);
    Ok(())
}

pub fn parse_budget(input: &str) -> Result<u64> {
    input.trim().parse::<u64>().map_err(|_| {
        TrackerError::Validation(format!(
            "Invalid budget '{}', expected a non-negative whole number",
            input.trim()
        ))
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetProgress {
    pub limit: u64,
    pub spent: Decimal,
    /// 0..=100, two decimals.
    pub percent: Decimal,
    pub over_budget: bool,
}

impl BudgetProgress {
    /// `None` when no limit is set.
    pub fn compute(limit: u64, spent: Decimal) -> Option<Self> {
        if limit == 0 {
            return None;
        }
        let limit_dec = Decimal::from(limit);
        let raw = (spent / limit_dec).saturating_mul(Decimal::ONE_HUNDRED);
        Some(BudgetProgress {
            limit,
            spent,
            percent: raw.min(Decimal::ONE_HUNDRED).round_dp(2),
            over_budget: spent > limit_dec,
        })
    }

    /// Ten-cell text bar, e.g. `[######----]`.
    pub fn bar(&self) -> String {
        let filled = (self.percent / Decimal::TEN)
            .floor()
            .to_usize()
            .unwrap_or(0)
            .min(10);
        format!("[{}{}]", "#".repeat(filled), "-".repeat(10 - filled))
    }
}
