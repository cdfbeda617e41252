// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::commands::report_notice;
use crate::dashboard::Dashboard;
use crate::utils::{fmt_amount, pretty_table};

pub fn handle(conn: &Connection, dashboard: &mut Dashboard, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, dashboard, sub)?,
        Some(("show", _)) => show(dashboard),
        _ => {}
    }
    Ok(())
}

fn set(conn: &Connection, dashboard: &mut Dashboard, sub: &clap::ArgMatches) -> Result<()> {
    let raw = sub.get_one::<String>("amount").context("--amount is required")?;
    let notice = dashboard.save_budget(conn, raw)?;
    report_notice(notice)?;
    show(dashboard);
    Ok(())
}

fn show(dashboard: &mut Dashboard) {
    dashboard.back_to_current_month();
    let limit = dashboard.budget_limit();
    let month = dashboard.query().month;
    let row = match dashboard.budget_progress() {
        Some(p) => vec![
            month.to_string(),
            fmt_amount(&Decimal::from(limit)),
            fmt_amount(&p.spent),
            format!("{} {}%", p.bar(), p.percent),
            if p.over_budget { "over".into() } else { "ok".into() },
        ],
        None => vec![
            month.to_string(),
            "not set".into(),
            fmt_amount(&dashboard.view().stats.expense),
            "-".into(),
            "-".into(),
        ],
    };
    println!(
        "{}",
        pretty_table(&["Month", "Limit", "Spent", "Progress", "Status"], vec![row])
    );
}
