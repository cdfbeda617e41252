// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rust_decimal::Decimal;
use serde_json::json;

use crate::commands::month_arg;
use crate::dashboard::Dashboard;
use crate::utils::{fmt_amount, maybe_print_json, pretty_table};

pub fn handle(dashboard: &mut Dashboard, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(dashboard, sub)?,
        Some(("daily", sub)) => daily(dashboard, sub)?,
        Some(("history", sub)) => history(dashboard, sub)?,
        Some(("categories", sub)) => categories(dashboard, sub)?,
        _ => {}
    }
    Ok(())
}

fn summary(dashboard: &mut Dashboard, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    dashboard.select_month(month_arg(sub)?);
    let progress = dashboard.budget_progress();
    let view = dashboard.view();
    let payload = json!({
        "month": view.month,
        "income": view.stats.income,
        "expense": view.stats.expense,
        "net": view.stats.net,
        "budget": progress,
    });
    if maybe_print_json(json_flag, jsonl_flag, &payload)? {
        return Ok(());
    }
    println!("{}", view.month.title());
    println!(
        "{}",
        pretty_table(
            &["Income", "Expense", "Net"],
            vec![vec![
                fmt_amount(&view.stats.income),
                fmt_amount(&view.stats.expense),
                fmt_amount(&view.stats.net),
            ]],
        )
    );
    match progress {
        Some(p) => {
            let flag = if p.over_budget { "  OVER BUDGET" } else { "" };
            println!(
                "Budget {} {}% of {}{}",
                p.bar(),
                p.percent,
                fmt_amount(&Decimal::from(p.limit)),
                flag
            );
        }
        None => println!("Budget: not set"),
    }
    Ok(())
}

fn daily(dashboard: &mut Dashboard, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    dashboard.select_month(month_arg(sub)?);
    let view = dashboard.view();
    if !maybe_print_json(json_flag, jsonl_flag, &view.daily)? {
        let rows: Vec<Vec<String>> = view
            .daily
            .iter()
            .map(|b| {
                vec![
                    format!("{:02}", b.day),
                    fmt_amount(&b.income),
                    fmt_amount(&b.expense),
                ]
            })
            .collect();
        println!("{}", view.month.title());
        println!("{}", pretty_table(&["Day", "Income", "Expense"], rows));
    }
    Ok(())
}

fn history(dashboard: &mut Dashboard, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    dashboard.select_month(month_arg(sub)?);
    let view = dashboard.view();
    if !maybe_print_json(json_flag, jsonl_flag, &view.history)? {
        let rows: Vec<Vec<String>> = view
            .history
            .iter()
            .map(|h| {
                vec![
                    h.month.to_string(),
                    fmt_amount(&h.income),
                    fmt_amount(&h.expense),
                    fmt_amount(&h.net),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Month", "Income", "Expense", "Net"], rows)
        );
    }
    Ok(())
}

fn categories(dashboard: &mut Dashboard, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    dashboard.select_month(month_arg(sub)?);
    let view = dashboard.view();
    if !maybe_print_json(json_flag, jsonl_flag, &view.categories)? {
        let rows: Vec<Vec<String>> = view
            .categories
            .iter()
            .map(|c| vec![c.label.clone(), fmt_amount(&c.total), format!("{}%", c.share)])
            .collect();
        println!("{}", view.month.title());
        println!("{}", pretty_table(&["Label", "Spent", "Share"], rows));
    }
    Ok(())
}
