// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Context, Result};

use crate::commands::{month_arg, report_notice};
use crate::dashboard::Dashboard;
use crate::editor::TransactionEditor;
use crate::engine::{SortConfig, SortDirection, SortKey, ViewQuery};
use crate::models::{TransactionKind, CATEGORIES};
use crate::remote::TransactionStore;
use crate::utils::{confirm, fmt_amount, fmt_date_display, maybe_print_json, pretty_table, today};

pub fn handle<S: TransactionStore + ?Sized>(
    dashboard: &mut Dashboard,
    store: &S,
    m: &clap::ArgMatches,
) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(dashboard, sub)?,
        Some(("add", sub)) => add(dashboard, store, sub)?,
        Some(("edit", sub)) => edit(dashboard, store, sub)?,
        Some(("rm", sub)) => remove(dashboard, store, sub)?,
        Some(("categories", _)) => categories(),
        _ => {}
    }
    Ok(())
}

/// Date sorts newest-first unless told otherwise; other keys start ascending.
pub fn query_from_args(sub: &clap::ArgMatches) -> Result<ViewQuery> {
    let month = month_arg(sub)?;
    let key = match sub.get_one::<String>("sort") {
        Some(raw) => raw.parse::<SortKey>()?,
        None => SortKey::Date,
    };
    let direction = match sub.get_one::<String>("order") {
        Some(raw) => raw.parse::<SortDirection>()?,
        None if key == SortKey::Date => SortDirection::Desc,
        None => SortDirection::Asc,
    };
    Ok(ViewQuery {
        month,
        search: sub
            .get_one::<String>("search")
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        sort: SortConfig { key, direction },
    })
}

fn list(dashboard: &mut Dashboard, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let query = query_from_args(sub)?;
    dashboard.select_month(query.month);
    dashboard.set_search(query.search);
    dashboard.set_sort(query.sort);
    let view = dashboard.view();
    if !maybe_print_json(json_flag, jsonl_flag, &view.visible)? {
        println!("{} · {} items", view.month.title(), view.visible.len());
        let rows: Vec<Vec<String>> = view
            .visible
            .iter()
            .map(|t| {
                let sign = if t.is_income() { "+" } else { "-" };
                vec![
                    fmt_date_display(&t.date),
                    t.label.clone(),
                    t.kind.to_string(),
                    format!("{}{}", sign, fmt_amount(&t.amount)),
                    t.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Label", "Type", "Amount", "ID"], rows)
        );
    }
    Ok(())
}

fn parse_kind(sub: &clap::ArgMatches) -> Result<Option<TransactionKind>> {
    match sub.get_one::<String>("kind") {
        Some(raw) => Ok(Some(raw.parse::<TransactionKind>()?)),
        None => Ok(None),
    }
}

fn add<S: TransactionStore + ?Sized>(
    dashboard: &mut Dashboard,
    store: &S,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let mut editor = TransactionEditor::new();
    editor.open_create(today());
    editor.set_amount(sub.get_one::<String>("amount").context("--amount is required")?);
    if let Some(idx) = sub.get_one::<usize>("category") {
        if *idx == 0 || !editor.pick_category(idx - 1) {
            bail!("Unknown category {} (see `tx categories`)", idx);
        }
    } else if let Some(label) = sub.get_one::<String>("label") {
        editor.set_label(label);
    }
    if let Some(kind) = parse_kind(sub)? {
        editor.set_kind(kind);
    }
    let notice = editor
        .submit(store, dashboard)
        .context("Amount must be a positive number and a label (or category) is required")?;
    report_notice(notice)
}

fn edit<S: TransactionStore + ?Sized>(
    dashboard: &mut Dashboard,
    store: &S,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let id = sub.get_one::<String>("id").context("--id is required")?.trim();
    let original = dashboard
        .find(id)
        .cloned()
        .with_context(|| format!("Transaction {} not found", id))?;
    let mut editor = TransactionEditor::new();
    editor.open_edit(&original);
    if let Some(amount) = sub.get_one::<String>("amount") {
        editor.set_amount(amount);
    }
    if let Some(label) = sub.get_one::<String>("label") {
        editor.set_label(label);
    }
    if let Some(kind) = parse_kind(sub)? {
        editor.set_kind(kind);
    }
    let notice = editor
        .submit(store, dashboard)
        .context("Amount must be a positive number and label must not be empty")?;
    report_notice(notice)
}

fn remove<S: TransactionStore + ?Sized>(
    dashboard: &mut Dashboard,
    store: &S,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let id = sub.get_one::<String>("id").context("--id is required")?.trim();
    let target = dashboard
        .find(id)
        .cloned()
        .with_context(|| format!("Transaction {} not found", id))?;
    if !sub.get_flag("yes") {
        let prompt = format!(
            "Delete {} {} on {}?",
            target.label,
            fmt_amount(&target.amount),
            fmt_date_display(&target.date)
        );
        if !confirm(&prompt)? {
            println!("Kept {}", target.label);
            return Ok(());
        }
    }
    report_notice(dashboard.delete(store, id))
}

fn categories() {
    let rows: Vec<Vec<String>> = CATEGORIES
        .iter()
        .enumerate()
        .map(|(i, c)| vec![(i + 1).to_string(), c.to_string()])
        .collect();
    println!("{}", pretty_table(&["#", "Category"], rows));
}
