// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fs::File;
use std::io::Write;

use anyhow::{Context, Result};

use crate::dashboard::Dashboard;
use crate::models::Transaction;
use crate::utils::amount_string;

pub fn handle(dashboard: &Dashboard, sub: &clap::ArgMatches) -> Result<()> {
    let transactions = dashboard.transactions();
    if transactions.is_empty() {
        println!("Nothing to export");
        return Ok(());
    }
    let out = sub
        .get_one::<String>("out")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| default_file_name(dashboard.context().display_name()));
    let file = File::create(&out).with_context(|| format!("Create {}", out))?;
    let n = write_csv(transactions, file)?;
    println!("Exported {} transactions to {}", n, out);
    Ok(())
}

pub fn default_file_name(display_name: &str) -> String {
    format!("money_tracker_{}.csv", display_name)
}

/// Every row in list order under `Date,Label,Type,Amount`.
pub fn write_csv<W: Write>(transactions: &[Transaction], out: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["Date", "Label", "Type", "Amount"])?;
    for t in transactions {
        wtr.write_record([
            t.date.to_string(),
            t.label.clone(),
            t.kind.to_string(),
            amount_string(&t.amount),
        ])?;
    }
    wtr.flush()?;
    Ok(transactions.len())
}
