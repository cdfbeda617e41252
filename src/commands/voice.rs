// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{anyhow, Context, Result};

use crate::ai::VoiceApi;
use crate::commands::report_notice;
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::models::TransactionKind;
use crate::remote::TransactionStore;
use crate::utils::{confirm, fmt_amount, pretty_table, today};
use crate::voice::{run_attempt, FileAudioSource, ReviewBatch, VoicePipeline};

pub fn handle<S: TransactionStore + ?Sized>(
    config: &Config,
    dashboard: &mut Dashboard,
    store: &S,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let path = sub.get_one::<String>("file").context("--file is required")?.trim();
    let mime = sub.get_one::<String>("mime").map(|s| s.trim().to_string());
    let api = VoiceApi::new(config)?;
    let mut source = FileAudioSource::new(path, mime);
    let mut pipeline = VoicePipeline::new();

    println!("{}", pipeline.status().caption());
    let outcome = run_attempt(&mut pipeline, &mut source, &api, &api);
    if !outcome.alerts.is_empty() {
        return Err(anyhow!(outcome.alerts.join("\n")));
    }
    let Some(batch) = pipeline.take_review() else {
        return Ok(());
    };
    print_review(&batch);
    if sub.get_flag("yes") || confirm("Confirm & save?")? {
        report_notice(dashboard.confirm_voice_batch(store, batch, today()))
    } else {
        println!("Discarded {} suggested transactions", batch.len());
        Ok(())
    }
}

fn print_review(batch: &ReviewBatch) {
    let rows: Vec<Vec<String>> = batch
        .entries()
        .iter()
        .map(|e| {
            let sign = if e.kind == TransactionKind::Income { "+" } else { "-" };
            vec![
                e.label.clone(),
                e.category.clone(),
                e.kind.to_string(),
                format!("{}{}", sign, fmt_amount(&e.amount)),
            ]
        })
        .collect();
    println!("Review Transactions");
    println!(
        "{}",
        pretty_table(&["Label", "Category", "Type", "Amount"], rows)
    );
}
