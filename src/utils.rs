// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rust_decimal::Decimal;

use crate::error::TrackerError;
use crate::models::{is_valid_amount, MAX_AMOUNT};

const UA: &str = concat!("moneytracker/", env!("CARGO_PKG_VERSION"));

pub fn http_client(timeout_secs: u64) -> crate::error::Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

/// Today's calendar date in the local time zone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Accepts a strictly positive decimal up to [`MAX_AMOUNT`].
pub fn parse_amount(s: &str) -> crate::error::Result<Decimal> {
    match s.trim().parse::<Decimal>() {
        Ok(d) if is_valid_amount(&d) => Ok(d),
        _ => Err(TrackerError::Validation(format!(
            "Invalid amount '{}', expected a positive number up to {}",
            s.trim(),
            fmt_amount(&MAX_AMOUNT)
        ))),
    }
}

/// Plain decimal rendering used by search and export ("5", "12.5").
pub fn amount_string(d: &Decimal) -> String {
    d.normalize().to_string()
}

/// Groups the integer part with commas and keeps at most two decimals.
pub fn fmt_amount(d: &Decimal) -> String {
    let rendered = d.round_dp(2).normalize().to_string();
    let (sign, rest) = match rendered.strip_prefix('-') {
        Some(r) => ("-", r),
        None => ("", rendered.as_str()),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

pub fn fmt_date_display(date: &NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// Asks a yes/no question on stdin; anything but y/yes is a no.
pub fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
