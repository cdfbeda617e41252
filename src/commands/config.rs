// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::config::{self, Config};
use crate::utils::pretty_table;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let key = sub.get_one::<String>("key").context("key is required")?.trim();
            let value = sub.get_one::<String>("value").context("value is required")?;
            config::set(conn, key, value)?;
            println!("Set {}", key);
        }
        Some(("show", _)) => show(conn)?,
        _ => {}
    }
    Ok(())
}

fn show(conn: &Connection) -> Result<()> {
    let cfg = Config::load(conn)?;
    let unset = || "(not set)".to_string();
    let rows = vec![
        vec!["supabase_url".into(), cfg.supabase_url.clone().unwrap_or_else(unset)],
        vec![
            "supabase_anon_key".into(),
            cfg.supabase_anon_key
                .as_deref()
                .map(config::mask)
                .unwrap_or_else(unset),
        ],
        vec!["api_base".into(), cfg.api_base.clone()],
        vec!["http_timeout_secs".into(), cfg.http_timeout_secs.to_string()],
    ];
    println!("{}", pretty_table(&["Key", "Value"], rows));
    Ok(())
}
