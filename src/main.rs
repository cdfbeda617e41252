// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use moneytracker::config::Config;
use moneytracker::dashboard::Dashboard;
use moneytracker::remote::SupabaseClient;
use moneytracker::session::SessionShell;
use moneytracker::{cli, commands, db};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();

    let matches = cli::build_cli().get_matches();
    let conn = db::open_or_init()?;

    let (name, sub) = match matches.subcommand() {
        Some(("config", sub)) => return commands::config::handle(&conn, sub),
        Some(pair) => pair,
        None => {
            cli::build_cli().print_help()?;
            println!();
            return Ok(());
        }
    };

    let config = Config::load(&conn)?;
    let client = SupabaseClient::new(&config)?;
    let mut shell = SessionShell::start(&client, &conn)?;

    if matches!(name, "register" | "login" | "logout" | "whoami") {
        return commands::auth::handle(&mut shell, name, sub);
    }

    let ctx = shell.require()?;
    let store = client.clone().with_session(ctx.session.clone());
    let mut dashboard = Dashboard::open(ctx, &store, &conn)?;

    match name {
        "tx" => commands::transactions::handle(&mut dashboard, &store, sub)?,
        "report" => commands::reports::handle(&mut dashboard, sub)?,
        "budget" => commands::budgets::handle(&conn, &mut dashboard, sub)?,
        "export" => commands::exporter::handle(&dashboard, sub)?,
        "voice" => commands::voice::handle(&config, &mut dashboard, &store, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
