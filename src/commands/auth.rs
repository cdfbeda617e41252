// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};

use crate::remote::AuthService;
use crate::session::{Screen, SessionChange, SessionShell};

fn credentials(sub: &clap::ArgMatches) -> Result<(&str, &str)> {
    let username = sub.get_one::<String>("username").context("--username is required")?;
    let password = sub.get_one::<String>("password").context("--password is required")?;
    Ok((username.as_str(), password.as_str()))
}

fn describe(change: &SessionChange) -> String {
    match &change.display_name {
        Some(name) => format!("Signed in as {}", name),
        None => "Signed out".to_string(),
    }
}

pub fn handle<A: AuthService + ?Sized>(
    shell: &mut SessionShell<'_, A>,
    name: &str,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let changes = shell.subscribe();
    // drop the initial state; only report what this command changed
    let _ = changes.try_recv();
    match name {
        "register" => {
            let (username, password) = credentials(sub)?;
            if shell.sign_up(username, password)? == Screen::Auth {
                println!("Account created. Run `moneytracker login` to sign in.");
            }
        }
        "login" => {
            let (username, password) = credentials(sub)?;
            shell.sign_in(username, password)?;
        }
        "logout" => shell.sign_out()?,
        "whoami" => match shell.screen() {
            Screen::Dashboard { display_name } => println!("{}", display_name),
            Screen::Auth => {
                println!("Not signed in. Run `moneytracker login` or `moneytracker register`.")
            }
        },
        _ => {}
    }
    for change in changes.try_iter() {
        println!("{}", describe(&change));
    }
    Ok(())
}
