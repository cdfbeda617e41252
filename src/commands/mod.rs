// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod auth;
pub mod budgets;
pub mod config;
pub mod exporter;
pub mod reports;
pub mod transactions;
pub mod voice;

use anyhow::{anyhow, Result};

use crate::dashboard::Notice;
use crate::models::MonthKey;

/// `--month`, or the current month when absent.
pub fn month_arg(sub: &clap::ArgMatches) -> Result<MonthKey> {
    match sub.get_one::<String>("month") {
        Some(raw) => Ok(raw.parse::<MonthKey>()?),
        None => Ok(MonthKey::current()),
    }
}

/// Prints a success notice; an error notice becomes the command's error.
pub fn report_notice(notice: Notice) -> Result<()> {
    if notice.is_error() {
        Err(anyhow!(notice.message))
    } else {
        println!("{}", notice.message);
        Ok(())
    }
}
