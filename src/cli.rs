// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .conflicts_with("jsonl")
            .help("Pretty JSON output"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("One JSON object per line"),
    )
}

fn month_arg() -> Arg {
    Arg::new("month")
        .long("month")
        .short('m')
        .value_name("YYYY-MM")
        .help("Month to show (default: current month)")
}

fn credentials(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("username")
            .long("username")
            .short('u')
            .required(true),
    )
    .arg(
        Arg::new("password")
            .long("password")
            .short('p')
            .required(true),
    )
}

fn kind_arg() -> Arg {
    Arg::new("kind")
        .long("kind")
        .short('k')
        .value_parser(["income", "expense"])
}

pub fn build_cli() -> Command {
    Command::new("moneytracker")
        .about("Personal income/expense tracker")
        .version(clap::crate_version!())
        .subcommand(credentials(Command::new("register").about("Create an account")))
        .subcommand(credentials(Command::new("login").about("Sign in")))
        .subcommand(Command::new("logout").about("Sign out"))
        .subcommand(Command::new("whoami").about("Show the signed-in user"))
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List a month's transactions")
                        .arg(month_arg())
                        .arg(Arg::new("search").long("search").short('s'))
                        .arg(
                            Arg::new("sort")
                                .long("sort")
                                .value_parser(["date", "label", "amount"])
                                .default_value("date"),
                        )
                        .arg(
                            Arg::new("order")
                                .long("order")
                                .value_parser(["asc", "desc"]),
                        ),
                ))
                .subcommand(
                    Command::new("add")
                        .about("Record a transaction dated today")
                        .arg(Arg::new("amount").long("amount").short('a').required(true))
                        .arg(Arg::new("label").long("label").short('l'))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .short('c')
                                .value_parser(clap::value_parser!(usize))
                                .conflicts_with("label")
                                .help("Quick-select label by number (see `tx categories`)"),
                        )
                        .arg(kind_arg().default_value("expense")),
                )
                .subcommand(
                    Command::new("edit")
                        .about("Change amount, label or kind of a transaction")
                        .arg(Arg::new("id").long("id").required(true))
                        .arg(Arg::new("amount").long("amount").short('a'))
                        .arg(Arg::new("label").long("label").short('l'))
                        .arg(kind_arg()),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a transaction")
                        .arg(Arg::new("id").long("id").required(true))
                        .arg(
                            Arg::new("yes")
                                .long("yes")
                                .short('y')
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(Command::new("categories").about("List quick-select categories")),
        )
        .subcommand(
            Command::new("report")
                .about("Monthly summaries")
                .subcommand(json_flags(
                    Command::new("summary")
                        .about("Income, expense, net and budget progress")
                        .arg(month_arg()),
                ))
                .subcommand(json_flags(
                    Command::new("daily")
                        .about("Per-day income and expense")
                        .arg(month_arg()),
                ))
                .subcommand(json_flags(
                    Command::new("history")
                        .about("Up to 12 earlier months")
                        .arg(month_arg()),
                ))
                .subcommand(json_flags(
                    Command::new("categories")
                        .about("Expense breakdown by label")
                        .arg(month_arg()),
                )),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly spending limit (stored locally)")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("amount").long("amount").short('a').required(true)),
                )
                .subcommand(Command::new("show")),
        )
        .subcommand(
            Command::new("export")
                .about("Export every transaction as CSV")
                .arg(Arg::new("out").long("out").short('o')),
        )
        .subcommand(
            Command::new("voice")
                .about("Turn a recorded voice note into transactions")
                .arg(Arg::new("file").long("file").short('f').required(true))
                .arg(Arg::new("mime").long("mime"))
                .arg(
                    Arg::new("yes")
                        .long("yes")
                        .short('y')
                        .action(ArgAction::SetTrue)
                        .help("Confirm the reviewed batch without prompting"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Backend settings")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                )
                .subcommand(Command::new("show")),
        )
}
