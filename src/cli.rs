// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};
use std::path::PathBuf;

fn opt(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .num_args(1)
        .help(help)
}

fn req(id: &'static str, help: &'static str) -> Arg {
    opt(id, help).required(true)
}

fn flag(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .action(ArgAction::SetTrue)
        .help(help)
}

fn json_args() -> [Arg; 2] {
    [
        flag("json", "Print as pretty JSON"),
        flag("jsonl", "Print as JSON lines"),
    ]
}

fn name_only(name: &'static str, about: &'static str) -> Command {
    Command::new(name).about(about).arg(req("name", "Name"))
}

fn id_only(name: &'static str, about: &'static str) -> Command {
    Command::new(name).about(about).arg(req("id", "Row id"))
}

pub fn build_cli() -> Command {
    Command::new("fintrack")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .num_args(1)
                .value_parser(value_parser!(PathBuf))
                .help("SQLite store path (overrides FINTRACK_DB)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging on stderr"),
        )
        .subcommand(Command::new("init").about("Create the store and seed default categories"))
        .subcommand(accounts())
        .subcommand(categories())
        .subcommand(transactions())
        .subcommand(budgets())
        .subcommand(debts())
        .subcommand(loans())
        .subcommand(goals())
        .subcommand(trips())
        .subcommand(evaluations())
        .subcommand(reports())
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("transactions")
                    .about("Export all transactions")
                    .arg(req("format", "csv | json"))
                    .arg(req("out", "Output file")),
            ),
        )
        .subcommand(
            Command::new("config")
                .about("Persistent settings")
                .subcommand(
                    Command::new("set")
                        .arg(req("key", "Setting key"))
                        .arg(req("value", "Setting value")),
                )
                .subcommand(Command::new("get").arg(req("key", "Setting key")))
                .subcommand(Command::new("list")),
        )
        .subcommand(Command::new("doctor").about("Check the store for inconsistent rows"))
}

fn accounts() -> Command {
    Command::new("account")
        .about("Manage accounts")
        .subcommand(
            Command::new("add")
                .about("Add an account")
                .arg(req("name", "Account name"))
                .arg(opt("balance", "Opening balance").default_value("0")),
        )
        .subcommand(
            Command::new("list")
                .about("List accounts")
                .arg(flag("all", "Include archived accounts"))
                .args(json_args()),
        )
        .subcommand(name_only("archive", "Hide an account from pickers and lists"))
        .subcommand(name_only("unarchive", "Restore an archived account"))
        .subcommand(name_only("rm", "Delete an account without transactions"))
}

fn categories() -> Command {
    Command::new("category")
        .about("Manage categories")
        .subcommand(
            Command::new("add")
                .about("Add a category")
                .arg(req("name", "Category name"))
                .arg(req("kind", "income | expense"))
                .arg(opt("icon", "Icon name"))
                .arg(opt("color", "Color as #RRGGBB"))
                .arg(opt("parent", "Parent category name")),
        )
        .subcommand(
            Command::new("list")
                .about("List categories, children under their parent")
                .arg(opt("kind", "income | expense"))
                .arg(flag("all", "Include archived categories"))
                .args(json_args()),
        )
        .subcommand(name_only("archive", "Archive a category"))
        .subcommand(name_only("rm", "Delete a non-default category"))
}

fn transactions() -> Command {
    Command::new("tx")
        .about("Record and list transactions")
        .subcommand(
            Command::new("add")
                .about("Record a transaction")
                .arg(req("kind", "expense | income | transfer"))
                .arg(req("amount", "Positive amount"))
                .arg(req("date", "YYYY-MM-DD"))
                .arg(req("account", "Account name"))
                .arg(opt("to-account", "Destination account (transfers)"))
                .arg(opt("category", "Category name"))
                .arg(opt("notes", "Free text")),
        )
        .subcommand(
            Command::new("list")
                .about("List transactions, newest first")
                .arg(opt("month", "YYYY-MM"))
                .arg(opt("account", "Account name"))
                .arg(opt("category", "Category name"))
                .arg(opt("kind", "expense | income | transfer"))
                .arg(opt("limit", "Max rows").value_parser(value_parser!(usize)))
                .args(json_args()),
        )
        .subcommand(id_only("rm", "Delete a transaction and reverse its balance effect"))
}

fn budgets() -> Command {
    Command::new("budget")
        .about("Monthly category budgets")
        .subcommand(
            Command::new("set")
                .about("Set a category budget for a month")
                .arg(req("month", "YYYY-MM"))
                .arg(req("category", "Category name"))
                .arg(req("amount", "Budgeted amount"))
                .arg(opt("rollover", "Carried-in amount")),
        )
        .subcommand(
            Command::new("list")
                .arg(opt("month", "YYYY-MM"))
                .args(json_args()),
        )
        .subcommand(
            Command::new("status")
                .about("Budget vs. spent for a month")
                .arg(req("month", "YYYY-MM"))
                .args(json_args()),
        )
        .subcommand(
            Command::new("rollover")
                .about("Carry unused budget into the following month")
                .arg(req("from", "YYYY-MM")),
        )
}

fn obligation(name: &'static str, about: &'static str, party: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .subcommand(
            Command::new("add")
                .arg(req(party, "Counterparty name"))
                .arg(req("amount", "Initial amount"))
                .arg(opt("rate", "Annual interest rate in percent").default_value("0"))
                .arg(req("due", "Due date YYYY-MM-DD"))
                .arg(opt("notes", "Free text")),
        )
        .subcommand(
            Command::new("list")
                .arg(flag("all", "Include settled rows"))
                .args(json_args()),
        )
        .subcommand(id_only("settle", "Mark as settled"))
        .subcommand(id_only("rm", "Delete with its history"))
        .subcommand(id_only("suggest", "Suggested monthly payment").args(json_args()))
        .subcommand(id_only("history", "Payments recorded so far").args(json_args()))
}

fn payment_args(cmd: Command) -> Command {
    cmd.arg(req("id", "Row id"))
        .arg(req("amount", "Amount"))
        .arg(opt("account", "Account the money moves through"))
        .arg(opt("date", "YYYY-MM-DD, defaults to today"))
        .arg(opt("category", "Category for the posted transaction"))
}

fn debts() -> Command {
    obligation("debt", "Money you owe", "creditor").subcommand(payment_args(
        Command::new("pay").about("Record a payment towards a debt"),
    ))
}

fn loans() -> Command {
    obligation("loan", "Money owed to you", "debtor").subcommand(payment_args(
        Command::new("collect").about("Record a collection against a loan"),
    ))
}

fn goals() -> Command {
    Command::new("goal")
        .about("Savings goals")
        .subcommand(
            Command::new("add")
                .arg(req("name", "Goal name"))
                .arg(req("target", "Target amount"))
                .arg(opt("account", "Linked account"))
                .arg(opt("target-date", "YYYY-MM-DD")),
        )
        .subcommand(
            Command::new("list")
                .arg(flag("all", "Include archived goals"))
                .args(json_args()),
        )
        .subcommand(
            Command::new("contribute")
                .arg(req("name", "Goal name"))
                .arg(req("amount", "Amount")),
        )
        .subcommand(name_only("archive", "Archive a goal"))
        .subcommand(name_only("rm", "Delete a goal"))
}

fn trips() -> Command {
    Command::new("trip")
        .about("Trips with budgets and expenses")
        .subcommand(
            Command::new("add")
                .arg(req("name", "Trip name"))
                .arg(req("destination", "Destination"))
                .arg(req("start", "YYYY-MM-DD"))
                .arg(req("end", "YYYY-MM-DD"))
                .arg(req("budget", "Trip budget")),
        )
        .subcommand(Command::new("list").args(json_args()))
        .subcommand(
            Command::new("save")
                .about("Put money aside for a trip")
                .arg(req("name", "Trip name"))
                .arg(req("amount", "Amount")),
        )
        .subcommand(
            Command::new("status")
                .arg(req("name", "Trip name"))
                .arg(req("status", "planned | ongoing | completed | cancelled")),
        )
        .subcommand(name_only("rm", "Delete a trip and its expenses"))
        .subcommand(
            Command::new("expense")
                .about("Trip expenses")
                .subcommand(
                    Command::new("add")
                        .arg(req("trip", "Trip name"))
                        .arg(req("amount", "Amount"))
                        .arg(req("date", "YYYY-MM-DD"))
                        .arg(req("description", "What it was"))
                        .arg(opt("category", "Category name")),
                )
                .subcommand(
                    Command::new("list")
                        .arg(req("trip", "Trip name"))
                        .args(json_args()),
                ),
        )
}

/// Evaluation bucket flags, in table order.
pub const EVAL_FIELDS: &[&str] = &[
    "income",
    "savings",
    "fixed-costs",
    "variable-costs",
    "buffer",
    "travel",
    "investment",
    "extra",
];

fn evaluations() -> Command {
    let mut set = Command::new("set")
        .about("Create or update a month's plan")
        .arg(req("month", "YYYY-MM"))
        .arg(opt("notes", "Free text"));
    for &f in EVAL_FIELDS {
        set = set.arg(opt(f, "Planned amount"));
    }
    Command::new("eval")
        .about("Monthly allocation plans")
        .subcommand(set)
        .subcommand(
            Command::new("show")
                .arg(req("month", "YYYY-MM"))
                .args(json_args()),
        )
        .subcommand(Command::new("list").args(json_args()))
        .subcommand(Command::new("rm").arg(req("month", "YYYY-MM")))
        .subcommand(
            Command::new("copy")
                .about("Copy a month's plan into another month")
                .arg(req("from", "YYYY-MM"))
                .arg(req("to", "YYYY-MM")),
        )
}

fn reports() -> Command {
    Command::new("report")
        .about("Reports")
        .subcommand(Command::new("balances").args(json_args()))
        .subcommand(
            Command::new("cashflow")
                .arg(
                    opt("months", "Number of months")
                        .value_parser(value_parser!(usize))
                        .default_value("12"),
                )
                .args(json_args()),
        )
        .subcommand(
            Command::new("spend-by-category")
                .arg(req("month", "YYYY-MM"))
                .args(json_args()),
        )
}
