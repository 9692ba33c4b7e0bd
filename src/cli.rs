// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, Command, arg, crate_version};

use crate::config::DEFAULT_LOG_FILTER;

fn output_flags(cmd: Command) -> Command {
    cmd.arg(arg!(--json "Print as pretty JSON"))
        .arg(arg!(--jsonl "Print one JSON object per line"))
}

fn window(cmd: Command) -> Command {
    cmd.arg(arg!(--from <DATE> "First day, YYYY-MM-DD").required(false))
        .arg(arg!(--to <DATE> "Last day, YYYY-MM-DD").required(false))
}

fn crud(name: &'static str, about: &'static str, add: Command, update: Command) -> Command {
    Command::new(name)
        .about(about)
        .subcommand_required(true)
        .subcommand(add)
        .subcommand(update)
        .subcommand(Command::new("rm").arg(arg!(--id <ID>).required(true)))
}

fn currency_cmd() -> Command {
    let fields = |cmd: Command| {
        cmd.arg(arg!(--code <CODE> "ISO code, e.g. USD").required(true))
            .arg(arg!(--description <TEXT>).required(true))
            .arg(arg!(--symbol <SYMBOL>).required(true))
    };
    crud(
        "currency",
        "Manage currencies",
        fields(Command::new("add")),
        fields(Command::new("update").arg(arg!(--id <ID>).required(true))),
    )
    .subcommand(output_flags(Command::new("list")))
}

fn account_cmd() -> Command {
    let fields = |cmd: Command| {
        cmd.arg(arg!(--name <NAME>).required(true))
            .arg(
                Arg::new("type")
                    .long("type")
                    .value_name("TYPE")
                    .help("Bank | Cash | CreditCard")
                    .required(true),
            )
            .arg(arg!(--state <STATE> "Active | Inactive | Closed").required(false))
            .arg(arg!(--currency <CODE> "Currency code or id").required(true))
    };
    crud(
        "account",
        "Manage accounts",
        fields(Command::new("add")),
        fields(Command::new("update").arg(arg!(--id <ID> "Account id or name").required(true))),
    )
    .subcommand(output_flags(Command::new("list")))
}

fn category_cmd() -> Command {
    let fields = |cmd: Command| {
        cmd.arg(arg!(--name <NAME>).required(true))
            .arg(arg!(--parent <CATEGORY> "Parent category id or name").required(false))
    };
    crud(
        "category",
        "Manage expense categories",
        fields(Command::new("add")),
        fields(Command::new("update").arg(arg!(--id <ID> "Category id or name").required(true))),
    )
    .subcommand(output_flags(Command::new("list")))
}

fn income_cmd() -> Command {
    crud(
        "income",
        "Record incomes",
        Command::new("add")
            .arg(arg!(--account <ACCOUNT>).required(true))
            .arg(arg!(--source <SOURCE> "Salary | Interest | Profit | Other").required(true))
            .arg(arg!(--amount <AMOUNT>).required(true))
            .arg(arg!(--date <DATE> "Defaults to today").required(false)),
        Command::new("update")
            .arg(arg!(--id <ID>).required(true))
            .arg(arg!(--account <ACCOUNT>).required(false))
            .arg(arg!(--source <SOURCE>).required(false))
            .arg(arg!(--amount <AMOUNT>).required(false))
            .arg(arg!(--date <DATE>).required(false)),
    )
    .subcommand(output_flags(window(Command::new("list"))))
}

fn expense_cmd() -> Command {
    crud(
        "expense",
        "Record expenses",
        Command::new("add")
            .arg(arg!(--account <ACCOUNT>).required(true))
            .arg(arg!(--category <CATEGORY>).required(true))
            .arg(arg!(--amount <AMOUNT>).required(true))
            .arg(arg!(--date <DATE> "Defaults to today").required(false)),
        Command::new("update")
            .arg(arg!(--id <ID>).required(true))
            .arg(arg!(--account <ACCOUNT>).required(false))
            .arg(arg!(--category <CATEGORY>).required(false))
            .arg(arg!(--amount <AMOUNT>).required(false))
            .arg(arg!(--date <DATE>).required(false)),
    )
    .subcommand(output_flags(window(Command::new("list"))))
}

fn transfer_cmd() -> Command {
    crud(
        "transfer",
        "Move money between accounts",
        Command::new("add")
            .arg(arg!(--from <ACCOUNT>).required(true))
            .arg(arg!(--to <ACCOUNT>).required(true))
            .arg(arg!(--amount <AMOUNT> "In the source account's currency").required(true))
            .arg(arg!(--rate <RATE> "Conversion rate, defaults to 1").required(false))
            .arg(arg!(--date <DATE> "Defaults to today").required(false)),
        Command::new("update")
            .arg(arg!(--id <ID>).required(true))
            .arg(arg!(--from <ACCOUNT>).required(false))
            .arg(arg!(--to <ACCOUNT>).required(false))
            .arg(arg!(--amount <AMOUNT>).required(false))
            .arg(arg!(--rate <RATE>).required(false))
            .arg(arg!(--date <DATE>).required(false)),
    )
    .subcommand(output_flags(window(Command::new("list"))))
}

pub fn build_cli() -> Command {
    Command::new("coinpurse")
        .version(crate_version!())
        .about("Multi-currency personal ledger")
        .arg(
            Arg::new("db")
                .long("db")
                .value_name("PATH")
                .env("COINPURSE_DB")
                .global(true)
                .help("SQLite file to use"),
        )
        .arg(
            Arg::new("log")
                .long("log")
                .value_name("FILTER")
                .env("COINPURSE_LOG")
                .default_value(DEFAULT_LOG_FILTER)
                .global(true)
                .help("tracing filter directive"),
        )
        .subcommand(Command::new("init").about("Create the database and seed defaults"))
        .subcommand(currency_cmd())
        .subcommand(account_cmd())
        .subcommand(category_cmd())
        .subcommand(income_cmd())
        .subcommand(expense_cmd())
        .subcommand(transfer_cmd())
        .subcommand(
            output_flags(window(
                Command::new("history").arg(arg!(--account <ACCOUNT>).required(true)),
            ))
            .about("Account history with running balances"),
        )
        .subcommand(
            output_flags(window(Command::new("summary")))
                .about("Expenses per currency and top-level category"),
        )
        .subcommand(
            Command::new("export")
                .about("Export data to a file")
                .subcommand(window(
                    Command::new("history")
                        .arg(arg!(--account <ACCOUNT>).required(true))
                        .arg(arg!(--format <FMT> "csv | json").required(true))
                        .arg(arg!(--out <PATH>).required(true)),
                )),
        )
        .subcommand(
            output_flags(Command::new("doctor")).about("Check cached balances against a replay"),
        )
}
