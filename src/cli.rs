// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{crate_version, value_parser, Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

fn id_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .required(true)
        .value_parser(value_parser!(i64))
        .help(help)
}

pub fn build_cli() -> Command {
    Command::new("pocketbook")
        .version(crate_version!())
        .about("Personal finance ledger: accounts, budgets, savings, loans, and recurring bills")
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(
            Command::new("profile")
                .about("Manage profiles")
                .subcommand(
                    Command::new("add")
                        .about("Create a profile (seeds a default Cash account)")
                        .arg(Arg::new("name").required(true)),
                )
                .subcommand(
                    Command::new("use")
                        .about("Switch the active profile")
                        .arg(Arg::new("name").required(true)),
                )
                .subcommand(Command::new("list").about("List profiles")),
        )
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .about("Add an account")
                        .arg(Arg::new("name").required(true))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .default_value("bank")
                                .help("cash | bank | credit-card"),
                        )
                        .arg(
                            Arg::new("opening")
                                .long("opening")
                                .default_value("0")
                                .help("Opening balance (cash-like accounts)"),
                        )
                        .arg(
                            Arg::new("credit-limit")
                                .long("credit-limit")
                                .help("Credit limit (credit-card accounts)"),
                        ),
                )
                .subcommand(json_flags(Command::new("list").about("List accounts with balances")))
                .subcommand(
                    Command::new("rm")
                        .about("Delete an account and cascade its transactions")
                        .arg(id_arg("id", "Account id")),
                ),
        )
        .subcommand(
            Command::new("tx")
                .about("Manage transactions")
                .subcommand(
                    Command::new("add")
                        .about("Record a transaction")
                        .arg(Arg::new("account").long("account").required(true))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .default_value("expense")
                                .help("income | expense"),
                        )
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD, default today"))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(
                    Command::new("edit")
                        .about("Edit a user-entered transaction")
                        .arg(id_arg("id", "Transaction id"))
                        .arg(Arg::new("account").long("account"))
                        .arg(Arg::new("kind").long("kind"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("date").long("date"))
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a transaction, reversing its effects")
                        .arg(id_arg("id", "Transaction id")),
                )
                .subcommand(
                    json_flags(Command::new("list").about("List transactions"))
                        .arg(Arg::new("month").long("month").help("YYYY-MM"))
                        .arg(Arg::new("account").long("account"))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ),
        )
        .subcommand(
            Command::new("budget")
                .about("Manage budgets")
                .subcommand(
                    Command::new("add")
                        .about("Create a budget for a category window")
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("limit").long("limit").required(true))
                        .arg(Arg::new("from").long("from").required(true).help("YYYY-MM-DD"))
                        .arg(Arg::new("to").long("to").required(true).help("YYYY-MM-DD"))
                        .arg(Arg::new("name").long("name")),
                )
                .subcommand(json_flags(Command::new("list").about("List budgets with spent totals")))
                .subcommand(
                    Command::new("show")
                        .about("Show a budget's attributed transactions")
                        .arg(id_arg("id", "Budget id")),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a budget (its line items go with it)")
                        .arg(id_arg("id", "Budget id")),
                ),
        )
        .subcommand(
            Command::new("savings")
                .about("Manage savings vehicles")
                .subcommand(
                    Command::new("add")
                        .about("Open a savings vehicle")
                        .arg(Arg::new("name").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .default_value("deposit")
                                .help("Vehicle type label, e.g. fd, rd, fund"),
                        )
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .default_value("0")
                                .help("Initial contribution"),
                        ),
                )
                .subcommand(
                    Command::new("record")
                        .about("Record a savings event")
                        .arg(id_arg("id", "Vehicle id"))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .required(true)
                                .help("deposit | withdrawal | interest | loss | redemption"),
                        )
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD, default today"))
                        .arg(
                            Arg::new("account")
                                .long("account")
                                .help("Linked account name (deposit/withdrawal/redemption)"),
                        )
                        .arg(Arg::new("note").long("note")),
                )
                .subcommand(
                    Command::new("close")
                        .about("Close a vehicle, redeeming into an account")
                        .arg(id_arg("id", "Vehicle id"))
                        .arg(Arg::new("redeem").long("redeem").required(true))
                        .arg(Arg::new("to-account").long("to-account").required(true))
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD, default today")),
                )
                .subcommand(
                    Command::new("rm-event")
                        .about("Delete a savings event, reversing its effects")
                        .arg(id_arg("id", "Savings event id")),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a vehicle and cascade its events")
                        .arg(id_arg("id", "Vehicle id")),
                )
                .subcommand(json_flags(Command::new("list").about("List vehicles")))
                .subcommand(
                    json_flags(Command::new("events").about("List a vehicle's events"))
                        .arg(id_arg("id", "Vehicle id")),
                ),
        )
        .subcommand(
            Command::new("loan")
                .about("Manage loans")
                .subcommand(
                    Command::new("add")
                        .about("Record a loan")
                        .arg(
                            Arg::new("direction")
                                .long("direction")
                                .default_value("taken")
                                .help("taken | given"),
                        )
                        .arg(Arg::new("counterparty").long("counterparty").required(true))
                        .arg(Arg::new("category").long("category").default_value("Loan"))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("rate").long("rate").help("Annual interest rate, percent"))
                        .arg(
                            Arg::new("tenure")
                                .long("tenure")
                                .value_parser(value_parser!(u32))
                                .help("Tenure in months"),
                        ),
                )
                .subcommand(
                    Command::new("pay")
                        .about("Record a payment against a loan")
                        .arg(id_arg("id", "Loan id"))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD, default today")),
                )
                .subcommand(
                    Command::new("edit-payment")
                        .about("Edit a recorded payment")
                        .arg(id_arg("id", "Loan id"))
                        .arg(id_arg("payment", "Payment id"))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("date").long("date")),
                )
                .subcommand(
                    Command::new("rm-payment")
                        .about("Remove a recorded payment")
                        .arg(id_arg("id", "Loan id"))
                        .arg(id_arg("payment", "Payment id")),
                )
                .subcommand(json_flags(Command::new("list").about("List loans")))
                .subcommand(
                    json_flags(Command::new("payments").about("List a loan's payments"))
                        .arg(id_arg("id", "Loan id")),
                ),
        )
        .subcommand(
            Command::new("bill")
                .about("Manage bills")
                .subcommand(
                    Command::new("add")
                        .about("Register a bill")
                        .arg(Arg::new("name").required(true))
                        .arg(Arg::new("account").long("account").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("due").long("due").required(true).help("YYYY-MM-DD"))
                        .arg(
                            Arg::new("every")
                                .long("every")
                                .help("daily | weekly | monthly | yearly | <months>"),
                        ),
                )
                .subcommand(
                    Command::new("pay")
                        .about("Pay the current occurrence")
                        .arg(id_arg("id", "Bill id"))
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD, default today")),
                )
                .subcommand(
                    Command::new("cancel")
                        .about("Cancel a bill")
                        .arg(id_arg("id", "Bill id")),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a bill and its generated transactions")
                        .arg(id_arg("id", "Bill id")),
                )
                .subcommand(json_flags(Command::new("list").about("List bills"))),
        )
        .subcommand(
            Command::new("report")
                .about("Reports")
                .subcommand(json_flags(Command::new("net-worth").about("Net worth across accounts")))
                .subcommand(json_flags(Command::new("budgets").about("Budget limits vs spent")))
                .subcommand(
                    json_flags(Command::new("upcoming-bills").about("Bills due soon")).arg(
                        Arg::new("days")
                            .long("days")
                            .value_parser(value_parser!(i64))
                            .default_value("30"),
                    ),
                ),
        )
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("transactions")
                    .about("Export transactions")
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .default_value("csv")
                            .help("csv | json"),
                    )
                    .arg(Arg::new("out").long("out").required(true)),
            ),
        )
        .subcommand(Command::new("doctor").about("Audit derived state against raw history"))
}
