// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::loans;
use crate::models::LoanDirection;
use crate::utils::{active_profile, fmt_money, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use chrono::Local;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let owner = active_profile(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let dir_s = sub.get_one::<String>("direction").unwrap();
            let direction = LoanDirection::parse(dir_s)
                .ok_or_else(|| anyhow::anyhow!("Unknown loan direction '{}'", dir_s))?;
            let counterparty = sub.get_one::<String>("counterparty").unwrap();
            let category = sub.get_one::<String>("category").unwrap();
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let rate = sub
                .get_one::<String>("rate")
                .map(|s| parse_decimal(s))
                .transpose()?;
            let tenure = sub.get_one::<u32>("tenure").copied();
            let loan = loans::create(conn, &owner, direction, counterparty, category, amount, rate, tenure)?;
            println!(
                "Recorded loan {} {} '{}' of {}{}",
                loan.id,
                loan.direction.as_str(),
                loan.counterparty,
                fmt_money(&loan.amount),
                loan.emi_amount
                    .map(|e| format!(", EMI {}", fmt_money(&e)))
                    .unwrap_or_default()
            );
        }
        Some(("pay", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let date = match sub.get_one::<String>("date") {
                Some(s) => parse_date(s)?,
                None => Local::now().date_naive(),
            };
            let loan = loans::add_payment(conn, &owner, id, amount, date)?;
            println!(
                "Payment of {} recorded; remaining {}",
                fmt_money(&amount),
                fmt_money(&loan.remaining_balance)
            );
        }
        Some(("edit-payment", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let payment = *sub.get_one::<i64>("payment").unwrap();
            let amount = sub
                .get_one::<String>("amount")
                .map(|s| parse_decimal(s))
                .transpose()?;
            let date = sub
                .get_one::<String>("date")
                .map(|s| parse_date(s))
                .transpose()?;
            let loan = loans::edit_payment(conn, &owner, id, payment, amount, date)?;
            println!(
                "Payment {} updated; remaining {}",
                payment,
                fmt_money(&loan.remaining_balance)
            );
        }
        Some(("rm-payment", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let payment = *sub.get_one::<i64>("payment").unwrap();
            let loan = loans::remove_payment(conn, &owner, id, payment)?;
            println!(
                "Payment {} removed; remaining {}",
                payment,
                fmt_money(&loan.remaining_balance)
            );
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let list = loans::list(conn, &owner)?;
            if !maybe_print_json(json_flag, jsonl_flag, &list)? {
                let rows: Vec<Vec<String>> = list
                    .iter()
                    .map(|l| {
                        vec![
                            l.id.to_string(),
                            l.direction.as_str().to_string(),
                            l.counterparty.clone(),
                            fmt_money(&l.amount),
                            fmt_money(&l.remaining_balance),
                            l.emi_amount.as_ref().map(fmt_money).unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["Id", "Direction", "Counterparty", "Principal", "Remaining", "EMI"],
                        rows
                    )
                );
            }
        }
        Some(("payments", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let list = loans::payments(conn, &owner, id)?;
            if !maybe_print_json(json_flag, jsonl_flag, &list)? {
                let rows: Vec<Vec<String>> = list
                    .iter()
                    .map(|p| {
                        vec![p.id.to_string(), p.date.to_string(), fmt_money(&p.amount)]
                    })
                    .collect();
                println!("{}", pretty_table(&["Id", "Date", "Amount"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}
