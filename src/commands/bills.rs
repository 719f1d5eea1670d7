// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cache::NetWorthCache;
use crate::ledger::bills;
use crate::models::BillFrequency;
use crate::utils::{
    active_profile, fmt_money, id_for_account, maybe_print_json, parse_date, parse_decimal,
    pretty_table,
};
use anyhow::Result;
use chrono::Local;
use rusqlite::Connection;

fn parse_frequency(s: &str) -> Result<BillFrequency> {
    if let Ok(months) = s.parse::<u32>() {
        return Ok(BillFrequency::Months(months));
    }
    BillFrequency::parse(s, None)
        .ok_or_else(|| anyhow::anyhow!("Unknown recurrence '{}'; use daily|weekly|monthly|yearly|<months>", s))
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let owner = active_profile(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let account = id_for_account(conn, &owner, sub.get_one::<String>("account").unwrap())?;
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let due = parse_date(sub.get_one::<String>("due").unwrap())?;
            let frequency = sub
                .get_one::<String>("every")
                .map(|s| parse_frequency(s))
                .transpose()?;
            let bill = bills::create(conn, &owner, account, name, amount, due, frequency)?;
            println!(
                "Registered bill '{}' (id {}), {} due {}",
                bill.name,
                bill.id,
                fmt_money(&bill.amount),
                bill.due_date
            );
        }
        Some(("pay", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let paid_on = match sub.get_one::<String>("date") {
                Some(s) => parse_date(s)?,
                None => Local::now().date_naive(),
            };
            let bill = bills::mark_paid(conn, &NetWorthCache, &owner, id, paid_on)?;
            if bill.recurring {
                println!("Paid '{}'; next occurrence due {}", bill.name, bill.due_date);
            } else {
                println!("Paid '{}'; bill settled", bill.name);
            }
        }
        Some(("cancel", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let bill = bills::cancel(conn, &owner, id)?;
            println!("Cancelled bill '{}'", bill.name);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            bills::delete(conn, &NetWorthCache, &owner, id)?;
            println!("Removed bill {} and its payment transactions", id);
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let list = bills::list(conn, &owner)?;
            if !maybe_print_json(json_flag, jsonl_flag, &list)? {
                let rows: Vec<Vec<String>> = list
                    .iter()
                    .map(|b| {
                        let every = match b.frequency {
                            Some(BillFrequency::Months(n)) => format!("every {} months", n),
                            Some(f) => f.as_str().to_string(),
                            None => "once".to_string(),
                        };
                        vec![
                            b.id.to_string(),
                            b.name.clone(),
                            fmt_money(&b.amount),
                            b.due_date.to_string(),
                            every,
                            b.status.as_str().to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Id", "Name", "Amount", "Due", "Repeats", "Status"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}
