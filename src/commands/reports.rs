// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cache::NetWorthCache;
use crate::ledger::bills;
use crate::models::BillStatus;
use crate::utils::{active_profile, fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::{Duration, Local};
use rusqlite::{params, Connection};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let owner = active_profile(conn)?;
    match m.subcommand() {
        Some(("net-worth", sub)) => net_worth(conn, &owner, sub)?,
        Some(("budgets", sub)) => budgets(conn, &owner, sub)?,
        Some(("upcoming-bills", sub)) => upcoming_bills(conn, &owner, sub)?,
        _ => {}
    }
    Ok(())
}

fn net_worth(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let value = NetWorthCache.get_or_compute(conn, owner)?;
    if !maybe_print_json(json_flag, jsonl_flag, &fmt_money(&value))? {
        println!("Net worth for '{}': {}", owner, fmt_money(&value));
    }
    Ok(())
}

fn budgets(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let mut stmt = conn.prepare(
        "SELECT category, limit_amount, spent_amount, start_date, end_date
         FROM budgets WHERE owner=?1 ORDER BY start_date DESC, category",
    )?;
    let rows = stmt.query_map(params![owner], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (category, limit_raw, spent_raw, start, end) = row?;
        let limit = crate::utils::parse_decimal(&limit_raw)?;
        let spent = crate::utils::parse_decimal(&spent_raw)?;
        let left = limit - spent;
        data.push(vec![
            category,
            format!("{}..{}", start, end),
            fmt_money(&limit),
            fmt_money(&spent),
            fmt_money(&left),
        ]);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!(
            "{}",
            pretty_table(&["Category", "Window", "Limit", "Spent", "Remaining"], data)
        );
    }
    Ok(())
}

fn upcoming_bills(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let days = *sub.get_one::<i64>("days").unwrap();
    let horizon = Local::now().date_naive() + Duration::days(days);
    let mut data = Vec::new();
    for bill in bills::list(conn, owner)? {
        if bill.status != BillStatus::Unpaid || bill.due_date > horizon {
            continue;
        }
        data.push(vec![
            bill.id.to_string(),
            bill.name.clone(),
            fmt_money(&bill.amount),
            bill.due_date.to_string(),
        ]);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!("{}", pretty_table(&["Id", "Name", "Amount", "Due"], data));
    }
    Ok(())
}
