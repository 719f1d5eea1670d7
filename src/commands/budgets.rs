// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::budgets;
use crate::utils::{active_profile, fmt_money, maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let owner = active_profile(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let category = sub.get_one::<String>("category").unwrap();
            let limit = parse_decimal(sub.get_one::<String>("limit").unwrap())?;
            let from = parse_date(sub.get_one::<String>("from").unwrap())?;
            let to = parse_date(sub.get_one::<String>("to").unwrap())?;
            let name = sub.get_one::<String>("name").map(|s| s.as_str());
            let budget = budgets::create(conn, &owner, category, name, limit, from, to)?;
            println!(
                "Budget {} set for '{}' {}..{} (limit {}, already spent {})",
                budget.id,
                budget.category,
                budget.start_date,
                budget.end_date,
                fmt_money(&budget.limit_amount),
                fmt_money(&budget.spent_amount)
            );
        }
        Some(("list", sub)) => list(conn, &owner, sub)?,
        Some(("show", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let budget = budgets::get(conn, &owner, id)?;
            let lines = budgets::lines(conn, id)?;
            let rows: Vec<Vec<String>> = lines
                .iter()
                .map(|l| {
                    vec![
                        l.transaction_id.to_string(),
                        l.date.to_string(),
                        fmt_money(&l.amount),
                        l.description.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            println!(
                "Budget {} '{}' {}..{}: spent {} of {}",
                budget.id,
                budget.category,
                budget.start_date,
                budget.end_date,
                fmt_money(&budget.spent_amount),
                fmt_money(&budget.limit_amount)
            );
            println!("{}", pretty_table(&["Tx", "Date", "Amount", "Note"], rows));
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            budgets::delete(conn, &owner, id)?;
            println!("Removed budget {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn list(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let mut stmt = conn.prepare(
        "SELECT id, category, name, limit_amount, start_date, end_date, spent_amount
         FROM budgets WHERE owner=?1 ORDER BY start_date DESC, category",
    )?;
    let rows = stmt.query_map(params![owner], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, Option<String>>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, String>(6)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (id, category, name, limit, start, end, spent) = row?;
        data.push(vec![
            id.to_string(),
            category,
            name.unwrap_or_default(),
            format!("{}..{}", start, end),
            limit,
            spent,
        ]);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!(
            "{}",
            pretty_table(&["Id", "Category", "Name", "Window", "Limit", "Spent"], data)
        );
    }
    Ok(())
}
