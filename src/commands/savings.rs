// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cache::NetWorthCache;
use crate::ledger::savings;
use crate::models::SavingsTxKind;
use crate::utils::{
    active_profile, fmt_money, id_for_account, maybe_print_json, parse_date, parse_decimal,
    pretty_table,
};
use anyhow::Result;
use chrono::Local;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let owner = active_profile(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let vtype = sub.get_one::<String>("type").unwrap();
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let vehicle = savings::create_vehicle(conn, &owner, name, vtype, amount)?;
            println!(
                "Opened savings vehicle '{}' (id {}, balance {})",
                vehicle.name,
                vehicle.id,
                fmt_money(&vehicle.running_balance)
            );
        }
        Some(("record", sub)) => record(conn, &owner, sub)?,
        Some(("close", sub)) => close(conn, &owner, sub)?,
        Some(("rm-event", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            savings::delete_event(conn, &NetWorthCache, &owner, id)?;
            println!("Deleted savings event {}", id);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            crate::ledger::cascade::delete_savings_vehicle(conn, &NetWorthCache, &owner, id)?;
            println!("Removed savings vehicle {} and its events", id);
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let list = savings::list(conn, &owner)?;
            if !maybe_print_json(json_flag, jsonl_flag, &list)? {
                let rows: Vec<Vec<String>> = list
                    .iter()
                    .map(|v| {
                        vec![
                            v.id.to_string(),
                            v.name.clone(),
                            v.vehicle_type.clone(),
                            fmt_money(&v.running_balance),
                            v.status.as_str().to_string(),
                            v.closed_at.map(|d| d.to_string()).unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Id", "Name", "Type", "Balance", "Status", "Closed"], rows)
                );
            }
        }
        Some(("events", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let events = savings::events(conn, &owner, id)?;
            if !maybe_print_json(json_flag, jsonl_flag, &events)? {
                let rows: Vec<Vec<String>> = events
                    .iter()
                    .map(|e| {
                        vec![
                            e.id.to_string(),
                            e.date.to_string(),
                            e.kind.as_str().to_string(),
                            fmt_money(&e.amount),
                            e.transaction_id.map(|t| t.to_string()).unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Id", "Date", "Kind", "Amount", "Tx"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}

fn record(conn: &mut Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let vehicle_id = *sub.get_one::<i64>("id").unwrap();
    let kind_s = sub.get_one::<String>("kind").unwrap();
    let kind = SavingsTxKind::parse(kind_s)
        .ok_or_else(|| anyhow::anyhow!("Unknown savings event kind '{}'", kind_s))?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => Local::now().date_naive(),
    };
    let account = sub
        .get_one::<String>("account")
        .map(|name| id_for_account(conn, owner, name))
        .transpose()?;
    let note = sub.get_one::<String>("note").map(|s| s.as_str());

    let event = savings::record(
        conn,
        &NetWorthCache,
        owner,
        vehicle_id,
        kind,
        amount,
        date,
        account,
        note,
    )?;
    println!(
        "Recorded {} of {} on vehicle {} (event {})",
        kind.as_str(),
        amount,
        vehicle_id,
        event.id
    );
    Ok(())
}

fn close(conn: &mut Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let vehicle_id = *sub.get_one::<i64>("id").unwrap();
    let redeem = parse_decimal(sub.get_one::<String>("redeem").unwrap())?;
    let to_account = id_for_account(conn, owner, sub.get_one::<String>("to-account").unwrap())?;
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => Local::now().date_naive(),
    };
    let vehicle = savings::close(conn, &NetWorthCache, owner, vehicle_id, redeem, to_account, date)?;
    println!(
        "Closed '{}' on {}, redeemed {}",
        vehicle.name,
        vehicle.closed_at.map(|d| d.to_string()).unwrap_or_default(),
        fmt_money(&redeem)
    );
    Ok(())
}
