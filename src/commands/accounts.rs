// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cache::NetWorthCache;
use crate::ledger::{accounts, cascade};
use crate::models::AccountKind;
use crate::utils::{active_profile, fmt_money, maybe_print_json, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let owner = active_profile(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let kind_s = sub.get_one::<String>("kind").unwrap();
            let kind = AccountKind::parse(kind_s)
                .ok_or_else(|| anyhow::anyhow!("Unknown account kind '{}'", kind_s))?;
            let opening = parse_decimal(sub.get_one::<String>("opening").unwrap())?;
            let credit_limit = sub
                .get_one::<String>("credit-limit")
                .map(|s| parse_decimal(s))
                .transpose()?;
            let account = accounts::create(conn, &owner, name, kind, opening, credit_limit)?;
            println!("Added account '{}' ({}, id {})", account.name, kind.as_str(), account.id);
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let list = accounts::list(conn, &owner)?;
            if !maybe_print_json(json_flag, jsonl_flag, &list)? {
                let rows: Vec<Vec<String>> = list
                    .iter()
                    .map(|a| {
                        let held = if a.kind.is_credit() {
                            format!("-{}", fmt_money(&a.credit_used))
                        } else {
                            fmt_money(&a.balance)
                        };
                        vec![
                            a.id.to_string(),
                            a.name.clone(),
                            a.kind.as_str().to_string(),
                            held,
                            a.credit_limit.as_ref().map(fmt_money).unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Id", "Name", "Kind", "Balance", "Credit limit"], rows)
                );
            }
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            cascade::delete_account(conn, &NetWorthCache, &owner, id)?;
            println!("Removed account {} and its transactions", id);
        }
        _ => {}
    }
    Ok(())
}
