// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::cache::NetWorthCache;
use crate::ledger::transactions::{self, TransactionPatch};
use crate::models::TxKind;
use crate::utils::{
    active_profile, id_for_account, maybe_print_json, parse_date, parse_decimal, pretty_table,
};
use anyhow::Result;
use chrono::Local;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let owner = active_profile(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => add(conn, &owner, sub)?,
        Some(("edit", sub)) => edit(conn, &owner, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            transactions::delete(conn, &NetWorthCache, &owner, id)?;
            println!("Deleted transaction {}", id);
        }
        Some(("list", sub)) => list(conn, &owner, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let account_name = sub.get_one::<String>("account").unwrap();
    let kind_s = sub.get_one::<String>("kind").unwrap();
    let kind = TxKind::parse(kind_s)
        .ok_or_else(|| anyhow::anyhow!("Unknown transaction kind '{}'", kind_s))?;
    let category = sub.get_one::<String>("category").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => Local::now().date_naive(),
    };
    let note = sub.get_one::<String>("note").map(|s| s.as_str());

    let account_id = id_for_account(conn, owner, account_name)?;
    let tx = transactions::create(
        conn,
        &NetWorthCache,
        owner,
        account_id,
        kind,
        category,
        amount,
        date,
        note,
    )?;
    println!(
        "Recorded {} {} of {} on {} (acct: {})",
        category,
        kind.as_str(),
        amount,
        tx.date,
        account_name
    );
    Ok(())
}

fn edit(conn: &mut Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let mut patch = TransactionPatch::default();
    if let Some(name) = sub.get_one::<String>("account") {
        patch.account_id = Some(id_for_account(conn, owner, name)?);
    }
    if let Some(kind_s) = sub.get_one::<String>("kind") {
        patch.kind = Some(
            TxKind::parse(kind_s)
                .ok_or_else(|| anyhow::anyhow!("Unknown transaction kind '{}'", kind_s))?,
        );
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        patch.category = Some(cat.clone());
    }
    if let Some(amt) = sub.get_one::<String>("amount") {
        patch.amount = Some(parse_decimal(amt)?);
    }
    if let Some(d) = sub.get_one::<String>("date") {
        patch.date = Some(parse_date(d)?);
    }
    if let Some(note) = sub.get_one::<String>("note") {
        patch.description = Some(Some(note.clone()));
    }
    let tx = transactions::update(conn, &NetWorthCache, owner, id, patch)?;
    println!("Updated transaction {} ({} {})", tx.id, tx.category, tx.amount);
    Ok(())
}

fn list(conn: &Connection, owner: &str, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, owner, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.account.clone(),
                    r.kind.clone(),
                    r.category.clone(),
                    r.amount.clone(),
                    r.source.clone(),
                    r.note.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Date", "Account", "Kind", "Category", "Amount", "Source", "Note"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub account: String,
    pub kind: String,
    pub category: String,
    pub amount: String,
    pub source: String,
    pub note: String,
}

pub fn query_rows(
    conn: &Connection,
    owner: &str,
    sub: &clap::ArgMatches,
) -> Result<Vec<TransactionRow>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, a.name, t.kind, t.category, t.amount, t.source, t.description
         FROM transactions t LEFT JOIN accounts a ON t.account_id=a.id WHERE t.owner=?",
    );
    let mut params_vec: Vec<String> = vec![owner.to_string()];

    if let Some(month) = sub.get_one::<String>("month") {
        sql.push_str(" AND substr(t.date,1,7)=?");
        params_vec.push(month.into());
    }
    if let Some(acct) = sub.get_one::<String>("account") {
        sql.push_str(" AND a.name=?");
        params_vec.push(acct.into());
    }
    if let Some(cat) = sub.get_one::<String>("category") {
        sql.push_str(" AND t.category=?");
        params_vec.push(cat.into());
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> = params_vec
        .iter()
        .map(|s| s as &dyn rusqlite::ToSql)
        .collect();
    let mut rows = stmt.query(rusqlite::params_from_iter(params))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let date: String = r.get(1)?;
        let account: Option<String> = r.get(2)?;
        let kind: String = r.get(3)?;
        let category: String = r.get(4)?;
        let amount: String = r.get(5)?;
        let source: Option<String> = r.get(6)?;
        let note: Option<String> = r.get(7)?;
        data.push(TransactionRow {
            id,
            date,
            account: account.unwrap_or_else(|| "(deleted)".into()),
            kind,
            category,
            amount,
            source: source.unwrap_or_default(),
            note: note.unwrap_or_default(),
        });
    }
    Ok(data)
}
