// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Consistency audit: recomputes every derived field from raw history and
//! reports drift. Read-only; fixing drift is a manual decision.

use crate::utils::{active_profile, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection) -> Result<()> {
    let owner = active_profile(conn)?;
    let mut rows = Vec::new();

    account_drift(conn, &owner, &mut rows)?;
    budget_drift(conn, &owner, &mut rows)?;
    savings_drift(conn, &owner, &mut rows)?;
    loan_drift(conn, &owner, &mut rows)?;
    orphans(conn, &owner, &mut rows)?;

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

fn dec(s: &str) -> Result<Decimal> {
    crate::utils::parse_decimal(s)
}

// balance == initial + sum(income) - sum(expense); credit_used ==
// max(0, sum(expense) - sum(income)) for credit cards.
fn account_drift(conn: &Connection, owner: &str, out: &mut Vec<Vec<String>>) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT id, name, kind, initial_balance, balance, credit_used
         FROM accounts WHERE owner=?1",
    )?;
    let accounts = stmt.query_map(params![owner], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
        ))
    })?;
    for acc in accounts {
        let (id, name, kind, initial_raw, balance_raw, credit_raw) = acc?;
        let mut income = Decimal::ZERO;
        let mut expense = Decimal::ZERO;
        let mut tstmt =
            conn.prepare("SELECT kind, amount FROM transactions WHERE account_id=?1")?;
        let mut cur = tstmt.query(params![id])?;
        while let Some(r) = cur.next()? {
            let k: String = r.get(0)?;
            let a: String = r.get(1)?;
            if k == "income" {
                income += dec(&a)?;
            } else {
                expense += dec(&a)?;
            }
        }
        if kind == "credit-card" {
            let expected = (expense - income).max(Decimal::ZERO);
            let stored = dec(&credit_raw)?;
            if expected != stored {
                out.push(vec![
                    "credit_used_drift".into(),
                    format!("{} (id {}): stored {}, history says {}", name, id, stored, expected),
                ]);
            }
        } else {
            let expected = dec(&initial_raw)? + income - expense;
            let stored = dec(&balance_raw)?;
            if expected != stored {
                out.push(vec![
                    "balance_drift".into(),
                    format!("{} (id {}): stored {}, history says {}", name, id, stored, expected),
                ]);
            }
        }
    }
    Ok(())
}

fn budget_drift(conn: &Connection, owner: &str, out: &mut Vec<Vec<String>>) -> Result<()> {
    let mut stmt =
        conn.prepare("SELECT id, category, spent_amount FROM budgets WHERE owner=?1")?;
    let budgets = stmt.query_map(params![owner], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    for b in budgets {
        let (id, category, spent_raw) = b?;
        let mut lstmt = conn.prepare("SELECT amount FROM budget_lines WHERE budget_id=?1")?;
        let mut cur = lstmt.query(params![id])?;
        let mut total = Decimal::ZERO;
        while let Some(r) = cur.next()? {
            let a: String = r.get(0)?;
            total += dec(&a)?;
        }
        let stored = dec(&spent_raw)?;
        if total != stored {
            out.push(vec![
                "budget_spent_drift".into(),
                format!("budget {} ({}): stored {}, lines sum to {}", id, category, stored, total),
            ]);
        }
    }
    Ok(())
}

fn savings_drift(conn: &Connection, owner: &str, out: &mut Vec<Vec<String>>) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT id, name, amount, running_balance, status FROM savings_vehicles WHERE owner=?1",
    )?;
    let vehicles = stmt.query_map(params![owner], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
        ))
    })?;
    for v in vehicles {
        let (id, name, amount_raw, running_raw, status) = v?;
        let stored = dec(&running_raw)?;
        if status == "closed" {
            if stored != Decimal::ZERO {
                out.push(vec![
                    "closed_vehicle_nonzero".into(),
                    format!("{} (id {}): running balance {}", name, id, stored),
                ]);
            }
            continue;
        }
        let mut expected = dec(&amount_raw)?;
        let mut estmt =
            conn.prepare("SELECT kind, amount FROM savings_transactions WHERE vehicle_id=?1")?;
        let mut cur = estmt.query(params![id])?;
        while let Some(r) = cur.next()? {
            let k: String = r.get(0)?;
            let a: String = r.get(1)?;
            if k == "deposit" || k == "interest" {
                expected += dec(&a)?;
            } else {
                expected -= dec(&a)?;
            }
        }
        if expected != stored {
            out.push(vec![
                "running_balance_drift".into(),
                format!("{} (id {}): stored {}, history says {}", name, id, stored, expected),
            ]);
        }
    }
    Ok(())
}

fn loan_drift(conn: &Connection, owner: &str, out: &mut Vec<Vec<String>>) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT id, counterparty, amount, remaining_balance FROM loans WHERE owner=?1",
    )?;
    let loans = stmt.query_map(params![owner], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
        ))
    })?;
    for l in loans {
        let (id, counterparty, amount_raw, remaining_raw) = l?;
        let mut pstmt = conn.prepare("SELECT amount FROM loan_payments WHERE loan_id=?1")?;
        let mut cur = pstmt.query(params![id])?;
        let mut paid = Decimal::ZERO;
        while let Some(r) = cur.next()? {
            let a: String = r.get(0)?;
            paid += dec(&a)?;
        }
        let expected = (dec(&amount_raw)? - paid).max(Decimal::ZERO);
        let stored = dec(&remaining_raw)?;
        if expected != stored {
            out.push(vec![
                "loan_remaining_drift".into(),
                format!("loan {} ({}): stored {}, history says {}", id, counterparty, stored, expected),
            ]);
        }
    }
    Ok(())
}

fn orphans(conn: &Connection, owner: &str, out: &mut Vec<Vec<String>>) -> Result<()> {
    // Transactions whose owning account vanished (partial cascade).
    let mut stmt = conn.prepare(
        "SELECT id, account_id FROM transactions
         WHERE owner=?1 AND account_id NOT IN (SELECT id FROM accounts)",
    )?;
    let mut cur = stmt.query(params![owner])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let account: i64 = r.get(1)?;
        out.push(vec![
            "orphaned_transaction".into(),
            format!("transaction {} points at missing account {}", id, account),
        ]);
    }

    // Savings events whose companion transaction vanished.
    let mut stmt2 = conn.prepare(
        "SELECT s.id, s.transaction_id FROM savings_transactions s
         JOIN savings_vehicles v ON v.id = s.vehicle_id
         WHERE v.owner=?1 AND s.transaction_id IS NOT NULL
           AND s.transaction_id NOT IN (SELECT id FROM transactions)",
    )?;
    let mut cur2 = stmt2.query(params![owner])?;
    while let Some(r) = cur2.next()? {
        let id: i64 = r.get(0)?;
        let tx: i64 = r.get(1)?;
        out.push(vec![
            "orphaned_savings_event".into(),
            format!("savings event {} points at missing transaction {}", id, tx),
        ]);
    }

    // Budget lines whose transaction vanished.
    let mut stmt3 = conn.prepare(
        "SELECT l.id, l.transaction_id FROM budget_lines l
         JOIN budgets b ON b.id = l.budget_id
         WHERE b.owner=?1 AND l.transaction_id NOT IN (SELECT id FROM transactions)",
    )?;
    let mut cur3 = stmt3.query(params![owner])?;
    while let Some(r) = cur3.next()? {
        let id: i64 = r.get(0)?;
        let tx: i64 = r.get(1)?;
        out.push(vec![
            "orphaned_budget_line".into(),
            format!("budget line {} points at missing transaction {}", id, tx),
        ]);
    }
    Ok(())
}
