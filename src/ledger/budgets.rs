// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Budget synchronizer: keeps the set of expense transactions attributed to
//! a budget window, and the derived `spent_amount`, in step with the
//! transaction store.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::ledger::{require_positive, stored_amount, LedgerError, LedgerResult};
use crate::models::{Budget, BudgetLine, Transaction};

/// Creates a budget. Rejects a window overlapping an existing budget for the
/// same owner and category, then backfills: every expense already inside the
/// window is attributed immediately.
pub fn create(
    conn: &mut Connection,
    owner: &str,
    category: &str,
    name: Option<&str>,
    limit_amount: Decimal,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> LedgerResult<Budget> {
    require_positive(limit_amount, "budget limit")?;
    if category.trim().is_empty() {
        return Err(LedgerError::Validation("category must not be empty".into()));
    }
    if end_date < start_date {
        return Err(LedgerError::Validation(format!(
            "budget window ends ({}) before it starts ({})",
            end_date, start_date
        )));
    }
    let txn = conn.transaction()?;

    let overlap: Option<i64> = txn
        .query_row(
            "SELECT id FROM budgets
             WHERE owner=?1 AND category=?2 AND start_date<=?3 AND end_date>=?4
             LIMIT 1",
            params![owner, category, end_date.to_string(), start_date.to_string()],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(existing) = overlap {
        return Err(LedgerError::Validation(format!(
            "budget window overlaps existing budget {} for category '{}'",
            existing, category
        )));
    }

    txn.execute(
        "INSERT INTO budgets(owner, category, name, limit_amount, start_date, end_date, spent_amount)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, '0')",
        params![
            owner,
            category,
            name,
            limit_amount.to_string(),
            start_date.to_string(),
            end_date.to_string()
        ],
    )?;
    let budget_id = txn.last_insert_rowid();

    // One-time backfill of the window. The UNIQUE(transaction_id) column
    // makes double attribution impossible, so rows already captured by a
    // (non-overlapping) sibling are skipped outright.
    {
        let mut stmt = txn.prepare(
            "SELECT id, amount, date, description FROM transactions
             WHERE owner=?1 AND category=?2 AND kind='expense' AND date>=?3 AND date<=?4
               AND id NOT IN (SELECT transaction_id FROM budget_lines)
             ORDER BY date, id",
        )?;
        let rows = stmt.query_map(
            params![owner, category, start_date.to_string(), end_date.to_string()],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, Option<String>>(3)?,
                ))
            },
        )?;
        for row in rows {
            let (tx_id, amount, date, description) = row?;
            txn.execute(
                "INSERT INTO budget_lines(budget_id, transaction_id, amount, date, description)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![budget_id, tx_id, amount, date, description],
            )?;
        }
    }
    recompute_spent(&txn, budget_id)?;

    let budget = get_in(&txn, owner, budget_id)?;
    txn.commit()?;
    Ok(budget)
}

/// Attributes an expense to at most one budget whose window contains its
/// date. No matching budget is a silent no-op: most expenses have no active
/// budget.
pub(crate) fn attribute(conn: &Connection, tx: &Transaction) -> LedgerResult<()> {
    // Creation-time uniqueness means at most one window can match; ORDER BY
    // keeps the pick deterministic if that invariant is ever broken.
    let budget: Option<i64> = conn
        .query_row(
            "SELECT id FROM budgets
             WHERE owner=?1 AND category=?2 AND start_date<=?3 AND end_date>=?3
             ORDER BY id LIMIT 1",
            params![tx.owner, tx.category, tx.date.to_string()],
            |r| r.get(0),
        )
        .optional()?;
    let Some(budget_id) = budget else {
        return Ok(());
    };
    conn.execute(
        "INSERT INTO budget_lines(budget_id, transaction_id, amount, date, description)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            budget_id,
            tx.id,
            tx.amount.to_string(),
            tx.date.to_string(),
            tx.description
        ],
    )?;
    recompute_spent(conn, budget_id)
}

/// Removes the line item holding this transaction (at most one, by
/// construction) and recomputes the owning budget's spent total.
pub(crate) fn detach(conn: &Connection, transaction_id: i64) -> LedgerResult<()> {
    let holder: Option<i64> = conn
        .query_row(
            "SELECT budget_id FROM budget_lines WHERE transaction_id=?1",
            params![transaction_id],
            |r| r.get(0),
        )
        .optional()?;
    let Some(budget_id) = holder else {
        return Ok(());
    };
    conn.execute(
        "DELETE FROM budget_lines WHERE transaction_id=?1",
        params![transaction_id],
    )?;
    recompute_spent(conn, budget_id)
}

/// Overwrites the captured amount on the line holding this transaction and
/// recomputes the spent total.
pub(crate) fn amend(conn: &Connection, transaction_id: i64, new_amount: Decimal) -> LedgerResult<()> {
    let holder: Option<i64> = conn
        .query_row(
            "SELECT budget_id FROM budget_lines WHERE transaction_id=?1",
            params![transaction_id],
            |r| r.get(0),
        )
        .optional()?;
    let Some(budget_id) = holder else {
        return Ok(());
    };
    conn.execute(
        "UPDATE budget_lines SET amount=?1 WHERE transaction_id=?2",
        params![new_amount.to_string(), transaction_id],
    )?;
    recompute_spent(conn, budget_id)
}

// spent_amount is written here and nowhere else.
fn recompute_spent(conn: &Connection, budget_id: i64) -> LedgerResult<()> {
    let mut stmt = conn.prepare("SELECT amount FROM budget_lines WHERE budget_id=?1")?;
    let mut rows = stmt.query(params![budget_id])?;
    let mut total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let raw: String = r.get(0)?;
        total += stored_amount(&raw)?;
    }
    conn.execute(
        "UPDATE budgets SET spent_amount=?1 WHERE id=?2",
        params![total.to_string(), budget_id],
    )?;
    Ok(())
}

pub fn delete(conn: &mut Connection, owner: &str, id: i64) -> LedgerResult<()> {
    let txn = conn.transaction()?;
    get_in(&txn, owner, id)?;
    // Lines cascade with the row; dropping a budget has no ledger effect.
    txn.execute("DELETE FROM budgets WHERE id=?1", params![id])?;
    txn.commit()?;
    Ok(())
}

pub fn get(conn: &Connection, owner: &str, id: i64) -> LedgerResult<Budget> {
    get_in(conn, owner, id)
}

fn get_in(conn: &Connection, owner: &str, id: i64) -> LedgerResult<Budget> {
    let row: Option<(i64, String, String, Option<String>, String, String, String, String)> = conn
        .query_row(
            "SELECT id, owner, category, name, limit_amount, start_date, end_date, spent_amount
             FROM budgets WHERE id=?1 AND owner=?2",
            params![id, owner],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                    r.get(6)?,
                    r.get(7)?,
                ))
            },
        )
        .optional()?;
    let Some((id, owner, category, name, limit_raw, start_raw, end_raw, spent_raw)) = row else {
        return Err(LedgerError::not_found("budget", id));
    };
    Ok(Budget {
        id,
        owner,
        category,
        name,
        limit_amount: stored_amount(&limit_raw)?,
        start_date: parse_stored_date(&start_raw)?,
        end_date: parse_stored_date(&end_raw)?,
        spent_amount: stored_amount(&spent_raw)?,
    })
}

pub fn lines(conn: &Connection, budget_id: i64) -> LedgerResult<Vec<BudgetLine>> {
    let mut stmt = conn.prepare(
        "SELECT id, budget_id, transaction_id, amount, date, description
         FROM budget_lines WHERE budget_id=?1 ORDER BY date, id",
    )?;
    let rows = stmt.query_map(params![budget_id], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, i64>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, Option<String>>(5)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, budget_id, transaction_id, amount_raw, date_raw, description) = row?;
        out.push(BudgetLine {
            id,
            budget_id,
            transaction_id,
            amount: stored_amount(&amount_raw)?,
            date: parse_stored_date(&date_raw)?,
            description,
        });
    }
    Ok(out)
}

fn parse_stored_date(raw: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| LedgerError::Corrupt {
        what: "date",
        value: raw.to_string(),
    })
}
