// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Transaction create/update/delete choreography. Every path runs the
//! balance ledger and the budget synchronizer in a fixed order inside one
//! storage transaction.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::ledger::{
    balance, budgets, require_positive, stored_amount, Invalidator, LedgerError, LedgerResult,
};
use crate::models::{Transaction, TxKind};

pub fn create(
    conn: &mut Connection,
    inv: &dyn Invalidator,
    owner: &str,
    account_id: i64,
    kind: TxKind,
    category: &str,
    amount: Decimal,
    date: NaiveDate,
    description: Option<&str>,
) -> LedgerResult<Transaction> {
    let txn = conn.transaction()?;
    let created = create_in(
        &txn,
        owner,
        account_id,
        kind,
        category,
        amount,
        date,
        description,
        None,
    )?;
    txn.commit()?;
    inv.invalidate(owner);
    Ok(created)
}

/// Shared insertion path; the savings and bill engines call this with a
/// `source` tag so their rows are marked machine-generated.
#[allow(clippy::too_many_arguments)]
pub(crate) fn create_in(
    conn: &Connection,
    owner: &str,
    account_id: i64,
    kind: TxKind,
    category: &str,
    amount: Decimal,
    date: NaiveDate,
    description: Option<&str>,
    source: Option<&str>,
) -> LedgerResult<Transaction> {
    require_positive(amount, "transaction amount")?;
    if category.trim().is_empty() {
        return Err(LedgerError::Validation("category must not be empty".into()));
    }
    // The owning account must exist up front; only deletions tolerate
    // orphans.
    let owned: Option<i64> = conn
        .query_row(
            "SELECT id FROM accounts WHERE id=?1 AND owner=?2",
            params![account_id, owner],
            |r| r.get(0),
        )
        .optional()?;
    if owned.is_none() {
        return Err(LedgerError::not_found("account", account_id));
    }

    conn.execute(
        "INSERT INTO transactions(owner, account_id, kind, category, amount, date, description, source)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            owner,
            account_id,
            kind.as_str(),
            category,
            amount.to_string(),
            date.to_string(),
            description,
            source
        ],
    )?;
    let tx = Transaction {
        id: conn.last_insert_rowid(),
        owner: owner.to_string(),
        account_id,
        kind,
        category: category.to_string(),
        amount,
        date,
        description: description.map(|s| s.to_string()),
        source: source.map(|s| s.to_string()),
    };

    balance::apply(conn, &tx)?;
    if tx.kind == TxKind::Expense {
        budgets::attribute(conn, &tx)?;
    }
    Ok(tx)
}

/// Changeset for [`update`]. `None` leaves a field as it is;
/// `description: Some(None)` clears the description.
#[derive(Debug, Default)]
pub struct TransactionPatch {
    pub account_id: Option<i64>,
    pub kind: Option<TxKind>,
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub description: Option<Option<String>>,
}

pub fn update(
    conn: &mut Connection,
    inv: &dyn Invalidator,
    owner: &str,
    id: i64,
    patch: TransactionPatch,
) -> LedgerResult<Transaction> {
    let txn = conn.transaction()?;
    let old = get_in(&txn, owner, id)?;
    if old.source.is_some() {
        return Err(LedgerError::Validation(
            "machine-generated transactions cannot be edited; delete the originating record instead"
                .into(),
        ));
    }

    let new = Transaction {
        id: old.id,
        owner: old.owner.clone(),
        account_id: patch.account_id.unwrap_or(old.account_id),
        kind: patch.kind.unwrap_or(old.kind),
        category: patch.category.unwrap_or_else(|| old.category.clone()),
        amount: patch.amount.unwrap_or(old.amount),
        date: patch.date.unwrap_or(old.date),
        description: match patch.description {
            Some(d) => d,
            None => old.description.clone(),
        },
        source: None,
    };
    require_positive(new.amount, "transaction amount")?;
    if new.account_id != old.account_id {
        let owned: Option<i64> = txn
            .query_row(
                "SELECT id FROM accounts WHERE id=?1 AND owner=?2",
                params![new.account_id, owner],
                |r| r.get(0),
            )
            .optional()?;
        if owned.is_none() {
            return Err(LedgerError::not_found("account", new.account_id));
        }
    }

    txn.execute(
        "UPDATE transactions SET account_id=?1, kind=?2, category=?3, amount=?4, date=?5, description=?6
         WHERE id=?7",
        params![
            new.account_id,
            new.kind.as_str(),
            new.category,
            new.amount.to_string(),
            new.date.to_string(),
            new.description,
            new.id
        ],
    )?;

    // Undo the old ledger effect, apply the new one; with a moved account
    // each side hits its own record.
    balance::reverse(&txn, &old)?;
    balance::apply(&txn, &new)?;

    // Budget side: a change of kind/category/date can move the row across
    // budget windows, so detach and re-attribute; a pure amount change
    // amends the captured line in place.
    let rerouted =
        new.kind != old.kind || new.category != old.category || new.date != old.date;
    if old.kind == TxKind::Expense {
        if rerouted {
            budgets::detach(&txn, old.id)?;
        } else if new.amount != old.amount {
            budgets::amend(&txn, old.id, new.amount)?;
        }
    }
    if new.kind == TxKind::Expense && (rerouted || old.kind != TxKind::Expense) {
        budgets::attribute(&txn, &new)?;
    }

    txn.commit()?;
    inv.invalidate(owner);
    Ok(new)
}

pub fn delete(
    conn: &mut Connection,
    inv: &dyn Invalidator,
    owner: &str,
    id: i64,
) -> LedgerResult<()> {
    let txn = conn.transaction()?;
    delete_in(&txn, owner, id)?;
    txn.commit()?;
    inv.invalidate(owner);
    Ok(())
}

/// Mirror of creation: reverse the ledger effect, detach from any budget,
/// then drop the row. Cascades reuse this so there is exactly one deletion
/// path.
pub(crate) fn delete_in(conn: &Connection, owner: &str, id: i64) -> LedgerResult<()> {
    let old = get_in(conn, owner, id)?;
    balance::reverse(conn, &old)?;
    if old.kind == TxKind::Expense {
        budgets::detach(conn, old.id)?;
    }
    conn.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    Ok(())
}

pub fn get(conn: &Connection, owner: &str, id: i64) -> LedgerResult<Transaction> {
    get_in(conn, owner, id)
}

pub(crate) fn get_in(conn: &Connection, owner: &str, id: i64) -> LedgerResult<Transaction> {
    let row: Option<(i64, String, i64, String, String, String, String, Option<String>, Option<String>)> =
        conn.query_row(
            "SELECT id, owner, account_id, kind, category, amount, date, description, source
             FROM transactions WHERE id=?1 AND owner=?2",
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
                    r.get(8)?,
                ))
            },
        )
        .optional()?;
    let Some((id, owner, account_id, kind_raw, category, amount_raw, date_raw, description, source)) =
        row
    else {
        return Err(LedgerError::not_found("transaction", id));
    };
    let kind = TxKind::parse(&kind_raw).ok_or_else(|| LedgerError::Corrupt {
        what: "transaction kind",
        value: kind_raw,
    })?;
    let date = NaiveDate::parse_from_str(&date_raw, "%Y-%m-%d").map_err(|_| LedgerError::Corrupt {
        what: "date",
        value: date_raw,
    })?;
    Ok(Transaction {
        id,
        owner,
        account_id,
        kind,
        category,
        amount: stored_amount(&amount_raw)?,
        date,
        description,
        source,
    })
}
