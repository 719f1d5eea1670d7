// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Balance ledger: applies or reverses the effect of one transaction on its
//! owning account. This is the only place account balances are written.
//!
//! Callers guarantee at-most-one apply per creation and at-most-one reverse
//! per deletion; the functions themselves are plain algebra over the stored
//! balance.

use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use tracing::warn;

use crate::ledger::{stored_amount, LedgerError, LedgerResult};
use crate::models::{Transaction, TxKind};

pub fn apply(conn: &Connection, tx: &Transaction) -> LedgerResult<()> {
    shift(conn, tx, false)
}

/// Exact algebraic inverse of [`apply`].
pub fn reverse(conn: &Connection, tx: &Transaction) -> LedgerResult<()> {
    shift(conn, tx, true)
}

fn shift(conn: &Connection, tx: &Transaction, reversing: bool) -> LedgerResult<()> {
    let row: Option<(String, String, String)> = conn
        .query_row(
            "SELECT kind, balance, credit_used FROM accounts WHERE id=?1",
            params![tx.account_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    // Deletions may race with account removal: a missing owning account
    // means the transaction is orphaned, and the effect is skipped.
    let Some((kind, balance_raw, credit_raw)) = row else {
        warn!(
            transaction = tx.id,
            account = tx.account_id,
            "owning account is gone; ledger effect skipped"
        );
        return Ok(());
    };

    // Delta as seen by a cash-like balance: income adds, expense subtracts,
    // reversal flips the sign.
    let mut delta = match tx.kind {
        TxKind::Income => tx.amount,
        TxKind::Expense => -tx.amount,
    };
    if reversing {
        delta = -delta;
    }

    if kind == "credit-card" {
        // Credit cards invert: an expense grows credit_used, an income pays
        // it down, floored at zero on the forward pay-down only.
        let old = stored_amount(&credit_raw)?;
        let mut new = old - delta;
        if !reversing && tx.kind == TxKind::Income && new < Decimal::ZERO {
            new = Decimal::ZERO;
        }
        guarded_write(conn, "credit_used", tx.account_id, &credit_raw, new)
    } else {
        let old = stored_amount(&balance_raw)?;
        guarded_write(conn, "balance", tx.account_id, &balance_raw, old + delta)
    }
}

// Single read-then-conditional-write per mutation: the update only lands if
// the stored value is still the one we read.
fn guarded_write(
    conn: &Connection,
    column: &str,
    account_id: i64,
    old_raw: &str,
    new: Decimal,
) -> LedgerResult<()> {
    let sql = format!("UPDATE accounts SET {col}=?1 WHERE id=?2 AND {col}=?3", col = column);
    let changed = conn.execute(&sql, params![new.to_string(), account_id, old_raw])?;
    if changed == 0 {
        return Err(LedgerError::Conflict {
            kind: "account",
            id: account_id,
        });
    }
    Ok(())
}
