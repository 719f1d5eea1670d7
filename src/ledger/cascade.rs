// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Cascade manager: deleting an owning record takes every dependent record
//! with it, and every dependent deletion runs through the single
//! transaction-deletion path so ledger and budget effects are reversed. The
//! whole walk commits as one storage transaction.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use crate::ledger::{transactions, Invalidator, LedgerError, LedgerResult};

pub fn delete_account(
    conn: &mut Connection,
    inv: &dyn Invalidator,
    owner: &str,
    account_id: i64,
) -> LedgerResult<()> {
    let txn = conn.transaction()?;
    let exists: Option<i64> = txn
        .query_row(
            "SELECT id FROM accounts WHERE id=?1 AND owner=?2",
            params![account_id, owner],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(LedgerError::not_found("account", account_id));
    }

    let tx_ids: Vec<i64> = {
        let mut stmt =
            txn.prepare("SELECT id FROM transactions WHERE account_id=?1 AND owner=?2")?;
        let ids = stmt.query_map(params![account_id, owner], |r| r.get(0))?;
        ids.collect::<rusqlite::Result<_>>()?
    };
    for tx_id in tx_ids {
        transactions::delete_in(&txn, owner, tx_id)?;
    }

    // Bills drawn on this account have nothing left to pay from; their
    // recorded payment references died with the transactions above.
    txn.execute(
        "DELETE FROM bills WHERE account_id=?1 AND owner=?2",
        params![account_id, owner],
    )?;

    txn.execute("DELETE FROM accounts WHERE id=?1", params![account_id])?;
    txn.commit()?;
    inv.invalidate(owner);
    Ok(())
}

pub fn delete_savings_vehicle(
    conn: &mut Connection,
    inv: &dyn Invalidator,
    owner: &str,
    vehicle_id: i64,
) -> LedgerResult<()> {
    let txn = conn.transaction()?;
    let exists: Option<i64> = txn
        .query_row(
            "SELECT id FROM savings_vehicles WHERE id=?1 AND owner=?2",
            params![vehicle_id, owner],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Err(LedgerError::not_found("savings vehicle", vehicle_id));
    }

    let companions: Vec<(i64, Option<i64>)> = {
        let mut stmt = txn
            .prepare("SELECT id, transaction_id FROM savings_transactions WHERE vehicle_id=?1")?;
        let rows = stmt.query_map(params![vehicle_id], |r| Ok((r.get(0)?, r.get(1)?)))?;
        rows.collect::<rusqlite::Result<_>>()?
    };
    for (event_id, tx_id) in companions {
        let Some(tx_id) = tx_id else { continue };
        match transactions::delete_in(&txn, owner, tx_id) {
            // Companion may have vanished in an earlier account cascade.
            Err(LedgerError::NotFound { .. }) => {
                warn!(event = event_id, transaction = tx_id, "companion transaction already gone");
            }
            other => other?,
        }
    }

    // Event rows cascade with the vehicle.
    txn.execute(
        "DELETE FROM savings_vehicles WHERE id=?1",
        params![vehicle_id],
    )?;
    txn.commit()?;
    inv.invalidate(owner);
    Ok(())
}
