// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Bill recurrence engine. Paying a bill emits an ordinary expense
//! transaction (so the balance ledger and budget synchronizer run
//! transitively); a recurring bill then advances its due date and stays
//! unpaid. The stored record always describes the next occurrence.

use chrono::{Duration, Months, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use tracing::warn;

use crate::ledger::{
    require_positive, stored_amount, transactions, Invalidator, LedgerError, LedgerResult,
};
use crate::models::{Bill, BillFrequency, BillStatus, TxKind};

pub fn create(
    conn: &mut Connection,
    owner: &str,
    account_id: i64,
    name: &str,
    amount: Decimal,
    due_date: NaiveDate,
    frequency: Option<BillFrequency>,
) -> LedgerResult<Bill> {
    require_positive(amount, "bill amount")?;
    if let Some(BillFrequency::Months(0)) = frequency {
        return Err(LedgerError::Validation(
            "custom recurrence must be at least one month".into(),
        ));
    }
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
        "INSERT INTO bills(owner, account_id, name, amount, due_date, recurring, frequency, custom_months, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'unpaid')",
        params![
            owner,
            account_id,
            name,
            amount.to_string(),
            due_date.to_string(),
            frequency.is_some(),
            frequency.map(|f| f.as_str()),
            frequency.and_then(|f| f.custom_months()),
        ],
    )?;
    get(conn, owner, conn.last_insert_rowid())
}

/// Pays the current occurrence. For a recurring bill "paid" is momentary:
/// the due date advances one period and the status stays unpaid; a
/// non-recurring bill becomes terminally paid.
pub fn mark_paid(
    conn: &mut Connection,
    inv: &dyn Invalidator,
    owner: &str,
    bill_id: i64,
    paid_on: NaiveDate,
) -> LedgerResult<Bill> {
    let txn = conn.transaction()?;
    let bill = get_in(&txn, owner, bill_id)?;
    match bill.status {
        BillStatus::Paid => {
            return Err(LedgerError::Validation(format!(
                "bill '{}' is already paid",
                bill.name
            )));
        }
        BillStatus::Cancelled => {
            return Err(LedgerError::Validation(format!(
                "bill '{}' is cancelled",
                bill.name
            )));
        }
        BillStatus::Unpaid => {}
    }

    let tx = transactions::create_in(
        &txn,
        owner,
        bill.account_id,
        TxKind::Expense,
        "Bills",
        bill.amount,
        paid_on,
        Some(&bill.name),
        Some("bills"),
    )?;
    txn.execute(
        "INSERT INTO bill_payments(bill_id, transaction_id) VALUES (?1, ?2)",
        params![bill_id, tx.id],
    )?;

    if bill.recurring {
        let frequency = bill.frequency.ok_or(LedgerError::Corrupt {
            what: "bill frequency",
            value: "missing".to_string(),
        })?;
        let next = advance(bill.due_date, frequency)?;
        txn.execute(
            "UPDATE bills SET due_date=?1 WHERE id=?2",
            params![next.to_string(), bill_id],
        )?;
    } else {
        txn.execute(
            "UPDATE bills SET status='paid' WHERE id=?1",
            params![bill_id],
        )?;
    }

    let updated = get_in(&txn, owner, bill_id)?;
    txn.commit()?;
    inv.invalidate(owner);
    Ok(updated)
}

fn advance(due: NaiveDate, frequency: BillFrequency) -> LedgerResult<NaiveDate> {
    let next = match frequency {
        BillFrequency::Daily => due.checked_add_signed(Duration::days(1)),
        BillFrequency::Weekly => due.checked_add_signed(Duration::days(7)),
        BillFrequency::Monthly => due.checked_add_months(Months::new(1)),
        BillFrequency::Yearly => due.checked_add_months(Months::new(12)),
        BillFrequency::Months(n) => due.checked_add_months(Months::new(n)),
    };
    next.ok_or_else(|| LedgerError::Validation(format!("next due date after {} is out of range", due)))
}

/// Terminal: no further occurrences, no further transactions.
pub fn cancel(conn: &mut Connection, owner: &str, bill_id: i64) -> LedgerResult<Bill> {
    let txn = conn.transaction()?;
    let bill = get_in(&txn, owner, bill_id)?;
    match bill.status {
        BillStatus::Cancelled => {
            return Err(LedgerError::Validation(format!(
                "bill '{}' is already cancelled",
                bill.name
            )));
        }
        BillStatus::Paid => {
            return Err(LedgerError::Validation(format!(
                "bill '{}' is already paid",
                bill.name
            )));
        }
        BillStatus::Unpaid => {}
    }
    txn.execute(
        "UPDATE bills SET status='cancelled' WHERE id=?1",
        params![bill_id],
    )?;
    let updated = get_in(&txn, owner, bill_id)?;
    txn.commit()?;
    Ok(updated)
}

/// Removes the bill and every transaction it generated; each deletion runs
/// the full ledger/budget reversal.
pub fn delete(
    conn: &mut Connection,
    inv: &dyn Invalidator,
    owner: &str,
    bill_id: i64,
) -> LedgerResult<()> {
    let txn = conn.transaction()?;
    get_in(&txn, owner, bill_id)?;
    let tx_ids: Vec<i64> = {
        let mut stmt =
            txn.prepare("SELECT transaction_id FROM bill_payments WHERE bill_id=?1")?;
        let ids = stmt.query_map(params![bill_id], |r| r.get(0))?;
        ids.collect::<rusqlite::Result<_>>()?
    };
    for tx_id in tx_ids {
        match transactions::delete_in(&txn, owner, tx_id) {
            Err(LedgerError::NotFound { .. }) => {
                warn!(bill = bill_id, transaction = tx_id, "bill payment already gone");
            }
            other => other?,
        }
    }
    txn.execute("DELETE FROM bills WHERE id=?1", params![bill_id])?;
    txn.commit()?;
    inv.invalidate(owner);
    Ok(())
}

pub fn get(conn: &Connection, owner: &str, id: i64) -> LedgerResult<Bill> {
    get_in(conn, owner, id)
}

fn get_in(conn: &Connection, owner: &str, id: i64) -> LedgerResult<Bill> {
    let row: Option<(i64, String, i64, String, String, String, bool, Option<String>, Option<u32>, String)> =
        conn.query_row(
            "SELECT id, owner, account_id, name, amount, due_date, recurring, frequency, custom_months, status
             FROM bills WHERE id=?1 AND owner=?2",
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
                    r.get(9)?,
                ))
            },
        )
        .optional()?;
    let Some((id, owner, account_id, name, amount_raw, due_raw, recurring, freq_raw, custom, status_raw)) =
        row
    else {
        return Err(LedgerError::not_found("bill", id));
    };
    let status = BillStatus::parse(&status_raw).ok_or_else(|| LedgerError::Corrupt {
        what: "bill status",
        value: status_raw,
    })?;
    let frequency = match freq_raw {
        Some(raw) => Some(BillFrequency::parse(&raw, custom).ok_or_else(|| {
            LedgerError::Corrupt {
                what: "bill frequency",
                value: raw,
            }
        })?),
        None => None,
    };
    let due_date = NaiveDate::parse_from_str(&due_raw, "%Y-%m-%d").map_err(|_| {
        LedgerError::Corrupt {
            what: "date",
            value: due_raw,
        }
    })?;
    Ok(Bill {
        id,
        owner,
        account_id,
        name,
        amount: stored_amount(&amount_raw)?,
        due_date,
        recurring,
        frequency,
        status,
    })
}

pub fn list(conn: &Connection, owner: &str) -> LedgerResult<Vec<Bill>> {
    let mut stmt = conn.prepare("SELECT id FROM bills WHERE owner=?1 ORDER BY due_date, id")?;
    let ids: Vec<i64> = stmt
        .query_map(params![owner], |r| r.get(0))?
        .collect::<rusqlite::Result<_>>()?;
    ids.into_iter().map(|id| get_in(conn, owner, id)).collect()
}
