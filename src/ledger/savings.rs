// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Savings orchestrator: translates vehicle events (deposit, withdrawal,
//! interest, loss, redemption) into the vehicle's running balance and, where
//! the event moves cash, a companion ledger transaction on a linked account.
//!
//! Ordering inside an event: companion transaction first, then the event
//! row, then the running-balance update, so a failed companion leaves the
//! vehicle untouched.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use tracing::warn;

use crate::ledger::{
    require_positive, stored_amount, transactions, Invalidator, LedgerError, LedgerResult,
};
use crate::models::{SavingsStatus, SavingsTransaction, SavingsTxKind, SavingsVehicle, TxKind};

pub fn create_vehicle(
    conn: &mut Connection,
    owner: &str,
    name: &str,
    vehicle_type: &str,
    amount: Decimal,
) -> LedgerResult<SavingsVehicle> {
    if amount < Decimal::ZERO {
        return Err(LedgerError::Validation(
            "initial contribution must not be negative".into(),
        ));
    }
    let profile: Option<String> = conn
        .query_row(
            "SELECT name FROM profiles WHERE name=?1",
            params![owner],
            |r| r.get(0),
        )
        .optional()?;
    if profile.is_none() {
        return Err(LedgerError::NotFound {
            kind: "profile",
            key: owner.to_string(),
        });
    }
    conn.execute(
        "INSERT INTO savings_vehicles(owner, name, vehicle_type, amount, running_balance, status)
         VALUES (?1, ?2, ?3, ?4, ?4, 'active')",
        params![owner, name, vehicle_type, amount.to_string()],
    )?;
    get(conn, owner, conn.last_insert_rowid())
}

pub fn record(
    conn: &mut Connection,
    inv: &dyn Invalidator,
    owner: &str,
    vehicle_id: i64,
    kind: SavingsTxKind,
    amount: Decimal,
    date: NaiveDate,
    linked_account: Option<i64>,
    description: Option<&str>,
) -> LedgerResult<SavingsTransaction> {
    let txn = conn.transaction()?;
    let event = record_in(
        &txn,
        owner,
        vehicle_id,
        kind,
        amount,
        date,
        linked_account,
        description,
    )?;
    txn.commit()?;
    if kind.moves_cash() {
        inv.invalidate(owner);
    }
    Ok(event)
}

#[allow(clippy::too_many_arguments)]
fn record_in(
    conn: &Connection,
    owner: &str,
    vehicle_id: i64,
    kind: SavingsTxKind,
    amount: Decimal,
    date: NaiveDate,
    linked_account: Option<i64>,
    description: Option<&str>,
) -> LedgerResult<SavingsTransaction> {
    require_positive(amount, "savings amount")?;
    let (vehicle, running_raw) = vehicle_row(conn, owner, vehicle_id)?;
    if vehicle.status == SavingsStatus::Closed {
        return Err(LedgerError::Validation(format!(
            "savings vehicle '{}' is closed",
            vehicle.name
        )));
    }
    if matches!(kind, SavingsTxKind::Withdrawal | SavingsTxKind::Redemption)
        && amount > vehicle.running_balance
    {
        return Err(LedgerError::Validation(format!(
            "{} of {} exceeds running balance {}",
            kind.as_str(),
            amount,
            vehicle.running_balance
        )));
    }

    // Companion ledger transaction first: a deposit is cash leaving the
    // linked account, a withdrawal or redemption is cash coming back.
    let companion = if kind.moves_cash() {
        let account_id = linked_account.ok_or_else(|| {
            LedgerError::Validation(format!("{} requires a linked account", kind.as_str()))
        })?;
        let tx_kind = match kind {
            SavingsTxKind::Deposit => TxKind::Expense,
            _ => TxKind::Income,
        };
        let text = format!("{} {}", vehicle.name, kind.as_str());
        let tx = transactions::create_in(
            conn,
            owner,
            account_id,
            tx_kind,
            "Savings",
            amount,
            date,
            Some(description.unwrap_or(&text)),
            Some("savings"),
        )?;
        Some(tx)
    } else {
        None
    };

    conn.execute(
        "INSERT INTO savings_transactions(vehicle_id, kind, amount, date, account_id, transaction_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            vehicle_id,
            kind.as_str(),
            amount.to_string(),
            date.to_string(),
            companion.as_ref().map(|t| t.account_id),
            companion.as_ref().map(|t| t.id)
        ],
    )?;
    let event_id = conn.last_insert_rowid();

    let delta = if kind.grows_vehicle() { amount } else { -amount };
    bump_running(conn, &vehicle, &running_raw, delta)?;

    Ok(SavingsTransaction {
        id: event_id,
        vehicle_id,
        kind,
        amount,
        date,
        account_id: companion.as_ref().map(|t| t.account_id),
        transaction_id: companion.map(|t| t.id),
    })
}

/// Deletes one event, mirroring its creation: reverse the vehicle balance
/// effect, delete the companion transaction (which reverses the account and
/// budget side), then drop the event row.
pub fn delete_event(
    conn: &mut Connection,
    inv: &dyn Invalidator,
    owner: &str,
    event_id: i64,
) -> LedgerResult<()> {
    let txn = conn.transaction()?;
    let event = get_event_in(&txn, owner, event_id)?;
    let (vehicle, running_raw) = vehicle_row(&txn, owner, event.vehicle_id)?;
    if vehicle.status == SavingsStatus::Closed {
        return Err(LedgerError::Validation(format!(
            "savings vehicle '{}' is closed; its history is frozen",
            vehicle.name
        )));
    }

    let delta = if event.kind.grows_vehicle() {
        -event.amount
    } else {
        event.amount
    };
    bump_running(&txn, &vehicle, &running_raw, delta)?;

    if let Some(tx_id) = event.transaction_id {
        match transactions::delete_in(&txn, owner, tx_id) {
            // A prior account cascade may already have taken the companion.
            Err(LedgerError::NotFound { .. }) => {
                warn!(event = event_id, transaction = tx_id, "companion transaction already gone");
            }
            other => other?,
        }
    }
    txn.execute(
        "DELETE FROM savings_transactions WHERE id=?1",
        params![event_id],
    )?;
    txn.commit()?;
    inv.invalidate(owner);
    Ok(())
}

/// Full closure: top the vehicle up (interest) or write the leftover down
/// (loss) so its own history explains the gap between book value and cash
/// received, then redeem into the transfer account, then pin the vehicle at
/// zero and mark it closed.
pub fn close(
    conn: &mut Connection,
    inv: &dyn Invalidator,
    owner: &str,
    vehicle_id: i64,
    redeemed_amount: Decimal,
    transfer_account: i64,
    close_date: NaiveDate,
) -> LedgerResult<SavingsVehicle> {
    if redeemed_amount < Decimal::ZERO {
        return Err(LedgerError::Validation(
            "redeemed amount must not be negative".into(),
        ));
    }
    let txn = conn.transaction()?;
    let (vehicle, _) = vehicle_row(&txn, owner, vehicle_id)?;
    if vehicle.status == SavingsStatus::Closed {
        return Err(LedgerError::Validation(format!(
            "savings vehicle '{}' is already closed",
            vehicle.name
        )));
    }
    if vehicle.running_balance < Decimal::ZERO {
        return Err(LedgerError::Validation(format!(
            "cannot close '{}' with negative running balance {}",
            vehicle.name, vehicle.running_balance
        )));
    }

    let gap = redeemed_amount - vehicle.running_balance;
    if gap > Decimal::ZERO {
        record_in(
            &txn,
            owner,
            vehicle_id,
            SavingsTxKind::Interest,
            gap,
            close_date,
            None,
            Some("closure adjustment"),
        )?;
    } else if gap < Decimal::ZERO {
        record_in(
            &txn,
            owner,
            vehicle_id,
            SavingsTxKind::Loss,
            -gap,
            close_date,
            None,
            Some("closure adjustment"),
        )?;
    }
    if redeemed_amount > Decimal::ZERO {
        record_in(
            &txn,
            owner,
            vehicle_id,
            SavingsTxKind::Redemption,
            redeemed_amount,
            close_date,
            Some(transfer_account),
            None,
        )?;
    }

    txn.execute(
        "UPDATE savings_vehicles SET running_balance='0', status='closed', closed_at=?1 WHERE id=?2",
        params![close_date.to_string(), vehicle_id],
    )?;
    let closed = get_in(&txn, owner, vehicle_id)?;
    txn.commit()?;
    inv.invalidate(owner);
    Ok(closed)
}

pub fn get(conn: &Connection, owner: &str, id: i64) -> LedgerResult<SavingsVehicle> {
    get_in(conn, owner, id)
}

fn get_in(conn: &Connection, owner: &str, id: i64) -> LedgerResult<SavingsVehicle> {
    vehicle_row(conn, owner, id).map(|(v, _)| v)
}

pub fn list(conn: &Connection, owner: &str) -> LedgerResult<Vec<SavingsVehicle>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM savings_vehicles WHERE owner=?1 ORDER BY name",
    )?;
    let ids: Vec<i64> = stmt
        .query_map(params![owner], |r| r.get(0))?
        .collect::<rusqlite::Result<_>>()?;
    ids.into_iter().map(|id| get_in(conn, owner, id)).collect()
}

pub fn events(conn: &Connection, owner: &str, vehicle_id: i64) -> LedgerResult<Vec<SavingsTransaction>> {
    get_in(conn, owner, vehicle_id)?;
    let mut stmt = conn.prepare(
        "SELECT id, vehicle_id, kind, amount, date, account_id, transaction_id
         FROM savings_transactions WHERE vehicle_id=?1 ORDER BY date, id",
    )?;
    let rows = stmt.query_map(params![vehicle_id], map_event)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(finish_event(row?)?);
    }
    Ok(out)
}

fn get_event_in(conn: &Connection, owner: &str, event_id: i64) -> LedgerResult<SavingsTransaction> {
    let row = conn
        .query_row(
            "SELECT s.id, s.vehicle_id, s.kind, s.amount, s.date, s.account_id, s.transaction_id
             FROM savings_transactions s
             JOIN savings_vehicles v ON v.id = s.vehicle_id
             WHERE s.id=?1 AND v.owner=?2",
            params![event_id, owner],
            map_event,
        )
        .optional()?;
    match row {
        Some(raw) => finish_event(raw),
        None => Err(LedgerError::not_found("savings transaction", event_id)),
    }
}

type RawEvent = (i64, i64, String, String, String, Option<i64>, Option<i64>);

fn map_event(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawEvent> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
    ))
}

fn finish_event(raw: RawEvent) -> LedgerResult<SavingsTransaction> {
    let (id, vehicle_id, kind_raw, amount_raw, date_raw, account_id, transaction_id) = raw;
    let kind = SavingsTxKind::parse(&kind_raw).ok_or_else(|| LedgerError::Corrupt {
        what: "savings kind",
        value: kind_raw,
    })?;
    let date = NaiveDate::parse_from_str(&date_raw, "%Y-%m-%d").map_err(|_| LedgerError::Corrupt {
        what: "date",
        value: date_raw,
    })?;
    Ok(SavingsTransaction {
        id,
        vehicle_id,
        kind,
        amount: stored_amount(&amount_raw)?,
        date,
        account_id,
        transaction_id,
    })
}

// Loads the vehicle plus the raw running-balance text used as the guard in
// the conditional write.
fn vehicle_row(conn: &Connection, owner: &str, id: i64) -> LedgerResult<(SavingsVehicle, String)> {
    let row: Option<(i64, String, String, String, String, String, String, Option<String>)> = conn
        .query_row(
            "SELECT id, owner, name, vehicle_type, amount, running_balance, status, closed_at
             FROM savings_vehicles WHERE id=?1 AND owner=?2",
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
    let Some((id, owner, name, vehicle_type, amount_raw, running_raw, status_raw, closed_raw)) = row
    else {
        return Err(LedgerError::not_found("savings vehicle", id));
    };
    let status = SavingsStatus::parse(&status_raw).ok_or_else(|| LedgerError::Corrupt {
        what: "savings status",
        value: status_raw,
    })?;
    let closed_at = match closed_raw {
        Some(raw) => Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
            LedgerError::Corrupt {
                what: "date",
                value: raw,
            }
        })?),
        None => None,
    };
    let vehicle = SavingsVehicle {
        id,
        owner,
        name,
        vehicle_type,
        amount: stored_amount(&amount_raw)?,
        running_balance: stored_amount(&running_raw)?,
        status,
        closed_at,
    };
    Ok((vehicle, running_raw))
}

fn bump_running(
    conn: &Connection,
    vehicle: &SavingsVehicle,
    running_raw: &str,
    delta: Decimal,
) -> LedgerResult<()> {
    let new = vehicle.running_balance + delta;
    let changed = conn.execute(
        "UPDATE savings_vehicles SET running_balance=?1 WHERE id=?2 AND running_balance=?3",
        params![new.to_string(), vehicle.id, running_raw],
    )?;
    if changed == 0 {
        return Err(LedgerError::Conflict {
            kind: "savings vehicle",
            id: vehicle.id,
        });
    }
    Ok(())
}
