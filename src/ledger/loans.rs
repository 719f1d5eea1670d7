// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Loan payment engine. Payments are tracked against the loan alone, with
//! no account-side transaction; every mutation re-derives the remaining
//! balance and the EMI.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::ledger::{require_positive, stored_amount, LedgerError, LedgerResult};
use crate::models::{Loan, LoanDirection, LoanPayment};
use crate::utils::compute_emi;

pub fn create(
    conn: &mut Connection,
    owner: &str,
    direction: LoanDirection,
    counterparty: &str,
    category: &str,
    amount: Decimal,
    interest_rate: Option<Decimal>,
    tenure_months: Option<u32>,
) -> LedgerResult<Loan> {
    require_positive(amount, "loan principal")?;
    if let Some(rate) = interest_rate {
        if rate < Decimal::ZERO {
            return Err(LedgerError::Validation("interest rate must not be negative".into()));
        }
    }
    let emi = compute_emi(amount, interest_rate, tenure_months);
    conn.execute(
        "INSERT INTO loans(owner, direction, counterparty, category, amount, interest_rate,
                           tenure_months, remaining_balance, emi_amount)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?5, ?8)",
        params![
            owner,
            direction.as_str(),
            counterparty,
            category,
            amount.to_string(),
            interest_rate.map(|r| r.to_string()),
            tenure_months,
            emi.map(|e| e.to_string()),
        ],
    )?;
    get(conn, owner, conn.last_insert_rowid())
}

pub fn add_payment(
    conn: &mut Connection,
    owner: &str,
    loan_id: i64,
    amount: Decimal,
    date: NaiveDate,
) -> LedgerResult<Loan> {
    require_positive(amount, "payment amount")?;
    let txn = conn.transaction()?;
    get_in(&txn, owner, loan_id)?;
    txn.execute(
        "INSERT INTO loan_payments(loan_id, amount, date) VALUES (?1, ?2, ?3)",
        params![loan_id, amount.to_string(), date.to_string()],
    )?;
    recompute(&txn, owner, loan_id)?;
    let loan = get_in(&txn, owner, loan_id)?;
    txn.commit()?;
    Ok(loan)
}

pub fn edit_payment(
    conn: &mut Connection,
    owner: &str,
    loan_id: i64,
    payment_id: i64,
    amount: Option<Decimal>,
    date: Option<NaiveDate>,
) -> LedgerResult<Loan> {
    if let Some(a) = amount {
        require_positive(a, "payment amount")?;
    }
    let txn = conn.transaction()?;
    get_in(&txn, owner, loan_id)?;
    let existing: Option<(String, String)> = txn
        .query_row(
            "SELECT amount, date FROM loan_payments WHERE id=?1 AND loan_id=?2",
            params![payment_id, loan_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let Some((old_amount, old_date)) = existing else {
        return Err(LedgerError::not_found("loan payment", payment_id));
    };
    txn.execute(
        "UPDATE loan_payments SET amount=?1, date=?2 WHERE id=?3",
        params![
            amount.map(|a| a.to_string()).unwrap_or(old_amount),
            date.map(|d| d.to_string()).unwrap_or(old_date),
            payment_id
        ],
    )?;
    recompute(&txn, owner, loan_id)?;
    let loan = get_in(&txn, owner, loan_id)?;
    txn.commit()?;
    Ok(loan)
}

pub fn remove_payment(
    conn: &mut Connection,
    owner: &str,
    loan_id: i64,
    payment_id: i64,
) -> LedgerResult<Loan> {
    let txn = conn.transaction()?;
    get_in(&txn, owner, loan_id)?;
    let removed = txn.execute(
        "DELETE FROM loan_payments WHERE id=?1 AND loan_id=?2",
        params![payment_id, loan_id],
    )?;
    if removed == 0 {
        return Err(LedgerError::not_found("loan payment", payment_id));
    }
    recompute(&txn, owner, loan_id)?;
    let loan = get_in(&txn, owner, loan_id)?;
    txn.commit()?;
    Ok(loan)
}

// remaining = principal - sum(payments), floor zero; EMI re-derived from the
// current principal/rate/tenure on every change.
fn recompute(conn: &Connection, owner: &str, loan_id: i64) -> LedgerResult<()> {
    let loan = get_in(conn, owner, loan_id)?;
    let mut stmt = conn.prepare("SELECT amount FROM loan_payments WHERE loan_id=?1")?;
    let mut rows = stmt.query(params![loan_id])?;
    let mut paid = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let raw: String = r.get(0)?;
        paid += stored_amount(&raw)?;
    }
    let remaining = (loan.amount - paid).max(Decimal::ZERO);
    let emi = compute_emi(loan.amount, loan.interest_rate, loan.tenure_months);
    conn.execute(
        "UPDATE loans SET remaining_balance=?1, emi_amount=?2 WHERE id=?3",
        params![remaining.to_string(), emi.map(|e| e.to_string()), loan_id],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, owner: &str, id: i64) -> LedgerResult<Loan> {
    get_in(conn, owner, id)
}

fn get_in(conn: &Connection, owner: &str, id: i64) -> LedgerResult<Loan> {
    let row: Option<(i64, String, String, String, String, String, Option<String>, Option<u32>, String, Option<String>)> =
        conn.query_row(
            "SELECT id, owner, direction, counterparty, category, amount, interest_rate,
                    tenure_months, remaining_balance, emi_amount
             FROM loans WHERE id=?1 AND owner=?2",
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
    let Some((id, owner, dir_raw, counterparty, category, amount_raw, rate_raw, tenure, remaining_raw, emi_raw)) =
        row
    else {
        return Err(LedgerError::not_found("loan", id));
    };
    let direction = LoanDirection::parse(&dir_raw).ok_or_else(|| LedgerError::Corrupt {
        what: "loan direction",
        value: dir_raw,
    })?;
    Ok(Loan {
        id,
        owner,
        direction,
        counterparty,
        category,
        amount: stored_amount(&amount_raw)?,
        interest_rate: match rate_raw {
            Some(s) => Some(stored_amount(&s)?),
            None => None,
        },
        tenure_months: tenure,
        remaining_balance: stored_amount(&remaining_raw)?,
        emi_amount: match emi_raw {
            Some(s) => Some(stored_amount(&s)?),
            None => None,
        },
    })
}

pub fn list(conn: &Connection, owner: &str) -> LedgerResult<Vec<Loan>> {
    let mut stmt = conn.prepare("SELECT id FROM loans WHERE owner=?1 ORDER BY id")?;
    let ids: Vec<i64> = stmt
        .query_map(params![owner], |r| r.get(0))?
        .collect::<rusqlite::Result<_>>()?;
    ids.into_iter().map(|id| get_in(conn, owner, id)).collect()
}

pub fn payments(conn: &Connection, owner: &str, loan_id: i64) -> LedgerResult<Vec<LoanPayment>> {
    get_in(conn, owner, loan_id)?;
    let mut stmt = conn.prepare(
        "SELECT id, loan_id, amount, date FROM loan_payments WHERE loan_id=?1 ORDER BY date, id",
    )?;
    let rows = stmt.query_map(params![loan_id], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, loan_id, amount_raw, date_raw) = row?;
        let date = NaiveDate::parse_from_str(&date_raw, "%Y-%m-%d").map_err(|_| {
            LedgerError::Corrupt {
                what: "date",
                value: date_raw,
            }
        })?;
        out.push(LoanPayment {
            id,
            loan_id,
            amount: stored_amount(&amount_raw)?,
            date,
        });
    }
    Ok(out)
}
