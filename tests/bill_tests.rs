// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketbook::db;
use pocketbook::ledger::{accounts, bills, budgets, LedgerError, NoopInvalidator};
use pocketbook::models::{AccountKind, BillFrequency, BillStatus};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn setup() -> (Connection, i64) {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    accounts::create_profile(&mut conn, "alice").unwrap();
    let acct = accounts::create(
        &mut conn,
        "alice",
        "Checking",
        AccountKind::Bank,
        dec("2000"),
        None,
    )
    .unwrap();
    (conn, acct.id)
}

#[test]
fn paying_a_monthly_bill_advances_the_due_date() {
    let (mut conn, acct) = setup();
    let bill = bills::create(
        &mut conn,
        "alice",
        acct,
        "Electricity",
        dec("90"),
        date("2024-01-15"),
        Some(BillFrequency::Monthly),
    )
    .unwrap();

    let bill = bills::mark_paid(&mut conn, &NoopInvalidator, "alice", bill.id, date("2024-01-15"))
        .unwrap();
    assert_eq!(bill.status, BillStatus::Unpaid);
    assert_eq!(bill.due_date, date("2024-02-15"));

    // Exactly one expense transaction against the bill's account
    let (count, amount, source): (i64, String, String) = conn
        .query_row(
            "SELECT COUNT(*), amount, source FROM transactions WHERE account_id=?1",
            params![acct],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(amount, "90");
    assert_eq!(source, "bills");
    let a = accounts::get(&conn, "alice", acct).unwrap();
    assert_eq!(a.balance, dec("1910"));

    // Paying the next cycle keeps rolling forward
    let bill = bills::mark_paid(&mut conn, &NoopInvalidator, "alice", bill.id, date("2024-02-15"))
        .unwrap();
    assert_eq!(bill.due_date, date("2024-03-15"));
    assert_eq!(bill.status, BillStatus::Unpaid);
}

#[test]
fn custom_month_recurrence_advances_by_that_many_months() {
    let (mut conn, acct) = setup();
    let bill = bills::create(
        &mut conn,
        "alice",
        acct,
        "Insurance",
        dec("300"),
        date("2024-01-31"),
        Some(BillFrequency::Months(3)),
    )
    .unwrap();
    let bill = bills::mark_paid(&mut conn, &NoopInvalidator, "alice", bill.id, date("2024-01-31"))
        .unwrap();
    // chrono clamps to the end of the shorter month
    assert_eq!(bill.due_date, date("2024-04-30"));
}

#[test]
fn a_paid_one_off_bill_is_terminal() {
    let (mut conn, acct) = setup();
    let bill = bills::create(
        &mut conn,
        "alice",
        acct,
        "Car registration",
        dec("120"),
        date("2024-05-01"),
        None,
    )
    .unwrap();
    let bill = bills::mark_paid(&mut conn, &NoopInvalidator, "alice", bill.id, date("2024-05-01"))
        .unwrap();
    assert_eq!(bill.status, BillStatus::Paid);

    let err = bills::mark_paid(&mut conn, &NoopInvalidator, "alice", bill.id, date("2024-05-02"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    let err = bills::cancel(&mut conn, "alice", bill.id).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[test]
fn cancelled_bills_generate_nothing() {
    let (mut conn, acct) = setup();
    let bill = bills::create(
        &mut conn,
        "alice",
        acct,
        "Gym",
        dec("40"),
        date("2024-03-01"),
        Some(BillFrequency::Monthly),
    )
    .unwrap();
    let bill = bills::cancel(&mut conn, "alice", bill.id).unwrap();
    assert_eq!(bill.status, BillStatus::Cancelled);

    let err = bills::mark_paid(&mut conn, &NoopInvalidator, "alice", bill.id, date("2024-03-01"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn bill_payments_feed_matching_budgets() {
    let (mut conn, acct) = setup();
    let budget = budgets::create(
        &mut conn,
        "alice",
        "Bills",
        None,
        dec("500"),
        date("2024-01-01"),
        date("2024-01-31"),
    )
    .unwrap();
    let bill = bills::create(
        &mut conn,
        "alice",
        acct,
        "Water",
        dec("60"),
        date("2024-01-10"),
        None,
    )
    .unwrap();
    bills::mark_paid(&mut conn, &NoopInvalidator, "alice", bill.id, date("2024-01-10")).unwrap();

    let budget = budgets::get(&conn, "alice", budget.id).unwrap();
    assert_eq!(budget.spent_amount, dec("60"));
}

#[test]
fn deleting_a_bill_unwinds_its_payments() {
    let (mut conn, acct) = setup();
    let bill = bills::create(
        &mut conn,
        "alice",
        acct,
        "Electricity",
        dec("90"),
        date("2024-01-15"),
        Some(BillFrequency::Monthly),
    )
    .unwrap();
    bills::mark_paid(&mut conn, &NoopInvalidator, "alice", bill.id, date("2024-01-15")).unwrap();
    bills::mark_paid(&mut conn, &NoopInvalidator, "alice", bill.id, date("2024-02-15")).unwrap();
    let a = accounts::get(&conn, "alice", acct).unwrap();
    assert_eq!(a.balance, dec("1820"));

    bills::delete(&mut conn, &NoopInvalidator, "alice", bill.id).unwrap();

    let a = accounts::get(&conn, "alice", acct).unwrap();
    assert_eq!(a.balance, dec("2000"));
    let txs: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(txs, 0);
    let bills_left: i64 = conn
        .query_row("SELECT COUNT(*) FROM bills", [], |r| r.get(0))
        .unwrap();
    assert_eq!(bills_left, 0);
}
