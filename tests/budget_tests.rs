// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketbook::db;
use pocketbook::ledger::{accounts, budgets, transactions, LedgerError, NoopInvalidator};
use pocketbook::models::{AccountKind, TxKind};
use rusqlite::Connection;
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
        dec("1000"),
        None,
    )
    .unwrap();
    (conn, acct.id)
}

fn spend(conn: &mut Connection, acct: i64, category: &str, amount: &str, day: &str) -> i64 {
    transactions::create(
        conn,
        &NoopInvalidator,
        "alice",
        acct,
        TxKind::Expense,
        category,
        dec(amount),
        date(day),
        None,
    )
    .unwrap()
    .id
}

#[test]
fn overlapping_windows_are_rejected() {
    let (mut conn, _) = setup();
    budgets::create(
        &mut conn,
        "alice",
        "Dining",
        None,
        dec("200"),
        date("2024-03-01"),
        date("2024-03-31"),
    )
    .unwrap();

    let err = budgets::create(
        &mut conn,
        "alice",
        "Dining",
        None,
        dec("100"),
        date("2024-03-15"),
        date("2024-04-15"),
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    // Same window for a different category is fine
    budgets::create(
        &mut conn,
        "alice",
        "Transport",
        None,
        dec("100"),
        date("2024-03-15"),
        date("2024-04-15"),
    )
    .unwrap();
    // Adjacent window for the same category is fine
    budgets::create(
        &mut conn,
        "alice",
        "Dining",
        None,
        dec("200"),
        date("2024-04-01"),
        date("2024-04-30"),
    )
    .unwrap();
}

#[test]
fn creation_backfills_the_window() {
    let (mut conn, acct) = setup();
    spend(&mut conn, acct, "Dining", "40", "2024-03-05");
    spend(&mut conn, acct, "Dining", "25", "2024-03-20");
    spend(&mut conn, acct, "Dining", "60", "2024-04-02"); // outside
    spend(&mut conn, acct, "Transport", "15", "2024-03-10"); // other category

    let budget = budgets::create(
        &mut conn,
        "alice",
        "Dining",
        None,
        dec("200"),
        date("2024-03-01"),
        date("2024-03-31"),
    )
    .unwrap();
    assert_eq!(budget.spent_amount, dec("65"));
    assert_eq!(budgets::lines(&conn, budget.id).unwrap().len(), 2);
}

#[test]
fn expenses_attribute_to_the_matching_window() {
    let (mut conn, acct) = setup();
    let budget = budgets::create(
        &mut conn,
        "alice",
        "Dining",
        None,
        dec("200"),
        date("2024-03-01"),
        date("2024-03-31"),
    )
    .unwrap();

    spend(&mut conn, acct, "Dining", "30", "2024-03-10");
    // Income and off-category/off-window expenses never attribute
    transactions::create(
        &mut conn,
        &NoopInvalidator,
        "alice",
        acct,
        TxKind::Income,
        "Dining",
        dec("99"),
        date("2024-03-11"),
        None,
    )
    .unwrap();
    spend(&mut conn, acct, "Groceries", "45", "2024-03-12");
    spend(&mut conn, acct, "Dining", "45", "2024-05-01");

    let budget = budgets::get(&conn, "alice", budget.id).unwrap();
    assert_eq!(budget.spent_amount, dec("30"));
    assert_eq!(budgets::lines(&conn, budget.id).unwrap().len(), 1);
}

#[test]
fn detach_removes_exactly_one_line() {
    let (mut conn, acct) = setup();
    let budget = budgets::create(
        &mut conn,
        "alice",
        "Dining",
        None,
        dec("200"),
        date("2024-03-01"),
        date("2024-03-31"),
    )
    .unwrap();
    let keep = spend(&mut conn, acct, "Dining", "30", "2024-03-10");
    let gone = spend(&mut conn, acct, "Dining", "20", "2024-03-11");

    transactions::delete(&mut conn, &NoopInvalidator, "alice", gone).unwrap();

    let budget = budgets::get(&conn, "alice", budget.id).unwrap();
    assert_eq!(budget.spent_amount, dec("30"));
    let lines = budgets::lines(&conn, budget.id).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].transaction_id, keep);
}

#[test]
fn amount_edit_amends_the_captured_line() {
    let (mut conn, acct) = setup();
    let budget = budgets::create(
        &mut conn,
        "alice",
        "Dining",
        None,
        dec("200"),
        date("2024-03-01"),
        date("2024-03-31"),
    )
    .unwrap();
    let tx = spend(&mut conn, acct, "Dining", "30", "2024-03-10");

    let patch = transactions::TransactionPatch {
        amount: Some(dec("55")),
        ..Default::default()
    };
    transactions::update(&mut conn, &NoopInvalidator, "alice", tx, patch).unwrap();

    let budget = budgets::get(&conn, "alice", budget.id).unwrap();
    assert_eq!(budget.spent_amount, dec("55"));
    assert_eq!(budgets::lines(&conn, budget.id).unwrap().len(), 1);
}

#[test]
fn category_edit_moves_the_line_between_budgets() {
    let (mut conn, acct) = setup();
    let dining = budgets::create(
        &mut conn,
        "alice",
        "Dining",
        None,
        dec("200"),
        date("2024-03-01"),
        date("2024-03-31"),
    )
    .unwrap();
    let transport = budgets::create(
        &mut conn,
        "alice",
        "Transport",
        None,
        dec("100"),
        date("2024-03-01"),
        date("2024-03-31"),
    )
    .unwrap();
    let tx = spend(&mut conn, acct, "Dining", "30", "2024-03-10");

    let patch = transactions::TransactionPatch {
        category: Some("Transport".into()),
        ..Default::default()
    };
    transactions::update(&mut conn, &NoopInvalidator, "alice", tx, patch).unwrap();

    let dining = budgets::get(&conn, "alice", dining.id).unwrap();
    let transport = budgets::get(&conn, "alice", transport.id).unwrap();
    assert_eq!(dining.spent_amount, Decimal::ZERO);
    assert_eq!(transport.spent_amount, dec("30"));
}

#[test]
fn spent_always_equals_the_line_sum() {
    let (mut conn, acct) = setup();
    let budget = budgets::create(
        &mut conn,
        "alice",
        "Dining",
        None,
        dec("500"),
        date("2024-03-01"),
        date("2024-03-31"),
    )
    .unwrap();
    let mut ids = Vec::new();
    for (amount, day) in [("12.50", "2024-03-02"), ("7.25", "2024-03-09"), ("80", "2024-03-30")] {
        ids.push(spend(&mut conn, acct, "Dining", amount, day));
    }
    transactions::delete(&mut conn, &NoopInvalidator, "alice", ids[1]).unwrap();

    let budget = budgets::get(&conn, "alice", budget.id).unwrap();
    let lines = budgets::lines(&conn, budget.id).unwrap();
    let sum: Decimal = lines.iter().map(|l| l.amount).sum();
    assert_eq!(budget.spent_amount, sum);
    assert_eq!(sum, dec("92.50"));
}
