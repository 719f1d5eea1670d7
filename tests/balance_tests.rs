// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketbook::db;
use pocketbook::ledger::{accounts, transactions, Invalidator, LedgerError, NoopInvalidator};
use pocketbook::models::{AccountKind, TxKind};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    accounts::create_profile(&mut conn, "alice").unwrap();
    conn
}

#[test]
fn cash_balance_tracks_history() {
    let mut conn = setup();
    let acct = accounts::create(
        &mut conn,
        "alice",
        "Checking",
        AccountKind::Bank,
        dec("500"),
        None,
    )
    .unwrap();
    assert_eq!(acct.balance, dec("500"));

    let salary = transactions::create(
        &mut conn,
        &NoopInvalidator,
        "alice",
        acct.id,
        TxKind::Income,
        "Salary",
        dec("1000"),
        date("2024-03-01"),
        None,
    )
    .unwrap();
    let rent = transactions::create(
        &mut conn,
        &NoopInvalidator,
        "alice",
        acct.id,
        TxKind::Expense,
        "Rent",
        dec("300"),
        date("2024-03-02"),
        None,
    )
    .unwrap();
    let acct = accounts::get(&conn, "alice", acct.id).unwrap();
    // 500 + 1000 - 300
    assert_eq!(acct.balance, dec("1200"));

    // Shrinking the expense puts the difference back
    let patch = transactions::TransactionPatch {
        amount: Some(dec("100")),
        ..Default::default()
    };
    transactions::update(&mut conn, &NoopInvalidator, "alice", rent.id, patch).unwrap();
    let acct = accounts::get(&conn, "alice", acct.id).unwrap();
    assert_eq!(acct.balance, dec("1400"));

    transactions::delete(&mut conn, &NoopInvalidator, "alice", salary.id).unwrap();
    transactions::delete(&mut conn, &NoopInvalidator, "alice", rent.id).unwrap();
    let acct = accounts::get(&conn, "alice", acct.id).unwrap();
    assert_eq!(acct.balance, dec("500"));
}

#[test]
fn credit_card_inverts_the_effect() {
    let mut conn = setup();
    let card = accounts::create(
        &mut conn,
        "alice",
        "Visa",
        AccountKind::CreditCard,
        Decimal::ZERO,
        Some(dec("2000")),
    )
    .unwrap();

    transactions::create(
        &mut conn,
        &NoopInvalidator,
        "alice",
        card.id,
        TxKind::Expense,
        "Dining",
        dec("120"),
        date("2024-03-05"),
        None,
    )
    .unwrap();
    let card_now = accounts::get(&conn, "alice", card.id).unwrap();
    assert_eq!(card_now.credit_used, dec("120"));
    assert_eq!(card_now.balance, Decimal::ZERO);

    // Payment towards the card pays usage down
    transactions::create(
        &mut conn,
        &NoopInvalidator,
        "alice",
        card.id,
        TxKind::Income,
        "Card payment",
        dec("50"),
        date("2024-03-06"),
        None,
    )
    .unwrap();
    let card_now = accounts::get(&conn, "alice", card.id).unwrap();
    assert_eq!(card_now.credit_used, dec("70"));
}

#[test]
fn credit_card_income_floors_at_zero() {
    let mut conn = setup();
    let card = accounts::create(
        &mut conn,
        "alice",
        "Visa",
        AccountKind::CreditCard,
        Decimal::ZERO,
        None,
    )
    .unwrap();
    transactions::create(
        &mut conn,
        &NoopInvalidator,
        "alice",
        card.id,
        TxKind::Income,
        "Refund",
        dec("75"),
        date("2024-03-07"),
        None,
    )
    .unwrap();
    let card_now = accounts::get(&conn, "alice", card.id).unwrap();
    assert_eq!(card_now.credit_used, Decimal::ZERO);
}

#[test]
fn reversal_restores_the_account_exactly() {
    let mut conn = setup();
    let acct = accounts::create(
        &mut conn,
        "alice",
        "Checking",
        AccountKind::Bank,
        dec("123.45"),
        None,
    )
    .unwrap();
    let before: String = conn
        .query_row(
            "SELECT balance FROM accounts WHERE id=?1",
            params![acct.id],
            |r| r.get(0),
        )
        .unwrap();

    let tx = transactions::create(
        &mut conn,
        &NoopInvalidator,
        "alice",
        acct.id,
        TxKind::Expense,
        "Groceries",
        dec("67.89"),
        date("2024-03-08"),
        None,
    )
    .unwrap();
    transactions::delete(&mut conn, &NoopInvalidator, "alice", tx.id).unwrap();

    let after: String = conn
        .query_row(
            "SELECT balance FROM accounts WHERE id=?1",
            params![acct.id],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(before, after);
}

#[test]
fn zero_or_negative_amounts_are_rejected() {
    let mut conn = setup();
    let acct = accounts::create(&mut conn, "alice", "Checking", AccountKind::Bank, dec("10"), None)
        .unwrap();
    for bad in ["0", "-5"] {
        let err = transactions::create(
            &mut conn,
            &NoopInvalidator,
            "alice",
            acct.id,
            TxKind::Expense,
            "Misc",
            dec(bad),
            date("2024-03-09"),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
    // Nothing was written
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
    let acct = accounts::get(&conn, "alice", acct.id).unwrap();
    assert_eq!(acct.balance, dec("10"));
}

#[test]
fn deleting_an_orphaned_transaction_is_tolerated() {
    let mut conn = setup();
    let acct = accounts::create(&mut conn, "alice", "Doomed", AccountKind::Bank, dec("0"), None)
        .unwrap();
    let tx = transactions::create(
        &mut conn,
        &NoopInvalidator,
        "alice",
        acct.id,
        TxKind::Expense,
        "Misc",
        dec("10"),
        date("2024-03-10"),
        None,
    )
    .unwrap();
    // Simulate a prior partial cascade: the account row is gone, the
    // transaction still points at it.
    conn.execute("DELETE FROM accounts WHERE id=?1", params![acct.id])
        .unwrap();

    transactions::delete(&mut conn, &NoopInvalidator, "alice", tx.id).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

struct CountingInvalidator(AtomicUsize);

impl Invalidator for CountingInvalidator {
    fn invalidate(&self, _owner: &str) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn invalidator_fires_once_per_mutation() {
    let mut conn = setup();
    let counter = CountingInvalidator(AtomicUsize::new(0));
    let acct = accounts::create(&mut conn, "alice", "Checking", AccountKind::Bank, dec("0"), None)
        .unwrap();
    let tx = transactions::create(
        &mut conn,
        &counter,
        "alice",
        acct.id,
        TxKind::Income,
        "Salary",
        dec("10"),
        date("2024-03-11"),
        None,
    )
    .unwrap();
    transactions::delete(&mut conn, &counter, "alice", tx.id).unwrap();
    assert_eq!(counter.0.load(Ordering::SeqCst), 2);
}
