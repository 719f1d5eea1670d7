// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketbook::db;
use pocketbook::ledger::{accounts, savings, transactions, LedgerError, NoopInvalidator};
use pocketbook::models::{AccountKind, SavingsStatus, SavingsTxKind, TxKind};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn setup() -> (Connection, i64, i64) {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    accounts::create_profile(&mut conn, "alice").unwrap();
    let acct = accounts::create(
        &mut conn,
        "alice",
        "Checking",
        AccountKind::Bank,
        dec("5000"),
        None,
    )
    .unwrap();
    let vehicle = savings::create_vehicle(&mut conn, "alice", "Emergency fund", "fund", dec("1000"))
        .unwrap();
    (conn, acct.id, vehicle.id)
}

#[test]
fn deposit_moves_cash_into_the_vehicle() {
    let (mut conn, acct, vehicle) = setup();
    let event = savings::record(
        &mut conn,
        &NoopInvalidator,
        "alice",
        vehicle,
        SavingsTxKind::Deposit,
        dec("200"),
        date("2024-03-01"),
        Some(acct),
        None,
    )
    .unwrap();

    let v = savings::get(&conn, "alice", vehicle).unwrap();
    assert_eq!(v.running_balance, dec("1200"));

    // Companion expense drained the linked account
    let a = accounts::get(&conn, "alice", acct).unwrap();
    assert_eq!(a.balance, dec("4800"));
    let companion = transactions::get(&conn, "alice", event.transaction_id.unwrap()).unwrap();
    assert_eq!(companion.kind, TxKind::Expense);
    assert_eq!(companion.source.as_deref(), Some("savings"));
}

#[test]
fn interest_and_loss_touch_only_the_vehicle() {
    let (mut conn, acct, vehicle) = setup();
    let interest = savings::record(
        &mut conn,
        &NoopInvalidator,
        "alice",
        vehicle,
        SavingsTxKind::Interest,
        dec("50"),
        date("2024-03-01"),
        None,
        None,
    )
    .unwrap();
    assert!(interest.transaction_id.is_none());
    let loss = savings::record(
        &mut conn,
        &NoopInvalidator,
        "alice",
        vehicle,
        SavingsTxKind::Loss,
        dec("20"),
        date("2024-03-02"),
        None,
        None,
    )
    .unwrap();
    assert!(loss.transaction_id.is_none());

    let v = savings::get(&conn, "alice", vehicle).unwrap();
    assert_eq!(v.running_balance, dec("1030"));
    let a = accounts::get(&conn, "alice", acct).unwrap();
    assert_eq!(a.balance, dec("5000"));
}

#[test]
fn cash_moving_kinds_require_a_linked_account() {
    let (mut conn, _, vehicle) = setup();
    let err = savings::record(
        &mut conn,
        &NoopInvalidator,
        "alice",
        vehicle,
        SavingsTxKind::Deposit,
        dec("10"),
        date("2024-03-01"),
        None,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    // No partial writes
    let events: i64 = conn
        .query_row("SELECT COUNT(*) FROM savings_transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(events, 0);
    let v = savings::get(&conn, "alice", vehicle).unwrap();
    assert_eq!(v.running_balance, dec("1000"));
}

#[test]
fn withdrawal_cannot_exceed_the_running_balance() {
    let (mut conn, acct, vehicle) = setup();
    let err = savings::record(
        &mut conn,
        &NoopInvalidator,
        "alice",
        vehicle,
        SavingsTxKind::Withdrawal,
        dec("1000.01"),
        date("2024-03-01"),
        Some(acct),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    let v = savings::get(&conn, "alice", vehicle).unwrap();
    assert_eq!(v.running_balance, dec("1000"));
    let a = accounts::get(&conn, "alice", acct).unwrap();
    assert_eq!(a.balance, dec("5000"));
    let txs: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(txs, 0);
}

#[test]
fn deleting_an_event_mirrors_its_creation() {
    let (mut conn, acct, vehicle) = setup();
    let event = savings::record(
        &mut conn,
        &NoopInvalidator,
        "alice",
        vehicle,
        SavingsTxKind::Deposit,
        dec("300"),
        date("2024-03-01"),
        Some(acct),
        None,
    )
    .unwrap();

    savings::delete_event(&mut conn, &NoopInvalidator, "alice", event.id).unwrap();

    let v = savings::get(&conn, "alice", vehicle).unwrap();
    assert_eq!(v.running_balance, dec("1000"));
    let a = accounts::get(&conn, "alice", acct).unwrap();
    assert_eq!(a.balance, dec("5000"));
    let txs: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(txs, 0);
    let events: i64 = conn
        .query_row("SELECT COUNT(*) FROM savings_transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(events, 0);
}

#[test]
fn companion_transactions_are_not_editable() {
    let (mut conn, acct, vehicle) = setup();
    let event = savings::record(
        &mut conn,
        &NoopInvalidator,
        "alice",
        vehicle,
        SavingsTxKind::Deposit,
        dec("300"),
        date("2024-03-01"),
        Some(acct),
        None,
    )
    .unwrap();
    let patch = transactions::TransactionPatch {
        amount: Some(dec("1")),
        ..Default::default()
    };
    let err = transactions::update(
        &mut conn,
        &NoopInvalidator,
        "alice",
        event.transaction_id.unwrap(),
        patch,
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[test]
fn closing_above_book_value_posts_interest() {
    let (mut conn, acct, vehicle) = setup();
    // running_balance = 1000, redeem 1200
    let closed = savings::close(
        &mut conn,
        &NoopInvalidator,
        "alice",
        vehicle,
        dec("1200"),
        acct,
        date("2024-06-30"),
    )
    .unwrap();
    assert_eq!(closed.status, SavingsStatus::Closed);
    assert_eq!(closed.running_balance, Decimal::ZERO);
    assert_eq!(closed.closed_at, Some(date("2024-06-30")));

    let events = savings::events(&conn, "alice", vehicle).unwrap();
    let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![SavingsTxKind::Interest, SavingsTxKind::Redemption]);
    assert_eq!(events[0].amount, dec("200"));
    assert_eq!(events[1].amount, dec("1200"));

    // The redemption landed in the transfer account
    let a = accounts::get(&conn, "alice", acct).unwrap();
    assert_eq!(a.balance, dec("6200"));
}

#[test]
fn closing_below_book_value_posts_a_loss() {
    let (mut conn, acct, vehicle) = setup();
    let closed = savings::close(
        &mut conn,
        &NoopInvalidator,
        "alice",
        vehicle,
        dec("700"),
        acct,
        date("2024-06-30"),
    )
    .unwrap();
    assert_eq!(closed.running_balance, Decimal::ZERO);

    let events = savings::events(&conn, "alice", vehicle).unwrap();
    let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![SavingsTxKind::Loss, SavingsTxKind::Redemption]);
    assert_eq!(events[0].amount, dec("300"));
    assert_eq!(events[1].amount, dec("700"));

    let a = accounts::get(&conn, "alice", acct).unwrap();
    assert_eq!(a.balance, dec("5700"));
}

#[test]
fn a_closed_vehicle_accepts_nothing_further() {
    let (mut conn, acct, vehicle) = setup();
    savings::close(
        &mut conn,
        &NoopInvalidator,
        "alice",
        vehicle,
        dec("1000"),
        acct,
        date("2024-06-30"),
    )
    .unwrap();

    let record_err = savings::record(
        &mut conn,
        &NoopInvalidator,
        "alice",
        vehicle,
        SavingsTxKind::Interest,
        dec("1"),
        date("2024-07-01"),
        None,
        None,
    )
    .unwrap_err();
    assert!(matches!(record_err, LedgerError::Validation(_)));

    let close_err = savings::close(
        &mut conn,
        &NoopInvalidator,
        "alice",
        vehicle,
        dec("1"),
        acct,
        date("2024-07-01"),
    )
    .unwrap_err();
    assert!(matches!(close_err, LedgerError::Validation(_)));
}

#[test]
fn closing_at_exact_book_value_writes_no_adjustment() {
    let (mut conn, acct, vehicle) = setup();
    savings::close(
        &mut conn,
        &NoopInvalidator,
        "alice",
        vehicle,
        dec("1000"),
        acct,
        date("2024-06-30"),
    )
    .unwrap();
    let events = savings::events(&conn, "alice", vehicle).unwrap();
    let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![SavingsTxKind::Redemption]);
}
