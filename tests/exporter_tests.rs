// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketbook::commands::exporter;
use pocketbook::db;
use pocketbook::ledger::{accounts, transactions, NoopInvalidator};
use pocketbook::models::{AccountKind, TxKind};
use pocketbook::{cli, utils};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde_json::json;
use tempfile::tempdir;

fn base_conn() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    accounts::create_profile(&mut conn, "alice").unwrap();
    utils::set_active_profile(&conn, "alice").unwrap();
    let acct = accounts::create(
        &mut conn,
        "alice",
        "Checking",
        AccountKind::Bank,
        Decimal::ZERO,
        None,
    )
    .unwrap();
    transactions::create(
        &mut conn,
        &NoopInvalidator,
        "alice",
        acct.id,
        TxKind::Expense,
        "Groceries",
        "12.34".parse().unwrap(),
        NaiveDate::parse_from_str("2025-01-02", "%Y-%m-%d").unwrap(),
        Some("Weekly run"),
    )
    .unwrap();
    conn
}

#[test]
fn export_transactions_streams_pretty_json() {
    let conn = base_conn();

    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.json");
    let out_str = out_path.to_string_lossy().to_string();

    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "pocketbook",
        "export",
        "transactions",
        "--format",
        "json",
        "--out",
        &out_str,
    ]);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(&conn, export_m).unwrap();
    } else {
        panic!("no export subcommand");
    }

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(
        parsed,
        json!([
            {
                "date": "2025-01-02",
                "account": "Checking",
                "kind": "expense",
                "category": "Groceries",
                "amount": "12.34",
                "source": null,
                "note": "Weekly run"
            }
        ])
    );
}

#[test]
fn export_transactions_rejects_unknown_format() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.unknown");
    let out_str = out_path.to_string_lossy().to_string();

    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "pocketbook",
        "export",
        "transactions",
        "--format",
        "xml",
        "--out",
        &out_str,
    ]);
    if let Some(("export", export_m)) = matches.subcommand() {
        assert!(exporter::handle(&conn, export_m).is_err());
    } else {
        panic!("no export subcommand");
    }
    assert!(!out_path.exists());
}
