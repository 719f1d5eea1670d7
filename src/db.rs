// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Pocketbook", "pocketbook"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("pocketbook.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

/// Creates the full schema on a fresh connection. Also used by the test
/// suite against in-memory databases.
pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS profiles(
        name TEXT PRIMARY KEY,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        name TEXT NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('cash','bank','credit-card')),
        initial_balance TEXT NOT NULL DEFAULT '0',
        balance TEXT NOT NULL DEFAULT '0',
        credit_limit TEXT,
        credit_used TEXT NOT NULL DEFAULT '0',
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(owner, name)
    );

    -- No FK cascade from accounts: account deletion must run through the
    -- cascade manager so every transaction's ledger and budget effects are
    -- reversed before the rows go away.
    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        account_id INTEGER NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('income','expense')),
        category TEXT NOT NULL,
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        description TEXT,
        source TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);

    CREATE TABLE IF NOT EXISTS budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        category TEXT NOT NULL,
        name TEXT,
        limit_amount TEXT NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        spent_amount TEXT NOT NULL DEFAULT '0'
    );

    CREATE TABLE IF NOT EXISTS budget_lines(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        budget_id INTEGER NOT NULL,
        transaction_id INTEGER NOT NULL UNIQUE,
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        description TEXT,
        FOREIGN KEY(budget_id) REFERENCES budgets(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS savings_vehicles(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        name TEXT NOT NULL,
        vehicle_type TEXT NOT NULL,
        amount TEXT NOT NULL,
        running_balance TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active','closed')),
        closed_at TEXT
    );

    CREATE TABLE IF NOT EXISTS savings_transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        vehicle_id INTEGER NOT NULL,
        kind TEXT NOT NULL CHECK(kind IN ('deposit','withdrawal','interest','loss','redemption')),
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        account_id INTEGER,
        transaction_id INTEGER,
        FOREIGN KEY(vehicle_id) REFERENCES savings_vehicles(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS loans(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        direction TEXT NOT NULL CHECK(direction IN ('taken','given')),
        counterparty TEXT NOT NULL,
        category TEXT NOT NULL,
        amount TEXT NOT NULL,
        interest_rate TEXT,
        tenure_months INTEGER,
        remaining_balance TEXT NOT NULL,
        emi_amount TEXT
    );

    CREATE TABLE IF NOT EXISTS loan_payments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        loan_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        FOREIGN KEY(loan_id) REFERENCES loans(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS bills(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL,
        account_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        amount TEXT NOT NULL,
        due_date TEXT NOT NULL,
        recurring INTEGER NOT NULL DEFAULT 0,
        frequency TEXT CHECK(frequency IN ('daily','weekly','monthly','yearly','custom')),
        custom_months INTEGER,
        status TEXT NOT NULL DEFAULT 'unpaid' CHECK(status IN ('unpaid','paid','cancelled'))
    );

    CREATE TABLE IF NOT EXISTS bill_payments(
        bill_id INTEGER NOT NULL,
        transaction_id INTEGER NOT NULL UNIQUE,
        FOREIGN KEY(bill_id) REFERENCES bills(id) ON DELETE CASCADE,
        FOREIGN KEY(transaction_id) REFERENCES transactions(id) ON DELETE CASCADE
    );
    "#,
    )?;
    Ok(())
}
