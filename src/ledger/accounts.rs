// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::ledger::{stored_amount, LedgerError, LedgerResult};
use crate::models::{Account, AccountKind};

/// Registers a profile and seeds its default cash account.
pub fn create_profile(conn: &mut Connection, name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation("profile name must not be empty".into()));
    }
    let txn = conn.transaction()?;
    let exists: Option<String> = txn
        .query_row(
            "SELECT name FROM profiles WHERE name=?1",
            params![name],
            |r| r.get(0),
        )
        .optional()?;
    if exists.is_some() {
        return Err(LedgerError::Validation(format!(
            "profile '{}' already exists",
            name
        )));
    }
    txn.execute("INSERT INTO profiles(name) VALUES (?1)", params![name])?;
    create_in(&txn, name, "Cash", AccountKind::Cash, Decimal::ZERO, None)?;
    txn.commit()?;
    Ok(())
}

pub fn create(
    conn: &mut Connection,
    owner: &str,
    name: &str,
    kind: AccountKind,
    initial_balance: Decimal,
    credit_limit: Option<Decimal>,
) -> LedgerResult<Account> {
    let txn = conn.transaction()?;
    let account = create_in(&txn, owner, name, kind, initial_balance, credit_limit)?;
    txn.commit()?;
    Ok(account)
}

pub(crate) fn create_in(
    conn: &Connection,
    owner: &str,
    name: &str,
    kind: AccountKind,
    initial_balance: Decimal,
    credit_limit: Option<Decimal>,
) -> LedgerResult<Account> {
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
    let dup: Option<i64> = conn
        .query_row(
            "SELECT id FROM accounts WHERE owner=?1 AND name=?2",
            params![owner, name],
            |r| r.get(0),
        )
        .optional()?;
    if dup.is_some() {
        return Err(LedgerError::Validation(format!(
            "account '{}' already exists",
            name
        )));
    }
    if kind.is_credit() && initial_balance != Decimal::ZERO {
        return Err(LedgerError::Validation(
            "credit-card accounts start from zero; set a credit limit instead".into(),
        ));
    }
    conn.execute(
        "INSERT INTO accounts(owner, name, kind, initial_balance, balance, credit_limit, credit_used)
         VALUES (?1, ?2, ?3, ?4, ?4, ?5, '0')",
        params![
            owner,
            name,
            kind.as_str(),
            initial_balance.to_string(),
            credit_limit.map(|c| c.to_string()),
        ],
    )?;
    get_in(conn, owner, conn.last_insert_rowid())
}

pub fn get(conn: &Connection, owner: &str, id: i64) -> LedgerResult<Account> {
    get_in(conn, owner, id)
}

pub(crate) fn get_in(conn: &Connection, owner: &str, id: i64) -> LedgerResult<Account> {
    let row = conn
        .query_row(
            "SELECT id, owner, name, kind, initial_balance, balance, credit_limit, credit_used
             FROM accounts WHERE id=?1 AND owner=?2",
            params![id, owner],
            map_account,
        )
        .optional()?;
    let (account, kind_raw) = row.ok_or_else(|| LedgerError::not_found("account", id))?;
    let kind = AccountKind::parse(&kind_raw).ok_or_else(|| LedgerError::Corrupt {
        what: "account kind",
        value: kind_raw,
    })?;
    Ok(Account { kind, ..account })
}

pub fn list(conn: &Connection, owner: &str) -> LedgerResult<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, owner, name, kind, initial_balance, balance, credit_limit, credit_used
         FROM accounts WHERE owner=?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![owner], map_account)?;
    let mut out = Vec::new();
    for row in rows {
        let (account, kind_raw) = row?;
        let kind = AccountKind::parse(&kind_raw).ok_or_else(|| LedgerError::Corrupt {
            what: "account kind",
            value: kind_raw,
        })?;
        out.push(Account { kind, ..account });
    }
    Ok(out)
}

type RawAccount = (Account, String);

fn map_account(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawAccount> {
    Ok((
        Account {
            id: r.get(0)?,
            owner: r.get(1)?,
            name: r.get(2)?,
            kind: AccountKind::Cash, // fixed up by the caller from the raw kind
            initial_balance: parse_col(r, 4)?,
            balance: parse_col(r, 5)?,
            credit_limit: match r.get::<_, Option<String>>(6)? {
                Some(s) => Some(parse_str(&s)?),
                None => None,
            },
            credit_used: parse_col(r, 7)?,
        },
        r.get::<_, String>(3)?,
    ))
}

fn parse_col(r: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = r.get(idx)?;
    parse_str(&s)
}

fn parse_str(s: &str) -> rusqlite::Result<Decimal> {
    stored_amount(s).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("invalid decimal '{}'", s).into(),
        )
    })
}
