// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Process-wide net-worth cache, reached only through the [`Invalidator`]
//! seam. Core operations never touch it directly; they call the injected
//! capability after a successful balance mutation.

use once_cell::sync::Lazy;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::ledger::{stored_amount, Invalidator, LedgerResult};

static NET_WORTH: Lazy<Mutex<HashMap<String, Decimal>>> = Lazy::new(|| Mutex::new(HashMap::new()));

pub struct NetWorthCache;

impl Invalidator for NetWorthCache {
    fn invalidate(&self, owner: &str) {
        if let Ok(mut map) = NET_WORTH.lock() {
            map.remove(owner);
        }
    }
}

impl NetWorthCache {
    pub fn get_or_compute(&self, conn: &Connection, owner: &str) -> LedgerResult<Decimal> {
        if let Ok(map) = NET_WORTH.lock() {
            if let Some(v) = map.get(owner) {
                return Ok(*v);
            }
        }
        let value = compute_net_worth(conn, owner)?;
        if let Ok(mut map) = NET_WORTH.lock() {
            map.insert(owner.to_string(), value);
        }
        Ok(value)
    }
}

/// Sum of cash-like balances minus outstanding credit-card debt.
pub fn compute_net_worth(conn: &Connection, owner: &str) -> LedgerResult<Decimal> {
    let mut stmt =
        conn.prepare("SELECT kind, balance, credit_used FROM accounts WHERE owner=?1")?;
    let mut rows = stmt.query(params![owner])?;
    let mut total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let kind: String = r.get(0)?;
        let balance_raw: String = r.get(1)?;
        let credit_raw: String = r.get(2)?;
        if kind == "credit-card" {
            total -= stored_amount(&credit_raw)?;
        } else {
            total += stored_amount(&balance_raw)?;
        }
    }
    Ok(total)
}
