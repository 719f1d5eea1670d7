// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn id_for_account(conn: &Connection, owner: &str, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE owner=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![owner, name], |r| r.get(0))
        .with_context(|| format!("Account '{}' not found", name))?;
    Ok(id)
}

// Active profile settings
pub fn active_profile(conn: &Connection) -> Result<String> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='active_profile'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    v.context("No active profile. Create one with `pocketbook profile add <name>`")
}

pub fn set_active_profile(conn: &Connection, name: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('active_profile', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![name],
    )?;
    Ok(())
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// Equated monthly installment for a loan. Pure: the ledger consumes this,
/// it touches no storage.
///
/// Standard amortization `P*r*(1+r)^n / ((1+r)^n - 1)` with `r` the monthly
/// rate derived from the annual percentage. A zero/absent rate degrades to
/// straight division over the tenure; without a tenure there is no EMI.
pub fn compute_emi(
    principal: Decimal,
    annual_rate_pct: Option<Decimal>,
    tenure_months: Option<u32>,
) -> Option<Decimal> {
    let n = tenure_months?;
    if n == 0 {
        return None;
    }
    let rate = annual_rate_pct.unwrap_or(Decimal::ZERO);
    if rate.is_zero() {
        return Some((principal / Decimal::from(n)).round_dp(2));
    }
    let monthly = rate / Decimal::from(1200);
    let mut factor = Decimal::ONE;
    for _ in 0..n {
        factor *= Decimal::ONE + monthly;
    }
    let emi = principal * monthly * factor / (factor - Decimal::ONE);
    Some(emi.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emi_zero_rate_is_straight_division() {
        let p = "1200".parse::<Decimal>().unwrap();
        assert_eq!(
            compute_emi(p, None, Some(12)),
            Some("100.00".parse().unwrap())
        );
    }

    #[test]
    fn emi_needs_a_tenure() {
        let p = "1200".parse::<Decimal>().unwrap();
        assert_eq!(compute_emi(p, Some("10".parse().unwrap()), None), None);
        assert_eq!(compute_emi(p, Some("10".parse().unwrap()), Some(0)), None);
    }

    #[test]
    fn emi_amortizes_with_interest() {
        // 100000 at 12% over 12 months: the textbook answer is 8884.88
        let p = "100000".parse::<Decimal>().unwrap();
        let emi = compute_emi(p, Some("12".parse().unwrap()), Some(12)).unwrap();
        assert_eq!(emi, "8884.88".parse::<Decimal>().unwrap());
    }
}
