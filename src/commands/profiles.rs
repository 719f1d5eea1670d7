// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::accounts;
use crate::utils::{active_profile, pretty_table, set_active_profile};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            accounts::create_profile(conn, name)?;
            set_active_profile(conn, name)?;
            println!("Created profile '{}' with a default Cash account", name);
        }
        Some(("use", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let known: i64 = conn.query_row(
                "SELECT COUNT(*) FROM profiles WHERE name=?1",
                rusqlite::params![name],
                |r| r.get(0),
            )?;
            if known == 0 {
                anyhow::bail!("Profile '{}' does not exist", name);
            }
            set_active_profile(conn, name)?;
            println!("Active profile is now '{}'", name);
        }
        Some(("list", _)) => {
            let active = active_profile(conn).unwrap_or_default();
            let mut stmt =
                conn.prepare("SELECT name, created_at FROM profiles ORDER BY name")?;
            let rows = stmt.query_map([], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (n, c) = row?;
                let marker = if n == active { "*" } else { "" };
                data.push(vec![marker.to_string(), n, c]);
            }
            println!("{}", pretty_table(&["", "Profile", "Created"], data));
        }
        _ => {}
    }
    Ok(())
}
