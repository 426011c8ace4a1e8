// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{ValidationError, require_text};
use crate::models::Account;
use crate::utils::{
    fmt_money, get_currency, id_for_account, json_flags, maybe_print_json, parse_decimal,
    pretty_table, req_arg, stored_decimal,
};
use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = require_text("name", &req_arg(sub, "name")?)?;
            let balance = parse_decimal(sub.get_one::<String>("balance").map_or("0", |s| s))?;
            add(conn, &name, balance)?;
            println!("Added account '{}' ({})", name, fmt_money(&balance, &get_currency(conn)?));
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let data = list(conn, sub.get_flag("all"))?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let ccy = get_currency(conn)?;
                let rows = data
                    .iter()
                    .map(|a| {
                        vec![
                            a.name.clone(),
                            fmt_money(&a.balance, &ccy),
                            if a.archived { "yes".into() } else { String::new() },
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Name", "Balance", "Archived"], rows));
            }
        }
        Some(("archive", sub)) => {
            let name = req_arg(sub, "name")?;
            set_archived(conn, &name, true)?;
            println!("Archived account '{}'", name);
        }
        Some(("unarchive", sub)) => {
            let name = req_arg(sub, "name")?;
            set_archived(conn, &name, false)?;
            println!("Restored account '{}'", name);
        }
        Some(("rm", sub)) => {
            let name = req_arg(sub, "name")?;
            remove(conn, &name)?;
            println!("Removed account '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

pub fn add(conn: &Connection, name: &str, balance: rust_decimal::Decimal) -> Result<i64> {
    conn.execute(
        "INSERT INTO accounts(name, balance) VALUES (?1, ?2)",
        params![name, balance.to_string()],
    )
    .with_context(|| format!("Could not add account '{}'", name))?;
    let id = conn.last_insert_rowid();
    info!(account = name, %balance, "account added");
    Ok(id)
}

pub fn list(conn: &Connection, include_archived: bool) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, balance, archived FROM accounts WHERE archived=0 OR ?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![include_archived], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, bool>(3)?,
        ))
    })?;
    let mut data = Vec::new();
    for row in rows {
        let (id, name, bal, archived) = row?;
        data.push(Account {
            id,
            balance: stored_decimal(&bal, &format!("account '{}'", name))?,
            name,
            archived,
        });
    }
    Ok(data)
}

fn set_archived(conn: &Connection, name: &str, archived: bool) -> Result<()> {
    let id = id_for_account(conn, name)?;
    conn.execute(
        "UPDATE accounts SET archived=?1 WHERE id=?2",
        params![archived, id],
    )?;
    info!(account = name, archived, "account archive flag changed");
    Ok(())
}

fn remove(conn: &Connection, name: &str) -> Result<()> {
    let id = id_for_account(conn, name)?;
    let used: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE account_id=?1 OR to_account_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if used > 0 {
        return Err(ValidationError::Rule(format!(
            "Account '{}' has {} transaction(s); archive it instead",
            name, used
        ))
        .into());
    }
    conn.execute("DELETE FROM accounts WHERE id=?1", params![id])?;
    info!(account = name, "account removed");
    Ok(())
}
