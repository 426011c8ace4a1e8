// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::ValidationError;
use crate::utils::req_arg;
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde_json::json;
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, sub),
        _ => Ok(()),
    }
}

type ExportRow = (
    String,
    String,
    String,
    Option<String>,
    String,
    Option<String>,
    Option<String>,
);

fn export_transactions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = req_arg(sub, "format")?.to_lowercase();
    let out = req_arg(sub, "out")?;
    if fmt != "csv" && fmt != "json" {
        return Err(ValidationError::InvalidChoice {
            field: "format",
            value: fmt,
            allowed: "csv, json",
        }
        .into());
    }

    let mut stmt = conn.prepare(
        "SELECT t.date, t.kind, a.name as account, d.name as to_account, t.amount, c.name as category, t.notes
         FROM transactions t
         LEFT JOIN accounts a ON t.account_id=a.id
         LEFT JOIN accounts d ON t.to_account_id=d.id
         LEFT JOIN categories c ON t.category_id=c.id
         ORDER BY t.date, t.id",
    )?;
    let rows = stmt.query_map([], |r| -> rusqlite::Result<ExportRow> {
        Ok((
            r.get(0)?,
            r.get(1)?,
            r.get(2)?,
            r.get(3)?,
            r.get(4)?,
            r.get(5)?,
            r.get(6)?,
        ))
    })?;
    let mut items: Vec<ExportRow> = Vec::new();
    for row in rows {
        items.push(row?);
    }

    if fmt == "csv" {
        let mut wtr =
            csv::Writer::from_path(&out).with_context(|| format!("Create {}", out))?;
        wtr.write_record([
            "date",
            "kind",
            "account",
            "to_account",
            "amount",
            "category",
            "notes",
        ])?;
        for (d, k, a, to, amt, cat, notes) in &items {
            wtr.write_record([
                d.as_str(),
                k.as_str(),
                a.as_str(),
                to.as_deref().unwrap_or_default(),
                amt.as_str(),
                cat.as_deref().unwrap_or_default(),
                notes.as_deref().unwrap_or_default(),
            ])?;
        }
        wtr.flush()?;
    } else {
        let json_items: Vec<_> = items
            .iter()
            .map(|(d, k, a, to, amt, cat, notes)| {
                json!({
                    "date": d, "kind": k, "account": a, "to_account": to,
                    "amount": amt, "category": cat, "notes": notes
                })
            })
            .collect();
        std::fs::write(&out, serde_json::to_string_pretty(&json_items)?)
            .with_context(|| format!("Write {}", out))?;
    }
    info!(count = items.len(), format = %fmt, path = %out, "transactions exported");
    println!("Exported {} transactions to {}", items.len(), out);
    Ok(())
}
