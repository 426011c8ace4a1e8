// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{pretty_table, stored_decimal};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

/// Each finding is (issue, detail).
pub fn findings(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Categories nested deeper than one level
    let mut stmt = conn.prepare(
        "SELECT c.name FROM categories c JOIN categories p ON c.parent_id=p.id
         WHERE p.parent_id IS NOT NULL ORDER BY c.name",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let name: String = r.get(0)?;
        rows.push(vec!["category_nested_too_deep".into(), name]);
    }

    // 2) Transfers without a destination, or non-transfers with one
    let mut stmt = conn.prepare(
        "SELECT id, kind FROM transactions
         WHERE (kind='transfer' AND to_account_id IS NULL)
            OR (kind!='transfer' AND to_account_id IS NOT NULL)",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let kind: String = r.get(1)?;
        rows.push(vec!["transfer_leg_mismatch".into(), format!("#{} ({})", id, kind)]);
    }

    // 3) Debts/loans whose balance is off
    for table in ["debts", "loans"] {
        let mut stmt = conn.prepare(&format!(
            "SELECT id, initial_amount, balance, status FROM {} ORDER BY id",
            table
        ))?;
        let mut cur = stmt.query([])?;
        while let Some(r) = cur.next()? {
            let id: i64 = r.get(0)?;
            let initial = stored_decimal(&r.get::<_, String>(1)?, table)?;
            let balance = stored_decimal(&r.get::<_, String>(2)?, table)?;
            let status: String = r.get(3)?;
            if balance > initial {
                rows.push(vec![
                    format!("{}_balance_above_initial", table),
                    format!("#{}: {} > {}", id, balance, initial),
                ]);
            }
            if balance < Decimal::ZERO {
                rows.push(vec![format!("{}_negative_balance", table), format!("#{}", id)]);
            }
            if status == "settled" && !balance.is_zero() {
                rows.push(vec![
                    format!("{}_settled_with_balance", table),
                    format!("#{}: {}", id, balance),
                ]);
            }
        }
    }

    // 4) Trips ending before they start
    let mut stmt =
        conn.prepare("SELECT name FROM trips WHERE end_date < start_date ORDER BY name")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let name: String = r.get(0)?;
        rows.push(vec!["trip_dates_reversed".into(), name]);
    }

    Ok(rows)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = findings(conn)?;
    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
