// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{require_non_negative, require_positive};
use crate::utils::{
    id_for_category, json_flags, maybe_print_json, next_month, opt_arg, parse_decimal,
    parse_month, pretty_table, req_arg, stored_decimal,
};
use anyhow::Result;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("status", sub)) => status(conn, sub)?,
        Some(("rollover", sub)) => {
            let from = parse_month(&req_arg(sub, "from")?)?;
            let moved = rollover(conn, &from)?;
            println!(
                "Carried {} budget(s) from {} into {}",
                moved.len(),
                from,
                next_month(&from)?
            );
            for (cat, amt) in moved {
                println!("  {}: {:.2}", cat, amt);
            }
        }
        _ => {}
    }
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let month = parse_month(&req_arg(sub, "month")?)?;
    let cat = req_arg(sub, "category")?;
    let amount = require_positive("amount", parse_decimal(&req_arg(sub, "amount")?)?)?;
    let rollover = opt_arg(sub, "rollover")
        .map(|r| parse_decimal(&r))
        .transpose()?
        .map(|r| require_non_negative("rollover", r))
        .transpose()?;
    let cat_id = id_for_category(conn, &cat)?;
    upsert(conn, &month, cat_id, amount, rollover)?;
    println!("Budget set for {} / {} = {}", month, cat, amount);
    Ok(())
}

/// Insert or update a budget. `rollover: None` keeps whatever is stored.
pub fn upsert(
    conn: &Connection,
    month: &str,
    category_id: i64,
    amount: Decimal,
    rollover: Option<Decimal>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO budgets(month, category_id, amount, rollover) VALUES (?1, ?2, ?3, COALESCE(?4, '0'))
         ON CONFLICT(month, category_id) DO UPDATE SET
            amount=excluded.amount,
            rollover=COALESCE(?4, budgets.rollover)",
        params![
            month,
            category_id,
            amount.to_string(),
            rollover.map(|r| r.to_string())
        ],
    )?;
    info!(month, category_id, %amount, ?rollover, "budget saved");
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let month = opt_arg(sub, "month").map(|m| parse_month(&m)).transpose()?;
    let mut stmt = conn.prepare(
        "SELECT b.month, c.name, b.amount, b.rollover
         FROM budgets b JOIN categories c ON b.category_id=c.id
         WHERE ?1 IS NULL OR b.month=?1
         ORDER BY b.month DESC, c.name",
    )?;
    let rows = stmt.query_map(params![month], |r| {
        Ok(vec![
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
        ])
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!(
            "{}",
            pretty_table(&["Month", "Category", "Budget", "Rollover"], data)
        );
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetStatus {
    pub category_id: i64,
    pub category: String,
    pub amount: Decimal,
    pub rollover: Decimal,
    pub available: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percent_used: Decimal,
}

/// Expense total for a category and its subcategories in `month`.
pub fn spent_in_month(conn: &Connection, category_id: i64, month: &str) -> Result<Decimal> {
    let mut stmt = conn.prepare_cached(
        "SELECT t.amount FROM transactions t
         JOIN categories c ON t.category_id=c.id
         WHERE t.kind='expense' AND (c.id=?1 OR c.parent_id=?1) AND substr(t.date,1,7)=?2",
    )?;
    let mut rows = stmt.query(params![category_id, month])?;
    let mut total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let amount: String = r.get(0)?;
        total += stored_decimal(&amount, "transactions")?;
    }
    Ok(total)
}

pub fn compute_status(conn: &Connection, month: &str) -> Result<Vec<BudgetStatus>> {
    let mut stmt = conn.prepare(
        "SELECT b.category_id, c.name, b.amount, b.rollover
         FROM budgets b JOIN categories c ON b.category_id=c.id
         WHERE b.month=?1 ORDER BY c.name",
    )?;
    let rows = stmt.query_map(params![month], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (category_id, category, amount, rollover) = row?;
        let amount = stored_decimal(&amount, "budgets")?;
        let rollover = stored_decimal(&rollover, "budgets")?;
        let available = amount + rollover;
        let spent = spent_in_month(conn, category_id, month)?;
        let percent_used = if available > Decimal::ZERO {
            (spent / available * Decimal::ONE_HUNDRED).round_dp(2)
        } else {
            Decimal::ZERO
        };
        out.push(BudgetStatus {
            category_id,
            category,
            amount,
            rollover,
            available,
            spent,
            remaining: available - spent,
            percent_used,
        });
    }
    debug!(month, budgets = out.len(), "budget status computed");
    Ok(out)
}

fn status(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let month = parse_month(&req_arg(sub, "month")?)?;
    let data = compute_status(conn, &month)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|s| {
                vec![
                    s.category.clone(),
                    format!("{:.2}", s.amount),
                    format!("{:.2}", s.rollover),
                    format!("{:.2}", s.spent),
                    format!("{:.2}", s.remaining),
                    format!("{:.2}%", s.percent_used),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Category", "Budget", "Rollover", "Spent", "Remaining", "Used"],
                rows
            )
        );
    }
    Ok(())
}

/// Carry each budget's unused amount in `from` into the next month's
/// rollover. Overspent budgets carry nothing. Returns what was carried.
pub fn rollover(conn: &mut Connection, from: &str) -> Result<Vec<(String, Decimal)>> {
    let to = next_month(from)?;
    let statuses = compute_status(conn, from)?;
    let tx = conn.transaction()?;
    let mut moved = Vec::new();
    for s in statuses {
        let carry = s.remaining.max(Decimal::ZERO);
        tx.execute(
            "INSERT INTO budgets(month, category_id, amount, rollover) VALUES (?1, ?2, '0', ?3)
             ON CONFLICT(month, category_id) DO UPDATE SET rollover=excluded.rollover",
            params![to, s.category_id, carry.to_string()],
        )?;
        moved.push((s.category, carry));
    }
    tx.commit()?;
    info!(from, to = %to, count = moved.len(), "budget rollover applied");
    Ok(moved)
}
