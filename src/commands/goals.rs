// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::amortization::{Suggestion, months_between, progress_pct, suggest_payment};
use crate::error::{ValidationError, require_positive, require_text};
use crate::models::Goal;
use crate::utils::{
    id_for_active_account, json_flags, maybe_print_json, opt_arg, parse_date, parse_decimal,
    pretty_table, req_arg, stored_decimal, today,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = require_text("name", &req_arg(sub, "name")?)?;
            let target = require_positive("target", parse_decimal(&req_arg(sub, "target")?)?)?;
            let account_id = opt_arg(sub, "account")
                .map(|a| id_for_active_account(conn, &a))
                .transpose()?;
            let target_date = opt_arg(sub, "target-date")
                .map(|d| parse_date(&d))
                .transpose()?;
            add(conn, &name, target, account_id, target_date, today())?;
            println!("Added goal '{}' (target {:.2})", name, target);
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let data = list(conn, sub.get_flag("all"), today())?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|g| {
                        vec![
                            g.goal.name.clone(),
                            format!("{:.2}", g.goal.current_amount),
                            format!("{:.2}", g.goal.target_amount),
                            format!("{:.2}%", g.progress_pct),
                            format!("{:.2}", g.remaining),
                            g.goal
                                .target_date
                                .map(|d| d.to_string())
                                .unwrap_or_default(),
                            g.account.clone().unwrap_or_default(),
                            g.monthly_needed.label(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &[
                            "Goal", "Saved", "Target", "Progress", "Remaining", "By", "Account",
                            "Needed",
                        ],
                        rows
                    )
                );
            }
        }
        Some(("contribute", sub)) => {
            let name = req_arg(sub, "name")?;
            let amount = require_positive("amount", parse_decimal(&req_arg(sub, "amount")?)?)?;
            let now = contribute(conn, &name, amount)?;
            println!("Goal '{}' now at {:.2}", name, now);
        }
        Some(("archive", sub)) => {
            let name = req_arg(sub, "name")?;
            let g = get(conn, &name)?;
            conn.execute("UPDATE goals SET archived=1 WHERE id=?1", params![g.id])?;
            info!(goal = %name, "goal archived");
            println!("Archived goal '{}'", name);
        }
        Some(("rm", sub)) => {
            let name = req_arg(sub, "name")?;
            let g = get(conn, &name)?;
            conn.execute("DELETE FROM goals WHERE id=?1", params![g.id])?;
            info!(goal = %name, "goal removed");
            println!("Removed goal '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

pub fn add(
    conn: &Connection,
    name: &str,
    target: Decimal,
    account_id: Option<i64>,
    target_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<i64> {
    if let Some(d) = target_date {
        if d < today {
            return Err(ValidationError::DateOrder {
                earlier: "today",
                earlier_date: today.to_string(),
                later: "target date",
                later_date: d.to_string(),
            }
            .into());
        }
    }
    conn.execute(
        "INSERT INTO goals(name, target_amount, account_id, target_date) VALUES (?1, ?2, ?3, ?4)",
        params![
            name,
            target.to_string(),
            account_id,
            target_date.map(|d| d.to_string())
        ],
    )
    .with_context(|| format!("Could not add goal '{}'", name))?;
    info!(goal = name, %target, "goal added");
    Ok(conn.last_insert_rowid())
}

const SELECT: &str = "SELECT g.id, g.name, g.target_amount, g.current_amount, g.account_id, g.target_date, g.archived, a.name
     FROM goals g LEFT JOIN accounts a ON g.account_id=a.id";

type Raw = (
    i64,
    String,
    String,
    String,
    Option<i64>,
    Option<String>,
    bool,
    Option<String>,
);

fn raw(r: &rusqlite::Row<'_>) -> rusqlite::Result<Raw> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
        r.get(7)?,
    ))
}

fn from_raw(raw: Raw) -> Result<(Goal, Option<String>)> {
    let (id, name, target, current, account_id, target_date, archived, account) = raw;
    let what = format!("goal '{}'", name);
    let goal = Goal {
        id,
        target_amount: stored_decimal(&target, &what)?,
        current_amount: stored_decimal(&current, &what)?,
        account_id,
        target_date: target_date.as_deref().map(parse_date).transpose()?,
        archived,
        name,
    };
    Ok((goal, account))
}

pub fn get(conn: &Connection, name: &str) -> Result<Goal> {
    let raw = conn
        .query_row(&format!("{} WHERE g.name=?1", SELECT), params![name], raw)
        .optional()?
        .with_context(|| format!("Goal '{}' not found", name))?;
    Ok(from_raw(raw)?.0)
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: Goal,
    pub account: Option<String>,
    pub progress_pct: Decimal,
    pub remaining: Decimal,
    /// Straight-line monthly saving to hit the target by its date.
    pub monthly_needed: Suggestion,
}

pub fn view(goal: Goal, account: Option<String>, today: NaiveDate) -> GoalView {
    let remaining = (goal.target_amount - goal.current_amount).max(Decimal::ZERO);
    let monthly_needed = match goal.target_date {
        Some(d) if d < today => {
            if remaining.is_zero() {
                Suggestion::None
            } else {
                Suggestion::Overdue { amount: remaining }
            }
        }
        Some(d) => suggest_payment(remaining, Decimal::ZERO, months_between(today, d)),
        None => Suggestion::None,
    };
    GoalView {
        progress_pct: progress_pct(goal.current_amount, goal.target_amount),
        remaining,
        monthly_needed,
        account,
        goal,
    }
}

pub fn list(conn: &Connection, include_archived: bool, today: NaiveDate) -> Result<Vec<GoalView>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE g.archived=0 OR ?1 ORDER BY g.target_date IS NULL, g.target_date, g.name",
        SELECT
    ))?;
    let rows = stmt.query_map(params![include_archived], raw)?;
    let mut out = Vec::new();
    for row in rows {
        let (goal, account) = from_raw(row?)?;
        out.push(view(goal, account, today));
    }
    Ok(out)
}

/// Add to a goal's saved amount; returns the new total.
pub fn contribute(conn: &Connection, name: &str, amount: Decimal) -> Result<Decimal> {
    let g = get(conn, name)?;
    if g.archived {
        return Err(ValidationError::Rule(format!("Goal '{}' is archived", name)).into());
    }
    let now = g.current_amount + amount;
    conn.execute(
        "UPDATE goals SET current_amount=?1 WHERE id=?2",
        params![now.to_string(), g.id],
    )?;
    info!(goal = name, %amount, total = %now, "goal contribution");
    Ok(now)
}
