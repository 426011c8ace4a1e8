// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::amortization::progress_pct;
use crate::commands::categories;
use crate::error::{ValidationError, require_non_negative, require_positive, require_text};
use crate::models::{CategoryKind, Trip, TripExpense, TripStatus};
use crate::utils::{
    id_for_category, json_flags, maybe_print_json, opt_arg, parse_date, parse_decimal,
    pretty_table, req_arg, stored_decimal,
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
            let new = NewTrip {
                name: require_text("name", &req_arg(sub, "name")?)?,
                destination: require_text("destination", &req_arg(sub, "destination")?)?,
                start_date: parse_date(&req_arg(sub, "start")?)?,
                end_date: parse_date(&req_arg(sub, "end")?)?,
                budget: require_non_negative("budget", parse_decimal(&req_arg(sub, "budget")?)?)?,
            };
            add(conn, &new)?;
            println!(
                "Added trip '{}' to {} ({} → {})",
                new.name, new.destination, new.start_date, new.end_date
            );
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let data = list(conn)?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|t| {
                        vec![
                            t.trip.name.clone(),
                            t.trip.destination.clone(),
                            format!("{} → {}", t.trip.start_date, t.trip.end_date),
                            format!("{:.2}", t.trip.budget),
                            format!("{:.2} ({:.2}%)", t.trip.saved_amount, t.saved_pct),
                            format!("{:.2}", t.spent),
                            format!("{:.2}", t.remaining),
                            t.trip.status.as_str().to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &[
                            "Trip",
                            "Destination",
                            "Dates",
                            "Budget",
                            "Saved",
                            "Spent",
                            "Remaining",
                            "Status",
                        ],
                        rows
                    )
                );
            }
        }
        Some(("save", sub)) => {
            let name = req_arg(sub, "name")?;
            let amount = require_positive("amount", parse_decimal(&req_arg(sub, "amount")?)?)?;
            let t = get(conn, &name)?;
            let saved = t.saved_amount + amount;
            conn.execute(
                "UPDATE trips SET saved_amount=?1 WHERE id=?2",
                params![saved.to_string(), t.id],
            )?;
            info!(trip = %name, %amount, saved = %saved, "trip savings updated");
            println!("Trip '{}' savings now {:.2}", name, saved);
        }
        Some(("status", sub)) => {
            let name = req_arg(sub, "name")?;
            let status: TripStatus = req_arg(sub, "status")?.parse()?;
            let t = get(conn, &name)?;
            conn.execute(
                "UPDATE trips SET status=?1 WHERE id=?2",
                params![status.as_str(), t.id],
            )?;
            info!(trip = %name, status = status.as_str(), "trip status changed");
            println!("Trip '{}' is now {}", name, status.as_str());
        }
        Some(("rm", sub)) => {
            let name = req_arg(sub, "name")?;
            let t = get(conn, &name)?;
            conn.execute("DELETE FROM trips WHERE id=?1", params![t.id])?;
            info!(trip = %name, "trip removed");
            println!("Removed trip '{}'", name);
        }
        Some(("expense", sub)) => expense(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn expense(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let trip = req_arg(sub, "trip")?;
            let t = get(conn, &trip)?;
            let amount = require_positive("amount", parse_decimal(&req_arg(sub, "amount")?)?)?;
            let date = parse_date(&req_arg(sub, "date")?)?;
            let description = require_text("description", &req_arg(sub, "description")?)?;
            let category_id = opt_arg(sub, "category")
                .map(|c| id_for_category(conn, &c))
                .transpose()?;
            add_expense(conn, t.id, date, amount, &description, category_id)?;
            println!("Added {:.2} to trip '{}': {}", amount, trip, description);
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let t = get(conn, &req_arg(sub, "trip")?)?;
            let data = expenses(conn, t.id)?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|e| {
                        vec![
                            e.id.to_string(),
                            e.date.to_string(),
                            e.description.clone(),
                            format!("{:.2}", e.amount),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Date", "Description", "Amount"], rows)
                );
            }
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewTrip {
    pub name: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: Decimal,
}

pub fn add(conn: &Connection, new: &NewTrip) -> Result<i64> {
    if new.end_date < new.start_date {
        return Err(ValidationError::DateOrder {
            earlier: "start date",
            earlier_date: new.start_date.to_string(),
            later: "end date",
            later_date: new.end_date.to_string(),
        }
        .into());
    }
    conn.execute(
        "INSERT INTO trips(name, destination, start_date, end_date, budget) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            new.name,
            new.destination,
            new.start_date.to_string(),
            new.end_date.to_string(),
            new.budget.to_string()
        ],
    )
    .with_context(|| format!("Could not add trip '{}'", new.name))?;
    info!(trip = %new.name, budget = %new.budget, "trip added");
    Ok(conn.last_insert_rowid())
}

const SELECT: &str =
    "SELECT id, name, destination, start_date, end_date, budget, saved_amount, status FROM trips";

type Raw = (i64, String, String, String, String, String, String, String);

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

fn from_raw(raw: Raw) -> Result<Trip> {
    let (id, name, destination, start, end, budget, saved, status) = raw;
    let what = format!("trip '{}'", name);
    Ok(Trip {
        id,
        destination,
        start_date: parse_date(&start)?,
        end_date: parse_date(&end)?,
        budget: stored_decimal(&budget, &what)?,
        saved_amount: stored_decimal(&saved, &what)?,
        status: status.parse()?,
        name,
    })
}

pub fn get(conn: &Connection, name: &str) -> Result<Trip> {
    let raw = conn
        .query_row(&format!("{} WHERE name=?1", SELECT), params![name], raw)
        .optional()?
        .with_context(|| format!("Trip '{}' not found", name))?;
    from_raw(raw)
}

#[derive(Debug, Clone, Serialize)]
pub struct TripView {
    #[serde(flatten)]
    pub trip: Trip,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub saved_pct: Decimal,
    pub expense_count: usize,
}

pub fn list(conn: &Connection) -> Result<Vec<TripView>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY start_date, name", SELECT))?;
    let rows = stmt.query_map([], raw)?;
    let mut out = Vec::new();
    for row in rows {
        let trip = from_raw(row?)?;
        let items = expenses(conn, trip.id)?;
        let spent: Decimal = items.iter().map(|e| e.amount).sum();
        out.push(TripView {
            remaining: trip.budget - spent,
            saved_pct: progress_pct(trip.saved_amount, trip.budget),
            expense_count: items.len(),
            spent,
            trip,
        });
    }
    Ok(out)
}

pub fn add_expense(
    conn: &Connection,
    trip_id: i64,
    date: NaiveDate,
    amount: Decimal,
    description: &str,
    category_id: Option<i64>,
) -> Result<i64> {
    if let Some(cid) = category_id {
        let cat = categories::get(conn, cid)?;
        if cat.kind != CategoryKind::Expense {
            return Err(ValidationError::Rule(format!(
                "Category '{}' is {}, not expense",
                cat.name,
                cat.kind.as_str()
            ))
            .into());
        }
    }
    conn.execute(
        "INSERT INTO trip_expenses(trip_id, date, amount, description, category_id) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            trip_id,
            date.to_string(),
            amount.to_string(),
            description,
            category_id
        ],
    )?;
    info!(trip_id, %amount, "trip expense added");
    Ok(conn.last_insert_rowid())
}

pub fn expenses(conn: &Connection, trip_id: i64) -> Result<Vec<TripExpense>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, date, amount, description, category_id FROM trip_expenses
         WHERE trip_id=?1 ORDER BY date, id",
    )?;
    let rows = stmt.query_map(params![trip_id], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<i64>>(4)?,
        ))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, date, amount, description, category_id) = row?;
        out.push(TripExpense {
            id,
            trip_id,
            date: parse_date(&date)?,
            amount: stored_decimal(&amount, "trip_expenses")?,
            description,
            category_id,
        });
    }
    Ok(out)
}
