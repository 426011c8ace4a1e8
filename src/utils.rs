// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::ValidationError;
use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap());

/// Settings keys accepted by `config set`, with their defaults.
pub const SETTINGS: &[(&str, &str)] = &[("currency", "USD")];

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_month(s: &str) -> Result<String> {
    let s = s.trim();
    NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok(s.to_string())
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Parse a stored money column; `what` names the row for the error.
pub fn stored_decimal(s: &str, what: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid amount '{}' in {}", s, what))
}

pub fn validate_color(s: &str) -> Result<String, ValidationError> {
    let s = s.trim();
    if HEX_COLOR.is_match(s) {
        Ok(s.to_uppercase())
    } else {
        Err(ValidationError::InvalidColor(s.to_string()))
    }
}

/// Trimmed optional argument; blank counts as absent.
pub fn opt_arg(m: &clap::ArgMatches, id: &str) -> Option<String> {
    m.get_one::<String>(id)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Trimmed required argument.
pub fn req_arg(m: &clap::ArgMatches, id: &str) -> Result<String> {
    opt_arg(m, id).ok_or_else(|| anyhow!("--{} is required", id))
}

pub fn req_id(m: &clap::ArgMatches, id: &str) -> Result<i64> {
    let raw = req_arg(m, id)?;
    raw.parse::<i64>()
        .with_context(|| format!("Invalid id '{}'", raw))
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, d.round_dp(2))
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

pub fn id_for_account(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Account '{}' not found", name))?;
    Ok(id)
}

/// Like [`id_for_account`] but rejects archived accounts.
pub fn id_for_active_account(conn: &Connection, name: &str) -> Result<i64> {
    let (id, archived): (i64, bool) = conn
        .query_row(
            "SELECT id, archived FROM accounts WHERE name=?1",
            params![name],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .with_context(|| format!("Account '{}' not found", name))?;
    if archived {
        return Err(ValidationError::Rule(format!("Account '{}' is archived", name)).into());
    }
    Ok(id)
}

pub fn id_for_category(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", name))?;
    Ok(id)
}

/// Add `delta` to an account's stored balance.
pub fn adjust_account_balance(conn: &Connection, account_id: i64, delta: Decimal) -> Result<()> {
    let current: String = conn
        .query_row(
            "SELECT balance FROM accounts WHERE id=?1",
            params![account_id],
            |r| r.get(0),
        )
        .with_context(|| format!("Account #{} not found", account_id))?;
    let next = stored_decimal(&current, "accounts")? + delta;
    conn.execute(
        "UPDATE accounts SET balance=?1 WHERE id=?2",
        params![next.to_string(), account_id],
    )?;
    Ok(())
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<String> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?;
    match v {
        Some(v) => Ok(v),
        None => SETTINGS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, d)| d.to_string())
            .ok_or_else(|| anyhow!("Unknown setting '{}'", key)),
    }
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    if !SETTINGS.iter().any(|(k, _)| *k == key) {
        return Err(anyhow!("Unknown setting '{}'", key));
    }
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn get_currency(conn: &Connection) -> Result<String> {
    get_setting(conn, "currency")
}

/// The month following `month` (both `YYYY-MM`).
pub fn next_month(month: &str) -> Result<String> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}'", month))?;
    let (y, m) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    Ok(format!("{:04}-{:02}", y, m))
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

/// `--json` / `--jsonl` flags, tolerating subcommands that define neither.
pub fn json_flags(m: &clap::ArgMatches) -> (bool, bool) {
    let flag = |id: &str| {
        m.try_get_one::<bool>(id)
            .ok()
            .flatten()
            .copied()
            .unwrap_or(false)
    };
    (flag("json"), flag("jsonl"))
}
