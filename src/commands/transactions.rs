// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::categories;
use crate::error::{ValidationError, require_positive};
use crate::models::{CategoryKind, TxKind};
use crate::utils::{
    adjust_account_balance, id_for_active_account, id_for_category, json_flags,
    maybe_print_json, opt_arg, parse_date, parse_decimal, pretty_table, req_arg, req_id,
    stored_decimal,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = req_id(sub, "id")?;
            remove(conn, id)?;
            println!("Removed transaction #{}", id);
        }
        _ => {}
    }
    Ok(())
}

/// A validated transaction ready to post.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TxKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub account_id: i64,
    pub to_account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub notes: Option<String>,
}

impl NewTransaction {
    /// Signed balance effect on (source, destination).
    fn effects(&self) -> (Decimal, Option<Decimal>) {
        match self.kind {
            TxKind::Expense => (-self.amount, None),
            TxKind::Income => (self.amount, None),
            TxKind::Transfer => (-self.amount, Some(self.amount)),
        }
    }
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let kind: TxKind = req_arg(sub, "kind")?.parse()?;
    let amount = require_positive("amount", parse_decimal(&req_arg(sub, "amount")?)?)?;
    let date = parse_date(&req_arg(sub, "date")?)?;
    let account_name = req_arg(sub, "account")?;
    let account_id = id_for_active_account(conn, &account_name)?;
    let to_account_id = opt_arg(sub, "to-account")
        .map(|n| id_for_active_account(conn, &n))
        .transpose()?;
    let category_id = opt_arg(sub, "category")
        .map(|c| id_for_category(conn, &c))
        .transpose()?;

    let new = NewTransaction {
        kind,
        amount,
        date,
        account_id,
        to_account_id,
        category_id,
        notes: opt_arg(sub, "notes"),
    };
    validate(conn, &new)?;

    let tx = conn.transaction()?;
    let id = post(&tx, &new)?;
    tx.commit()?;
    println!(
        "Recorded {} #{} of {} on {} (acct: {})",
        kind.as_str(),
        id,
        amount,
        date,
        account_name
    );
    Ok(())
}

/// Cross-field rules that need the store (category kind, transfer legs).
pub fn validate(conn: &Connection, new: &NewTransaction) -> Result<()> {
    match new.kind {
        TxKind::Transfer => {
            let Some(to) = new.to_account_id else {
                return Err(ValidationError::Required("to-account").into());
            };
            if to == new.account_id {
                return Err(ValidationError::Rule(
                    "Transfer source and destination must differ".into(),
                )
                .into());
            }
            if new.category_id.is_some() {
                return Err(
                    ValidationError::Rule("Transfers do not take a category".into()).into(),
                );
            }
        }
        TxKind::Expense | TxKind::Income => {
            if new.to_account_id.is_some() {
                return Err(ValidationError::Rule(
                    "Only transfers take a destination account".into(),
                )
                .into());
            }
            if let Some(cid) = new.category_id {
                let cat = categories::get(conn, cid)?;
                let want = if new.kind == TxKind::Income {
                    CategoryKind::Income
                } else {
                    CategoryKind::Expense
                };
                if cat.kind != want {
                    return Err(ValidationError::Rule(format!(
                        "Category '{}' is {}, not {}",
                        cat.name,
                        cat.kind.as_str(),
                        new.kind.as_str()
                    ))
                    .into());
                }
            }
        }
    }
    Ok(())
}

/// Insert the row and move account balances. Callers own the SQL
/// transaction so this can be one step of a larger operation.
pub fn post(conn: &Connection, new: &NewTransaction) -> Result<i64> {
    conn.execute(
        "INSERT INTO transactions(kind, amount, date, account_id, to_account_id, category_id, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            new.kind.as_str(),
            new.amount.to_string(),
            new.date.to_string(),
            new.account_id,
            new.to_account_id,
            new.category_id,
            new.notes
        ],
    )?;
    let id = conn.last_insert_rowid();
    let (src, dst) = new.effects();
    adjust_account_balance(conn, new.account_id, src)?;
    if let (Some(to), Some(delta)) = (new.to_account_id, dst) {
        adjust_account_balance(conn, to, delta)?;
    }
    info!(id, kind = new.kind.as_str(), amount = %new.amount, "transaction posted");
    Ok(id)
}

fn remove(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let row: Option<(String, String, i64, Option<i64>)> = tx
        .query_row(
            "SELECT kind, amount, account_id, to_account_id FROM transactions WHERE id=?1",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .optional()?;
    let (kind, amount, account_id, to_account_id) =
        row.with_context(|| format!("Transaction #{} not found", id))?;
    // Payment and collection postings belong to their debt or loan row.
    let linked: i64 = tx.query_row(
        "SELECT (SELECT COUNT(*) FROM debt_payments WHERE transaction_id=?1)
              + (SELECT COUNT(*) FROM loan_collections WHERE transaction_id=?1)",
        params![id],
        |r| r.get(0),
    )?;
    if linked > 0 {
        return Err(ValidationError::Rule(format!(
            "Transaction #{} records a debt payment or loan collection; remove that debt or loan instead",
            id
        ))
        .into());
    }
    let kind: TxKind = kind.parse()?;
    let amount = stored_decimal(&amount, &format!("transaction #{}", id))?;
    match kind {
        TxKind::Expense => adjust_account_balance(&tx, account_id, amount)?,
        TxKind::Income => adjust_account_balance(&tx, account_id, -amount)?,
        TxKind::Transfer => {
            adjust_account_balance(&tx, account_id, amount)?;
            if let Some(to) = to_account_id {
                adjust_account_balance(&tx, to, -amount)?;
            }
        }
    }
    tx.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    tx.commit()?;
    info!(id, "transaction removed and balances reversed");
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                let account = match &r.to_account {
                    Some(to) => format!("{} → {}", r.account, to),
                    None => r.account.clone(),
                };
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.kind.clone(),
                    account,
                    r.amount.clone(),
                    r.category.clone(),
                    r.notes.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Kind", "Account", "Amount", "Category", "Notes"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub kind: String,
    pub account: String,
    pub to_account: Option<String>,
    pub amount: String,
    pub category: String,
    pub notes: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, t.kind, a.name, d.name, t.amount, c.name, t.notes
         FROM transactions t
         LEFT JOIN accounts a ON t.account_id=a.id
         LEFT JOIN accounts d ON t.to_account_id=d.id
         LEFT JOIN categories c ON t.category_id=c.id
         WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();

    if let Some(month) = opt_arg(sub, "month") {
        sql.push_str(" AND substr(t.date,1,7)=?");
        params_vec.push(month);
    }
    if let Some(acct) = opt_arg(sub, "account") {
        sql.push_str(" AND (a.name=? OR d.name=?)");
        params_vec.push(acct.clone());
        params_vec.push(acct);
    }
    if let Some(cat) = opt_arg(sub, "category") {
        sql.push_str(" AND c.name=?");
        params_vec.push(cat);
    }
    if let Some(kind) = opt_arg(sub, "kind") {
        let kind: TxKind = kind.parse()?;
        sql.push_str(" AND t.kind=?");
        params_vec.push(kind.as_str().to_string());
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }
    debug!(%sql, params = ?params_vec, "listing transactions");

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(params_vec.iter()))?;

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let category: Option<String> = r.get(6)?;
        let notes: Option<String> = r.get(7)?;
        data.push(TransactionRow {
            id: r.get(0)?,
            date: r.get(1)?,
            kind: r.get(2)?,
            account: r.get(3)?,
            to_account: r.get(4)?,
            amount: r.get(5)?,
            category: category.unwrap_or_default(),
            notes: notes.unwrap_or_default(),
        });
    }
    Ok(data)
}
