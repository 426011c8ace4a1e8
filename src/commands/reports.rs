// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::{accounts, obligations};
use crate::commands::obligations::Side;
use crate::utils::{
    fmt_money, get_currency, json_flags, maybe_print_json, parse_month, pretty_table, req_arg,
    stored_decimal, today,
};
use anyhow::Result;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("balances", sub)) => balances(conn, sub)?,
        Some(("cashflow", sub)) => cashflow(conn, sub)?,
        Some(("spend-by-category", sub)) => spend_by_category(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct NetWorth {
    pub accounts: Vec<(String, Decimal)>,
    pub account_total: Decimal,
    pub receivable: Decimal,
    pub owed: Decimal,
    pub net_worth: Decimal,
}

/// Account balances plus what others owe (active loans) minus what is owed
/// (active debts). Archived accounts still count.
pub fn net_worth(conn: &Connection) -> Result<NetWorth> {
    let accts: Vec<(String, Decimal)> = accounts::list(conn, true)?
        .into_iter()
        .map(|a| (a.name, a.balance))
        .collect();
    let account_total: Decimal = accts.iter().map(|(_, b)| *b).sum();
    let open = |side| -> Result<Decimal> {
        Ok(obligations::list(conn, side, false, today())?
            .iter()
            .map(|v| v.obligation.balance)
            .sum())
    };
    let receivable = open(Side::Loan)?;
    let owed = open(Side::Debt)?;
    Ok(NetWorth {
        accounts: accts,
        account_total,
        receivable,
        owed,
        net_worth: account_total + receivable - owed,
    })
}

fn balances(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let nw = net_worth(conn)?;
    if !maybe_print_json(json_flag, jsonl_flag, &nw)? {
        let ccy = get_currency(conn)?;
        let mut data: Vec<Vec<String>> = nw
            .accounts
            .iter()
            .map(|(n, b)| vec![n.clone(), fmt_money(b, &ccy)])
            .collect();
        data.push(vec!["Accounts total".into(), fmt_money(&nw.account_total, &ccy)]);
        data.push(vec!["Loans receivable".into(), fmt_money(&nw.receivable, &ccy)]);
        data.push(vec!["Debts owed".into(), fmt_money(&-nw.owed, &ccy)]);
        data.push(vec!["Net worth".into(), fmt_money(&nw.net_worth, &ccy)]);
        println!("{}", pretty_table(&["Account", "Balance"], data));
    }
    Ok(())
}

/// Income and expense per month, newest first. Transfers are excluded.
pub fn monthly_cashflow(conn: &Connection, months: usize) -> Result<Vec<(String, Decimal, Decimal)>> {
    let mut stmt = conn.prepare(
        "SELECT substr(date,1,7), kind, amount FROM transactions WHERE kind != 'transfer'",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    let mut map: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for row in rows {
        let (m, kind, amt) = row?;
        let amt = stored_decimal(&amt, "transactions")?;
        let entry = map.entry(m).or_insert((Decimal::ZERO, Decimal::ZERO));
        if kind == "income" {
            entry.0 += amt;
        } else {
            entry.1 += amt;
        }
    }
    Ok(map
        .into_iter()
        .rev()
        .take(months)
        .map(|(m, (i, e))| (m, i, e))
        .collect())
}

fn cashflow(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let months: usize = *sub.get_one::<usize>("months").unwrap_or(&12);
    let data: Vec<Vec<String>> = monthly_cashflow(conn, months)?
        .into_iter()
        .map(|(m, inc, exp)| {
            vec![
                m,
                format!("{:.2}", inc),
                format!("{:.2}", exp),
                format!("{:.2}", inc - exp),
            ]
        })
        .collect();
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!(
            "{}",
            pretty_table(&["Month", "Income", "Expense", "Net"], data)
        );
    }
    Ok(())
}

/// Expense totals per category for `month`, largest first.
pub fn spend_for_month(conn: &Connection, month: &str) -> Result<Vec<(String, Decimal)>> {
    let mut stmt = conn.prepare(
        "SELECT c.name, t.amount FROM transactions t LEFT JOIN categories c ON t.category_id=c.id
         WHERE t.kind='expense' AND substr(t.date,1,7)=?1",
    )?;
    let rows = stmt.query_map(params![month], |r| {
        Ok((r.get::<_, Option<String>>(0)?, r.get::<_, String>(1)?))
    })?;
    let mut agg: BTreeMap<String, Decimal> = BTreeMap::new();
    for row in rows {
        let (cat, amt) = row?;
        let cat = cat.unwrap_or("(uncategorized)".into());
        *agg.entry(cat).or_insert(Decimal::ZERO) += stored_decimal(&amt, "transactions")?;
    }
    let mut items: Vec<_> = agg.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(items)
}

fn spend_by_category(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let month = parse_month(&req_arg(sub, "month")?)?;
    let items = spend_for_month(conn, &month)?;
    if !maybe_print_json(json_flag, jsonl_flag, &items)? {
        let data = items
            .into_iter()
            .map(|(c, a)| vec![c, format!("{:.2}", a)])
            .collect();
        println!("{}", pretty_table(&["Category", "Spent"], data));
    }
    Ok(())
}
