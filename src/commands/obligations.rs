// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Debts and loans are the same ledger seen from opposite sides: a debt is
//! paid down from an account (expense), a loan is collected into one
//! (income). Both share this module and one payment-suggestion routine.

use crate::amortization::{Suggestion, progress_pct, suggest_for_due_date};
use crate::commands::transactions::{self, NewTransaction};
use crate::error::{ValidationError, require_non_negative, require_positive, require_text};
use crate::models::{Obligation, ObligationStatus, TxKind};
use crate::utils::{
    id_for_active_account, id_for_category, json_flags, maybe_print_json, opt_arg, parse_date,
    parse_decimal, pretty_table, req_arg, req_id, stored_decimal, today,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Debt,
    Loan,
}

impl Side {
    fn table(self) -> &'static str {
        match self {
            Side::Debt => "debts",
            Side::Loan => "loans",
        }
    }

    /// Column and CLI flag naming the other party.
    pub fn party(self) -> &'static str {
        match self {
            Side::Debt => "creditor",
            Side::Loan => "debtor",
        }
    }

    fn history(self) -> (&'static str, &'static str) {
        match self {
            Side::Debt => ("debt_payments", "debt_id"),
            Side::Loan => ("loan_collections", "loan_id"),
        }
    }

    fn tx_kind(self) -> TxKind {
        match self {
            Side::Debt => TxKind::Expense,
            Side::Loan => TxKind::Income,
        }
    }

    /// Seeded category used for posted transactions when none is given.
    fn default_category(self) -> &'static str {
        match self {
            Side::Debt => "Debt Payments",
            Side::Loan => "Other Income",
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Side::Debt => "Debt",
            Side::Loan => "Loan",
        }
    }
}

pub fn handle(conn: &mut Connection, side: Side, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let new = NewObligation {
                counterparty: require_text(side.party(), &req_arg(sub, side.party())?)?,
                amount: require_positive("amount", parse_decimal(&req_arg(sub, "amount")?)?)?,
                interest_rate: require_non_negative(
                    "rate",
                    parse_decimal(&opt_arg(sub, "rate").unwrap_or_else(|| "0".into()))?,
                )?,
                due_date: parse_date(&req_arg(sub, "due")?)?,
                notes: opt_arg(sub, "notes"),
            };
            let id = add(conn, side, &new)?;
            println!(
                "Added {} #{}: {} {:.2} at {}% due {}",
                side.noun().to_lowercase(),
                id,
                new.counterparty,
                new.amount,
                new.interest_rate,
                new.due_date
            );
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let data = list(conn, side, sub.get_flag("all"), today())?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|v| {
                        vec![
                            v.obligation.id.to_string(),
                            v.obligation.counterparty.clone(),
                            format!("{:.2}", v.obligation.initial_amount),
                            format!("{:.2}", v.obligation.balance),
                            format!("{}%", v.obligation.interest_rate),
                            v.obligation.due_date.clone().unwrap_or_default(),
                            v.obligation.status.as_str().to_string(),
                            format!("{:.2}%", v.paid_pct),
                            v.suggestion.label(),
                        ]
                    })
                    .collect();
                let party = match side {
                    Side::Debt => "Creditor",
                    Side::Loan => "Debtor",
                };
                println!(
                    "{}",
                    pretty_table(
                        &[
                            "ID",
                            party,
                            "Initial",
                            "Balance",
                            "Rate",
                            "Due",
                            "Status",
                            "Paid",
                            "Suggested",
                        ],
                        rows
                    )
                );
            }
        }
        Some(("pay", sub)) | Some(("collect", sub)) => {
            let id = req_id(sub, "id")?;
            let amount = require_positive("amount", parse_decimal(&req_arg(sub, "amount")?)?)?;
            let date = match opt_arg(sub, "date") {
                Some(d) => parse_date(&d)?,
                None => today(),
            };
            let payment = Payment {
                amount,
                date,
                account: opt_arg(sub, "account"),
                category: opt_arg(sub, "category"),
            };
            let outcome = record_payment(conn, side, id, &payment)?;
            println!(
                "{} #{}: recorded {:.2}, balance now {:.2}{}",
                side.noun(),
                id,
                amount,
                outcome.balance,
                if outcome.settled { " (settled)" } else { "" }
            );
        }
        Some(("settle", sub)) => {
            let id = req_id(sub, "id")?;
            settle(conn, side, id)?;
            println!("{} #{} marked settled", side.noun(), id);
        }
        Some(("rm", sub)) => {
            let id = req_id(sub, "id")?;
            remove(conn, side, id)?;
            println!("Removed {} #{}", side.noun().to_lowercase(), id);
        }
        Some(("suggest", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let id = req_id(sub, "id")?;
            let s = suggestion_for(&get(conn, side, id)?, today());
            if !maybe_print_json(json_flag, jsonl_flag, &s)? {
                println!("{} #{}: {}", side.noun(), id, s.label());
            }
        }
        Some(("history", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let id = req_id(sub, "id")?;
            get(conn, side, id)?;
            let data = history(conn, side, id)?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|(d, a)| vec![d.clone(), format!("{:.2}", a)])
                    .collect();
                println!("{}", pretty_table(&["Date", "Amount"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewObligation {
    pub counterparty: String,
    pub amount: Decimal,
    pub interest_rate: Decimal,
    pub due_date: NaiveDate,
    pub notes: Option<String>,
}

pub fn add(conn: &Connection, side: Side, new: &NewObligation) -> Result<i64> {
    conn.execute(
        &format!(
            "INSERT INTO {}({}, initial_amount, balance, interest_rate, due_date, notes)
             VALUES (?1, ?2, ?2, ?3, ?4, ?5)",
            side.table(),
            side.party()
        ),
        params![
            new.counterparty,
            new.amount.to_string(),
            new.interest_rate.to_string(),
            new.due_date.to_string(),
            new.notes
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(table = side.table(), id, amount = %new.amount, "obligation added");
    Ok(id)
}

fn select_sql(side: Side) -> String {
    format!(
        "SELECT id, {}, initial_amount, balance, interest_rate, due_date, status, notes FROM {}",
        side.party(),
        side.table()
    )
}

type RawRow = (
    i64,
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    Option<String>,
);

fn raw_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
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

fn from_raw(side: Side, raw: RawRow) -> Result<Obligation> {
    let (id, counterparty, initial, balance, rate, due_date, status, notes) = raw;
    let what = format!("{} #{}", side.table(), id);
    Ok(Obligation {
        id,
        counterparty,
        initial_amount: stored_decimal(&initial, &what)?,
        balance: stored_decimal(&balance, &what)?,
        interest_rate: stored_decimal(&rate, &what)?,
        due_date,
        status: status.parse()?,
        notes,
    })
}

pub fn get(conn: &Connection, side: Side, id: i64) -> Result<Obligation> {
    let raw = conn
        .query_row(
            &format!("{} WHERE id=?1", select_sql(side)),
            params![id],
            raw_row,
        )
        .optional()?
        .with_context(|| format!("{} #{} not found", side.noun(), id))?;
    from_raw(side, raw)
}

/// One list row: the stored obligation plus derived numbers.
#[derive(Debug, Clone, Serialize)]
pub struct ObligationView {
    #[serde(flatten)]
    pub obligation: Obligation,
    pub paid_pct: Decimal,
    pub suggestion: Suggestion,
}

pub fn suggestion_for(o: &Obligation, today: NaiveDate) -> Suggestion {
    suggest_for_due_date(
        o.balance,
        o.interest_rate,
        o.due_date.as_deref(),
        o.status == ObligationStatus::Settled,
        today,
    )
}

pub fn list(
    conn: &Connection,
    side: Side,
    include_settled: bool,
    today: NaiveDate,
) -> Result<Vec<ObligationView>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE status='active' OR ?1 ORDER BY status, due_date, id",
        select_sql(side)
    ))?;
    let rows = stmt.query_map(params![include_settled], raw_row)?;
    let mut out = Vec::new();
    for row in rows {
        let o = from_raw(side, row?)?;
        let paid_pct = progress_pct(o.initial_amount - o.balance, o.initial_amount);
        let suggestion = suggestion_for(&o, today);
        debug!(table = side.table(), id = o.id, ?suggestion, "payment suggestion");
        out.push(ObligationView {
            obligation: o,
            paid_pct,
            suggestion,
        });
    }
    Ok(out)
}

#[derive(Debug, Clone)]
pub struct Payment {
    pub amount: Decimal,
    pub date: NaiveDate,
    /// Account the money leaves (debt) or lands in (loan).
    pub account: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub balance: Decimal,
    pub settled: bool,
    pub transaction_id: Option<i64>,
}

/// Pay down a debt or collect on a loan as one SQL transaction: history row,
/// new balance and status, and (with an account) a posted transaction that
/// moves the account balance.
pub fn record_payment(
    conn: &mut Connection,
    side: Side,
    id: i64,
    payment: &Payment,
) -> Result<PaymentOutcome> {
    let o = get(conn, side, id)?;
    if o.status == ObligationStatus::Settled {
        return Err(ValidationError::Rule(format!("{} #{} is already settled", side.noun(), id)).into());
    }
    if payment.amount > o.balance {
        return Err(ValidationError::Rule(format!(
            "Amount {:.2} exceeds outstanding balance {:.2}",
            payment.amount, o.balance
        ))
        .into());
    }

    let posted = match payment.account.as_deref() {
        Some(account) => {
            let category_id = match payment.category.as_deref() {
                Some(c) => Some(id_for_category(conn, c)?),
                None => conn
                    .query_row(
                        "SELECT id FROM categories WHERE name=?1",
                        params![side.default_category()],
                        |r| r.get(0),
                    )
                    .optional()?,
            };
            let new = NewTransaction {
                kind: side.tx_kind(),
                amount: payment.amount,
                date: payment.date,
                account_id: id_for_active_account(conn, account)?,
                to_account_id: None,
                category_id,
                notes: Some(format!("{} #{}: {}", side.noun(), id, o.counterparty)),
            };
            transactions::validate(conn, &new)?;
            Some(new)
        }
        None => None,
    };

    let balance = o.balance - payment.amount;
    let status = if balance.is_zero() {
        ObligationStatus::Settled
    } else {
        ObligationStatus::Active
    };

    let tx = conn.transaction()?;
    let transaction_id = match &posted {
        Some(new) => Some(transactions::post(&tx, new)?),
        None => None,
    };
    let (history, fk) = side.history();
    tx.execute(
        &format!(
            "INSERT INTO {}({}, date, amount, account_id, transaction_id) VALUES (?1, ?2, ?3, ?4, ?5)",
            history, fk
        ),
        params![
            id,
            payment.date.to_string(),
            payment.amount.to_string(),
            posted.as_ref().map(|n| n.account_id),
            transaction_id
        ],
    )?;
    tx.execute(
        &format!("UPDATE {} SET balance=?1, status=?2 WHERE id=?3", side.table()),
        params![balance.to_string(), status.as_str(), id],
    )?;
    tx.commit()?;
    info!(
        table = side.table(),
        id,
        amount = %payment.amount,
        %balance,
        status = status.as_str(),
        "payment recorded"
    );
    Ok(PaymentOutcome {
        balance,
        settled: status == ObligationStatus::Settled,
        transaction_id,
    })
}

pub fn settle(conn: &Connection, side: Side, id: i64) -> Result<()> {
    let n = conn.execute(
        &format!("UPDATE {} SET status='settled', balance='0' WHERE id=?1", side.table()),
        params![id],
    )?;
    if n == 0 {
        anyhow::bail!("{} #{} not found", side.noun(), id);
    }
    info!(table = side.table(), id, "obligation settled");
    Ok(())
}

pub fn remove(conn: &Connection, side: Side, id: i64) -> Result<()> {
    let n = conn.execute(
        &format!("DELETE FROM {} WHERE id=?1", side.table()),
        params![id],
    )?;
    if n == 0 {
        anyhow::bail!("{} #{} not found", side.noun(), id);
    }
    info!(table = side.table(), id, "obligation removed");
    Ok(())
}

/// Payment history, oldest first: (date, amount).
pub fn history(conn: &Connection, side: Side, id: i64) -> Result<Vec<(String, Decimal)>> {
    let (table, fk) = side.history();
    let mut stmt = conn.prepare(&format!(
        "SELECT date, amount FROM {} WHERE {}=?1 ORDER BY date, id",
        table, fk
    ))?;
    let rows = stmt.query_map(params![id], |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (date, amount) = row?;
        out.push((date, stored_decimal(&amount, table)?));
    }
    Ok(out)
}
