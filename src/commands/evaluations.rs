// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::amortization::progress_pct;
use crate::cli::EVAL_FIELDS;
use crate::error::require_non_negative;
use crate::models::Evaluation;
use crate::utils::{
    json_flags, maybe_print_json, opt_arg, parse_decimal, parse_month, pretty_table, req_arg,
    stored_decimal,
};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let month = parse_month(&req_arg(sub, "month")?)?;
            let mut eval = get(conn, &month)?.unwrap_or_else(|| Evaluation {
                month: month.clone(),
                ..Default::default()
            });
            for &field in EVAL_FIELDS {
                if let Some(raw) = opt_arg(sub, field) {
                    let v = require_non_negative(field, parse_decimal(&raw)?)?;
                    *slot(&mut eval, field)
                        .with_context(|| format!("Unknown plan field '{}'", field))? = v;
                }
            }
            if let Some(notes) = opt_arg(sub, "notes") {
                eval.notes = Some(notes);
            }
            save(conn, &eval)?;
            let v = view(&eval);
            println!(
                "Saved plan for {}: income {:.2}, allocated {:.2}, unallocated {:.2}",
                month, eval.income, v.allocated, v.unallocated
            );
            if v.unallocated < Decimal::ZERO {
                let over = -v.unallocated;
                warn!(month = %month, %over, "plan allocates more than income");
                println!("Warning: allocations exceed income by {:.2}", over);
            }
        }
        Some(("show", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let month = parse_month(&req_arg(sub, "month")?)?;
            let eval = get(conn, &month)?
                .with_context(|| format!("No evaluation for {}", month))?;
            let v = view(&eval);
            if !maybe_print_json(json_flag, jsonl_flag, &v)? {
                let mut rows: Vec<Vec<String>> = v
                    .shares
                    .iter()
                    .map(|s| {
                        vec![
                            s.label.to_string(),
                            format!("{:.2}", s.amount),
                            format!("{:.2}%", s.pct_of_income),
                        ]
                    })
                    .collect();
                rows.push(vec![
                    "Allocated".into(),
                    format!("{:.2}", v.allocated),
                    format!("{:.2}%", progress_pct(v.allocated, eval.income)),
                ]);
                rows.push(vec![
                    "Unallocated".into(),
                    format!("{:.2}", v.unallocated),
                    String::new(),
                ]);
                println!("{} plan, income {:.2}", month, eval.income);
                println!("{}", pretty_table(&["Bucket", "Amount", "Of income"], rows));
                if let Some(n) = &eval.notes {
                    println!("Notes: {}", n);
                }
            }
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let data = list(conn)?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|e| {
                        vec![
                            e.month.clone(),
                            format!("{:.2}", e.income),
                            format!("{:.2}", e.allocated()),
                            format!("{:.2}", e.unallocated()),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Month", "Income", "Allocated", "Unallocated"], rows)
                );
            }
        }
        Some(("rm", sub)) => {
            let month = parse_month(&req_arg(sub, "month")?)?;
            let n = conn.execute("DELETE FROM evaluations WHERE month=?1", params![month])?;
            if n == 0 {
                anyhow::bail!("No evaluation for {}", month);
            }
            info!(month = %month, "evaluation removed");
            println!("Removed evaluation for {}", month);
        }
        Some(("copy", sub)) => {
            let from = parse_month(&req_arg(sub, "from")?)?;
            let to = parse_month(&req_arg(sub, "to")?)?;
            copy(conn, &from, &to)?;
            println!("Copied plan {} → {}", from, to);
        }
        _ => {}
    }
    Ok(())
}

/// Column behind an `eval set` flag id.
pub fn slot<'a>(e: &'a mut Evaluation, field: &str) -> Option<&'a mut Decimal> {
    match field {
        "income" => Some(&mut e.income),
        "savings" => Some(&mut e.savings),
        "fixed-costs" => Some(&mut e.fixed_costs),
        "variable-costs" => Some(&mut e.variable_costs),
        "buffer" => Some(&mut e.buffer),
        "travel" => Some(&mut e.travel),
        "investment" => Some(&mut e.investment),
        "extra" => Some(&mut e.extra),
        _ => None,
    }
}

pub fn save(conn: &Connection, e: &Evaluation) -> Result<()> {
    conn.execute(
        "INSERT INTO evaluations(month, income, savings, fixed_costs, variable_costs, buffer, travel, investment, extra, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(month) DO UPDATE SET
            income=excluded.income, savings=excluded.savings, fixed_costs=excluded.fixed_costs,
            variable_costs=excluded.variable_costs, buffer=excluded.buffer, travel=excluded.travel,
            investment=excluded.investment, extra=excluded.extra, notes=excluded.notes,
            updated_at=datetime('now')",
        params![
            e.month,
            e.income.to_string(),
            e.savings.to_string(),
            e.fixed_costs.to_string(),
            e.variable_costs.to_string(),
            e.buffer.to_string(),
            e.travel.to_string(),
            e.investment.to_string(),
            e.extra.to_string(),
            e.notes
        ],
    )?;
    info!(month = %e.month, income = %e.income, "evaluation saved");
    Ok(())
}

const SELECT: &str = "SELECT month, income, savings, fixed_costs, variable_costs, buffer, travel, investment, extra, notes FROM evaluations";

fn from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<(Vec<String>, Option<String>)> {
    let mut cols = Vec::with_capacity(9);
    for i in 0..9 {
        cols.push(r.get::<_, String>(i)?);
    }
    Ok((cols, r.get(9)?))
}

fn build(cols: Vec<String>, notes: Option<String>) -> Result<Evaluation> {
    let month = cols[0].clone();
    let what = format!("evaluation {}", month);
    let d = |i: usize| stored_decimal(&cols[i], &what);
    Ok(Evaluation {
        income: d(1)?,
        savings: d(2)?,
        fixed_costs: d(3)?,
        variable_costs: d(4)?,
        buffer: d(5)?,
        travel: d(6)?,
        investment: d(7)?,
        extra: d(8)?,
        notes,
        month,
    })
}

pub fn get(conn: &Connection, month: &str) -> Result<Option<Evaluation>> {
    let row = conn
        .query_row(&format!("{} WHERE month=?1", SELECT), params![month], from_row)
        .optional()?;
    row.map(|(cols, notes)| build(cols, notes)).transpose()
}

pub fn list(conn: &Connection) -> Result<Vec<Evaluation>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY month DESC", SELECT))?;
    let rows = stmt.query_map([], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        let (cols, notes) = row?;
        out.push(build(cols, notes)?);
    }
    Ok(out)
}

pub fn copy(conn: &Connection, from: &str, to: &str) -> Result<()> {
    let mut e = get(conn, from)?.with_context(|| format!("No evaluation for {}", from))?;
    e.month = to.to_string();
    save(conn, &e)
}

#[derive(Debug, Clone, Serialize)]
pub struct Share {
    pub label: &'static str,
    pub amount: Decimal,
    pub pct_of_income: Decimal,
}

/// Label/value arrays for a doughnut chart; zero buckets are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub values: Vec<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationView {
    #[serde(flatten)]
    pub evaluation: Evaluation,
    pub allocated: Decimal,
    pub unallocated: Decimal,
    pub shares: Vec<Share>,
    pub chart: ChartData,
}

pub fn view(e: &Evaluation) -> EvaluationView {
    let shares: Vec<Share> = e
        .buckets()
        .into_iter()
        .map(|(label, amount)| Share {
            label,
            amount,
            pct_of_income: progress_pct(amount, e.income),
        })
        .collect();
    let mut chart = ChartData::default();
    for s in shares.iter().filter(|s| s.amount > Decimal::ZERO) {
        chart.labels.push(s.label.to_string());
        chart.values.push(s.amount);
    }
    if e.unallocated() > Decimal::ZERO {
        chart.labels.push("Unallocated".into());
        chart.values.push(e.unallocated());
    }
    EvaluationView {
        allocated: e.allocated(),
        unallocated: e.unallocated(),
        evaluation: e.clone(),
        shares,
        chart,
    }
}
