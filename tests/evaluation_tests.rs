// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fintrack::cli::EVAL_FIELDS;
use fintrack::commands::evaluations;
use fintrack::models::Evaluation;
use fintrack::{cli, db};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn d(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

fn run_eval(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["fintrack", "eval"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("eval", m)) = matches.subcommand() {
        evaluations::handle(conn, m)
    } else {
        panic!("no eval subcommand");
    }
}

#[test]
fn partial_updates_keep_earlier_buckets() {
    let conn = setup();
    run_eval(
        &conn,
        &[
            "set", "--month", "2025-05", "--income", "4000", "--savings", "800",
            "--fixed-costs", "1500", "--travel", "200",
        ],
    )
    .unwrap();
    run_eval(
        &conn,
        &["set", "--month", "2025-05", "--buffer", "300", "--notes", "tight month"],
    )
    .unwrap();

    let e = evaluations::get(&conn, "2025-05").unwrap().unwrap();
    assert_eq!(e.income, d("4000"));
    assert_eq!(e.savings, d("800"));
    assert_eq!(e.fixed_costs, d("1500"));
    assert_eq!(e.buffer, d("300"));
    assert_eq!(e.variable_costs, Decimal::ZERO);
    assert_eq!(e.notes.as_deref(), Some("tight month"));
    assert_eq!(evaluations::list(&conn).unwrap().len(), 1);
}

#[test]
fn view_splits_income_and_builds_chart() {
    let conn = setup();
    run_eval(
        &conn,
        &[
            "set", "--month", "2025-05", "--income", "4000", "--savings", "800",
            "--fixed-costs", "1500", "--travel", "200", "--buffer", "300",
        ],
    )
    .unwrap();
    let e = evaluations::get(&conn, "2025-05").unwrap().unwrap();
    let v = evaluations::view(&e);

    assert_eq!(v.allocated, d("2800"));
    assert_eq!(v.unallocated, d("1200"));
    assert_eq!(
        v.chart.labels,
        ["Savings", "Fixed costs", "Buffer", "Travel", "Unallocated"]
    );
    assert_eq!(
        v.chart.values,
        vec![d("800"), d("1500"), d("300"), d("200"), d("1200")]
    );
    let savings = v.shares.iter().find(|s| s.label == "Savings").unwrap();
    assert_eq!(savings.pct_of_income, d("20"));
    assert_eq!(v.shares.len(), 7);
}

#[test]
fn over_allocation_is_saved_but_not_charted_as_unallocated() {
    let e = Evaluation {
        month: "2025-06".into(),
        income: d("1000"),
        fixed_costs: d("900"),
        extra: d("250"),
        ..Default::default()
    };
    let v = evaluations::view(&e);
    assert_eq!(v.unallocated, d("-150"));
    assert_eq!(v.chart.labels, ["Fixed costs", "Extra"]);

    let conn = setup();
    evaluations::save(&conn, &e).unwrap();
    assert_eq!(evaluations::get(&conn, "2025-06").unwrap(), Some(e));
}

#[test]
fn negative_values_and_bad_months_are_rejected() {
    let conn = setup();
    assert!(run_eval(&conn, &["set", "--month", "2025-05", "--savings=-5"]).is_err());
    assert!(run_eval(&conn, &["set", "--month", "May", "--income", "10"]).is_err());
    assert!(evaluations::get(&conn, "2025-05").unwrap().is_none());
}

#[test]
fn copy_and_remove() {
    let conn = setup();
    run_eval(&conn, &["set", "--month", "2025-05", "--income", "3000", "--savings", "600"])
        .unwrap();
    run_eval(&conn, &["copy", "--from", "2025-05", "--to", "2025-06"]).unwrap();

    let copied = evaluations::get(&conn, "2025-06").unwrap().unwrap();
    assert_eq!(copied.month, "2025-06");
    assert_eq!(copied.income, d("3000"));
    assert_eq!(copied.savings, d("600"));

    assert!(run_eval(&conn, &["copy", "--from", "2024-01", "--to", "2025-07"]).is_err());

    run_eval(&conn, &["rm", "--month", "2025-05"]).unwrap();
    assert!(evaluations::get(&conn, "2025-05").unwrap().is_none());
    assert!(run_eval(&conn, &["rm", "--month", "2025-05"]).is_err());
}

#[test]
fn every_flag_lands_in_its_own_bucket() {
    let conn = setup();
    run_eval(
        &conn,
        &[
            "set", "--month", "2025-09", "--income", "9000", "--savings", "1",
            "--fixed-costs", "2", "--variable-costs", "3", "--buffer", "4", "--travel", "5",
            "--investment", "6", "--extra", "7",
        ],
    )
    .unwrap();
    let e = evaluations::get(&conn, "2025-09").unwrap().unwrap();
    let buckets: Vec<Decimal> = e.buckets().iter().map(|(_, v)| *v).collect();
    assert_eq!(buckets, (1..=7).map(Decimal::from).collect::<Vec<_>>());
    assert_eq!(e.income, d("9000"));

    let mut blank = Evaluation::default();
    for &field in EVAL_FIELDS {
        assert!(evaluations::slot(&mut blank, field).is_some(), "{} unmapped", field);
    }
    assert!(evaluations::slot(&mut blank, "rent").is_none());
}
