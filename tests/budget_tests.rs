// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fintrack::commands::budgets;
use fintrack::commands::categories::{self, NewCategory};
use fintrack::models::CategoryKind;
use fintrack::{cli, db, utils};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute("INSERT INTO accounts(id,name,balance) VALUES (1,'Checking','0')", [])
        .unwrap();
    categories::add(
        &conn,
        &NewCategory {
            name: "Snacks".into(),
            kind: CategoryKind::Expense,
            icon: None,
            color: None,
            parent: Some("Groceries".into()),
        },
    )
    .unwrap();
    conn
}

fn expense(conn: &Connection, category: &str, amount: &str, date: &str) {
    let cat = utils::id_for_category(conn, category).unwrap();
    conn.execute(
        "INSERT INTO transactions(kind,amount,date,account_id,category_id) VALUES ('expense',?1,?2,1,?3)",
        params![amount, date, cat],
    )
    .unwrap();
}

fn run_budget(conn: &mut Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["fintrack", "budget"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("budget", m)) = matches.subcommand() {
        budgets::handle(conn, m)
    } else {
        panic!("no budget subcommand");
    }
}

fn d(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

#[test]
fn status_counts_subcategory_spending() {
    let mut conn = setup();
    run_budget(
        &mut conn,
        &["set", "--month", "2025-08", "--category", "Groceries", "--amount", "300"],
    )
    .unwrap();
    expense(&conn, "Groceries", "100", "2025-08-03");
    expense(&conn, "Snacks", "50", "2025-08-10");
    expense(&conn, "Groceries", "40", "2025-07-30");
    conn.execute(
        "INSERT INTO transactions(kind,amount,date,account_id,category_id)
         VALUES ('income','999','2025-08-01',1,(SELECT id FROM categories WHERE name='Salary'))",
        [],
    )
    .unwrap();

    let status = budgets::compute_status(&conn, "2025-08").unwrap();
    assert_eq!(status.len(), 1);
    let s = &status[0];
    assert_eq!(s.category, "Groceries");
    assert_eq!(s.spent, d("150"));
    assert_eq!(s.remaining, d("150"));
    assert_eq!(s.percent_used, d("50"));
}

#[test]
fn set_twice_updates_in_place_and_keeps_rollover() {
    let mut conn = setup();
    run_budget(
        &mut conn,
        &[
            "set", "--month", "2025-08", "--category", "Transport", "--amount", "80",
            "--rollover", "20",
        ],
    )
    .unwrap();
    run_budget(
        &mut conn,
        &["set", "--month", "2025-08", "--category", "Transport", "--amount", "120"],
    )
    .unwrap();

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM budgets", [], |r| r.get(0))
        .unwrap();
    assert_eq!(rows, 1);
    let status = budgets::compute_status(&conn, "2025-08").unwrap();
    assert_eq!(status[0].amount, d("120"));
    assert_eq!(status[0].rollover, d("20"));
    assert_eq!(status[0].available, d("140"));
}

#[test]
fn rejects_non_positive_amounts() {
    let mut conn = setup();
    let res = run_budget(
        &mut conn,
        &["set", "--month", "2025-08", "--category", "Transport", "--amount", "0"],
    );
    assert!(res.is_err());
    let res = run_budget(
        &mut conn,
        &["set", "--month", "2025-8x", "--category", "Transport", "--amount", "10"],
    );
    assert!(res.is_err());
}

#[test]
fn rollover_carries_only_unspent_budget() {
    let mut conn = setup();
    let groceries = utils::id_for_category(&conn, "Groceries").unwrap();
    let transport = utils::id_for_category(&conn, "Transport").unwrap();
    budgets::upsert(&conn, "2025-12", groceries, d("300"), None).unwrap();
    budgets::upsert(&conn, "2025-12", transport, d("50"), None).unwrap();
    budgets::upsert(&conn, "2026-01", groceries, d("250"), None).unwrap();
    expense(&conn, "Groceries", "120", "2025-12-05");
    expense(&conn, "Transport", "80", "2025-12-06");

    let moved = budgets::rollover(&mut conn, "2025-12").unwrap();
    assert_eq!(
        moved,
        vec![("Groceries".to_string(), d("180")), ("Transport".to_string(), Decimal::ZERO)]
    );

    let next = budgets::compute_status(&conn, "2026-01").unwrap();
    assert_eq!(next.len(), 2);
    let g = next.iter().find(|s| s.category == "Groceries").unwrap();
    assert_eq!(g.amount, d("250"));
    assert_eq!(g.rollover, d("180"));
    assert_eq!(g.available, d("430"));
    let t = next.iter().find(|s| s.category == "Transport").unwrap();
    assert_eq!(t.amount, Decimal::ZERO);
    assert_eq!(t.percent_used, Decimal::ZERO);
}
