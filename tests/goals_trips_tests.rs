// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use fintrack::amortization::Suggestion;
use fintrack::commands::trips::{self, NewTrip};
use fintrack::commands::{accounts, goals};
use fintrack::models::TripStatus;
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

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["fintrack"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("goal", m)) => goals::handle(conn, m),
        Some(("trip", m)) => trips::handle(conn, m),
        _ => panic!("unexpected subcommand"),
    }
}

fn trip(name: &str, start: &str, end: &str, budget: &str) -> NewTrip {
    NewTrip {
        name: name.into(),
        destination: "Lisbon".into(),
        start_date: day(start),
        end_date: day(end),
        budget: d(budget),
    }
}

#[test]
fn goal_progress_and_monthly_need() {
    let conn = setup();
    let today = day("2025-03-05");
    let account = accounts::add(&conn, "Savings", Decimal::ZERO).unwrap();
    goals::add(&conn, "Laptop", d("1000"), Some(account), Some(day("2025-12-20")), today).unwrap();
    goals::contribute(&conn, "Laptop", d("250")).unwrap();

    let views = goals::list(&conn, false, today).unwrap();
    assert_eq!(views.len(), 1);
    let v = &views[0];
    assert_eq!(v.account.as_deref(), Some("Savings"));
    assert_eq!(v.progress_pct, d("25"));
    assert_eq!(v.remaining, d("750"));
    assert_eq!(
        v.monthly_needed,
        Suggestion::Monthly {
            amount: d("83.33"),
            months: 9,
            approximate: false
        }
    );
}

#[test]
fn goal_past_its_date_is_overdue_until_met() {
    let conn = setup();
    goals::add(&conn, "Bike", d("400"), None, Some(day("2025-02-01")), day("2025-01-01")).unwrap();
    let g = goals::get(&conn, "Bike").unwrap();

    let late = goals::view(g.clone(), None, day("2025-05-01"));
    assert_eq!(late.monthly_needed, Suggestion::Overdue { amount: d("400") });

    let mut funded = g;
    funded.current_amount = d("450");
    let done = goals::view(funded, None, day("2025-05-01"));
    assert_eq!(done.remaining, Decimal::ZERO);
    assert_eq!(done.progress_pct, d("100"));
    assert_eq!(done.monthly_needed, Suggestion::None);
}

#[test]
fn goal_rules_are_enforced() {
    let conn = setup();
    let today = day("2025-06-01");
    assert!(goals::add(&conn, "Past", d("100"), None, Some(day("2025-05-31")), today).is_err());
    assert!(run(&conn, &["goal", "add", "--name", "Zero", "--target", "0"]).is_err());

    run(&conn, &["goal", "add", "--name", "Rainy day", "--target", "500"]).unwrap();
    run(&conn, &["goal", "contribute", "--name", "Rainy day", "--amount", "120.50"]).unwrap();
    assert_eq!(goals::get(&conn, "Rainy day").unwrap().current_amount, d("120.50"));

    run(&conn, &["goal", "archive", "--name", "Rainy day"]).unwrap();
    assert!(goals::contribute(&conn, "Rainy day", d("1")).is_err());
    assert!(goals::list(&conn, false, today).unwrap().is_empty());
    assert_eq!(goals::list(&conn, true, today).unwrap().len(), 1);

    run(&conn, &["goal", "rm", "--name", "Rainy day"]).unwrap();
    assert!(goals::get(&conn, "Rainy day").is_err());
}

#[test]
fn trip_end_must_not_precede_start() {
    let conn = setup();
    let err = trips::add(&conn, &trip("Backwards", "2025-07-10", "2025-07-01", "900")).unwrap_err();
    assert!(err.to_string().contains("must not be before"));
    trips::add(&conn, &trip("Day trip", "2025-07-10", "2025-07-10", "50")).unwrap();
}

#[test]
fn trip_spending_and_savings_roll_up() {
    let conn = setup();
    run(
        &conn,
        &[
            "trip", "add", "--name", "Portugal", "--destination", "Lisbon", "--start",
            "2025-09-01", "--end", "2025-09-10", "--budget", "1200",
        ],
    )
    .unwrap();
    run(&conn, &["trip", "save", "--name", "Portugal", "--amount", "300"]).unwrap();
    run(
        &conn,
        &[
            "trip", "expense", "add", "--trip", "Portugal", "--amount", "420.80", "--date",
            "2025-09-02", "--description", "Hotel", "--category", "Travel",
        ],
    )
    .unwrap();
    run(
        &conn,
        &[
            "trip", "expense", "add", "--trip", "Portugal", "--amount", "79.20", "--date",
            "2025-09-03", "--description", "Trains",
        ],
    )
    .unwrap();

    let views = trips::list(&conn).unwrap();
    assert_eq!(views.len(), 1);
    let v = &views[0];
    assert_eq!(v.spent, d("500"));
    assert_eq!(v.remaining, d("700"));
    assert_eq!(v.saved_pct, d("25"));
    assert_eq!(v.expense_count, 2);
    assert_eq!(v.trip.status, TripStatus::Planned);

    run(&conn, &["trip", "status", "--name", "Portugal", "--status", "Ongoing"]).unwrap();
    assert_eq!(trips::get(&conn, "Portugal").unwrap().status, TripStatus::Ongoing);
    assert!(run(&conn, &["trip", "status", "--name", "Portugal", "--status", "lost"]).is_err());
}

#[test]
fn removing_a_trip_drops_its_expenses() {
    let conn = setup();
    let id = trips::add(&conn, &trip("Weekend", "2025-10-03", "2025-10-05", "200")).unwrap();
    trips::add_expense(&conn, id, day("2025-10-03"), d("35"), "Dinner", None).unwrap();
    run(&conn, &["trip", "rm", "--name", "Weekend"]).unwrap();
    let left: i64 = conn
        .query_row("SELECT COUNT(*) FROM trip_expenses", [], |r| r.get(0))
        .unwrap();
    assert_eq!(left, 0);
    assert!(trips::expenses(&conn, id).unwrap().is_empty());
}

#[test]
fn trip_expenses_take_expense_categories_only() {
    let conn = setup();
    let id = trips::add(&conn, &trip("Alps", "2025-12-20", "2025-12-27", "900")).unwrap();
    let res = run(
        &conn,
        &[
            "trip", "expense", "add", "--trip", "Alps", "--amount", "60", "--date",
            "2025-12-21", "--description", "Ski pass", "--category", "Salary",
        ],
    );
    assert!(res.unwrap_err().to_string().contains("not expense"));
    assert!(trips::expenses(&conn, id).unwrap().is_empty());

    run(
        &conn,
        &[
            "trip", "expense", "add", "--trip", "Alps", "--amount", "60", "--date",
            "2025-12-21", "--description", "Ski pass", "--category", "Entertainment",
        ],
    )
    .unwrap();
    assert_eq!(trips::expenses(&conn, id).unwrap().len(), 1);
}
