// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use fintrack::commands::categories::{self, NewCategory};
use fintrack::commands::{accounts, settings};
use fintrack::models::CategoryKind;
use fintrack::{cli, db, utils};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["fintrack"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("account", m)) => accounts::handle(conn, m),
        Some(("category", m)) => categories::handle(conn, m),
        Some(("config", m)) => settings::handle(conn, m),
        _ => panic!("unexpected subcommand"),
    }
}

fn category(name: &str, kind: CategoryKind, parent: Option<&str>) -> NewCategory {
    NewCategory {
        name: name.into(),
        kind,
        icon: None,
        color: None,
        parent: parent.map(String::from),
    }
}

#[test]
fn schema_init_seeds_defaults_once() {
    let mut conn = setup();
    db::init_schema(&mut conn).unwrap();
    let (total, defaults): (i64, i64) = conn
        .query_row(
            "SELECT COUNT(*), SUM(is_default) FROM categories",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(total, db::DEFAULT_CATEGORIES.len() as i64);
    assert_eq!(defaults, total);
}

#[test]
fn archived_accounts_drop_out_of_lists() {
    let conn = setup();
    run(&conn, &["account", "add", "--name", "Checking", "--balance", "250.75"]).unwrap();
    run(&conn, &["account", "add", "--name", "  Wallet  "]).unwrap();
    run(&conn, &["account", "archive", "--name", "Wallet"]).unwrap();

    let active = accounts::list(&conn, false).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "Checking");
    assert_eq!(active[0].balance, Decimal::from_str_exact("250.75").unwrap());

    let all = accounts::list(&conn, true).unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|a| a.name == "Wallet" && a.archived));

    run(&conn, &["account", "unarchive", "--name", "Wallet"]).unwrap();
    assert_eq!(accounts::list(&conn, false).unwrap().len(), 2);
}

#[test]
fn accounts_with_transactions_cannot_be_removed() {
    let conn = setup();
    let id = accounts::add(&conn, "Checking", Decimal::ZERO).unwrap();
    conn.execute(
        "INSERT INTO transactions(kind,amount,date,account_id) VALUES ('income','5','2025-01-01',?1)",
        [id],
    )
    .unwrap();
    let err = run(&conn, &["account", "rm", "--name", "Checking"]).unwrap_err();
    assert!(err.to_string().contains("archive it instead"));

    accounts::add(&conn, "Spare", Decimal::ZERO).unwrap();
    run(&conn, &["account", "rm", "--name", "Spare"]).unwrap();
    assert!(utils::id_for_account(&conn, "Spare").is_err());
}

#[test]
fn duplicate_account_names_are_rejected() {
    let conn = setup();
    accounts::add(&conn, "Checking", Decimal::ZERO).unwrap();
    assert!(accounts::add(&conn, "Checking", Decimal::ONE).is_err());
}

#[test]
fn subcategories_nest_one_level_under_same_kind() {
    let conn = setup();
    categories::add(&conn, &category("Dining", CategoryKind::Expense, Some("Entertainment")))
        .unwrap();

    let too_deep = categories::add(&conn, &category("Brunch", CategoryKind::Expense, Some("Dining")));
    assert!(too_deep.unwrap_err().to_string().contains("one level"));

    let wrong_kind = categories::add(&conn, &category("Bonus", CategoryKind::Income, Some("Housing")));
    assert!(wrong_kind.is_err());

    let tree = categories::list_tree(&conn, Some(CategoryKind::Expense), false).unwrap();
    let pos = |n: &str| tree.iter().position(|c| c.name == n).unwrap();
    assert_eq!(pos("Dining"), pos("Entertainment") + 1);
    assert!(tree.iter().all(|c| c.kind == CategoryKind::Expense));
}

#[test]
fn colors_are_validated_and_normalized() {
    let conn = setup();
    run(
        &conn,
        &["category", "add", "--name", "Pets", "--kind", "expense", "--color", "#a1b2c3"],
    )
    .unwrap();
    let pets = categories::get(&conn, utils::id_for_category(&conn, "Pets").unwrap()).unwrap();
    assert_eq!(pets.color.as_deref(), Some("#A1B2C3"));

    for bad in ["red", "#12345", "a1b2c3", "#GGGGGG"] {
        assert!(utils::validate_color(bad).is_err(), "{} accepted", bad);
    }
    let res = run(
        &conn,
        &["category", "add", "--name", "Gifts", "--kind", "expense", "--color", "blue"],
    );
    assert!(res.is_err());
    assert!(utils::id_for_category(&conn, "Gifts").is_err());
}

#[test]
fn defaults_and_parents_are_protected_from_removal() {
    let conn = setup();
    assert!(run(&conn, &["category", "rm", "--name", "Groceries"]).is_err());

    categories::add(&conn, &category("Hobbies", CategoryKind::Expense, None)).unwrap();
    categories::add(&conn, &category("Climbing", CategoryKind::Expense, Some("Hobbies"))).unwrap();
    assert!(run(&conn, &["category", "rm", "--name", "Hobbies"]).is_err());

    run(&conn, &["category", "rm", "--name", "Climbing"]).unwrap();
    run(&conn, &["category", "rm", "--name", "Hobbies"]).unwrap();
    assert!(utils::id_for_category(&conn, "Hobbies").is_err());
}

#[test]
fn archived_categories_are_hidden_unless_asked() {
    let conn = setup();
    run(&conn, &["category", "archive", "--name", "Entertainment"]).unwrap();
    let visible = categories::list_tree(&conn, None, false).unwrap();
    assert!(!visible.iter().any(|c| c.name == "Entertainment"));
    let all = categories::list_tree(&conn, None, true).unwrap();
    assert!(all.iter().any(|c| c.name == "Entertainment" && c.archived));
}

#[test]
fn currency_setting_round_trips() {
    let conn = setup();
    assert_eq!(utils::get_currency(&conn).unwrap(), "USD");
    run(&conn, &["config", "set", "--key", "currency", "--value", "eur"]).unwrap();
    assert_eq!(utils::get_currency(&conn).unwrap(), "EUR");
    assert!(run(&conn, &["config", "set", "--key", "theme", "--value", "dark"]).is_err());
}
