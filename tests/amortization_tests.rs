// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use fintrack::amortization::{
    Suggestion, months_between, progress_pct, suggest_for_due_date, suggest_payment,
};
use rust_decimal::Decimal;

fn d(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

fn day(y: i32, m: u32, dd: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, dd).unwrap()
}

#[test]
fn zero_rate_is_straight_line() {
    let s = suggest_payment(d("1200"), Decimal::ZERO, 12);
    assert_eq!(
        s,
        Suggestion::Monthly {
            amount: d("100.00"),
            months: 12,
            approximate: false
        }
    );
}

#[test]
fn twelve_percent_over_a_year_matches_annuity_table() {
    let s = suggest_payment(d("1000"), d("12"), 12);
    assert_eq!(s.amount(), Some(d("88.85")));
    assert!(matches!(s, Suggestion::Monthly { approximate: false, .. }));
}

#[test]
fn due_this_month_pays_everything_now() {
    let s = suggest_payment(d("500"), d("5"), 0);
    assert_eq!(s, Suggestion::DueNow { amount: d("500") });
    assert!(s.is_due_now());
}

#[test]
fn zero_balance_has_no_suggestion() {
    assert_eq!(suggest_payment(Decimal::ZERO, d("12"), 12), Suggestion::None);
    assert_eq!(
        suggest_for_due_date(
            Decimal::ZERO,
            d("12"),
            Some("2030-01-01"),
            false,
            day(2025, 1, 1)
        ),
        Suggestion::None
    );
    assert_eq!(suggest_payment(d("-10"), d("3"), 6), Suggestion::None);
}

#[test]
fn settled_rows_have_no_suggestion() {
    let s = suggest_for_due_date(d("900"), d("7"), Some("2030-01-01"), true, day(2025, 1, 1));
    assert_eq!(s, Suggestion::None);
}

#[test]
fn missing_or_bad_due_date_is_flagged() {
    let today = day(2025, 6, 1);
    assert_eq!(
        suggest_for_due_date(d("100"), d("5"), Some("not-a-date"), false, today),
        Suggestion::InvalidDate
    );
    assert_eq!(
        suggest_for_due_date(d("100"), d("5"), None, false, today),
        Suggestion::InvalidDate
    );
    assert_eq!(
        suggest_for_due_date(d("100"), d("5"), Some("2025-02-30"), false, today),
        Suggestion::InvalidDate
    );
    assert_eq!(Suggestion::InvalidDate.amount(), None);
}

#[test]
fn past_due_date_is_overdue_for_full_balance() {
    let s = suggest_for_due_date(d("750"), d("9"), Some("2025-01-10"), false, day(2025, 3, 1));
    assert_eq!(s, Suggestion::Overdue { amount: d("750") });
    assert!(s.is_due_now());
}

#[test]
fn later_this_month_is_due_now() {
    let s = suggest_for_due_date(d("320"), d("4"), Some("2025-03-28"), false, day(2025, 3, 1));
    assert_eq!(s, Suggestion::DueNow { amount: d("320") });
}

#[test]
fn months_count_calendar_months() {
    assert_eq!(months_between(day(2025, 3, 31), day(2025, 4, 1)), 1);
    assert_eq!(months_between(day(2025, 1, 15), day(2026, 1, 15)), 12);
    assert_eq!(months_between(day(2025, 11, 2), day(2025, 11, 30)), 0);
    assert_eq!(months_between(day(2025, 5, 1), day(2025, 2, 1)), -3);
}

#[test]
fn due_date_drives_the_term() {
    let s = suggest_for_due_date(d("1200"), Decimal::ZERO, Some("2026-01-15"), false, day(2025, 1, 15));
    assert_eq!(s.amount(), Some(d("100")));
}

#[test]
fn payment_never_decreases_as_rate_rises() {
    let balance = d("5000");
    let mut prev = Decimal::ZERO;
    for half_points in 0..=60 {
        let rate = Decimal::from(half_points) / Decimal::from(2);
        let amount = suggest_payment(balance, rate, 24).amount().unwrap();
        assert!(
            amount >= prev,
            "rate {} gave {} after {}",
            rate,
            amount,
            prev
        );
        prev = amount;
    }
}

#[test]
fn overflowing_growth_falls_back_to_straight_line() {
    let s = suggest_payment(d("1000"), d("12"), 100_000);
    assert_eq!(
        s,
        Suggestion::Monthly {
            amount: d("0.01"),
            months: 100_000,
            approximate: true
        }
    );
    assert!(s.label().starts_with('~'));
}

#[test]
fn cents_that_cannot_be_spread_are_due_now() {
    assert_eq!(
        suggest_payment(d("0.01"), Decimal::ZERO, 12),
        Suggestion::DueNow { amount: d("0.01") }
    );
    assert_eq!(
        suggest_payment(d("0.01"), d("5"), 24),
        Suggestion::DueNow { amount: d("0.01") }
    );
    assert_eq!(
        suggest_payment(d("0.12"), Decimal::ZERO, 12),
        Suggestion::Monthly {
            amount: d("0.01"),
            months: 12,
            approximate: false
        }
    );
}

#[test]
fn progress_is_clamped() {
    assert_eq!(progress_pct(d("250"), d("1000")), d("25"));
    assert_eq!(progress_pct(d("1500"), d("1000")), d("100"));
    assert_eq!(progress_pct(d("10"), Decimal::ZERO), Decimal::ZERO);
}
