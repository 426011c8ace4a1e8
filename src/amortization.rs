// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Payment suggestions for debts, loans and savings goals.
//!
//! A suggestion is the fixed monthly amount that retires a balance by its due
//! date: the standard annuity formula `B * r(1+r)^N / ((1+r)^N - 1)` with
//! `r = R/100/12`, or straight-line `B/N` when the rate is zero. Everything in
//! here is pure; callers pass `today` in.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestion {
    /// Nothing left to pay, or the row is settled.
    None,
    /// Due date missing or unparseable.
    InvalidDate,
    /// Due date already passed; the whole balance is owed.
    Overdue { amount: Decimal },
    /// Due within the current month; pay it off now.
    DueNow { amount: Decimal },
    Monthly {
        amount: Decimal,
        months: i64,
        /// Set when the annuity formula was numerically unusable and
        /// straight-line was used instead.
        approximate: bool,
    },
}

impl Suggestion {
    pub fn amount(&self) -> Option<Decimal> {
        match self {
            Suggestion::Overdue { amount }
            | Suggestion::DueNow { amount }
            | Suggestion::Monthly { amount, .. } => Some(*amount),
            Suggestion::None | Suggestion::InvalidDate => None,
        }
    }

    pub fn is_due_now(&self) -> bool {
        matches!(self, Suggestion::DueNow { .. } | Suggestion::Overdue { .. })
    }

    /// Short text for table cells.
    pub fn label(&self) -> String {
        match self {
            Suggestion::None => "-".to_string(),
            Suggestion::InvalidDate => "invalid due date".to_string(),
            Suggestion::Overdue { amount } => format!("{:.2} overdue", amount),
            Suggestion::DueNow { amount } => format!("{:.2} due now", amount),
            Suggestion::Monthly {
                amount,
                months,
                approximate,
            } => {
                let approx = if *approximate { "~" } else { "" };
                format!("{}{:.2}/mo x {}", approx, amount, months)
            }
        }
    }
}

/// Whole calendar months from `today` to `due`. Any due date in the current
/// month yields 0; earlier months are negative.
pub fn months_between(today: NaiveDate, due: NaiveDate) -> i64 {
    let years = i64::from(due.year() - today.year());
    let months = i64::from(due.month()) - i64::from(today.month());
    years * 12 + months
}

/// Monthly payment for `balance` at `annual_rate_pct` over `months` periods.
///
/// A balance too small to spread yields [`Suggestion::DueNow`] rather than a
/// monthly amount that rounds to zero.
pub fn suggest_payment(balance: Decimal, annual_rate_pct: Decimal, months: i64) -> Suggestion {
    if balance <= Decimal::ZERO {
        return Suggestion::None;
    }
    if months <= 0 {
        return Suggestion::DueNow { amount: balance };
    }

    let (amount, approximate) = monthly_amount(balance, annual_rate_pct, months);
    if amount <= Decimal::ZERO {
        return Suggestion::DueNow { amount: balance };
    }
    Suggestion::Monthly {
        amount,
        months,
        approximate,
    }
}

fn monthly_amount(balance: Decimal, annual_rate_pct: Decimal, months: i64) -> (Decimal, bool) {
    let straight = (balance / Decimal::from(months)).round_dp(2);

    let rate = annual_rate_pct.max(Decimal::ZERO);
    if rate.is_zero() {
        return (straight, false);
    }

    let (Some(b), Some(r_pct)) = (balance.to_f64(), rate.to_f64()) else {
        return (straight, true);
    };
    let r = r_pct / 100.0 / 12.0;
    let n = i32::try_from(months).unwrap_or(i32::MAX);
    let growth = (1.0 + r).powi(n);
    let denom = growth - 1.0;
    if !growth.is_finite() || denom == 0.0 || !denom.is_finite() {
        return (straight, true);
    }

    match Decimal::try_from(b * r * growth / denom) {
        Ok(p) => (p.round_dp(2), false),
        Err(_) => (straight, true),
    }
}

/// Full suggestion for a debt or loan row as it sits in the store.
///
/// `due` is the raw stored date so that rows with a missing or malformed
/// date surface as [`Suggestion::InvalidDate`] rather than an error.
pub fn suggest_for_due_date(
    balance: Decimal,
    annual_rate_pct: Decimal,
    due: Option<&str>,
    settled: bool,
    today: NaiveDate,
) -> Suggestion {
    if settled || balance <= Decimal::ZERO {
        return Suggestion::None;
    }
    let Some(due) = due
        .map(str::trim)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    else {
        return Suggestion::InvalidDate;
    };
    if due < today {
        return Suggestion::Overdue { amount: balance };
    }
    suggest_payment(balance, annual_rate_pct, months_between(today, due))
}

/// Share of `part` in `whole` as a percentage in `[0, 100]`, 2 dp.
pub fn progress_pct(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let pct = (part / whole * Decimal::ONE_HUNDRED).round_dp(2);
    pct.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}
