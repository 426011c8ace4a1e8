// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::ValidationError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Expense,
    Income,
    Transfer,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Expense => "expense",
            TxKind::Income => "income",
            TxKind::Transfer => "transfer",
        }
    }
}

impl FromStr for TxKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "expense" => Ok(TxKind::Expense),
            "income" => Ok(TxKind::Income),
            "transfer" => Ok(TxKind::Transfer),
            other => Err(ValidationError::InvalidChoice {
                field: "kind",
                value: other.to_string(),
                allowed: "expense, income, transfer",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Income => "income",
            CategoryKind::Expense => "expense",
        }
    }
}

impl FromStr for CategoryKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(CategoryKind::Income),
            "expense" => Ok(CategoryKind::Expense),
            other => Err(ValidationError::InvalidChoice {
                field: "kind",
                value: other.to_string(),
                allowed: "income, expense",
            }),
        }
    }
}

/// Lifecycle of a debt or a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObligationStatus {
    Active,
    Settled,
}

impl ObligationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObligationStatus::Active => "active",
            ObligationStatus::Settled => "settled",
        }
    }
}

impl FromStr for ObligationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(ObligationStatus::Active),
            "settled" => Ok(ObligationStatus::Settled),
            other => Err(ValidationError::InvalidChoice {
                field: "status",
                value: other.to_string(),
                allowed: "active, settled",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    Planned,
    Ongoing,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Planned => "planned",
            TripStatus::Ongoing => "ongoing",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for TripStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "planned" => Ok(TripStatus::Planned),
            "ongoing" => Ok(TripStatus::Ongoing),
            "completed" => Ok(TripStatus::Completed),
            "cancelled" => Ok(TripStatus::Cancelled),
            other => Err(ValidationError::InvalidChoice {
                field: "status",
                value: other.to_string(),
                allowed: "planned, ongoing, completed, cancelled",
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub balance: Decimal,
    pub archived: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub kind: CategoryKind,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub parent_id: Option<i64>,
    pub is_default: bool,
    pub archived: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub kind: TxKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub account_id: i64,
    pub to_account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub month: String, // YYYY-MM
    pub category_id: i64,
    pub amount: Decimal,
    pub rollover: Decimal,
}

/// Money owed by the user (`counterparty` is the creditor) or to the user
/// (`counterparty` is the debtor). Debts and loans share this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obligation {
    pub id: i64,
    pub counterparty: String,
    pub initial_amount: Decimal,
    pub balance: Decimal,
    pub interest_rate: Decimal,
    pub due_date: Option<String>,
    pub status: ObligationStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub account_id: Option<i64>,
    pub target_date: Option<NaiveDate>,
    pub archived: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: i64,
    pub name: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: Decimal,
    pub saved_amount: Decimal,
    pub status: TripStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripExpense {
    pub id: i64,
    pub trip_id: i64,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    pub category_id: Option<i64>,
}

/// Planned allocation of one month's money across fixed buckets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub month: String,
    pub income: Decimal,
    pub savings: Decimal,
    pub fixed_costs: Decimal,
    pub variable_costs: Decimal,
    pub buffer: Decimal,
    pub travel: Decimal,
    pub investment: Decimal,
    pub extra: Decimal,
    pub notes: Option<String>,
}

impl Evaluation {
    /// Allocation buckets in display order; income is the pool, not a bucket.
    pub fn buckets(&self) -> [(&'static str, Decimal); 7] {
        [
            ("Savings", self.savings),
            ("Fixed costs", self.fixed_costs),
            ("Variable costs", self.variable_costs),
            ("Buffer", self.buffer),
            ("Travel", self.travel),
            ("Investment", self.investment),
            ("Extra", self.extra),
        ]
    }

    pub fn allocated(&self) -> Decimal {
        self.buckets().iter().map(|(_, v)| *v).sum()
    }

    pub fn unallocated(&self) -> Decimal {
        self.income - self.allocated()
    }
}
