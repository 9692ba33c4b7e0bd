// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{LedgerError, Result};

#[derive(Debug, Error)]
#[error("Unknown {kind} '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// Text-backed enum stored verbatim in a CHECK-constrained column.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let s = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| ParseEnumError {
                        kind: stringify!($name),
                        value: s.to_string(),
                    })
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

string_enum! {
    AccountType {
        Bank => "Bank",
        Cash => "Cash",
        CreditCard => "CreditCard",
    }
}

string_enum! {
    /// Informational only; no ledger operation is blocked by it.
    #[derive(Default)]
    AccountState {
        #[default]
        Active => "Active",
        Inactive => "Inactive",
        Closed => "Closed",
    }
}

string_enum! {
    IncomeSource {
        Salary => "Salary",
        Interest => "Interest",
        Profit => "Profit",
        Other => "Other",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub id: i64,
    pub code: String,
    pub description: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCurrency {
    pub code: String,
    pub description: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub r#type: AccountType,
    pub state: AccountState,
    pub currency_id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub r#type: AccountType,
    pub state: AccountState,
    pub currency_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub id: i64,
    pub account_id: i64,
    pub source: IncomeSource,
    pub amount: Decimal,
    pub date: NaiveDate,
}

impl Income {
    pub fn effect(&self) -> Decimal {
        self.amount
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeInput {
    pub account_id: i64,
    pub source: IncomeSource,
    pub amount: Decimal,
    pub date: NaiveDate,
}

impl IncomeInput {
    pub fn effect(&self) -> Decimal {
        self.amount
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("Income amount", self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub account_id: i64,
    pub category_id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
}

impl Expense {
    pub fn effect(&self) -> Decimal {
        -self.amount
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseInput {
    pub account_id: i64,
    pub category_id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
}

impl ExpenseInput {
    pub fn effect(&self) -> Decimal {
        -self.amount
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("Expense amount", self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: i64,
    pub from_account_id: i64,
    pub to_account_id: i64,
    /// In the source account's currency.
    pub amount: Decimal,
    pub conversion_rate: Decimal,
    pub date: NaiveDate,
}

impl Transfer {
    /// Amount landing on the destination account, in its currency.
    pub fn credited(&self) -> Result<Decimal> {
        self.amount
            .checked_mul(self.conversion_rate)
            .ok_or_else(LedgerError::out_of_range)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferInput {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
    pub conversion_rate: Decimal,
    pub date: NaiveDate,
}

impl TransferInput {
    pub fn credited(&self) -> Result<Decimal> {
        self.amount
            .checked_mul(self.conversion_rate)
            .ok_or_else(LedgerError::out_of_range)
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("Transfer amount", self.amount)?;
        require_positive("Conversion rate", self.conversion_rate)?;
        if self.from_account_id == self.to_account_id {
            return Err(LedgerError::invalid(
                "Transfer source and destination accounts must differ",
            ));
        }
        Ok(())
    }
}

fn require_positive(what: &str, value: Decimal) -> Result<()> {
    if value <= Decimal::ZERO {
        return Err(LedgerError::invalid(format!(
            "{} must be greater than zero (got {})",
            what, value
        )));
    }
    Ok(())
}

/// Optional reporting window; both bounds inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateWindow { start, end }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        DateWindow {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Both bounds, or `None` while the window is only partially chosen.
    pub fn closed(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start?, self.end?))
    }

    /// SQL predicate over `column` plus its parameters. `None` when neither
    /// bound is set, which list queries treat as "nothing selected yet".
    pub fn predicate(&self, column: &str) -> Option<(String, Vec<NaiveDate>)> {
        match (self.start, self.end) {
            (Some(s), Some(e)) => Some((format!("{column} >= ? AND {column} <= ?"), vec![s, e])),
            (Some(s), None) => Some((format!("{column} >= ?"), vec![s])),
            (None, Some(e)) => Some((format!("{column} <= ?"), vec![e])),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyInfo {
    pub code: String,
    pub symbol: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountItem {
    #[serde(flatten)]
    pub account: Account,
    pub balance: Decimal,
    pub currency: CurrencyInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeItem {
    #[serde(flatten)]
    pub income: Income,
    pub account_name: String,
    pub currency: CurrencyInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseItem {
    #[serde(flatten)]
    pub expense: Expense,
    pub account_name: String,
    pub category_name: String,
    pub currency: CurrencyInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferSide {
    pub id: i64,
    pub name: String,
    pub r#type: AccountType,
    pub currency: CurrencyInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferItem {
    pub id: i64,
    pub from_account: TransferSide,
    pub to_account: TransferSide,
    pub amount: Decimal,
    pub conversion_rate: Decimal,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Income,
    Expense,
    #[serde(rename = "Transfer In")]
    TransferIn,
    #[serde(rename = "Transfer Out")]
    TransferOut,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
            TransactionKind::TransferIn => "Transfer In",
            TransactionKind::TransferOut => "Transfer Out",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of an account's history, stamped with the balance after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Signed effect on the account.
    pub amount: Decimal,
    pub date: NaiveDate,
    pub balance: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category_name: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencySummary {
    pub currency_code: String,
    pub currency_symbol: String,
    pub total_expense: Decimal,
    pub categories: Vec<CategoryTotal>,
}
