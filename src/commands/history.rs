// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-account history with running balances, rebuilt from the record tables.
//!
//! The opening balance is a full replay of everything dated before the
//! window and never consults the cached balance, so the report stays
//! independent of the ledger it is used to audit.

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};
use rust_decimal::Decimal;

use crate::commands::categories::load_tree;
use crate::error::{LedgerError, Result};
use crate::models::{DateWindow, TransactionItem, TransactionKind};
use crate::utils::{fmt_money, get_decimal, id_for_account, maybe_print_json, pretty_table, window_args};

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let account_id = id_for_account(conn, sub.get_one::<String>("account").unwrap())?;
    let window = window_args(sub)?;
    if window.closed().is_none() {
        anyhow::bail!("history needs both --from and --to");
    }
    let data = transaction_history(conn, Some(account_id), &window)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|t| {
                vec![
                    t.date.to_string(),
                    t.kind.to_string(),
                    t.description,
                    fmt_money(&t.amount, ""),
                    fmt_money(&t.balance, ""),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Type", "Description", "Amount", "Balance"], rows)
        );
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Range {
    All,
    Before(NaiveDate),
    Within(NaiveDate, NaiveDate),
}

impl Range {
    fn clause(&self, column: &str) -> (String, Vec<Value>) {
        match *self {
            Range::All => ("1=1".to_string(), Vec::new()),
            Range::Before(d) => (format!("{column} < ?"), vec![date_value(d)]),
            Range::Within(s, e) => (
                format!("{column} >= ? AND {column} <= ?"),
                vec![date_value(s), date_value(e)],
            ),
        }
    }
}

fn date_value(d: NaiveDate) -> Value {
    Value::Text(d.format("%Y-%m-%d").to_string())
}

/// Signed events touching `account_id` inside `range`: incomes, then
/// expenses, then transfers, each group by date and id. A transfer with the
/// account on both sides yields an outgoing and an incoming leg.
fn load_events(conn: &Connection, account_id: i64, range: Range) -> Result<Vec<TransactionItem>> {
    let mut events = Vec::new();

    let (clause, dates) = range.clause("date");
    let mut args = vec![Value::Integer(account_id)];
    args.extend(dates);
    let mut stmt = conn.prepare(&format!(
        "SELECT id, source, amount, date FROM incomes
         WHERE account_id=? AND {clause} ORDER BY date, id"
    ))?;
    let mut rows = stmt.query(params_from_iter(args.iter()))?;
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let source: String = r.get(1)?;
        events.push(TransactionItem {
            id: format!("income-{id}"),
            kind: TransactionKind::Income,
            amount: get_decimal(r, 2)?,
            date: r.get(3)?,
            balance: Decimal::ZERO,
            description: source,
        });
    }

    let tree = load_tree(conn)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT id, category_id, amount, date FROM expenses
         WHERE account_id=? AND {clause} ORDER BY date, id"
    ))?;
    let mut rows = stmt.query(params_from_iter(args.iter()))?;
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let category_id: i64 = r.get(1)?;
        events.push(TransactionItem {
            id: format!("expense-{id}"),
            kind: TransactionKind::Expense,
            amount: -get_decimal(r, 2)?,
            date: r.get(3)?,
            balance: Decimal::ZERO,
            description: tree.full_name(category_id).to_string(),
        });
    }

    let (clause, dates) = range.clause("t.date");
    let mut args = vec![Value::Integer(account_id), Value::Integer(account_id)];
    args.extend(dates);
    let mut stmt = conn.prepare(&format!(
        "SELECT t.id, t.from_account_id, t.to_account_id, t.amount, t.conversion_rate, t.date,
                fa.name, ta.name
         FROM transfers t
         LEFT JOIN accounts fa ON fa.id=t.from_account_id
         LEFT JOIN accounts ta ON ta.id=t.to_account_id
         WHERE (t.from_account_id=? OR t.to_account_id=?) AND {clause}
         ORDER BY t.date, t.id"
    ))?;
    let mut rows = stmt.query(params_from_iter(args.iter()))?;
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let from: i64 = r.get(1)?;
        let to: i64 = r.get(2)?;
        let amount = get_decimal(r, 3)?;
        let rate = get_decimal(r, 4)?;
        let date: NaiveDate = r.get(5)?;
        let from_name: Option<String> = r.get(6)?;
        let to_name: Option<String> = r.get(7)?;
        if from == account_id {
            events.push(TransactionItem {
                id: format!("transfer-{id}-out"),
                kind: TransactionKind::TransferOut,
                amount: -amount,
                date,
                balance: Decimal::ZERO,
                description: format!("To {}", to_name.unwrap_or_else(|| format!("Account {to}"))),
            });
        }
        if to == account_id {
            events.push(TransactionItem {
                id: format!("transfer-{id}-in"),
                kind: TransactionKind::TransferIn,
                amount: amount.checked_mul(rate).ok_or_else(LedgerError::out_of_range)?,
                date,
                balance: Decimal::ZERO,
                description: format!(
                    "From {}",
                    from_name.unwrap_or_else(|| format!("Account {from}"))
                ),
            });
        }
    }

    Ok(events)
}

/// Net effect of every record on the account dated strictly before
/// `before`, or of all records when `before` is `None`, starting from zero.
pub fn replay_balance(
    conn: &Connection,
    account_id: i64,
    before: Option<NaiveDate>,
) -> Result<Decimal> {
    let range = match before {
        Some(d) => Range::Before(d),
        None => Range::All,
    };
    load_events(conn, account_id, range)?
        .iter()
        .try_fold(Decimal::ZERO, |total, e| total.checked_add(e.amount))
        .ok_or_else(LedgerError::out_of_range)
}

/// History of one account inside a closed window, newest first, each entry
/// stamped with the balance right after it. Returns an empty list while the
/// account or either bound is unset.
pub fn transaction_history(
    conn: &Connection,
    account_id: Option<i64>,
    window: &DateWindow,
) -> Result<Vec<TransactionItem>> {
    let (Some(account_id), Some((start, end))) = (account_id, window.closed()) else {
        return Ok(Vec::new());
    };
    let opening = replay_balance(conn, account_id, Some(start))?;
    let mut events = load_events(conn, account_id, Range::Within(start, end))?;
    events.sort_by_key(|e| e.date);

    let mut running = opening;
    for event in events.iter_mut() {
        running = running
            .checked_add(event.amount)
            .ok_or_else(LedgerError::out_of_range)?;
        event.balance = running;
    }
    events.reverse();
    tracing::debug!(account_id, %start, %end, %opening, entries = events.len(), "history rebuilt");
    Ok(events)
}
