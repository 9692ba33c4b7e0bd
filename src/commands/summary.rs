// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{BTreeMap, HashMap};

use rusqlite::{Connection, params};
use rust_decimal::Decimal;

use crate::commands::categories::load_tree;
use crate::error::{LedgerError, Result};
use crate::models::{CategoryTotal, CurrencySummary, DateWindow};
use crate::utils::{fmt_money, get_decimal, maybe_print_json, pretty_table, window_args};

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let window = window_args(sub)?;
    if window.closed().is_none() {
        anyhow::bail!("summary needs both --from and --to");
    }
    let data = expense_summary(conn, &window)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let mut rows = Vec::new();
    for summary in data {
        rows.push(vec![
            summary.currency_code.clone(),
            "Total".to_string(),
            fmt_money(&summary.total_expense, &summary.currency_symbol),
        ]);
        for c in summary.categories {
            rows.push(vec![
                String::new(),
                c.category_name,
                fmt_money(&c.total, &summary.currency_symbol),
            ]);
        }
    }
    println!("{}", pretty_table(&["CCY", "Category", "Spent"], rows));
    Ok(())
}

struct Bucket {
    symbol: String,
    total: Decimal,
    categories: HashMap<String, Decimal>,
}

/// Expenses in the window grouped by account currency and top-level
/// category. Currencies come out by code; categories by total, largest first.
pub fn expense_summary(conn: &Connection, window: &DateWindow) -> Result<Vec<CurrencySummary>> {
    let Some((start, end)) = window.closed() else {
        return Ok(Vec::new());
    };
    let tree = load_tree(conn)?;
    let mut stmt = conn.prepare(
        "SELECT e.category_id, e.amount, c.code, c.symbol
         FROM expenses e
         JOIN accounts a ON a.id=e.account_id
         JOIN currencies c ON c.id=a.currency_id
         WHERE e.date >= ?1 AND e.date <= ?2",
    )?;
    let mut rows = stmt.query(params![start, end])?;
    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();
    while let Some(r) = rows.next()? {
        let category_id: i64 = r.get(0)?;
        let amount = get_decimal(r, 1)?;
        let code: String = r.get(2)?;
        let symbol: String = r.get(3)?;
        let bucket = buckets.entry(code).or_insert_with(|| Bucket {
            symbol,
            total: Decimal::ZERO,
            categories: HashMap::new(),
        });
        bucket.total = bucket
            .total
            .checked_add(amount)
            .ok_or_else(LedgerError::out_of_range)?;
        let total = bucket
            .categories
            .entry(tree.root_name(category_id).to_string())
            .or_insert(Decimal::ZERO);
        *total = total.checked_add(amount).ok_or_else(LedgerError::out_of_range)?;
    }

    let summaries = buckets
        .into_iter()
        .map(|(code, bucket)| {
            let mut categories: Vec<CategoryTotal> = bucket
                .categories
                .into_iter()
                .map(|(category_name, total)| CategoryTotal {
                    category_name,
                    total,
                })
                .collect();
            categories.sort_by(|a, b| {
                b.total
                    .cmp(&a.total)
                    .then_with(|| a.category_name.cmp(&b.category_name))
            });
            CurrencySummary {
                currency_code: code,
                currency_symbol: bucket.symbol,
                total_expense: bucket.total,
                categories,
            }
        })
        .collect();
    Ok(summaries)
}
