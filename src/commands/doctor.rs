// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::history::replay_balance;
use crate::error::Result;
use crate::utils::{decimal_text, get_decimal, maybe_print_json, pretty_table};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let issues = diagnose(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &issues)? {
        return Ok(());
    }
    if issues.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

/// Read-only consistency check of the store.
pub fn diagnose(conn: &Connection) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();

    // 1) cached balances against a full replay
    let mut stmt = conn.prepare("SELECT id, name FROM accounts ORDER BY id")?;
    let accounts = stmt
        .query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for (id, name) in accounts {
        let cached: Option<Decimal> = conn
            .query_row(
                "SELECT amount FROM balances WHERE account_id=?1",
                params![id],
                |r| get_decimal(r, 0),
            )
            .optional()?;
        let replayed = replay_balance(conn, id, None)?;
        match cached {
            None => issues.push(Issue {
                kind: "missing_balance",
                detail: format!("#{} {}", id, name),
            }),
            Some(cached) if cached != replayed => issues.push(Issue {
                kind: "balance_drift",
                detail: format!(
                    "#{} {}: cached {} vs replayed {}",
                    id,
                    name,
                    decimal_text(cached),
                    decimal_text(replayed)
                ),
            }),
            Some(_) => {}
        }
    }

    // 2) transfers that never leave their account
    let mut stmt =
        conn.prepare("SELECT id FROM transfers WHERE from_account_id=to_account_id ORDER BY id")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        issues.push(Issue {
            kind: "self_transfer",
            detail: format!("transfer #{}", id),
        });
    }

    // 3) amounts and rates that must be positive
    let checks = [
        ("income", "SELECT id, amount FROM incomes ORDER BY id"),
        ("expense", "SELECT id, amount FROM expenses ORDER BY id"),
        ("transfer", "SELECT id, amount FROM transfers ORDER BY id"),
        ("transfer rate", "SELECT id, conversion_rate FROM transfers ORDER BY id"),
    ];
    for (what, sql) in checks {
        let mut stmt = conn.prepare(sql)?;
        let mut cur = stmt.query([])?;
        while let Some(r) = cur.next()? {
            let id: i64 = r.get(0)?;
            let value = get_decimal(r, 1)?;
            if value <= Decimal::ZERO {
                issues.push(Issue {
                    kind: "non_positive",
                    detail: format!("{} #{}: {}", what, id, decimal_text(value)),
                });
            }
        }
    }

    if !issues.is_empty() {
        tracing::warn!(count = issues.len(), "doctor found issues");
    }
    Ok(issues)
}
