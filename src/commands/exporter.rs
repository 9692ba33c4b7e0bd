// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::Path;

use anyhow::{Result, bail};
use rusqlite::Connection;
use serde_json::json;

use crate::commands::history::transaction_history;
use crate::models::DateWindow;
use crate::utils::{decimal_text, id_for_account, window_args};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("history", sub)) => {
            let account_id = id_for_account(conn, sub.get_one::<String>("account").unwrap())?;
            let window = window_args(sub)?;
            let fmt = sub.get_one::<String>("format").unwrap();
            let out = sub.get_one::<String>("out").unwrap();
            let written = export_history(conn, account_id, &window, fmt, Path::new(out))?;
            println!("Exported {} history rows to {}", written, out);
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Writes the account's windowed history, newest first, as `csv` or `json`.
/// Returns the number of rows written.
pub fn export_history(
    conn: &Connection,
    account_id: i64,
    window: &DateWindow,
    fmt: &str,
    out: &Path,
) -> Result<usize> {
    let fmt = fmt.trim().to_lowercase();
    if fmt != "csv" && fmt != "json" {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }
    if window.closed().is_none() {
        bail!("export needs both --from and --to");
    }
    let items = transaction_history(conn, Some(account_id), window)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["id", "date", "type", "description", "amount", "balance"])?;
            for t in &items {
                wtr.write_record([
                    t.id.clone(),
                    t.date.to_string(),
                    t.kind.to_string(),
                    t.description.clone(),
                    decimal_text(t.amount),
                    decimal_text(t.balance),
                ])?;
            }
            wtr.flush()?;
        }
        _ => {
            let rows: Vec<serde_json::Value> = items
                .iter()
                .map(|t| {
                    json!({
                        "id": t.id,
                        "date": t.date.to_string(),
                        "type": t.kind.as_str(),
                        "description": t.description,
                        "amount": decimal_text(t.amount),
                        "balance": decimal_text(t.balance),
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&rows)?)?;
        }
    }
    tracing::info!(account_id, rows = items.len(), path = %out.display(), "history exported");
    Ok(items.len())
}
