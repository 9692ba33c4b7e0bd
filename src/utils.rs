// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Once;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use crate::models::DateWindow;

static TRACING_INIT: Once = Once::new();

/// Installs the global fmt subscriber; later calls are no-ops.
pub fn init_tracing(filter: &str) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("coinpurse=warn"));
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    });
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// `--from` / `--to` of a list or report command.
pub fn window_args(sub: &clap::ArgMatches) -> Result<DateWindow> {
    let start = sub.get_one::<String>("from").map(|s| parse_date(s)).transpose()?;
    let end = sub.get_one::<String>("to").map(|s| parse_date(s)).transpose()?;
    Ok(DateWindow::new(start, end))
}

/// `--date`, defaulting to today.
pub fn date_arg(sub: &clap::ArgMatches) -> Result<NaiveDate> {
    match sub.get_one::<String>("date") {
        Some(s) => parse_date(s),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Reads a decimal stored as text.
pub fn get_decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    raw.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Canonical text form used for every stored amount.
pub fn decimal_text(d: Decimal) -> String {
    d.normalize().to_string()
}

pub fn fmt_money(d: &Decimal, symbol: &str) -> String {
    format!("{}{:.2}", symbol, d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

/// Accepts a numeric id or an account name.
pub fn id_for_account(conn: &Connection, key: &str) -> Result<i64> {
    lookup_id(conn, "SELECT id FROM accounts WHERE name=?1 ORDER BY id LIMIT 1", key)
        .with_context(|| format!("Account '{}' not found", key.trim()))
}

/// Accepts a numeric id or an ISO code such as `EUR`.
pub fn id_for_currency(conn: &Connection, key: &str) -> Result<i64> {
    let code = key.trim().to_uppercase();
    lookup_id(conn, "SELECT id FROM currencies WHERE code=?1 ORDER BY id LIMIT 1", &code)
        .with_context(|| format!("Currency '{}' not found", key.trim()))
}

/// Accepts a numeric id or a category name.
pub fn id_for_category(conn: &Connection, key: &str) -> Result<i64> {
    lookup_id(
        conn,
        "SELECT id FROM expense_categories WHERE name=?1 ORDER BY id LIMIT 1",
        key,
    )
    .with_context(|| format!("Category '{}' not found", key.trim()))
}

fn lookup_id(conn: &Connection, sql: &str, key: &str) -> Result<i64> {
    let key = key.trim();
    if let Ok(id) = key.parse::<i64>() {
        return Ok(id);
    }
    conn.query_row(sql, params![key], |r| r.get(0))
        .optional()?
        .ok_or_else(|| anyhow::anyhow!("no match for '{}'", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_text_is_normalized() {
        assert_eq!(decimal_text(Decimal::new(9000, 2)), "90");
        assert_eq!(decimal_text(Decimal::new(-1250, 3)), "-1.25");
    }

    #[test]
    fn money_formats_two_places() {
        assert_eq!(fmt_money(&Decimal::new(3805, 1), "$"), "$380.50");
    }

    #[test]
    fn parse_helpers_trim_input() {
        assert_eq!(parse_date(" 2025-01-02 ").unwrap().to_string(), "2025-01-02");
        assert_eq!(parse_decimal(" 12.5 ").unwrap(), Decimal::new(125, 1));
        assert!(parse_date("02/01/2025").is_err());
    }
}
