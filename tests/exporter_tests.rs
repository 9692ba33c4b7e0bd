// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use coinpurse::{cli, commands::exporter, db};
use rusqlite::Connection;
use serde_json::json;
use tempfile::tempdir;

fn base_conn() -> Connection {
    let conn = db::open_in_memory().unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO currencies(id, code, description, symbol) VALUES (1, 'USD', 'US Dollar', '$');
        INSERT INTO expense_categories(id, name, parent_id) VALUES (1, 'Food', NULL), (2, 'Lunch', 1);
        INSERT INTO accounts(id, name, type, currency_id) VALUES (1, 'Checking', 'Bank', 1);
        INSERT INTO balances(account_id, amount) VALUES (1, '87.66');
        INSERT INTO incomes(id, account_id, source, amount, date) VALUES (1, 1, 'Salary', '100', '2025-01-01');
        INSERT INTO expenses(id, account_id, category_id, amount, date) VALUES (1, 1, 2, '12.34', '2025-01-02');
        "#,
    )
    .unwrap();
    conn
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from(args);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(conn, export_m)
    } else {
        panic!("no export subcommand");
    }
}

#[test]
fn export_history_writes_pretty_json() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("history.json");
    let out_str = out_path.to_string_lossy().to_string();

    run(
        &conn,
        &[
            "coinpurse", "export", "history", "--account", " Checking ", "--from", "2025-01-01",
            "--to", "2025-01-31", "--format", "json", "--out", &out_str,
        ],
    )
    .unwrap();

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(
        parsed,
        json!([
            {
                "id": "expense-1",
                "date": "2025-01-02",
                "type": "Expense",
                "description": "Food - Lunch",
                "amount": "-12.34",
                "balance": "87.66"
            },
            {
                "id": "income-1",
                "date": "2025-01-01",
                "type": "Income",
                "description": "Salary",
                "amount": "100",
                "balance": "100"
            }
        ])
    );
}

#[test]
fn export_history_writes_csv_rows() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("history.csv");
    let out_str = out_path.to_string_lossy().to_string();

    run(
        &conn,
        &[
            "coinpurse", "export", "history", "--account", "1", "--from", "2025-01-02", "--to",
            "2025-01-02", "--format", "CSV", "--out", &out_str,
        ],
    )
    .unwrap();

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0], "id,date,type,description,amount,balance");
    assert_eq!(lines[1], "expense-1,2025-01-02,Expense,Food - Lunch,-12.34,87.66");
    assert_eq!(lines.len(), 2);
}

#[test]
fn export_history_rejects_unknown_format() {
    let conn = base_conn();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("history.unknown");
    let out_str = out_path.to_string_lossy().to_string();

    let result = run(
        &conn,
        &[
            "coinpurse", "export", "history", "--account", "1", "--from", "2025-01-01", "--to",
            "2025-01-31", "--format", "xml", "--out", &out_str,
        ],
    );
    assert!(result.is_err());
    assert!(!out_path.exists());
}
