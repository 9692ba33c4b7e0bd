// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use crate::error::{LedgerError, Result};
use crate::models::{CategoryInput, ExpenseCategory};
use crate::utils::{id_for_category, maybe_print_json, pretty_table};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;

const UNKNOWN: &str = "Unknown";

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let input = category_args(conn, sub)?;
            let id = add_category(conn, &input)?;
            println!("Added category '{}' as #{}", input.name, id);
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("update", sub)) => {
            let id = id_for_category(conn, sub.get_one::<String>("id").unwrap())?;
            let input = category_args(conn, sub)?;
            update_category(conn, id, &input)?;
            println!("Updated category #{}", id);
        }
        Some(("rm", sub)) => {
            let id = id_for_category(conn, sub.get_one::<String>("id").unwrap())?;
            delete_category(conn, id)?;
            println!("Removed category #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn category_args(conn: &Connection, sub: &clap::ArgMatches) -> anyhow::Result<CategoryInput> {
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    let parent_id = match sub.get_one::<String>("parent") {
        Some(p) if !p.trim().is_empty() => Some(id_for_category(conn, p)?),
        _ => None,
    };
    Ok(CategoryInput { name, parent_id })
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let tree = load_tree(conn)?;
    let sections = tree.sections();
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &sections)? {
        return Ok(());
    }
    let mut rows = Vec::new();
    for section in sections {
        rows.push(vec![section.id.to_string(), section.name, String::new()]);
        for member in section.members {
            rows.push(vec![member.id.to_string(), String::new(), member.full_name]);
        }
    }
    println!("{}", pretty_table(&["ID", "Section", "Category"], rows));
    Ok(())
}

fn category_from_row(r: &Row<'_>) -> rusqlite::Result<ExpenseCategory> {
    Ok(ExpenseCategory {
        id: r.get(0)?,
        name: r.get(1)?,
        parent_id: r.get(2)?,
    })
}

pub fn add_category(conn: &Connection, input: &CategoryInput) -> Result<i64> {
    if input.name.trim().is_empty() {
        return Err(LedgerError::invalid("Category name must not be empty"));
    }
    conn.execute(
        "INSERT INTO expense_categories(name, parent_id) VALUES (?1, ?2)",
        params![input.name, input.parent_id],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, name = %input.name, "category added");
    Ok(id)
}

/// Renames or re-parents a category; a category may not become its own ancestor.
pub fn update_category(conn: &mut Connection, id: i64, input: &CategoryInput) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(LedgerError::invalid("Category name must not be empty"));
    }
    let tx = conn.transaction()?;
    if let Some(parent) = input.parent_id {
        let tree = load_tree(&tx)?;
        if parent == id || tree.is_descendant(parent, id) {
            return Err(LedgerError::invalid(
                "A category cannot be nested under itself or its sub-categories",
            ));
        }
    }
    let updated = tx.execute(
        "UPDATE expense_categories SET name=?1, parent_id=?2 WHERE id=?3",
        params![input.name, input.parent_id, id],
    )?;
    if updated == 0 {
        return Err(LedgerError::not_found("Category", id));
    }
    tx.commit()?;
    tracing::info!(id, "category updated");
    Ok(())
}

/// Refuses while expenses use the category or it still has sub-categories.
pub fn delete_category(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let expenses: i64 = tx.query_row(
        "SELECT COUNT(*) FROM expenses WHERE category_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if expenses > 0 {
        return Err(LedgerError::conflict(
            "Cannot delete category: it is used by one or more expenses.",
        ));
    }
    let children: i64 = tx.query_row(
        "SELECT COUNT(*) FROM expense_categories WHERE parent_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if children > 0 {
        return Err(LedgerError::conflict(
            "Cannot delete category: it has one or more sub-categories.",
        ));
    }
    let deleted = tx.execute("DELETE FROM expense_categories WHERE id=?1", params![id])?;
    if deleted == 0 {
        return Err(LedgerError::not_found("Category", id));
    }
    tx.commit()?;
    tracing::info!(id, "category deleted");
    Ok(())
}

pub fn get_category(conn: &Connection, id: i64) -> Result<Option<ExpenseCategory>> {
    let category = conn
        .query_row(
            "SELECT id, name, parent_id FROM expense_categories WHERE id=?1",
            params![id],
            category_from_row,
        )
        .optional()?;
    Ok(category)
}

pub fn list_categories(conn: &Connection) -> Result<Vec<ExpenseCategory>> {
    let mut stmt = conn.prepare("SELECT id, name, parent_id FROM expense_categories ORDER BY id")?;
    let rows = stmt.query_map([], category_from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

pub fn load_tree(conn: &Connection) -> Result<CategoryTree> {
    Ok(CategoryTree::new(list_categories(conn)?))
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionMember {
    pub id: i64,
    pub full_name: String,
}

/// A top-level category and everything nested beneath it.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySection {
    pub id: i64,
    pub name: String,
    pub members: Vec<SectionMember>,
}

/// Category hierarchy of any depth, with display names resolved up front.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: HashMap<i64, ExpenseCategory>,
    order: Vec<i64>,
    names: HashMap<i64, String>,
}

impl CategoryTree {
    pub fn new(categories: Vec<ExpenseCategory>) -> Self {
        let order: Vec<i64> = categories.iter().map(|c| c.id).collect();
        let nodes: HashMap<i64, ExpenseCategory> =
            categories.into_iter().map(|c| (c.id, c)).collect();
        let mut names = HashMap::with_capacity(order.len());
        for id in &order {
            build_full_name(&nodes, *id, &mut names, 0);
        }
        CategoryTree {
            nodes,
            order,
            names,
        }
    }

    /// `"Parent - Child"` path, or `Unknown` for ids not in the tree.
    pub fn full_name(&self, id: i64) -> &str {
        self.names.get(&id).map(String::as_str).unwrap_or(UNKNOWN)
    }

    /// Top-level ancestor; the category itself when it has no parent.
    pub fn root(&self, id: i64) -> Option<&ExpenseCategory> {
        let mut current = self.nodes.get(&id)?;
        for _ in 0..self.nodes.len() {
            match current.parent_id.and_then(|p| self.nodes.get(&p)) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Some(current)
    }

    pub fn root_name(&self, id: i64) -> &str {
        self.root(id).map(|c| c.name.as_str()).unwrap_or(UNKNOWN)
    }

    /// Whether `candidate` sits somewhere below `ancestor`.
    pub fn is_descendant(&self, candidate: i64, ancestor: i64) -> bool {
        let mut current = self.nodes.get(&candidate).and_then(|c| c.parent_id);
        for _ in 0..self.nodes.len() {
            match current {
                Some(id) if id == ancestor => return true,
                Some(id) => current = self.nodes.get(&id).and_then(|c| c.parent_id),
                None => return false,
            }
        }
        false
    }

    pub fn sections(&self) -> Vec<CategorySection> {
        let mut sections: Vec<CategorySection> = Vec::new();
        let mut index: HashMap<i64, usize> = HashMap::new();
        for id in &self.order {
            let Some(root) = self.root(*id) else {
                continue;
            };
            let slot = *index.entry(root.id).or_insert_with(|| {
                sections.push(CategorySection {
                    id: root.id,
                    name: root.name.clone(),
                    members: Vec::new(),
                });
                sections.len() - 1
            });
            if root.id != *id {
                sections[slot].members.push(SectionMember {
                    id: *id,
                    full_name: self.full_name(*id).to_string(),
                });
            }
        }
        sections
    }
}

fn build_full_name(
    nodes: &HashMap<i64, ExpenseCategory>,
    id: i64,
    cache: &mut HashMap<i64, String>,
    depth: usize,
) -> String {
    if let Some(name) = cache.get(&id) {
        return name.clone();
    }
    let Some(category) = nodes.get(&id) else {
        return UNKNOWN.to_string();
    };
    let full = match category.parent_id {
        // depth bound keeps a corrupted cycle from recursing forever
        Some(parent) if depth < nodes.len() => format!(
            "{} - {}",
            build_full_name(nodes, parent, cache, depth + 1),
            category.name
        ),
        _ => category.name.clone(),
    };
    cache.insert(id, full.clone());
    full
}
