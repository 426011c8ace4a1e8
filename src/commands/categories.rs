// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{ValidationError, require_text};
use crate::models::{Category, CategoryKind};
use crate::utils::{
    id_for_category, json_flags, maybe_print_json, opt_arg, pretty_table, req_arg,
    validate_color,
};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let new = NewCategory {
                name: require_text("name", &req_arg(sub, "name")?)?,
                kind: req_arg(sub, "kind")?.parse()?,
                icon: opt_arg(sub, "icon"),
                color: opt_arg(sub, "color"),
                parent: opt_arg(sub, "parent"),
            };
            add(conn, &new)?;
            println!("Added category '{}' ({})", new.name, new.kind.as_str());
        }
        Some(("list", sub)) => {
            let (json_flag, jsonl_flag) = json_flags(sub);
            let kind = opt_arg(sub, "kind")
                .map(|k| k.parse::<CategoryKind>())
                .transpose()?;
            let data = list_tree(conn, kind, sub.get_flag("all"))?;
            if !maybe_print_json(json_flag, jsonl_flag, &data)? {
                let rows = data
                    .iter()
                    .map(|c| {
                        let name = if c.parent_id.is_some() {
                            format!("  └ {}", c.name)
                        } else {
                            c.name.clone()
                        };
                        vec![
                            name,
                            c.kind.as_str().to_string(),
                            c.icon.clone().unwrap_or_default(),
                            c.color.clone().unwrap_or_default(),
                            flags(c),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Category", "Kind", "Icon", "Color", "Flags"], rows)
                );
            }
        }
        Some(("archive", sub)) => {
            let name = req_arg(sub, "name")?;
            let id = id_for_category(conn, &name)?;
            conn.execute("UPDATE categories SET archived=1 WHERE id=?1", params![id])?;
            info!(category = %name, "category archived");
            println!("Archived category '{}'", name);
        }
        Some(("rm", sub)) => {
            let name = req_arg(sub, "name")?;
            remove(conn, &name)?;
            println!("Removed category '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

fn flags(c: &Category) -> String {
    let mut f = Vec::new();
    if c.is_default {
        f.push("default");
    }
    if c.archived {
        f.push("archived");
    }
    f.join(",")
}

pub struct NewCategory {
    pub name: String,
    pub kind: CategoryKind,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub parent: Option<String>,
}

pub fn add(conn: &Connection, new: &NewCategory) -> Result<i64> {
    let color = new.color.as_deref().map(validate_color).transpose()?;
    let parent_id = match new.parent.as_deref() {
        Some(p) => {
            let parent = get(conn, id_for_category(conn, p)?)?;
            if parent.parent_id.is_some() {
                return Err(ValidationError::Rule(format!(
                    "'{}' is already a subcategory; categories nest one level only",
                    p
                ))
                .into());
            }
            if parent.kind != new.kind {
                return Err(ValidationError::Rule(format!(
                    "Parent '{}' is {}, not {}",
                    p,
                    parent.kind.as_str(),
                    new.kind.as_str()
                ))
                .into());
            }
            Some(parent.id)
        }
        None => None,
    };
    conn.execute(
        "INSERT INTO categories(name, kind, icon, color, parent_id) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![new.name, new.kind.as_str(), new.icon, color, parent_id],
    )?;
    info!(category = %new.name, kind = new.kind.as_str(), ?parent_id, "category added");
    Ok(conn.last_insert_rowid())
}

const SELECT: &str =
    "SELECT id, name, kind, icon, color, parent_id, is_default, archived FROM categories";

fn row_to_category(r: &rusqlite::Row<'_>) -> rusqlite::Result<(Category, String)> {
    let kind: String = r.get(2)?;
    Ok((
        Category {
            id: r.get(0)?,
            name: r.get(1)?,
            kind: CategoryKind::Expense,
            icon: r.get(3)?,
            color: r.get(4)?,
            parent_id: r.get(5)?,
            is_default: r.get(6)?,
            archived: r.get(7)?,
        },
        kind,
    ))
}

pub fn get(conn: &Connection, id: i64) -> Result<Category> {
    let (mut c, kind) = conn
        .query_row(&format!("{} WHERE id=?1", SELECT), params![id], row_to_category)
        .optional()?
        .ok_or_else(|| anyhow::anyhow!("Category #{} not found", id))?;
    c.kind = kind.parse()?;
    Ok(c)
}

/// Categories with each child listed right after its parent.
pub fn list_tree(
    conn: &Connection,
    kind: Option<CategoryKind>,
    include_archived: bool,
) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE (archived=0 OR ?1) ORDER BY kind, name",
        SELECT
    ))?;
    let rows = stmt.query_map(params![include_archived], row_to_category)?;
    let mut all = Vec::new();
    for row in rows {
        let (mut c, k) = row?;
        c.kind = k.parse()?;
        if kind.is_none_or(|want| want == c.kind) {
            all.push(c);
        }
    }

    let (parents, children): (Vec<_>, Vec<_>) =
        all.into_iter().partition(|c| c.parent_id.is_none());
    let mut out = Vec::with_capacity(parents.len() + children.len());
    for p in parents {
        let pid = p.id;
        out.push(p);
        out.extend(children.iter().filter(|c| c.parent_id == Some(pid)).cloned());
    }
    // Children whose parent is filtered out (archived) still show up.
    let placed: Vec<i64> = out.iter().map(|c| c.id).collect();
    out.extend(children.into_iter().filter(|c| !placed.contains(&c.id)));
    Ok(out)
}

fn remove(conn: &Connection, name: &str) -> Result<()> {
    let c = get(conn, id_for_category(conn, name)?)?;
    if c.is_default {
        return Err(ValidationError::Rule(format!(
            "'{}' is a default category; archive it instead",
            name
        ))
        .into());
    }
    let children: i64 = conn.query_row(
        "SELECT COUNT(*) FROM categories WHERE parent_id=?1",
        params![c.id],
        |r| r.get(0),
    )?;
    if children > 0 {
        return Err(ValidationError::Rule(format!(
            "'{}' has {} subcategories; remove them first",
            name, children
        ))
        .into());
    }
    conn.execute("DELETE FROM categories WHERE id=?1", params![c.id])?;
    info!(category = name, "category removed");
    Ok(())
}
