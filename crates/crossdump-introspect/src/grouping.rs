//! Folding per-column constraint rows into constraints.
//!
//! Catalogs report a composite key as several rows sharing one constraint
//! name; rows are grouped by `(kind, name)` and ordered by position before
//! any key is built.

use std::collections::BTreeMap;

use crossdump_core::{FkAction, ForeignKey, Location, PrimaryKey, UniqueConstraint};

use crate::adapter::UnsupportedItem;

/// One catalog row: a constraint column, or a constraint with no columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, sqlx::FromRow)]
pub(crate) struct RawConstraint {
    pub name: String,
    pub kind: String,
    pub position: Option<i64>,
    pub column_name: Option<String>,
    pub referenced_table: Option<String>,
    pub referenced_column: Option<String>,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
    pub definition: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum ConstraintKind {
    PrimaryKey,
    Unique,
    ForeignKey,
    Check,
    Exclusion,
    Other,
}

impl ConstraintKind {
    /// Accepts `pg_constraint.contype` codes and `information_schema` names.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "P" | "PRIMARY KEY" => ConstraintKind::PrimaryKey,
            "U" | "UNIQUE" => ConstraintKind::Unique,
            "F" | "FOREIGN KEY" => ConstraintKind::ForeignKey,
            "C" | "CHECK" => ConstraintKind::Check,
            "X" | "EXCLUDE" => ConstraintKind::Exclusion,
            _ => ConstraintKind::Other,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey => "primary key",
            ConstraintKind::Unique => "unique constraint",
            ConstraintKind::ForeignKey => "foreign key",
            ConstraintKind::Check => "CHECK constraint",
            ConstraintKind::Exclusion => "EXCLUDE constraint",
            ConstraintKind::Other => "constraint",
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub(crate) struct GroupedConstraints {
    pub primary_key: Option<PrimaryKey>,
    pub unique_constraints: Vec<UniqueConstraint>,
    pub foreign_keys: Vec<ForeignKey>,
    pub unsupported: Vec<UnsupportedItem>,
}

pub(crate) fn group_constraints(table: &str, rows: Vec<RawConstraint>) -> GroupedConstraints {
    let mut groups: BTreeMap<(ConstraintKind, String), Vec<RawConstraint>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((ConstraintKind::from_code(&row.kind), row.name.clone()))
            .or_default()
            .push(row);
    }

    let mut grouped = GroupedConstraints::default();
    for ((kind, name), mut rows) in groups {
        rows.sort_by_key(|row| row.position.unwrap_or(0));
        let columns: Vec<String> = rows
            .iter()
            .filter_map(|row| row.column_name.clone())
            .collect();
        let unsupported = |detail: String| UnsupportedItem::new(Location::table(table), detail);

        match kind {
            ConstraintKind::PrimaryKey if !columns.is_empty() => {
                if grouped.primary_key.is_none() {
                    grouped.primary_key = Some(PrimaryKey { columns });
                }
            }
            ConstraintKind::Unique if !columns.is_empty() => {
                grouped.unique_constraints.push(UniqueConstraint {
                    name: Some(name),
                    columns,
                });
            }
            ConstraintKind::ForeignKey if !columns.is_empty() => {
                let Some(first) = rows.first() else {
                    continue;
                };
                let referenced_columns: Vec<String> = rows
                    .iter()
                    .filter_map(|row| row.referenced_column.clone())
                    .collect();
                match &first.referenced_table {
                    Some(referenced_table) if referenced_columns.len() == columns.len() => {
                        grouped.foreign_keys.push(ForeignKey {
                            name: Some(name.clone()),
                            columns,
                            referenced_table: referenced_table.clone(),
                            referenced_columns,
                            on_delete: parse_action(first.on_delete.as_deref()),
                            on_update: parse_action(first.on_update.as_deref()),
                        });
                    }
                    _ => grouped.unsupported.push(unsupported(format!(
                        "foreign key `{name}` has an unresolved target"
                    ))),
                }
            }
            _ => {
                let detail = match rows.iter().find_map(|row| row.definition.as_deref()) {
                    Some(definition) => {
                        format!("{} `{name}`: {definition}", kind.describe())
                    }
                    None => format!("{} `{name}`", kind.describe()),
                };
                grouped.unsupported.push(unsupported(detail));
            }
        }
    }

    grouped
}

fn parse_action(rule: Option<&str>) -> FkAction {
    rule.and_then(FkAction::from_rule)
        .unwrap_or(FkAction::NoAction)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, kind: &str, position: i64, column: &str) -> RawConstraint {
        RawConstraint {
            name: name.to_string(),
            kind: kind.to_string(),
            position: Some(position),
            column_name: Some(column.to_string()),
            ..RawConstraint::default()
        }
    }

    fn fk_row(position: i64, column: &str, referenced: &str) -> RawConstraint {
        RawConstraint {
            referenced_table: Some("t_tasks".to_string()),
            referenced_column: Some(referenced.to_string()),
            on_delete: Some("CASCADE".to_string()),
            on_update: Some("CASCADE".to_string()),
            ..row("fk_task", "FOREIGN KEY", position, column)
        }
    }

    #[test]
    fn composite_primary_key_keeps_position_order() {
        let rows = vec![row("pk", "p", 2, "col2"), row("pk", "p", 1, "col1")];
        let grouped = group_constraints("t", rows);
        assert_eq!(
            grouped.primary_key,
            Some(PrimaryKey {
                columns: vec!["col1".to_string(), "col2".to_string()]
            })
        );
    }

    #[test]
    fn composite_foreign_key_is_one_constraint() {
        let rows = vec![
            fk_row(2, "task_project", "project_id"),
            fk_row(1, "task_id", "id"),
        ];
        let grouped = group_constraints("t_task_tags", rows);
        assert_eq!(grouped.foreign_keys.len(), 1);
        let fk = &grouped.foreign_keys[0];
        assert_eq!(fk.columns, vec!["task_id", "task_project"]);
        assert_eq!(fk.referenced_columns, vec!["id", "project_id"]);
        assert_eq!(fk.on_delete, FkAction::Cascade);
        assert_eq!(fk.on_update, FkAction::Cascade);
    }

    #[test]
    fn unique_constraints_are_kept_apart_by_name() {
        let rows = vec![
            row("uq_text_project", "UNIQUE", 1, "constraint_text"),
            row("uq_slug", "u", 1, "slug"),
            row("uq_text_project", "UNIQUE", 2, "project_id"),
        ];
        let grouped = group_constraints("t_constraints", rows);
        let columns: Vec<Vec<String>> = grouped
            .unique_constraints
            .into_iter()
            .map(|unique| unique.columns)
            .collect();
        assert_eq!(
            columns,
            vec![
                vec!["slug".to_string()],
                vec!["constraint_text".to_string(), "project_id".to_string()],
            ]
        );
    }

    #[test]
    fn check_constraints_become_unsupported_items() {
        let rows = vec![RawConstraint {
            name: "ck_priority".to_string(),
            kind: "c".to_string(),
            definition: Some("CHECK ((priority > 0))".to_string()),
            ..RawConstraint::default()
        }];
        let grouped = group_constraints("t_tasks", rows);
        assert_eq!(grouped.unsupported.len(), 1);
        assert_eq!(grouped.unsupported[0].location, Location::table("t_tasks"));
        assert!(grouped.unsupported[0].detail.contains("priority > 0"));
    }

    #[test]
    fn foreign_key_without_target_columns_is_unsupported() {
        let mut broken = fk_row(1, "task_id", "id");
        broken.referenced_column = None;
        let grouped = group_constraints("t", vec![broken]);
        assert!(grouped.foreign_keys.is_empty());
        assert_eq!(grouped.unsupported.len(), 1);
    }
}
