//! `CREATE TABLE` / `CREATE VIEW` rendering.

use crossdump_core::{
    ColumnDefinition, DialectStrategy, Error, FkAction, Location, Result, Route, TableSchema,
    ViewDefinition,
};

/// Render one `CREATE TABLE` statement.
///
/// Clause order: columns in source order, the primary key as a single
/// clause, foreign keys, then unique constraints.
pub fn render_create_table(
    strategy: &dyn DialectStrategy,
    table: &TableSchema,
    route: Route,
) -> Result<String> {
    let mut clauses = Vec::with_capacity(table.columns.len() + 4);
    for column in &table.columns {
        clauses.push(render_column(strategy, table, column, route)?);
    }

    if let Some(pk) = table.primary_key.as_ref().filter(|pk| !pk.columns.is_empty()) {
        clauses.push(format!("PRIMARY KEY ({})", quote_list(strategy, &pk.columns)));
    }

    for fk in &table.foreign_keys {
        let mut clause = format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            quote_list(strategy, &fk.columns),
            strategy.quote_identifier(&fk.referenced_table),
            quote_list(strategy, &fk.referenced_columns)
        );
        if fk.on_delete != FkAction::NoAction {
            clause.push_str(" ON DELETE ");
            clause.push_str(fk.on_delete.as_sql());
        }
        if fk.on_update != FkAction::NoAction {
            clause.push_str(" ON UPDATE ");
            clause.push_str(fk.on_update.as_sql());
        }
        clauses.push(clause);
    }

    for unique in &table.unique_constraints {
        clauses.push(format!("UNIQUE ({})", quote_list(strategy, &unique.columns)));
    }

    let mut statement = format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        strategy.quote_identifier(&table.name),
        clauses.join(",\n  ")
    );
    if let Some(options) = strategy.table_options() {
        statement.push(' ');
        statement.push_str(options);
    }
    statement.push(';');
    Ok(statement)
}

fn render_column(
    strategy: &dyn DialectStrategy,
    table: &TableSchema,
    column: &ColumnDefinition,
    route: Route,
) -> Result<String> {
    let portable = if table.is_key_column(&column.name) {
        strategy.key_column_type(column.portable_type)
    } else {
        column.portable_type
    };

    let mut clause = format!(
        "{} {}",
        strategy.quote_identifier(&column.name),
        strategy.column_type(&portable, column.is_auto_increment)
    );
    if !column.nullable {
        clause.push_str(" NOT NULL");
    }
    // Auto-increment columns get their values from the target's own counter.
    if let Some(default) = column.default_value.as_ref().filter(|_| !column.is_auto_increment) {
        let rendered = strategy
            .render_default(default, &portable)
            .map_err(|err| Error::Escaping {
                route,
                location: Location::column(&table.name, &column.name),
                reason: err.to_string(),
            })?;
        clause.push_str(" DEFAULT ");
        clause.push_str(&rendered);
    }
    if column.is_auto_increment {
        if let Some(suffix) = strategy.auto_increment_suffix() {
            clause.push(' ');
            clause.push_str(suffix);
        }
    }
    Ok(clause)
}

/// Render a view as the target's `CREATE VIEW` head plus the source SELECT text.
pub fn render_create_view(strategy: &dyn DialectStrategy, view: &ViewDefinition) -> String {
    let mut head = strategy.create_view_prefix(&view.name);
    if !view.columns.is_empty() {
        head.push_str(&format!(" ({})", quote_list(strategy, &view.columns)));
    }
    format!(
        "{head} AS {};",
        view.source_select_text.trim().trim_end_matches(';').trim_end()
    )
}

fn quote_list(strategy: &dyn DialectStrategy, names: &[String]) -> String {
    names
        .iter()
        .map(|name| strategy.quote_identifier(name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossdump_core::{
        ColumnDefault, Dialect, ForeignKey, Literal, PortableType, PrimaryKey, UniqueConstraint,
    };

    fn route(target: Dialect) -> Route {
        Route::new(Dialect::Sqlite, target)
    }

    fn agents() -> TableSchema {
        let mut table = TableSchema::new("m_agents");
        table.columns = vec![
            ColumnDefinition::new("id", PortableType::Integer)
                .not_null()
                .auto_increment(),
            ColumnDefinition::new("name", PortableType::Text).not_null(),
            ColumnDefinition::new("in_use", PortableType::Boolean)
                .with_default(ColumnDefault::Literal(Literal::Int(0))),
        ];
        table.primary_key = Some(PrimaryKey {
            columns: vec!["id".to_string()],
        });
        table.unique_constraints = vec![UniqueConstraint {
            name: Some("sqlite_autoindex_m_agents_1".to_string()),
            columns: vec!["name".to_string()],
        }];
        table
    }

    #[test]
    fn renders_postgres_table() {
        let sql = render_create_table(
            Dialect::Postgresql.strategy(),
            &agents(),
            route(Dialect::Postgresql),
        )
        .unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"m_agents\" (\n  \"id\" SERIAL NOT NULL,\n  \"name\" TEXT NOT NULL,\n  \"in_use\" BOOLEAN DEFAULT FALSE,\n  PRIMARY KEY (\"id\"),\n  UNIQUE (\"name\")\n);"
        );
    }

    #[test]
    fn renders_mysql_table_with_bounded_key_text() {
        let sql =
            render_create_table(Dialect::Mysql.strategy(), &agents(), route(Dialect::Mysql))
                .unwrap();
        assert!(sql.contains("`id` INT NOT NULL AUTO_INCREMENT"), "{sql}");
        assert!(sql.contains("`name` VARCHAR(255) NOT NULL"), "{sql}");
        assert!(sql.contains("`in_use` TINYINT(1) DEFAULT 0"), "{sql}");
        assert!(sql.ends_with(") ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;"), "{sql}");
    }

    #[test]
    fn renders_sqlite_table() {
        let sql =
            render_create_table(Dialect::Sqlite.strategy(), &agents(), route(Dialect::Sqlite))
                .unwrap();
        assert!(sql.contains("\"id\" INTEGER NOT NULL,"), "{sql}");
        assert!(sql.contains("\"in_use\" INTEGER DEFAULT 0"), "{sql}");
    }

    #[test]
    fn composite_keys_stay_one_clause() {
        let mut table = TableSchema::new("t_task_tags");
        table.columns = vec![
            ColumnDefinition::new("col1", PortableType::Integer).not_null(),
            ColumnDefinition::new("col2", PortableType::Text).not_null(),
        ];
        table.primary_key = Some(PrimaryKey {
            columns: vec!["col1".to_string(), "col2".to_string()],
        });
        let sql = render_create_table(
            Dialect::Postgresql.strategy(),
            &table,
            route(Dialect::Postgresql),
        )
        .unwrap();
        assert_eq!(sql.matches("PRIMARY KEY").count(), 1);
        assert!(sql.contains("PRIMARY KEY (\"col1\", \"col2\")"));
    }

    #[test]
    fn foreign_key_rules_omit_no_action() {
        let mut table = TableSchema::new("t_tasks");
        table.columns = vec![
            ColumnDefinition::new("agent_id", PortableType::Integer),
            ColumnDefinition::new("project_id", PortableType::Integer),
        ];
        table.foreign_keys = vec![
            ForeignKey {
                name: None,
                columns: vec!["agent_id".to_string()],
                referenced_table: "m_agents".to_string(),
                referenced_columns: vec!["id".to_string()],
                on_delete: FkAction::Cascade,
                on_update: FkAction::Cascade,
            },
            ForeignKey {
                name: None,
                columns: vec!["project_id".to_string()],
                referenced_table: "m_projects".to_string(),
                referenced_columns: vec!["id".to_string()],
                on_delete: FkAction::NoAction,
                on_update: FkAction::SetNull,
            },
        ];
        let sql = render_create_table(
            Dialect::Postgresql.strategy(),
            &table,
            route(Dialect::Postgresql),
        )
        .unwrap();
        assert!(sql.contains(
            "FOREIGN KEY (\"agent_id\") REFERENCES \"m_agents\" (\"id\") ON DELETE CASCADE ON UPDATE CASCADE"
        ));
        assert!(sql.contains(
            "FOREIGN KEY (\"project_id\") REFERENCES \"m_projects\" (\"id\") ON UPDATE SET NULL"
        ));
    }

    #[test]
    fn unescapable_defaults_fail_with_location() {
        let mut table = TableSchema::new("t_flags");
        table.columns = vec![
            ColumnDefinition::new("enabled", PortableType::Boolean)
                .with_default(ColumnDefault::Literal(Literal::Text("maybe".to_string()))),
        ];
        let err = render_create_table(
            Dialect::Postgresql.strategy(),
            &table,
            route(Dialect::Postgresql),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Escaping { .. }));
        assert!(err.to_string().contains("t_flags.enabled"));
    }

    #[test]
    fn views_keep_their_select_text() {
        let view = ViewDefinition {
            name: "v_active".to_string(),
            columns: Vec::new(),
            source_select_text: "SELECT id FROM m_agents WHERE in_use = 1;".to_string(),
        };
        assert_eq!(
            render_create_view(Dialect::Mysql.strategy(), &view),
            "CREATE OR REPLACE VIEW `v_active` AS SELECT id FROM m_agents WHERE in_use = 1;"
        );
        assert_eq!(
            render_create_view(Dialect::Sqlite.strategy(), &view),
            "CREATE VIEW IF NOT EXISTS \"v_active\" AS SELECT id FROM m_agents WHERE in_use = 1;"
        );
    }

    #[test]
    fn view_column_lists_are_kept() {
        let view = ViewDefinition {
            name: "v_agent_names".to_string(),
            columns: vec!["agent".to_string()],
            source_select_text: "SELECT name FROM m_agents".to_string(),
        };
        assert_eq!(
            render_create_view(Dialect::Postgresql.strategy(), &view),
            "CREATE OR REPLACE VIEW \"v_agent_names\" (\"agent\") AS SELECT name FROM m_agents;"
        );
    }
}
