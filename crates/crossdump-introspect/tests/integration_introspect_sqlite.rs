use anyhow::{Context, Result};
use crossdump_core::{
    ColumnDefault, Dialect, FkAction, Literal, PortableType, Relation, TypeOverride,
};
use crossdump_introspect::{IntrospectOptions, RowPage, SourceAdapter, SqliteAdapter};
use sqlx::sqlite::SqlitePoolOptions;

const FIXTURE: &str = include_str!("fixtures/sqlite.sql");

async fn adapter() -> Result<SqliteAdapter> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .context("opening in-memory SQLite")?;
    sqlx::raw_sql(FIXTURE)
        .execute(&pool)
        .await
        .context("applying SQLite fixture")?;
    Ok(SqliteAdapter::new(pool))
}

fn opts() -> IntrospectOptions {
    IntrospectOptions::new(Dialect::Postgresql)
}

#[tokio::test]
async fn lists_tables_and_views_without_internal_tables() -> Result<()> {
    let adapter = adapter().await?;
    let relations = adapter.list_relations(&opts()).await?;
    assert_eq!(
        relations,
        vec![
            Relation::table("m_agents"),
            Relation::table("t_task_tags"),
            Relation::table("t_tasks"),
            Relation::view("v_active_agents"),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn introspects_keys_defaults_and_checks() -> Result<()> {
    let adapter = adapter().await?;

    let agents = adapter.introspect_table("m_agents", &opts()).await?;
    let table = &agents.table;
    assert_eq!(table.column_names(), ["id", "name", "in_use", "created_at", "created_ts"]);
    assert!(table.columns[0].is_auto_increment);
    assert!(!table.columns[1].nullable);
    assert_eq!(
        table.columns[2].default_value,
        Some(ColumnDefault::Literal(Literal::Int(0)))
    );
    assert_eq!(
        table.columns[3].default_value,
        Some(ColumnDefault::CurrentTimestamp)
    );
    assert_eq!(table.columns[4].default_value, Some(ColumnDefault::UnixEpochNow));
    assert_eq!(table.unique_constraints.len(), 1);
    assert_eq!(table.unique_constraints[0].columns, ["name"]);
    assert!(agents.unsupported.is_empty());

    let tasks = adapter.introspect_table("t_tasks", &opts()).await?;
    assert_eq!(tasks.table.columns[2].portable_type, PortableType::VarChar(120));
    assert_eq!(tasks.table.columns[4].portable_type, PortableType::Blob);
    let fk = &tasks.table.foreign_keys[0];
    assert_eq!(fk.referenced_table, "m_agents");
    assert_eq!(fk.referenced_columns, ["id"]);
    assert_eq!(fk.on_delete, FkAction::Cascade);
    assert_eq!(tasks.unsupported.len(), 1);
    assert!(tasks.unsupported[0].detail.contains("priority > 0"));
    Ok(())
}

#[tokio::test]
async fn implicit_foreign_key_targets_resolve_to_the_parent_key() -> Result<()> {
    let adapter = adapter().await?;
    let tags = adapter.introspect_table("t_task_tags", &opts()).await?;
    let table = tags.table;
    assert_eq!(
        table.primary_key.map(|pk| pk.columns),
        Some(vec!["task_id".to_string(), "tag".to_string()])
    );
    assert!(table.columns.iter().all(|column| !column.is_auto_increment));
    assert_eq!(table.foreign_keys[0].referenced_table, "t_tasks");
    assert_eq!(table.foreign_keys[0].referenced_columns, ["id"]);
    Ok(())
}

#[tokio::test]
async fn missing_tables_and_views_are_errors() -> Result<()> {
    let adapter = adapter().await?;
    let err = adapter
        .introspect_table("nope", &opts())
        .await
        .expect_err("unknown table");
    assert!(err.to_string().contains("nope"), "{err}");
    assert!(adapter.introspect_view("nope", &opts()).await.is_err());
    Ok(())
}

#[tokio::test]
async fn copies_view_select_text() -> Result<()> {
    let adapter = adapter().await?;
    let view = adapter.introspect_view("v_active_agents", &opts()).await?;
    assert_eq!(
        view.source_select_text,
        "SELECT id, name FROM m_agents WHERE in_use = 1"
    );
    Ok(())
}

#[tokio::test]
async fn pages_rows_in_primary_key_order() -> Result<()> {
    let adapter = adapter().await?;
    let tags = adapter.introspect_table("t_task_tags", &opts()).await?.table;

    let first = adapter.fetch_rows(&tags, RowPage::first(1), &opts()).await?;
    assert_eq!(first, vec![vec![Literal::Int(1), Literal::Text("a".into())]]);
    let second = adapter
        .fetch_rows(&tags, RowPage::first(1).next(), &opts())
        .await?;
    assert_eq!(second, vec![vec![Literal::Int(1), Literal::Text("b".into())]]);
    let past_end = adapter
        .fetch_rows(&tags, RowPage { offset: 2, limit: 1 }, &opts())
        .await?;
    assert!(past_end.is_empty());
    Ok(())
}

#[tokio::test]
async fn decodes_values_by_storage_class() -> Result<()> {
    let adapter = adapter().await?;
    let tasks = adapter.introspect_table("t_tasks", &opts()).await?.table;
    let rows = adapter.fetch_rows(&tasks, RowPage::first(10), &opts()).await?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][3], Literal::Int(1));
    assert_eq!(rows[0][4], Literal::Blob(vec![0xca, 0xfe]));
    assert_eq!(rows[1][4], Literal::Null);

    let agents = adapter.introspect_table("m_agents", &opts()).await?.table;
    let rows = adapter.fetch_rows(&agents, RowPage::first(10), &opts()).await?;
    assert_eq!(rows[1][1], Literal::Text("O'Brien".into()));
    Ok(())
}

#[tokio::test]
async fn type_overrides_replace_catalog_types() -> Result<()> {
    let adapter = adapter().await?;
    let opts = opts().with_type_overrides(vec![TypeOverride {
        table: "m_agents".to_string(),
        column: "in_use".to_string(),
        portable_type: PortableType::Boolean,
    }]);
    let agents = adapter.introspect_table("m_agents", &opts).await?;
    assert_eq!(agents.table.columns[2].portable_type, PortableType::Boolean);
    Ok(())
}
