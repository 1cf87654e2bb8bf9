use std::collections::BTreeSet;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use crossdump_core::{
    Dialect, Error, Relation, RelationKind, Result, Route, TableSchema, ViewDefinition,
    validate_table,
};
use crossdump_introspect::{IntrospectOptions, SourceAdapter};

use crate::data::emit_table_data;
use crate::options::DumpOptions;
use crate::report::{DumpOutput, DumpStats, DumpWarning};
use crate::schema::{render_create_table, render_create_view};

/// First line of every dump banner.
pub const HEADER_TITLE: &str = "-- crossdump SQL export";

/// Dump the source behind `adapter` as a SQL script for `target`.
///
/// Any failure aborts the whole dump; no partial script is returned.
pub async fn generate_sql_dump(
    adapter: &dyn SourceAdapter,
    target: Dialect,
    options: &DumpOptions,
) -> Result<String> {
    generate_sql_dump_report(adapter, target, options)
        .await
        .map(|output| output.sql)
}

/// Like [`generate_sql_dump`], also returning lenient-mode warnings and counts.
pub async fn generate_sql_dump_report(
    adapter: &dyn SourceAdapter,
    target: Dialect,
    options: &DumpOptions,
) -> Result<DumpOutput> {
    options.validate()?;
    let start = Instant::now();
    let source = adapter.dialect();
    let route = Route::new(source, target);
    let strategy = target.strategy();
    let introspect = IntrospectOptions::new(target).with_type_overrides(options.type_overrides.clone());

    info!(
        event = "dump_started",
        source = %source,
        target = %target,
        chunk_size = options.chunk_size,
        "dump started"
    );

    let relations = adapter.list_relations(&introspect).await?;
    let (table_names, view_names) = resolve_relations(&relations, options, route)?;
    info!(
        event = "relations_resolved",
        tables = table_names.len(),
        views = view_names.len(),
        "relations resolved"
    );

    let mut warnings = Vec::new();
    let mut tables: Vec<TableSchema> = Vec::with_capacity(table_names.len());
    for name in &table_names {
        let introspected = adapter.introspect_table(name, &introspect).await?;
        validate_table(&introspected.table, route)?;
        for item in introspected.unsupported {
            if !options.lenient_constraints {
                return Err(Error::unsupported_constraint(route, item.location, item.detail));
            }
            warn!(
                event = "constraint_dropped",
                location = %item.location,
                detail = %item.detail,
                "unsupported item dropped"
            );
            warnings.push(DumpWarning::new(item.location, item.detail));
        }
        info!(
            event = "table_introspected",
            table = %name,
            columns = introspected.table.columns.len(),
            foreign_keys = introspected.table.foreign_keys.len(),
            "table introspected"
        );
        tables.push(introspected.table);
    }

    let mut views: Vec<ViewDefinition> = Vec::with_capacity(view_names.len());
    for name in &view_names {
        let view = adapter.introspect_view(name, &introspect).await?;
        info!(event = "view_introspected", view = %name, "view introspected");
        views.push(view);
    }

    let mut blocks = Vec::new();
    if options.include_header {
        blocks.push(header(source, target));
    }
    if options.include_schema {
        for table in &tables {
            blocks.push(render_create_table(strategy, table, route)?);
        }
        for view in &views {
            blocks.push(render_create_view(strategy, view));
        }
    }

    let mut stats = DumpStats {
        tables: tables.len(),
        views: views.len(),
        rows: 0,
    };
    if options.chunk_size > 0 {
        let mut preamble_pending = strategy.session_preamble();
        for table in &tables {
            let data = emit_table_data(
                adapter,
                strategy,
                table,
                options.chunk_size,
                options.conflict_mode,
                &introspect,
                route,
            )
            .await?;
            if !data.statements.is_empty() {
                if let Some(preamble) = preamble_pending.take() {
                    blocks.push(preamble.to_string());
                }
            }
            blocks.extend(data.statements);
            stats.rows += data.rows;
            info!(
                event = "table_data_emitted",
                table = %table.name,
                rows = data.rows,
                "table data emitted"
            );
        }
    }

    let sql = if blocks.is_empty() {
        String::new()
    } else {
        let mut sql = blocks.join("\n\n");
        sql.push('\n');
        sql
    };

    info!(
        event = "dump_finished",
        tables = stats.tables,
        views = stats.views,
        rows = stats.rows,
        warnings = warnings.len(),
        bytes = sql.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "dump finished"
    );

    Ok(DumpOutput {
        source,
        target,
        sql,
        warnings,
        stats,
    })
}

/// Split the requested relations into tables and views, in output order.
fn resolve_relations(
    relations: &[Relation],
    options: &DumpOptions,
    route: Route,
) -> Result<(Vec<String>, Vec<String>)> {
    let mut tables = Vec::new();
    let mut views = Vec::new();
    let mut push = |relation: &Relation| match relation.kind {
        RelationKind::Table => tables.push(relation.name.clone()),
        RelationKind::View => views.push(relation.name.clone()),
    };

    match &options.tables {
        Some(requested) => {
            let mut seen = BTreeSet::new();
            for name in requested {
                if !seen.insert(name.as_str()) {
                    continue;
                }
                let relation = relations
                    .iter()
                    .find(|relation| &relation.name == name)
                    .ok_or_else(|| {
                        Error::introspection(route, name, "relation not found in source catalog")
                    })?;
                push(relation);
            }
        }
        None => relations
            .iter()
            .filter(|relation| !options.is_internal(&relation.name))
            .for_each(push),
    }

    Ok((tables, views))
}

fn header(source: Dialect, target: Dialect) -> String {
    format!(
        "{HEADER_TITLE}\n-- source: {source}\n-- target: {target}\n-- generated at: {}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}
