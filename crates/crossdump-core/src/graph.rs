use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::schema::TableSchema;

/// Size of the foreign-key graph between the given tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Parent-first table order, or the tables stuck in a reference cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    pub summary: GraphSummary,
    pub order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Order `tables` so every referenced table precedes the tables referencing it.
///
/// Self-references and references to tables outside `tables` are ignored.
/// Ties are broken by name, so the result is deterministic.
pub fn dependency_order(tables: &[TableSchema]) -> DependencyReport {
    let graph = build_adjacency(tables);
    let nodes = graph.len();
    let edges = graph.values().map(BTreeSet::len).sum();
    let summary = GraphSummary { nodes, edges };

    match toposort(&graph) {
        Ok(order) => DependencyReport {
            summary,
            order: Some(order),
            cycle: None,
        },
        Err(cycle) => DependencyReport {
            summary,
            order: None,
            cycle: Some(cycle),
        },
    }
}

/// Edges point from a referenced table to the tables that depend on it.
fn build_adjacency(tables: &[TableSchema]) -> BTreeMap<String, BTreeSet<String>> {
    let mut graph: BTreeMap<String, BTreeSet<String>> = tables
        .iter()
        .map(|table| (table.name.clone(), BTreeSet::new()))
        .collect();

    for table in tables {
        for fk in &table.foreign_keys {
            if fk.referenced_table == table.name {
                continue;
            }
            if let Some(dependents) = graph.get_mut(&fk.referenced_table) {
                dependents.insert(table.name.clone());
            }
        }
    }

    graph
}

fn toposort(graph: &BTreeMap<String, BTreeSet<String>>) -> Result<Vec<String>, Vec<String>> {
    let mut indegree: BTreeMap<&str, usize> =
        graph.keys().map(|node| (node.as_str(), 0)).collect();
    for targets in graph.values() {
        for target in targets {
            *indegree.entry(target.as_str()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<&str> = indegree
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| *node)
        .collect();
    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        order.push(node.to_string());
        if let Some(targets) = graph.get(node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target.as_str()) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target.as_str());
                    }
                }
            }
        }
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        Err(indegree
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(node, _)| node.to_string())
            .collect())
    }
}
