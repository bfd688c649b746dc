//! Application order of injection points.
//!
//! Points are ordered by phase, then by explicit index. Within a run of equal phase
//! and index, templates are ordered by their dependencies: a template whose external
//! source is built from template `a` comes after the template that registers `a`.
//! The dependency order is a stable topological sort, so chains of any length are
//! honored and points without dependencies keep their declaration order.
//!
//! Dependency cycles cannot be resolved and are reported as validation faults.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::BTreeSet;
use tracing::trace;

use super::InjectionPoint;
use crate::core::{Result, TreeError};

/// Sort `points` into application order
pub fn order(mut points: Vec<InjectionPoint>) -> Result<Vec<InjectionPoint>> {
    points.sort_by_key(|point| (point.phase(), point.index()));

    let mut ordered = Vec::with_capacity(points.len());
    for group in points.chunk_by(|a, b| a.phase() == b.phase() && a.index() == b.index()) {
        ordered.extend(TemplateGraph::new(group).into_order()?);
    }
    Ok(ordered)
}

/// DFS node colors for cycle detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Dependency graph over one group of points; an edge runs from the point
/// registering a template to every point built from it.
struct TemplateGraph<'a> {
    points: &'a [InjectionPoint],
    graph: DiGraph<usize, ()>,
    nodes: Vec<NodeIndex>,
}

impl<'a> TemplateGraph<'a> {
    fn new(points: &'a [InjectionPoint]) -> Self {
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..points.len()).map(|i| graph.add_node(i)).collect();

        for (producer, provider) in points.iter().enumerate() {
            let Some(name) = provider.provides_template() else {
                continue;
            };
            for (consumer, dependent) in points.iter().enumerate() {
                if dependent.depends_on_template() == Some(name) {
                    trace!("{} depends on template '{}'", dependent.location(), name);
                    graph.add_edge(nodes[producer], nodes[consumer], ());
                }
            }
        }

        Self {
            points,
            graph,
            nodes,
        }
    }

    fn into_order(self) -> Result<Vec<InjectionPoint>> {
        if let Some(cycle) = self.find_cycle() {
            let names: Vec<&str> = cycle
                .iter()
                .map(|&i| self.points[i].provides_template().unwrap_or_else(|| self.points[i].name()))
                .collect();
            return Err(TreeError::validation(format!(
                "Circular template dependency detected: {}",
                names.join(" → ")
            ))
            .into());
        }

        let mut in_degree: Vec<usize> = self
            .nodes
            .iter()
            .map(|&node| self.graph.neighbors_directed(node, Direction::Incoming).count())
            .collect();
        let mut ready: BTreeSet<usize> = (0..self.points.len()).filter(|&i| in_degree[i] == 0).collect();

        let mut ordered = Vec::with_capacity(self.points.len());
        while let Some(next) = ready.pop_first() {
            ordered.push(self.points[next].clone());
            for successor in self.graph.neighbors(self.nodes[next]) {
                let index = self.graph[successor];
                in_degree[index] -= 1;
                if in_degree[index] == 0 {
                    ready.insert(index);
                }
            }
        }
        Ok(ordered)
    }

    fn find_cycle(&self) -> Option<Vec<usize>> {
        let mut colors = vec![Color::White; self.points.len()];
        let mut path = Vec::new();

        for start in 0..self.points.len() {
            if colors[start] == Color::White {
                if let Some(cycle) = self.visit(start, &mut colors, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn visit(&self, node: usize, colors: &mut [Color], path: &mut Vec<usize>) -> Option<Vec<usize>> {
        colors[node] = Color::Gray;
        path.push(node);

        for successor in self.graph.neighbors(self.nodes[node]) {
            let next = self.graph[successor];
            match colors[next] {
                Color::Gray => {
                    let start = path.iter().position(|&p| p == next).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(next);
                    return Some(cycle);
                }
                Color::White => {
                    if let Some(cycle) = self.visit(next, colors, path) {
                        return Some(cycle);
                    }
                }
                Color::Black => {}
            }
        }

        path.pop();
        colors[node] = Color::Black;
        None
    }
}
