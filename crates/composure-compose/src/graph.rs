//! Service dependency graph using `petgraph`.
//!
//! Builds a directed graph from `depends_on` declarations and resolves the
//! order in which services can be started.

use std::collections::HashMap;

use composure_common::error::{ComposeError, Result};
use petgraph::graph::NodeIndex;

use crate::model::Composition;

/// A dependency graph of services.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: petgraph::Graph<String, ()>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: petgraph::Graph::new(),
        }
    }

    /// Builds the graph of a composition's services.
    ///
    /// Dependencies that name no declared service are skipped; normalization
    /// has already rejected them.
    pub fn from_composition(composition: &Composition) -> Self {
        let mut graph = Self::new();
        let nodes: HashMap<&str, NodeIndex> = composition
            .services
            .keys()
            .map(|name| (name.as_str(), graph.add_service(name.as_str())))
            .collect();

        for (name, service) in &composition.services {
            for dependency in &service.depends_on {
                if let (Some(&dependent), Some(&dependency)) =
                    (nodes.get(name.as_str()), nodes.get(dependency.as_str()))
                {
                    graph.add_dependency(dependent, dependency);
                }
            }
        }
        graph
    }

    /// Adds a service node to the graph.
    pub fn add_service(&mut self, name: impl Into<String>) -> NodeIndex {
        self.graph.add_node(name.into())
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// The edge points from `dependency` to `dependent` so that a
    /// topological sort yields dependencies first.
    pub fn add_dependency(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        let _ = self.graph.add_edge(dependency, dependent, ());
    }

    /// Returns the services in startup order, dependencies first.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::Validation`] if the graph contains a cycle.
    pub fn startup_order(&self) -> Result<Vec<String>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => {
                let service = self
                    .graph
                    .node_weight(cycle.node_id())
                    .map_or("<unknown>", String::as_str);
                Err(ComposeError::validation(format!(
                    "cyclic dependency detected in depends_on involving service '{service}'"
                )))
            }
        }
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
