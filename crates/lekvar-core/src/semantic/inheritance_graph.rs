//! Inheritance graph construction and topological ordering
//!
//! Every section has a backward edge to its dot-parent and one to each
//! section listed after `:` on its header. Edges point from the inheriting
//! section to the section it inherits from, so the default section is the
//! only node without outgoing edges and the unique source of the order.
//!
//! # Example
//!
//! ```rust
//! use lekvar_core::semantic::inheritance_graph::{EdgeKind, InheritanceGraph};
//!
//! let mut graph = InheritanceGraph::new("DEFAULT");
//! graph.add_edge("a", "DEFAULT", EdgeKind::DotParent);
//! graph.add_edge("a.b", "a", EdgeKind::DotParent);
//!
//! let order = graph.topological_order().unwrap();
//! assert_eq!(order, vec!["DEFAULT", "a", "a.b"]);
//! ```

use crate::model::SectionRegistry;
use petgraph::Direction;
use petgraph::algo::{has_path_connecting, tarjan_scc};
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};

/// How an inheritance edge came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Implied by the dotted name (`a.b` inherits from `a`)
    DotParent,
    /// Listed on the section header (`[a : p]`)
    Explicit,
}

impl EdgeKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            EdgeKind::DotParent => "dot-parent",
            EdgeKind::Explicit => "explicit",
        }
    }
}

/// Inheritance edge with metadata
#[derive(Debug, Clone)]
pub struct InheritanceEdge {
    /// Inheriting section
    pub child: String,
    /// Section inherited from
    pub parent: String,
    pub kind: EdgeKind,
}

impl fmt::Display for InheritanceEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.display_name())
    }
}

/// Errors that can occur during graph operations
#[derive(Debug, Error)]
pub enum GraphError {
    /// The graph has no topological order
    #[error("Cyclic section inheritance: {}", .cycle.join(" → "))]
    CyclicInheritance { cycle: Vec<String> },

    /// An edge names a section the registry does not know
    #[error("Section '{referrer}' inherits from unknown section '{section}'")]
    MissingSection { section: String, referrer: String },
}

impl From<GraphError> for crate::LekvarError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::CyclicInheritance { cycle } => Self::CyclicInheritance { cycle },
            GraphError::MissingSection { section, .. } => Self::NoSection { section },
        }
    }
}

/// Section inheritance DAG backed by petgraph
pub struct InheritanceGraph {
    graph: DiGraph<String, InheritanceEdge>,
    node_map: HashMap<String, NodeIndex>,
    root: NodeIndex,
}

impl InheritanceGraph {
    /// Create a graph holding only the root (default) section
    pub fn new(root: &str) -> Self {
        let mut graph = DiGraph::new();
        let root_idx = graph.add_node(root.to_string());
        let mut node_map = HashMap::new();
        node_map.insert(root.to_string(), root_idx);
        Self {
            graph,
            node_map,
            root: root_idx,
        }
    }

    /// Build the graph from every registered section.
    ///
    /// Nodes are added in registration order so the resulting order is
    /// stable across runs.
    pub fn from_registry(registry: &SectionRegistry) -> Result<Self, GraphError> {
        let mut graph = Self::new(registry.default_section());

        for section in registry.iter() {
            graph.add_node(section.name());
        }

        for section in registry.iter() {
            for parent in section.explicit_parents() {
                if !registry.contains(parent) {
                    return Err(GraphError::MissingSection {
                        section: parent.clone(),
                        referrer: section.name().to_string(),
                    });
                }
                graph.add_edge(section.name(), parent, EdgeKind::Explicit);
            }
            if let Some(parent) = section.dot_parent() {
                if !registry.contains(parent) {
                    return Err(GraphError::MissingSection {
                        section: parent.to_string(),
                        referrer: section.name().to_string(),
                    });
                }
                graph.add_edge(section.name(), parent, EdgeKind::DotParent);
            }
        }

        debug!(
            "Built inheritance graph: {} sections, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Add a section node, returning the existing index if already present
    pub fn add_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.node_map.insert(name.to_string(), idx);
        idx
    }

    /// Add an edge `child` → `parent`, creating nodes as needed.
    /// Duplicate edges are kept.
    pub fn add_edge(&mut self, child: &str, parent: &str, kind: EdgeKind) {
        let child_idx = self.add_node(child);
        let parent_idx = self.add_node(parent);
        trace!("Edge: {} -[{}]-> {}", child, kind.display_name(), parent);
        self.graph.add_edge(
            child_idx,
            parent_idx,
            InheritanceEdge {
                child: child.to_string(),
                parent: parent.to_string(),
                kind,
            },
        );
    }

    /// Direct parents of a section
    pub fn get_parents(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Direct children of a section
    pub fn get_children(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.node_map.get(name) else {
            return Vec::new();
        };
        let mut neighbors: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, direction)
            .map(|edge| match direction {
                Direction::Outgoing => edge.target(),
                Direction::Incoming => edge.source(),
            })
            .collect();
        neighbors.sort();
        neighbors.dedup();
        neighbors
            .into_iter()
            .map(|n| self.graph[n].as_str())
            .collect()
    }

    /// Kahn's algorithm seeded at the root.
    ///
    /// A section's in-degree is its number of parent edges; it becomes ready
    /// once every parent has been emitted. Ready sections are emitted in
    /// registration order. If fewer sections are emitted than exist, the
    /// remainder sits on a cycle and `CyclicInheritance` is returned.
    pub fn topological_order(&self) -> Result<Vec<String>, GraphError> {
        trace!(
            "Performing topological sort on {} sections",
            self.graph.node_count()
        );

        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                let parents = self.graph.edges_directed(idx, Direction::Outgoing).count();
                (idx, parents)
            })
            .collect();

        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        if in_degree[&self.root] == 0 {
            queue.push_back(self.root);
        }
        for idx in self.graph.node_indices() {
            if idx != self.root && in_degree[&idx] == 0 {
                queue.push_back(idx);
            }
        }

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(idx) = queue.pop_front() {
            order.push(self.graph[idx].clone());

            let mut children: Vec<NodeIndex> = self
                .graph
                .edges_directed(idx, Direction::Incoming)
                .map(|edge| edge.source())
                .collect();
            children.sort();

            for child in children {
                if let Some(degree) = in_degree.get_mut(&child) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(child);
                    }
                }
            }
        }

        if order.len() < self.graph.node_count() {
            let cycle = self.find_cycles().into_iter().next().unwrap_or_else(|| {
                self.graph
                    .node_indices()
                    .map(|idx| self.graph[idx].clone())
                    .filter(|name| !order.contains(name))
                    .collect()
            });
            return Err(GraphError::CyclicInheritance { cycle });
        }

        debug!("Topological order covers {} sections", order.len());
        Ok(order)
    }

    /// All cycles, each closed by repeating its first section
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || (scc.len() == 1 && self.graph.contains_edge(scc[0], scc[0]))
            })
            .map(|scc| {
                let mut cycle: Vec<String> =
                    scc.iter().map(|&idx| self.graph[idx].clone()).collect();
                if let Some(first) = cycle.first().cloned() {
                    cycle.push(first);
                }
                cycle
            })
            .collect()
    }

    /// Whether `from` (transitively) inherits from `to`
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        match (self.node_map.get(from), self.node_map.get(to)) {
            (Some(&from_idx), Some(&to_idx)) => {
                has_path_connecting(&self.graph, from_idx, to_idx, None)
            }
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Graphviz rendering, edges pointing from child to parent
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::with_config(&self.graph, &[]))
    }
}
