//! Inheritance analysis: graph construction, topological ordering and option
//! propagation

pub mod inheritance_graph;
pub mod resolver;

pub use inheritance_graph::{EdgeKind, GraphError, InheritanceEdge, InheritanceGraph};
pub use resolver::{InheritanceResolver, Resolution};
