//! Knowledge-graph data structures and the activation ranking core.

pub mod activation;
pub mod knowledge;
pub mod types;

pub use activation::{extract_subgraph, spread, ActivationConfig};
pub use knowledge::{KnowledgeGraph, NodeHandle};
pub use types::{Edge, Graph, Node, NodeType, RelationKind};
