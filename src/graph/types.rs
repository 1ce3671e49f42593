//! Core graph type definitions.
//!
//! Defines [`NodeType`] and [`RelationKind`] (the controlled vocabularies),
//! [`Node`] and [`Edge`] records, and [`Graph`] — the raw node/edge
//! collections a single scope load returns, before merging.

use serde::{Deserialize, Serialize};

/// Entity categories the ingestion pipeline writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Character,
    Location,
    Area,
    Item,
    Event,
    Faction,
    Concept,
}

impl NodeType {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Location => "location",
            Self::Area => "area",
            Self::Item => "item",
            Self::Event => "event",
            Self::Faction => "faction",
            Self::Concept => "concept",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "character" => Ok(Self::Character),
            "location" => Ok(Self::Location),
            "area" => Ok(Self::Area),
            "item" => Ok(Self::Item),
            "event" => Ok(Self::Event),
            "faction" => Ok(Self::Faction),
            "concept" => Ok(Self::Concept),
            _ => Err(format!("unknown node type: {s}")),
        }
    }
}

/// Controlled relation vocabulary for edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    KnowsAbout,
    LocatedIn,
    MemberOf,
    Owns,
    ParticipatedIn,
    Caused,
    RelatedTo,
    /// Synthesized from disposition records at recall time; never persisted
    /// as a graph edge.
    Approves,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KnowsAbout => "knows_about",
            Self::LocatedIn => "located_in",
            Self::MemberOf => "member_of",
            Self::Owns => "owns",
            Self::ParticipatedIn => "participated_in",
            Self::Caused => "caused",
            Self::RelatedTo => "related_to",
            Self::Approves => "approves",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "knows_about" => Ok(Self::KnowsAbout),
            "located_in" => Ok(Self::LocatedIn),
            "member_of" => Ok(Self::MemberOf),
            "owns" => Ok(Self::Owns),
            "participated_in" => Ok(Self::ParticipatedIn),
            "caused" => Ok(Self::Caused),
            "related_to" => Ok(Self::RelatedTo),
            "approves" => Ok(Self::Approves),
            _ => Err(format!("unknown relation: {s}")),
        }
    }
}

/// A knowledge-graph node. Durable and read-only from this subsystem's
/// perspective; owned by the scope that wrote it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique within a merged view; scope-qualified by the ingestion pipeline.
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub name: String,
    /// Authored salience in `[0.0, 1.0]`.
    pub importance: f64,
    /// Chapter this node was authored under, if any.
    pub chapter: Option<String>,
    /// Arbitrary JSON properties from ingestion.
    pub properties: Option<serde_json::Value>,
}

impl Node {
    /// Stub entities created by ingestion for as-yet-unelaborated references.
    /// They participate in traversal but must never surface in recall output.
    pub fn is_placeholder(&self) -> bool {
        self.properties
            .as_ref()
            .and_then(|p| p.get("placeholder"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// A directed, weighted, typed edge. Multiple edges between the same pair
/// with different relations are allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relation: RelationKind,
    /// Association strength in `[0.0, 1.0]`.
    pub weight: f64,
    /// Chapter this edge was authored under, if any.
    pub chapter: Option<String>,
    pub properties: Option<serde_json::Value>,
}

/// Raw node/edge collections for one scope — what a single
/// `GraphStorage::load_graph` returns, before merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
