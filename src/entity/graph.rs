use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Risk,
    Control,
    Policy,
    Asset,
    Vendor,
    Incident,
    Vulnerability,
    Threat,
    Finding,
    Evidence,
    Framework,
    Requirement,
    Audit,
    Issue,
    Exception,
    Process,
    Application,
    System,
    Dataset,
    Person,
    Team,
    Department,
    Location,
    Contract,
    Regulation,
}

impl EntityType {
    pub const ALL: [Self; 25] = [
        Self::Risk,
        Self::Control,
        Self::Policy,
        Self::Asset,
        Self::Vendor,
        Self::Incident,
        Self::Vulnerability,
        Self::Threat,
        Self::Finding,
        Self::Evidence,
        Self::Framework,
        Self::Requirement,
        Self::Audit,
        Self::Issue,
        Self::Exception,
        Self::Process,
        Self::Application,
        Self::System,
        Self::Dataset,
        Self::Person,
        Self::Team,
        Self::Department,
        Self::Location,
        Self::Contract,
        Self::Regulation,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Risk => "risk",
            Self::Control => "control",
            Self::Policy => "policy",
            Self::Asset => "asset",
            Self::Vendor => "vendor",
            Self::Incident => "incident",
            Self::Vulnerability => "vulnerability",
            Self::Threat => "threat",
            Self::Finding => "finding",
            Self::Evidence => "evidence",
            Self::Framework => "framework",
            Self::Requirement => "requirement",
            Self::Audit => "audit",
            Self::Issue => "issue",
            Self::Exception => "exception",
            Self::Process => "process",
            Self::Application => "application",
            Self::System => "system",
            Self::Dataset => "dataset",
            Self::Person => "person",
            Self::Team => "team",
            Self::Department => "department",
            Self::Location => "location",
            Self::Contract => "contract",
            Self::Regulation => "regulation",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EntityReference {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub attributes: Option<BTreeMap<String, Value>>,
}

impl EntityReference {
    pub fn new(entity_type: EntityType, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            entity_type,
            id: id.into(),
            name: name.into(),
            attributes: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Two references name the same entity iff type and id both match.
    pub fn same_entity(&self, other: &Self) -> bool {
        self.entity_type == other.entity_type && self.id == other.id
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Edge {
    pub source: EntityReference,
    pub target: EntityReference,
    #[serde(rename = "relationshipType")]
    pub relationship_type: String,
}

impl Edge {
    pub fn new(
        source: &EntityReference,
        target: &EntityReference,
        relationship_type: impl Into<String>,
    ) -> Self {
        Self {
            source: source.clone(),
            target: target.clone(),
            relationship_type: relationship_type.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<EntityReference>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// A graph with one node per distinct id and only resolvable edges.
///
/// `edges` keeps the original edge order and stores endpoint indices into
/// `nodes` next to the original edge.
#[derive(Clone, Debug, Default)]
pub struct SanitizedGraph {
    pub nodes: Vec<EntityReference>,
    pub edges: Vec<(usize, usize, Edge)>,
    pub index_by_id: HashMap<String, usize>,
    pub input_node_count: usize,
    pub dropped_edges: usize,
}

impl Graph {
    pub fn sanitize(&self) -> SanitizedGraph {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut index_by_id = HashMap::with_capacity(self.nodes.len());

        for node in &self.nodes {
            if index_by_id.contains_key(&node.id) {
                continue;
            }
            index_by_id.insert(node.id.clone(), nodes.len());
            nodes.push(node.clone());
        }

        let mut edges = Vec::with_capacity(self.edges.len());
        let mut dropped_edges = 0usize;
        for edge in &self.edges {
            match (
                index_by_id.get(&edge.source.id),
                index_by_id.get(&edge.target.id),
            ) {
                (Some(&source), Some(&target)) => edges.push((source, target, edge.clone())),
                _ => dropped_edges += 1,
            }
        }

        if dropped_edges > 0 {
            tracing::debug!(dropped_edges, "dropped edges with unknown endpoints");
        }

        SanitizedGraph {
            nodes,
            edges,
            index_by_id,
            input_node_count: self.nodes.len(),
            dropped_edges,
        }
    }
}
