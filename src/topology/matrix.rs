use std::collections::HashSet;

use crate::entity::{EntityReference, SanitizedGraph};

pub const EMPTY_MATRIX_MESSAGE: &str = "No relationships to display.";

#[derive(Clone, Debug, PartialEq)]
pub struct MatrixRow {
    pub source: EntityReference,
    pub relationship_type: String,
    pub target: EntityReference,
    pub source_index: usize,
    pub target_index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowEndpoint {
    Source,
    Target,
}

/// Tabular stand-in for graphs too dense to draw: one row per edge.
#[derive(Clone, Debug, Default)]
pub struct RelationshipMatrix {
    rows: Vec<MatrixRow>,
}

impl RelationshipMatrix {
    pub fn build(graph: &SanitizedGraph) -> Self {
        let mut rows = graph
            .edges
            .iter()
            .map(|(source_index, target_index, edge)| MatrixRow {
                source: edge.source.clone(),
                relationship_type: edge.relationship_type.clone(),
                target: edge.target.clone(),
                source_index: *source_index,
                target_index: *target_index,
            })
            .collect::<Vec<_>>();
        // Stable: equal relationship types keep edge order.
        rows.sort_by(|a, b| a.relationship_type.cmp(&b.relationship_type));
        Self { rows }
    }

    pub fn rows(&self) -> &[MatrixRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Rows with at least one endpoint among `matches`; all rows when `None`.
    pub fn visible_rows<'a>(
        &'a self,
        matches: Option<&'a HashSet<usize>>,
    ) -> impl Iterator<Item = (usize, &'a MatrixRow)> + 'a {
        self.rows.iter().enumerate().filter(move |(_, row)| {
            matches.is_none_or(|matches| {
                matches.contains(&row.source_index) || matches.contains(&row.target_index)
            })
        })
    }

    /// Node index behind a clicked cell, for lookup in the sanitized node list.
    pub fn endpoint_index(&self, row: usize, endpoint: RowEndpoint) -> Option<usize> {
        let row = self.rows.get(row)?;
        Some(match endpoint {
            RowEndpoint::Source => row.source_index,
            RowEndpoint::Target => row.target_index,
        })
    }
}
