use std::collections::HashSet;

use eframe::egui::{Color32, Pos2, Rect, vec2};

use crate::config::TopologyConfig;
use crate::entity::{Edge, EntityReference};
use crate::topology::interaction::{TooltipState, ZoomTransform};
use crate::topology::layout::ClusterRegion;
use crate::topology::palette::{self, blend_color, dim_color, entity_style, region_fill};
use crate::util::truncate_label;

const NODE_LABEL_CHARS: usize = 28;

/// One drawable element, in viewport coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneItem {
    Region {
        center: Pos2,
        radius: f32,
        fill: Color32,
        stroke: Color32,
        label: &'static str,
        label_pos: Pos2,
    },
    EdgeLine {
        from: Pos2,
        to: Pos2,
        color: Color32,
        width: f32,
        label: String,
        label_pos: Pos2,
    },
    NodeMark {
        node: usize,
        center: Pos2,
        radius: f32,
        fill: Color32,
        emphasized: bool,
        label: String,
        label_pos: Pos2,
    },
    Tooltip {
        rect: Rect,
        lines: Vec<String>,
    },
}

/// Display list in paint order: regions, edges, nodes, tooltip.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub items: Vec<SceneItem>,
}

impl Scene {
    pub fn region_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, SceneItem::Region { .. }))
            .count()
    }

    pub fn edge_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, SceneItem::EdgeLine { .. }))
            .count()
    }

    pub fn node_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, SceneItem::NodeMark { .. }))
            .count()
    }

    pub fn tooltip(&self) -> Option<&SceneItem> {
        self.items
            .iter()
            .find(|item| matches!(item, SceneItem::Tooltip { .. }))
    }
}

pub struct SceneInput<'a> {
    pub nodes: &'a [EntityReference],
    pub positions: &'a [Pos2],
    pub regions: &'a [ClusterRegion],
    pub edges: &'a [(usize, usize, Edge)],
    pub zoom: ZoomTransform,
    pub tooltip: Option<&'a TooltipState>,
    pub hovered: Option<usize>,
    /// Search matches; `None` when no search is active.
    pub matches: Option<&'a HashSet<usize>>,
    pub config: &'a TopologyConfig,
}

pub fn render_scene(input: &SceneInput<'_>) -> Scene {
    let zoom = input.zoom;
    let mut items = Vec::with_capacity(
        input.regions.len() + input.edges.len() + input.positions.len() + 1,
    );

    for region in input.regions {
        let style = entity_style(region.entity_type);
        let center = zoom.apply(region.centroid);
        let radius = region.radius(input.config) * zoom.scale;
        items.push(SceneItem::Region {
            center,
            radius,
            fill: region_fill(style.color),
            stroke: blend_color(style.color, palette::BACKGROUND, 0.4),
            label: style.label,
            label_pos: center - vec2(0.0, radius - 12.0),
        });
    }

    for (source, target, edge) in input.edges {
        let (Some(from), Some(to)) = (input.positions.get(*source), input.positions.get(*target))
        else {
            continue;
        };

        let incident = input
            .hovered
            .is_some_and(|hovered| hovered == *source || hovered == *target);
        let (color, width) = if incident {
            (palette::EDGE_HIGHLIGHT, 2.2)
        } else {
            (palette::EDGE, 1.2)
        };

        let from = zoom.apply(*from);
        let to = zoom.apply(*to);
        items.push(SceneItem::EdgeLine {
            from,
            to,
            color,
            width,
            label: edge.relationship_type.clone(),
            label_pos: from + (to - from) * 0.5,
        });
    }

    let radius = input.config.node_radius * zoom.scale;
    for (index, (node, position)) in input.nodes.iter().zip(input.positions).enumerate() {
        let base = entity_style(node.entity_type).color;
        let matched = input.matches.is_none_or(|matches| matches.contains(&index));
        let hovered = input.hovered == Some(index);
        let fill = if matched { base } else { dim_color(base, 0.35) };

        let center = zoom.apply(*position);
        items.push(SceneItem::NodeMark {
            node: index,
            center,
            radius,
            fill,
            emphasized: hovered || (matched && input.matches.is_some()),
            label: truncate_label(&node.name, NODE_LABEL_CHARS),
            label_pos: center + vec2(radius + 4.0, 0.0),
        });
    }

    if let Some(tooltip) = input.tooltip {
        items.push(SceneItem::Tooltip {
            rect: tooltip.rect(),
            lines: tooltip.lines(),
        });
    }

    Scene { items }
}
