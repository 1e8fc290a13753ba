use std::f32::consts::TAU;

use eframe::egui::{Pos2, pos2, vec2};

use crate::config::{CanvasSize, TopologyConfig};
use crate::entity::{EntityReference, EntityType};

#[derive(Clone, Debug, PartialEq)]
pub struct ClusterRegion {
    pub entity_type: EntityType,
    pub centroid: Pos2,
    pub member_count: usize,
}

impl ClusterRegion {
    /// Drawn radius only; the integrator never reads it.
    pub fn radius(&self, config: &TopologyConfig) -> f32 {
        config.cluster_radius_base + config.cluster_radius_per_member * self.member_count as f32
    }
}

#[derive(Clone, Debug, Default)]
pub struct ClusterLayout {
    pub regions: Vec<ClusterRegion>,
    /// Per node: index into `regions`.
    pub cluster_of: Vec<usize>,
    /// Per node: fixed cluster anchor.
    pub anchors: Vec<Pos2>,
    /// Per node: initial position.
    pub seeds: Vec<Pos2>,
}

pub fn plan_clusters(
    nodes: &[EntityReference],
    size: CanvasSize,
    config: &TopologyConfig,
) -> ClusterLayout {
    let mut types = Vec::<EntityType>::new();
    let mut cluster_of = Vec::with_capacity(nodes.len());
    for node in nodes {
        let cluster = match types.iter().position(|kind| *kind == node.entity_type) {
            Some(existing) => existing,
            None => {
                types.push(node.entity_type);
                types.len() - 1
            }
        };
        cluster_of.push(cluster);
    }

    let center = pos2(size.width * 0.5, size.height * 0.5);
    let ring_radius = config.cluster_ring_ratio * size.min_side();
    let type_count = types.len().max(1) as f32;

    let mut regions = types
        .iter()
        .enumerate()
        .map(|(index, kind)| {
            let angle = TAU * index as f32 / type_count;
            ClusterRegion {
                entity_type: *kind,
                centroid: center + vec2(angle.cos(), angle.sin()) * ring_radius,
                member_count: 0,
            }
        })
        .collect::<Vec<_>>();

    let mut anchors = Vec::with_capacity(nodes.len());
    let mut seeds = Vec::with_capacity(nodes.len());
    for (index, &cluster) in cluster_of.iter().enumerate() {
        let region = &mut regions[cluster];
        region.member_count += 1;
        anchors.push(region.centroid);

        // Keeps same-type nodes from starting on one point.
        let jitter = vec2(
            (index % 5) as f32 * config.seed_step_x,
            (index % 7) as f32 * config.seed_step_y,
        );
        seeds.push(region.centroid + jitter);
    }

    ClusterLayout {
        regions,
        cluster_of,
        anchors,
        seeds,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn entity(kind: EntityType, id: &str) -> EntityReference {
        EntityReference::new(kind, id, id.to_uppercase())
    }

    fn approx(a: Pos2, b: Pos2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn one_region_per_type_in_first_seen_order() {
        let nodes = vec![
            entity(EntityType::Control, "c1"),
            entity(EntityType::Risk, "r1"),
            entity(EntityType::Control, "c2"),
        ];
        let layout = plan_clusters(&nodes, CanvasSize::default(), &TopologyConfig::default());

        let kinds = layout
            .regions
            .iter()
            .map(|region| (region.entity_type, region.member_count))
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec![(EntityType::Control, 2), (EntityType::Risk, 1)]);
        assert_eq!(layout.cluster_of, vec![0, 1, 0]);
    }

    #[test]
    fn anchors_sit_evenly_on_the_ring() {
        let nodes = vec![
            entity(EntityType::Risk, "r"),
            entity(EntityType::Control, "c"),
            entity(EntityType::Policy, "p"),
            entity(EntityType::Asset, "a"),
        ];
        let size = CanvasSize::default();
        let layout = plan_clusters(&nodes, size, &TopologyConfig::default());

        let center = pos2(200.0, 150.0);
        let radius = 0.28 * 300.0;
        assert!(approx(layout.regions[0].centroid, pos2(200.0 + radius, 150.0)));
        assert!(approx(layout.regions[1].centroid, pos2(200.0, 150.0 + radius)));
        assert!(approx(layout.regions[2].centroid, pos2(200.0 - radius, 150.0)));
        for region in &layout.regions {
            assert!(((region.centroid - center).length() - radius).abs() < 1e-3);
        }
    }

    #[test]
    fn seeds_are_deterministic_and_distinct_within_a_type() {
        let nodes = (0..6)
            .map(|index| entity(EntityType::Risk, &format!("r{index}")))
            .collect::<Vec<_>>();
        let config = TopologyConfig::default();
        let first = plan_clusters(&nodes, CanvasSize::default(), &config);
        let second = plan_clusters(&nodes, CanvasSize::default(), &config);
        assert_eq!(first.seeds, second.seeds);

        let anchor = first.regions[0].centroid;
        assert!(approx(first.seeds[0], anchor));
        assert!(approx(first.seeds[3], anchor + vec2(24.0, 18.0)));
        assert!(approx(first.seeds[5], anchor + vec2(0.0, 30.0)));
        for (i, a) in first.seeds.iter().enumerate() {
            for b in first.seeds.iter().skip(i + 1) {
                assert!(!approx(*a, *b));
            }
        }
    }

    #[test]
    fn region_radius_grows_with_members() {
        let region = ClusterRegion {
            entity_type: EntityType::Risk,
            centroid: Pos2::ZERO,
            member_count: 3,
        };
        assert_eq!(region.radius(&TopologyConfig::default()), 88.0);
    }

    #[test]
    fn empty_input_plans_nothing() {
        let layout = plan_clusters(&[], CanvasSize::default(), &TopologyConfig::default());
        assert!(layout.regions.is_empty());
        assert!(layout.seeds.is_empty());
    }
}
