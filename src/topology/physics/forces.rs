use std::f32::consts::TAU;

use eframe::egui::{Pos2, Vec2, vec2};

#[derive(Clone, Copy, Debug)]
pub(super) struct Link {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) strength: f32,
    /// Share of the correction applied to the target.
    pub(super) bias: f32,
}

/// Builds spring links, weighting each by the endpoints' degrees so hubs
/// are not yanked around by their many neighbours.
pub(super) fn build_links(node_count: usize, edges: &[(usize, usize)]) -> Vec<Link> {
    let mut degree = vec![0usize; node_count];
    for &(source, target) in edges {
        if source == target || source >= node_count || target >= node_count {
            continue;
        }
        degree[source] += 1;
        degree[target] += 1;
    }

    edges
        .iter()
        .filter(|(source, target)| source != target && *source < node_count && *target < node_count)
        .map(|&(source, target)| {
            let (source_degree, target_degree) = (degree[source] as f32, degree[target] as f32);
            Link {
                source,
                target,
                strength: 1.0 / source_degree.min(target_degree),
                bias: source_degree / (source_degree + target_degree),
            }
        })
        .collect()
}

fn fallback_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * TAU;
    vec2(angle.cos(), angle.sin())
}

pub(super) fn apply_charge(positions: &[Pos2], velocities: &mut [Vec2], strength: f32, alpha: f32) {
    if strength == 0.0 {
        return;
    }

    for (index, velocity) in velocities.iter_mut().enumerate() {
        let point = positions[index];
        for (other_index, other) in positions.iter().enumerate() {
            if other_index == index {
                continue;
            }

            let mut delta = *other - point;
            let mut distance_sq = delta.length_sq();
            if distance_sq <= 1e-12 {
                delta = fallback_direction(index.min(other_index), index.max(other_index));
                if index > other_index {
                    delta = -delta;
                }
                distance_sq = 1.0;
            } else if distance_sq < 1.0 {
                distance_sq = distance_sq.sqrt();
            }

            *velocity += delta * (strength * alpha / distance_sq);
        }
    }
}

pub(super) fn apply_links(
    links: &[Link],
    positions: &[Pos2],
    velocities: &mut [Vec2],
    distance: f32,
    alpha: f32,
) {
    for link in links {
        let (source, target) = (link.source, link.target);
        let mut delta = (positions[target] + velocities[target]) - (positions[source] + velocities[source]);
        let mut length = delta.length();
        if length <= 1e-6 {
            delta = fallback_direction(source, target) * 1e-6;
            length = 1e-6;
        }

        let correction = delta * ((length - distance) / length * alpha * link.strength);
        velocities[target] -= correction * link.bias;
        velocities[source] += correction * (1.0 - link.bias);
    }
}

/// Shifts every position so the mean moves toward `center`.
pub(super) fn apply_center(positions: &mut [Pos2], center: Pos2, strength: f32) {
    if positions.is_empty() || strength == 0.0 {
        return;
    }

    let mut sum = Vec2::ZERO;
    for position in positions.iter() {
        sum += position.to_vec2();
    }
    let mean = (sum / positions.len() as f32).to_pos2();
    let shift = (center - mean) * strength;
    for position in positions.iter_mut() {
        *position += shift;
    }
}

pub(super) fn apply_cluster_pull(
    positions: &[Pos2],
    anchors: &[Pos2],
    velocities: &mut [Vec2],
    strength: f32,
    alpha: f32,
) {
    for ((position, anchor), velocity) in positions.iter().zip(anchors).zip(velocities.iter_mut()) {
        *velocity += (*anchor - *position) * (strength * alpha);
    }
}

/// Moves free bodies by their decayed velocity; pinned bodies snap to the pin.
pub(super) fn integrate(
    positions: &mut [Pos2],
    velocities: &mut [Vec2],
    pins: &[Option<Pos2>],
    velocity_decay: f32,
) {
    let retain = 1.0 - velocity_decay;
    for ((position, velocity), pin) in positions.iter_mut().zip(velocities.iter_mut()).zip(pins) {
        if let Some(pin) = pin {
            *position = *pin;
            *velocity = Vec2::ZERO;
        } else {
            *velocity *= retain;
            *position += *velocity;
        }
    }
}
