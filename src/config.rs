//! Tunables for layout, simulation and interaction.

use serde::Deserialize;

use crate::error::{Result, TopologyError};

/// Drawing surface extent in layout units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    pub const DEFAULT: Self = Self {
        width: 400.0,
        height: 300.0,
    };

    pub fn new(width: f32, height: f32) -> Result<Self> {
        if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
            return Err(TopologyError::InvalidCanvasSize { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn min_side(self) -> f32 {
        self.width.min(self.height)
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Graphs with more nodes than this are drawn as a relationship matrix.
    pub matrix_threshold: usize,
    pub cluster_ring_ratio: f32,
    pub seed_step_x: f32,
    pub seed_step_y: f32,
    pub cluster_radius_base: f32,
    pub cluster_radius_per_member: f32,
    /// Negative values repel.
    pub charge_strength: f32,
    pub link_distance: f32,
    pub center_strength: f32,
    pub cluster_strength: f32,
    pub velocity_decay: f32,
    pub alpha_decay: f32,
    pub alpha_min: f32,
    pub drag_alpha_target: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub tooltip_margin: f32,
    pub tooltip_max_attributes: usize,
    pub node_radius: f32,
    pub click_slop: f32,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            matrix_threshold: 50,
            cluster_ring_ratio: 0.28,
            seed_step_x: 8.0,
            seed_step_y: 6.0,
            cluster_radius_base: 64.0,
            cluster_radius_per_member: 8.0,
            charge_strength: -300.0,
            link_distance: 100.0,
            center_strength: 1.0,
            cluster_strength: 0.15,
            velocity_decay: 0.4,
            // Cools from 1.0 to `alpha_min` in roughly 300 ticks.
            alpha_decay: 1.0 - 0.001_f32.powf(1.0 / 300.0),
            alpha_min: 0.001,
            drag_alpha_target: 0.3,
            min_scale: 0.4,
            max_scale: 3.2,
            tooltip_margin: 8.0,
            tooltip_max_attributes: 3,
            node_radius: 10.0,
            click_slop: 3.0,
        }
    }
}

impl TopologyConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).map_err(TopologyError::ConfigJson)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(TopologyError::InvalidConfig(message));

        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale) {
            return invalid(format!(
                "scale range [{}, {}] must be positive and ordered",
                self.min_scale, self.max_scale
            ));
        }
        if self.link_distance <= 0.0 {
            return invalid(format!(
                "link_distance must be positive, got {}",
                self.link_distance
            ));
        }
        if !(0.0..=1.0).contains(&self.velocity_decay) {
            return invalid(format!(
                "velocity_decay must be within [0, 1], got {}",
                self.velocity_decay
            ));
        }
        if !(0.0..=1.0).contains(&self.alpha_decay) {
            return invalid(format!(
                "alpha_decay must be within [0, 1], got {}",
                self.alpha_decay
            ));
        }
        if self.node_radius <= 0.0 {
            return invalid(format!(
                "node_radius must be positive, got {}",
                self.node_radius
            ));
        }
        if self.tooltip_margin < 0.0 {
            return invalid(format!(
                "tooltip_margin must not be negative, got {}",
                self.tooltip_margin
            ));
        }

        Ok(())
    }

    pub fn clamp_scale(&self, scale: f32) -> f32 {
        if scale.is_nan() {
            return self.min_scale;
        }
        scale.clamp(self.min_scale, self.max_scale)
    }
}
