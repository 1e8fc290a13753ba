//! Pointer handling for the spatial view: node drag, pan/zoom and hover.

use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

use crate::config::{CanvasSize, TopologyConfig};
use crate::entity::EntityReference;
use crate::topology::frames::FrameScheduler;
use crate::topology::palette::entity_style;
use crate::topology::physics::Simulation;
use crate::util::format_attribute_value;

const TOOLTIP_OFFSET: Vec2 = vec2(12.0, 12.0);
const TOOLTIP_CHAR_WIDTH: f32 = 7.0;
const TOOLTIP_LINE_HEIGHT: f32 = 16.0;
const TOOLTIP_PADDING: f32 = 8.0;
const WHEEL_ZOOM_RATE: f32 = 0.002;

/// The only way pointer handling touches node positions.
pub trait DragTarget {
    fn node_at(&self, world: Pos2, radius: f32) -> Option<usize>;
    fn pin(&mut self, index: usize, at: Pos2) -> bool;
    fn unpin(&mut self, index: usize);
    fn set_alpha_target(&mut self, target: f32);
}

impl<S: FrameScheduler> DragTarget for Simulation<S> {
    fn node_at(&self, world: Pos2, radius: f32) -> Option<usize> {
        let radius_sq = radius * radius;
        self.positions()
            .iter()
            .enumerate()
            .filter_map(|(index, position)| {
                let distance_sq = (*position - world).length_sq();
                (distance_sq <= radius_sq).then_some((index, distance_sq))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    fn pin(&mut self, index: usize, at: Pos2) -> bool {
        Simulation::pin(self, index, at)
    }

    fn unpin(&mut self, index: usize) {
        Simulation::unpin(self, index);
    }

    fn set_alpha_target(&mut self, target: f32) {
        Simulation::set_alpha_target(self, target);
    }
}

/// Scale and translation applied to the drawn scene: `screen = world * scale + translate`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomTransform {
    pub scale: f32,
    pub translate: Vec2,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate: Vec2::ZERO,
    };

    pub fn apply(self, world: Pos2) -> Pos2 {
        (world.to_vec2() * self.scale + self.translate).to_pos2()
    }

    pub fn invert(self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.translate) / self.scale).to_pos2()
    }

    /// Keeps the visible area inside `extent`; when the viewport shows more
    /// than the extent, the extent is centred instead.
    pub fn constrained(self, viewport: CanvasSize, extent: Rect) -> Self {
        let top_left = self.invert(Pos2::ZERO);
        let bottom_right = self.invert(pos2(viewport.width, viewport.height));

        let axis = |low_gap: f32, high_gap: f32| {
            if high_gap > low_gap {
                (low_gap + high_gap) * 0.5
            } else if low_gap < 0.0 {
                low_gap
            } else {
                high_gap.max(0.0)
            }
        };

        let shift = vec2(
            axis(top_left.x - extent.min.x, bottom_right.x - extent.max.x),
            axis(top_left.y - extent.min.y, bottom_right.y - extent.max.y),
        );

        Self {
            scale: self.scale,
            translate: self.translate + shift * self.scale,
        }
    }

    /// Rescales around a fixed screen point.
    pub fn scaled_about(self, scale: f32, anchor: Pos2) -> Self {
        let world = self.invert(anchor);
        Self {
            scale,
            translate: anchor.to_vec2() - world.to_vec2() * scale,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TooltipState {
    pub node: usize,
    pub entity: EntityReference,
    pub attributes: Vec<(String, String)>,
    /// Top-left corner in viewport coordinates.
    pub screen: Pos2,
    pub size: Vec2,
}

impl TooltipState {
    pub fn new(
        node: usize,
        entity: &EntityReference,
        pointer: Pos2,
        viewport: CanvasSize,
        config: &TopologyConfig,
    ) -> Self {
        let attributes = entity
            .attributes
            .iter()
            .flatten()
            .take(config.tooltip_max_attributes)
            .map(|(key, value)| (key.clone(), format_attribute_value(value)))
            .collect::<Vec<_>>();

        let mut tooltip = Self {
            node,
            entity: entity.clone(),
            attributes,
            screen: Pos2::ZERO,
            size: Vec2::ZERO,
        };
        tooltip.size = tooltip.estimate_size();
        tooltip.screen = tooltip.place(pointer, viewport, config.tooltip_margin);
        tooltip
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.attributes.len() + 2);
        lines.push(self.entity.name.clone());
        lines.push(format!(
            "{} · {}",
            entity_style(self.entity.entity_type).label,
            self.entity.id
        ));
        lines.extend(
            self.attributes
                .iter()
                .map(|(key, value)| format!("{key}: {value}")),
        );
        lines
    }

    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.screen, self.size)
    }

    fn estimate_size(&self) -> Vec2 {
        let lines = self.lines();
        let widest = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        vec2(
            widest as f32 * TOOLTIP_CHAR_WIDTH + TOOLTIP_PADDING * 2.0,
            lines.len() as f32 * TOOLTIP_LINE_HEIGHT + TOOLTIP_PADDING * 2.0,
        )
    }

    fn place(&self, pointer: Pos2, viewport: CanvasSize, margin: f32) -> Pos2 {
        let clamp_axis = |value: f32, extent: f32, size: f32| {
            let max = (extent - margin - size).max(margin);
            if value.is_nan() {
                margin
            } else {
                value.clamp(margin, max)
            }
        };

        let wanted = pointer + TOOLTIP_OFFSET;
        pos2(
            clamp_axis(wanted.x, viewport.width, self.size.x),
            clamp_axis(wanted.y, viewport.height, self.size.y),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InteractionState {
    Idle,
    Dragging {
        node: usize,
        origin: Pos2,
        travelled: f32,
    },
    Panning {
        last: Pos2,
    },
    Zooming {
        anchor: Pos2,
    },
}

/// Pointer input in viewport coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(Pos2),
    Move(Pos2),
    Up(Pos2),
    Leave,
    Wheel { at: Pos2, delta: f32 },
    PinchStart(Pos2),
    Pinch { factor: f32 },
    PinchEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The event is not legal in the current state.
    Ignored,
    Handled,
    /// Press and release on the same node without dragging it.
    Activated(usize),
}

pub struct InteractionController {
    state: InteractionState,
    zoom: ZoomTransform,
    tooltip: Option<TooltipState>,
    viewport: CanvasSize,
    config: TopologyConfig,
}

impl InteractionController {
    pub fn new(viewport: CanvasSize, config: &TopologyConfig) -> Self {
        Self {
            state: InteractionState::Idle,
            zoom: ZoomTransform::IDENTITY,
            tooltip: None,
            viewport,
            config: config.clone(),
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn zoom(&self) -> ZoomTransform {
        self.zoom
    }

    pub fn tooltip(&self) -> Option<&TooltipState> {
        self.tooltip.as_ref()
    }

    pub fn hovered(&self) -> Option<usize> {
        self.tooltip.as_ref().map(|tooltip| tooltip.node)
    }

    pub fn dragged(&self) -> Option<usize> {
        match self.state {
            InteractionState::Dragging { node, .. } => Some(node),
            _ => None,
        }
    }

    fn extent(&self) -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(self.viewport.width, self.viewport.height))
    }

    fn commit_zoom(&mut self, zoom: ZoomTransform) {
        self.zoom = zoom.constrained(self.viewport, self.extent());
    }

    /// Scales around `anchor`, clamping to the configured scale range.
    pub fn zoom_to(&mut self, scale: f32, anchor: Pos2) {
        let scale = self.config.clamp_scale(scale);
        self.commit_zoom(self.zoom.scaled_about(scale, anchor));
    }

    /// Scales around the viewport centre.
    pub fn set_scale(&mut self, scale: f32) {
        let center = pos2(self.viewport.width * 0.5, self.viewport.height * 0.5);
        self.zoom_to(scale, center);
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        let mut zoom = self.zoom;
        zoom.translate += delta;
        self.commit_zoom(zoom);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = ZoomTransform::IDENTITY;
    }

    fn update_hover<T: DragTarget>(
        &mut self,
        pointer: Pos2,
        target: &T,
        nodes: &[EntityReference],
    ) {
        let world = self.zoom.invert(pointer);
        let hit = target
            .node_at(world, self.config.node_radius)
            .filter(|&index| index < nodes.len());

        match hit {
            Some(index) if self.hovered() == Some(index) => {}
            Some(index) => {
                self.tooltip = Some(TooltipState::new(
                    index,
                    &nodes[index],
                    pointer,
                    self.viewport,
                    &self.config,
                ));
            }
            None => self.tooltip = None,
        }
    }

    fn end_drag<T: DragTarget>(&mut self, node: usize, target: &mut T) {
        target.unpin(node);
        target.set_alpha_target(0.0);
        self.state = InteractionState::Idle;
    }

    pub fn handle<T: DragTarget>(
        &mut self,
        event: PointerEvent,
        target: &mut T,
        nodes: &[EntityReference],
    ) -> Transition {
        match (self.state, event) {
            (InteractionState::Idle, PointerEvent::Down(at)) => {
                let world = self.zoom.invert(at);
                match target.node_at(world, self.config.node_radius) {
                    Some(node) => {
                        target.pin(node, world);
                        target.set_alpha_target(self.config.drag_alpha_target);
                        self.tooltip = None;
                        self.state = InteractionState::Dragging {
                            node,
                            origin: at,
                            travelled: 0.0,
                        };
                    }
                    None => self.state = InteractionState::Panning { last: at },
                }
                Transition::Handled
            }
            (InteractionState::Idle, PointerEvent::Move(at)) => {
                self.update_hover(at, target, nodes);
                Transition::Handled
            }
            (InteractionState::Idle, PointerEvent::Leave) => {
                self.tooltip = None;
                Transition::Handled
            }
            (InteractionState::Idle, PointerEvent::Wheel { at, delta }) => {
                let scale = self.zoom.scale * 2.0_f32.powf(delta * WHEEL_ZOOM_RATE);
                self.zoom_to(scale, at);
                Transition::Handled
            }
            (InteractionState::Idle, PointerEvent::PinchStart(anchor)) => {
                self.tooltip = None;
                self.state = InteractionState::Zooming { anchor };
                Transition::Handled
            }
            (
                InteractionState::Dragging {
                    node,
                    origin,
                    travelled,
                },
                PointerEvent::Move(at),
            ) => {
                target.pin(node, self.zoom.invert(at));
                self.state = InteractionState::Dragging {
                    node,
                    origin,
                    travelled: travelled.max((at - origin).length()),
                };
                Transition::Handled
            }
            (
                InteractionState::Dragging {
                    node,
                    origin,
                    travelled,
                },
                PointerEvent::Up(at),
            ) => {
                self.end_drag(node, target);
                let travelled = travelled.max((at - origin).length());
                if travelled <= self.config.click_slop {
                    Transition::Activated(node)
                } else {
                    Transition::Handled
                }
            }
            (InteractionState::Dragging { node, .. }, PointerEvent::Leave) => {
                self.end_drag(node, target);
                Transition::Handled
            }
            (InteractionState::Panning { last }, PointerEvent::Move(at)) => {
                self.pan_by(at - last);
                self.state = InteractionState::Panning { last: at };
                Transition::Handled
            }
            (InteractionState::Panning { .. }, PointerEvent::Up(_) | PointerEvent::Leave) => {
                self.state = InteractionState::Idle;
                Transition::Handled
            }
            (InteractionState::Zooming { anchor }, PointerEvent::Pinch { factor }) => {
                if factor.is_finite() && factor > 0.0 {
                    self.zoom_to(self.zoom.scale * factor, anchor);
                }
                Transition::Handled
            }
            (InteractionState::Zooming { .. }, PointerEvent::PinchEnd | PointerEvent::Leave) => {
                self.state = InteractionState::Idle;
                Transition::Handled
            }
            _ => Transition::Ignored,
        }
    }
}
