use eframe::egui::{
    self, Align2, FontId, Painter, PointerButton, Pos2, Rect, Response, Sense, Stroke, Ui, vec2,
};
use entity_topology::TopologyView;
use entity_topology::topology::interaction::PointerEvent;
use entity_topology::topology::palette;
use entity_topology::topology::scene::{Scene, SceneItem};

use super::ViewModel;

const TOOLTIP_PADDING: f32 = 8.0;
const TOOLTIP_LINE_HEIGHT: f32 = 16.0;

fn paint_scene(painter: &Painter, rect: Rect, scene: &Scene) {
    let offset = rect.min.to_vec2();
    for item in &scene.items {
        match item {
            SceneItem::Region {
                center,
                radius,
                fill,
                stroke,
                label,
                label_pos,
            } => {
                painter.circle(*center + offset, *radius, *fill, Stroke::new(1.0, *stroke));
                painter.text(
                    *label_pos + offset,
                    Align2::CENTER_TOP,
                    *label,
                    FontId::proportional(12.0),
                    palette::LABEL,
                );
            }
            SceneItem::EdgeLine {
                from,
                to,
                color,
                width,
                label,
                label_pos,
            } => {
                painter.line_segment([*from + offset, *to + offset], Stroke::new(*width, *color));
                painter.text(
                    *label_pos + offset,
                    Align2::CENTER_CENTER,
                    label,
                    FontId::proportional(10.0),
                    palette::EDGE_LABEL,
                );
            }
            SceneItem::NodeMark {
                center,
                radius,
                fill,
                emphasized,
                label,
                label_pos,
                ..
            } => {
                let stroke = if *emphasized {
                    Stroke::new(2.0, palette::LABEL)
                } else {
                    Stroke::NONE
                };
                painter.circle(*center + offset, *radius, *fill, stroke);
                painter.text(
                    *label_pos + offset,
                    Align2::LEFT_CENTER,
                    label,
                    FontId::proportional(11.0),
                    palette::LABEL,
                );
            }
            SceneItem::Tooltip { rect: tip, lines } => {
                let tip = tip.translate(offset);
                painter.rect_filled(tip, 4.0, palette::TOOLTIP_FILL);
                for (row, line) in lines.iter().enumerate() {
                    let at = tip.min
                        + vec2(TOOLTIP_PADDING, TOOLTIP_PADDING + row as f32 * TOOLTIP_LINE_HEIGHT);
                    painter.text(
                        at,
                        Align2::LEFT_TOP,
                        line,
                        FontId::proportional(12.0),
                        palette::LABEL,
                    );
                }
            }
        }
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_canvas(&mut self, ui: &mut Ui) {
        let size = self.topology.size();
        let (rect, response) =
            ui.allocate_exact_size(vec2(size.width, size.height), Sense::click_and_drag());

        for event in self.pointer_events(ui, rect, &response) {
            self.topology.handle_pointer(event);
        }
        self.topology.on_frame();

        if self.topology.tooltip().is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, palette::BACKGROUND);
        if let TopologyView::Spatial(scene) = self.topology.view() {
            paint_scene(&painter, rect, &scene);
        }
    }

    /// Translates this frame's egui input into canvas-local pointer events.
    fn pointer_events(&mut self, ui: &Ui, rect: Rect, response: &Response) -> Vec<PointerEvent> {
        let local = |pos: Pos2| pos - rect.min.to_vec2();
        let mut events = Vec::new();

        match (ui.input(|input| input.multi_touch()), self.pinching) {
            (Some(touch), false) if response.contains_pointer() => {
                self.pinching = true;
                events.push(PointerEvent::PinchStart(local(touch.start_pos)));
                events.push(PointerEvent::Pinch {
                    factor: touch.zoom_delta,
                });
            }
            (Some(touch), true) => events.push(PointerEvent::Pinch {
                factor: touch.zoom_delta,
            }),
            (None, true) => {
                self.pinching = false;
                events.push(PointerEvent::PinchEnd);
            }
            _ => {}
        }
        if self.pinching {
            return events;
        }

        let (latest, press_origin, scroll) = ui.input(|input| {
            (
                input.pointer.latest_pos().map(local),
                input.pointer.press_origin().map(local),
                input.raw_scroll_delta.y,
            )
        });

        if response.clicked_by(PointerButton::Primary) {
            if let (Some(origin), Some(at)) = (press_origin.or(latest), latest) {
                events.push(PointerEvent::Down(origin));
                events.push(PointerEvent::Up(at));
            }
        } else {
            if response.drag_started_by(PointerButton::Primary)
                && let Some(origin) = press_origin.or(latest)
            {
                events.push(PointerEvent::Down(origin));
            }
            if response.dragged_by(PointerButton::Primary)
                && let Some(at) = latest
            {
                events.push(PointerEvent::Move(at));
            }
            if response.drag_stopped_by(PointerButton::Primary)
                && let Some(at) = latest
            {
                events.push(PointerEvent::Up(at));
            }
        }

        if response.dragged() {
            return events;
        }

        match response.hover_pos() {
            Some(at) => {
                self.pointer_inside = true;
                events.push(PointerEvent::Move(local(at)));
                if scroll.abs() > f32::EPSILON {
                    events.push(PointerEvent::Wheel {
                        at: local(at),
                        delta: scroll,
                    });
                }
            }
            None if self.pointer_inside => {
                self.pointer_inside = false;
                events.push(PointerEvent::Leave);
            }
            None => {}
        }

        events
    }
}
