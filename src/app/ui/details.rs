use eframe::egui::{self, RichText, Ui};
use entity_topology::topology::palette::entity_style;
use entity_topology::util::format_attribute_value;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let selected = self.selected.borrow();
        let Some(entity) = selected.as_ref() else {
            ui.label("Click an entity in the graph or matrix.");
            return;
        };

        let style = entity_style(entity.entity_type);
        ui.label(RichText::new(entity.name.as_str()).strong());
        ui.label(RichText::new(style.label).color(style.color));
        ui.small(entity.id.as_str());

        let graph = self.topology.graph();
        if let Some(&index) = graph.index_by_id.get(&entity.id) {
            let degree = graph
                .edges
                .iter()
                .filter(|(source, target, _)| *source == index || *target == index)
                .count();
            ui.label(format!("Relationships: {degree}"));
        }

        ui.separator();
        ui.label(RichText::new("Attributes").strong());
        match entity.attributes.as_ref().filter(|attributes| !attributes.is_empty()) {
            Some(attributes) => {
                egui::Grid::new("selected_attributes")
                    .num_columns(2)
                    .show(ui, |ui| {
                        for (key, value) in attributes {
                            ui.label(key.as_str());
                            ui.label(format_attribute_value(value));
                            ui.end_row();
                        }
                    });
            }
            None => {
                ui.label("No attributes.");
            }
        }
    }
}
