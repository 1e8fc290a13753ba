use std::collections::HashSet;

use eframe::egui::{self, RichText, Ui};
use entity_topology::topology::matrix::{EMPTY_MATRIX_MESSAGE, RelationshipMatrix, RowEndpoint};
use entity_topology::topology::palette::entity_style;
use entity_topology::util::truncate_label;

use super::super::ViewModel;

const CELL_CHARS: usize = 36;

impl ViewModel {
    /// Returns the cell clicked this frame, if any.
    pub(in crate::app) fn draw_matrix(
        ui: &mut Ui,
        matrix: &RelationshipMatrix,
        matches: Option<&HashSet<usize>>,
    ) -> Option<(usize, RowEndpoint)> {
        if matrix.is_empty() {
            ui.label(EMPTY_MATRIX_MESSAGE);
            return None;
        }

        ui.label(format!(
            "{} relationships; too many entities for the spatial view.",
            matrix.len()
        ));
        ui.add_space(6.0);

        let mut activated = None;
        let mut shown = 0usize;
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                egui::Grid::new("relationship_matrix")
                    .num_columns(3)
                    .striped(true)
                    .show(ui, |ui| {
                        ui.label(RichText::new("Source").strong());
                        ui.label(RichText::new("Relationship").strong());
                        ui.label(RichText::new("Target").strong());
                        ui.end_row();

                        for (index, row) in matrix.visible_rows(matches) {
                            shown += 1;
                            let source = RichText::new(truncate_label(&row.source.name, CELL_CHARS))
                                .color(entity_style(row.source.entity_type).color);
                            if ui.link(source).on_hover_text(row.source.id.as_str()).clicked() {
                                activated = Some((index, RowEndpoint::Source));
                            }
                            ui.label(row.relationship_type.as_str());
                            let target = RichText::new(truncate_label(&row.target.name, CELL_CHARS))
                                .color(entity_style(row.target.entity_type).color);
                            if ui.link(target).on_hover_text(row.target.id.as_str()).clicked() {
                                activated = Some((index, RowEndpoint::Target));
                            }
                            ui.end_row();
                        }
                    });

                if shown == 0 {
                    ui.label("No relationships match the current search.");
                }
            });

        activated
    }
}
