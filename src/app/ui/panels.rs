use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use eframe::egui::{self, Align, Context, Layout};
use entity_topology::topology::frames::EguiFrames;
use entity_topology::{CanvasSize, Graph, RenderMode, Topology, TopologyConfig, TopologyView};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn new(
        ctx: &Context,
        graph: &Graph,
        canvas: CanvasSize,
        config: &TopologyConfig,
    ) -> Self {
        let mut topology = Topology::new(graph, canvas, config, EguiFrames::new(ctx.clone()));
        let selected = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&selected);
        topology.set_on_node_click(move |entity| {
            tracing::info!(entity_id = %entity.id, entity_type = entity.entity_type.key(), "entity selected");
            *sink.borrow_mut() = Some(entity.clone());
        });

        Self {
            topology,
            search: String::new(),
            selected,
            pointer_inside: false,
            pinching: false,
        }
    }

    pub(in crate::app) fn replace_graph(&mut self, graph: &Graph) {
        self.topology.set_graph(graph);
        self.pointer_inside = false;
        self.pinching = false;

        let mut selected = self.selected.borrow_mut();
        let current = self.topology.graph();
        let still_present = selected.as_ref().is_some_and(|entity| {
            current
                .index_by_id
                .get(&entity.id)
                .and_then(|&index| current.nodes.get(index))
                .is_some_and(|node| node.same_entity(entity))
        });
        if !still_present {
            *selected = None;
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        graph_path: &Path,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Entity topology");
                    ui.separator();
                    ui.label(format!("source: {}", graph_path.display()));
                    ui.label(format!("nodes: {}", self.topology.graph().input_node_count));
                    ui.label(format!("edges: {}", self.topology.graph().edges.len()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload graph"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(match self.topology.mode() {
                            RenderMode::Spatial => "spatial view",
                            RenderMode::Matrix => "relationship matrix",
                        });
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.vertical_centered(|ui| {
                    ui.add_space(8.0);
                    ui.spinner();
                });
            }
            self.draw_topology(ui);
        });
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Search");
        let search = ui.text_edit_singleline(&mut self.search);
        if search.changed() {
            self.topology.set_search(&self.search);
        }
        if let Some(matches) = self.topology.search_matches() {
            ui.small(format!("{} matching entities", matches.len()));
        }

        if self.topology.mode() != RenderMode::Spatial {
            return;
        }

        ui.separator();
        ui.heading("View");
        let config = self.topology.config();
        let (min_scale, max_scale) = (config.min_scale, config.max_scale);
        let mut scale = self.topology.zoom().scale;
        let slider = ui.add(egui::Slider::new(&mut scale, min_scale..=max_scale).text("zoom"));
        if slider.changed() {
            self.topology.set_scale(scale);
        }
        if ui.button("Reset view").clicked() {
            self.topology.reset_zoom();
        }
    }

    fn draw_topology(&mut self, ui: &mut egui::Ui) {
        if self.topology.simulation().is_some() {
            self.draw_canvas(ui);
            return;
        }

        let mut activated = None;
        match self.topology.view() {
            TopologyView::Empty(message) => {
                ui.vertical_centered(|ui| {
                    ui.add_space(60.0);
                    ui.label(message);
                });
            }
            TopologyView::Matrix { matrix, matches } => {
                activated = Self::draw_matrix(ui, matrix, matches);
            }
            TopologyView::Spatial(_) => {}
        }

        if let Some((row, endpoint)) = activated {
            self.topology.activate_matrix_row(row, endpoint);
        }
    }
}
