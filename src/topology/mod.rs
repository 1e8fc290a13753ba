//! Entity relationship topology: clustered force layout with a tabular
//! fallback for dense graphs.

pub mod frames;
pub mod interaction;
pub mod layout;
pub mod matrix;
pub mod palette;
pub mod physics;
pub mod scene;
pub mod search;

use std::collections::HashSet;

use crate::config::{CanvasSize, TopologyConfig};
use crate::entity::{EntityReference, Graph, SanitizedGraph};
use frames::FrameScheduler;
use interaction::{InteractionController, PointerEvent, TooltipState, Transition, ZoomTransform};
use layout::{ClusterLayout, plan_clusters};
use matrix::{RelationshipMatrix, RowEndpoint};
use physics::Simulation;
use scene::{Scene, SceneInput, render_scene};

pub const EMPTY_GRAPH_MESSAGE: &str = "No entities available for topology.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    Spatial,
    Matrix,
}

impl RenderMode {
    pub fn for_node_count(node_count: usize, threshold: usize) -> Self {
        if node_count > threshold {
            Self::Matrix
        } else {
            Self::Spatial
        }
    }
}

struct SpatialState<S: FrameScheduler> {
    layout: ClusterLayout,
    /// `None` for an empty graph.
    simulation: Option<Simulation<S>>,
    interaction: InteractionController,
}

enum ModeState<S: FrameScheduler> {
    Spatial(SpatialState<S>),
    Matrix(RelationshipMatrix),
}

pub enum TopologyView<'a> {
    Empty(&'static str),
    Spatial(Scene),
    Matrix {
        matrix: &'a RelationshipMatrix,
        matches: Option<&'a HashSet<usize>>,
    },
}

type NodeClickCallback = Box<dyn FnMut(&EntityReference)>;

/// Owns everything derived from one input graph; swapping the graph or the
/// canvas size rebuilds it from scratch.
pub struct Topology<S: FrameScheduler + Clone> {
    graph: SanitizedGraph,
    size: CanvasSize,
    config: TopologyConfig,
    scheduler: S,
    mode: ModeState<S>,
    query: String,
    matches: Option<HashSet<usize>>,
    on_node_click: Option<NodeClickCallback>,
}

impl<S: FrameScheduler + Clone> Topology<S> {
    pub fn new(graph: &Graph, size: CanvasSize, config: &TopologyConfig, scheduler: S) -> Self {
        let graph = graph.sanitize();
        let mode = Self::build_mode(&graph, size, config, &scheduler);
        Self {
            graph,
            size,
            config: config.clone(),
            scheduler,
            mode,
            query: String::new(),
            matches: None,
            on_node_click: None,
        }
    }

    fn build_mode(
        graph: &SanitizedGraph,
        size: CanvasSize,
        config: &TopologyConfig,
        scheduler: &S,
    ) -> ModeState<S> {
        let mode = RenderMode::for_node_count(graph.input_node_count, config.matrix_threshold);
        tracing::debug!(
            nodes = graph.input_node_count,
            edges = graph.edges.len(),
            ?mode,
            "topology mode selected"
        );

        match mode {
            RenderMode::Matrix => ModeState::Matrix(RelationshipMatrix::build(graph)),
            RenderMode::Spatial => {
                let layout = plan_clusters(&graph.nodes, size, config);
                let simulation = (!graph.nodes.is_empty()).then(|| {
                    let edges = graph
                        .edges
                        .iter()
                        .map(|(source, target, _)| (*source, *target))
                        .collect::<Vec<_>>();
                    Simulation::start(&layout, &edges, size, config, scheduler.clone())
                });
                ModeState::Spatial(SpatialState {
                    layout,
                    simulation,
                    interaction: InteractionController::new(size, config),
                })
            }
        }
    }

    fn rebuild(&mut self) {
        // The old loop must be cancelled before the new one schedules.
        self.stop();
        self.mode = Self::build_mode(&self.graph, self.size, &self.config, &self.scheduler);
        self.matches = search::matching_nodes(&self.graph.nodes, &self.query);
    }

    pub fn set_graph(&mut self, graph: &Graph) {
        self.graph = graph.sanitize();
        self.rebuild();
    }

    pub fn resize(&mut self, size: CanvasSize) {
        if size == self.size {
            return;
        }
        self.size = size;
        self.rebuild();
    }

    /// Cancels the simulation loop. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let ModeState::Spatial(SpatialState {
            simulation: Some(simulation),
            ..
        }) = &mut self.mode
        {
            simulation.stop();
        }
    }

    pub fn set_on_node_click(&mut self, callback: impl FnMut(&EntityReference) + 'static) {
        self.on_node_click = Some(Box::new(callback));
    }

    fn emit_node_click(&mut self, entity: &EntityReference) {
        tracing::debug!(entity_id = %entity.id, "node activated");
        if let Some(callback) = self.on_node_click.as_mut() {
            callback(entity);
        }
    }

    pub fn mode(&self) -> RenderMode {
        match self.mode {
            ModeState::Spatial(_) => RenderMode::Spatial,
            ModeState::Matrix(_) => RenderMode::Matrix,
        }
    }

    pub fn graph(&self) -> &SanitizedGraph {
        &self.graph
    }

    pub fn size(&self) -> CanvasSize {
        self.size
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    pub fn simulation(&self) -> Option<&Simulation<S>> {
        match &self.mode {
            ModeState::Spatial(spatial) => spatial.simulation.as_ref(),
            ModeState::Matrix(_) => None,
        }
    }

    pub fn cluster_layout(&self) -> Option<&ClusterLayout> {
        match &self.mode {
            ModeState::Spatial(spatial) => Some(&spatial.layout),
            ModeState::Matrix(_) => None,
        }
    }

    pub fn matrix(&self) -> Option<&RelationshipMatrix> {
        match &self.mode {
            ModeState::Matrix(matrix) => Some(matrix),
            ModeState::Spatial(_) => None,
        }
    }

    fn interaction(&self) -> Option<&InteractionController> {
        match &self.mode {
            ModeState::Spatial(spatial) => Some(&spatial.interaction),
            ModeState::Matrix(_) => None,
        }
    }

    fn interaction_mut(&mut self) -> Option<&mut InteractionController> {
        match &mut self.mode {
            ModeState::Spatial(spatial) => Some(&mut spatial.interaction),
            ModeState::Matrix(_) => None,
        }
    }

    pub fn zoom(&self) -> ZoomTransform {
        self.interaction()
            .map(InteractionController::zoom)
            .unwrap_or_default()
    }

    pub fn set_scale(&mut self, scale: f32) {
        if let Some(interaction) = self.interaction_mut() {
            interaction.set_scale(scale);
        }
    }

    pub fn reset_zoom(&mut self) {
        if let Some(interaction) = self.interaction_mut() {
            interaction.reset_zoom();
        }
    }

    pub fn tooltip(&self) -> Option<&TooltipState> {
        self.interaction().and_then(InteractionController::tooltip)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_search(&mut self, query: &str) {
        if self.query == query {
            return;
        }
        self.query = query.to_owned();
        self.matches = search::matching_nodes(&self.graph.nodes, &self.query);
    }

    pub fn search_matches(&self) -> Option<&HashSet<usize>> {
        self.matches.as_ref()
    }

    /// Delivers a frame to the simulation. Returns whether a tick ran.
    pub fn on_frame(&mut self) -> bool {
        match &mut self.mode {
            ModeState::Spatial(SpatialState {
                simulation: Some(simulation),
                ..
            }) => simulation.on_frame(),
            _ => false,
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> Transition {
        let ModeState::Spatial(SpatialState {
            simulation: Some(simulation),
            interaction,
            ..
        }) = &mut self.mode
        else {
            return Transition::Ignored;
        };

        let transition = interaction.handle(event, simulation, &self.graph.nodes);
        if let Transition::Activated(index) = transition
            && let Some(entity) = self.graph.nodes.get(index).cloned()
        {
            self.emit_node_click(&entity);
        }
        transition
    }

    /// Emits the node-click callback for a matrix cell.
    pub fn activate_matrix_row(&mut self, row: usize, endpoint: RowEndpoint) -> bool {
        let ModeState::Matrix(matrix) = &self.mode else {
            return false;
        };
        let Some(entity) = matrix
            .endpoint_index(row, endpoint)
            .and_then(|index| self.graph.nodes.get(index))
            .cloned()
        else {
            return false;
        };
        self.emit_node_click(&entity);
        true
    }

    /// What to draw right now, built from the latest complete position set.
    pub fn view(&self) -> TopologyView<'_> {
        match &self.mode {
            ModeState::Matrix(matrix) => TopologyView::Matrix {
                matrix,
                matches: self.matches.as_ref(),
            },
            ModeState::Spatial(SpatialState {
                simulation: None, ..
            }) => TopologyView::Empty(EMPTY_GRAPH_MESSAGE),
            ModeState::Spatial(SpatialState {
                layout,
                simulation: Some(simulation),
                interaction,
            }) => TopologyView::Spatial(render_scene(&SceneInput {
                nodes: &self.graph.nodes,
                positions: simulation.positions(),
                regions: &layout.regions,
                edges: &self.graph.edges,
                zoom: interaction.zoom(),
                tooltip: interaction.tooltip(),
                hovered: interaction.hovered(),
                matches: self.matches.as_ref(),
                config: &self.config,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use eframe::egui::pos2;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::entity::{Edge, EntityType};
    use frames::ManualFrames;

    fn scenario_a() -> Graph {
        let risk = EntityReference::new(EntityType::Risk, "r1", "Risk 1")
            .with_attribute("owner", "Security")
            .with_attribute("score", 92);
        let control = EntityReference::new(EntityType::Control, "c1", "Control 1");
        Graph {
            edges: vec![Edge::new(&risk, &control, "mitigated_by")],
            nodes: vec![risk, control],
        }
    }

    fn dense_graph(node_count: usize) -> Graph {
        let kinds = [EntityType::Risk, EntityType::Control, EntityType::Asset];
        let nodes = (0..node_count)
            .map(|index| {
                EntityReference::new(
                    kinds[index % kinds.len()],
                    format!("n{index}"),
                    format!("Node {index}"),
                )
            })
            .collect::<Vec<_>>();
        let relationships = ["owns", "affects", "depends_on", "mitigated_by"];
        let edges = (1..node_count)
            .map(|index| {
                Edge::new(
                    &nodes[index],
                    &nodes[index / 2],
                    relationships[index % relationships.len()],
                )
            })
            .collect();
        Graph { nodes, edges }
    }

    fn topology(graph: &Graph) -> (Topology<ManualFrames>, ManualFrames) {
        let frames = ManualFrames::new();
        let topology = Topology::new(
            graph,
            CanvasSize::default(),
            &TopologyConfig::default(),
            frames.clone(),
        );
        (topology, frames)
    }

    fn drive(topology: &mut Topology<ManualFrames>, frames: &ManualFrames, count: usize) {
        for _ in 0..count {
            if frames.take_pending() {
                topology.on_frame();
            }
        }
    }

    fn click_log(topology: &mut Topology<ManualFrames>) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        topology.set_on_node_click(move |entity| sink.borrow_mut().push(entity.id.clone()));
        log
    }

    #[test]
    fn mode_follows_the_node_count_threshold() {
        for (count, expected) in [
            (0, RenderMode::Spatial),
            (1, RenderMode::Spatial),
            (50, RenderMode::Spatial),
            (51, RenderMode::Matrix),
            (120, RenderMode::Matrix),
        ] {
            let (topology, _frames) = topology(&dense_graph(count));
            assert_eq!(topology.mode(), expected, "node count {count}");
        }
    }

    #[test]
    fn scenario_a_draws_two_nodes_one_edge_two_clusters() {
        let (mut topology, frames) = topology(&scenario_a());
        assert_eq!(topology.mode(), RenderMode::Spatial);
        drive(&mut topology, &frames, 10);

        let TopologyView::Spatial(scene) = topology.view() else {
            panic!("expected spatial view");
        };
        assert_eq!(scene.node_count(), 2);
        assert_eq!(scene.edge_count(), 1);
        assert_eq!(scene.region_count(), 2);
    }

    #[test]
    fn scenario_b_empty_graph_shows_message_without_simulation() {
        let (mut topology, frames) = topology(&Graph::default());
        assert_eq!(topology.mode(), RenderMode::Spatial);
        assert!(topology.simulation().is_none());
        assert_eq!(frames.requested(), 0);
        assert!(!topology.on_frame());

        let TopologyView::Empty(message) = topology.view() else {
            panic!("expected empty view");
        };
        assert_eq!(message, "No entities available for topology.");
    }

    #[test]
    fn scenario_c_dense_graph_uses_sorted_matrix() {
        let mut graph = dense_graph(51);
        let ghost = EntityReference::new(EntityType::Risk, "ghost", "Ghost");
        graph.edges.push(Edge::new(&graph.nodes[3], &ghost, "affects"));
        let valid_edges = graph.edges.len() - 1;

        let (topology, frames) = topology(&graph);
        assert_eq!(topology.mode(), RenderMode::Matrix);
        assert!(topology.simulation().is_none());
        assert_eq!(frames.requested(), 0);

        let TopologyView::Matrix { matrix, .. } = topology.view() else {
            panic!("expected matrix view");
        };
        assert_eq!(matrix.len(), valid_edges);
        for pair in matrix.rows().windows(2) {
            assert!(pair[0].relationship_type <= pair[1].relationship_type);
        }
    }

    #[test]
    fn scenario_d_hover_tooltip_lists_attributes() {
        let (mut topology, _frames) = topology(&scenario_a());
        let simulation = topology.simulation().unwrap();
        let pointer = topology.zoom().apply(simulation.position(0).unwrap());

        topology.handle_pointer(PointerEvent::Move(pointer));
        let lines = topology.tooltip().unwrap().lines();
        assert!(lines.contains(&"owner: Security".to_owned()));
        assert!(lines.contains(&"score: 92".to_owned()));

        let TopologyView::Spatial(scene) = topology.view() else {
            panic!("expected spatial view");
        };
        assert!(scene.tooltip().is_some());
    }

    #[test]
    fn scenario_e_zoom_request_is_clamped() {
        let (mut topology, _frames) = topology(&scenario_a());
        topology.set_scale(10.0);
        assert_eq!(topology.zoom().scale, 3.2);
        topology.set_scale(0.1);
        assert_eq!(topology.zoom().scale, 0.4);
        topology.reset_zoom();
        assert_eq!(topology.zoom(), ZoomTransform::IDENTITY);
    }

    #[test]
    fn dangling_edges_are_not_drawn() {
        let mut graph = scenario_a();
        let ghost = EntityReference::new(EntityType::Policy, "p9", "Ghost policy");
        graph.edges.push(Edge::new(&graph.nodes[0], &ghost, "governed_by"));
        let input_edges = graph.edges.len();

        let (topology, _frames) = topology(&graph);
        let TopologyView::Spatial(scene) = topology.view() else {
            panic!("expected spatial view");
        };
        assert!(scene.edge_count() < input_edges);
        assert_eq!(scene.edge_count(), 1);
    }

    #[test]
    fn dragged_node_tracks_the_pointer_then_is_released() {
        let (mut topology, frames) = topology(&scenario_a());
        drive(&mut topology, &frames, 30);
        let start = topology.simulation().unwrap().position(0).unwrap();

        topology.handle_pointer(PointerEvent::Down(start));
        assert!(topology.simulation().unwrap().alpha_target() > 0.0);
        for step in 1..=10 {
            let pointer = pos2(40.0 + step as f32 * 5.0, 60.0);
            topology.handle_pointer(PointerEvent::Move(pointer));
            drive(&mut topology, &frames, 1);
            assert_eq!(topology.simulation().unwrap().position(0), Some(pointer));
        }

        topology.handle_pointer(PointerEvent::Up(pos2(90.0, 60.0)));
        let simulation = topology.simulation().unwrap();
        assert!(!simulation.is_pinned(0));
        assert_eq!(simulation.alpha_target(), 0.0);
    }

    #[test]
    fn clicking_a_node_emits_its_entity() {
        let (mut topology, frames) = topology(&scenario_a());
        let log = click_log(&mut topology);
        drive(&mut topology, &frames, 5);

        let at = topology.simulation().unwrap().position(1).unwrap();
        topology.handle_pointer(PointerEvent::Down(at));
        let transition = topology.handle_pointer(PointerEvent::Up(at));
        assert_eq!(transition, Transition::Activated(1));
        assert_eq!(*log.borrow(), vec!["c1".to_owned()]);
    }

    #[test]
    fn matrix_clicks_emit_the_same_callback() {
        let (mut topology, _frames) = topology(&dense_graph(60));
        let log = click_log(&mut topology);

        assert!(topology.activate_matrix_row(0, RowEndpoint::Source));
        assert!(topology.activate_matrix_row(0, RowEndpoint::Target));
        assert!(!topology.activate_matrix_row(10_000, RowEndpoint::Source));

        let matrix = topology.matrix().unwrap();
        let expected = vec![matrix.rows()[0].source.id.clone(), matrix.rows()[0].target.id.clone()];
        assert_eq!(*log.borrow(), expected);
    }

    fn graph_with_bare_edge_endpoints(node_count: usize) -> Graph {
        let mut graph = dense_graph(node_count);
        graph.nodes[0] = graph.nodes[0].clone().with_attribute("owner", "Security");
        for edge in &mut graph.edges {
            edge.source.attributes = None;
            edge.target.attributes = None;
        }
        graph
    }

    fn attribute_log(
        topology: &mut Topology<ManualFrames>,
    ) -> Rc<RefCell<Vec<(String, Option<String>)>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        topology.set_on_node_click(move |entity| {
            let owner = entity
                .attributes
                .as_ref()
                .and_then(|attributes| attributes.get("owner"))
                .map(crate::util::format_attribute_value);
            sink.borrow_mut().push((entity.id.clone(), owner));
        });
        log
    }

    #[test]
    fn matrix_clicks_carry_the_node_attributes_like_spatial_clicks() {
        let expected = vec![("n0".to_owned(), Some("Security".to_owned()))];

        let (mut spatial, _frames) = topology(&graph_with_bare_edge_endpoints(10));
        let log = attribute_log(&mut spatial);
        let at = spatial.simulation().unwrap().position(0).unwrap();
        spatial.handle_pointer(PointerEvent::Down(at));
        spatial.handle_pointer(PointerEvent::Up(at));
        assert_eq!(*log.borrow(), expected);

        let (mut dense, _frames) = topology(&graph_with_bare_edge_endpoints(51));
        let log = attribute_log(&mut dense);
        let (row, endpoint) = dense
            .matrix()
            .unwrap()
            .rows()
            .iter()
            .enumerate()
            .find_map(|(index, row)| {
                if row.source.id == "n0" {
                    Some((index, RowEndpoint::Source))
                } else if row.target.id == "n0" {
                    Some((index, RowEndpoint::Target))
                } else {
                    None
                }
            })
            .unwrap();
        assert!(dense.matrix().unwrap().rows()[row].target.attributes.is_none());
        assert!(dense.activate_matrix_row(row, endpoint));
        assert_eq!(*log.borrow(), expected);
    }

    #[test]
    fn pointer_events_are_ignored_outside_spatial_mode() {
        let (mut topology, _frames) = topology(&dense_graph(60));
        assert_eq!(
            topology.handle_pointer(PointerEvent::Down(pos2(10.0, 10.0))),
            Transition::Ignored
        );
        let (mut empty, _frames) = self::topology(&Graph::default());
        assert_eq!(
            empty.handle_pointer(PointerEvent::Move(pos2(10.0, 10.0))),
            Transition::Ignored
        );
    }

    #[test]
    fn graph_swap_cancels_the_old_loop_before_starting_the_new_one() {
        let (mut topology, frames) = topology(&scenario_a());
        drive(&mut topology, &frames, 3);
        assert!(frames.is_pending());
        let requested_before = frames.requested();

        topology.set_graph(&dense_graph(10));
        assert_eq!(frames.cancelled(), 1);
        assert!(frames.is_pending());
        assert_eq!(frames.requested(), requested_before + 1);
        assert_eq!(topology.simulation().unwrap().ticks(), 0);
        assert_eq!(topology.simulation().unwrap().node_count(), 10);

        drive(&mut topology, &frames, 4);
        assert_eq!(topology.simulation().unwrap().ticks(), 4);
    }

    #[test]
    fn swapping_to_a_dense_graph_stops_the_simulation() {
        let (mut topology, frames) = topology(&scenario_a());
        topology.set_graph(&dense_graph(75));
        assert_eq!(topology.mode(), RenderMode::Matrix);
        assert_eq!(frames.cancelled(), 1);
        assert!(!frames.is_pending());
        assert!(!topology.on_frame());
    }

    #[test]
    fn graph_swap_discards_zoom_and_hover() {
        let (mut topology, _frames) = topology(&scenario_a());
        topology.set_scale(2.5);
        let at = topology.zoom().apply(topology.simulation().unwrap().position(0).unwrap());
        topology.handle_pointer(PointerEvent::Move(at));
        assert!(topology.tooltip().is_some());

        topology.set_graph(&scenario_a());
        assert_eq!(topology.zoom(), ZoomTransform::IDENTITY);
        assert!(topology.tooltip().is_none());
    }

    #[test]
    fn explicit_stop_and_drop_cancel_pending_ticks() {
        let (mut topology, frames) = topology(&scenario_a());
        topology.stop();
        topology.stop();
        assert_eq!(frames.cancelled(), 1);
        assert!(!topology.on_frame());

        let (topology, frames) = self::topology(&scenario_a());
        drop(topology);
        assert_eq!(frames.cancelled(), 1);
        assert!(!frames.is_pending());
    }

    #[test]
    fn resize_rebuilds_the_layout() {
        let (mut topology, frames) = topology(&scenario_a());
        topology.resize(CanvasSize::new(800.0, 600.0).unwrap());
        assert_eq!(frames.cancelled(), 1);
        let layout = topology.cluster_layout().unwrap();
        let radius = (layout.regions[0].centroid - pos2(400.0, 300.0)).length();
        assert!((radius - 0.28 * 600.0).abs() < 1e-3);
    }

    #[test]
    fn search_survives_graph_swaps() {
        let (mut topology, _frames) = topology(&scenario_a());
        topology.set_search("control");
        assert_eq!(topology.search_matches(), Some(&HashSet::from([1])));

        topology.set_graph(&dense_graph(60));
        assert_eq!(topology.query(), "control");
        assert!(topology.search_matches().is_some());

        topology.set_search("");
        assert!(topology.search_matches().is_none());
    }
}
