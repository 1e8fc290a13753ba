use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::Context as _;
use eframe::egui::{self, Context};
use entity_topology::topology::frames::EguiFrames;
use entity_topology::{CanvasSize, EntityReference, Graph, Topology, TopologyConfig, parse_graph_json};

mod canvas;
mod ui;

type LoadResult = Result<Graph, String>;

pub struct TopologyApp {
    graph_path: PathBuf,
    config: TopologyConfig,
    canvas: CanvasSize,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    topology: Topology<EguiFrames>,
    search: String,
    selected: Rc<RefCell<Option<EntityReference>>>,
    pointer_inside: bool,
    pinching: bool,
}

fn load_graph(path: &Path) -> anyhow::Result<Graph> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph {}", path.display()))?;
    let graph = parse_graph_json(&raw)
        .with_context(|| format!("failed to parse graph {}", path.display()))?;
    tracing::info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "graph loaded"
    );
    Ok(graph)
}

impl TopologyApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        graph_path: PathBuf,
        config: TopologyConfig,
        canvas: CanvasSize,
    ) -> Self {
        let state = Self::start_load(graph_path.clone());
        Self {
            graph_path,
            config,
            canvas,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(graph_path: PathBuf) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_graph(&graph_path).map_err(|error| {
                tracing::error!("{error:#}");
                format!("{error:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(graph_path: PathBuf) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(graph_path),
        }
    }
}

impl eframe::App for TopologyApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(graph)) => {
                        transition = Some(AppState::Ready(Box::new(ViewModel::new(
                            ctx,
                            &graph,
                            self.canvas,
                            &self.config,
                        ))));
                    }
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(AppState::Error(
                            "Background load worker disconnected".to_owned(),
                        ));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading entity graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load entity graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.graph_path.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.graph_path, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.graph_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        // Same view model: the topology swaps graphs in place.
                        Ok(Ok(graph)) => model.replace_graph(&graph),
                        Ok(Err(error)) => transition = Some(AppState::Error(error)),
                        Err(TryRecvError::Empty) => {
                            ctx.request_repaint();
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "Background load worker disconnected".to_owned(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
