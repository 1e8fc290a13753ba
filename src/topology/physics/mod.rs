mod forces;

use eframe::egui::{Pos2, Vec2, pos2};

use crate::config::{CanvasSize, TopologyConfig};
use crate::topology::frames::FrameScheduler;
use crate::topology::layout::ClusterLayout;
use forces::{Link, apply_center, apply_charge, apply_cluster_pull, apply_links, build_links, integrate};

#[derive(Clone, Copy, Debug)]
struct SimulationParams {
    charge_strength: f32,
    link_distance: f32,
    center_strength: f32,
    cluster_strength: f32,
    velocity_decay: f32,
    alpha_decay: f32,
    alpha_min: f32,
}

impl SimulationParams {
    fn from_config(config: &TopologyConfig) -> Self {
        Self {
            charge_strength: config.charge_strength,
            link_distance: config.link_distance,
            center_strength: config.center_strength,
            cluster_strength: config.cluster_strength,
            velocity_decay: config.velocity_decay,
            alpha_decay: config.alpha_decay,
            alpha_min: config.alpha_min,
        }
    }
}

struct ForceSet {
    links: Vec<Link>,
    anchors: Vec<Pos2>,
    center: Pos2,
}

/// A running force simulation over one graph instance.
///
/// Owns every node position. Dropping the handle stops the loop and
/// withdraws any frame it still has outstanding.
pub struct Simulation<S: FrameScheduler> {
    positions: Vec<Pos2>,
    velocities: Vec<Vec2>,
    pins: Vec<Option<Pos2>>,
    forces: Option<ForceSet>,
    params: SimulationParams,
    alpha: f32,
    alpha_target: f32,
    scheduler: S,
    tick_pending: bool,
    ticks: u64,
}

impl<S: FrameScheduler> Simulation<S> {
    /// Seeds bodies from `layout` and schedules the first tick.
    pub fn start(
        layout: &ClusterLayout,
        edges: &[(usize, usize)],
        size: CanvasSize,
        config: &TopologyConfig,
        scheduler: S,
    ) -> Self {
        let node_count = layout.seeds.len();
        let forces = ForceSet {
            links: build_links(node_count, edges),
            anchors: layout.anchors.clone(),
            center: pos2(size.width * 0.5, size.height * 0.5),
        };

        let mut simulation = Self {
            positions: layout.seeds.clone(),
            velocities: vec![Vec2::ZERO; node_count],
            pins: vec![None; node_count],
            forces: Some(forces),
            params: SimulationParams::from_config(config),
            alpha: 1.0,
            alpha_target: 0.0,
            scheduler,
            tick_pending: false,
            ticks: 0,
        };
        tracing::debug!(
            nodes = node_count,
            links = edges.len(),
            "force simulation started"
        );
        simulation.request_tick();
        simulation
    }

    /// Cancels the outstanding tick and releases the force definitions.
    /// Idempotent.
    pub fn stop(&mut self) {
        if self.forces.is_none() {
            return;
        }
        if self.tick_pending {
            self.scheduler.cancel_frame();
            self.tick_pending = false;
        }
        self.forces = None;
        tracing::debug!(ticks = self.ticks, "force simulation stopped");
    }

    pub fn is_running(&self) -> bool {
        self.forces.is_some()
    }

    /// Asks for a tick on the next frame. A request made while one is
    /// already outstanding is dropped rather than queued.
    pub fn request_tick(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        if self.tick_pending {
            tracing::trace!("tick already pending; request coalesced");
            return false;
        }
        self.tick_pending = true;
        self.scheduler.request_frame();
        true
    }

    pub fn is_tick_pending(&self) -> bool {
        self.tick_pending
    }

    /// Runs the pending tick, if any, and schedules the next one.
    pub fn on_frame(&mut self) -> bool {
        if !self.tick_pending || !self.is_running() {
            return false;
        }
        self.tick_pending = false;
        self.tick();
        self.request_tick();
        true
    }

    /// One integration step; all positions are updated before returning.
    pub fn tick(&mut self) {
        let Some(forces) = self.forces.as_ref() else {
            return;
        };
        let params = self.params;

        self.alpha += (self.alpha_target - self.alpha) * params.alpha_decay;
        let alpha = self.alpha;

        apply_links(
            &forces.links,
            &self.positions,
            &mut self.velocities,
            params.link_distance,
            alpha,
        );
        apply_charge(
            &self.positions,
            &mut self.velocities,
            params.charge_strength,
            alpha,
        );
        apply_center(&mut self.positions, forces.center, params.center_strength);
        apply_cluster_pull(
            &self.positions,
            &forces.anchors,
            &mut self.velocities,
            params.cluster_strength,
            alpha,
        );
        integrate(
            &mut self.positions,
            &mut self.velocities,
            &self.pins,
            params.velocity_decay,
        );
        self.ticks += 1;
    }

    pub fn positions(&self) -> &[Pos2] {
        &self.positions
    }

    pub fn position(&self, index: usize) -> Option<Pos2> {
        self.positions.get(index).copied()
    }

    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    /// Fixes a node at `at` until [`Self::unpin`]; the node is moved at once.
    pub fn pin(&mut self, index: usize, at: Pos2) -> bool {
        let Some(pin) = self.pins.get_mut(index) else {
            return false;
        };
        *pin = Some(at);
        self.positions[index] = at;
        self.velocities[index] = Vec2::ZERO;
        true
    }

    pub fn unpin(&mut self, index: usize) {
        if let Some(pin) = self.pins.get_mut(index) {
            *pin = None;
        }
    }

    pub fn is_pinned(&self, index: usize) -> bool {
        self.pins.get(index).is_some_and(Option::is_some)
    }

    /// Sets the energy level alpha relaxes toward.
    pub fn set_alpha_target(&mut self, target: f32) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f32 {
        self.alpha_target
    }

    /// True once alpha has decayed under the configured floor. The loop
    /// keeps ticking regardless.
    pub fn is_cool(&self) -> bool {
        self.alpha < self.params.alpha_min
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl<S: FrameScheduler> Drop for Simulation<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;
    use crate::topology::frames::ManualFrames;
    use crate::topology::layout::ClusterRegion;

    fn layout_from(seeds: Vec<Pos2>, anchors: Vec<Pos2>) -> ClusterLayout {
        ClusterLayout {
            regions: vec![ClusterRegion {
                entity_type: EntityType::Risk,
                centroid: anchors.first().copied().unwrap_or(Pos2::ZERO),
                member_count: seeds.len(),
            }],
            cluster_of: vec![0; seeds.len()],
            anchors,
            seeds,
        }
    }

    fn start(
        layout: &ClusterLayout,
        edges: &[(usize, usize)],
        config: &TopologyConfig,
    ) -> (Simulation<ManualFrames>, ManualFrames) {
        let frames = ManualFrames::new();
        let simulation = Simulation::start(
            layout,
            edges,
            CanvasSize::default(),
            config,
            frames.clone(),
        );
        (simulation, frames)
    }

    fn run_frames(simulation: &mut Simulation<ManualFrames>, frames: &ManualFrames, count: usize) {
        for _ in 0..count {
            if frames.take_pending() {
                simulation.on_frame();
            }
        }
    }

    #[test]
    fn start_schedules_exactly_one_tick() {
        let layout = layout_from(vec![pos2(0.0, 0.0)], vec![pos2(0.0, 0.0)]);
        let (mut simulation, frames) = start(&layout, &[], &TopologyConfig::default());
        assert_eq!(frames.requested(), 1);

        assert!(!simulation.request_tick());
        assert!(!simulation.request_tick());
        assert_eq!(frames.requested(), 1);
        assert_eq!(simulation.ticks(), 0);
    }

    #[test]
    fn each_frame_runs_one_tick_and_reschedules() {
        let layout = layout_from(vec![pos2(0.0, 0.0)], vec![pos2(0.0, 0.0)]);
        let (mut simulation, frames) = start(&layout, &[], &TopologyConfig::default());

        run_frames(&mut simulation, &frames, 5);
        assert_eq!(simulation.ticks(), 5);
        assert_eq!(frames.requested(), 6);
        assert!(simulation.is_tick_pending());
    }

    #[test]
    fn frame_without_pending_tick_does_nothing() {
        let layout = layout_from(vec![pos2(0.0, 0.0)], vec![pos2(0.0, 0.0)]);
        let (mut simulation, frames) = start(&layout, &[], &TopologyConfig::default());
        assert!(simulation.on_frame());
        frames.take_pending();
        simulation.tick_pending = false;
        assert!(!simulation.on_frame());
        assert_eq!(simulation.ticks(), 1);
    }

    #[test]
    fn loop_keeps_running_after_cooling() {
        let layout = layout_from(vec![pos2(0.0, 0.0)], vec![pos2(0.0, 0.0)]);
        let (mut simulation, frames) = start(&layout, &[], &TopologyConfig::default());
        run_frames(&mut simulation, &frames, 400);
        assert!(simulation.is_cool());
        assert!(simulation.is_tick_pending());
        assert_eq!(simulation.ticks(), 400);
    }

    #[test]
    fn stop_cancels_pending_tick_and_releases_forces() {
        let layout = layout_from(vec![pos2(0.0, 0.0)], vec![pos2(0.0, 0.0)]);
        let (mut simulation, frames) = start(&layout, &[], &TopologyConfig::default());

        simulation.stop();
        assert_eq!(frames.cancelled(), 1);
        assert!(!frames.is_pending());
        assert!(!simulation.is_running());
        assert!(!simulation.request_tick());
        assert!(!simulation.on_frame());

        simulation.stop();
        assert_eq!(frames.cancelled(), 1);
    }

    #[test]
    fn dropping_the_handle_cancels_the_loop() {
        let layout = layout_from(vec![pos2(0.0, 0.0)], vec![pos2(0.0, 0.0)]);
        let (simulation, frames) = start(&layout, &[], &TopologyConfig::default());
        drop(simulation);
        assert_eq!(frames.cancelled(), 1);
        assert!(!frames.is_pending());
    }

    #[test]
    fn repulsion_separates_close_nodes() {
        let anchor = pos2(200.0, 150.0);
        let layout = layout_from(vec![anchor, anchor + Vec2::new(8.0, 6.0)], vec![anchor; 2]);
        let (mut simulation, frames) = start(&layout, &[], &TopologyConfig::default());
        run_frames(&mut simulation, &frames, 60);

        let distance = (simulation.positions()[0] - simulation.positions()[1]).length();
        assert!(distance > 10.0, "distance = {distance}");
    }

    #[test]
    fn linked_nodes_settle_near_link_distance() {
        let config = TopologyConfig {
            charge_strength: 0.0,
            cluster_strength: 0.0,
            ..TopologyConfig::default()
        };
        let layout = layout_from(
            vec![pos2(50.0, 150.0), pos2(350.0, 150.0)],
            vec![pos2(200.0, 150.0); 2],
        );
        let (mut simulation, frames) = start(&layout, &[(0, 1)], &config);
        run_frames(&mut simulation, &frames, 300);

        let distance = (simulation.positions()[0] - simulation.positions()[1]).length();
        assert!((distance - 100.0).abs() < 10.0, "distance = {distance}");
    }

    #[test]
    fn cluster_pull_draws_nodes_to_their_anchor() {
        let config = TopologyConfig {
            charge_strength: 0.0,
            center_strength: 0.0,
            ..TopologyConfig::default()
        };
        let anchor = pos2(300.0, 100.0);
        let layout = layout_from(vec![pos2(100.0, 200.0)], vec![anchor]);
        let (mut simulation, frames) = start(&layout, &[], &config);
        let before = (simulation.positions()[0] - anchor).length();
        run_frames(&mut simulation, &frames, 100);
        let after = (simulation.positions()[0] - anchor).length();
        assert!(after < before * 0.5, "before = {before}, after = {after}");
    }

    #[test]
    fn centering_keeps_the_mean_on_the_canvas_center() {
        let layout = layout_from(
            vec![pos2(10.0, 10.0), pos2(30.0, 20.0), pos2(15.0, 40.0)],
            vec![pos2(20.0, 20.0); 3],
        );
        let (mut simulation, frames) = start(&layout, &[(0, 1)], &TopologyConfig::default());
        run_frames(&mut simulation, &frames, 200);

        let positions = simulation.positions();
        let mean = positions.iter().fold(Vec2::ZERO, |sum, p| sum + p.to_vec2()) / 3.0;
        assert!((mean - Vec2::new(200.0, 150.0)).length() < 30.0, "mean = {mean:?}");
    }

    #[test]
    fn pinned_node_tracks_its_pin_through_ticks() {
        let anchor = pos2(200.0, 150.0);
        let layout = layout_from(vec![anchor, anchor + Vec2::new(8.0, 6.0)], vec![anchor; 2]);
        let (mut simulation, frames) = start(&layout, &[(0, 1)], &TopologyConfig::default());

        let pointer = pos2(42.0, 17.0);
        assert!(simulation.pin(0, pointer));
        assert_eq!(simulation.position(0), Some(pointer));
        for _ in 0..20 {
            run_frames(&mut simulation, &frames, 1);
            assert_eq!(simulation.position(0), Some(pointer));
        }

        simulation.unpin(0);
        assert!(!simulation.is_pinned(0));
        run_frames(&mut simulation, &frames, 20);
        assert_ne!(simulation.position(0), Some(pointer));
    }

    #[test]
    fn pin_out_of_range_is_rejected() {
        let layout = layout_from(vec![pos2(0.0, 0.0)], vec![pos2(0.0, 0.0)]);
        let (mut simulation, _frames) = start(&layout, &[], &TopologyConfig::default());
        assert!(!simulation.pin(3, pos2(1.0, 1.0)));
    }

    #[test]
    fn alpha_relaxes_toward_the_target() {
        let layout = layout_from(vec![pos2(0.0, 0.0)], vec![pos2(0.0, 0.0)]);
        let (mut simulation, frames) = start(&layout, &[], &TopologyConfig::default());
        run_frames(&mut simulation, &frames, 400);
        assert!(simulation.alpha() < 0.01);

        simulation.set_alpha_target(0.3);
        run_frames(&mut simulation, &frames, 200);
        assert!(simulation.alpha() > 0.2 && simulation.alpha() <= 0.3);

        simulation.set_alpha_target(0.0);
        run_frames(&mut simulation, &frames, 400);
        assert!(simulation.alpha() < 0.01);
    }
}
