//! "Next frame" scheduling for the simulation loop.
//!
//! The simulation only asks for a frame and later gets told one arrived
//! (`Topology::on_frame`), so the same tick logic runs under egui's repaint
//! loop and under tests that drive frames by hand.

use std::cell::RefCell;
use std::rc::Rc;

use eframe::egui::Context;

pub trait FrameScheduler {
    fn request_frame(&mut self);
    fn cancel_frame(&mut self);
}

/// Frames delivered by egui repaints.
#[derive(Clone)]
pub struct EguiFrames {
    ctx: Context,
}

impl EguiFrames {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }
}

impl FrameScheduler for EguiFrames {
    fn request_frame(&mut self) {
        self.ctx.request_repaint();
    }

    // egui has no way to withdraw a repaint; a stopped simulation ignores it.
    fn cancel_frame(&mut self) {}
}

#[derive(Debug, Default)]
struct ManualFrameState {
    pending: bool,
    requested: usize,
    cancelled: usize,
}

/// Hand-driven frames; clones share state.
#[derive(Clone, Debug, Default)]
pub struct ManualFrames {
    state: Rc<RefCell<ManualFrameState>>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the outstanding frame request, if any.
    pub fn take_pending(&self) -> bool {
        std::mem::take(&mut self.state.borrow_mut().pending)
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().pending
    }

    pub fn requested(&self) -> usize {
        self.state.borrow().requested
    }

    pub fn cancelled(&self) -> usize {
        self.state.borrow().cancelled
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&mut self) {
        let mut state = self.state.borrow_mut();
        state.pending = true;
        state.requested += 1;
    }

    fn cancel_frame(&mut self) {
        let mut state = self.state.borrow_mut();
        if state.pending {
            state.pending = false;
            state.cancelled += 1;
        }
    }
}
