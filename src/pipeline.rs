//! Wires the frame timeline and the render timeline together.
//!
//! `GestureEngine::on_frame` runs smoothing, classification, arbitration and
//! the interaction controller for one landmark frame. `on_render_tick`
//! integrates physics and samples tweens. Both must be called from the same
//! thread; the binary multiplexes them with `select!`.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, Sender};

use crate::{
    arbiter::{FrameAnalysis, GestureArbiter, GestureListener},
    config::Config,
    controller::{ControllerAction, FeedbackSink, InteractionController},
    error::Result,
    physics::{PhysicsWorld, TweenId},
    scene::SceneController,
    types::{Frame, Landmark},
};

#[derive(Clone, Debug, Default)]
pub struct FrameOutcome {
    pub analysis: FrameAnalysis,
    pub actions: Vec<ControllerAction>,
}

pub struct GestureEngine {
    arbiter: GestureArbiter,
    controller: InteractionController,
    world: PhysicsWorld,
}

impl GestureEngine {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            controller: InteractionController::new(config.controller, &config.gesture),
            arbiter: GestureArbiter::new(config.gesture),
            world: PhysicsWorld::new(config.physics),
        })
    }

    pub fn add_listener<L>(&mut self, listener: L)
    where
        L: GestureListener + Send + 'static,
    {
        self.arbiter.add_listener(listener);
    }

    pub fn arbiter(&self) -> &GestureArbiter {
        &self.arbiter
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut InteractionController {
        &mut self.controller
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    /// Processes one landmark frame. A malformed frame is returned as an
    /// error and leaves every component untouched.
    pub fn on_frame(
        &mut self,
        frame: &Frame,
        scene: &mut dyn SceneController,
        feedback: &mut dyn FeedbackSink,
    ) -> Result<FrameOutcome> {
        let analysis = self.arbiter.analyze(frame)?;
        let actions = self.controller.handle_frame(
            &analysis,
            frame.timestamp,
            &mut self.world,
            scene,
            feedback,
        );
        Ok(FrameOutcome { analysis, actions })
    }

    /// Integrates one render step, then lets in-flight tweens overwrite
    /// the bodies they own. Returns the tweens that finished.
    pub fn on_render_tick(&mut self, dt: f32, now: Instant) -> Vec<TweenId> {
        self.world.update(dt);
        self.world.advance_tweens(now)
    }
}

/// Handle to the landmark source thread. Dropping it stops the thread.
#[derive(Debug)]
pub struct FrameStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FrameStream {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Plays `frames` into `frame_tx` at `interval`, stamping each with the
/// time it was emitted. The sender is dropped once playback finishes.
pub fn start_frame_stream(
    frames: Vec<Vec<Vec<Landmark>>>,
    interval: Duration,
    frame_tx: Sender<Frame>,
) -> FrameStream {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || {
        let total = frames.len();
        for (index, hands) in frames.into_iter().enumerate() {
            if stop_flag.load(Ordering::Relaxed) {
                log::debug!("frame stream stopped at {index}/{total}");
                return;
            }
            // Drop if the consumer is busy; it only wants the newest frame.
            let _ = frame_tx.try_send(Frame::new(hands, Instant::now()));
            thread::sleep(interval);
        }
        log::info!("frame stream finished after {total} frames");
    });

    FrameStream {
        stop,
        handle: Some(handle),
    }
}

/// Skips past any frames queued behind `frame`, keeping the newest.
pub fn latest_frame(frame: Frame, frame_rx: &Receiver<Frame>) -> Frame {
    frame_rx.try_iter().last().unwrap_or(frame)
}
