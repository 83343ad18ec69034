//! Translates arbitrated gestures into application actions.
//!
//! Modes are `Draw`, `Erase` and `Locked` (draws, ignores palm/fist toggles
//! until `unlock`). An orthogonal pinch sub-state pauses drawing: while
//! pinching the index tip is tracked but nothing is drawn or erased.

use std::time::Instant;

use glam::Vec3;

use crate::{
    arbiter::FrameAnalysis,
    config::{ControllerConfig, GestureConfig},
    physics::{BodyId, BodyTag, PhysicsWorld},
    scene::SceneController,
    types::{GestureKind, GesturePayload, RotationAxis, to_interaction_space},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionMode {
    Draw,
    Erase,
    Locked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinchState {
    Idle,
    Pinching,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HapticPattern {
    Lock,
}

/// HUD and platform side effects. Both are best effort.
pub trait FeedbackSink {
    fn success_cue(&mut self) -> anyhow::Result<()>;
    fn haptic(&mut self, pattern: HapticPattern) -> anyhow::Result<()>;
}

/// Feedback that only logs.
#[derive(Default)]
pub struct LogFeedback;

impl FeedbackSink for LogFeedback {
    fn success_cue(&mut self) -> anyhow::Result<()> {
        log::info!("hud: success cue");
        Ok(())
    }

    fn haptic(&mut self, pattern: HapticPattern) -> anyhow::Result<()> {
        log::info!("haptics: {pattern:?}");
        Ok(())
    }
}

/// What the controller did with a frame.
#[derive(Clone, Debug, PartialEq)]
pub enum ControllerAction {
    Saved,
    Drew { position: Vec3 },
    Erased { position: Vec3, removed: bool },
    PinchStarted,
    PinchReleased,
    Reset { bodies: Vec<BodyId> },
    Locked,
    Zoomed { camera_distance: f32, image_scale: f32 },
    Rotated { axis: RotationAxis, angle: f32 },
    GrabStarted(BodyId),
    GrabEnded(BodyId),
}

pub struct InteractionController {
    config: ControllerConfig,
    open_palm_threshold: f32,
    closed_fist_threshold: f32,
    mode: InteractionMode,
    pinch: PinchState,
    last_sample: Option<Vec3>,
    last_save: Option<Instant>,
    camera_distance: f32,
    image_scale: f32,
    grabbed: Option<BodyId>,
    /// The current open-palm activation has already reset the scene.
    palm_reset_fired: bool,
}

impl InteractionController {
    pub fn new(config: ControllerConfig, gestures: &GestureConfig) -> Self {
        Self {
            camera_distance: config.camera_distance,
            image_scale: 1.0,
            config,
            open_palm_threshold: gestures.open_palm_threshold,
            closed_fist_threshold: gestures.closed_fist_threshold,
            mode: InteractionMode::Draw,
            pinch: PinchState::Idle,
            last_sample: None,
            last_save: None,
            grabbed: None,
            palm_reset_fired: false,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn pinch_state(&self) -> PinchState {
        self.pinch
    }

    pub fn camera_distance(&self) -> f32 {
        self.camera_distance
    }

    pub fn image_scale(&self) -> f32 {
        self.image_scale
    }

    /// Switches between draw and erase; ignored while locked.
    pub fn set_mode(&mut self, mode: InteractionMode) {
        if self.mode == InteractionMode::Locked && mode != InteractionMode::Locked {
            log::info!("mode change to {mode:?} ignored while locked");
            return;
        }
        self.mode = mode;
    }

    pub fn unlock(&mut self) {
        if self.mode == InteractionMode::Locked {
            log::info!("mode: unlocked");
            self.mode = InteractionMode::Draw;
        }
    }

    pub fn handle_frame(
        &mut self,
        analysis: &FrameAnalysis,
        now: Instant,
        world: &mut PhysicsWorld,
        scene: &mut dyn SceneController,
        feedback: &mut dyn FeedbackSink,
    ) -> Vec<ControllerAction> {
        let mut actions = Vec::new();

        let Some(hand) = analysis.hands.first() else {
            self.pinch = PinchState::Idle;
            self.last_sample = None;
            self.palm_reset_fired = false;
            self.release_grab(world, &mut actions);
            return actions;
        };
        let tip = hand.index_tip();

        self.update_pinch(analysis, tip, &mut actions);
        self.handle_primary(analysis, now, world, feedback, &mut actions);

        if self.pinch == PinchState::Idle {
            self.draw_sample(analysis, tip, now, scene, &mut actions);
        } else {
            self.last_sample = Some(tip);
        }
        actions
    }

    fn update_pinch(&mut self, analysis: &FrameAnalysis, tip: Vec3, actions: &mut Vec<ControllerAction>) {
        let pinch = analysis.gesture(GestureKind::Pinch);
        match self.pinch {
            PinchState::Idle if pinch.is_some_and(|p| p.is_active) => {
                log::info!("pinch: drawing paused");
                self.pinch = PinchState::Pinching;
                actions.push(ControllerAction::PinchStarted);
            }
            PinchState::Pinching
                if analysis.confidence(GestureKind::Pinch) < self.config.pinch_release_confidence =>
            {
                log::info!("pinch released: drawing resumes on movement");
                self.pinch = PinchState::Idle;
                self.last_sample = Some(tip);
                actions.push(ControllerAction::PinchReleased);
            }
            _ => {}
        }
    }

    fn handle_primary(
        &mut self,
        analysis: &FrameAnalysis,
        now: Instant,
        world: &mut PhysicsWorld,
        feedback: &mut dyn FeedbackSink,
        actions: &mut Vec<ControllerAction>,
    ) {
        if analysis.primary != Some(GestureKind::TwoHandPinch) {
            self.release_grab(world, actions);
        }
        if analysis.primary != Some(GestureKind::OpenPalm) {
            self.palm_reset_fired = false;
        }
        let Some(result) = analysis.primary_result() else {
            return;
        };

        match result.payload {
            GesturePayload::OpenPalm(_) => {
                // Once per activation, on its first frame above the reset threshold.
                if !self.palm_reset_fired
                    && result.confidence > self.open_palm_threshold
                    && self.mode != InteractionMode::Locked
                {
                    self.palm_reset_fired = true;
                    self.reset_manipulated(now, world, feedback, actions);
                }
            }
            GesturePayload::ClosedFist(_) => {
                if result.is_active
                    && result.confidence >= self.closed_fist_threshold
                    && self.mode != InteractionMode::Locked
                {
                    log::info!("mode: locked");
                    self.mode = InteractionMode::Locked;
                    if let Err(err) = feedback.haptic(HapticPattern::Lock) {
                        log::debug!("haptic feedback unavailable: {err:?}");
                    }
                    actions.push(ControllerAction::Locked);
                }
            }
            GesturePayload::TwoHandZoom(zoom) if result.confidence > self.config.zoom_confidence => {
                self.zoom(zoom.direction, world);
                actions.push(ControllerAction::Zoomed {
                    camera_distance: self.camera_distance,
                    image_scale: self.image_scale,
                });
            }
            GesturePayload::Rotation(rotation) => {
                let targets = self.rotation_targets(world);
                let axis = rotation.axis.unit();
                for id in targets {
                    let torque = axis * rotation.angle * self.config.rotation_impulse_gain;
                    let direct = axis * rotation.angle * self.config.direct_rotation_factor;
                    if let Err(err) = world
                        .apply_rotation_impulse(id, torque)
                        .and_then(|_| world.rotate_by(id, direct))
                    {
                        log::warn!("rotation skipped: {err}");
                    }
                }
                actions.push(ControllerAction::Rotated {
                    axis: rotation.axis,
                    angle: rotation.angle,
                });
            }
            GesturePayload::TwoHandPinch(grab) => {
                let point = grab.center * self.config.world_extent;
                self.grab(point, now, world, actions);
            }
            _ => {}
        }
    }

    fn reset_manipulated(
        &mut self,
        now: Instant,
        world: &mut PhysicsWorld,
        feedback: &mut dyn FeedbackSink,
        actions: &mut Vec<ControllerAction>,
    ) {
        let bodies = world.bodies_with_tag(BodyTag::Manipulated);
        for id in &bodies {
            if let Err(err) = world.reset_object(*id, true, self.config.reset_duration(), now) {
                log::warn!("reset skipped: {err}");
            }
        }
        self.image_scale = 1.0;
        if let Err(err) = feedback.success_cue() {
            log::debug!("success cue failed: {err:?}");
        }
        log::info!("open palm: reset {} object(s)", bodies.len());
        actions.push(ControllerAction::Reset { bodies });
    }

    fn zoom(&mut self, direction: f32, world: &mut PhysicsWorld) {
        let manipulated = world.bodies_with_tag(BodyTag::Manipulated);
        if manipulated.is_empty() {
            let (min, max) = self.config.camera_distance_range;
            self.camera_distance =
                (self.camera_distance - direction * self.config.camera_zoom_step).clamp(min, max);
        } else {
            let (min, max) = self.config.image_scale_range;
            self.image_scale =
                (self.image_scale + direction * self.config.image_scale_step).clamp(min, max);
            for id in manipulated {
                if let Err(err) = world.set_uniform_scale(id, self.image_scale) {
                    log::warn!("scale skipped: {err}");
                }
            }
        }
    }

    fn rotation_targets(&self, world: &PhysicsWorld) -> Vec<BodyId> {
        let manipulated = world.bodies_with_tag(BodyTag::Manipulated);
        if manipulated.is_empty() {
            world.bodies_with_tag(BodyTag::SceneRoot)
        } else {
            manipulated
        }
    }

    fn grab(
        &mut self,
        point: Vec3,
        now: Instant,
        world: &mut PhysicsWorld,
        actions: &mut Vec<ControllerAction>,
    ) {
        let outcome = match self.grabbed {
            Some(id) => world.update_drag(id, point, now),
            None => {
                let Some(id) = world.bodies_with_tag(BodyTag::Manipulated).first().copied() else {
                    return;
                };
                self.grabbed = Some(id);
                actions.push(ControllerAction::GrabStarted(id));
                world.start_drag(id, point, now)
            }
        };
        if let Err(err) = outcome {
            log::warn!("grab lost: {err}");
            self.grabbed = None;
        }
    }

    fn release_grab(&mut self, world: &mut PhysicsWorld, actions: &mut Vec<ControllerAction>) {
        if let Some(id) = self.grabbed.take() {
            if let Err(err) = world.end_drag(id) {
                log::debug!("grabbed body vanished: {err}");
            }
            actions.push(ControllerAction::GrabEnded(id));
        }
    }

    fn draw_sample(
        &mut self,
        analysis: &FrameAnalysis,
        tip: Vec3,
        now: Instant,
        scene: &mut dyn SceneController,
        actions: &mut Vec<ControllerAction>,
    ) {
        let moving = analysis.confidence(GestureKind::Drag) > self.config.drag_confidence;
        let Some(last) = self.last_sample else {
            self.last_sample = Some(tip);
            return;
        };
        if !moving || last.distance(tip) <= self.config.move_epsilon {
            if !moving {
                self.last_sample = Some(tip);
            }
            return;
        }

        self.save_if_due(now, scene, actions);
        let position = to_interaction_space(tip) * self.config.world_extent;
        match self.mode {
            InteractionMode::Draw | InteractionMode::Locked => {
                scene.add_voxel(position, self.config.brush_color, self.config.brush_size);
                actions.push(ControllerAction::Drew { position });
            }
            InteractionMode::Erase => {
                let removed = scene.erase_voxel(position, self.config.erase_radius);
                actions.push(ControllerAction::Erased { position, removed });
            }
        }
        self.last_sample = Some(tip);
    }

    fn save_if_due(
        &mut self,
        now: Instant,
        scene: &mut dyn SceneController,
        actions: &mut Vec<ControllerAction>,
    ) {
        let due = self.last_save.is_none_or(|last| {
            now.saturating_duration_since(last) >= self.config.save_debounce()
        });
        if due {
            scene.save_state();
            self.last_save = Some(now);
            actions.push(ControllerAction::Saved);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, time::Duration};

    use super::*;
    use crate::{
        config::PhysicsConfig,
        synthetic::{HandPose, pose_hand},
        types::{
            DragPayload, GestureEvent, GestureEventKind, GestureResult, Hand, HandShapePayload,
            PinchPayload,
            RotationPayload, Transform, ZoomPayload,
        },
    };

    #[derive(Default)]
    struct RecordingScene {
        added: Vec<Vec3>,
        erased: Vec<Vec3>,
        saves: usize,
    }

    impl SceneController for RecordingScene {
        fn add_voxel(&mut self, position: Vec3, _color: u32, _size: f32) {
            self.added.push(position);
        }
        fn erase_voxel(&mut self, position: Vec3, _radius: f32) -> bool {
            self.erased.push(position);
            true
        }
        fn save_state(&mut self) {
            self.saves += 1;
        }
        fn undo(&mut self) -> bool {
            false
        }
        fn redo(&mut self) -> bool {
            false
        }
    }

    #[derive(Default)]
    struct FailingFeedback {
        cues: usize,
    }

    impl FeedbackSink for FailingFeedback {
        fn success_cue(&mut self) -> anyhow::Result<()> {
            self.cues += 1;
            Ok(())
        }
        fn haptic(&mut self, _pattern: HapticPattern) -> anyhow::Result<()> {
            anyhow::bail!("no vibration motor")
        }
    }

    struct Harness {
        controller: InteractionController,
        world: PhysicsWorld,
        scene: RecordingScene,
        feedback: FailingFeedback,
        start: Instant,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                controller: InteractionController::new(
                    ControllerConfig::default(),
                    &GestureConfig::default(),
                ),
                world: PhysicsWorld::new(PhysicsConfig::default()),
                scene: RecordingScene::default(),
                feedback: FailingFeedback::default(),
                start: Instant::now(),
            }
        }

        fn step(&mut self, at_ms: u64, analysis: &FrameAnalysis) -> Vec<ControllerAction> {
            self.controller.handle_frame(
                analysis,
                self.start + Duration::from_millis(at_ms),
                &mut self.world,
                &mut self.scene,
                &mut self.feedback,
            )
        }
    }

    fn hand_at(x: f32) -> Hand {
        pose_hand(HandPose::Point, Vec3::new(x, 0.5, 0.0))
    }

    fn analysis(hand: Hand, results: &[GestureResult], primary: Option<GestureKind>) -> FrameAnalysis {
        let gestures: BTreeMap<GestureKind, GestureResult> =
            results.iter().map(|r| (r.kind(), *r)).collect();
        let primary_confidence = primary
            .and_then(|k| gestures.get(&k))
            .map(|r| r.confidence)
            .unwrap_or(0.0);
        FrameAnalysis {
            gestures,
            primary,
            primary_confidence,
            events: Vec::new(),
            hands: vec![hand],
        }
    }

    fn drag(confidence: f32) -> GestureResult {
        GestureResult::new(
            true,
            confidence,
            GesturePayload::Drag(DragPayload {
                position: Vec3::ZERO,
                delta: Vec3::ZERO,
                movement: confidence / 50.0,
            }),
        )
    }

    fn pinch(active: bool, confidence: f32) -> GestureResult {
        GestureResult::new(
            active,
            confidence,
            GesturePayload::Pinch(PinchPayload {
                position: Vec3::ZERO,
                distance: 0.01,
                index_bent: true,
                thumb_bent: true,
            }),
        )
    }

    #[test]
    fn moving_index_draws_with_debounced_saves() {
        let mut h = Harness::new();
        h.step(0, &analysis(hand_at(0.40), &[drag(0.9)], None));
        h.step(33, &analysis(hand_at(0.42), &[drag(0.9)], None));
        h.step(66, &analysis(hand_at(0.44), &[drag(0.9)], None));
        h.step(600, &analysis(hand_at(0.46), &[drag(0.9)], None));

        assert_eq!(h.scene.added.len(), 3);
        assert_eq!(h.scene.saves, 2);
    }

    #[test]
    fn small_or_slow_motion_does_not_draw() {
        let mut h = Harness::new();
        h.step(0, &analysis(hand_at(0.40), &[drag(0.9)], None));
        h.step(33, &analysis(hand_at(0.405), &[drag(0.9)], None));
        h.step(66, &analysis(hand_at(0.45), &[drag(0.3)], None));
        assert!(h.scene.added.is_empty());
        assert_eq!(h.scene.saves, 0);
    }

    #[test]
    fn pinch_pauses_until_confidence_drops() {
        let mut h = Harness::new();
        h.step(0, &analysis(hand_at(0.40), &[drag(0.9)], None));
        let actions = h.step(33, &analysis(hand_at(0.45), &[pinch(true, 0.9), drag(0.9)], None));
        assert!(actions.contains(&ControllerAction::PinchStarted));
        assert_eq!(h.controller.pinch_state(), PinchState::Pinching);

        // Still above the release band: stays paused even though the gate is off.
        h.step(66, &analysis(hand_at(0.50), &[pinch(false, 0.55), drag(0.9)], None));
        assert_eq!(h.controller.pinch_state(), PinchState::Pinching);
        assert!(h.scene.added.is_empty());

        let actions = h.step(99, &analysis(hand_at(0.55), &[pinch(false, 0.2), drag(0.9)], None));
        assert!(actions.contains(&ControllerAction::PinchReleased));
        assert!(h.scene.added.is_empty());

        h.step(132, &analysis(hand_at(0.60), &[pinch(false, 0.2), drag(0.9)], None));
        assert_eq!(h.scene.added.len(), 1);
    }

    #[test]
    fn erase_mode_erases() {
        let mut h = Harness::new();
        h.controller.set_mode(InteractionMode::Erase);
        h.step(0, &analysis(hand_at(0.40), &[drag(0.9)], None));
        h.step(33, &analysis(hand_at(0.45), &[drag(0.9)], None));
        assert_eq!(h.scene.erased.len(), 1);
        assert!(h.scene.added.is_empty());
    }

    #[test]
    fn fist_locks_and_ignores_mode_changes() {
        let mut h = Harness::new();
        let fist = GestureResult::new(
            true,
            0.9,
            GesturePayload::ClosedFist(HandShapePayload {
                finger_count: 4,
                thumb_extended: false,
            }),
        );
        let actions = h.step(0, &analysis(hand_at(0.5), &[fist], Some(GestureKind::ClosedFist)));
        assert!(actions.contains(&ControllerAction::Locked));
        assert_eq!(h.controller.mode(), InteractionMode::Locked);

        h.controller.set_mode(InteractionMode::Erase);
        assert_eq!(h.controller.mode(), InteractionMode::Locked);
        h.controller.unlock();
        assert_eq!(h.controller.mode(), InteractionMode::Draw);
    }

    #[test]
    fn open_palm_start_resets_manipulated_objects() {
        let mut h = Harness::new();
        let id = h.world.register(
            Transform::from_position(Vec3::new(1.0, 0.0, 0.0)),
            1.0,
            BodyTag::Manipulated,
        );
        h.world.apply_impulse(id, Vec3::X).unwrap();

        let palm = GestureResult::new(
            true,
            0.95,
            GesturePayload::OpenPalm(HandShapePayload {
                finger_count: 4,
                thumb_extended: true,
            }),
        );
        let mut frame = analysis(hand_at(0.5), &[palm], Some(GestureKind::OpenPalm));
        frame.events.push(GestureEvent {
            kind: GestureEventKind::Start,
            gesture: GestureKind::OpenPalm,
            data: palm,
        });

        let actions = h.step(0, &frame);
        assert!(actions.contains(&ControllerAction::Reset { bodies: vec![id] }));
        assert_eq!(h.feedback.cues, 1);
        assert!(h.world.body(id).unwrap().is_animating());

        // Held palm does not fire again.
        frame.events.clear();
        h.step(33, &frame);
        assert_eq!(h.feedback.cues, 1);
    }

    fn palm(confidence: f32) -> GestureResult {
        GestureResult::new(
            true,
            confidence,
            GesturePayload::OpenPalm(HandShapePayload {
                finger_count: 4,
                thumb_extended: true,
            }),
        )
    }

    #[test]
    fn opening_hand_resets_once_it_clears_the_palm_threshold() {
        let mut h = Harness::new();
        let id = h.world.register(Transform::IDENTITY, 1.0, BodyTag::Manipulated);

        // Starts just above the arbiter threshold but below the reset one.
        let mut opening = analysis(hand_at(0.5), &[palm(0.675)], Some(GestureKind::OpenPalm));
        opening.events.push(GestureEvent {
            kind: GestureEventKind::Start,
            gesture: GestureKind::OpenPalm,
            data: palm(0.675),
        });
        assert!(h.step(0, &opening).is_empty());

        let mut resets = 0;
        for (i, confidence) in [0.75, 0.9, 1.0, 1.0, 1.0].into_iter().enumerate() {
            let frame = analysis(hand_at(0.5), &[palm(confidence)], Some(GestureKind::OpenPalm));
            let actions = h.step(33 * (i as u64 + 1), &frame);
            resets += actions
                .iter()
                .filter(|a| matches!(a, ControllerAction::Reset { .. }))
                .count();
        }
        assert_eq!(resets, 1);
        assert_eq!(h.feedback.cues, 1);
        assert!(h.world.body(id).unwrap().is_animating());
    }

    #[test]
    fn palm_rearms_after_it_stops_being_primary() {
        let mut h = Harness::new();
        let held = analysis(hand_at(0.5), &[palm(0.95)], Some(GestureKind::OpenPalm));
        h.step(0, &held);
        h.step(33, &held);
        assert_eq!(h.feedback.cues, 1);

        h.step(66, &analysis(hand_at(0.5), &[palm(0.5)], None));
        h.step(99, &held);
        assert_eq!(h.feedback.cues, 2);
    }

    #[test]
    fn palm_does_not_reset_while_locked() {
        let mut h = Harness::new();
        h.controller.mode = InteractionMode::Locked;
        let held = analysis(hand_at(0.5), &[palm(0.95)], Some(GestureKind::OpenPalm));
        h.step(0, &held);
        assert_eq!(h.feedback.cues, 0);
    }

    #[test]
    fn zoom_clamps_camera_distance() {
        let mut h = Harness::new();
        let zoom = GestureResult::new(
            true,
            1.0,
            GesturePayload::TwoHandZoom(ZoomPayload {
                direction: 1.0,
                zoom_factor: 1.2,
                normalized_change: 0.3,
            }),
        );
        let frame = analysis(hand_at(0.5), &[zoom], Some(GestureKind::TwoHandZoom));
        for i in 0..40 {
            h.step(i * 33, &frame);
        }
        assert_eq!(h.controller.camera_distance(), 1.0);
    }

    #[test]
    fn zoom_scales_manipulated_object_within_range() {
        let mut h = Harness::new();
        let id = h.world.register(Transform::IDENTITY, 1.0, BodyTag::Manipulated);
        let zoom = GestureResult::new(
            true,
            1.0,
            GesturePayload::TwoHandZoom(ZoomPayload {
                direction: -1.0,
                zoom_factor: 0.8,
                normalized_change: -0.3,
            }),
        );
        let frame = analysis(hand_at(0.5), &[zoom], Some(GestureKind::TwoHandZoom));
        for i in 0..20 {
            h.step(i * 33, &frame);
        }
        assert_eq!(h.controller.image_scale(), 0.5);
        assert_eq!(h.world.body(id).unwrap().scale(), Vec3::splat(0.5));
    }

    #[test]
    fn rotation_applies_direct_turn_and_impulse() {
        let mut h = Harness::new();
        let root = h.world.register(Transform::IDENTITY, 1.0, BodyTag::SceneRoot);
        let rotation = GestureResult::new(
            true,
            0.9,
            GesturePayload::Rotation(RotationPayload {
                axis: RotationAxis::Y,
                angle: 0.5,
            }),
        );
        h.step(0, &analysis(hand_at(0.5), &[rotation], Some(GestureKind::Rotation)));

        let body = h.world.body(root).unwrap();
        assert!((body.rotation().y - 0.05).abs() < 1e-6);
        assert!((body.rotation_velocity.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn hand_loss_clears_pinch_state() {
        let mut h = Harness::new();
        h.step(0, &analysis(hand_at(0.5), &[pinch(true, 0.9)], None));
        assert_eq!(h.controller.pinch_state(), PinchState::Pinching);
        h.step(33, &FrameAnalysis::default());
        assert_eq!(h.controller.pinch_state(), PinchState::Idle);
    }
}
