use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use glam::Vec3;
use gesture_forge::{
    Config, GestureArbiter, GestureEngine, InteractionMode, LogFeedback, SceneController,
    VoxelScene,
    config::GestureConfig,
    controller::ControllerAction,
    gesture::{classify_pinch, classify_two_hand_zoom, pinch_confidence},
    physics::{BodyTag, PhysicsWorld},
    synthetic::{HandPose, demo_script, pose_hand, render_script},
    types::{
        Frame, GestureEvent, GestureEventKind, GestureKind, GesturePayload, Hand, Transform,
        joints,
    },
};

const FRAME: Duration = Duration::from_millis(33);

fn frame_of(hands: &[Hand], at: Instant) -> Frame {
    Frame::new(hands.iter().map(|h| h.landmarks().to_vec()).collect(), at)
}

/// Every landmark on the wrist except the index tip.
fn pointer(wrist: Vec3, index_tip: Vec3) -> Hand {
    let mut hand = Hand::new([wrist; 21]);
    hand.landmarks_mut()[joints::INDEX_TIP] = index_tip;
    hand
}

#[test]
fn separating_index_tips_zoom_in() {
    let left_wrist = Vec3::new(0.35, 0.5, 0.0);
    let right_wrist = Vec3::new(0.65, 0.5, 0.0);
    let before = [
        pointer(left_wrist, Vec3::new(0.25, 0.5, 0.0)),
        pointer(right_wrist, Vec3::new(0.75, 0.5, 0.0)),
    ];
    let after = [
        pointer(left_wrist, Vec3::new(0.2, 0.5, 0.0)),
        pointer(right_wrist, Vec3::new(0.8, 0.5, 0.0)),
    ];

    let zoom = classify_two_hand_zoom(
        [&after[0], &after[1]],
        [&before[0], &before[1]],
        GestureConfig::default().two_hand_zoom_threshold,
    )
    .unwrap();
    assert!(zoom.is_active);
    assert_eq!(zoom.confidence, 1.0);
    let GesturePayload::TwoHandZoom(payload) = zoom.payload else {
        panic!("expected a zoom payload, got {:?}", zoom.payload);
    };
    assert_eq!(payload.direction, 1.0);
    assert!((payload.normalized_change - 0.1 / 0.3).abs() < 1e-4);

    // Through the smoother the change is damped but still saturates.
    let mut arbiter = GestureArbiter::new(GestureConfig::default());
    let start = Instant::now();
    arbiter.analyze(&frame_of(&before, start)).unwrap();
    let analysis = arbiter.analyze(&frame_of(&after, start + FRAME)).unwrap();
    assert_eq!(analysis.primary, Some(GestureKind::TwoHandZoom));
    assert_eq!(analysis.primary_confidence, 1.0);
}

/// Index and thumb tips 0.03 apart, both bent toward each other.
fn boundary_pinch() -> Hand {
    let mut hand = pose_hand(HandPose::Pinch, Vec3::new(0.5, 0.5, 0.0));
    let index_tip = hand.index_tip();
    hand.landmarks_mut()[joints::THUMB_TIP] = index_tip + Vec3::new(0.0, 0.03, 0.0);
    hand
}

#[test]
fn pinch_at_threshold_boundary() {
    assert!((pinch_confidence(0.03, 0.06, true) - 0.65).abs() < 1e-6);

    let hand = boundary_pinch();
    let config = GestureConfig::default();
    let pinch = classify_pinch(&hand, config.pinch_threshold, config.pinch_model);
    assert!(pinch.is_active);
    assert!((pinch.confidence - 0.65).abs() < 1e-3);

    // Pin the threshold to the exact computed confidence to test both modes.
    let strict = GestureConfig {
        confidence_threshold: pinch.confidence,
        inclusive_threshold: false,
        ..GestureConfig::default()
    };
    let mut arbiter = GestureArbiter::new(strict.clone());
    let analysis = arbiter.analyze(&frame_of(&[hand], Instant::now())).unwrap();
    assert_eq!(analysis.primary, None);
    assert!(analysis.events.is_empty());

    let inclusive = GestureConfig {
        inclusive_threshold: true,
        ..strict
    };
    let mut arbiter = GestureArbiter::new(inclusive);
    let analysis = arbiter.analyze(&frame_of(&[hand], Instant::now())).unwrap();
    assert_eq!(analysis.primary, Some(GestureKind::Pinch));
    assert_eq!(analysis.events[0].kind, GestureEventKind::Start);
}

#[test]
fn animated_reset_lands_on_original_transform() {
    let mut world = PhysicsWorld::new(Default::default());
    let original = Transform {
        position: Vec3::new(0.5, -1.0, 2.0),
        rotation: Vec3::new(0.1, 0.2, 0.3),
        scale: Vec3::splat(1.5),
    };
    let id = world.register(original, 2.0, BodyTag::Manipulated);
    world.apply_impulse(id, Vec3::new(4.0, 2.0, 0.0)).unwrap();
    world.apply_rotation_impulse(id, Vec3::new(0.0, 3.0, 0.0)).unwrap();
    world.set_uniform_scale(id, 3.0).unwrap();
    for _ in 0..10 {
        world.update(1.0 / 60.0);
    }
    assert_ne!(world.transform(id).unwrap(), original);

    let now = Instant::now();
    let duration = Duration::from_millis(600);
    let tween = world.reset_object(id, true, duration, now).unwrap();
    assert!(tween.is_some());

    world.update(1.0 / 60.0);
    let halfway = world.advance_tweens(now + duration / 2);
    assert!(halfway.is_empty());

    let finished = world.advance_tweens(now + duration);
    assert_eq!(finished, vec![tween.unwrap()]);
    let landed = world.transform(id).unwrap();
    assert_eq!(landed.position, original.position);
    assert_eq!(landed.rotation, original.rotation);
    assert_eq!(landed.scale, original.scale);
}

#[test]
fn gesture_lifecycle_has_one_start_and_one_end() {
    let config = GestureConfig {
        smoothing_factor: 1.0,
        ..GestureConfig::default()
    };
    let mut arbiter = GestureArbiter::new(config);
    let (tx, rx) = crossbeam_channel::unbounded();
    arbiter.add_listener(tx);

    let center = Vec3::new(0.5, 0.5, 0.0);
    let fist = pose_hand(HandPose::Fist, center);
    let point = pose_hand(HandPose::Point, center);
    let start = Instant::now();
    for i in 0..3 {
        let analysis = arbiter.analyze(&frame_of(&[fist], start + FRAME * i)).unwrap();
        assert_eq!(analysis.primary, Some(GestureKind::ClosedFist));
    }
    let analysis = arbiter.analyze(&frame_of(&[point], start + FRAME * 3)).unwrap();
    assert_ne!(analysis.primary, Some(GestureKind::ClosedFist));

    let kinds: Vec<GestureEventKind> = rx
        .try_iter()
        .filter(|e: &GestureEvent| e.gesture == GestureKind::ClosedFist)
        .map(|e| e.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            GestureEventKind::Start,
            GestureEventKind::Update,
            GestureEventKind::Update,
            GestureEventKind::End,
        ]
    );
}

#[test]
fn scripted_session_draws_resets_and_locks() {
    let mut engine = GestureEngine::new(Config::default()).unwrap();
    let (tx, rx) = crossbeam_channel::unbounded();
    engine.add_listener(tx);
    engine
        .world_mut()
        .register(Transform::IDENTITY, 1.0, BodyTag::Manipulated);
    engine
        .world_mut()
        .register(Transform::IDENTITY, 5.0, BodyTag::SceneRoot);

    let mut scene = VoxelScene::new(0.2);
    let mut feedback = LogFeedback;
    let start = Instant::now();
    let mut actions = Vec::new();

    for (i, hands) in render_script(&demo_script()).into_iter().enumerate() {
        let now = start + FRAME * i as u32;
        let outcome = engine
            .on_frame(&Frame::new(hands, now), &mut scene, &mut feedback)
            .unwrap();
        actions.extend(outcome.actions);
        engine.on_render_tick(FRAME.as_secs_f32(), now);
    }

    assert!(!scene.is_empty());
    assert!(scene.undo());
    assert!(
        actions
            .iter()
            .any(|a| matches!(a, ControllerAction::Reset { bodies } if bodies.len() == 1))
    );
    assert!(actions.contains(&ControllerAction::Locked));
    assert_eq!(engine.controller().mode(), InteractionMode::Locked);

    // The trailing empty frames end everything that started.
    let mut balance: HashMap<GestureKind, i32> = HashMap::new();
    for event in rx.try_iter() {
        match event.kind {
            GestureEventKind::Start => *balance.entry(event.gesture).or_default() += 1,
            GestureEventKind::End => *balance.entry(event.gesture).or_default() -= 1,
            GestureEventKind::Update => {}
        }
    }
    assert!(balance.values().all(|count| *count == 0), "{balance:?}");
    assert!(engine.arbiter().active().is_empty());
}

fn blend(from: &Hand, to: &Hand, t: f32) -> Hand {
    let mut out = *from;
    for (p, goal) in out.landmarks_mut().iter_mut().zip(to.landmarks()) {
        *p = p.lerp(*goal, t);
    }
    out
}

fn count_resets(actions: &[ControllerAction]) -> usize {
    actions
        .iter()
        .filter(|a| matches!(a, ControllerAction::Reset { .. }))
        .count()
}

#[test]
fn gradually_opening_hand_resets_exactly_once() {
    let mut engine = GestureEngine::new(Config::default()).unwrap();
    engine
        .world_mut()
        .register(Transform::from_position(Vec3::X), 1.0, BodyTag::Manipulated);
    let mut scene = VoxelScene::new(0.2);
    let mut feedback = LogFeedback;

    let center = Vec3::new(0.5, 0.5, 0.0);
    let point = pose_hand(HandPose::Point, center);
    let open = pose_hand(HandPose::Open, center);
    let start = Instant::now();
    let mut resets = 0;
    let mut palm_peak = 0.0f32;

    for i in 0..60u32 {
        let t = (i as f32 / 19.0).min(1.0);
        let hand = blend(&point, &open, t);
        let outcome = engine
            .on_frame(&frame_of(&[hand], start + FRAME * i), &mut scene, &mut feedback)
            .unwrap();
        palm_peak = palm_peak.max(outcome.analysis.confidence(GestureKind::OpenPalm));
        resets += count_resets(&outcome.actions);
    }

    assert!(palm_peak > 0.99);
    assert_eq!(resets, 1);
}

#[test]
fn fast_stroke_draws_without_turning_the_object() {
    let mut engine = GestureEngine::new(Config::default()).unwrap();
    let id = engine
        .world_mut()
        .register(Transform::IDENTITY, 1.0, BodyTag::Manipulated);
    let mut scene = VoxelScene::new(0.2);
    let mut feedback = LogFeedback;
    let start = Instant::now();
    let mut primaries = Vec::new();
    let mut actions = Vec::new();

    for i in 0..12u32 {
        let hand = pose_hand(HandPose::Point, Vec3::new(0.15 + 0.06 * i as f32, 0.5, 0.0));
        let outcome = engine
            .on_frame(&frame_of(&[hand], start + FRAME * i), &mut scene, &mut feedback)
            .unwrap();
        primaries.extend(outcome.analysis.primary);
        actions.extend(outcome.actions);
    }

    assert!(primaries.contains(&GestureKind::Drag));
    assert!(!primaries.contains(&GestureKind::Rotation));
    assert!(
        !actions
            .iter()
            .any(|a| matches!(a, ControllerAction::Rotated { .. }))
    );
    assert_eq!(engine.world().body(id).unwrap().rotation(), Vec3::ZERO);
    assert!(!scene.is_empty());
}
