//! Per-frame geometric gesture tests.
//!
//! Every test pairs a binary gate (`is_active`) with a continuous confidence
//! so near-simultaneous candidates can be ranked instead of flickering on the
//! gate alone. Motion gestures compare against the previous frame's hand and
//! are skipped when there is nothing to compare against.

use std::f32::consts::PI;

use glam::Vec3;

use crate::{
    config::{GestureConfig, PinchModel},
    types::{
        DragPayload, GesturePayload, GestureResult, Hand, HandShapePayload, PinchPayload,
        RotationAxis, RotationPayload, TwoHandDirection, TwoHandPinchPayload,
        TwoHandRotationPayload, ZoomPayload, clamp01, joints, to_interaction_space,
    },
};

const PINCH_DISTANCE_WEIGHT: f32 = 0.7;
const PINCH_BEND_WEIGHT: f32 = 0.3;

const MIN_SHAPE_FINGERS: usize = 3;
const SHAPE_GAIN: f32 = 5.0;
const THUMB_SPREAD: f32 = 0.05;

const DRAG_MIN_MOVEMENT: f32 = 0.005;
const DRAG_GAIN: f32 = 50.0;

const ROTATION_MIN_MOVEMENT: f32 = 0.01;
const ROTATION_GAIN: f32 = 20.0;
/// Radians of rotation per normalized unit of hand travel.
const ROTATION_ANGLE_SCALE: f32 = PI;

const ZOOM_GAIN: f32 = 10.0;
const MIN_WRIST_SPAN: f32 = 1e-3;

const TWO_HAND_ROTATION_MIN_DELTA: f32 = 0.005;
const TWO_HAND_ROTATION_GAIN: f32 = 20.0;

const TWO_HAND_PINCH_THUMB_DISTANCE: f32 = 0.1;
const TWO_HAND_PINCH_INDEX_DISTANCE: f32 = 0.15;

pub struct GestureClassifier {
    config: GestureConfig,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Single-hand gestures in declaration order.
    pub fn classify_hand(&self, hand: &Hand, previous: Option<&Hand>) -> Vec<GestureResult> {
        let mut results = vec![
            classify_pinch(hand, self.config.pinch_threshold, self.config.pinch_model),
            classify_open_palm(hand),
            classify_closed_fist(hand),
        ];
        if let Some(previous) = previous {
            results.push(classify_drag(hand, previous));
            results.push(classify_rotation(hand, previous));
        }
        results
    }

    /// Two-hand gestures in declaration order.
    pub fn classify_pair(
        &self,
        hands: [&Hand; 2],
        previous: Option<[&Hand; 2]>,
    ) -> Vec<GestureResult> {
        let mut results = Vec::with_capacity(3);
        if let Some(previous) = previous {
            results.extend(classify_two_hand_zoom(
                hands,
                previous,
                self.config.two_hand_zoom_threshold,
            ));
            results.push(classify_two_hand_rotation(hands, previous));
        }
        results.push(classify_two_hand_pinch(hands));
        results
    }
}

/// Tip sits below (image y greater than) the reference joint.
fn is_below(hand: &Hand, tip: usize, reference: usize) -> bool {
    hand.joint(tip).y > hand.joint(reference).y
}

pub fn pinch_confidence(distance: f32, threshold: f32, both_bent: bool) -> f32 {
    let closeness = clamp01(1.0 - distance / threshold);
    let bend = if both_bent { 1.0 } else { 0.0 };
    clamp01(PINCH_DISTANCE_WEIGHT * closeness + PINCH_BEND_WEIGHT * bend)
}

pub fn classify_pinch(hand: &Hand, threshold: f32, model: PinchModel) -> GestureResult {
    let thumb = hand.thumb_tip();
    let index = hand.index_tip();
    let distance = thumb.distance(index);

    let index_bent = is_below(hand, joints::INDEX_TIP, joints::INDEX_PIP);
    let thumb_bent = is_below(hand, joints::THUMB_TIP, joints::THUMB_IP);
    let both_bent = index_bent && thumb_bent;

    let (is_active, confidence) = match model {
        PinchModel::Bent => (
            distance < threshold && both_bent,
            pinch_confidence(distance, threshold, both_bent),
        ),
        PinchModel::DistanceOnly => (distance < threshold, clamp01(1.0 - distance / threshold)),
    };

    GestureResult::new(
        is_active,
        confidence,
        GesturePayload::Pinch(PinchPayload {
            position: to_interaction_space((thumb + index) * 0.5),
            distance,
            index_bent,
            thumb_bent,
        }),
    )
}

fn thumb_extended(hand: &Hand) -> bool {
    (hand.thumb_tip().x - hand.joint(joints::INDEX_MCP).x).abs() > THUMB_SPREAD
}

/// Shared scoring for open palm and closed fist.
///
/// `offset` is the signed tip-to-pip offset that counts toward the shape.
fn hand_shape<F>(hand: &Hand, offset: F, count_thumb: bool) -> (usize, usize, f32, bool)
where
    F: Fn(Vec3, Vec3) -> f32,
{
    let mut fingers = 0;
    let mut strength = 0.0;
    for (tip, pip) in joints::FINGER_TIP_PIP {
        let amount = offset(hand.joint(tip), hand.joint(pip));
        if amount > 0.0 {
            fingers += 1;
        }
        strength += clamp01(amount * SHAPE_GAIN);
    }

    let thumb = thumb_extended(hand);
    let counted = fingers + usize::from(count_thumb && thumb);
    let score = (strength / 4.0) * (counted.min(4) as f32 / 4.0);
    (fingers, counted, score, thumb)
}

pub fn classify_open_palm(hand: &Hand) -> GestureResult {
    let (fingers, counted, score, thumb) = hand_shape(hand, |tip, pip| pip.y - tip.y, true);
    GestureResult::new(
        counted >= MIN_SHAPE_FINGERS,
        score,
        GesturePayload::OpenPalm(HandShapePayload {
            finger_count: fingers,
            thumb_extended: thumb,
        }),
    )
}

pub fn classify_closed_fist(hand: &Hand) -> GestureResult {
    let (fingers, counted, score, thumb) = hand_shape(hand, |tip, pip| tip.y - pip.y, false);
    GestureResult::new(
        counted >= MIN_SHAPE_FINGERS,
        score,
        GesturePayload::ClosedFist(HandShapePayload {
            finger_count: fingers,
            thumb_extended: thumb,
        }),
    )
}

pub fn classify_drag(hand: &Hand, previous: &Hand) -> GestureResult {
    let delta = hand.index_tip() - previous.index_tip();
    let movement = delta.length();
    GestureResult::new(
        movement > DRAG_MIN_MOVEMENT,
        clamp01(movement * DRAG_GAIN),
        GesturePayload::Drag(DragPayload {
            position: to_interaction_space(hand.index_tip()),
            delta,
            movement,
        }),
    )
}

pub fn classify_rotation(hand: &Hand, previous: &Hand) -> GestureResult {
    let wrist_delta = hand.wrist() - previous.wrist();
    let index_delta = hand.index_tip() - previous.index_tip();
    // Mean of wrist and index-tip travel, so a wrist-anchored roll still counts.
    let movement = 0.5 * (wrist_delta.length() + index_delta.length());

    // Index tip rolling sideways relative to the wrist reads as a Z roll.
    let lateral = index_delta.x - wrist_delta.x;
    let (axis, signal) = if lateral.abs() > ROTATION_MIN_MOVEMENT {
        (RotationAxis::Z, lateral)
    } else if wrist_delta.x.abs() > wrist_delta.y.abs() {
        (RotationAxis::Y, wrist_delta.x)
    } else {
        (RotationAxis::X, wrist_delta.y)
    };

    GestureResult::new(
        movement > ROTATION_MIN_MOVEMENT,
        clamp01(movement * ROTATION_GAIN),
        GesturePayload::Rotation(RotationPayload {
            axis,
            angle: signal * ROTATION_ANGLE_SCALE,
        }),
    )
}

pub fn classify_two_hand_zoom(
    hands: [&Hand; 2],
    previous: [&Hand; 2],
    threshold: f32,
) -> Option<GestureResult> {
    let wrist_span = hands[0].wrist().distance(hands[1].wrist());
    if wrist_span < MIN_WRIST_SPAN {
        return None;
    }

    let current = hands[0].index_tip().distance(hands[1].index_tip());
    let before = previous[0].index_tip().distance(previous[1].index_tip());
    let normalized_change = (current - before) / wrist_span;
    let direction = if normalized_change >= 0.0 { 1.0 } else { -1.0 };
    let zoom_factor = if before > f32::EPSILON {
        current / before
    } else {
        1.0
    };

    Some(GestureResult::new(
        normalized_change.abs() > threshold,
        clamp01(normalized_change.abs() * ZOOM_GAIN),
        GesturePayload::TwoHandZoom(ZoomPayload {
            direction,
            zoom_factor,
            normalized_change,
        }),
    ))
}

pub fn classify_two_hand_rotation(
    hands: [&Hand; 2],
    previous: [&Hand; 2],
) -> GestureResult {
    let first = hands[0].wrist().x - previous[0].wrist().x;
    let second = hands[1].wrist().x - previous[1].wrist().x;

    let direction = if first.signum() == second.signum() {
        TwoHandDirection::Rotate {
            clockwise: first > 0.0,
        }
    } else {
        let span_now = (hands[0].wrist().x - hands[1].wrist().x).abs();
        let span_before = (previous[0].wrist().x - previous[1].wrist().x).abs();
        if span_now > span_before {
            TwoHandDirection::Spread
        } else {
            TwoHandDirection::Pinch
        }
    };

    GestureResult::new(
        first.abs() > TWO_HAND_ROTATION_MIN_DELTA && second.abs() > TWO_HAND_ROTATION_MIN_DELTA,
        clamp01((first.abs() + second.abs()) * TWO_HAND_ROTATION_GAIN),
        GesturePayload::TwoHandRotation(TwoHandRotationPayload {
            direction,
            first_delta: first,
            second_delta: second,
        }),
    )
}

pub fn classify_two_hand_pinch(hands: [&Hand; 2]) -> GestureResult {
    let thumb_distance = hands[0].thumb_tip().distance(hands[1].thumb_tip());
    let index_distance = hands[0].index_tip().distance(hands[1].index_tip());
    let center = (hands[0].thumb_tip()
        + hands[1].thumb_tip()
        + hands[0].index_tip()
        + hands[1].index_tip())
        * 0.25;

    GestureResult::new(
        thumb_distance < TWO_HAND_PINCH_THUMB_DISTANCE
            && index_distance < TWO_HAND_PINCH_INDEX_DISTANCE,
        clamp01(1.0 - thumb_distance * 10.0),
        GesturePayload::TwoHandPinch(TwoHandPinchPayload {
            thumb_distance,
            index_distance,
            center: to_interaction_space(center),
        }),
    )
}
