use std::time::Instant;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, MalformedReason, Result};

/// One tracked point of a hand in normalized input space.
///
/// x/y are image-relative in [0, 1] (y grows downward), z is relative depth
/// where more negative means closer to the camera.
pub type Landmark = Vec3;

pub const NUM_LANDMARKS: usize = 21;
pub const MAX_HANDS: usize = 2;

/// Landmark indices by anatomical role.
pub mod joints {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;

    /// (tip, pip) pairs for index, middle, ring and pinky.
    pub const FINGER_TIP_PIP: [(usize, usize); 4] = [
        (INDEX_TIP, INDEX_PIP),
        (MIDDLE_TIP, MIDDLE_PIP),
        (RING_TIP, RING_PIP),
        (PINKY_TIP, PINKY_PIP),
    ];
}

/// A validated hand: exactly 21 finite landmarks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hand {
    landmarks: [Landmark; NUM_LANDMARKS],
}

impl Hand {
    pub fn new(landmarks: [Landmark; NUM_LANDMARKS]) -> Self {
        Self { landmarks }
    }

    /// Validates a raw landmark slice coming from the detector.
    ///
    /// `slot` is only used to label the error.
    pub fn from_slice(slot: usize, raw: &[Landmark]) -> Result<Self> {
        if raw.len() != NUM_LANDMARKS {
            return Err(CoreError::MalformedInput {
                hand: slot,
                reason: MalformedReason::LandmarkCount(raw.len()),
            });
        }
        if let Some(joint) = raw.iter().position(|p| !p.is_finite()) {
            return Err(CoreError::MalformedInput {
                hand: slot,
                reason: MalformedReason::NonFinite(joint),
            });
        }

        let mut landmarks = [Vec3::ZERO; NUM_LANDMARKS];
        landmarks.copy_from_slice(raw);
        Ok(Self { landmarks })
    }

    pub fn landmarks(&self) -> &[Landmark; NUM_LANDMARKS] {
        &self.landmarks
    }

    pub fn landmarks_mut(&mut self) -> &mut [Landmark; NUM_LANDMARKS] {
        &mut self.landmarks
    }

    pub fn joint(&self, index: usize) -> Landmark {
        self.landmarks[index]
    }

    pub fn wrist(&self) -> Landmark {
        self.landmarks[joints::WRIST]
    }

    pub fn thumb_tip(&self) -> Landmark {
        self.landmarks[joints::THUMB_TIP]
    }

    pub fn index_tip(&self) -> Landmark {
        self.landmarks[joints::INDEX_TIP]
    }
}

/// Maps a normalized landmark into the mirrored interaction space.
///
/// The camera image is mirrored so moving the hand right moves the cursor
/// right; the result spans [-1, 1] on x/y with +y up.
pub fn to_interaction_space(point: Landmark) -> Vec3 {
    Vec3::new((0.5 - point.x) * 2.0, (0.5 - point.y) * 2.0, -point.z * 2.0)
}

/// One detector output: up to two raw hands plus the capture time.
#[derive(Clone, Debug)]
pub struct Frame {
    pub hands: Vec<Vec<Landmark>>,
    pub timestamp: Instant,
}

impl Frame {
    pub fn new(hands: Vec<Vec<Landmark>>, timestamp: Instant) -> Self {
        Self { hands, timestamp }
    }

    pub fn empty(timestamp: Instant) -> Self {
        Self {
            hands: Vec::new(),
            timestamp,
        }
    }
}

/// Gesture names in tie-break order: earlier variants win equal confidence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GestureKind {
    Pinch,
    OpenPalm,
    ClosedFist,
    TwoHandZoom,
    Drag,
    Rotation,
    TwoHandRotation,
    TwoHandPinch,
}

impl GestureKind {
    pub const ALL: [GestureKind; 8] = [
        GestureKind::Pinch,
        GestureKind::OpenPalm,
        GestureKind::ClosedFist,
        GestureKind::TwoHandZoom,
        GestureKind::Drag,
        GestureKind::Rotation,
        GestureKind::TwoHandRotation,
        GestureKind::TwoHandPinch,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GestureKind::Pinch => "pinch",
            GestureKind::OpenPalm => "openPalm",
            GestureKind::ClosedFist => "closedFist",
            GestureKind::TwoHandZoom => "twoHandZoom",
            GestureKind::Rotation => "rotation",
            GestureKind::Drag => "drag",
            GestureKind::TwoHandRotation => "twoHandRotation",
            GestureKind::TwoHandPinch => "twoHandPinch",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            GestureKind::Pinch => "🤏 ",
            GestureKind::OpenPalm => "🖐 ",
            GestureKind::ClosedFist => "✊ ",
            GestureKind::TwoHandZoom => "🙌 ",
            GestureKind::Rotation => "🔄 ",
            GestureKind::Drag => "👉 ",
            GestureKind::TwoHandRotation => "👐 ",
            GestureKind::TwoHandPinch => "🫶 ",
        }
    }

    /// Position in the tie-break order.
    pub fn priority(&self) -> usize {
        *self as usize
    }

    pub fn is_two_handed(&self) -> bool {
        matches!(
            self,
            GestureKind::TwoHandZoom | GestureKind::TwoHandRotation | GestureKind::TwoHandPinch
        )
    }
}

impl std::fmt::Display for GestureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationAxis {
    X,
    Y,
    Z,
}

impl RotationAxis {
    pub fn unit(&self) -> Vec3 {
        match self {
            RotationAxis::X => Vec3::X,
            RotationAxis::Y => Vec3::Y,
            RotationAxis::Z => Vec3::Z,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TwoHandDirection {
    /// Both wrists moved the same way; the sign follows the motion.
    Rotate { clockwise: bool },
    Spread,
    Pinch,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PinchPayload {
    /// Midpoint of thumb and index tip in interaction space.
    pub position: Vec3,
    pub distance: f32,
    pub index_bent: bool,
    pub thumb_bent: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandShapePayload {
    /// Index..pinky fingers meeting the shape (extended or curled).
    pub finger_count: usize,
    pub thumb_extended: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DragPayload {
    /// Index tip in interaction space.
    pub position: Vec3,
    /// Raw index tip displacement since the previous frame.
    pub delta: Vec3,
    pub movement: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotationPayload {
    pub axis: RotationAxis,
    /// Signed angle delta in radians.
    pub angle: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoomPayload {
    /// +1 when the hands separate, -1 when they approach.
    pub direction: f32,
    pub zoom_factor: f32,
    pub normalized_change: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TwoHandRotationPayload {
    pub direction: TwoHandDirection,
    pub first_delta: f32,
    pub second_delta: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TwoHandPinchPayload {
    pub thumb_distance: f32,
    pub index_distance: f32,
    /// Midpoint of the four tips in interaction space.
    pub center: Vec3,
}

/// Per-gesture data, discriminated by gesture kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GesturePayload {
    Pinch(PinchPayload),
    OpenPalm(HandShapePayload),
    ClosedFist(HandShapePayload),
    Drag(DragPayload),
    Rotation(RotationPayload),
    TwoHandZoom(ZoomPayload),
    TwoHandRotation(TwoHandRotationPayload),
    TwoHandPinch(TwoHandPinchPayload),
}

impl GesturePayload {
    pub fn kind(&self) -> GestureKind {
        match self {
            GesturePayload::Pinch(_) => GestureKind::Pinch,
            GesturePayload::OpenPalm(_) => GestureKind::OpenPalm,
            GesturePayload::ClosedFist(_) => GestureKind::ClosedFist,
            GesturePayload::Drag(_) => GestureKind::Drag,
            GesturePayload::Rotation(_) => GestureKind::Rotation,
            GesturePayload::TwoHandZoom(_) => GestureKind::TwoHandZoom,
            GesturePayload::TwoHandRotation(_) => GestureKind::TwoHandRotation,
            GesturePayload::TwoHandPinch(_) => GestureKind::TwoHandPinch,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GestureResult {
    /// The gesture's own geometric criterion is met.
    pub is_active: bool,
    /// Always within [0, 1].
    pub confidence: f32,
    pub payload: GesturePayload,
}

impl GestureResult {
    pub fn new(is_active: bool, confidence: f32, payload: GesturePayload) -> Self {
        Self {
            is_active,
            confidence: clamp01(confidence),
            payload,
        }
    }

    pub fn kind(&self) -> GestureKind {
        self.payload.kind()
    }

    pub fn display_text(&self) -> String {
        let kind = self.kind();
        format!(
            "{}{} ({:.0}%)",
            kind.emoji(),
            kind.name(),
            self.confidence * 100.0
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GestureEventKind {
    Start,
    Update,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GestureEvent {
    pub kind: GestureEventKind,
    pub gesture: GestureKind,
    pub data: GestureResult,
}

/// Position, Euler XYZ rotation (radians) and scale of a renderable object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

pub(crate) fn clamp01(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
