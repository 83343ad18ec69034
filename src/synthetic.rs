//! Parametric hand poses and a scripted session.
//!
//! Stands in for the external landmark detector when no replay file is given,
//! and gives tests anatomically consistent hands.

use std::f32::consts::TAU;

use glam::Vec3;

use crate::types::{Hand, Landmark, NUM_LANDMARKS, joints};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandPose {
    /// All fingers extended, thumb spread sideways.
    Open,
    /// All fingers curled below their PIP joints, thumb tucked.
    Fist,
    /// Thumb and index tips touching, both bent; other fingers extended.
    Pinch,
    /// Index extended, everything else curled.
    Point,
}

const FINGER_X: [f32; 4] = [-0.06, -0.02, 0.02, 0.06];
const MCP_Y: f32 = 0.05;
const PIP_Y: f32 = -0.05;

fn extended(x: f32) -> [Vec3; 4] {
    [
        Vec3::new(x, MCP_Y, 0.0),
        Vec3::new(x, PIP_Y, -0.01),
        Vec3::new(x, -0.15, -0.02),
        Vec3::new(x, -0.25, -0.03),
    ]
}

fn curled(x: f32) -> [Vec3; 4] {
    [
        Vec3::new(x, MCP_Y, 0.0),
        Vec3::new(x, PIP_Y, -0.03),
        Vec3::new(x, 0.0, -0.05),
        Vec3::new(x, 0.15, -0.04),
    ]
}

/// Builds a right hand (thumb toward -x) with its palm centred on `center`.
pub fn pose_hand(pose: HandPose, center: Vec3) -> Hand {
    let mut points = [Vec3::ZERO; NUM_LANDMARKS];
    points[joints::WRIST] = Vec3::new(0.0, 0.2, 0.0);

    let thumb: [Vec3; 4] = match pose {
        HandPose::Open => [
            Vec3::new(-0.05, 0.15, 0.0),
            Vec3::new(-0.09, 0.10, -0.01),
            Vec3::new(-0.12, 0.05, -0.02),
            Vec3::new(-0.16, 0.0, -0.03),
        ],
        HandPose::Fist | HandPose::Point => [
            Vec3::new(-0.05, 0.15, 0.0),
            Vec3::new(-0.08, 0.10, -0.01),
            Vec3::new(-0.07, 0.06, -0.03),
            Vec3::new(-0.04, 0.08, -0.04),
        ],
        HandPose::Pinch => [
            Vec3::new(-0.05, 0.15, 0.0),
            Vec3::new(-0.10, 0.05, -0.01),
            Vec3::new(-0.13, -0.06, -0.02),
            Vec3::new(-0.10, -0.02, -0.03),
        ],
    };
    points[joints::THUMB_CMC..=joints::THUMB_TIP].copy_from_slice(&thumb);

    for (finger, x) in FINGER_X.into_iter().enumerate() {
        let chain = match (pose, finger) {
            (HandPose::Open, _) => extended(x),
            (HandPose::Fist, _) => curled(x),
            (HandPose::Point, 0) => extended(x),
            (HandPose::Point, _) => curled(x),
            (HandPose::Pinch, 0) => [
                Vec3::new(x, MCP_Y, 0.0),
                Vec3::new(x, PIP_Y, -0.01),
                Vec3::new(x - 0.02, -0.07, -0.02),
                Vec3::new(x - 0.03, -0.03, -0.03),
            ],
            (HandPose::Pinch, _) => extended(x),
        };
        let base = joints::INDEX_MCP + finger * 4;
        points[base..base + 4].copy_from_slice(&chain);
    }

    for p in points.iter_mut() {
        *p += center;
    }
    Hand::new(points)
}

/// Movement of the palm centre across a segment.
#[derive(Clone, Copy, Debug)]
pub enum Path {
    Hold(Vec3),
    Line { from: Vec3, to: Vec3 },
    Circle { center: Vec3, radius: f32 },
}

impl Path {
    fn at(&self, t: f32) -> Vec3 {
        match *self {
            Path::Hold(p) => p,
            Path::Line { from, to } => from.lerp(to, t),
            Path::Circle { center, radius } => {
                let angle = t * TAU;
                center + Vec3::new(angle.cos(), angle.sin(), 0.0) * radius
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct Segment {
    pub hands: Vec<(HandPose, Path)>,
    pub frames: usize,
}

impl Segment {
    pub fn one(pose: HandPose, path: Path, frames: usize) -> Self {
        Self {
            hands: vec![(pose, path)],
            frames,
        }
    }

    pub fn empty(frames: usize) -> Self {
        Self {
            hands: Vec::new(),
            frames,
        }
    }
}

/// Expands segments into raw per-frame hand lists.
pub fn render_script(segments: &[Segment]) -> Vec<Vec<Vec<Landmark>>> {
    let mut frames = Vec::new();
    for segment in segments {
        for i in 0..segment.frames {
            let t = if segment.frames > 1 {
                i as f32 / (segment.frames - 1) as f32
            } else {
                0.0
            };
            let hands = segment
                .hands
                .iter()
                .map(|(pose, path)| pose_hand(*pose, path.at(t)).landmarks().to_vec())
                .collect();
            frames.push(hands);
        }
    }
    frames
}

/// A short session exercising every interaction: reset, draw, pause, zoom,
/// rotate, lock and hand loss.
pub fn demo_script() -> Vec<Segment> {
    let center = Vec3::new(0.5, 0.5, 0.0);
    vec![
        Segment::one(HandPose::Open, Path::Hold(center), 20),
        Segment::one(
            HandPose::Point,
            Path::Circle {
                center,
                radius: 0.12,
            },
            45,
        ),
        Segment::one(HandPose::Pinch, Path::Hold(center), 15),
        Segment::one(
            HandPose::Point,
            Path::Line {
                from: center,
                to: Vec3::new(0.7, 0.45, 0.0),
            },
            20,
        ),
        Segment::empty(3),
        Segment {
            hands: vec![
                (
                    HandPose::Point,
                    Path::Line {
                        from: Vec3::new(0.4, 0.5, 0.0),
                        to: Vec3::new(0.15, 0.5, 0.0),
                    },
                ),
                (
                    HandPose::Point,
                    Path::Line {
                        from: Vec3::new(0.6, 0.5, 0.0),
                        to: Vec3::new(0.85, 0.5, 0.0),
                    },
                ),
            ],
            frames: 15,
        },
        Segment::empty(3),
        Segment::one(
            HandPose::Point,
            Path::Line {
                from: Vec3::new(0.2, 0.5, 0.0),
                to: Vec3::new(0.8, 0.5, 0.0),
            },
            12,
        ),
        Segment::one(HandPose::Fist, Path::Hold(center), 15),
        Segment::empty(5),
    ]
}
