use thiserror::Error;

use crate::physics::BodyId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MalformedReason {
    LandmarkCount(usize),
    NonFinite(usize),
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedReason::LandmarkCount(got) => write!(
                f,
                "expected {} landmarks, got {got}",
                crate::types::NUM_LANDMARKS
            ),
            MalformedReason::NonFinite(joint) => {
                write!(f, "landmark {joint} has a non-finite coordinate")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    /// The frame must be skipped; no pipeline state was touched.
    #[error("malformed hand {hand}: {reason}")]
    MalformedInput { hand: usize, reason: MalformedReason },
    #[error("physics body {0} is not registered")]
    UnregisteredBody(BodyId),
    #[error("unknown easing `{0}`")]
    InvalidEasing(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
