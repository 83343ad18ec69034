//! Gesture-to-action core: hand landmarks in, arbitrated gestures and
//! physically smoothed object transforms out.

pub mod arbiter;
pub mod config;
pub mod controller;
pub mod error;
pub mod gesture;
pub mod physics;
pub mod pipeline;
pub mod replay;
pub mod scene;
pub mod smoothing;
pub mod synthetic;
pub mod types;

pub use arbiter::{FrameAnalysis, GestureArbiter, GestureListener};
pub use config::Config;
pub use controller::{FeedbackSink, InteractionController, InteractionMode, LogFeedback};
pub use error::{CoreError, Result};
pub use pipeline::{FrameOutcome, GestureEngine};
pub use scene::{SceneController, VoxelScene};
pub use types::{Frame, GestureEvent, GestureKind, GestureResult, Hand, Landmark};
