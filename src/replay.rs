//! Recorded landmark sessions on disk.
//!
//! ```json
//! { "frame_interval_ms": 33, "frames": [ [ [[0.5, 0.4, 0.0], ...21] ] ] }
//! ```
//! Each frame holds zero to two hands of 21 `[x, y, z]` points. Hands are
//! not validated here; malformed ones are rejected frame by frame later.

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::Landmark;

const DEFAULT_INTERVAL_MS: u64 = 33;

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_MS
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    #[serde(default = "default_interval")]
    pub frame_interval_ms: u64,
    pub frames: Vec<Vec<Vec<Landmark>>>,
}

impl Replay {
    pub fn new(frames: Vec<Vec<Vec<Landmark>>>, interval: Duration) -> Self {
        Self {
            frame_interval_ms: interval.as_millis() as u64,
            frames,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read replay {}", path.display()))?;
        let replay = Self::from_json(&raw)
            .with_context(|| format!("failed to parse replay {}", path.display()))?;
        log::info!(
            "loaded {} frames from {} ({}ms apart)",
            replay.frames.len(),
            path.display(),
            replay.frame_interval_ms
        );
        Ok(replay)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write replay {}", path.display()))
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn parses_nested_point_arrays() {
        let hand: Vec<[f32; 3]> = (0..21).map(|i| [i as f32 * 0.01, 0.5, 0.0]).collect();
        let raw = serde_json::json!({ "frames": [[hand], []] }).to_string();

        let replay = Replay::from_json(&raw).unwrap();
        assert_eq!(replay.frame_interval_ms, DEFAULT_INTERVAL_MS);
        assert_eq!(replay.frames.len(), 2);
        assert_eq!(replay.frames[0][0][3], Vec3::new(3.0 * 0.01, 0.5, 0.0));
        assert!(replay.frames[1].is_empty());
    }

    #[test]
    fn short_hands_survive_parsing() {
        let raw = r#"{ "frame_interval_ms": 20, "frames": [[[[0.1, 0.2, 0.3]]]] }"#;
        let replay = Replay::from_json(raw).unwrap();
        assert_eq!(replay.frames[0][0].len(), 1);
        assert_eq!(replay.interval(), Duration::from_millis(20));
    }

    #[test]
    fn rejects_garbage() {
        assert!(Replay::from_json("{ \"frames\": 3 }").is_err());
    }
}
