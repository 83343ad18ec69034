use std::{f32::consts::PI, str::FromStr};

use crate::error::CoreError;

/// Named easing curves mapping progress in [0, 1] to eased progress.
///
/// Every curve returns exactly 0 at 0 and exactly 1 at 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    Linear,
    #[default]
    Smoothstep,
    Smootherstep,
    EaseOutBounce,
    EaseOutElastic,
    EaseInOutCubic,
}

impl Easing {
    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::Smoothstep => "smoothstep",
            Easing::Smootherstep => "smootherstep",
            Easing::EaseOutBounce => "easeOutBounce",
            Easing::EaseOutElastic => "easeOutElastic",
            Easing::EaseInOutCubic => "easeInOutCubic",
        }
    }

    /// Parses `name`, falling back to smoothstep for unknown curves.
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|err: CoreError| {
            log::warn!("{err}, falling back to smoothstep");
            Easing::Smoothstep
        })
    }

    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Smoothstep => t * t * (3.0 - 2.0 * t),
            Easing::Smootherstep => t * t * t * (t * (t * 6.0 - 15.0) + 10.0),
            Easing::EaseOutBounce => ease_out_bounce(t),
            Easing::EaseOutElastic => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else {
                    let c4 = (2.0 * PI) / 3.0;
                    2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

fn ease_out_bounce(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t >= 1.0 {
        1.0
    } else if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

impl FromStr for Easing {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "linear" => Ok(Easing::Linear),
            "smoothstep" => Ok(Easing::Smoothstep),
            "smootherstep" => Ok(Easing::Smootherstep),
            "easeoutbounce" => Ok(Easing::EaseOutBounce),
            "easeoutelastic" => Ok(Easing::EaseOutElastic),
            "easeinoutcubic" => Ok(Easing::EaseInOutCubic),
            _ => Err(CoreError::InvalidEasing(s.to_string())),
        }
    }
}
