//! Steering behaviors

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Output of a steering behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SteeringOutput {
    /// Linear displacement for this tick
    pub linear: Vec3,
}

impl SteeringOutput {
    /// Zero output
    pub fn zero() -> Self {
        Self::default()
    }

    /// Get magnitude of linear component
    pub fn magnitude(&self) -> f32 {
        self.linear.length()
    }

    /// Limit magnitude
    pub fn limit(&mut self, max: f32) {
        self.linear = self.linear.clamp_length_max(max.max(0.0));
    }
}

/// Step from `position` toward `target` by at most `max_step`, never overshooting
pub fn seek(position: Vec3, target: Vec3, max_step: f32) -> SteeringOutput {
    let mut output = SteeringOutput {
        linear: target - position,
    };
    output.limit(max_step);
    output
}
