//! Attempt numbering and the temperature rotation.
//!
//! Re-running an analysis on the same photo should not return the same
//! answer every time, so each attempt samples at a different temperature.
//! The values cycle through a fixed list; this is a deterministic rotation,
//! not a quality control scheme.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Temperatures used for attempts 1, 2, 3, 4, 5, then repeating.
pub const TEMPERATURE_ROTATION: [f32; 5] = [0.65, 0.75, 0.80, 0.60, 0.70];

/// 1-based attempt number for the analysis of a single image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u32")]
pub struct Attempt(u32);

impl Attempt {
    /// Attempt number `n`. Zero is treated as the first attempt.
    pub fn new(n: u32) -> Self {
        Self(n.max(1))
    }

    pub fn first() -> Self {
        Self(1)
    }

    pub fn number(self) -> u32 {
        self.0
    }

    /// The attempt after this one.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Sampling temperature for this attempt: `ROTATION[(n - 1) mod 5]`.
    pub fn temperature(self) -> f32 {
        let idx = self.0.saturating_sub(1) as usize % TEMPERATURE_ROTATION.len();
        TEMPERATURE_ROTATION[idx]
    }
}

impl Default for Attempt {
    fn default() -> Self {
        Self::first()
    }
}

impl From<u32> for Attempt {
    fn from(n: u32) -> Self {
        Self::new(n)
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
