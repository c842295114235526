//! Perceptual mixing time from room geometry.
//!
//! Linear predictors of the time after which discrete reflections are no
//! longer individually audible, from A. Lindau, L. Kosanke and S. Weinzierl,
//! "Perceptual Evaluation of Model- and Signal-Based Predictors of the Mixing
//! Time in Binaural Room Impulse Responses", JAES 60(11), 2012.
//!
//! # Example
//!
//! ```rust
//! use rsao_analysis::mixing_time::{MixingTimeModel, RoomDimensions};
//!
//! let room = RoomDimensions::new(15.0, 25.0, 10.0).unwrap();
//! let estimate = MixingTimeModel::default().estimate(&room);
//! assert!((estimate.tmp95_ms - 93.975).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shoebox room dimensions in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomDimensions {
    /// Length in metres.
    pub length: f64,
    /// Width in metres.
    pub width: f64,
    /// Height in metres.
    pub height: f64,
}

impl RoomDimensions {
    /// Validate and create room dimensions; every side must be finite and positive.
    pub fn new(length: f64, width: f64, height: f64) -> Result<Self> {
        for (name, value) in [("length", length), ("width", width), ("height", height)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::configuration(format!(
                    "room {name} must be positive, got {value}"
                )));
            }
        }
        Ok(Self {
            length,
            width,
            height,
        })
    }

    /// Create dimensions from a `[length, width, height]` slice.
    pub fn from_slice(dimensions: &[f64]) -> Result<Self> {
        match *dimensions {
            [length, width, height] => Self::new(length, width, height),
            _ => Err(Error::configuration(format!(
                "room dimensions need 3 values, got {}",
                dimensions.len()
            ))),
        }
    }

    /// Volume in cubic metres.
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }

    /// Total boundary surface in square metres.
    pub fn surface_area(&self) -> f64 {
        2.0 * (self.length * self.width
            + self.length * self.height
            + self.width * self.height)
    }
}

/// Coefficients of the linear mixing-time predictors, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MixingTimeModel {
    /// Slope of `tmp50` against `V/S`.
    pub tmp50_slope: f64,
    /// Intercept of `tmp50`.
    pub tmp50_intercept: f64,
    /// Slope of `tmp95` against `V`.
    pub tmp95_slope: f64,
    /// Intercept of `tmp95`.
    pub tmp95_intercept: f64,
    /// Mean-free-path predictor slope against `V/S`.
    pub mean_free_path_slope: f64,
}

impl Default for MixingTimeModel {
    fn default() -> Self {
        Self {
            tmp50_slope: 20.08,
            tmp50_intercept: 12.0,
            tmp95_slope: 0.0117,
            tmp95_intercept: 50.1,
            mean_free_path_slope: 47.0,
        }
    }
}

/// Predicted mixing times for a room.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MixingTime {
    /// Room volume in cubic metres.
    pub volume: f64,
    /// Boundary surface in square metres.
    pub surface_area: f64,
    /// Square root of the volume.
    pub root_volume: f64,
    /// Mean-free-path based predictor in milliseconds.
    pub mean_free_path_ms: f64,
    /// Time by which half of listeners perceive a diffuse field, in milliseconds.
    pub tmp50_ms: f64,
    /// Time by which 95% of listeners perceive a diffuse field, in milliseconds.
    pub tmp95_ms: f64,
}

impl MixingTimeModel {
    /// Predict the mixing times for `room`.
    pub fn estimate(&self, room: &RoomDimensions) -> MixingTime {
        let volume = room.volume();
        let surface_area = room.surface_area();
        let ratio = volume / surface_area;
        let estimate = MixingTime {
            volume,
            surface_area,
            root_volume: volume.sqrt(),
            mean_free_path_ms: self.mean_free_path_slope * ratio,
            tmp50_ms: self.tmp50_slope * ratio + self.tmp50_intercept,
            tmp95_ms: self.tmp95_slope * volume + self.tmp95_intercept,
        };
        tracing::debug!(
            volume,
            surface_area,
            tmp50_ms = estimate.tmp50_ms,
            tmp95_ms = estimate.tmp95_ms,
            "mixing time"
        );
        estimate
    }
}
