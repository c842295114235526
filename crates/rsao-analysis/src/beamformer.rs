//! First-order beam steering for direction-of-arrival estimation.
//!
//! A virtual first-order microphone is steered over a direction grid; the
//! direction whose output carries the most energy is the direction of arrival.
//! With directivity `d`, the steered output for unit vector `r` is
//! `0.5 * ((2 - d) W + d (rx X + ry Y + rz Z))`: `d = 0` is omnidirectional,
//! `d = 1` a cardioid and `d = 2` a figure-of-eight.
//!
//! The output energy of a direction is the quadratic form `gᵀ C g` over the
//! 4x4 channel covariance `C`, so the grid search never synthesizes a signal;
//! only the winning direction's output is rendered.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::params::Doa;
use crate::signal::BFORMAT_CHANNELS;

/// Direction grid scanned by the [`Beamformer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Every whole-degree azimuth and elevation.
    #[default]
    Full,
    /// Every whole-degree azimuth at elevations 0 and 90 degrees.
    Azimuth,
    /// Every whole-degree elevation at azimuths 0 and 180 degrees.
    Elevation,
}

/// Winning steering direction and the signal captured from it.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionEstimate {
    /// Azimuth in radians.
    pub azimuth: f64,
    /// Elevation in radians.
    pub elevation: f64,
    /// Steered output for this direction.
    pub signal: Vec<f64>,
}

impl DirectionEstimate {
    /// Azimuth in whole degrees.
    pub fn azimuth_degrees(&self) -> f64 {
        self.azimuth.to_degrees().round()
    }

    /// Elevation in whole degrees.
    pub fn elevation_degrees(&self) -> f64 {
        self.elevation.to_degrees().round()
    }

    /// Direction of arrival in whole degrees.
    pub fn doa(&self) -> Doa {
        Doa {
            azimuth: self.azimuth_degrees(),
            elevation: self.elevation_degrees(),
        }
    }

    /// Root of the steered signal's energy.
    pub fn level(&self) -> f64 {
        self.signal.iter().map(|x| x * x).sum::<f64>().sqrt()
    }
}

/// Grid-search first-order beamformer.
#[derive(Debug, Clone, Copy)]
pub struct Beamformer {
    directivity: f64,
    scan: ScanMode,
}

impl Beamformer {
    /// Create a beamformer with the given directivity (0..=2) and grid.
    pub fn new(directivity: f64, scan: ScanMode) -> Self {
        Self { directivity, scan }
    }

    /// Channel gains for a steering direction.
    pub fn gains(&self, azimuth: f64, elevation: f64) -> [f64; BFORMAT_CHANNELS] {
        let d = self.directivity;
        [
            0.5 * (2.0 - d),
            0.5 * d * elevation.cos() * azimuth.cos(),
            0.5 * d * elevation.cos() * azimuth.sin(),
            0.5 * d * elevation.sin(),
        ]
    }

    /// Azimuth and elevation grids in radians.
    fn grid(&self) -> (Vec<f64>, Vec<f64>) {
        let azimuths = || (0..360).map(|deg| f64::from(deg).to_radians()).collect();
        let elevations = || (-90..=90).map(|deg| f64::from(deg).to_radians()).collect();
        match self.scan {
            ScanMode::Full => (azimuths(), elevations()),
            ScanMode::Azimuth => (azimuths(), vec![0.0, PI / 2.0]),
            ScanMode::Elevation => (vec![0.0, PI], elevations()),
        }
    }

    /// Steer over the grid and return the highest-energy direction.
    ///
    /// Directions are visited azimuth-major; the first maximum wins.
    pub fn steer(&self, channels: [&[f64]; BFORMAT_CHANNELS]) -> DirectionEstimate {
        let covariance = covariance(channels);
        let (azimuths, elevations) = self.grid();

        let mut best = (0.0, elevations.first().copied().unwrap_or(0.0));
        let mut best_energy = f64::NEG_INFINITY;
        for &azimuth in &azimuths {
            for &elevation in &elevations {
                let g = self.gains(azimuth, elevation);
                let energy = quadratic_form(&covariance, &g);
                if energy > best_energy {
                    best_energy = energy;
                    best = (azimuth, elevation);
                }
            }
        }

        let (azimuth, elevation) = best;
        let g = self.gains(azimuth, elevation);
        let len = channels[0].len();
        let signal = (0..len)
            .map(|t| g.iter().zip(&channels).map(|(gain, ch)| gain * ch[t]).sum())
            .collect();

        DirectionEstimate {
            azimuth,
            elevation,
            signal,
        }
    }
}

type Covariance = [[f64; BFORMAT_CHANNELS]; BFORMAT_CHANNELS];

fn covariance(channels: [&[f64]; BFORMAT_CHANNELS]) -> Covariance {
    let mut c: Covariance = [[0.0; BFORMAT_CHANNELS]; BFORMAT_CHANNELS];
    for i in 0..BFORMAT_CHANNELS {
        for j in i..BFORMAT_CHANNELS {
            let sum: f64 = channels[i]
                .iter()
                .zip(channels[j])
                .map(|(a, b)| a * b)
                .sum();
            c[i][j] = sum;
            c[j][i] = sum;
        }
    }
    c
}

fn quadratic_form(c: &Covariance, g: &[f64; BFORMAT_CHANNELS]) -> f64 {
    let mut total = 0.0;
    for i in 0..BFORMAT_CHANNELS {
        for j in 0..BFORMAT_CHANNELS {
            total += g[i] * c[i][j] * g[j];
        }
    }
    total
}
