//! Onset selection and multi-channel windowing.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::params::ReflectionLabel;
use crate::peaks::PeakMap;
use crate::signal::{BFORMAT_CHANNELS, BFormat};

/// Onsets always kept by [`SelectionPolicy::Strongest`], in time order.
const STRONGEST_LEADING_KEPT: usize = 2;

/// How onsets are chosen from the detected candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// The earliest onsets.
    #[default]
    First,
    /// The two earliest onsets, then the strongest of the rest.
    Strongest,
}

/// What happens when a window reaches past either end of the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Clip the window to the signal; edge windows are shorter and asymmetric.
    #[default]
    Truncate,
    /// Keep the full window length and fill out-of-range samples with zeros.
    ZeroPad,
}

/// A 4-channel window of the impulse response around one onset.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionSegment {
    /// Which reflection this window belongs to.
    pub label: ReflectionLabel,
    /// Onset sample in the full signal.
    pub onset: usize,
    channels: [Vec<f64>; BFORMAT_CHANNELS],
}

impl ReflectionSegment {
    /// Windowed W, X, Y, Z channels.
    pub fn channels(&self) -> [&[f64]; BFORMAT_CHANNELS] {
        [
            &self.channels[0],
            &self.channels[1],
            &self.channels[2],
            &self.channels[3],
        ]
    }

    /// Window length in samples.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// True when the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.channels[0].is_empty()
    }
}

/// Picks a fixed number of onsets and cuts windows around them.
#[derive(Debug, Clone)]
pub struct Segmenter {
    /// Number of onsets to select, direct sound included.
    pub n_peaks: usize,
    /// Selection rule.
    pub policy: SelectionPolicy,
    /// Half-width of the direct-sound window in samples.
    pub direct_half_window: usize,
    /// Half-width of each reflection window in samples.
    pub reflection_half_window: usize,
    /// Edge handling.
    pub boundary: BoundaryPolicy,
}

impl Segmenter {
    /// Select `n_peaks` onsets in ascending time order.
    ///
    /// The first selected onset is the direct sound.
    pub fn select(&self, peaks: &PeakMap) -> Result<Vec<usize>> {
        let onsets = peaks.onsets();
        if onsets.len() < self.n_peaks {
            return Err(Error::degenerate(format!(
                "{} onsets requested but only {} candidates were detected",
                self.n_peaks,
                onsets.len()
            )));
        }

        let selected = match self.policy {
            SelectionPolicy::First => onsets.into_iter().take(self.n_peaks).collect(),
            SelectionPolicy::Strongest => {
                let leading = STRONGEST_LEADING_KEPT.min(self.n_peaks);
                let mut selected: Vec<usize> = onsets[..leading].to_vec();
                let mut rest: Vec<usize> = onsets[leading..].to_vec();
                // stable: equal strengths keep time order
                rest.sort_by(|a, b| peaks.strength(*b).total_cmp(&peaks.strength(*a)));
                selected.extend(rest.into_iter().take(self.n_peaks - leading));
                selected.sort_unstable();
                selected.truncate(self.n_peaks);
                selected
            }
        };

        tracing::debug!(policy = ?self.policy, onsets = ?selected, "selected onsets");
        Ok(selected)
    }

    /// Cut one window per onset; the first is labelled as the direct sound.
    pub fn segment(&self, signal: &BFormat, onsets: &[usize]) -> Vec<ReflectionSegment> {
        onsets
            .iter()
            .enumerate()
            .map(|(index, &onset)| {
                let label = ReflectionLabel::early(index);
                let half = match label {
                    ReflectionLabel::DirectSound => self.direct_half_window,
                    _ => self.reflection_half_window,
                };
                let channels = signal
                    .channels()
                    .map(|channel| self.window(channel, onset, half));
                ReflectionSegment {
                    label,
                    onset,
                    channels,
                }
            })
            .collect()
    }

    /// `[center - half, center + half)` of one channel under the boundary policy.
    fn window(&self, channel: &[f64], center: usize, half: usize) -> Vec<f64> {
        match self.boundary {
            BoundaryPolicy::Truncate => {
                let lo = center.saturating_sub(half).min(channel.len());
                let hi = (center + half).min(channel.len());
                channel[lo..hi].to_vec()
            }
            BoundaryPolicy::ZeroPad => (0..2 * half)
                .map(|i| {
                    (center + i)
                        .checked_sub(half)
                        .and_then(|j| channel.get(j))
                        .copied()
                        .unwrap_or(0.0)
                })
                .collect(),
        }
    }
}
