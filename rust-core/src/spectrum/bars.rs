//! Bar aggregation for spectrum display
//!
//! Maps magnitude bins onto a fixed number of bars, applies the sensitivity
//! gain and clamps every bar to the display extent.

use std::ops::Deref;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BarError {
    #[error("Cannot draw {bars} bars from a {bins}-bin spectrum")]
    TooManyBars { bars: usize, bins: usize },
}

/// How spectrum bins are assigned to bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarMapping {
    /// Bar i shows bin i (the first B bins, DC included)
    #[default]
    Linear,

    /// Bars cover log-spaced bin ranges over [1, N/2]; each bar shows the
    /// loudest bin in its range
    Logarithmic,
}

/// Immutable set of bar heights published once per tick
///
/// Cloning shares the underlying storage, so readers can hold a snapshot for
/// as long as they like while newer ones are produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSnapshot {
    bars: Arc<[f32]>,
    display_extent: f32,
}

/// Screen rectangle for one bar, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BarSnapshot {
    fn new(bars: Vec<f32>, display_extent: f32) -> Self {
        Self {
            bars: bars.into(),
            display_extent,
        }
    }

    /// Bar heights, each in [0, display_extent]
    pub fn bars(&self) -> &[f32] {
        &self.bars
    }

    /// Upper bound every bar is clamped to
    pub fn display_extent(&self) -> f32 {
        self.display_extent
    }

    /// Index and height of the tallest bar
    pub fn peak(&self) -> Option<(usize, f32)> {
        self.bars
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (i, h)| match best {
                Some((_, best_h)) if best_h >= h => best,
                _ => Some((i, h)),
            })
    }

    /// Lay bars out across `width`, growing up from the bottom of the extent
    ///
    /// Bar width is `width / B`; heights are used as-is, so the display extent
    /// is expected to be in the same units as `width` (pixels, typically).
    pub fn bar_rects(&self, width: f32) -> Vec<BarRect> {
        if self.bars.is_empty() {
            return Vec::new();
        }

        let bar_width = width / self.bars.len() as f32;
        self.bars
            .iter()
            .enumerate()
            .map(|(i, &h)| BarRect {
                x: i as f32 * bar_width,
                y: self.display_extent - h,
                width: bar_width,
                height: h,
            })
            .collect()
    }
}

impl Deref for BarSnapshot {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.bars
    }
}

/// Scale and clamp one raw magnitude
///
/// NaN and negative values land on 0
#[inline]
fn scale_and_clamp(magnitude: f32, gain: f32, display_extent: f32) -> f32 {
    (magnitude * gain).max(0.0).min(display_extent)
}

/// Bar aggregation settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarAggregator {
    pub bar_count: usize,
    pub sensitivity: f32,
    pub display_extent: f32,
    pub mapping: BarMapping,
}

impl BarAggregator {
    pub fn new(bar_count: usize, sensitivity: f32, display_extent: f32, mapping: BarMapping) -> Self {
        Self {
            bar_count,
            sensitivity,
            display_extent,
            mapping,
        }
    }

    /// Build a snapshot from a full-length magnitude spectrum
    pub fn aggregate(&self, spectrum: &[f32]) -> Result<BarSnapshot, BarError> {
        if self.bar_count > spectrum.len() {
            return Err(BarError::TooManyBars {
                bars: self.bar_count,
                bins: spectrum.len(),
            });
        }

        let gain = self.sensitivity * self.display_extent;

        let bars = match self.mapping {
            BarMapping::Linear => spectrum[..self.bar_count]
                .iter()
                .map(|&m| scale_and_clamp(m, gain, self.display_extent))
                .collect(),
            BarMapping::Logarithmic => log_ranges(self.bar_count, spectrum.len())
                .map(|(lo, hi)| {
                    let loudest = spectrum[lo..hi].iter().copied().fold(0.0f32, f32::max);
                    scale_and_clamp(loudest, gain, self.display_extent)
                })
                .collect(),
        };

        Ok(BarSnapshot::new(bars, self.display_extent))
    }
}

/// One-bin-per-bar aggregation over the first `bar_count` bins
pub fn aggregate(
    spectrum: &[f32],
    bar_count: usize,
    sensitivity: f32,
    display_extent: f32,
) -> Result<BarSnapshot, BarError> {
    BarAggregator::new(bar_count, sensitivity, display_extent, BarMapping::Linear).aggregate(spectrum)
}

/// Half-open bin ranges for log-spaced bars over bins [1, N/2]
///
/// Every range holds at least one bin; when bars outnumber the available
/// octave resolution neighbouring bars share bins.
fn log_ranges(bar_count: usize, bins: usize) -> impl Iterator<Item = (usize, usize)> {
    let nyquist = (bins / 2).max(1);
    let last = bins.min(nyquist + 1);

    let edge = move |j: usize| -> usize {
        if j >= bar_count {
            return last;
        }
        let e = ((nyquist as f64).powf(j as f64 / bar_count as f64) + 1e-9).floor() as usize;
        e.max(1).min(last.saturating_sub(1).max(1))
    };

    (0..bar_count).map(move |i| {
        let lo = edge(i);
        let hi = edge(i + 1).max(lo + 1).min(last);
        (lo, hi)
    })
}
