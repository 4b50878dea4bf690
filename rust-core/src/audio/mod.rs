//! Audio sources feeding the spectrum pipeline

pub mod buffer;
pub mod capture;
pub mod monitor;

pub use buffer::{LatestSamples, SampleProducer, SampleRing};
pub use capture::{AudioCapture, AudioDeviceInfo, AudioError, list_input_devices};
pub use monitor::{MonitorConfig, MonitorError, SpectrumMonitor};

use crate::spectrum::BarSnapshot;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Not enough samples buffered yet; skip this tick
    #[error("only {available} of {requested} samples buffered")]
    NotReady { available: usize, requested: usize },

    #[error("audio source disconnected")]
    Disconnected,
}

/// Supplier of the most recent mono samples
///
/// Implementations must not block: when fewer than `out.len()` samples are
/// available they return `SourceError::NotReady` and leave `out` untouched.
pub trait AudioSource {
    /// Fill `out` with the newest `out.len()` samples, oldest first
    fn read_latest(&mut self, out: &mut [f32]) -> Result<(), SourceError>;
}

/// Consumer of published bar snapshots (a renderer, typically)
pub trait SnapshotSink {
    fn present(&mut self, snapshot: &BarSnapshot);
}

impl<F> SnapshotSink for F
where
    F: FnMut(&BarSnapshot),
{
    fn present(&mut self, snapshot: &BarSnapshot) {
        self(snapshot)
    }
}
