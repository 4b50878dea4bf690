//! Per-tick spectrum pipeline
//!
//! Window → FFT → magnitude → bars, with buffers owned by the pipeline and an
//! immutable `BarSnapshot` published after every successful tick.

use super::bars::{BarAggregator, BarError, BarMapping, BarSnapshot};
use super::fft::{ComplexBuffer, Direction, FftEngine, FftError};
use super::magnitude;
use super::window::{self, WindowError, WindowType};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("FFT size must be at least 2 (got {0})")]
    FftSizeTooSmall(usize),

    #[error("FFT size must be a power of two (got {0})")]
    FftSizeNotPowerOfTwo(usize),

    #[error("Bar count must be between 1 and {fft_size} (got {bar_count})")]
    BarCountOutOfRange { bar_count: usize, fft_size: usize },

    #[error("Sensitivity must be positive and finite (got {0})")]
    InvalidSensitivity(f32),

    #[error("Display extent must be positive and finite (got {0})")]
    InvalidDisplayExtent(f32),

    #[error("Sample rate must be positive")]
    ZeroSampleRate,
}

/// Why a tick could not run; retry on the next interval
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotReady {
    #[error("pipeline has not been initialized")]
    Uninitialized,

    #[error("pipeline has been stopped")]
    Stopped,

    #[error("expected a block of {expected} samples, got {got}")]
    BlockSize { expected: usize, got: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Not ready: {0}")]
    NotReady(#[from] NotReady),

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error(transparent)]
    Fft(#[from] FftError),

    #[error(transparent)]
    Bars(#[from] BarError),
}

/// Pipeline configuration, fixed for one run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Sample rate in Hz (only used to label bins)
    pub sample_rate: u32,

    /// FFT size, power of two ≥ 2; also the block length fed to `tick`
    pub fft_size: usize,

    /// Number of display bars, in [1, fft_size]
    pub bar_count: usize,

    /// Gain applied to magnitudes before clamping
    pub sensitivity: f32,

    /// Upper bound of every bar (e.g. the display height)
    pub display_extent: f32,

    /// Analysis window
    pub window: WindowType,

    /// Bin-to-bar assignment
    pub bar_mapping: BarMapping,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            fft_size: 4096,
            bar_count: 64,
            sensitivity: 50.0,
            display_extent: 1.0,
            window: WindowType::Blackman,
            bar_mapping: BarMapping::Linear,
        }
    }
}

impl PipelineConfig {
    /// Check every invariant; the first violation wins
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fft_size < 2 {
            return Err(ConfigError::FftSizeTooSmall(self.fft_size));
        }
        if !self.fft_size.is_power_of_two() {
            return Err(ConfigError::FftSizeNotPowerOfTwo(self.fft_size));
        }
        if self.bar_count == 0 || self.bar_count > self.fft_size {
            return Err(ConfigError::BarCountOutOfRange {
                bar_count: self.bar_count,
                fft_size: self.fft_size,
            });
        }
        if !(self.sensitivity.is_finite() && self.sensitivity > 0.0) {
            return Err(ConfigError::InvalidSensitivity(self.sensitivity));
        }
        if !(self.display_extent.is_finite() && self.display_extent > 0.0) {
            return Err(ConfigError::InvalidDisplayExtent(self.display_extent));
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        Ok(())
    }

    /// Width of one bin in Hz
    pub fn bin_width_hz(&self) -> f32 {
        magnitude::bin_frequency(1, self.sample_rate, self.fft_size)
    }
}

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Ready,
    Stopped,
}

/// Shared slot holding the most recently published snapshot
///
/// One pipeline writes, any number of clones read. Readers get their own
/// `BarSnapshot` clone and never see a half-written one.
#[derive(Debug, Clone, Default)]
pub struct SnapshotHandle {
    latest: Arc<Mutex<Option<BarSnapshot>>>,
}

impl SnapshotHandle {
    /// Latest snapshot, if any tick has completed
    pub fn latest(&self) -> Option<BarSnapshot> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish(&self, snapshot: BarSnapshot) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    }

    fn clear(&self) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Buffers and plans that exist only while the pipeline is Ready
struct Workspace {
    window: Vec<f32>,
    fft: FftEngine,
    buffer: ComplexBuffer,
    spectrum: Vec<f32>,
    aggregator: BarAggregator,
    ticks: u64,
}

impl Workspace {
    fn new(config: &PipelineConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            window: window::generate_window(config.window, config.fft_size)?,
            fft: FftEngine::new(config.fft_size)?,
            buffer: ComplexBuffer::new(config.fft_size),
            spectrum: vec![0.0; config.fft_size],
            aggregator: BarAggregator::new(
                config.bar_count,
                config.sensitivity,
                config.display_extent,
                config.bar_mapping,
            ),
            ticks: 0,
        })
    }
}

enum Stage {
    Uninitialized,
    Ready(Box<Workspace>),
    Stopped,
}

/// Spectrum pipeline driven once per analysis interval
pub struct SpectrumPipeline {
    stage: Stage,
    config: Option<PipelineConfig>,
    published: SnapshotHandle,
}

impl Default for SpectrumPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumPipeline {
    /// Create an uninitialized pipeline
    pub fn new() -> Self {
        Self::with_snapshot_handle(SnapshotHandle::default())
    }

    /// Create an uninitialized pipeline that publishes into `handle`
    pub fn with_snapshot_handle(handle: SnapshotHandle) -> Self {
        Self {
            stage: Stage::Uninitialized,
            config: None,
            published: handle,
        }
    }

    /// Validate `config` and allocate every buffer for it
    ///
    /// Also valid after `stop` to start a fresh run. A rejected config leaves
    /// the pipeline in its previous state.
    pub fn initialize(&mut self, config: PipelineConfig) -> Result<(), PipelineError> {
        config.validate()?;
        let workspace = Workspace::new(&config)?;

        info!(
            fft_size = config.fft_size,
            bar_count = config.bar_count,
            sample_rate = config.sample_rate,
            bin_width_hz = config.bin_width_hz(),
            "Spectrum pipeline initialized"
        );

        self.published.clear();
        self.stage = Stage::Ready(Box::new(workspace));
        self.config = Some(config);
        Ok(())
    }

    /// Analyze one block of exactly `fft_size` samples
    ///
    /// The caller's block is copied before windowing and is never modified.
    /// On success the returned snapshot is also published; on failure the
    /// previously published snapshot stays in place.
    pub fn tick(&mut self, samples: &[f32]) -> Result<BarSnapshot, PipelineError> {
        let ws = match &mut self.stage {
            Stage::Ready(ws) => ws,
            Stage::Uninitialized => return Err(NotReady::Uninitialized.into()),
            Stage::Stopped => return Err(NotReady::Stopped.into()),
        };

        let expected = ws.fft.size();
        if samples.len() != expected {
            debug!(expected, got = samples.len(), "Skipping tick with wrong block size");
            return Err(NotReady::BlockSize {
                expected,
                got: samples.len(),
            }
            .into());
        }

        ws.buffer.load_real(samples);
        window::apply_table(&mut ws.buffer.re, &ws.window)?;
        ws.fft.process(&mut ws.buffer, Direction::Forward)?;
        magnitude::compute_into(&ws.buffer.re, &ws.buffer.im, &mut ws.spectrum);
        let snapshot = ws.aggregator.aggregate(&ws.spectrum)?;

        ws.ticks += 1;
        self.published.publish(snapshot.clone());
        Ok(snapshot)
    }

    /// Stop the pipeline and release its buffers
    pub fn stop(&mut self) {
        if let Stage::Ready(ws) = &self.stage {
            info!(ticks = ws.ticks, "Spectrum pipeline stopped");
        }
        self.stage = Stage::Stopped;
    }

    /// Most recently published snapshot, `None` before the first tick
    pub fn current_snapshot(&self) -> Result<Option<BarSnapshot>, PipelineError> {
        match self.stage {
            Stage::Ready(_) => Ok(self.published.latest()),
            Stage::Uninitialized => Err(NotReady::Uninitialized.into()),
            Stage::Stopped => Err(NotReady::Stopped.into()),
        }
    }

    /// Full N-bin magnitude spectrum from the last tick
    pub fn spectrum(&self) -> Option<&[f32]> {
        match &self.stage {
            Stage::Ready(ws) if ws.ticks > 0 => Some(&ws.spectrum),
            _ => None,
        }
    }

    /// Handle for readers on other threads
    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.published.clone()
    }

    pub fn state(&self) -> PipelineState {
        match self.stage {
            Stage::Uninitialized => PipelineState::Uninitialized,
            Stage::Ready(_) => PipelineState::Ready,
            Stage::Stopped => PipelineState::Stopped,
        }
    }

    /// Configuration of the current (or last) run
    pub fn config(&self) -> Option<&PipelineConfig> {
        self.config.as_ref()
    }

    /// Frequencies in Hz of bins 0..=N/2
    pub fn bin_frequencies(&self) -> Option<Vec<f32>> {
        self.config
            .as_ref()
            .map(|c| magnitude::frequency_axis(c.sample_rate, c.fft_size))
    }

    /// Number of ticks completed in the current run
    pub fn ticks(&self) -> u64 {
        match &self.stage {
            Stage::Ready(ws) => ws.ticks,
            _ => 0,
        }
    }
}
