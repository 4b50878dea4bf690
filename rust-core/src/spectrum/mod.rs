//! Spectral analysis: window, FFT, magnitude and display bars

pub mod window;
pub mod fft;
pub mod magnitude;
pub mod bars;
pub mod pipeline;

pub use window::{WindowType, WindowError, generate_window};
pub use fft::{ComplexBuffer, Direction, FftEngine, FftError};
pub use bars::{BarAggregator, BarMapping, BarRect, BarSnapshot};
pub use pipeline::{
    ConfigError, NotReady, PipelineConfig, PipelineError, PipelineState, SnapshotHandle,
    SpectrumPipeline,
};
