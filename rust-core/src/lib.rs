//! Mic Spectrum - Real-Time Audio Spectrum Core
//! 
//! Blackman window, radix-2 FFT, magnitude spectrum and display bars for a
//! live mono audio stream, with microphone capture and optional Python bindings.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod audio;
pub mod spectrum;
#[cfg(feature = "python")]
pub mod python_bindings;

pub use audio::{AudioSource, SourceError, SpectrumMonitor};
pub use spectrum::{BarSnapshot, PipelineConfig, PipelineError, SpectrumPipeline};
