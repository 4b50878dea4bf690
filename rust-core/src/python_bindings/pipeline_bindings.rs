//! Python bindings for the spectrum pipeline

use pyo3::prelude::*;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use numpy::{PyArray1, PyReadonlyArray1};
use crate::spectrum::{
    BarMapping, PipelineConfig, PipelineError, PipelineState, SpectrumPipeline, WindowType,
};

/// Window type enum exposed to Python
#[pyclass(name = "WindowType")]
#[derive(Clone)]
pub enum PyWindowType {
    Blackman,
    Hann,
    Hamming,
    Rectangular,
}

impl From<PyWindowType> for WindowType {
    fn from(py_win: PyWindowType) -> Self {
        match py_win {
            PyWindowType::Blackman => WindowType::Blackman,
            PyWindowType::Hann => WindowType::Hann,
            PyWindowType::Hamming => WindowType::Hamming,
            PyWindowType::Rectangular => WindowType::Rectangular,
        }
    }
}

/// Bin-to-bar mapping exposed to Python
#[pyclass(name = "BarMapping")]
#[derive(Clone)]
pub enum PyBarMapping {
    Linear,
    Logarithmic,
}

impl From<PyBarMapping> for BarMapping {
    fn from(py_map: PyBarMapping) -> Self {
        match py_map {
            PyBarMapping::Linear => BarMapping::Linear,
            PyBarMapping::Logarithmic => BarMapping::Logarithmic,
        }
    }
}

/// Config errors become ValueError, everything else RuntimeError
pub(super) fn to_py_err(err: PipelineError) -> PyErr {
    match err {
        PipelineError::Config(_) => PyValueError::new_err(err.to_string()),
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

/// Build a `PipelineConfig` from keyword arguments
pub(super) fn build_config(
    sample_rate: u32,
    fft_size: usize,
    bar_count: usize,
    sensitivity: f32,
    display_extent: f32,
    window_type: PyWindowType,
    bar_mapping: PyBarMapping,
) -> PipelineConfig {
    PipelineConfig {
        sample_rate,
        fft_size,
        bar_count,
        sensitivity,
        display_extent,
        window: window_type.into(),
        bar_mapping: bar_mapping.into(),
    }
}

/// Spectrum pipeline exposed to Python
#[pyclass(name = "SpectrumPipeline")]
pub struct PySpectrumPipeline {
    pipeline: SpectrumPipeline,
}

#[pymethods]
impl PySpectrumPipeline {
    /// Create an uninitialized pipeline
    #[new]
    fn new() -> Self {
        Self {
            pipeline: SpectrumPipeline::new(),
        }
    }

    /// Validate the configuration and allocate buffers
    ///
    /// Args:
    ///     sample_rate: Sample rate in Hz
    ///     fft_size: FFT size (power of 2, at least 2)
    ///     bar_count: Number of bars (1..=fft_size)
    ///     sensitivity: Gain applied before clamping
    ///     display_extent: Maximum bar height
    ///     window_type: Analysis window
    ///     bar_mapping: Bin-to-bar mapping
    ///
    /// Raises:
    ///     ValueError: If the configuration is invalid
    #[pyo3(signature = (
        sample_rate=22050,
        fft_size=4096,
        bar_count=64,
        sensitivity=50.0,
        display_extent=1.0,
        window_type=PyWindowType::Blackman,
        bar_mapping=PyBarMapping::Linear,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn initialize(
        &mut self,
        sample_rate: u32,
        fft_size: usize,
        bar_count: usize,
        sensitivity: f32,
        display_extent: f32,
        window_type: PyWindowType,
        bar_mapping: PyBarMapping,
    ) -> PyResult<()> {
        let config = build_config(
            sample_rate,
            fft_size,
            bar_count,
            sensitivity,
            display_extent,
            window_type,
            bar_mapping,
        );
        self.pipeline.initialize(config).map_err(to_py_err)
    }

    /// Analyze one block of exactly fft_size samples
    ///
    /// Args:
    ///     samples: float32 numpy array
    ///
    /// Returns:
    ///     Bar heights as numpy array
    ///
    /// Raises:
    ///     RuntimeError: If the pipeline is not ready or the block size is wrong
    fn tick<'py>(
        &mut self,
        py: Python<'py>,
        samples: PyReadonlyArray1<f32>,
    ) -> PyResult<&'py PyArray1<f32>> {
        let block = samples
            .as_slice()
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        let snapshot = self.pipeline.tick(block).map_err(to_py_err)?;

        Ok(PyArray1::from_slice(py, snapshot.bars()))
    }

    /// Stop the pipeline and release its buffers
    fn stop(&mut self) {
        self.pipeline.stop();
    }

    /// Latest bar heights, or None before the first tick
    fn current_snapshot<'py>(&self, py: Python<'py>) -> PyResult<Option<&'py PyArray1<f32>>> {
        let snapshot = self.pipeline.current_snapshot().map_err(to_py_err)?;
        Ok(snapshot.map(|s| PyArray1::from_slice(py, s.bars())))
    }

    /// Full magnitude spectrum from the last tick, or None
    fn spectrum<'py>(&self, py: Python<'py>) -> Option<&'py PyArray1<f32>> {
        self.pipeline
            .spectrum()
            .map(|s| PyArray1::from_slice(py, s))
    }

    /// Frequencies in Hz of bins 0..=fft_size/2, or None before initialize
    fn bin_frequencies<'py>(&self, py: Python<'py>) -> Option<&'py PyArray1<f32>> {
        self.pipeline
            .bin_frequencies()
            .map(|f| PyArray1::from_vec(py, f))
    }

    /// Lifecycle state: "uninitialized", "ready" or "stopped"
    fn state(&self) -> &'static str {
        match self.pipeline.state() {
            PipelineState::Uninitialized => "uninitialized",
            PipelineState::Ready => "ready",
            PipelineState::Stopped => "stopped",
        }
    }
}
