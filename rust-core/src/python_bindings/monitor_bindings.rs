//! Python bindings for the live microphone monitor

use pyo3::prelude::*;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use numpy::PyArray1;
use std::time::Duration;
use crate::audio::{MonitorConfig, MonitorError, SpectrumMonitor};
use super::pipeline_bindings::{build_config, to_py_err, PyBarMapping, PyWindowType};

/// Live microphone spectrum monitor exposed to Python
///
/// Capture and analysis run on Rust threads; Python only polls `latest`
#[pyclass(name = "SpectrumMonitor", unsendable)]
pub struct PySpectrumMonitor {
    monitor: SpectrumMonitor,
}

#[pymethods]
impl PySpectrumMonitor {
    #[new]
    fn new() -> Self {
        Self {
            monitor: SpectrumMonitor::new(),
        }
    }

    /// Start capturing from the default microphone
    ///
    /// Returns:
    ///     Device name as string
    #[pyo3(signature = (
        fft_size=4096,
        bar_count=64,
        sensitivity=50.0,
        display_extent=1.0,
        interval_ms=16,
        window_type=PyWindowType::Blackman,
        bar_mapping=PyBarMapping::Linear,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn start(
        &mut self,
        fft_size: usize,
        bar_count: usize,
        sensitivity: f32,
        display_extent: f32,
        interval_ms: u64,
        window_type: PyWindowType,
        bar_mapping: PyBarMapping,
    ) -> PyResult<String> {
        let defaults = MonitorConfig::default();
        let config = MonitorConfig {
            // Replaced by the device rate once capture opens
            pipeline: build_config(
                defaults.pipeline.sample_rate,
                fft_size,
                bar_count,
                sensitivity,
                display_extent,
                window_type,
                bar_mapping,
            ),
            interval: Duration::from_millis(interval_ms),
            ..defaults
        };

        self.monitor.start(config).map_err(|e| match e {
            MonitorError::Pipeline(err) => to_py_err(err),
            other @ MonitorError::AlreadyRunning => PyValueError::new_err(other.to_string()),
            other => PyRuntimeError::new_err(other.to_string()),
        })
    }

    /// Stop capture and analysis
    fn stop(&mut self) {
        self.monitor.stop();
    }

    /// Check if the monitor is running
    fn is_running(&self) -> bool {
        self.monitor.is_running()
    }

    /// Latest bar heights (called from Python at display rate)
    fn latest<'py>(&self, py: Python<'py>) -> Option<&'py PyArray1<f32>> {
        self.monitor
            .latest()
            .map(|s| PyArray1::from_slice(py, s.bars()))
    }

    /// List available input device names
    #[staticmethod]
    fn list_devices() -> PyResult<Vec<String>> {
        crate::audio::list_input_devices()
            .map(|devices| devices.into_iter().map(|d| d.name).collect())
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }
}
