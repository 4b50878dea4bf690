//! PyO3 bindings for Python integration

use pyo3::prelude::*;

mod pipeline_bindings;
mod monitor_bindings;

/// Python module definition
#[pymodule]
fn mic_spectrum(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<pipeline_bindings::PySpectrumPipeline>()?;
    m.add_class::<monitor_bindings::PySpectrumMonitor>()?;

    m.add_class::<pipeline_bindings::PyWindowType>()?;
    m.add_class::<pipeline_bindings::PyBarMapping>()?;

    Ok(())
}
