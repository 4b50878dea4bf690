//! Background spectrum monitor - keeps the analysis loop in Rust
//!
//! A worker thread pulls the latest block from an `AudioSource` once per
//! interval, ticks a `SpectrumPipeline` and hands each snapshot to a sink.
//! Readers poll `latest()` from any thread.

use super::buffer::SampleRing;
use super::capture::{AudioCapture, AudioError};
use super::{AudioSource, SnapshotSink, SourceError};
use crate::spectrum::{BarSnapshot, PipelineConfig, PipelineError, SnapshotHandle, SpectrumPipeline};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Monitor is already running")]
    AlreadyRunning,

    #[error("Failed to start audio: {0}")]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Failed to spawn analysis thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Pipeline settings; `sample_rate` is replaced by the device rate when
    /// capturing from a microphone
    pub pipeline: PipelineConfig,

    /// Time between analysis ticks
    pub interval: Duration,

    /// Capture ring size in samples
    pub ring_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            interval: Duration::from_millis(16),
            ring_capacity: 96000,
        }
    }
}

/// Live spectrum monitor
pub struct SpectrumMonitor {
    /// Microphone stream, when started with `start`
    capture: Option<AudioCapture>,

    /// Analysis thread handle
    worker: Option<JoinHandle<()>>,

    /// Running flag
    running: Arc<AtomicBool>,

    /// Latest published snapshot, shared with the worker's pipeline
    snapshots: SnapshotHandle,
}

impl Default for SpectrumMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumMonitor {
    pub fn new() -> Self {
        Self {
            capture: None,
            worker: None,
            running: Arc::new(AtomicBool::new(false)),
            snapshots: SnapshotHandle::default(),
        }
    }

    /// Capture from the default microphone and start analyzing
    ///
    /// # Returns
    /// Name of the capture device
    pub fn start(&mut self, config: MonitorConfig) -> Result<String, MonitorError> {
        if self.is_running() {
            return Err(MonitorError::AlreadyRunning);
        }

        let ring = SampleRing::new(config.ring_capacity.max(config.pipeline.fft_size));
        let (producer, source) = ring.split(config.pipeline.fft_size);

        let capture = AudioCapture::from_default_device(producer)?;
        let device_name = capture.device_info().name.clone();

        let pipeline = PipelineConfig {
            sample_rate: capture.device_info().sample_rate,
            ..config.pipeline
        };

        self.spawn_worker(
            source,
            |_: &BarSnapshot| {},
            MonitorConfig { pipeline, ..config },
        )?;

        if let Err(e) = capture.start() {
            self.stop();
            return Err(e.into());
        }
        self.capture = Some(capture);

        Ok(device_name)
    }

    /// Analyze an arbitrary source, passing every snapshot to `sink`
    pub fn start_with_source<S, K>(
        &mut self,
        source: S,
        sink: K,
        config: MonitorConfig,
    ) -> Result<(), MonitorError>
    where
        S: AudioSource + Send + 'static,
        K: SnapshotSink + Send + 'static,
    {
        if self.is_running() {
            return Err(MonitorError::AlreadyRunning);
        }
        self.spawn_worker(source, sink, config)
    }

    fn spawn_worker<S, K>(&mut self, mut source: S, mut sink: K, config: MonitorConfig) -> Result<(), MonitorError>
    where
        S: AudioSource + Send + 'static,
        K: SnapshotSink + Send + 'static,
    {
        // A worker that exited on its own (disconnected source) is reaped here
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }

        // Validate on the caller's thread so config errors surface from start
        let mut pipeline = SpectrumPipeline::with_snapshot_handle(self.snapshots.clone());
        pipeline.initialize(config.pipeline.clone())?;

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let interval = config.interval;
        let fft_size = config.pipeline.fft_size;

        let spawned = std::thread::Builder::new()
            .name("spectrum-analysis".into())
            .spawn(move || {
                let mut block = vec![0.0; fft_size];

                while running.load(Ordering::SeqCst) {
                    match source.read_latest(&mut block) {
                        Ok(()) => match pipeline.tick(&block) {
                            Ok(snapshot) => sink.present(&snapshot),
                            Err(e) => warn!(error = %e, "Spectrum tick failed"),
                        },
                        Err(SourceError::NotReady { available, requested }) => {
                            debug!(available, requested, "Waiting for samples");
                        }
                        Err(SourceError::Disconnected) => {
                            warn!("Audio source disconnected, stopping analysis");
                            running.store(false, Ordering::SeqCst);
                        }
                    }

                    // Sleep instead of spinning while the source fills up
                    std::thread::sleep(interval);
                }

                pipeline.stop();
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                info!(fft_size, interval_ms = interval.as_millis() as u64, "Spectrum monitor started");
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    /// Stop analysis and capture
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }

        if let Some(capture) = self.capture.take() {
            let _ = capture.pause();
        }
    }

    /// Whether the analysis thread is active
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Latest snapshot (kept after `stop`)
    pub fn latest(&self) -> Option<BarSnapshot> {
        self.snapshots.latest()
    }

    /// Handle for readers on other threads
    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.snapshots.clone()
    }
}

impl Drop for SpectrumMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;
    use std::sync::mpsc;

    /// Sine at bin 1 of an 8-point block, not ready on the first read
    struct ToneSource {
        reads: usize,
    }

    impl AudioSource for ToneSource {
        fn read_latest(&mut self, out: &mut [f32]) -> Result<(), SourceError> {
            self.reads += 1;
            if self.reads == 1 {
                return Err(SourceError::NotReady {
                    available: 0,
                    requested: out.len(),
                });
            }
            let n = out.len() as f32;
            for (i, s) in out.iter_mut().enumerate() {
                *s = (2.0 * PI * i as f32 / n).sin();
            }
            Ok(())
        }
    }

    fn small_config() -> MonitorConfig {
        MonitorConfig {
            pipeline: PipelineConfig {
                fft_size: 8,
                bar_count: 4,
                sensitivity: 1.0,
                display_extent: 1.0,
                ..PipelineConfig::default()
            },
            interval: Duration::from_millis(1),
            ring_capacity: 64,
        }
    }

    #[test]
    fn test_monitor_publishes_snapshots() {
        let (tx, rx) = mpsc::channel();
        let mut monitor = SpectrumMonitor::new();

        monitor
            .start_with_source(
                ToneSource { reads: 0 },
                move |snapshot: &BarSnapshot| {
                    let _ = tx.send(snapshot.clone());
                },
                small_config(),
            )
            .unwrap();
        assert!(monitor.is_running());

        let snapshot = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(snapshot.peak().map(|(i, _)| i), Some(1));

        monitor.stop();
        assert!(!monitor.is_running());
        assert!(monitor.latest().is_some());
    }

    #[test]
    fn test_second_start_rejected() {
        let mut monitor = SpectrumMonitor::new();
        monitor
            .start_with_source(ToneSource { reads: 0 }, |_: &BarSnapshot| {}, small_config())
            .unwrap();

        let again = monitor.start_with_source(ToneSource { reads: 0 }, |_: &BarSnapshot| {}, small_config());
        assert!(matches!(again, Err(MonitorError::AlreadyRunning)));
    }

    #[test]
    fn test_invalid_config_does_not_start() {
        let mut config = small_config();
        config.pipeline.fft_size = 12;

        let mut monitor = SpectrumMonitor::new();
        let result = monitor.start_with_source(ToneSource { reads: 0 }, |_: &BarSnapshot| {}, config);

        assert!(matches!(result, Err(MonitorError::Pipeline(PipelineError::Config(_)))));
        assert!(!monitor.is_running());
    }

    #[test]
    fn test_disconnected_source_stops_worker() {
        struct Gone;
        impl AudioSource for Gone {
            fn read_latest(&mut self, _: &mut [f32]) -> Result<(), SourceError> {
                Err(SourceError::Disconnected)
            }
        }

        let mut monitor = SpectrumMonitor::new();
        monitor
            .start_with_source(Gone, |_: &BarSnapshot| {}, small_config())
            .unwrap();

        for _ in 0..500 {
            if !monitor.is_running() {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(!monitor.is_running());
        assert!(monitor.latest().is_none());
    }
}
