//! Lock-free sample ring between the capture callback and the analysis loop
//!
//! The producer half is moved into the audio callback; the consumer half is
//! wrapped in `LatestSamples`, which serves the most recent N samples.

use super::{AudioSource, SourceError};
use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Thread-safe mono sample ring
pub struct SampleRing {
    producer: HeapProducer<f32>,
    consumer: HeapConsumer<f32>,
    capacity: usize,
}

impl SampleRing {
    /// Create new ring buffer with given capacity
    ///
    /// # Arguments
    /// * `capacity` - Buffer capacity in samples
    pub fn new(capacity: usize) -> Self {
        let rb = HeapRb::<f32>::new(capacity);
        let (producer, consumer) = rb.split();

        Self {
            producer,
            consumer,
            capacity,
        }
    }

    /// Split into the writing end and a source serving blocks of `block_len`
    pub fn split(self, block_len: usize) -> (SampleProducer, LatestSamples) {
        (
            SampleProducer {
                producer: self.producer,
            },
            LatestSamples::new(self.consumer, block_len),
        )
    }

    /// Get buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Writing end of the ring (lives in the capture callback)
pub struct SampleProducer {
    producer: HeapProducer<f32>,
}

impl SampleProducer {
    /// Write samples, returning how many fit
    pub fn write(&mut self, samples: &[f32]) -> usize {
        self.producer.push_slice(samples)
    }

    /// Write one sample; `false` if the ring is full and it was dropped
    pub fn push(&mut self, sample: f32) -> bool {
        self.producer.push(sample).is_ok()
    }

    /// Get number of free slots
    pub fn free_len(&self) -> usize {
        self.producer.free_len()
    }
}

/// `AudioSource` yielding the most recent samples from the ring
///
/// Drains everything the producer has written and keeps the newest
/// `block_len` samples, so consecutive reads overlap when the analysis rate
/// outpaces the capture rate.
pub struct LatestSamples {
    consumer: HeapConsumer<f32>,
    history: Vec<f32>,
    scratch: Vec<f32>,
    block_len: usize,
}

impl LatestSamples {
    fn new(consumer: HeapConsumer<f32>, block_len: usize) -> Self {
        Self {
            consumer,
            history: Vec::with_capacity(block_len * 2),
            scratch: vec![0.0; block_len.max(1)],
            block_len,
        }
    }

    fn drain(&mut self) {
        loop {
            let n = self.consumer.pop_slice(&mut self.scratch);
            if n == 0 {
                break;
            }
            self.history.extend_from_slice(&self.scratch[..n]);

            if self.history.len() > self.block_len {
                let excess = self.history.len() - self.block_len;
                self.history.drain(..excess);
            }
        }
    }

    /// Samples currently held, capped at `block_len`
    pub fn available(&mut self) -> usize {
        self.drain();
        self.history.len()
    }
}

impl AudioSource for LatestSamples {
    fn read_latest(&mut self, out: &mut [f32]) -> Result<(), SourceError> {
        self.drain();

        let available = self.history.len();
        if out.len() > available {
            return Err(SourceError::NotReady {
                available,
                requested: out.len(),
            });
        }

        out.copy_from_slice(&self.history[available - out.len()..]);
        Ok(())
    }
}
