//! Radix-2 decimation-in-time FFT
//!
//! `FftEngine` plans the bit-reversal permutation and twiddle table once per
//! size and then transforms in place without allocating. `transform_recursive`
//! is the textbook even/odd recursion the engine reproduces.

use num_complex::Complex32;
use std::f64::consts::PI;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FftError {
    #[error("FFT size must be a power of two (got {0})")]
    NotPowerOfTwo(usize),

    #[error("FFT planned for {expected} points but buffers hold {re} real / {im} imaginary values")]
    LengthMismatch { expected: usize, re: usize, im: usize },
}

/// Transform direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Twiddles exp(-2πik/N), no scaling
    Forward,

    /// Twiddles exp(+2πik/N), halved at every stage (1/N overall)
    Inverse,
}

/// Complex samples stored as parallel real/imaginary sequences
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexBuffer {
    pub re: Vec<f32>,
    pub im: Vec<f32>,
}

impl ComplexBuffer {
    /// Zeroed buffer of `len` points
    pub fn new(len: usize) -> Self {
        Self {
            re: vec![0.0; len],
            im: vec![0.0; len],
        }
    }

    /// Copy real samples in and clear the imaginary part
    ///
    /// The caller's slice is never referenced after this returns
    pub fn load_real(&mut self, samples: &[f32]) {
        self.re.clear();
        self.re.extend_from_slice(samples);
        self.im.clear();
        self.im.resize(samples.len(), 0.0);
    }

    pub fn len(&self) -> usize {
        self.re.len()
    }

    pub fn is_empty(&self) -> bool {
        self.re.is_empty()
    }

    /// View as interleaved complex values
    pub fn to_complex(&self) -> Vec<Complex32> {
        self.re
            .iter()
            .zip(&self.im)
            .map(|(&re, &im)| Complex32::new(re, im))
            .collect()
    }
}

/// Twiddle factor W_n^k as (cos, sin)
///
/// The angle is formed from the reduced fraction k/n in f64, so W_{2n}^{2k}
/// and W_n^k round to the same f32 pair. This keeps table lookups bit-equal to
/// the per-level twiddles of the recursion.
fn twiddle(k: usize, n: usize, direction: Direction) -> (f32, f32) {
    let sign = match direction {
        Direction::Forward => -1.0,
        Direction::Inverse => 1.0,
    };
    let angle = sign * 2.0 * PI * (k as f64 / n as f64);
    (angle.cos() as f32, angle.sin() as f32)
}

/// Planned in-place radix-2 FFT
pub struct FftEngine {
    /// FFT size (number of points)
    size: usize,

    /// Bit-reversed index for every position
    bit_reversed: Vec<usize>,

    /// Forward twiddles W_N^k for k in [0, N/2)
    twiddles: Vec<(f32, f32)>,
}

impl FftEngine {
    /// Plan an FFT of `size` points
    ///
    /// # Arguments
    /// * `size` - Number of points, must be a power of two
    pub fn new(size: usize) -> Result<Self, FftError> {
        if !size.is_power_of_two() {
            return Err(FftError::NotPowerOfTwo(size));
        }

        let bits = size.trailing_zeros();
        let bit_reversed = (0..size)
            .map(|i| if bits == 0 { 0 } else { i.reverse_bits() >> (usize::BITS - bits) })
            .collect();

        let twiddles = (0..size / 2)
            .map(|k| twiddle(k, size, Direction::Forward))
            .collect();

        Ok(Self {
            size,
            bit_reversed,
            twiddles,
        })
    }

    /// Transform `re`/`im` in place
    ///
    /// Output ordering and values match `transform_recursive`.
    pub fn transform(&self, re: &mut [f32], im: &mut [f32], direction: Direction) -> Result<(), FftError> {
        if re.len() != self.size || im.len() != self.size {
            return Err(FftError::LengthMismatch {
                expected: self.size,
                re: re.len(),
                im: im.len(),
            });
        }

        for (i, &j) in self.bit_reversed.iter().enumerate() {
            if i < j {
                re.swap(i, j);
                im.swap(i, j);
            }
        }

        // Each pass of `len` combines pairs of len/2 sub-transforms, i.e. one
        // level of the recursion
        let mut len = 2;
        while len <= self.size {
            let half = len / 2;
            let stride = self.size / len;

            for start in (0..self.size).step_by(len) {
                for k in 0..half {
                    let (w_re, w_im) = self.twiddle_at(k * stride, direction);

                    let even = start + k;
                    let odd = even + half;

                    let t_re = w_re * re[odd] - w_im * im[odd];
                    let t_im = w_re * im[odd] + w_im * re[odd];

                    let (e_re, e_im) = (re[even], im[even]);
                    re[even] = e_re + t_re;
                    im[even] = e_im + t_im;
                    re[odd] = e_re - t_re;
                    im[odd] = e_im - t_im;

                    if direction == Direction::Inverse {
                        re[even] /= 2.0;
                        im[even] /= 2.0;
                        re[odd] /= 2.0;
                        im[odd] /= 2.0;
                    }
                }
            }

            len *= 2;
        }

        Ok(())
    }

    /// Transform a `ComplexBuffer` in place
    pub fn process(&self, buffer: &mut ComplexBuffer, direction: Direction) -> Result<(), FftError> {
        let ComplexBuffer { re, im } = buffer;
        self.transform(re, im, direction)
    }

    #[inline]
    fn twiddle_at(&self, index: usize, direction: Direction) -> (f32, f32) {
        let (c, s) = self.twiddles[index];
        match direction {
            Direction::Forward => (c, s),
            Direction::Inverse => (c, -s),
        }
    }

    /// Get FFT size
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Recursive radix-2 decimation-in-time FFT
///
/// Allocates fresh even/odd halves at every level. Kept as the reference
/// definition; real-time callers use `FftEngine`.
pub fn transform_recursive(
    re: &[f32],
    im: &[f32],
    direction: Direction,
) -> Result<(Vec<f32>, Vec<f32>), FftError> {
    let n = re.len();
    if !n.is_power_of_two() {
        return Err(FftError::NotPowerOfTwo(n));
    }
    if im.len() != n {
        return Err(FftError::LengthMismatch {
            expected: n,
            re: n,
            im: im.len(),
        });
    }

    let mut out_re = re.to_vec();
    let mut out_im = im.to_vec();
    recurse(&mut out_re, &mut out_im, direction);
    Ok((out_re, out_im))
}

fn recurse(re: &mut [f32], im: &mut [f32], direction: Direction) {
    let n = re.len();
    if n == 1 {
        return;
    }

    let half = n / 2;
    let mut even_re: Vec<f32> = re.iter().step_by(2).copied().collect();
    let mut even_im: Vec<f32> = im.iter().step_by(2).copied().collect();
    let mut odd_re: Vec<f32> = re.iter().skip(1).step_by(2).copied().collect();
    let mut odd_im: Vec<f32> = im.iter().skip(1).step_by(2).copied().collect();

    recurse(&mut even_re, &mut even_im, direction);
    recurse(&mut odd_re, &mut odd_im, direction);

    for k in 0..half {
        let (w_re, w_im) = twiddle(k, n, direction);

        let t_re = w_re * odd_re[k] - w_im * odd_im[k];
        let t_im = w_re * odd_im[k] + w_im * odd_re[k];

        re[k] = even_re[k] + t_re;
        im[k] = even_im[k] + t_im;
        re[k + half] = even_re[k] - t_re;
        im[k + half] = even_im[k] - t_im;

        if direction == Direction::Inverse {
            re[k] /= 2.0;
            im[k] /= 2.0;
            re[k + half] /= 2.0;
            im[k + half] /= 2.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic values in [-1, 1]
    fn noise(len: usize, seed: u32) -> Vec<f32> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0
            })
            .collect()
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        assert_eq!(FftEngine::new(100).err(), Some(FftError::NotPowerOfTwo(100)));
        assert_eq!(FftEngine::new(0).err(), Some(FftError::NotPowerOfTwo(0)));
        assert!(transform_recursive(&[0.0; 6], &[0.0; 6], Direction::Forward).is_err());
    }

    #[test]
    fn test_bit_reversal_table() {
        let fft = FftEngine::new(8).unwrap();
        assert_eq!(fft.bit_reversed, vec![0, 4, 2, 6, 1, 5, 3, 7]);
    }

    #[test]
    fn test_single_point_is_identity() {
        let fft = FftEngine::new(1).unwrap();
        let mut re = [0.75];
        let mut im = [-0.25];
        fft.transform(&mut re, &mut im, Direction::Forward).unwrap();
        assert_eq!((re[0], im[0]), (0.75, -0.25));
    }

    #[test]
    fn test_round_trip() {
        let fft = FftEngine::new(16).unwrap();
        let signal = noise(16, 7);

        let mut buffer = ComplexBuffer::new(16);
        buffer.load_real(&signal);

        fft.process(&mut buffer, Direction::Forward).unwrap();
        fft.process(&mut buffer, Direction::Inverse).unwrap();

        for (i, &x) in signal.iter().enumerate() {
            assert!((buffer.re[i] - x).abs() < 1e-4);
            assert!(buffer.im[i].abs() < 1e-4);
        }
    }

    #[test]
    fn test_dc_signal() {
        let fft = FftEngine::new(8).unwrap();
        let c = 0.5;
        let mut re = vec![c; 8];
        let mut im = vec![0.0; 8];

        fft.transform(&mut re, &mut im, Direction::Forward).unwrap();

        assert!((re[0] - c * 8.0).abs() < 1e-5);
        assert!(im[0].abs() < 1e-5);
        for k in 1..8 {
            assert!(re[k].abs() < 1e-5 && im[k].abs() < 1e-5, "bin {k} not empty");
        }
    }

    #[test]
    fn test_impulse_is_flat() {
        let fft = FftEngine::new(32).unwrap();
        let mut re = vec![0.0; 32];
        let mut im = vec![0.0; 32];
        re[0] = 1.0;

        fft.transform(&mut re, &mut im, Direction::Forward).unwrap();

        assert!(re.iter().all(|&x| (x - 1.0).abs() < 1e-6));
        assert!(im.iter().all(|&x| x.abs() < 1e-6));
    }

    #[test]
    fn test_engine_matches_recursive() {
        let fft = FftEngine::new(32).unwrap();
        let re_in = noise(32, 1);
        let im_in = noise(32, 2);

        for direction in [Direction::Forward, Direction::Inverse] {
            let (want_re, want_im) = transform_recursive(&re_in, &im_in, direction).unwrap();

            let mut re = re_in.clone();
            let mut im = im_in.clone();
            fft.transform(&mut re, &mut im, direction).unwrap();

            for k in 0..32 {
                assert!((re[k] - want_re[k]).abs() < 1e-6);
                assert!((im[k] - want_im[k]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_matches_rustfft() {
        use rustfft::FftPlanner;

        let n = 64;
        let signal = noise(n, 42);

        let mut planner = FftPlanner::<f32>::new();
        let reference_fft = planner.plan_fft_forward(n);
        let mut reference: Vec<Complex32> = signal.iter().map(|&x| Complex32::new(x, 0.0)).collect();
        reference_fft.process(&mut reference);

        let fft = FftEngine::new(n).unwrap();
        let mut buffer = ComplexBuffer::new(n);
        buffer.load_real(&signal);
        fft.process(&mut buffer, Direction::Forward).unwrap();

        for (got, want) in buffer.to_complex().iter().zip(&reference) {
            assert!((got - want).norm() < 1e-3);
        }
    }

    #[test]
    fn test_length_mismatch() {
        let fft = FftEngine::new(8).unwrap();
        let mut re = vec![0.0; 8];
        let mut im = vec![0.0; 4];
        assert_eq!(
            fft.transform(&mut re, &mut im, Direction::Forward),
            Err(FftError::LengthMismatch { expected: 8, re: 8, im: 4 })
        );
    }
}
