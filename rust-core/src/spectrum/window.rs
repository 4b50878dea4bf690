//! Analysis windows applied to sample blocks before the FFT
//!
//! Tapering the block edges reduces spectral leakage between bins

use std::f32::consts::PI;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("Window length must be at least 2 samples (got {0})")]
    TooShort(usize),

    #[error("Window table has {table} coefficients but block has {block} samples")]
    LengthMismatch { table: usize, block: usize },
}

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    /// Blackman window: w[n] = 0.42 - 0.5*cos(2πn/(N-1)) + 0.08*cos(4πn/(N-1))
    /// Sidelobe attenuation: ~74 dB
    #[default]
    Blackman,

    /// Hann window: w[n] = 0.5 - 0.5*cos(2πn/(N-1))
    Hann,

    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/(N-1))
    Hamming,

    /// Rectangular window (no windowing)
    Rectangular,
}

impl WindowType {
    /// Coefficient for sample `n` of an `len`-sample window (`len` ≥ 2)
    fn coefficient(self, n: usize, len: usize) -> f32 {
        let denom = (len - 1) as f32;
        let angle = 2.0 * PI * n as f32 / denom;

        match self {
            WindowType::Blackman => {
                let angle2 = 4.0 * PI * n as f32 / denom;
                0.42 - 0.5 * angle.cos() + 0.08 * angle2.cos()
            }
            WindowType::Hann => 0.5 - 0.5 * angle.cos(),
            WindowType::Hamming => 0.54 - 0.46 * angle.cos(),
            WindowType::Rectangular => 1.0,
        }
    }
}

/// Generate window coefficients
///
/// # Arguments
/// * `window_type` - Type of window function
/// * `length` - Number of samples (N)
///
/// # Returns
/// Vector of window coefficients w[n] for n = 0..N-1
pub fn generate_window(window_type: WindowType, length: usize) -> Result<Vec<f32>, WindowError> {
    if length < 2 {
        return Err(WindowError::TooShort(length));
    }

    Ok((0..length)
        .map(|n| window_type.coefficient(n, length))
        .collect())
}

/// Apply Blackman window in-place
pub fn apply_blackman(samples: &mut [f32]) -> Result<(), WindowError> {
    apply_window_inplace(samples, WindowType::Blackman)
}

/// Apply window in-place, computing coefficients on the fly
pub fn apply_window_inplace(samples: &mut [f32], window_type: WindowType) -> Result<(), WindowError> {
    let len = samples.len();
    if len < 2 {
        return Err(WindowError::TooShort(len));
    }

    for (n, s) in samples.iter_mut().enumerate() {
        *s *= window_type.coefficient(n, len);
    }

    Ok(())
}

/// Apply a precomputed coefficient table in-place
///
/// Used on the hot path so coefficients are computed once per configuration
pub fn apply_table(samples: &mut [f32], table: &[f32]) -> Result<(), WindowError> {
    if samples.len() != table.len() {
        return Err(WindowError::LengthMismatch {
            table: table.len(),
            block: samples.len(),
        });
    }

    for (s, w) in samples.iter_mut().zip(table) {
        *s *= w;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blackman_n8_coefficients() {
        // 0.42 - 0.5*cos(2πn/7) + 0.08*cos(4πn/7)
        let expected: [f32; 8] = [
            0.0,
            0.090_453_42,
            0.459_182_96,
            0.920_363_6,
            0.920_363_6,
            0.459_182_96,
            0.090_453_42,
            0.0,
        ];

        let mut samples = vec![1.0f32; 8];
        apply_blackman(&mut samples).unwrap();

        for (got, want) in samples.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-5, "got {got}, want {want}");
        }
    }

    #[test]
    fn test_blackman_odd_length_center() {
        let window = generate_window(WindowType::Blackman, 9).unwrap();

        // Endpoints are 0.42 - 0.5 + 0.08
        assert!(window[0].abs() < 1e-6);
        assert!(window[8].abs() < 1e-6);

        // Center of an odd-length window is exactly the peak
        assert!((window[4] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_window_symmetry() {
        for window_type in [WindowType::Blackman, WindowType::Hann, WindowType::Hamming] {
            let window = generate_window(window_type, 64).unwrap();
            for n in 0..32 {
                assert!((window[n] - window[63 - n]).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_hamming_endpoints() {
        let window = generate_window(WindowType::Hamming, 100).unwrap();
        assert!(window[0] > 0.07 && window[0] < 0.09);
    }

    #[test]
    fn test_rectangular_window() {
        let window = generate_window(WindowType::Rectangular, 100).unwrap();
        assert_eq!(window.len(), 100);
        assert!(window.iter().all(|&w| w == 1.0));
    }

    #[test]
    fn test_too_short_rejected() {
        let mut one = [1.0f32];
        assert_eq!(apply_blackman(&mut one), Err(WindowError::TooShort(1)));
        assert_eq!(generate_window(WindowType::Blackman, 0), Err(WindowError::TooShort(0)));

        // Rejected input is left untouched
        assert_eq!(one[0], 1.0);
    }

    #[test]
    fn test_apply_table_matches_inplace() {
        let signal: Vec<f32> = (0..32).map(|n| (n as f32 * 0.3).sin()).collect();

        let mut direct = signal.clone();
        apply_window_inplace(&mut direct, WindowType::Blackman).unwrap();

        let table = generate_window(WindowType::Blackman, 32).unwrap();
        let mut tabled = signal;
        apply_table(&mut tabled, &table).unwrap();

        assert_eq!(direct, tabled);
    }

    #[test]
    fn test_apply_table_length_mismatch() {
        let table = generate_window(WindowType::Blackman, 8).unwrap();
        let mut samples = vec![1.0; 4];
        assert_eq!(
            apply_table(&mut samples, &table),
            Err(WindowError::LengthMismatch { table: 8, block: 4 })
        );
    }
}
