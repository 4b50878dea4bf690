//! Normalized magnitude spectrum from FFT output

use num_complex::Complex32;

/// Compute |X[k]| / N for every bin into `out`
///
/// N is the transform length `re.len()`. All N bins are produced; the upper
/// half mirrors the lower half for real input.
pub fn compute_into(re: &[f32], im: &[f32], out: &mut [f32]) {
    let n = re.len() as f32;

    for ((o, &r), &i) in out.iter_mut().zip(re).zip(im) {
        *o = Complex32::new(r, i).norm() / n;
    }
}

/// Compute the full-length magnitude spectrum
pub fn compute_spectrum(re: &[f32], im: &[f32]) -> Vec<f32> {
    let mut spectrum = vec![0.0; re.len().min(im.len())];
    compute_into(re, im, &mut spectrum);
    spectrum
}

/// Centre frequency of `bin` in Hz
pub fn bin_frequency(bin: usize, sample_rate: u32, fft_size: usize) -> f32 {
    bin as f32 * sample_rate as f32 / fft_size as f32
}

/// Frequency axis for the first N/2 + 1 bins (DC through Nyquist)
pub fn frequency_axis(sample_rate: u32, fft_size: usize) -> Vec<f32> {
    (0..=fft_size / 2)
        .map(|bin| bin_frequency(bin, sample_rate, fft_size))
        .collect()
}
