// Sub-band energy feature extraction
//
// Implements the FFT filter-bank technique used for voice-command
// recognition: an N-sample frame is windowed, transformed with a real-input
// FFT, and the one-sided spectrum is partitioned into K equal-width groups of
// bins. The energy of each group, E = (1/N) * sum(|X(k)|^2), is the feature.
//
// Frame coercion policy: frames shorter than N are zero-padded at the end;
// frames longer than N contribute their centered N samples. The same policy
// is used by training, one-shot recognition and the streaming loop.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::config::FeatureConfig;
use crate::error::AnalysisError;

/// Partition `bins` FFT bins into `k` contiguous, disjoint, ordered ranges
/// sized as equally as possible. The first `bins % k` ranges get one extra
/// bin. When `k > bins` the trailing ranges are empty.
pub fn partition_equal_bins(bins: usize, k: usize) -> Vec<(usize, usize)> {
    if k == 0 {
        return Vec::new();
    }
    let base = bins / k;
    let remainder = bins % k;
    let mut bands = Vec::with_capacity(k);
    let mut idx = 0;
    for i in 0..k {
        let size = base + usize::from(i < remainder);
        bands.push((idx, idx + size));
        idx += size;
    }
    bands
}

/// Analysis window applied before the FFT. Periodic (DFT-even) definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Rect,
    Hamming,
    Hann,
}

impl WindowKind {
    pub fn coefficients(self, n: usize) -> Vec<f32> {
        use std::f32::consts::TAU;
        match self {
            WindowKind::Rect => vec![1.0; n],
            WindowKind::Hamming => (0..n)
                .map(|i| 0.54 - 0.46 * (TAU * i as f32 / n as f32).cos())
                .collect(),
            WindowKind::Hann => (0..n)
                .map(|i| 0.5 * (1.0 - (TAU * i as f32 / n as f32).cos()))
                .collect(),
        }
    }
}

impl Default for WindowKind {
    fn default() -> Self {
        WindowKind::Hamming
    }
}

impl FromStr for WindowKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "none" | "rect" | "rectangular" => Ok(WindowKind::Rect),
            "hamming" => Ok(WindowKind::Hamming),
            "hann" | "hanning" => Ok(WindowKind::Hann),
            other => Err(AnalysisError::InvalidInput {
                reason: format!("unknown window kind '{}'", other),
            }),
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WindowKind::Rect => "rect",
            WindowKind::Hamming => "hamming",
            WindowKind::Hann => "hann",
        };
        write!(f, "{}", name)
    }
}

/// How raw band energies are post-processed before use. `LogRelative`
/// normalizes by the total energy and log-compresses; it is an explicit mode
/// stored in the model so training and classification can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureScaling {
    Linear,
    LogRelative,
}

impl Default for FeatureScaling {
    fn default() -> Self {
        FeatureScaling::Linear
    }
}

/// Features extracted from one audio frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SubbandFeatures {
    /// K band energies, one per sub-band.
    pub energies: Vec<f64>,
    /// Hz range (first and last bin frequency) covered by each band.
    pub bands_hz: Vec<(f64, f64)>,
    /// Full rFFT frequency axis, N/2 + 1 points.
    pub freqs: Vec<f64>,
}

/// Computes K sub-band energies from an N-sample frame.
///
/// The FFT plan, window coefficients and bin partition are computed once at
/// construction; `extract` is pure and deterministic.
#[derive(Clone)]
pub struct SubbandExtractor {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    partition: Vec<(usize, usize)>,
    fs: u32,
    frame_len: usize,
    scaling: FeatureScaling,
}

impl SubbandExtractor {
    pub fn new(config: &FeatureConfig) -> Result<Self, AnalysisError> {
        if config.frame_len == 0 {
            return Err(AnalysisError::InvalidInput {
                reason: "frame length must be greater than zero".into(),
            });
        }
        if config.num_bands == 0 {
            return Err(AnalysisError::InvalidInput {
                reason: "band count must be greater than zero".into(),
            });
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.frame_len);
        let window = config.window.coefficients(config.frame_len);
        let bins = config.frame_len / 2 + 1;
        let partition = partition_equal_bins(bins, config.num_bands);

        Ok(Self {
            fft,
            window,
            partition,
            fs: config.fs,
            frame_len: config.frame_len,
            scaling: config.scaling,
        })
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    pub fn num_bands(&self) -> usize {
        self.partition.len()
    }

    /// Extract sub-band energies from `frame`.
    ///
    /// The frame is coerced to exactly N samples (zero-padded or
    /// center-cropped), windowed and transformed; each band's energy is
    /// accumulated in f64. Empty bands (K greater than the bin count) get
    /// energy 0.
    pub fn extract(&self, frame: &[f32]) -> Result<SubbandFeatures, AnalysisError> {
        if frame.is_empty() {
            return Err(AnalysisError::InvalidInput {
                reason: "empty audio frame".into(),
            });
        }

        let mut buffer = self.windowed_frame(frame);
        self.fft.process(&mut buffer);

        let n = self.frame_len as f64;
        let bins = self.frame_len / 2 + 1;
        let bin_hz = self.fs as f64 / n;
        let freqs: Vec<f64> = (0..bins).map(|i| i as f64 * bin_hz).collect();

        let mut energies = Vec::with_capacity(self.partition.len());
        let mut bands_hz = Vec::with_capacity(self.partition.len());
        for &(start, end) in &self.partition {
            let energy: f64 = buffer[start..end]
                .iter()
                .map(|c| c.norm_sqr() as f64)
                .sum::<f64>()
                / n;
            energies.push(energy);

            let f0 = freqs[start.min(bins - 1)];
            let f1 = if end > start { freqs[end - 1] } else { f0 };
            bands_hz.push((f0, f1));
        }

        self.apply_scaling(&mut energies);

        Ok(SubbandFeatures {
            energies,
            bands_hz,
            freqs,
        })
    }

    /// Coerce the input to exactly N samples and apply the window.
    fn windowed_frame(&self, frame: &[f32]) -> Vec<Complex<f32>> {
        let n = self.frame_len;
        let slice = if frame.len() > n {
            let start = (frame.len() - n) / 2;
            &frame[start..start + n]
        } else {
            frame
        };

        let mut buffer = Vec::with_capacity(n);
        for (i, &sample) in slice.iter().enumerate() {
            buffer.push(Complex::new(sample * self.window[i], 0.0));
        }
        buffer.resize(n, Complex::new(0.0, 0.0));
        buffer
    }

    fn apply_scaling(&self, energies: &mut [f64]) {
        if self.scaling == FeatureScaling::LogRelative {
            let total: f64 = energies.iter().sum::<f64>() + 1e-12;
            for e in energies.iter_mut() {
                *e = (*e / total + 1e-12).log10();
            }
        }
    }
}

/// RMS level of a chunk, with a small bias to keep the log finite on silence.
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&x| x as f64 * x as f64).sum();
    (sum_squares / samples.len() as f64 + 1e-12).sqrt()
}

/// Decibels relative to full scale: 20*log10(rms).
pub fn dbfs(rms: f64) -> f64 {
    20.0 * rms.max(1e-12).log10()
}
