//! Stochastic atmospheric models.
//!
//! Seeing and transparency are both modeled as a stationary Gaussian process
//! with a low-pass power spectral density, mapped sample by sample onto the
//! target marginal distribution. The Gaussian series is synthesized in the
//! frequency domain: complex Gaussian coefficients scaled by the PSD, made
//! Hermitian-symmetric and transformed back with an inverse FFT.

use rand::Rng;
use rand_distr::StandardNormal;
use rustfft::{num_complex::Complex64, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurveyError};

/// Low-pass PSD shape `S(f) = 1 / (1 + (f / f_knee)^slope)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralShape {
    /// Correlation time scale: `f_knee = 1 / knee_period`.
    pub knee_period_hours: f64,
    /// Power-law index above the knee.
    pub slope: f64,
}

impl SpectralShape {
    pub fn density(&self, freq_hz: f64) -> f64 {
        let knee_hz = 1.0 / (self.knee_period_hours * 3600.0);
        1.0 / (1.0 + (freq_hz / knee_hz).powf(self.slope))
    }

    fn validate(&self, model: &str) -> Result<()> {
        if !(self.knee_period_hours > 0.0) || !(self.slope > 0.0) {
            return Err(SurveyError::configuration(format!(
                "{} spectrum needs positive knee_period_hours and slope, got {} and {}",
                model, self.knee_period_hours, self.slope
            )));
        }
        Ok(())
    }
}

/// Sample a zero-mean, unit-variance Gaussian series of `n` points spaced
/// `dt_sec` seconds apart.
pub fn sample_gaussian_process<R: Rng + ?Sized>(
    n: usize,
    dt_sec: f64,
    shape: &SpectralShape,
    rng: &mut R,
) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }

    let n_fft = n.next_power_of_two().max(2);
    let df = 1.0 / (n_fft as f64 * dt_sec);
    let nyquist = n_fft / 2;

    let mut spectrum = vec![Complex64::new(0.0, 0.0); n_fft];
    for i in 1..=nyquist {
        let amplitude = (shape.density(i as f64 * df) * df).sqrt();
        let re: f64 = rng.sample(StandardNormal);
        let im: f64 = rng.sample(StandardNormal);

        if i == nyquist {
            // Nyquist bin of a real signal is real
            spectrum[i] = Complex64::new(amplitude * re, 0.0);
        } else {
            spectrum[i] = Complex64::new(amplitude * re, amplitude * im);
            spectrum[n_fft - i] = spectrum[i].conj();
        }
    }

    let mut planner = FftPlanner::new();
    let inverse_fft = planner.plan_fft_inverse(n_fft);
    inverse_fft.process(&mut spectrum);

    let mut series: Vec<f64> = spectrum.iter().take(n).map(|c| c.re).collect();
    standardize(&mut series);
    series
}

/// Shift and scale in place to zero mean and unit variance.
fn standardize(series: &mut [f64]) {
    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;
    let variance = series.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();

    for x in series.iter_mut() {
        *x = if std > 0.0 { (*x - mean) / std } else { 0.0 };
    }
}

/// Atmospheric seeing: log-normal FWHM in arcseconds, clipped to a
/// physical range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeeingModel {
    pub median_arcsec: f64,
    /// Standard deviation of `ln(seeing)`.
    pub log_sigma: f64,
    pub min_arcsec: f64,
    pub max_arcsec: f64,
    pub knee_period_hours: f64,
    pub slope: f64,
}

impl Default for SeeingModel {
    fn default() -> Self {
        Self {
            median_arcsec: 1.1,
            log_sigma: 0.25,
            min_arcsec: 0.5,
            max_arcsec: 2.5,
            knee_period_hours: 2.0,
            slope: 2.0,
        }
    }
}

impl SeeingModel {
    pub fn spectrum(&self) -> SpectralShape {
        SpectralShape {
            knee_period_hours: self.knee_period_hours,
            slope: self.slope,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.median_arcsec > 0.0) || self.log_sigma < 0.0 {
            return Err(SurveyError::configuration(format!(
                "seeing model needs median_arcsec > 0 and log_sigma >= 0, got {} and {}",
                self.median_arcsec, self.log_sigma
            )));
        }
        if !(self.min_arcsec < self.max_arcsec) {
            return Err(SurveyError::configuration(format!(
                "seeing clip range [{}, {}] is empty",
                self.min_arcsec, self.max_arcsec
            )));
        }
        self.spectrum().validate("seeing")
    }

    /// Sample `n` seeing values spaced `dt_sec` seconds apart.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, dt_sec: f64, rng: &mut R) -> Vec<f32> {
        sample_gaussian_process(n, dt_sec, &self.spectrum(), rng)
            .into_iter()
            .map(|x| {
                (self.median_arcsec * (self.log_sigma * x).exp())
                    .clamp(self.min_arcsec, self.max_arcsec) as f32
            })
            .collect()
    }
}

/// Atmospheric transparency: logistic transform into [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransparencyModel {
    /// Logit of the median transparency.
    pub center: f64,
    /// Spread of the logit.
    pub scale: f64,
    pub knee_period_hours: f64,
    pub slope: f64,
}

impl Default for TransparencyModel {
    fn default() -> Self {
        Self {
            center: 2.5,
            scale: 1.2,
            knee_period_hours: 6.0,
            slope: 2.0,
        }
    }
}

impl TransparencyModel {
    pub fn spectrum(&self) -> SpectralShape {
        SpectralShape {
            knee_period_hours: self.knee_period_hours,
            slope: self.slope,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.center.is_finite() || !(self.scale >= 0.0) {
            return Err(SurveyError::configuration(format!(
                "transparency model needs finite center and scale >= 0, got {} and {}",
                self.center, self.scale
            )));
        }
        self.spectrum().validate("transparency")
    }

    /// Sample `n` transparency values spaced `dt_sec` seconds apart.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, dt_sec: f64, rng: &mut R) -> Vec<f32> {
        sample_gaussian_process(n, dt_sec, &self.spectrum(), rng)
            .into_iter()
            .map(|x| (1.0 / (1.0 + (-(self.center + self.scale * x)).exp())) as f32)
            .collect()
    }
}
