use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::lttb::downsample_columns;
use crate::{AntPol, Error, Result, TargetSize};

/// Channels in the full correlator band.
pub const NCHANS_FULL: usize = 8192;
/// Channels the correlator actually processes.
pub const NCHANS_PROCESSED: usize = NCHANS_FULL / 4 * 3;
/// Index of the first processed channel in the full band.
pub const FIRST_CHANNEL: usize = 1536;
/// Upper edge of the sampled band in Hz.
pub const BANDWIDTH_HZ: f64 = 250e6;

const JD_UNIX_EPOCH: f64 = 2_440_587.5;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Decode a little-endian float32 autocorrelation buffer.
pub fn decode_auto(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(Error::Decode(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Frequencies (Hz) of `nchans` output channels, each the mean of
/// `NCHANS_PROCESSED / nchans` consecutive processed channels.
pub fn frequency_axis(nchans: usize) -> Result<Vec<f64>> {
    if nchans == 0 || NCHANS_PROCESSED % nchans != 0 {
        return Err(Error::FrequencyAxis {
            nchans,
            total: NCHANS_PROCESSED,
        });
    }

    let step = BANDWIDTH_HZ / NCHANS_FULL as f64;
    let sum = NCHANS_PROCESSED / nchans;
    Ok((0..nchans)
        .map(|i| {
            let first = FIRST_CHANNEL + i * sum;
            (first..first + sum).map(|c| c as f64 * step).sum::<f64>() / sum as f64
        })
        .collect())
}

/// Parse eq coefficients stored as `"[1.0, 2.0, ...]"`. Missing or empty
/// coefficients default to unity gain.
pub fn parse_eq_coeffs(text: Option<&str>, nchans: usize) -> Result<Vec<f64>> {
    let Some(text) = text else {
        return Ok(vec![1.0; nchans]);
    };

    let inner = text.trim().trim_start_matches('[').trim_end_matches(']');
    let coeffs = inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| Error::Validation(format!("bad eq coefficient '{}'", s)))
        })
        .collect::<Result<Vec<f64>>>()?;

    if coeffs.is_empty() {
        return Ok(vec![1.0; nchans]);
    }
    Ok(coeffs)
}

pub fn jd_to_system_time(jd: f64) -> Result<SystemTime> {
    let secs = (jd - JD_UNIX_EPOCH) * SECONDS_PER_DAY;
    if !secs.is_finite() || secs < 0.0 {
        return Err(Error::Validation(format!("julian date {} predates the unix epoch", jd)));
    }
    Ok(UNIX_EPOCH + Duration::from_secs_f64(secs))
}

/// Power in dB. Values whose logarithm is not finite are masked.
pub fn log_power(values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|&v| {
            let db = 10.0 * v.log10();
            db.is_finite().then_some(db)
        })
        .collect()
}

pub fn fill_masked(values: &[Option<f64>], sentinel: f64) -> Vec<f64> {
    values.iter().map(|v| v.unwrap_or(sentinel)).collect()
}

/// One antpol's autocorrelation at one time, with its downsampled view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoSpectrum {
    pub antpol: AntPol,
    #[serde(with = "humantime_serde")]
    pub time: SystemTime,
    #[serde(with = "crate::float::vec")]
    pub frequencies: Vec<f64>,
    #[serde(with = "crate::float::vec")]
    pub spectra: Vec<f64>,
    #[serde(with = "crate::float::vec")]
    pub eq_coeffs: Vec<f64>,
    #[serde(with = "crate::float::vec")]
    pub frequencies_downsampled: Vec<f64>,
    #[serde(with = "crate::float::vec")]
    pub spectra_downsampled: Vec<f64>,
}

impl AutoSpectrum {
    pub fn new(
        antpol: AntPol,
        time: SystemTime,
        frequencies: Vec<f64>,
        spectra: Vec<f64>,
        eq_coeffs: Vec<f64>,
        target: TargetSize,
    ) -> Result<Self> {
        let m = target.resolve(spectra.len());
        let (frequencies_downsampled, spectra_downsampled) =
            downsample_columns(&frequencies, &spectra, m)?;

        let spectrum = AutoSpectrum {
            antpol,
            time,
            frequencies,
            spectra,
            eq_coeffs,
            frequencies_downsampled,
            spectra_downsampled,
        };
        spectrum.validate()?;
        Ok(spectrum)
    }

    pub fn validate(&self) -> Result<()> {
        if self.frequencies.len() != self.spectra.len() {
            return Err(Error::Validation(
                "Input frequencies and spectra must be the same length.".into(),
            ));
        }
        if self.frequencies_downsampled.len() != self.spectra_downsampled.len() {
            return Err(Error::Validation(
                "Input downsampled frequencies and spectra must be the same length.".into(),
            ));
        }
        Ok(())
    }
}

/// An undecoded autocorrelation as read from the correlator cache.
#[derive(Debug, Clone)]
pub struct RawAuto {
    pub antpol: AntPol,
    pub data: Vec<u8>,
    pub eq_coeffs: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub time: SystemTime,
    pub autos: Vec<RawAuto>,
}

/// Units of the stored spectra.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Scale {
    /// Correlator power as read.
    #[default]
    Linear,
    /// `10 log10` power, with invalid channels replaced by `sentinel` before
    /// downsampling.
    Decibel { sentinel: f64 },
}

impl Scale {
    pub fn apply(&self, values: Vec<f64>) -> Vec<f64> {
        match *self {
            Scale::Linear => values,
            Scale::Decibel { sentinel } => fill_masked(&log_power(&values), sentinel),
        }
    }
}

/// Decode and downsample every auto in a snapshot.
///
/// The frequency axis comes from the first auto whose length evenly divides
/// the processed band, and every other auto is truncated to its length. Autos
/// that fail to decode, or are shorter than the axis, are skipped with a
/// warning.
pub fn process_snapshot(
    snapshot: &Snapshot,
    target: TargetSize,
    scale: Scale,
) -> Result<Vec<AutoSpectrum>> {
    let Some(nchans) = snapshot.autos.iter().find_map(|raw| {
        let len = decode_auto(&raw.data).ok()?.len();
        if len > 0 && NCHANS_PROCESSED % len == 0 {
            Some(len)
        } else {
            debug!("{}: {} channels cannot define the frequency axis", raw.antpol, len);
            None
        }
    }) else {
        warn!("no auto in snapshot has a usable channel count");
        return Ok(Vec::new());
    };
    let freqs = frequency_axis(nchans)?;
    debug!("frequency axis has {} channels", nchans);

    let results: Vec<Option<Result<AutoSpectrum>>> = snapshot
        .autos
        .par_iter()
        .map(|raw| {
            let auto = match decode_auto(&raw.data) {
                Ok(auto) if auto.len() >= nchans => auto,
                Ok(auto) => {
                    warn!("skipping {}: {} channels, expected {}", raw.antpol, auto.len(), nchans);
                    return None;
                }
                Err(e) => {
                    warn!("skipping {}: {}", raw.antpol, e);
                    return None;
                }
            };
            let spectra = scale.apply(auto[..nchans].iter().map(|&v| v as f64).collect());
            let eq_coeffs = match parse_eq_coeffs(raw.eq_coeffs.as_deref(), nchans) {
                Ok(eq) => eq,
                Err(e) => {
                    warn!("{}: {}, using unity eq coefficients", raw.antpol, e);
                    vec![1.0; nchans]
                }
            };
            Some(AutoSpectrum::new(
                raw.antpol,
                snapshot.time,
                freqs.clone(),
                spectra,
                eq_coeffs,
                target,
            ))
        })
        .collect();

    let mut spectra = results.into_iter().flatten().collect::<Result<Vec<_>>>()?;
    spectra.sort_by_key(|s| s.antpol);
    Ok(spectra)
}
