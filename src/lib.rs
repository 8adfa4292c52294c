//! # Tide Predictor Core Library
//!
//! Harmonic tide prediction for NOAA-style stations: heights at any instant,
//! rates of change, and the times and heights of high and low water.
//!
//! ## Design Philosophy
//!
//! ### Pure Computation
//! Every prediction is a pure function of the station data and the requested
//! instant. There is no hidden state, no clock access and no I/O in the
//! numeric core, so calls are reproducible bit for bit and safe to run from
//! any number of threads.
//!
//! ### Harmonic Method
//! A station's tide is its datum offset plus a sum of cosine constituents.
//! Each constituent runs at a fixed astronomical speed and is modulated by a
//! node factor and equilibrium argument derived from the orbits of the Sun and
//! Moon. See [`harmonics`] for the model and [`astronomy`] for the factors.
//!
//! ### Subordinate Stations
//! Stations without their own constants borrow a reference station's
//! prediction and apply time and height offsets ([`subordinate`]).
//!
//! ## Data Flow
//! 1. **Resolve**: a station id resolves to harmonic constants or to a
//!    subordinate offset plus its reference station ([`station`])
//! 2. **Synthesize**: the constants are evaluated over the requested window
//!    ([`harmonics::WindowSynthesizer`], refreshing the astronomical factors
//!    every day)
//! 3. **Adjust**: subordinate stations pass the result through their offsets
//!
//! [`predictor::TidePredictor`] runs all three steps.
//!
//! ## Core Types
//! - [`TideHeight`]: a height at one instant
//! - [`TideExtremum`]: a high or low water event
//! - [`TideSeries`]: samples and extrema for a window, ready for display

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Module declarations
pub mod astronomy;
pub mod config;
pub mod constituents;
pub mod error;
pub mod harmonics;
pub mod predictor;
pub mod station;
pub mod subordinate;

pub use error::TideError;

#[cfg(test)]
mod tests;

/// A predicted tide height at one instant.
///
/// Heights are in the station's native unit (feet for NOAA stations) measured
/// from the chart datum, so they may be slightly negative at extreme lows.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use tide_predictor_lib::TideHeight;
///
/// let sample = TideHeight {
///     time: Utc.with_ymd_and_hms(2026, 2, 12, 0, 0, 0).unwrap(),
///     height: 3.2,
/// };
/// assert_eq!(sample.height, 3.2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TideHeight {
    pub time: DateTime<Utc>,
    pub height: f64,
}

/// Kind of tide extremum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExtremumType {
    /// Local maximum: the tide stops rising and starts to fall
    High,
    /// Local minimum: the tide stops falling and starts to rise
    Low,
}

impl ExtremumType {
    pub fn label(self) -> &'static str {
        match self {
            ExtremumType::High => "HIGH",
            ExtremumType::Low => "LOW",
        }
    }
}

/// A high or low water event.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TideExtremum {
    pub time: DateTime<Utc>,
    pub height: f64,
    pub kind: ExtremumType,
}

/// Predicted tide curve and extrema for one station over a window.
///
/// # Subordinate Stations
/// When `subordinate = true` the values were derived from a reference station
/// through time and height offsets, which is less precise than a harmonic
/// prediction near the extrema.
///
/// # Example
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use tide_predictor_lib::{ExtremumType, TideExtremum, TideSeries};
///
/// let noon = Utc.with_ymd_and_hms(2026, 2, 12, 12, 0, 0).unwrap();
/// let series = TideSeries {
///     station_id: "8418150".to_string(),
///     samples: Vec::new(),
///     extrema: vec![
///         TideExtremum { time: noon, height: 9.8, kind: ExtremumType::High },
///         TideExtremum { time: noon + Duration::hours(6), height: 0.4, kind: ExtremumType::Low },
///     ],
///     subordinate: false,
/// };
///
/// let next = series.next_extremum(noon + Duration::hours(1)).unwrap();
/// assert_eq!(next.kind, ExtremumType::Low);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TideSeries {
    /// Station the prediction belongs to
    pub station_id: String,
    /// Evenly spaced heights across the window
    pub samples: Vec<TideHeight>,
    /// High and low waters within the window, alternating and in time order
    pub extrema: Vec<TideExtremum>,
    /// True if derived from a reference station via subordinate offsets
    pub subordinate: bool,
}

impl TideSeries {
    /// First extremum strictly after `instant`.
    pub fn next_extremum(&self, instant: DateTime<Utc>) -> Option<&TideExtremum> {
        self.extrema.iter().find(|e| e.time > instant)
    }

    /// Lowest and highest sampled heights, or `None` without samples.
    pub fn height_range(&self) -> Option<(f64, f64)> {
        self.samples.iter().fold(None, |range, s| match range {
            None => Some((s.height, s.height)),
            Some((lo, hi)) => Some((lo.min(s.height), hi.max(s.height))),
        })
    }
}
