//! # Prediction Errors
//!
//! Every failure the engine can report flows through [`TideError`]. The variants
//! fall into three groups:
//!
//! - **Data errors**: the station cannot be resolved to harmonic constants, or its
//!   constants name a constituent the catalog does not know.
//! - **Invariant violations**: a node factor outside physical bounds or an extrema
//!   sequence that does not alternate HIGH/LOW. These point at a catalog or input
//!   defect and are never clamped or patched up.
//! - **Caller errors**: reversed time windows, windows reaching past the
//!   representable date range, and search steps too coarse to separate
//!   neighbouring extrema.
//!
//! Degenerate input (zero-length windows, flat tides) is not an error; those
//! operations return empty results instead.
//!
//! All operations are deterministic, so none of these are worth retrying.

use chrono::{DateTime, Duration, Utc};
use std::io;
use thiserror::Error;

/// Errors raised while resolving stations or synthesizing predictions.
#[derive(Error, Debug)]
pub enum TideError {
    /// Station has neither harmonic constants nor a usable subordinate offset
    #[error("no prediction available for station {0}")]
    NoPrediction(String),

    /// Subordinate station pointing at another subordinate station
    #[error("subordinate station {station} references subordinate station {reference}")]
    ChainedSubordinate { station: String, reference: String },

    /// Harmonic constant for a constituent missing from the catalog
    #[error("unknown constituent {0}")]
    UnknownConstituent(String),

    /// Node factor outside the physically valid range
    #[error("node factor {factor} for {constituent} at {instant} is out of bounds")]
    NodeFactorOutOfBounds {
        constituent: &'static str,
        factor: f64,
        instant: DateTime<Utc>,
    },

    /// Extrema sequence out of order or with two consecutive highs/lows
    #[error("extrema do not alternate near {0}")]
    NonAlternatingExtrema(DateTime<Utc>),

    /// Window whose end precedes its start
    #[error("invalid time range: {start} is after {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Window around an instant that runs past the representable dates
    #[error("window of {window} around {center} is out of range")]
    WindowOutOfRange {
        center: DateTime<Utc>,
        window: Duration,
    },

    /// Sampling or search step that is zero, negative or too coarse
    #[error("invalid step of {0} minutes")]
    InvalidStep(i64),

    /// Bracketed extremum could not be refined
    #[error("root finding failed: {0}")]
    RootFinding(#[from] roots::SearchError),

    /// Station snapshot could not be read
    #[error("station data IO: {0}")]
    Io(#[from] io::Error),

    /// Station snapshot is not valid JSON for the expected schema
    #[error("station data format: {0}")]
    Json(#[from] serde_json::Error),
}
