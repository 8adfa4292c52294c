//! # Subordinate Station Adjustment
//!
//! Subordinate stations have no harmonic constants of their own. Their tides are
//! derived from a nearby reference station by shifting the reference high and
//! low waters in time and scaling reference heights.
//!
//! ## Height Multipliers
//!
//! The multiplier follows the phase of the reference tide:
//! - **Rising** (`rate > 0`): the high water multiplier
//! - **Falling** (`rate < 0`): the low water multiplier
//! - **Slack** (`|rate| < SLACK_THRESHOLD`): the mean of both, so the applied
//!   multiplier does not jump when the reference rate crosses zero
//!
//! Every function here is stateless and works only from the offset record and
//! the reference station's output.

use crate::error::TideError;
use crate::harmonics::validate_extrema;
use crate::{ExtremumType, TideExtremum};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Reference rate (height units per hour) below which the tide is slack.
pub const SLACK_THRESHOLD: f64 = 0.05;

/// Time and height offsets of a subordinate station relative to its reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubordinateOffset {
    /// Harmonic station the offsets apply to
    pub reference_station_id: String,
    /// Minutes added to reference high water times (may be negative)
    pub time_offset_high: i32,
    /// Minutes added to reference low water times (may be negative)
    pub time_offset_low: i32,
    /// Multiplier applied to reference heights while rising toward high water
    pub height_offset_high: f64,
    /// Multiplier applied to reference heights while falling toward low water
    pub height_offset_low: f64,
}

impl SubordinateOffset {
    /// Offset that leaves the reference prediction unchanged.
    pub fn identity(reference_station_id: impl Into<String>) -> Self {
        SubordinateOffset {
            reference_station_id: reference_station_id.into(),
            time_offset_high: 0,
            time_offset_low: 0,
            height_offset_high: 1.0,
            height_offset_low: 1.0,
        }
    }

    pub fn time_offset_for(&self, kind: ExtremumType) -> i32 {
        match kind {
            ExtremumType::High => self.time_offset_high,
            ExtremumType::Low => self.time_offset_low,
        }
    }

    pub fn height_offset_for(&self, kind: ExtremumType) -> f64 {
        match kind {
            ExtremumType::High => self.height_offset_high,
            ExtremumType::Low => self.height_offset_low,
        }
    }

    /// Largest absolute time shift of either extremum type.
    pub fn max_time_shift(&self) -> Duration {
        let minutes = self
            .time_offset_high
            .unsigned_abs()
            .max(self.time_offset_low.unsigned_abs());
        Duration::minutes(i64::from(minutes))
    }
}

/// Multiplier applied to the reference height given the reference rate.
pub fn height_multiplier(offset: &SubordinateOffset, reference_rate: f64) -> f64 {
    if reference_rate.abs() < SLACK_THRESHOLD {
        (offset.height_offset_high + offset.height_offset_low) / 2.0
    } else if reference_rate > 0.0 {
        offset.height_offset_high
    } else {
        offset.height_offset_low
    }
}

/// Subordinate height derived from the reference height and rate.
pub fn adjusted_height(offset: &SubordinateOffset, reference_height: f64, reference_rate: f64) -> f64 {
    reference_height * height_multiplier(offset, reference_rate)
}

/// Subordinate time of an extremum observed at `reference_time` on the reference station.
pub fn adjusted_extremum_time(
    offset: &SubordinateOffset,
    kind: ExtremumType,
    reference_time: DateTime<Utc>,
) -> DateTime<Utc> {
    reference_time + Duration::minutes(i64::from(offset.time_offset_for(kind)))
}

/// Map one reference extremum onto the subordinate station.
///
/// The rate is zero at an extremum, so the height uses the multiplier of the
/// extremum's own type rather than the slack mean.
pub fn adjusted_extremum(offset: &SubordinateOffset, reference: &TideExtremum) -> TideExtremum {
    TideExtremum {
        time: adjusted_extremum_time(offset, reference.kind, reference.time),
        height: reference.height * offset.height_offset_for(reference.kind),
        kind: reference.kind,
    }
}

/// Map reference extrema onto the subordinate station, keeping those inside `[start, end]`.
///
/// `reference` should cover the window widened by [`SubordinateOffset::max_time_shift`]
/// on both sides so that shifted events near the edges are not lost.
pub fn adjusted_extrema(
    offset: &SubordinateOffset,
    reference: &[TideExtremum],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<TideExtremum>, TideError> {
    let mut extrema: Vec<TideExtremum> = reference
        .iter()
        .map(|e| adjusted_extremum(offset, e))
        .filter(|e| e.time >= start && e.time <= end)
        .collect();
    extrema.sort_by_key(|e| e.time);
    validate_extrema(&extrema)?;
    Ok(extrema)
}
