//! # Station Predictions
//!
//! [`TidePredictor`] runs the full prediction path for a resolved station:
//! harmonic stations go straight through the synthesizer, subordinate
//! stations synthesize their reference station and pass the result through
//! their offsets. Window operations use a
//! [`WindowSynthesizer`](crate::harmonics::WindowSynthesizer), so the
//! astronomical factors are refreshed for every day of the window.

use crate::error::TideError;
use crate::harmonics::{
    self, check_range, sample_times, Synthesizer, WindowSynthesizer, DEFAULT_SEARCH_STEP_MINUTES,
};
use crate::station::{HarmonicStation, ResolvedStation};
use crate::subordinate::{adjusted_extrema, adjusted_height, height_multiplier, SubordinateOffset};
use crate::{TideExtremum, TideHeight, TideSeries};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Grid spacing used by a [`TidePredictor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PredictionSettings {
    /// Spacing of rate samples when searching for extrema
    pub search_step: Duration,
    /// Spacing of height samples in a [`TideSeries`]
    pub sample_interval: Duration,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        PredictionSettings {
            search_step: Duration::minutes(DEFAULT_SEARCH_STEP_MINUTES),
            sample_interval: Duration::minutes(10),
        }
    }
}

/// Predicts heights and extrema for harmonic and subordinate stations.
#[derive(Clone, Debug, Default)]
pub struct TidePredictor {
    settings: PredictionSettings,
}

impl TidePredictor {
    pub fn new(settings: PredictionSettings) -> Self {
        TidePredictor { settings }
    }

    pub fn settings(&self) -> &PredictionSettings {
        &self.settings
    }

    /// Height at `instant`.
    pub fn height_at(
        &self,
        station: &ResolvedStation<'_>,
        instant: DateTime<Utc>,
    ) -> Result<f64, TideError> {
        match station {
            ResolvedStation::Harmonic(s) => harmonics::height(s.harmonics, s.datum_offset, instant),
            ResolvedStation::Subordinate {
                offset, reference, ..
            } => {
                let synth = synthesizer(reference, instant)?;
                Ok(adjusted_height(offset, synth.height(instant), synth.rate(instant)))
            }
        }
    }

    /// Rate of height change at `instant`, in height units per hour.
    ///
    /// For subordinate stations this is the reference rate scaled by the
    /// multiplier in effect at that instant.
    pub fn rate_at(
        &self,
        station: &ResolvedStation<'_>,
        instant: DateTime<Utc>,
    ) -> Result<f64, TideError> {
        match station {
            ResolvedStation::Harmonic(s) => harmonics::rate(s.harmonics, s.datum_offset, instant),
            ResolvedStation::Subordinate {
                offset, reference, ..
            } => {
                let rate = synthesizer(reference, instant)?.rate(instant);
                Ok(rate * height_multiplier(offset, rate))
            }
        }
    }

    /// High and low waters within `[start, end]`.
    pub fn extrema(
        &self,
        station: &ResolvedStation<'_>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TideExtremum>, TideError> {
        check_range(start, end)?;
        if start == end {
            return Ok(Vec::new());
        }
        match station {
            ResolvedStation::Harmonic(s) => {
                window_curve(s, start, end)?.extrema(self.settings.search_step)
            }
            ResolvedStation::Subordinate {
                offset, reference, ..
            } => {
                let curve = reference_curve(offset, reference, start, end)?;
                self.subordinate_extrema(offset, &curve, start, end)
            }
        }
    }

    /// Samples and extrema for `[start, end]`.
    pub fn series(
        &self,
        station: &ResolvedStation<'_>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<TideSeries, TideError> {
        let times = sample_times(start, end, self.settings.sample_interval)?;
        let (samples, extrema): (Vec<TideHeight>, _) = match station {
            ResolvedStation::Harmonic(s) => {
                let curve = window_curve(s, start, end)?;
                let samples = times
                    .into_iter()
                    .map(|time| TideHeight {
                        time,
                        height: curve.height(time),
                    })
                    .collect();
                let extrema = if start == end {
                    Vec::new()
                } else {
                    curve.extrema(self.settings.search_step)?
                };
                (samples, extrema)
            }
            ResolvedStation::Subordinate {
                offset, reference, ..
            } => {
                let curve = reference_curve(offset, reference, start, end)?;
                let samples = times
                    .into_iter()
                    .map(|time| TideHeight {
                        time,
                        height: adjusted_height(offset, curve.height(time), curve.rate(time)),
                    })
                    .collect();
                let extrema = if start == end {
                    Vec::new()
                } else {
                    self.subordinate_extrema(offset, &curve, start, end)?
                };
                (samples, extrema)
            }
        };

        debug!(
            station = %station.info().id,
            subordinate = station.is_subordinate(),
            samples = samples.len(),
            extrema = extrema.len(),
            "predicted tide series"
        );

        Ok(TideSeries {
            station_id: station.info().id.clone(),
            samples,
            extrema,
            subordinate: station.is_subordinate(),
        })
    }

    /// Series covering `window` on either side of `center`.
    ///
    /// Fails with [`TideError::WindowOutOfRange`] when either edge falls
    /// outside the representable dates.
    pub fn series_around(
        &self,
        station: &ResolvedStation<'_>,
        center: DateTime<Utc>,
        window: Duration,
    ) -> Result<TideSeries, TideError> {
        let (start, end) = widen(center, center, window)?;
        self.series(station, start, end)
    }

    fn subordinate_extrema(
        &self,
        offset: &SubordinateOffset,
        curve: &WindowSynthesizer,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TideExtremum>, TideError> {
        let reference_extrema = curve.extrema(self.settings.search_step)?;
        adjusted_extrema(offset, &reference_extrema, start, end)
    }
}

fn synthesizer(station: &HarmonicStation<'_>, anchor: DateTime<Utc>) -> Result<Synthesizer, TideError> {
    Synthesizer::new(station.harmonics, station.datum_offset, anchor)
}

fn window_curve(
    station: &HarmonicStation<'_>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<WindowSynthesizer, TideError> {
    WindowSynthesizer::new(station.harmonics, station.datum_offset, start, end)
}

/// Reference curve over `[start, end]` widened by the largest time offset, so
/// events shifted into the window from outside are found.
fn reference_curve(
    offset: &SubordinateOffset,
    reference: &HarmonicStation<'_>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<WindowSynthesizer, TideError> {
    check_range(start, end)?;
    let shift = offset.max_time_shift();
    let (search_start, search_end) = widen(start, end, shift)?;
    debug!(
        reference = %reference.info.id,
        shift_minutes = shift.num_minutes(),
        "synthesizing reference station"
    );
    window_curve(reference, search_start, search_end)
}

fn widen(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    by: Duration,
) -> Result<(DateTime<Utc>, DateTime<Utc>), TideError> {
    start
        .checked_sub_signed(by)
        .zip(end.checked_add_signed(by))
        .ok_or(TideError::WindowOutOfRange {
            center: start,
            window: by,
        })
}
