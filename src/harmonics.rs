//! # Harmonic Synthesis
//!
//! Turns a station's harmonic constants into tide heights, rates of change and
//! high/low water events.
//!
//! ## Model
//!
//! ```text
//! height(t) = Z0 + Σ f·H·cos(speed·Δt + (V + u) − κ)
//! rate(t)   =    − Σ f·H·ω·sin(speed·Δt + (V + u) − κ)
//! ```
//!
//! `f` and `V + u` come from [`crate::astronomy`] and are frozen at an anchor
//! instant; `Δt` is measured in hours from that anchor and `ω` is the speed in
//! radians per hour. Within one anchor the rate is the exact derivative of the
//! height. A [`WindowSynthesizer`] re-anchors every [`ANCHOR_SPAN_HOURS`], so
//! windows of any length stay within a fraction of a millimetre and a second
//! of a per-instant evaluation.
//!
//! ## Extrema
//!
//! The rate is sampled on a coarse grid (10 minutes by default, never coarser
//! than 15). Each sign change brackets one extremum, which is refined with
//! Brent's method. A change from rising to falling is a HIGH, falling to rising
//! a LOW. The resulting sequence must alternate; if it does not the constants
//! are defective and the search fails instead of returning a bogus schedule.

use crate::astronomy::{hours_since_epoch, orbital_elements};
use crate::constituents::{self, Constituent};
use crate::error::TideError;
use crate::{ExtremumType, TideExtremum, TideHeight};
use chrono::{DateTime, Duration, Utc};
use roots::{find_root_brent, SimpleConvergency};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Upper bound on any node factor; the strongest modulation in the catalog
/// (M1) peaks near 2.25.
pub const MAX_NODE_FACTOR: f64 = 2.5;

/// Default spacing of rate samples during extremum search.
pub const DEFAULT_SEARCH_STEP_MINUTES: i64 = 10;

/// Coarsest spacing that still separates neighbouring extrema of the fastest
/// constituents.
pub const MAX_SEARCH_STEP_MINUTES: i64 = 15;

/// Length of the span one anchor covers in a [`WindowSynthesizer`].
pub const ANCHOR_SPAN_HOURS: i64 = 24;

/// Tolerance of the root refinement, in hours (well under one second).
const ROOT_TOLERANCE_HOURS: f64 = 1e-5;

/// One (constituent, amplitude, phase lag) triple of a harmonic station.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HarmonicConstant {
    /// Constituent name as listed in the catalog, e.g. `"M2"`
    pub name: String,
    /// Amplitude `H` in the station's height unit
    pub amplitude: f64,
    /// Phase lag `κ` in degrees (Greenwich epoch)
    pub phase: f64,
}

impl HarmonicConstant {
    pub fn new(name: impl Into<String>, amplitude: f64, phase: f64) -> Self {
        HarmonicConstant {
            name: name.into(),
            amplitude,
            phase,
        }
    }
}

/// Harmonic constants of one station, as supplied by the station repository.
pub type StationHarmonics = Vec<HarmonicConstant>;

#[derive(Clone, Copy, Debug)]
struct Term {
    constituent: &'static Constituent,
    /// `f·H`
    amplitude: f64,
    /// `(V + u) − κ` at the anchor, degrees
    phase: f64,
    /// Speed in radians per hour
    omega: f64,
}

impl Term {
    fn angle(&self, hours: f64) -> f64 {
        (self.constituent.speed * hours + self.phase).to_radians()
    }
}

/// Tide curve of one station with astronomical factors frozen at an anchor.
#[derive(Clone, Debug)]
pub struct Synthesizer {
    datum_offset: f64,
    anchor: DateTime<Utc>,
    anchor_hours: f64,
    terms: Vec<Term>,
}

impl Synthesizer {
    /// Build the curve for `harmonics` above `datum_offset`, anchored at `anchor`.
    ///
    /// Fails with [`TideError::UnknownConstituent`] when a constant names a
    /// constituent outside the catalog, and with
    /// [`TideError::NodeFactorOutOfBounds`] when the astronomical factors at
    /// the anchor are not physical.
    pub fn new(
        harmonics: &[HarmonicConstant],
        datum_offset: f64,
        anchor: DateTime<Utc>,
    ) -> Result<Self, TideError> {
        let elements = orbital_elements(anchor);

        let mut resolved = harmonics
            .iter()
            .map(|constant| {
                constituents::position(&constant.name)
                    .map(|index| (index, constant))
                    .ok_or_else(|| TideError::UnknownConstituent(constant.name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        // Fixed summation order keeps rounding identical whatever the input order
        resolved.sort_by_key(|(index, _)| *index);

        let mut terms = Vec::with_capacity(resolved.len());
        for (index, constant) in resolved {
            let constituent = constituents::all()[index];
            let factors = elements.factors(constituent);
            let f = factors.node_factor;
            if !f.is_finite() || f <= 0.0 || f > MAX_NODE_FACTOR {
                return Err(TideError::NodeFactorOutOfBounds {
                    constituent: constituent.name,
                    factor: f,
                    instant: anchor,
                });
            }
            terms.push(Term {
                constituent,
                amplitude: f * constant.amplitude,
                phase: factors.equilibrium_argument - constant.phase,
                omega: constituent.speed.to_radians(),
            });
        }

        Ok(Synthesizer {
            datum_offset,
            anchor,
            anchor_hours: hours_since_epoch(anchor),
            terms,
        })
    }

    /// Height above datum at `instant`.
    pub fn height(&self, instant: DateTime<Utc>) -> f64 {
        self.height_at_hours(self.offset_hours(instant))
    }

    /// Rate of change of height at `instant`, in height units per hour.
    pub fn rate(&self, instant: DateTime<Utc>) -> f64 {
        self.rate_at_hours(self.offset_hours(instant))
    }

    /// HIGH and LOW waters within `[start, end]`, in time order.
    pub fn extrema(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: Duration,
    ) -> Result<Vec<TideExtremum>, TideError> {
        check_range(start, end)?;
        if step <= Duration::zero() || step > Duration::minutes(MAX_SEARCH_STEP_MINUTES) {
            return Err(TideError::InvalidStep(step.num_minutes()));
        }
        if start == end || self.terms.is_empty() {
            return Ok(Vec::new());
        }

        let step_hours = step.num_milliseconds() as f64 / 3.6e6;
        let last = self.offset_hours(end);
        let mut x0 = self.offset_hours(start);
        let mut r0 = self.rate_at_hours(x0);
        let mut stationary_start = r0 == 0.0;
        let mut x = x0;
        let mut found = Vec::new();

        while x < last {
            let x1 = (x + step_hours).min(last);
            let r1 = self.rate_at_hours(x1);
            x = x1;
            // A grid point exactly on zero could be an extremum or a touch;
            // the next sample decides
            if r1 == 0.0 && x1 < last {
                continue;
            }

            if stationary_start {
                // Zero rate at `start`: the window opens on the extremum itself
                stationary_start = false;
                let kind = if r1 < 0.0 {
                    Some(ExtremumType::High)
                } else if r1 > 0.0 {
                    Some(ExtremumType::Low)
                } else {
                    None
                };
                if let Some(kind) = kind {
                    found.push(self.extremum_at(x0, kind));
                }
                x0 = x1;
                r0 = r1;
                continue;
            }

            let kind = if r0 > 0.0 && r1 <= 0.0 {
                Some(ExtremumType::High)
            } else if r0 < 0.0 && r1 >= 0.0 {
                Some(ExtremumType::Low)
            } else {
                None
            };

            if let Some(kind) = kind {
                let root = if r1 == 0.0 {
                    x1
                } else {
                    let mut convergency = SimpleConvergency {
                        eps: ROOT_TOLERANCE_HOURS,
                        max_iter: 100,
                    };
                    let rate = |hours: f64| self.rate_at_hours(hours);
                    find_root_brent(x0, x1, &rate, &mut convergency)?
                };
                found.push(self.extremum_at(root, kind));
            }

            x0 = x1;
            r0 = r1;
        }

        trace!(count = found.len(), %start, %end, "located extrema");
        validate_extrema(&found)?;
        Ok(found)
    }

    /// Heights from `start` every `interval`, up to and including `end`.
    pub fn series(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: Duration,
    ) -> Result<Vec<TideHeight>, TideError> {
        sample_times(start, end, interval).map(|times| {
            times
                .into_iter()
                .map(|time| TideHeight {
                    time,
                    height: self.height(time),
                })
                .collect()
        })
    }

    fn offset_hours(&self, instant: DateTime<Utc>) -> f64 {
        hours_since_epoch(instant) - self.anchor_hours
    }

    fn instant_at(&self, hours: f64) -> DateTime<Utc> {
        self.anchor + Duration::milliseconds((hours * 3.6e6).round() as i64)
    }

    fn extremum_at(&self, hours: f64, kind: ExtremumType) -> TideExtremum {
        TideExtremum {
            time: self.instant_at(hours),
            height: self.height_at_hours(hours),
            kind,
        }
    }

    fn height_at_hours(&self, hours: f64) -> f64 {
        self.terms.iter().fold(self.datum_offset, |sum, term| {
            sum + term.amplitude * term.angle(hours).cos()
        })
    }

    fn rate_at_hours(&self, hours: f64) -> f64 {
        self.terms.iter().fold(0.0, |sum, term| {
            sum - term.amplitude * term.omega * term.angle(hours).sin()
        })
    }
}

/// Tide curve over `[start, end]` built from one [`Synthesizer`] per
/// [`ANCHOR_SPAN_HOURS`] of the window.
///
/// Every instant is evaluated with the factors of the anchor that opens its
/// span, so the node factor and `V + u` are never more than a day old.
#[derive(Clone, Debug)]
pub struct WindowSynthesizer {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    spans: Vec<Synthesizer>,
}

impl WindowSynthesizer {
    pub fn new(
        harmonics: &[HarmonicConstant],
        datum_offset: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, TideError> {
        check_range(start, end)?;
        let span = Duration::hours(ANCHOR_SPAN_HOURS);
        let mut spans = vec![Synthesizer::new(harmonics, datum_offset, start)?];
        let mut anchor = start;
        while let Some(next) = anchor.checked_add_signed(span).filter(|next| *next < end) {
            spans.push(Synthesizer::new(harmonics, datum_offset, next)?);
            anchor = next;
        }
        trace!(spans = spans.len(), %start, %end, "anchored window");
        Ok(WindowSynthesizer { start, end, spans })
    }

    /// Height above datum at `instant`.
    pub fn height(&self, instant: DateTime<Utc>) -> f64 {
        self.span_for(instant).height(instant)
    }

    /// Rate of change of height at `instant`, in height units per hour.
    pub fn rate(&self, instant: DateTime<Utc>) -> f64 {
        self.span_for(instant).rate(instant)
    }

    /// HIGH and LOW waters over the whole window, in time order.
    pub fn extrema(&self, step: Duration) -> Result<Vec<TideExtremum>, TideError> {
        let mut found: Vec<TideExtremum> = Vec::new();
        for (index, synth) in self.spans.iter().enumerate() {
            let span_end = self.spans.get(index + 1).map_or(self.end, |next| next.anchor);
            for extremum in synth.extrema(synth.anchor, span_end, step)? {
                // An extremum on a shared boundary is seen from both sides
                if let Some(previous) = found.last() {
                    if previous.kind == extremum.kind && extremum.time - previous.time <= step {
                        continue;
                    }
                }
                found.push(extremum);
            }
        }
        validate_extrema(&found)?;
        Ok(found)
    }

    /// Heights from the window start every `interval`, up to and including its end.
    pub fn series(&self, interval: Duration) -> Result<Vec<TideHeight>, TideError> {
        sample_times(self.start, self.end, interval).map(|times| {
            times
                .into_iter()
                .map(|time| TideHeight {
                    time,
                    height: self.height(time),
                })
                .collect()
        })
    }

    fn span_for(&self, instant: DateTime<Utc>) -> &Synthesizer {
        let elapsed = (instant - self.start).num_hours().max(0) / ANCHOR_SPAN_HOURS;
        let last = self.spans.len() - 1;
        &self.spans[usize::try_from(elapsed).map_or(last, |index| index.min(last))]
    }
}

/// Height at `instant` using the astronomical factors of that instant.
pub fn height(
    harmonics: &[HarmonicConstant],
    datum_offset: f64,
    instant: DateTime<Utc>,
) -> Result<f64, TideError> {
    Ok(Synthesizer::new(harmonics, datum_offset, instant)?.height(instant))
}

/// Rate of height change at `instant`, in height units per hour.
pub fn rate(
    harmonics: &[HarmonicConstant],
    datum_offset: f64,
    instant: DateTime<Utc>,
) -> Result<f64, TideError> {
    Ok(Synthesizer::new(harmonics, datum_offset, instant)?.rate(instant))
}

/// HIGH and LOW waters within `[start, end]` using the default search step.
pub fn extrema(
    harmonics: &[HarmonicConstant],
    datum_offset: f64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<TideExtremum>, TideError> {
    WindowSynthesizer::new(harmonics, datum_offset, start, end)?
        .extrema(Duration::minutes(DEFAULT_SEARCH_STEP_MINUTES))
}

/// Check that extrema are strictly time ordered and alternate HIGH/LOW.
pub fn validate_extrema(extrema: &[TideExtremum]) -> Result<(), TideError> {
    for pair in extrema.windows(2) {
        if pair[1].time <= pair[0].time || pair[1].kind == pair[0].kind {
            return Err(TideError::NonAlternatingExtrema(pair[1].time));
        }
    }
    Ok(())
}

pub(crate) fn check_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), TideError> {
    if end < start {
        Err(TideError::InvalidRange { start, end })
    } else {
        Ok(())
    }
}

/// Grid of instants from `start` every `interval` up to and including `end`.
pub(crate) fn sample_times(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval: Duration,
) -> Result<Vec<DateTime<Utc>>, TideError> {
    check_range(start, end)?;
    if interval <= Duration::zero() {
        return Err(TideError::InvalidStep(interval.num_minutes()));
    }
    let mut times = Vec::new();
    let mut time = start;
    while time <= end {
        times.push(time);
        match time.checked_add_signed(interval) {
            Some(next) => time = next,
            None => break,
        }
    }
    Ok(times)
}
