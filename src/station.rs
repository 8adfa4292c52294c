//! # Station Resolution
//!
//! A station id resolves to exactly one of two shapes:
//!
//! - **Harmonic**: the station's own datum offset and harmonic constants
//! - **Subordinate**: an offset record plus the harmonic reference station it
//!   points at
//!
//! [`ResolvedStation`] makes that branch exhaustive for callers. Resolution is
//! the job of a [`StationRepository`]; [`StationCatalog`] is the in-memory
//! implementation used by the command line tool and tests, loaded from a JSON
//! snapshot of station records.
//!
//! ## Snapshot Format
//!
//! ```json
//! {
//!   "stations": [
//!     { "type": "harmonic",
//!       "info": { "id": "8418150", "name": "Portland", "latitude": 43.66, "longitude": -70.25 },
//!       "datum_offset": 5.0,
//!       "harmonics": [ { "name": "M2", "amplitude": 4.52, "phase": 102.7 } ] },
//!     { "type": "subordinate",
//!       "info": { "id": "8418606", "name": "Falmouth Foreside", "latitude": 43.73, "longitude": -70.20 },
//!       "offset": { "reference_station_id": "8418150", "time_offset_high": 4, "time_offset_low": 6,
//!                   "height_offset_high": 1.02, "height_offset_low": 1.0 } }
//!   ]
//! }
//! ```

use crate::error::TideError;
use crate::harmonics::{HarmonicConstant, StationHarmonics};
use crate::subordinate::SubordinateOffset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Descriptive fields shared by every station.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationInfo {
    /// NOAA station id, e.g. "8418150"
    pub id: String,
    pub name: String,
    /// Two-letter state or region code
    #[serde(default)]
    pub state: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Local standard time offset from UTC, used only for display
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Persisted description of one station.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StationRecord {
    Harmonic {
        info: StationInfo,
        /// Mean sea level above chart datum (`Z0`)
        datum_offset: f64,
        harmonics: StationHarmonics,
    },
    Subordinate {
        info: StationInfo,
        offset: SubordinateOffset,
    },
}

impl StationRecord {
    pub fn info(&self) -> &StationInfo {
        match self {
            StationRecord::Harmonic { info, .. } | StationRecord::Subordinate { info, .. } => info,
        }
    }

    pub fn id(&self) -> &str {
        &self.info().id
    }
}

/// Borrowed view of a station with its own harmonic constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HarmonicStation<'a> {
    pub info: &'a StationInfo,
    pub datum_offset: f64,
    pub harmonics: &'a [HarmonicConstant],
}

/// Outcome of resolving a station id.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResolvedStation<'a> {
    Harmonic(HarmonicStation<'a>),
    Subordinate {
        station: &'a StationInfo,
        offset: &'a SubordinateOffset,
        reference: HarmonicStation<'a>,
    },
}

impl<'a> ResolvedStation<'a> {
    /// The station that was asked for (not its reference).
    pub fn info(&self) -> &'a StationInfo {
        match self {
            ResolvedStation::Harmonic(station) => station.info,
            ResolvedStation::Subordinate { station, .. } => station,
        }
    }

    pub fn is_subordinate(&self) -> bool {
        matches!(self, ResolvedStation::Subordinate { .. })
    }
}

/// Source of station records.
pub trait StationRepository {
    /// Record for `id`, if known.
    fn station(&self, id: &str) -> Option<&StationRecord>;

    /// Subordinate stations whose offsets reference `reference_id`.
    fn subordinates_of(&self, reference_id: &str) -> Vec<&StationRecord>;

    /// Resolve `id` to harmonic constants, directly or through its reference.
    ///
    /// Unknown stations, harmonic stations without constants and subordinate
    /// stations whose reference is missing yield [`TideError::NoPrediction`];
    /// a subordinate pointing at another subordinate yields
    /// [`TideError::ChainedSubordinate`].
    fn resolve(&self, id: &str) -> Result<ResolvedStation<'_>, TideError> {
        match self.station(id) {
            None => Err(TideError::NoPrediction(id.to_string())),
            Some(record) => match record {
                StationRecord::Harmonic { .. } => harmonic_view(record)
                    .map(ResolvedStation::Harmonic)
                    .ok_or_else(|| TideError::NoPrediction(id.to_string())),
                StationRecord::Subordinate { info, offset } => {
                    let reference_id = &offset.reference_station_id;
                    let reference = match self.station(reference_id) {
                        None => return Err(TideError::NoPrediction(id.to_string())),
                        Some(StationRecord::Subordinate { .. }) => {
                            return Err(TideError::ChainedSubordinate {
                                station: id.to_string(),
                                reference: reference_id.clone(),
                            })
                        }
                        Some(reference) => harmonic_view(reference)
                            .ok_or_else(|| TideError::NoPrediction(id.to_string()))?,
                    };
                    Ok(ResolvedStation::Subordinate {
                        station: info,
                        offset,
                        reference,
                    })
                }
            },
        }
    }
}

fn harmonic_view(record: &StationRecord) -> Option<HarmonicStation<'_>> {
    match record {
        StationRecord::Harmonic {
            info,
            datum_offset,
            harmonics,
        } if !harmonics.is_empty() => Some(HarmonicStation {
            info,
            datum_offset: *datum_offset,
            harmonics,
        }),
        _ => None,
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    stations: Vec<StationRecord>,
}

/// In-memory station repository keyed by station id.
#[derive(Clone, Debug, Default)]
pub struct StationCatalog {
    stations: BTreeMap<String, StationRecord>,
}

impl StationCatalog {
    /// Build a catalog; a later record replaces an earlier one with the same id.
    pub fn new(records: impl IntoIterator<Item = StationRecord>) -> Self {
        let mut stations = BTreeMap::new();
        for record in records {
            let id = record.id().to_string();
            if stations.insert(id.clone(), record).is_some() {
                warn!(station = %id, "duplicate station record, keeping the last one");
            }
        }
        StationCatalog { stations }
    }

    /// Parse a JSON snapshot.
    pub fn from_json(json: &str) -> Result<Self, TideError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Ok(Self::new(snapshot.stations))
    }

    /// Load a JSON snapshot from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TideError> {
        let contents = fs::read_to_string(&path)?;
        let catalog = Self::from_json(&contents)?;
        info!(
            path = %path.as_ref().display(),
            stations = catalog.len(),
            "loaded station snapshot"
        );
        Ok(catalog)
    }

    /// Serialize the catalog back into the snapshot format.
    #[cfg(test)]
    pub(crate) fn to_json(&self) -> Result<String, TideError> {
        let snapshot = Snapshot {
            stations: self.stations.values().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// All records ordered by station id.
    pub fn records(&self) -> impl Iterator<Item = &StationRecord> {
        self.stations.values()
    }
}

impl StationRepository for StationCatalog {
    fn station(&self, id: &str) -> Option<&StationRecord> {
        self.stations.get(id)
    }

    fn subordinates_of(&self, reference_id: &str) -> Vec<&StationRecord> {
        self.stations
            .values()
            .filter(|record| match record {
                StationRecord::Subordinate { offset, .. } => {
                    offset.reference_station_id == reference_id
                }
                StationRecord::Harmonic { .. } => false,
            })
            .collect()
    }
}
