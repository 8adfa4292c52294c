//! # Tidal Constituent Catalog
//!
//! The 37 constituents used by NOAA CO-OPS harmonic predictions, defined once as
//! `'static` values and shared by every station.
//!
//! ## Kinds
//!
//! - **Base** constituents carry Doodson multipliers of the astronomical arguments
//!   `(T, s, h, p, p1)`, a phase offset, and the Schureman formula that supplies
//!   their node factor `f` and nodal phase `u`.
//! - **Compound** constituents (shallow-water overtides and combinations such as
//!   M4 = 2·M2 or MK3 = M2 + K1) reference their base parts directly. Their node
//!   factor is the product of the parts' factors and their equilibrium argument is
//!   the signed sum of the parts' arguments.
//!
//! Parts are plain references to other statics, so a compound can never name a
//! constituent that does not exist.
//!
//! ## Speeds
//!
//! Speeds are the published values in degrees per mean solar hour. They are kept
//! to seven decimals: a speed error of 1e-5°/h already drifts by more than a
//! degree of phase across a nodal cycle.

/// Schureman formula selecting how `f` and `u` follow the lunar node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodalFormula {
    /// Purely solar: `f = 1`, `u = 0`
    Unity,
    Mm,
    Mf,
    O1,
    J1,
    OO1,
    M2,
    M3,
    K1,
    K2,
    L2,
    M1,
}

/// Doodson multipliers and phase offset of a base constituent's argument `V`.
///
/// `V = t·T + s·s + h·h + p·p + p1·p1 + offset`, all angles in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Doodson {
    pub t: i8,
    pub s: i8,
    pub h: i8,
    pub p: i8,
    pub p1: i8,
    pub offset: f64,
}

/// How a constituent's astronomical factors are derived.
#[derive(Clone, Copy, Debug)]
pub enum ConstituentKind {
    Base {
        doodson: Doodson,
        nodal: NodalFormula,
    },
    /// Signed combination of other constituents, e.g. `[(&M2, 2)]` for M4
    Compound(&'static [(&'static Constituent, i8)]),
}

/// A single named tidal constituent.
#[derive(Debug)]
pub struct Constituent {
    /// Conventional name, e.g. "M2"
    pub name: &'static str,
    /// Angular speed in degrees per mean solar hour
    pub speed: f64,
    pub kind: ConstituentKind,
}

impl Constituent {
    /// True when the constituent has no lunar modulation at all.
    pub fn is_solar(&self) -> bool {
        match self.kind {
            ConstituentKind::Base { nodal, .. } => nodal == NodalFormula::Unity,
            ConstituentKind::Compound(parts) => parts.iter().all(|(part, _)| part.is_solar()),
        }
    }

    /// True for shallow-water and combination constituents.
    pub fn is_compound(&self) -> bool {
        matches!(self.kind, ConstituentKind::Compound(_))
    }

    /// Speed implied by the compound's parts, or the catalog speed for a base.
    #[cfg(test)]
    pub(crate) fn derived_speed(&self) -> f64 {
        match self.kind {
            ConstituentKind::Base { .. } => self.speed,
            ConstituentKind::Compound(parts) => parts
                .iter()
                .map(|(part, k)| f64::from(*k) * part.derived_speed())
                .sum(),
        }
    }
}

const fn base(
    name: &'static str,
    speed: f64,
    [t, s, h, p, p1]: [i8; 5],
    offset: f64,
    nodal: NodalFormula,
) -> Constituent {
    Constituent {
        name,
        speed,
        kind: ConstituentKind::Base {
            doodson: Doodson {
                t,
                s,
                h,
                p,
                p1,
                offset,
            },
            nodal,
        },
    }
}

use NodalFormula as F;

// Semidiurnal
pub static M2: Constituent = base("M2", 28.984_104_2, [2, -2, 2, 0, 0], 0.0, F::M2);
pub static S2: Constituent = base("S2", 30.0, [2, 0, 0, 0, 0], 0.0, F::Unity);
pub static N2: Constituent = base("N2", 28.439_729_5, [2, -3, 2, 1, 0], 0.0, F::M2);
pub static NU2: Constituent = base("NU2", 28.512_583_1, [2, -3, 4, -1, 0], 0.0, F::M2);
pub static MU2: Constituent = base("MU2", 27.968_208_4, [2, -4, 4, 0, 0], 0.0, F::M2);
pub static N2_2: Constituent = base("2N2", 27.895_354_8, [2, -4, 2, 2, 0], 0.0, F::M2);
pub static LAM2: Constituent = base("LAM2", 29.455_625_3, [2, -1, 0, 1, 0], 180.0, F::M2);
pub static T2: Constituent = base("T2", 29.958_933_3, [2, 0, -1, 0, 1], 0.0, F::Unity);
pub static R2: Constituent = base("R2", 30.041_066_7, [2, 0, 1, 0, -1], 180.0, F::Unity);
pub static L2: Constituent = base("L2", 29.528_478_9, [2, -1, 2, -1, 0], 180.0, F::L2);
pub static K2: Constituent = base("K2", 30.082_137_3, [2, 0, 2, 0, 0], 0.0, F::K2);

// Diurnal
pub static K1: Constituent = base("K1", 15.041_068_6, [1, 0, 1, 0, 0], -90.0, F::K1);
pub static O1: Constituent = base("O1", 13.943_035_6, [1, -2, 1, 0, 0], 90.0, F::O1);
pub static OO1: Constituent = base("OO1", 16.139_101_7, [1, 2, 1, 0, 0], -90.0, F::OO1);
pub static S1: Constituent = base("S1", 15.0, [1, 0, 0, 0, 0], 0.0, F::Unity);
pub static M1: Constituent = base("M1", 14.496_693_9, [1, -1, 1, 0, 0], -90.0, F::M1);
pub static J1: Constituent = base("J1", 15.585_443_3, [1, 1, 1, -1, 0], -90.0, F::J1);
pub static RHO: Constituent = base("RHO", 13.471_514_5, [1, -3, 3, -1, 0], 90.0, F::O1);
pub static Q1: Constituent = base("Q1", 13.398_660_9, [1, -3, 1, 1, 0], 90.0, F::O1);
pub static Q1_2: Constituent = base("2Q1", 12.854_286_2, [1, -4, 1, 2, 0], 90.0, F::O1);
pub static P1: Constituent = base("P1", 14.958_931_4, [1, 0, -1, 0, 0], 90.0, F::Unity);

// Terdiurnal
pub static M3: Constituent = base("M3", 43.476_156_3, [3, -3, 3, 0, 0], 0.0, F::M3);

// Long period
pub static MM: Constituent = base("MM", 0.544_374_7, [0, 1, 0, -1, 0], 0.0, F::Mm);
pub static SSA: Constituent = base("SSA", 0.082_137_3, [0, 0, 2, 0, 0], 0.0, F::Unity);
pub static SA: Constituent = base("SA", 0.041_068_6, [0, 0, 1, 0, 0], 0.0, F::Unity);
pub static MF: Constituent = base("MF", 1.098_033_1, [0, 2, 0, 0, 0], 0.0, F::Mf);

// Compound
type Part = (&'static Constituent, i8);

const fn compound(name: &'static str, speed: f64, parts: &'static [Part]) -> Constituent {
    Constituent {
        name,
        speed,
        kind: ConstituentKind::Compound(parts),
    }
}

static M4_PARTS: [Part; 1] = [(&M2, 2)];
static M6_PARTS: [Part; 1] = [(&M2, 3)];
static M8_PARTS: [Part; 1] = [(&M2, 4)];
static S4_PARTS: [Part; 1] = [(&S2, 2)];
static S6_PARTS: [Part; 1] = [(&S2, 3)];
static MK3_PARTS: [Part; 2] = [(&M2, 1), (&K1, 1)];
static MK3_2_PARTS: [Part; 2] = [(&M2, 2), (&K1, -1)];
static MN4_PARTS: [Part; 2] = [(&M2, 1), (&N2, 1)];
static MS4_PARTS: [Part; 2] = [(&M2, 1), (&S2, 1)];
static MSF_PARTS: [Part; 2] = [(&S2, 1), (&M2, -1)];
static SM2_2_PARTS: [Part; 2] = [(&S2, 2), (&M2, -1)];

pub static M4: Constituent = compound("M4", 57.968_208_4, &M4_PARTS);
pub static M6: Constituent = compound("M6", 86.952_312_7, &M6_PARTS);
pub static M8: Constituent = compound("M8", 115.936_416_6, &M8_PARTS);
pub static S4: Constituent = compound("S4", 60.0, &S4_PARTS);
pub static S6: Constituent = compound("S6", 90.0, &S6_PARTS);
pub static MK3: Constituent = compound("MK3", 44.025_172_9, &MK3_PARTS);
pub static MK3_2: Constituent = compound("2MK3", 42.927_139_8, &MK3_2_PARTS);
pub static MN4: Constituent = compound("MN4", 57.423_833_7, &MN4_PARTS);
pub static MS4: Constituent = compound("MS4", 58.984_104_2, &MS4_PARTS);
pub static MSF: Constituent = compound("MSF", 1.015_895_8, &MSF_PARTS);
pub static SM2_2: Constituent = compound("2SM2", 31.015_895_8, &SM2_2_PARTS);

/// Every constituent in NOAA's harmonic constant order.
///
/// This order is also the summation order of the synthesizer.
pub static CATALOG: [&Constituent; 37] = [
    &M2, &S2, &N2, &K1, &M4, &O1, &M6, &MK3, &S4, &MN4, &NU2, &S6, &MU2, &N2_2, &OO1, &LAM2,
    &S1, &M1, &J1, &MM, &SSA, &SA, &MSF, &MF, &RHO, &Q1, &T2, &R2, &Q1_2, &P1, &SM2_2, &M3, &L2,
    &MK3_2, &K2, &M8, &MS4,
];

/// All constituents in stable catalog order.
pub fn all() -> &'static [&'static Constituent] {
    &CATALOG
}

/// Find a constituent by name, ignoring ASCII case ("Mm" and "MM" both match).
pub fn lookup(name: &str) -> Option<&'static Constituent> {
    position(name).map(|index| CATALOG[index])
}

/// Index of a constituent within [`CATALOG`].
pub fn position(name: &str) -> Option<usize> {
    let name = name.trim();
    CATALOG
        .iter()
        .position(|c| c.name.eq_ignore_ascii_case(name))
}
