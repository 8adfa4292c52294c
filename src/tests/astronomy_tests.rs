//! # Astronomical Property Tests
//!
//! Properties of node factors and equilibrium arguments that must hold at
//! every instant, checked on a grid spanning more than one 18.6-year nodal
//! cycle.

use crate::astronomy::{equilibrium_argument, node_factor, orbital_elements};
use crate::constituents::{self, lookup};
use chrono::{DateTime, Duration, TimeZone, Utc};

/// Instants every 47 days and 5 hours from 2010 through 2030.
fn nodal_cycle_grid() -> Vec<DateTime<Utc>> {
    let start = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let step = Duration::days(47) + Duration::hours(5);
    let mut grid = Vec::new();
    let mut t = start;
    while t < end {
        grid.push(t);
        t += step;
    }
    grid
}

fn wrapped_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs();
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Solar constituents carry no lunar modulation at any point of the cycle.
#[test]
fn solar_node_factors_are_always_one() {
    let solar: Vec<_> = constituents::all()
        .iter()
        .filter(|c| c.is_solar())
        .collect();
    assert!(solar.len() >= 9, "expected the full solar family, got {}", solar.len());

    for t in nodal_cycle_grid() {
        for c in &solar {
            assert_eq!(
                node_factor(c, t),
                1.0,
                "{} node factor must be exactly 1.0 at {}",
                c.name,
                t
            );
        }
    }
}

/// Equilibrium arguments stay inside [0, 360) for every constituent.
#[test]
fn equilibrium_arguments_stay_normalized() {
    for t in nodal_cycle_grid() {
        for c in constituents::all() {
            let v = equilibrium_argument(c, t);
            assert!(
                (0.0..360.0).contains(&v),
                "{} argument {} outside [0, 360) at {}",
                c.name,
                v,
                t
            );
        }
    }
}

/// f(M4) = f(M2)² across the whole cycle, not only near f = 1.
#[test]
fn compound_node_factor_law_holds_over_cycle() {
    for t in nodal_cycle_grid() {
        let m2 = node_factor(&constituents::M2, t);
        let m4 = node_factor(&constituents::M4, t);
        assert!(
            (m4 - m2 * m2).abs() < 1e-3,
            "f(M4) = {} but f(M2)² = {} at {}",
            m4,
            m2 * m2,
            t
        );
    }
}

/// The semidiurnal lunar family never leaves [0.95, 1.05].
#[test]
fn semidiurnal_node_factors_stay_in_range() {
    for t in nodal_cycle_grid() {
        for name in ["M2", "N2", "2N2", "NU2", "MU2", "LAM2"] {
            let f = node_factor(lookup(name).unwrap(), t);
            assert!(
                (0.95..=1.05).contains(&f),
                "{} node factor {} out of range at {}",
                name,
                f,
                t
            );
        }
    }
}

/// Every node factor stays positive and below the synthesizer's bound.
#[test]
fn node_factors_are_physical_over_cycle() {
    for t in nodal_cycle_grid() {
        for c in constituents::all() {
            let f = node_factor(c, t);
            assert!(
                f.is_finite() && f > 0.0 && f < crate::harmonics::MAX_NODE_FACTOR,
                "{} node factor {} not physical at {}",
                c.name,
                f,
                t
            );
        }
    }
}

/// The lunar node regresses through 360° in about 18.6 years.
#[test]
fn lunar_node_regresses() {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let a = orbital_elements(start).lunar_node;
    let b = orbital_elements(start + Duration::days(365)).lunar_node;
    // About 19.3° per year, westward
    let regression = (a - b).rem_euclid(360.0);
    assert!(
        (18.5..20.0).contains(&regression),
        "node moved {} degrees in a year",
        regression
    );
}

/// M2 has no jump across any new year between 2020 and 2035.
#[test]
fn m2_argument_continuous_across_new_years() {
    for year in 2020..=2035 {
        let boundary = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap();
        let before = equilibrium_argument(&constituents::M2, boundary - Duration::minutes(5));
        let after = equilibrium_argument(&constituents::M2, boundary + Duration::minutes(5));
        assert!(
            wrapped_difference(before, after) < 30.0,
            "M2 argument jumped from {} to {} at {}",
            before,
            after,
            boundary
        );
    }
}

/// Leap days and the days around them behave like any other day.
#[test]
fn leap_day_is_continuous() {
    for year in [2024, 2028] {
        let leap = Utc.with_ymd_and_hms(year, 2, 29, 0, 0, 0).unwrap();
        for c in [&constituents::M2, &constituents::K1, &constituents::O1] {
            let before = equilibrium_argument(c, leap - Duration::minutes(5));
            let after = equilibrium_argument(c, leap + Duration::minutes(5));
            let expected = c.speed * 10.0 / 60.0;
            assert!(
                (wrapped_difference(before, after) - expected).abs() < 0.01,
                "{} advanced unexpectedly across {}",
                c.name,
                leap
            );
        }
    }
}
