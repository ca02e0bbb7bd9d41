//! Fallback estimators for element data that the properties table may omit.
//!
//! Every consumer of an optional advanced field routes through these so the
//! simulation always has a usable value, however coarse.

const PERIOD_BOUNDARIES: [u32; 7] = [2, 10, 18, 36, 54, 86, 118];

/// Periodic-table row for an atomic number (1-based).
pub fn period_of(atomic_number: u32) -> u32 {
    PERIOD_BOUNDARIES
        .iter()
        .position(|&last| atomic_number <= last)
        .map(|i| i as u32 + 1)
        .unwrap_or(7)
}

/// Rough covalent radius in picometers.
pub fn covalent_radius_pm(atomic_number: u32) -> f64 {
    if atomic_number <= 2 {
        return 30.0;
    }
    30.0 + 35.0 * (period_of(atomic_number) - 1) as f64
}

/// Rough van der Waals radius in picometers, derived from the covalent estimate.
pub fn vanderwaals_radius_pm(atomic_number: u32, covalent_pm: Option<f64>) -> f64 {
    covalent_pm.unwrap_or_else(|| covalent_radius_pm(atomic_number)) + 80.0
}

/// Rough static polarizability in cubic angstroms.
pub fn polarizability_angstrom3(atomic_number: u32, covalent_pm: Option<f64>) -> f64 {
    let r = covalent_pm.unwrap_or_else(|| covalent_radius_pm(atomic_number)) / 100.0;
    4.0 * r.powi(3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_of_matches_table_rows() {
        assert_eq!(period_of(1), 1);
        assert_eq!(period_of(2), 1);
        assert_eq!(period_of(6), 2);
        assert_eq!(period_of(11), 3);
        assert_eq!(period_of(26), 4);
        assert_eq!(period_of(79), 6);
        assert_eq!(period_of(200), 7);
    }

    #[test]
    fn covalent_estimate_grows_with_period() {
        assert!(covalent_radius_pm(1) < covalent_radius_pm(6));
        assert!(covalent_radius_pm(6) < covalent_radius_pm(14));
        assert!(covalent_radius_pm(14) < covalent_radius_pm(26));
    }

    #[test]
    fn vdw_estimate_uses_known_covalent_radius() {
        assert_eq!(vanderwaals_radius_pm(6, Some(76.0)), 156.0);
        assert_eq!(vanderwaals_radius_pm(6, None), covalent_radius_pm(6) + 80.0);
    }

    #[test]
    fn polarizability_estimate_is_positive() {
        assert!(polarizability_angstrom3(1, None) > 0.0);
        assert!(polarizability_angstrom3(26, Some(132.0)) > polarizability_angstrom3(6, Some(76.0)));
    }
}
