/// Distance below which a pair is treated as coincident and no force is applied.
pub const MIN_SEPARATION: f64 = 0.01;
/// Lennard-Jones pairs closer than this are skipped to avoid the singularity.
pub const LJ_MIN_DISTANCE: f64 = 0.1;

/// Short-range repulsion magnitude.
///
/// The force law is quadratic in the overlap, `(min_dist - dist)^2 * strength`,
/// not inverse-square: it stays bounded as atoms approach, which keeps the
/// explicit integrator stable at the fixed per-frame step.
#[inline]
pub fn quadratic_repulsion(dist: f64, min_dist: f64, strength: f64) -> f64 {
    if dist <= MIN_SEPARATION || dist >= min_dist {
        return 0.0;
    }
    let overlap = min_dist - dist;
    overlap * overlap * strength
}

/// Lennard-Jones 12-6 force magnitude; positive is repulsive.
///
/// `F = 24 eps / r * (2 (sigma/r)^12 - (sigma/r)^6)`
#[inline]
pub fn lennard_jones_force(dist: f64, sigma: f64, epsilon: f64) -> f64 {
    if dist < LJ_MIN_DISTANCE {
        return 0.0;
    }
    let sr6 = (sigma / dist).powi(6);
    let sr12 = sr6 * sr6;
    24.0 * epsilon / dist * (2.0 * sr12 - sr6)
}

/// Hookean spring magnitude; positive pulls the endpoints together.
#[inline]
pub fn hooke(length: f64, rest_length: f64, spring_constant: f64) -> f64 {
    (length - rest_length) * spring_constant
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn repulsion_is_zero_at_min_distance() {
        assert_eq!(quadratic_repulsion(2.0, 2.0, 5.0), 0.0);
        assert_eq!(quadratic_repulsion(3.0, 2.0, 5.0), 0.0);
    }

    #[test]
    fn repulsion_grows_monotonically_as_separation_shrinks() {
        let min_dist = 2.0;
        let mut previous = quadratic_repulsion(min_dist - 1e-3, min_dist, 1.0);
        assert!(previous > 0.0);
        for step in 1..50 {
            let dist = min_dist - 1e-3 - step as f64 * 0.03;
            let current = quadratic_repulsion(dist, min_dist, 1.0);
            assert!(current > previous);
            previous = current;
        }
    }

    #[test]
    fn repulsion_follows_quadratic_law() {
        assert!(f64_approx_equal(quadratic_repulsion(1.5, 2.0, 4.0), 1.0));
        assert!(f64_approx_equal(quadratic_repulsion(1.0, 2.0, 4.0), 4.0));
    }

    #[test]
    fn repulsion_skips_coincident_atoms() {
        assert_eq!(quadratic_repulsion(0.005, 2.0, 4.0), 0.0);
    }

    #[test]
    fn lennard_jones_force_vanishes_at_potential_minimum() {
        let sigma = 3.0;
        let r_min = 2.0f64.powf(1.0 / 6.0) * sigma;
        assert!(lennard_jones_force(r_min, sigma, 0.5).abs() < 1e-9);
    }

    #[test]
    fn lennard_jones_force_is_repulsive_inside_and_attractive_outside() {
        assert!(lennard_jones_force(2.5, 3.0, 0.5) > 0.0);
        assert!(lennard_jones_force(4.0, 3.0, 0.5) < 0.0);
    }

    #[test]
    fn lennard_jones_force_skips_singular_distances() {
        assert_eq!(lennard_jones_force(0.05, 3.0, 0.5), 0.0);
    }

    #[test]
    fn hooke_sign_follows_extension() {
        assert!(f64_approx_equal(hooke(2.0, 1.5, 0.2), 0.1));
        assert!(f64_approx_equal(hooke(1.0, 1.5, 0.2), -0.1));
    }
}
