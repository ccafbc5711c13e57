//! Pure gravitational physics helpers
//!
//! Point queries against a mass configuration: acceleration, potential,
//! event horizon radius, and gravitational redshift. All functions are
//! side-effect free; the causal machinery decides *which* mass
//! configuration they are applied to.

use glam::Vec2;

use crate::masses::{Mass, MassKind};

/// Gravitational constant (scaled for visualization)
pub const G: f32 = 100.0;

/// Speed of light in world units per second (scaled for visualization)
pub const C: f32 = 1000.0;

/// Softening length to prevent singularities at close distances
pub const SOFTENING: f32 = 4.0;

/// Redshift reported at or inside an event horizon
const HORIZON_REDSHIFT: f32 = 1.0e4;

/// Schwarzschild radius: rs = 2GM/c²
pub fn schwarzschild_radius(mass: f32) -> f32 {
    2.0 * G * mass / (C * C)
}

/// Gravitational redshift z = 1/sqrt(1 - rs/r) - 1 for an observer at
/// distance `r` from a mass, clamped to a large finite value at the horizon.
pub fn gravitational_redshift(mass: f32, r: f32) -> f32 {
    let rs = schwarzschild_radius(mass);
    if r <= rs {
        return HORIZON_REDSHIFT;
    }
    let factor = 1.0 - rs / r;
    (1.0 / factor.sqrt() - 1.0).min(HORIZON_REDSHIFT)
}

/// Newtonian acceleration at a point from a mass configuration, softened
pub fn acceleration_at(point: Vec2, masses: &[Mass]) -> Vec2 {
    let mut acceleration = Vec2::ZERO;

    for mass in masses {
        let r = mass.position - point;
        let dist_sq = r.length_squared() + SOFTENING * SOFTENING;
        let dist = dist_sq.sqrt();
        // a = G·M / r², directed toward the mass
        acceleration += (r / dist) * (G * mass.mass / dist_sq);
    }

    acceleration
}

/// Total gravitational potential φ = Σ G·M/r at a point (positive convention)
pub fn potential_at(point: Vec2, masses: &[Mass]) -> f32 {
    let mut potential = 0.0;

    for mass in masses {
        let dist = (mass.position - point)
            .length_squared()
            .max(SOFTENING * SOFTENING)
            .sqrt();
        potential += G * mass.mass / dist;
    }

    potential
}

/// Gravitational time dilation factor τ/t = sqrt(1 - 2φ/c²) at a point.
/// Returns a small positive floor inside an effective horizon.
pub fn time_dilation_at(point: Vec2, masses: &[Mass]) -> f32 {
    let potential = potential_at(point, masses);
    let factor = 1.0 - 2.0 * potential / (C * C);

    if factor > 0.0 {
        factor.sqrt()
    } else {
        0.001
    }
}

/// Find the nearest black hole in a configuration, with its distance
pub fn nearest_black_hole(point: Vec2, masses: &[Mass]) -> Option<(&Mass, f32)> {
    masses
        .iter()
        .filter(|m| m.kind == MassKind::BlackHole)
        .map(|m| (m, (m.position - point).length()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schwarzschild_radius_scales_linearly() {
        let r1 = schwarzschild_radius(50_000.0);
        let r2 = schwarzschild_radius(100_000.0);
        assert!((r2 - 2.0 * r1).abs() < 1e-3);
        assert!((schwarzschild_radius(100_000.0) - 20.0).abs() < 1e-3);
    }

    #[test]
    fn redshift_diverges_toward_horizon() {
        let mass = 100_000.0;
        let rs = schwarzschild_radius(mass);
        let far = gravitational_redshift(mass, rs * 100.0);
        let near = gravitational_redshift(mass, rs * 1.01);
        assert!(far < near);
        assert_eq!(gravitational_redshift(mass, rs * 0.5), 1.0e4);
    }

    #[test]
    fn acceleration_points_toward_mass() {
        let masses = vec![Mass::new(Vec2::new(100.0, 0.0), 1000.0, MassKind::Normal)];
        let a = acceleration_at(Vec2::ZERO, &masses);
        assert!(a.x > 0.0);
        assert!(a.y.abs() < 1e-6);
    }

    #[test]
    fn dilation_is_unity_in_empty_space() {
        assert!((time_dilation_at(Vec2::ZERO, &[]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn dilation_slows_near_mass() {
        let masses = vec![Mass::new(Vec2::ZERO, 100_000.0, MassKind::BlackHole)];
        let near = time_dilation_at(Vec2::new(30.0, 0.0), &masses);
        let far = time_dilation_at(Vec2::new(400.0, 0.0), &masses);
        assert!(near < far);
        assert!(far < 1.0);
    }
}
