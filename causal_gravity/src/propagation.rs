//! Expanding causal fronts
//!
//! Each mass mutation spawns one front: a circle expanding at a fixed rate
//! of 10 grid units per simulated second, independent of rendering. Every
//! frame a front stamps its version into all grid cells inside its current
//! radius; once it outgrows the world diagonal it has nothing left to tell
//! anyone and is pruned.

use glam::Vec2;

use crate::masses::MassKind;
use crate::versioning::VersionStore;

/// Propagation speed in grid units per simulated second
pub const PROPAGATION_RATE: f32 = 10.0;

/// An expanding circle carrying a version update outward from a mutation
#[derive(Debug, Clone, Copy)]
pub struct PropagationFront {
    pub origin: Vec2,
    pub start_time: f64,
    pub version: u64,
    pub kind: MassKind,
    pub mass_change: f32,
}

impl PropagationFront {
    pub fn new(
        origin: Vec2,
        start_time: f64,
        version: u64,
        kind: MassKind,
        mass_change: f32,
    ) -> Self {
        Self {
            origin,
            start_time,
            version,
            kind,
            mass_change,
        }
    }

    /// Current radius in world units
    pub fn radius(&self, now: f64, spacing: f32) -> f32 {
        (now - self.start_time).max(0.0) as f32 * PROPAGATION_RATE * spacing
    }

    /// A front past the world diagonal has reached every cell
    pub fn is_expired(&self, now: f64, spacing: f32, world: Vec2) -> bool {
        self.radius(now, spacing) > world.length()
    }
}

/// Expand all fronts, stamping the grid, then prune the expired ones.
///
/// Runs before any consumer reads the grid in the same frame, so a front
/// that reaches a cell this frame is already visible to objects updated
/// later in the frame.
pub fn advance_fronts(
    fronts: &mut Vec<PropagationFront>,
    store: &mut VersionStore,
    now: f64,
    world: Vec2,
) {
    for front in fronts.iter() {
        store.stamp_front(front.origin, front.radius(now, store.spacing), front.version);
    }

    fronts.retain(|f| !f.is_expired(now, store.spacing, world));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::CausalField;

    const WORLD: Vec2 = Vec2::new(800.0, 800.0);
    const SPACING: f32 = 32.0;

    #[test]
    fn radius_grows_at_the_fixed_rate() {
        let front = PropagationFront::new(Vec2::ZERO, 2.0, 1, MassKind::Normal, 1000.0);
        assert_eq!(front.radius(2.0, SPACING), 0.0);
        // 10 grid units/s * 32 units/grid = 320 world units per second
        assert!((front.radius(3.0, SPACING) - 320.0).abs() < 1e-3);
        assert_eq!(front.radius(1.0, SPACING), 0.0);
    }

    #[test]
    fn front_expires_past_the_world_diagonal() {
        let front = PropagationFront::new(Vec2::ZERO, 0.0, 1, MassKind::Normal, 1000.0);
        assert!(!front.is_expired(3.0, SPACING, WORLD));
        // Diagonal is ~1131 world units; at 320/s that is ~3.5s
        assert!(front.is_expired(4.0, SPACING, WORLD));
    }

    #[test]
    fn cells_learn_of_a_change_only_when_the_front_arrives() {
        let mut store = VersionStore::new(WORLD, SPACING);
        let origin = Vec2::new(400.0, 400.0);
        let mut fronts = vec![PropagationFront::new(origin, 0.0, 1, MassKind::Normal, 1000.0)];

        let probe = Vec2::new(400.0 + 160.0, 400.0); // 5 grid units away

        // Half a second: radius 160, probe cell center slightly beyond
        advance_fronts(&mut fronts, &mut store, 0.45, WORLD);
        assert_eq!(store.version_at(probe), 0);

        // The front needs distance/rate seconds to arrive
        advance_fronts(&mut fronts, &mut store, 0.6, WORLD);
        assert_eq!(store.version_at(probe), 1);
        assert_eq!(fronts.len(), 1);

        // Long after, the front is pruned but the stamp remains
        advance_fronts(&mut fronts, &mut store, 10.0, WORLD);
        assert!(fronts.is_empty());
        assert_eq!(store.version_at(probe), 1);
    }
}
