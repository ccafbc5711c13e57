//! Mass list and the click-mutation protocol
//!
//! Masses live on a snapped grid. Left clicks create or grow a mass,
//! right clicks shrink or remove it. Every net change is reported back to
//! the caller so it can be versioned and propagated causally.

use glam::Vec2;

/// Mass placed when a normal mass is first created
pub const BASE_MASS: f32 = 1000.0;

/// Increment/decrement applied to a normal mass per click
pub const MASS_STEP: f32 = 1000.0;

/// Mass placed when a black hole is first created
pub const BLACK_HOLE_MASS: f32 = 100_000.0;

/// A black hole whose halved mass drops below this is removed
pub const BLACK_HOLE_MIN_MASS: f32 = 50_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MassKind {
    Normal,
    BlackHole,
    Planet,
}

/// A gravitating mass at a grid-snapped position
#[derive(Debug, Clone, Copy)]
pub struct Mass {
    pub position: Vec2,
    pub mass: f32,
    pub kind: MassKind,
}

impl Mass {
    pub fn new(position: Vec2, mass: f32, kind: MassKind) -> Self {
        Self {
            position,
            mass,
            kind,
        }
    }
}

/// Net result of a mutation, used to version and propagate the change
#[derive(Debug, Clone, Copy)]
pub struct MassChange {
    pub kind: MassKind,
    pub position: Vec2,
    pub amount: f32,
}

/// Snap world coordinates to the nearest grid point
pub fn snap_to_grid(p: Vec2, spacing: f32) -> Vec2 {
    Vec2::new(
        (p.x / spacing).round() * spacing,
        (p.y / spacing).round() * spacing,
    )
}

/// Find an existing mass within half a grid cell of `p` (box test, both axes)
pub fn find_mass_at(masses: &[Mass], p: Vec2, spacing: f32) -> Option<usize> {
    let half = spacing / 2.0;
    masses
        .iter()
        .position(|m| (m.position.x - p.x).abs() <= half && (m.position.y - p.y).abs() <= half)
}

/// Apply a click at `p`. Returns the net change, or None if nothing changed
/// (cell occupied by a different kind, or removal clicked on empty space).
pub fn apply_click(
    masses: &mut Vec<Mass>,
    kind: MassKind,
    p: Vec2,
    spacing: f32,
    remove: bool,
) -> Option<MassChange> {
    let position = snap_to_grid(p, spacing);
    let found = find_mass_at(masses, position, spacing);

    if remove {
        let index = found?;
        let existing = &mut masses[index];
        let position = existing.position;
        let kind = existing.kind;

        let amount = match kind {
            MassKind::Normal | MassKind::Planet => {
                existing.mass -= MASS_STEP;
                if existing.mass <= 0.0 {
                    masses.remove(index);
                }
                -MASS_STEP
            }
            MassKind::BlackHole => {
                let halved = existing.mass / 2.0;
                let amount = halved - existing.mass;
                existing.mass = halved;
                if halved < BLACK_HOLE_MIN_MASS {
                    masses.remove(index);
                }
                amount
            }
        };

        return Some(MassChange {
            kind,
            position,
            amount,
        });
    }

    match found {
        Some(index) => {
            let existing = &mut masses[index];
            if existing.kind != kind {
                // Cell already occupied by a different kind of object
                return None;
            }
            let amount = match kind {
                MassKind::Normal | MassKind::Planet => {
                    existing.mass += MASS_STEP;
                    MASS_STEP
                }
                MassKind::BlackHole => {
                    let amount = existing.mass;
                    existing.mass *= 2.0;
                    amount
                }
            };
            Some(MassChange {
                kind,
                position: existing.position,
                amount,
            })
        }
        None => {
            let mass = match kind {
                MassKind::Normal | MassKind::Planet => BASE_MASS,
                MassKind::BlackHole => BLACK_HOLE_MASS,
            };
            masses.push(Mass::new(position, mass, kind));
            Some(MassChange {
                kind,
                position,
                amount: mass,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPACING: f32 = 32.0;

    #[test]
    fn snapping_rounds_to_nearest_grid_point() {
        let p = snap_to_grid(Vec2::new(100.0, 100.0), SPACING);
        assert_eq!(p, Vec2::new(96.0, 96.0));
        let q = snap_to_grid(Vec2::new(113.0, 47.0), SPACING);
        assert_eq!(q, Vec2::new(112.0, 32.0));
    }

    #[test]
    fn two_clicks_accumulate_one_mass() {
        let mut masses = Vec::new();
        let c1 = apply_click(&mut masses, MassKind::Normal, Vec2::new(100.0, 100.0), SPACING, false);
        let c2 = apply_click(&mut masses, MassKind::Normal, Vec2::new(100.0, 100.0), SPACING, false);

        assert!(c1.is_some());
        assert!(c2.is_some());
        assert_eq!(masses.len(), 1);
        assert_eq!(masses[0].mass, 2000.0);
        assert_eq!(masses[0].position, snap_to_grid(Vec2::new(100.0, 100.0), SPACING));
    }

    #[test]
    fn normal_mass_removed_at_zero() {
        let mut masses = Vec::new();
        apply_click(&mut masses, MassKind::Normal, Vec2::new(64.0, 64.0), SPACING, false);
        let change = apply_click(&mut masses, MassKind::Normal, Vec2::new(64.0, 64.0), SPACING, true);

        assert_eq!(change.unwrap().amount, -MASS_STEP);
        assert!(masses.is_empty());
    }

    #[test]
    fn black_hole_survives_first_halving_then_evaporates() {
        let mut masses = Vec::new();
        apply_click(&mut masses, MassKind::BlackHole, Vec2::new(64.0, 64.0), SPACING, false);
        assert_eq!(masses[0].mass, 100_000.0);

        // 100000 -> 50000: not below the threshold, stays
        apply_click(&mut masses, MassKind::BlackHole, Vec2::new(64.0, 64.0), SPACING, true);
        assert_eq!(masses.len(), 1);
        assert_eq!(masses[0].mass, 50_000.0);

        // 50000 -> 25000: below the threshold, removed
        apply_click(&mut masses, MassKind::BlackHole, Vec2::new(64.0, 64.0), SPACING, true);
        assert!(masses.is_empty());
    }

    #[test]
    fn removal_click_on_empty_space_is_a_no_op() {
        let mut masses = Vec::new();
        let change = apply_click(&mut masses, MassKind::Normal, Vec2::new(64.0, 64.0), SPACING, true);
        assert!(change.is_none());
    }

    #[test]
    fn occupied_cell_of_other_kind_rejects_growth() {
        let mut masses = Vec::new();
        apply_click(&mut masses, MassKind::Normal, Vec2::new(64.0, 64.0), SPACING, false);
        let change = apply_click(&mut masses, MassKind::BlackHole, Vec2::new(64.0, 64.0), SPACING, false);
        assert!(change.is_none());
        assert_eq!(masses.len(), 1);
    }
}
