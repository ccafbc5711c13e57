//! Versioned mass history and the per-cell causal grid
//!
//! Every mutation of the mass field creates a new universe version: a deep
//! copy of the mass list tagged with a monotonically increasing counter.
//! A 2D grid records, per cell, the newest version known to have causally
//! reached that cell. Consumers resolve the mass configuration for their
//! position through the grid, so a change is invisible at a point until a
//! propagation front has physically arrived there.

use glam::Vec2;

use crate::masses::{Mass, MassKind};

/// Default cap on retained history entries
pub const MAX_VERSIONS: usize = 50;

/// One immutable snapshot of the mass configuration
#[derive(Debug, Clone)]
pub struct MassSnapshot {
    pub version: u64,
    pub kind: MassKind,
    pub origin: Vec2,
    pub mass_change: f32,
    pub masses: Vec<Mass>,
    pub timestamp: f64,
}

/// Resolves causally-visible mass configurations for spatial positions.
///
/// This is the single interface every moving-object system consumes; it
/// keeps the grid lookup, the history lookup, and their composition in one
/// place instead of scattering grid math across consumers.
pub trait CausalField {
    /// Grid cell containing a world position
    fn grid_index(&self, pos: Vec2) -> (i32, i32);

    /// Version recorded for the cell containing `pos` (0 = no causal record)
    fn version_at(&self, pos: Vec2) -> u64;

    /// Mass configuration as of `version`: the newest history entry with
    /// `entry.version <= version`, falling back to a copy of the live list
    /// when no entry qualifies.
    fn masses_at(&self, version: u64, live: &[Mass]) -> Vec<Mass>;

    /// The configuration causally visible at `pos`
    fn causal_masses(&self, pos: Vec2, live: &[Mass]) -> Vec<Mass> {
        self.masses_at(self.version_at(pos), live)
    }
}

/// Owns the version counter, the bounded snapshot history, and the grid
pub struct VersionStore {
    counter: u64,
    pub history: Vec<MassSnapshot>,
    grid: Vec<u64>,
    cols: usize,
    rows: usize,
    pub spacing: f32,
    pub max_versions: usize,
}

impl VersionStore {
    pub fn new(world: Vec2, spacing: f32) -> Self {
        Self::with_max_versions(world, spacing, MAX_VERSIONS)
    }

    pub fn with_max_versions(world: Vec2, spacing: f32, max_versions: usize) -> Self {
        let cols = (world.x / spacing).ceil() as usize;
        let rows = (world.y / spacing).ceil() as usize;

        Self {
            counter: 0,
            history: Vec::new(),
            grid: vec![0; cols * rows],
            cols,
            rows,
            spacing,
            max_versions,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The most recently issued version number
    pub fn latest_version(&self) -> u64 {
        self.counter
    }

    fn cell(&self, gx: i32, gy: i32) -> Option<usize> {
        if gx < 0 || gy < 0 || gx as usize >= self.cols || gy as usize >= self.rows {
            return None;
        }
        Some(gx as usize * self.rows + gy as usize)
    }

    /// Version recorded for a cell by index (0 when out of bounds)
    pub fn cell_version(&self, gx: i32, gy: i32) -> u64 {
        self.cell(gx, gy).map(|i| self.grid[i]).unwrap_or(0)
    }

    /// World position of a cell's center
    pub fn cell_center(&self, gx: usize, gy: usize) -> Vec2 {
        Vec2::new(
            (gx as f32 + 0.5) * self.spacing,
            (gy as f32 + 0.5) * self.spacing,
        )
    }

    /// Record a new universe version for a mass mutation.
    ///
    /// Appends a deep copy of the mass list to the history; when the history
    /// outgrows `max_versions` the oldest half is evicted and every grid cell
    /// still holding an evicted version is re-pointed to the oldest surviving
    /// one. Cells at 0 keep their no-causal-record sentinel.
    pub fn create_version(
        &mut self,
        kind: MassKind,
        origin: Vec2,
        mass_change: f32,
        masses: &[Mass],
        timestamp: f64,
    ) -> u64 {
        self.counter += 1;
        let version = self.counter;

        self.history.push(MassSnapshot {
            version,
            kind,
            origin,
            mass_change,
            masses: masses.to_vec(),
            timestamp,
        });

        if self.history.len() > self.max_versions {
            let mut evicted = 0;
            while self.history.len() > self.max_versions / 2 {
                self.history.remove(0);
                evicted += 1;
            }

            let oldest = self.history.first().map(|s| s.version).unwrap_or(0);
            for cell in &mut self.grid {
                if *cell != 0 && *cell < oldest {
                    *cell = oldest;
                }
            }

            log::debug!(
                "evicted {} snapshots, grid re-pointed to version {}",
                evicted,
                oldest
            );
        }

        version
    }

    /// Stamp the cell containing `pos` with `version`; out of bounds is a no-op
    pub fn stamp(&mut self, pos: Vec2, version: u64) {
        let (gx, gy) = self.grid_index(pos);
        if let Some(i) = self.cell(gx, gy) {
            self.grid[i] = version;
        }
    }

    /// Stamp every cell whose center lies within `radius` of `center`.
    ///
    /// O(cols·rows) per call; called once per active front per frame, which
    /// is fine at this grid resolution.
    pub fn stamp_front(&mut self, center: Vec2, radius: f32, version: u64) {
        for gx in 0..self.cols {
            for gy in 0..self.rows {
                let cell_center = self.cell_center(gx, gy);
                if (cell_center - center).length() <= radius {
                    self.grid[gx * self.rows + gy] = version;
                }
            }
        }
    }
}

impl CausalField for VersionStore {
    fn grid_index(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.spacing).floor() as i32,
            (pos.y / self.spacing).floor() as i32,
        )
    }

    fn version_at(&self, pos: Vec2) -> u64 {
        let (gx, gy) = self.grid_index(pos);
        self.cell_version(gx, gy)
    }

    fn masses_at(&self, version: u64, live: &[Mass]) -> Vec<Mass> {
        for snapshot in self.history.iter().rev() {
            if snapshot.version <= version {
                return snapshot.masses.clone();
            }
        }
        live.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD: Vec2 = Vec2::new(800.0, 800.0);
    const SPACING: f32 = 32.0;

    fn mass_at(x: f32, mass: f32) -> Mass {
        Mass::new(Vec2::new(x, 0.0), mass, MassKind::Normal)
    }

    fn store() -> VersionStore {
        VersionStore::new(WORLD, SPACING)
    }

    #[test]
    fn grid_dimensions_cover_the_world() {
        let s = store();
        assert_eq!(s.cols(), 25);
        assert_eq!(s.rows(), 25);
    }

    #[test]
    fn versions_are_strictly_increasing_and_history_stays_sorted() {
        let mut s = store();
        for i in 0..20 {
            s.create_version(MassKind::Normal, Vec2::ZERO, 1000.0, &[mass_at(i as f32, 1000.0)], 0.0);
        }
        for pair in s.history.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }
    }

    #[test]
    fn history_length_never_exceeds_the_cap() {
        let mut s = VersionStore::with_max_versions(WORLD, SPACING, 10);
        for i in 0..100 {
            s.create_version(MassKind::Normal, Vec2::ZERO, 1000.0, &[mass_at(i as f32, 1000.0)], 0.0);
            assert!(s.history.len() <= 10);
        }
        // Eviction keeps the newest half
        assert!(s.history.last().unwrap().version == s.latest_version());
    }

    #[test]
    fn eviction_repoints_stale_grid_cells() {
        let mut s = VersionStore::with_max_versions(WORLD, SPACING, 10);

        // Stamp cells with every version as it is created
        for i in 0..40 {
            let v = s.create_version(
                MassKind::Normal,
                Vec2::ZERO,
                1000.0,
                &[mass_at(i as f32, 1000.0)],
                0.0,
            );
            let pos = Vec2::new((i % 25) as f32 * SPACING + 1.0, (i / 25) as f32 * SPACING + 1.0);
            s.stamp(pos, v);
        }

        let surviving: Vec<u64> = s.history.iter().map(|h| h.version).collect();
        for gx in 0..s.cols() as i32 {
            for gy in 0..s.rows() as i32 {
                let v = s.cell_version(gx, gy);
                assert!(
                    v == 0 || surviving.contains(&v),
                    "cell ({gx},{gy}) references evicted version {v}"
                );
            }
        }
    }

    #[test]
    fn masses_at_is_a_floor_lookup() {
        let mut s = store();
        // Issue versions 1, 2 then record only snapshots we care about: make
        // history hold versions 3 and 10 by spending the counter.
        s.create_version(MassKind::Normal, Vec2::ZERO, 0.0, &[], 0.0);
        s.create_version(MassKind::Normal, Vec2::ZERO, 0.0, &[], 0.0);
        s.history.clear();
        let v3 = s.create_version(MassKind::Normal, Vec2::ZERO, 0.0, &[mass_at(3.0, 300.0)], 0.0);
        for _ in 0..6 {
            s.counter += 1;
        }
        let v10 = s.create_version(MassKind::Normal, Vec2::ZERO, 0.0, &[mass_at(10.0, 1000.0)], 0.0);
        assert_eq!((v3, v10), (3, 10));

        let live = vec![mass_at(99.0, 9900.0)];

        // Version 7 resolves to version 3's snapshot, not version 10's
        let resolved = s.masses_at(7, &live);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].mass, 300.0);

        // Version 10 and later resolve to version 10's snapshot
        assert_eq!(s.masses_at(10, &live)[0].mass, 1000.0);
        assert_eq!(s.masses_at(42, &live)[0].mass, 1000.0);

        // Below the oldest entry: fall back to the live configuration
        assert_eq!(s.masses_at(2, &live)[0].mass, 9900.0);
        assert_eq!(s.masses_at(0, &live)[0].mass, 9900.0);
    }

    #[test]
    fn stamp_ignores_out_of_bounds_positions() {
        let mut s = store();
        s.stamp(Vec2::new(-100.0, 50.0), 7);
        s.stamp(Vec2::new(5000.0, 50.0), 7);
        for gx in 0..s.cols() as i32 {
            for gy in 0..s.rows() as i32 {
                assert_eq!(s.cell_version(gx, gy), 0);
            }
        }
    }

    #[test]
    fn front_stamps_only_cells_inside_its_radius() {
        let mut s = store();
        let center = Vec2::new(400.0, 400.0);
        s.stamp_front(center, 100.0, 5);

        for gx in 0..s.cols() {
            for gy in 0..s.rows() {
                let dist = (s.cell_center(gx, gy) - center).length();
                let v = s.cell_version(gx as i32, gy as i32);
                if dist <= 100.0 {
                    assert_eq!(v, 5, "cell inside radius not stamped");
                } else {
                    assert_eq!(v, 0, "cell outside radius stamped");
                }
            }
        }
    }

    #[test]
    fn causal_masses_sees_old_configuration_until_stamped() {
        let mut s = store();
        let old = vec![mass_at(100.0, 1000.0)];
        let v1 = s.create_version(MassKind::Normal, Vec2::new(100.0, 0.0), 1000.0, &old, 0.0);
        s.stamp_front(Vec2::new(100.0, 0.0), 2000.0, v1);

        // The mass doubles; only the origin cell learns about it
        let new = vec![mass_at(100.0, 2000.0)];
        let v2 = s.create_version(MassKind::Normal, Vec2::new(100.0, 0.0), 1000.0, &new, 1.0);
        s.stamp(Vec2::new(100.0, 0.0), v2);

        let far = Vec2::new(700.0, 700.0);
        assert_eq!(s.causal_masses(far, &new)[0].mass, 1000.0);
        assert_eq!(s.causal_masses(Vec2::new(100.0, 0.0), &new)[0].mass, 2000.0);

        // Once a front reaches the far cell, the new configuration is visible
        s.stamp_front(Vec2::new(100.0, 0.0), 2000.0, v2);
        assert_eq!(s.causal_masses(far, &new)[0].mass, 2000.0);
    }
}
