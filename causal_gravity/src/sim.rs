//! Owned simulation state and the per-frame update order
//!
//! One struct owns the mass list, the version store, the fronts, and every
//! moving object. The event layer holds `&mut`, the renderer `&`; there is
//! exactly one writer. Within a frame the order is fixed: advance time,
//! expand fronts (grid writes), then update consumers (grid reads).

use glam::Vec2;
use rand::Rng;

use crate::geodesics::{self, GeodesicSettings};
use crate::masses::{self, Mass, MassChange, MassKind};
use crate::objects::{self, Clock, Laser, Spacecraft};
use crate::propagation::{self, PropagationFront};
use crate::versioning::VersionStore;

pub const WORLD_SIZE: f32 = 800.0;
pub const GRID_SPACING: f32 = 32.0;

pub struct GravitySim {
    pub masses: Vec<Mass>,
    pub store: VersionStore,
    pub fronts: Vec<PropagationFront>,
    pub spacecraft: Vec<Spacecraft>,
    pub lasers: Vec<Laser>,
    pub clocks: Vec<Clock>,
    pub geodesic_seeds: Vec<Vec2>,
    pub geodesics: Vec<Vec<Vec2>>,
    pub geodesic_settings: GeodesicSettings,
    pub world: Vec2,
    pub sim_time: f64,
    pub paused: bool,
}

impl GravitySim {
    pub fn new() -> Self {
        let world = Vec2::splat(WORLD_SIZE);
        Self {
            masses: Vec::new(),
            store: VersionStore::new(world, GRID_SPACING),
            fronts: Vec::new(),
            spacecraft: Vec::new(),
            lasers: Vec::new(),
            clocks: Vec::new(),
            geodesic_seeds: Vec::new(),
            geodesics: Vec::new(),
            geodesic_settings: GeodesicSettings::default(),
            world,
            sim_time: 0.0,
            paused: false,
        }
    }

    /// Step the whole simulation forward by dt seconds
    pub fn update(&mut self, dt: f32) {
        if self.paused {
            return;
        }

        self.sim_time += dt as f64;

        // Grid writes happen before any consumer reads this frame
        propagation::advance_fronts(&mut self.fronts, &mut self.store, self.sim_time, self.world);

        objects::update_spacecraft(&mut self.spacecraft, &self.store, &self.masses, dt);
        objects::update_lasers(&mut self.lasers, &self.store, &self.masses, dt, self.world);
        objects::update_clocks(&mut self.clocks, &self.store, &self.masses, dt);
    }

    /// Left/right click with the mass or black hole tool
    pub fn click_mass(&mut self, kind: MassKind, p: Vec2, remove: bool) {
        if let Some(change) =
            masses::apply_click(&mut self.masses, kind, p, self.store.spacing, remove)
        {
            self.register_change(change);
        }
    }

    /// Version the change, stamp its origin cell, spawn its front, and
    /// invalidate the static geodesic curves
    fn register_change(&mut self, change: MassChange) {
        let version = self.store.create_version(
            change.kind,
            change.position,
            change.amount,
            &self.masses,
            self.sim_time,
        );
        self.store.stamp(change.position, version);
        self.fronts.push(PropagationFront::new(
            change.position,
            self.sim_time,
            version,
            change.kind,
            change.amount,
        ));
        self.recalculate_geodesics();

        log::debug!(
            "version {} ({:+.0} at {:?}), {} fronts active",
            version,
            change.amount,
            change.position,
            self.fronts.len()
        );
    }

    pub fn add_spacecraft(&mut self, p: Vec2, dir: Vec2) {
        let dir = if dir.length() > 1e-3 { dir.normalize() } else { Vec2::X };
        self.spacecraft
            .push(Spacecraft::new(p, dir * objects::MAX_SPEED * 0.2));
    }

    pub fn add_laser(&mut self, p: Vec2, dir: Vec2) {
        let dir = if dir.length() > 1e-3 { dir } else { Vec2::X };
        self.lasers.push(Laser::new(p, dir));
    }

    pub fn add_clock(&mut self, p: Vec2) {
        self.clocks.push(Clock::new(p));
    }

    pub fn add_geodesic(&mut self, p: Vec2) {
        self.geodesic_seeds.push(p);
        self.recalculate_geodesics();
    }

    /// Retrace every geodesic seed against the live mass list
    pub fn recalculate_geodesics(&mut self) {
        self.geodesics = self
            .geodesic_seeds
            .iter()
            .filter_map(|&seed| {
                geodesics::trace(seed, &self.masses, &self.geodesic_settings, self.world)
            })
            .collect();
    }

    /// Scatter a ring of planets around the world center
    pub fn scatter_preset(&mut self, count: usize) {
        let mut rng = rand::thread_rng();
        let center = self.world * 0.5;

        for _ in 0..count {
            let angle: f32 = rng.gen::<f32>() * std::f32::consts::TAU;
            let distance = 120.0 + rng.gen::<f32>() * 220.0;
            let p = center + Vec2::new(angle.cos(), angle.sin()) * distance;
            let snapped = masses::snap_to_grid(p, self.store.spacing);

            if masses::find_mass_at(&self.masses, snapped, self.store.spacing).is_some() {
                continue;
            }

            let mass = 2000.0 + rng.gen::<f32>() * 6000.0;
            self.masses.push(Mass::new(snapped, mass, MassKind::Planet));
            self.register_change(MassChange {
                kind: MassKind::Planet,
                position: snapped,
                amount: mass,
            });
        }
    }

    /// Remove everything and start over (the version counter keeps counting)
    pub fn clear(&mut self) {
        let world = self.world;
        let spacing = self.store.spacing;
        self.masses.clear();
        self.fronts.clear();
        self.spacecraft.clear();
        self.lasers.clear();
        self.clocks.clear();
        self.geodesic_seeds.clear();
        self.geodesics.clear();
        self.store = VersionStore::new(world, spacing);
    }
}

impl Default for GravitySim {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_clicks_make_one_mass_two_versions_two_fronts() {
        let mut sim = GravitySim::new();
        sim.click_mass(MassKind::Normal, Vec2::new(100.0, 100.0), false);
        sim.click_mass(MassKind::Normal, Vec2::new(100.0, 100.0), false);

        assert_eq!(sim.masses.len(), 1);
        assert_eq!(sim.masses[0].mass, 2000.0);
        assert_eq!(sim.fronts.len(), 2);
        assert_eq!(sim.store.history.len(), 2);
        assert_eq!(sim.store.latest_version(), 2);
    }

    #[test]
    fn rejected_click_creates_no_version() {
        let mut sim = GravitySim::new();
        sim.click_mass(MassKind::Normal, Vec2::new(100.0, 100.0), true);
        assert!(sim.store.history.is_empty());
        assert!(sim.fronts.is_empty());
    }

    #[test]
    fn mass_change_invalidates_geodesics() {
        let mut sim = GravitySim::new();
        sim.click_mass(MassKind::Normal, Vec2::new(400.0, 400.0), false);
        for _ in 0..9 {
            sim.click_mass(MassKind::Normal, Vec2::new(400.0, 400.0), false);
        }
        sim.add_geodesic(Vec2::new(400.0, 330.0));
        let before = sim.geodesics.len();
        assert_eq!(before, 1);

        // Removing the mass entirely leaves nothing to bend around
        for _ in 0..10 {
            sim.click_mass(MassKind::Normal, Vec2::new(400.0, 400.0), true);
        }
        assert!(sim.masses.is_empty());
        assert!(sim.geodesics.is_empty());
    }

    #[test]
    fn paused_simulation_does_not_advance() {
        let mut sim = GravitySim::new();
        sim.paused = true;
        sim.add_clock(Vec2::new(100.0, 100.0));
        sim.update(1.0);
        assert_eq!(sim.sim_time, 0.0);
        assert_eq!(sim.clocks[0].proper_time, 0.0);
    }

    #[test]
    fn scatter_preset_versions_every_planet() {
        let mut sim = GravitySim::new();
        sim.scatter_preset(8);
        assert!(!sim.masses.is_empty());
        assert_eq!(sim.masses.len(), sim.fronts.len());
        assert_eq!(sim.store.history.len(), sim.masses.len());
    }
}
