//! Special-relativistic kinematics for chains of accelerated frames
//!
//! All quantities are in normalized units (c = 1): space in light-seconds,
//! time in seconds. A segment between a frame and its source is modeled as
//! constant-proper-acceleration hyperbolic motion; chains compose velocity
//! relativistically and simply add proper times.

use crate::frames::ReferenceFrame;

/// Speed of light (normalized)
pub const C: f64 = 1.0;

/// Fractional margin kept below c everywhere
pub const EPSILON: f64 = 0.001;

/// Hard cap on any velocity handed to downstream formulas
pub const MAX_VELOCITY: f64 = C * (1.0 - EPSILON);

/// Margin inside the light cone below which a segment counts as invalid
pub const SAFETY_MARGIN: f64 = 0.001;

/// Displacements smaller than this are treated as purely time-like
pub const MIN_DISPLACEMENT: f64 = 1e-6;

/// Acceleration substituted for a purely time-like segment, keeping the
/// formulas away from 0/0 without changing the visible physics
pub const ACCELERATION_FLOOR: f64 = 0.001;

/// Clamp a velocity to ±MAX_VELOCITY
pub fn limit_velocity(v: f64) -> f64 {
    v.clamp(-MAX_VELOCITY, MAX_VELOCITY)
}

/// Fraction of light speed needed to cover `dx` in `dt`, clamped to 1.
/// Zero for non-positive time intervals.
pub fn velocity_ratio(dx: f64, dt: f64) -> f64 {
    if dt > 0.0 {
        (dx.abs() / (dt * C)).min(1.0)
    } else {
        0.0
    }
}

/// Relativistic velocity addition: (v1+v2)/(1+v1·v2/c²), clamped
pub fn add_velocities(v1: f64, v2: f64) -> f64 {
    limit_velocity((v1 + v2) / (1.0 + v1 * v2 / (C * C)))
}

/// Physics of one constant-acceleration segment
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SegmentPhysics {
    pub acceleration: f64,
    pub velocity: f64,
    pub proper_time: f64,
    pub coordinate_time: f64,
}

/// Hyperbolic-motion solution for a displacement `dx` covered in
/// coordinate time `dt` from rest.
///
/// Degenerate inputs do not error: a segment at or outside the light cone
/// (or with non-positive duration) collapses to zero acceleration and
/// velocity with proper time equal to coordinate time.
pub fn segment_physics(dx: f64, dt: f64) -> SegmentPhysics {
    if dt <= 0.0 || dx.abs() >= dt * C * (1.0 - SAFETY_MARGIN) {
        return SegmentPhysics {
            acceleration: 0.0,
            velocity: 0.0,
            proper_time: dt,
            coordinate_time: dt,
        };
    }

    if dx.abs() < MIN_DISPLACEMENT {
        return SegmentPhysics {
            acceleration: ACCELERATION_FLOOR,
            velocity: 0.0,
            proper_time: dt,
            coordinate_time: dt,
        };
    }

    let x = dx.abs();
    // a = 2Xc² / (c²T² - X²); reaches X at time T starting from rest
    let a = 2.0 * x * C * C / (C * C * dt * dt - x * x);
    // v(T) = aT / sqrt(1 + (aT/c)²)
    let v = limit_velocity(dx.signum() * a * dt / (1.0 + (a * dt / C).powi(2)).sqrt());
    // τ(T) = (c/a)·asinh(aT/c)
    let tau = (C / a) * (a * dt / C).asinh();

    SegmentPhysics {
        acceleration: dx.signum() * a,
        velocity: v,
        proper_time: tau,
        coordinate_time: dt,
    }
}

/// Accumulated physics along a causal chain of frames
#[derive(Debug, Clone, Copy, Default)]
pub struct CumulativePhysics {
    pub velocity: f64,
    pub proper_time: f64,
    pub coordinate_time: f64,
    /// Physics of the final segment into the queried frame
    pub segment: SegmentPhysics,
}

/// Resolve the cumulative physics of `frames[index]` by walking its source
/// chain to the root and folding forward. Iterative on purpose: chains can
/// be long and this runs on every query.
pub fn cumulative_physics(frames: &[ReferenceFrame], index: usize) -> CumulativePhysics {
    if index >= frames.len() {
        return CumulativePhysics::default();
    }

    let mut chain = Vec::new();
    let mut current = Some(index);
    while let Some(i) = current {
        chain.push(i);
        if chain.len() > frames.len() {
            // A source cycle cannot be built through the public API
            log::warn!("source cycle detected at frame {index}");
            return CumulativePhysics::default();
        }
        current = frames[i].source;
    }
    chain.reverse();

    let mut total = CumulativePhysics::default();
    for pair in chain.windows(2) {
        let source = &frames[pair[0]];
        let frame = &frames[pair[1]];
        let segment = segment_physics(frame.x - source.x, frame.t - source.t);

        total.velocity = add_velocities(total.velocity, segment.velocity);
        total.proper_time += segment.proper_time;
        total.coordinate_time += segment.coordinate_time;
        total.segment = segment;
    }

    total
}

/// Whether a target event lies strictly inside the future light cone of a
/// source event. Uses the same margin as `segment_physics`, so this is
/// exactly the condition for a non-degenerate trajectory.
pub fn is_reachable(dx: f64, dt: f64) -> bool {
    dt > 0.0 && dx.abs() < dt * C * (1.0 - SAFETY_MARGIN)
}

/// Reachability of an event from an existing frame
pub fn is_reachable_from(target_x: f64, target_t: f64, source: &ReferenceFrame) -> bool {
    is_reachable(target_x - source.x, target_t - source.t)
}
