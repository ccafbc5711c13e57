//! Isochrones and accelerated trajectories
//!
//! The forward problem samples curves of constant proper time; the inverse
//! problem recovers the coordinate time that yields a requested proper
//! time via Newton-Raphson. Trajectory sampling uses the closed-form
//! hyperbolic position solution.

use thiserror::Error;

use crate::frames::ReferenceFrame;
use crate::relativity::{self, SegmentPhysics, C, MIN_DISPLACEMENT};

/// Sample count for isochrone curves
pub const ISOCHRONE_SAMPLES: usize = 500;

/// Fraction of the x-range added past each edge for visual smoothness
const ISOCHRONE_MARGIN: f64 = 0.2;

const NEWTON_MAX_ITERATIONS: usize = 50;
const NEWTON_EPSILON: f64 = 1e-8;
const NEWTON_TOLERANCE: f64 = 1e-10;

/// Lower and upper clamps on Δt relative to |Δx| during root-finding,
/// keeping the iterate strictly inside the light cone
const NEWTON_DT_MIN_FACTOR: f64 = 1.001;
const NEWTON_DT_MAX_FACTOR: f64 = 1000.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrajectoryError {
    #[error("end time must be after start time")]
    NonPositiveDuration,
    #[error("trajectory would require reaching light speed")]
    OutsideLightCone,
}

/// Proper time elapsed covering `dx` in coordinate time `dt` from rest
fn proper_time_for(dx: f64, dt: f64) -> f64 {
    relativity::segment_physics(dx, dt).proper_time
}

/// Sample the isochrone of proper time `tau` since `origin`.
///
/// The curve is `t = origin.t + cal·sqrt(τ² + (Δx/c)²)`, with the single
/// calibration scalar chosen so it passes exactly through `target` (1.0
/// when there is no target or the target is degenerate). Points at or
/// below the origin's time are discarded: the isochrone only extends into
/// the future.
pub fn isochrone_points(
    tau: f64,
    origin: &ReferenceFrame,
    target: Option<&ReferenceFrame>,
    x_min: f64,
    x_max: f64,
) -> Vec<(f64, f64)> {
    let calibration = match target {
        Some(sel) => {
            let dx = (sel.x - origin.x) / C;
            let t_formula = (tau * tau + dx * dx).sqrt();
            if t_formula > 0.0 && sel.t > origin.t {
                (sel.t - origin.t) / t_formula
            } else {
                1.0
            }
        }
        None => 1.0,
    };

    let margin = (x_max - x_min) * ISOCHRONE_MARGIN;
    let lo = x_min - margin;
    let hi = x_max + margin;
    let step = (hi - lo) / ISOCHRONE_SAMPLES as f64;

    let mut points = Vec::with_capacity(ISOCHRONE_SAMPLES + 1);
    for i in 0..=ISOCHRONE_SAMPLES {
        let x = lo + step * i as f64;
        let dx = (x - origin.x) / C;
        let t = origin.t + calibration * (tau * tau + dx * dx).sqrt();
        if t > origin.t {
            points.push((x, t));
        }
    }
    points
}

/// Inverse isochrone problem: the coordinate time at which an observer
/// departing `(origin_x, origin_t)` and arriving at `target_x` has aged by
/// exactly `tau`.
///
/// Newton-Raphson with a numerical derivative; the iterate is clamped to
/// stay strictly inside the light cone. Non-convergence is not an error:
/// the best estimate is returned and the case logged at debug level.
pub fn coordinate_time_for_isochrone(
    origin_x: f64,
    origin_t: f64,
    target_x: f64,
    tau: f64,
) -> f64 {
    let dx = target_x - origin_x;

    if dx.abs() < MIN_DISPLACEMENT {
        // Purely time-like: proper time equals coordinate time
        return origin_t + tau;
    }

    let lo = dx.abs() * NEWTON_DT_MIN_FACTOR;
    let hi = dx.abs() * NEWTON_DT_MAX_FACTOR;

    // Initial guess: cover the distance at an average 0.5c
    let mut dt = (dx.abs() / 0.5).clamp(lo, hi);
    let mut best = dt;
    let mut best_error = f64::INFINITY;

    for _ in 0..NEWTON_MAX_ITERATIONS {
        let error = proper_time_for(dx, dt) - tau;
        if error.abs() < best_error {
            best_error = error.abs();
            best = dt;
        }
        if error.abs() < NEWTON_TOLERANCE {
            return origin_t + dt;
        }

        let derivative =
            (proper_time_for(dx, dt + NEWTON_EPSILON) - proper_time_for(dx, dt)) / NEWTON_EPSILON;
        if derivative.abs() < f64::EPSILON {
            break;
        }

        dt = (dt - error / derivative).clamp(lo, hi);
    }

    log::debug!(
        "isochrone inversion did not converge for dx={dx:.3}, tau={tau:.3} (residual {best_error:.3e})"
    );
    origin_t + best
}

/// Input for hyperbolic trajectory sampling
#[derive(Debug, Clone, Copy)]
pub struct TrajectoryParams {
    pub start_x: f64,
    pub start_t: f64,
    pub end_x: f64,
    pub end_t: f64,
    pub initial_velocity: f64,
    pub points: usize,
}

/// A sampled trajectory with its physics and bounding box
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub points: Vec<(f64, f64)>,
    pub physics: SegmentPhysics,
    /// (x_min, t_min, x_max, t_max)
    pub bounds: (f64, f64, f64, f64),
}

/// Sample the constant-acceleration path between two events.
///
/// A nonzero initial velocity is honored by subtracting its inertial
/// displacement and applying the hyperbolic solution to the residual — an
/// approximate composition, not exact relativistic superposition.
pub fn hyperbolic_trajectory(params: &TrajectoryParams) -> Result<Trajectory, TrajectoryError> {
    let dt = params.end_t - params.start_t;
    if dt <= 0.0 {
        return Err(TrajectoryError::NonPositiveDuration);
    }

    let dx = params.end_x - params.start_x;
    if !relativity::is_reachable(dx, dt) {
        return Err(TrajectoryError::OutsideLightCone);
    }

    let v0 = relativity::limit_velocity(params.initial_velocity);
    let residual = dx - v0 * dt;
    let segment = relativity::segment_physics(residual, dt);
    let a = segment.acceleration.abs();
    let sign = residual.signum();

    let n = params.points.max(1);
    let mut points = Vec::with_capacity(n + 1);
    for i in 0..=n {
        let t_off = dt * i as f64 / n as f64;
        // x(T) = (c²/a)(sqrt(1 + (aT/c)²) - 1), exact for the residual
        let curved = if a > 0.0 && residual.abs() >= MIN_DISPLACEMENT {
            sign * (C * C / a) * ((1.0 + (a * t_off / C).powi(2)).sqrt() - 1.0)
        } else {
            0.0
        };
        points.push((params.start_x + v0 * t_off + curved, params.start_t + t_off));
    }

    let bounds = points.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(x0, t0, x1, t1), &(x, t)| (x0.min(x), t0.min(t), x1.max(x), t1.max(t)),
    );

    Ok(Trajectory {
        points,
        physics: SegmentPhysics {
            acceleration: segment.acceleration,
            velocity: relativity::add_velocities(v0, segment.velocity),
            proper_time: segment.proper_time,
            coordinate_time: dt,
        },
        bounds,
    })
}

/// Totals across a multi-segment journey
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalPhysics {
    pub velocity: f64,
    pub proper_time: f64,
    pub coordinate_time: f64,
    pub time_dilation_percentage: f64,
}

/// Per-segment breakdown plus totals for a chain of frames
#[derive(Debug, Clone, Default)]
pub struct CumulativeTrajectory {
    pub segments: Vec<SegmentPhysics>,
    pub total: TotalPhysics,
}

/// Analyze a journey given as consecutive frames: per-segment physics,
/// relativistic velocity accumulation, and the overall time dilation.
pub fn cumulative_trajectory(frames: &[ReferenceFrame]) -> CumulativeTrajectory {
    let mut segments = Vec::new();
    let mut velocity = 0.0;
    let mut proper_time = 0.0;
    let mut coordinate_time = 0.0;

    for pair in frames.windows(2) {
        let segment = relativity::segment_physics(pair[1].x - pair[0].x, pair[1].t - pair[0].t);
        velocity = relativity::add_velocities(velocity, segment.velocity);
        proper_time += segment.proper_time;
        coordinate_time += segment.coordinate_time;
        segments.push(segment);
    }

    let time_dilation_percentage = if coordinate_time > 0.0 {
        (coordinate_time - proper_time) / coordinate_time * 100.0
    } else {
        0.0
    };

    CumulativeTrajectory {
        segments,
        total: TotalPhysics {
            velocity,
            proper_time,
            coordinate_time,
            time_dilation_percentage,
        },
    }
}

/// Parameters for the canned twin paradox scenario
#[derive(Debug, Clone, Copy)]
pub struct TwinParadoxConfig {
    pub max_distance: f64,
    pub total_time: f64,
    /// Fraction of the total time spent in each acceleration leg
    pub acceleration_phase: f64,
}

impl Default for TwinParadoxConfig {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            total_time: 300.0,
            acceleration_phase: 0.15,
        }
    }
}

/// Build the classic twin paradox as a 7-frame causal chain: outbound
/// acceleration and cruise, turnaround, return acceleration and cruise,
/// arrival back at the start.
pub fn twin_paradox_demo(config: &TwinParadoxConfig) -> Vec<ReferenceFrame> {
    let total = config.total_time;
    let half = total / 2.0;
    let phase = config.acceleration_phase.clamp(0.01, 0.24);
    let t_acc = phase * total;
    let v_avg = config.max_distance / half;

    let frame = |x: f64, t: f64, source: Option<usize>| ReferenceFrame { x, t, source };

    vec![
        frame(0.0, 0.0, None),
        frame(v_avg * t_acc, t_acc, Some(0)),
        frame(v_avg * (half - t_acc), half - t_acc, Some(1)),
        frame(config.max_distance, half, Some(2)),
        frame(v_avg * (half - t_acc), half + t_acc, Some(3)),
        frame(v_avg * t_acc, total - t_acc, Some(4)),
        frame(0.0, total, Some(5)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::Diagram;

    #[test]
    fn isochrone_stays_in_the_future_and_hits_its_target() {
        let origin = ReferenceFrame::origin();
        let target = ReferenceFrame {
            x: 40.0,
            t: 90.0,
            source: Some(0),
        };

        let points = isochrone_points(50.0, &origin, Some(&target), -100.0, 100.0);
        assert!(!points.is_empty());
        for &(_, t) in &points {
            assert!(t > origin.t);
        }

        // The calibrated curve passes through the target
        let dx = target.x / C;
        let calibration = target.t / (50.0f64 * 50.0 + dx * dx).sqrt();
        let at_target = calibration * (50.0f64 * 50.0 + dx * dx).sqrt();
        assert!((at_target - target.t).abs() < 1e-9);
    }

    #[test]
    fn degenerate_calibration_target_falls_back_to_unity() {
        let origin = ReferenceFrame::origin();
        let past_target = ReferenceFrame {
            x: 10.0,
            t: -5.0,
            source: Some(0),
        };

        let calibrated = isochrone_points(20.0, &origin, Some(&past_target), -50.0, 50.0);
        let plain = isochrone_points(20.0, &origin, None, -50.0, 50.0);
        assert_eq!(calibrated, plain);
    }

    #[test]
    fn isochrone_inversion_round_trips() {
        let cases = [
            (0.0, 0.0, 30.0, 50.0),
            (10.0, 20.0, -45.0, 80.0),
            (-5.0, 1.0, 60.0, 12.0),
            (0.0, 0.0, 2.0, 200.0),
        ];

        for (ox, ot, x, tau) in cases {
            let t = coordinate_time_for_isochrone(ox, ot, x, tau);
            let recovered = proper_time_for(x - ox, t - ot);
            assert!(
                (recovered - tau).abs() / tau < 1e-6,
                "round trip failed for x={x}, tau={tau}: got {recovered}"
            );
        }
    }

    #[test]
    fn inversion_handles_the_timelike_case_directly() {
        let t = coordinate_time_for_isochrone(5.0, 10.0, 5.0, 42.0);
        assert!((t - 52.0).abs() < 1e-12);
    }

    #[test]
    fn trajectory_rejects_impossible_requests() {
        let backwards = TrajectoryParams {
            start_x: 0.0,
            start_t: 10.0,
            end_x: 0.0,
            end_t: 5.0,
            initial_velocity: 0.0,
            points: 10,
        };
        assert_eq!(
            hyperbolic_trajectory(&backwards).unwrap_err(),
            TrajectoryError::NonPositiveDuration
        );

        let superluminal = TrajectoryParams {
            start_x: 0.0,
            start_t: 0.0,
            end_x: 50.0,
            end_t: 10.0,
            initial_velocity: 0.0,
            points: 10,
        };
        assert_eq!(
            hyperbolic_trajectory(&superluminal).unwrap_err(),
            TrajectoryError::OutsideLightCone
        );
    }

    #[test]
    fn trajectory_endpoints_are_exact() {
        let params = TrajectoryParams {
            start_x: 5.0,
            start_t: 10.0,
            end_x: 45.0,
            end_t: 70.0,
            initial_velocity: 0.0,
            points: 64,
        };
        let traj = hyperbolic_trajectory(&params).unwrap();

        assert_eq!(traj.points.len(), 65);
        let (x0, t0) = traj.points[0];
        let (x1, t1) = *traj.points.last().unwrap();
        assert!((x0 - 5.0).abs() < 1e-9 && (t0 - 10.0).abs() < 1e-9);
        assert!((x1 - 45.0).abs() < 1e-9 && (t1 - 70.0).abs() < 1e-9);

        assert!(traj.physics.proper_time <= traj.physics.coordinate_time + 1e-10);
        assert!(traj.bounds.0 <= 5.0 && traj.bounds.2 >= 45.0);
    }

    #[test]
    fn initial_velocity_bends_the_path() {
        let params = TrajectoryParams {
            start_x: 0.0,
            start_t: 0.0,
            end_x: 0.0,
            end_t: 100.0,
            initial_velocity: 0.5,
            points: 4,
        };
        let traj = hyperbolic_trajectory(&params).unwrap();

        // Midway the inertial drift has carried the path to +x even though
        // the endpoints share an x coordinate
        assert!(traj.points[2].0 > 1.0);
        let (x1, _) = *traj.points.last().unwrap();
        assert!(x1.abs() < 1e-6);
    }

    #[test]
    fn twin_paradox_ages_the_traveler_less() {
        let frames = twin_paradox_demo(&TwinParadoxConfig::default());

        assert_eq!(frames.len(), 7);
        assert_eq!((frames[0].x, frames[0].t), (0.0, 0.0));
        assert_eq!((frames[6].x, frames[6].t), (0.0, 300.0));
        for (i, f) in frames.iter().enumerate().skip(1) {
            assert_eq!(f.source, Some(i - 1));
        }

        let analysis = cumulative_trajectory(&frames);
        assert_eq!(analysis.segments.len(), 6);
        assert!((analysis.total.coordinate_time - 300.0).abs() < 1e-9);
        assert!(analysis.total.proper_time < 300.0);
        assert!(analysis.total.time_dilation_percentage > 0.0);

        // Every frame is reachable from its predecessor
        let diagram = Diagram::from_frames(frames);
        for i in 1..diagram.frames.len() {
            let f = diagram.frames[i];
            let s = diagram.frames[f.source.unwrap()];
            assert!(relativity::is_reachable_from(f.x, f.t, &s));
        }
    }
}
