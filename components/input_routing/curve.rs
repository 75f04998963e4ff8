/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use euclid::default::Vector2D;
use input_routing_api::{
    AnimationCurveProvider, DeviceVector2D, FlingCurve, FlingCurveTarget, GestureSourceDevice,
};
use log::debug;

// Coefficients of the decay model. Position is
// `ALPHA * e^(-GAMMA * t) - BETA * t - ALPHA`, in pixels for `t` in seconds.
const ALPHA: f64 = -5707.62;
const BETA: f64 = 172.;
const GAMMA: f64 = 3.7;

fn position_at_time(time: f64) -> f64 {
    ALPHA * (-GAMMA * time).exp() - BETA * time - ALPHA
}

fn velocity_at_time(time: f64) -> f64 {
    -ALPHA * GAMMA * (-GAMMA * time).exp() - BETA
}

fn time_at_velocity(velocity: f64) -> f64 {
    -((velocity + BETA) / (-ALPHA * GAMMA)).ln() / GAMMA
}

/// A fling curve whose speed decays exponentially with an additional linear
/// deceleration. The curve always runs along the direction of its initial
/// velocity and stops once the speed of its fastest axis reaches zero.
///
/// Flings of different start speeds share one curve: a slower fling starts
/// further along it.
#[derive(Debug)]
pub struct DecayFlingCurve {
    /// Per-axis share of the fastest axis' motion.
    displacement_ratio: Vector2D<f64>,
    /// Where on the shared curve this fling starts.
    time_offset: f64,
    position_offset: f64,
    curve_duration: f64,
    /// The offset reported by the previous sample.
    last_offset: Vector2D<f64>,
}

impl DecayFlingCurve {
    /// Create a curve for a fling released at `velocity`. If part of the fling
    /// has already been applied elsewhere, `cumulative_scroll` is that distance
    /// and the curve only reports what remains.
    pub fn new(velocity: DeviceVector2D, cumulative_scroll: DeviceVector2D) -> Self {
        let velocity = velocity.cast::<f64>().to_untyped();
        let max_start_velocity = velocity
            .x
            .abs()
            .max(velocity.y.abs())
            .min(velocity_at_time(0.));
        let curve_duration = time_at_velocity(0.);

        let (displacement_ratio, time_offset) = if max_start_velocity > 0. {
            (
                velocity / max_start_velocity,
                time_at_velocity(max_start_velocity),
            )
        } else {
            (Vector2D::zero(), curve_duration)
        };

        Self {
            displacement_ratio,
            time_offset,
            position_offset: position_at_time(time_offset),
            curve_duration,
            last_offset: cumulative_scroll.cast::<f64>().to_untyped(),
        }
    }

    /// Offset and velocity `elapsed` seconds into the fling, and whether the
    /// curve is still running at that point.
    fn sample(&self, elapsed: f64) -> (Vector2D<f64>, Vector2D<f64>, bool) {
        let curve_time = (elapsed.max(0.) + self.time_offset).min(self.curve_duration);
        let still_active = curve_time < self.curve_duration;
        let scalar_offset = position_at_time(curve_time) - self.position_offset;
        let scalar_velocity = if still_active {
            velocity_at_time(curve_time)
        } else {
            0.
        };
        (
            self.displacement_ratio * scalar_offset,
            self.displacement_ratio * scalar_velocity,
            still_active,
        )
    }
}

impl FlingCurve for DecayFlingCurve {
    fn apply(&mut self, elapsed: f64, target: &mut dyn FlingCurveTarget) -> bool {
        let (offset, velocity, still_active) = self.sample(elapsed);
        let increment = offset - self.last_offset;
        self.last_offset = offset;

        // The target hears about every sample, even one that did not move, so
        // that it keeps track of the current velocity.
        let did_scroll = target.apply_scroll_increment(
            DeviceVector2D::from_untyped(increment.cast()),
            DeviceVector2D::from_untyped(velocity.cast()),
        );
        did_scroll && still_active
    }
}

/// Builds [`DecayFlingCurve`]s for every kind of device.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultAnimationCurveProvider;

impl AnimationCurveProvider for DefaultAnimationCurveProvider {
    fn create_fling_curve(
        &self,
        source_device: GestureSourceDevice,
        velocity: DeviceVector2D,
        cumulative_scroll: DeviceVector2D,
    ) -> Box<dyn FlingCurve> {
        debug!("Creating {source_device:?} fling curve at {velocity:?}");
        Box::new(DecayFlingCurve::new(velocity, cumulative_scroll))
    }
}
