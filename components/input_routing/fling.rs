/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Fling state and the physics-to-scroll bridge used while a fling curve is
//! sampled. The lifecycle itself (start, boost, cancel) is driven by
//! [`crate::InputHandlerProxy`].

use std::mem;

use input_routing_api::{
    DeviceVector2D, EventDisposition, FlingCurve, FlingCurveTarget, FlingParameters,
    GestureEvent, GestureSourceDevice, InputEvent, ScrollEngine, WheelEvent,
};
use log::trace;

use crate::classifier::{EventCategory, classify};
use crate::scroll_session::scroll_wheel;

/// Increments smaller than this on both axes keep a fling alive even if they
/// did not scroll anything. Very short frame intervals produce such deltas.
const SCROLL_EPSILON: f32 = 0.1;

/// Which axes a fling may still scroll along.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct AxisAllowance {
    pub(crate) horizontal_allowed: bool,
    pub(crate) vertical_allowed: bool,
}

impl AxisAllowance {
    pub(crate) fn for_velocity(velocity: DeviceVector2D) -> Self {
        Self {
            horizontal_allowed: velocity.x != 0.,
            vertical_allowed: velocity.y != 0.,
        }
    }

    /// Zero the components of `vector` along disallowed axes.
    pub(crate) fn clip(&self, vector: DeviceVector2D) -> DeviceVector2D {
        DeviceVector2D::new(
            if self.horizontal_allowed { vector.x } else { 0. },
            if self.vertical_allowed { vector.y } else { 0. },
        )
    }

    /// Disable every axis whose accumulated overscroll reached `threshold`.
    /// Axes are never re-enabled.
    pub(crate) fn disallow_for_overscroll(
        &mut self,
        accumulated_overscroll: DeviceVector2D,
        threshold: f32,
    ) {
        self.horizontal_allowed &= accumulated_overscroll.x.abs() < threshold;
        self.vertical_allowed &= accumulated_overscroll.y.abs() < threshold;
    }

    pub(crate) fn any_allowed(&self) -> bool {
        self.horizontal_allowed || self.vertical_allowed
    }
}

/// A fling with a live animation curve.
pub(crate) struct Fling {
    pub(crate) curve: Box<dyn FlingCurve>,
    pub(crate) parameters: FlingParameters,
    /// The latest velocity reported by the curve, clipped to the allowed axes.
    pub(crate) velocity: DeviceVector2D,
    pub(crate) axes: AxisAllowance,
    /// Whether `animate` has run since the curve was created. Until then
    /// `parameters.start_time` is the gesture timestamp and still needs to be
    /// validated against the frame clock.
    pub(crate) has_started: bool,
}

impl Fling {
    pub(crate) fn new(
        curve: Box<dyn FlingCurve>,
        parameters: FlingParameters,
        velocity: DeviceVector2D,
    ) -> Self {
        Self {
            curve,
            parameters,
            velocity,
            axes: AxisAllowance::for_velocity(velocity),
            has_started: false,
        }
    }
}

#[derive(Default)]
pub(crate) enum FlingState {
    #[default]
    Idle,
    Active(Fling),
    /// A `GestureFlingCancel` was received but is held back until `deadline`,
    /// in case a following gesture boosts the fling.
    DeferredCancel {
        fling: Fling,
        deadline: f64,
        /// The latest gesture that extended the deadline.
        last_boost_event: Option<GestureEvent>,
    },
}

impl FlingState {
    pub(crate) fn fling(&self) -> Option<&Fling> {
        match self {
            FlingState::Idle => None,
            FlingState::Active(fling) | FlingState::DeferredCancel { fling, .. } => Some(fling),
        }
    }

    pub(crate) fn fling_mut(&mut self) -> Option<&mut Fling> {
        match self {
            FlingState::Idle => None,
            FlingState::Active(fling) | FlingState::DeferredCancel { fling, .. } => Some(fling),
        }
    }

    pub(crate) fn is_cancel_deferred(&self) -> bool {
        matches!(self, FlingState::DeferredCancel { .. })
    }

    /// Hold back cancellation of the current fling until `deadline`. A
    /// pending `last_boost_event` is kept.
    pub(crate) fn defer_cancel(&mut self, deadline: f64) {
        *self = match mem::take(self) {
            FlingState::Idle => FlingState::Idle,
            FlingState::Active(fling) => FlingState::DeferredCancel {
                fling,
                deadline,
                last_boost_event: None,
            },
            FlingState::DeferredCancel {
                fling,
                last_boost_event,
                ..
            } => FlingState::DeferredCancel {
                fling,
                deadline,
                last_boost_event,
            },
        };
    }

    /// Push the deadline back to `deadline`, remembering `event` as the
    /// gesture that did so.
    pub(crate) fn extend_deferred_cancel(&mut self, event: GestureEvent, deadline: f64) {
        self.defer_cancel(deadline);
        if let FlingState::DeferredCancel {
            last_boost_event, ..
        } = self
        {
            *last_boost_event = Some(event);
        }
    }

    pub(crate) fn clear_last_boost_event(&mut self) {
        if let FlingState::DeferredCancel {
            last_boost_event, ..
        } = self
        {
            *last_boost_event = None;
        }
    }
}

/// Whether a fling start with `new_velocity` should add to the current fling
/// instead of replacing it: both must be fast and must not point in opposite
/// directions.
pub(crate) fn should_boost_fling(
    current_velocity: DeviceVector2D,
    new_velocity: DeviceVector2D,
    min_boost_fling_speed: f32,
) -> bool {
    let min_speed_squared = min_boost_fling_speed * min_boost_fling_speed;
    current_velocity.dot(new_velocity) >= 0. &&
        current_velocity.square_length() >= min_speed_squared &&
        new_velocity.square_length() >= min_speed_squared
}

/// Whether a scroll update received while a fling cancel is deferred keeps the
/// fling alive. The scroll must follow the fling and be fast enough, unless it
/// arrived within a millisecond of the previous boosting gesture.
pub(crate) fn should_suppress_scroll_for_fling_boosting(
    current_velocity: DeviceVector2D,
    scroll_delta: DeviceVector2D,
    time_since_last_boost_event: f64,
    min_boost_touch_scroll_speed: f32,
) -> bool {
    if current_velocity.dot(scroll_delta) <= 0. {
        return false;
    }
    if time_since_last_boost_event < 0.001 {
        return true;
    }
    let scroll_velocity = scroll_delta / time_since_last_boost_event as f32;
    scroll_velocity.square_length() >= min_boost_touch_scroll_speed * min_boost_touch_scroll_speed
}

/// The wheel event that moves a touchpad fling by `increment`. It looks like a
/// wheel from the gesture's position, with the gesture's modifiers.
fn fling_wheel(
    parameters: &FlingParameters,
    increment: DeviceVector2D,
    time_stamp: f64,
) -> WheelEvent {
    WheelEvent {
        delta: increment,
        point: parameters.point,
        global_point: parameters.global_point,
        modifiers: parameters.modifiers,
        scroll_by_page: false,
        has_precise_scrolling_deltas: true,
        time_stamp,
    }
}

/// The [`FlingCurveTarget`] used while sampling a fling curve. It applies the
/// curve's increments to the scroll engine, directly for touchscreen flings and
/// through synthesized wheel events for touchpad flings.
pub(crate) struct FlingScrollTarget<'a> {
    parameters: &'a mut FlingParameters,
    velocity: &'a mut DeviceVector2D,
    axes: AxisAllowance,
    engine: &'a mut dyn ScrollEngine,
    time_stamp: f64,
    /// Set when the wheels of a touchpad fling have to be handled by the main
    /// thread. Holds the parameters to hand over.
    transfer: Option<FlingParameters>,
}

impl<'a> FlingScrollTarget<'a> {
    pub(crate) fn new(
        parameters: &'a mut FlingParameters,
        velocity: &'a mut DeviceVector2D,
        axes: AxisAllowance,
        engine: &'a mut dyn ScrollEngine,
        time_stamp: f64,
    ) -> Self {
        Self {
            parameters,
            velocity,
            axes,
            engine,
            time_stamp,
            transfer: None,
        }
    }

    pub(crate) fn take_transfer(&mut self) -> Option<FlingParameters> {
        self.transfer.take()
    }

    fn touchpad_fling_scroll(&mut self, increment: DeviceVector2D) -> bool {
        let wheel = fling_wheel(self.parameters, increment, self.time_stamp);
        let event = InputEvent::Wheel(wheel);
        let disposition = match classify(&event) {
            EventCategory::Wheel => scroll_wheel(self.engine, &wheel),
            _ => EventDisposition::NotHandled,
        };

        match disposition {
            EventDisposition::Handled => true,
            EventDisposition::Dropped => false,
            EventDisposition::NotHandled => {
                // Something under the fling can only be scrolled by the main
                // thread, e.g. a subframe that was flung under the pointer.
                trace!("Touchpad fling wheel needs the main thread");
                self.transfer = Some(*self.parameters);
                false
            },
        }
    }
}

impl FlingCurveTarget for FlingScrollTarget<'_> {
    fn apply_scroll_increment(
        &mut self,
        increment: DeviceVector2D,
        velocity: DeviceVector2D,
    ) -> bool {
        if self.transfer.is_some() {
            return false;
        }

        let increment = self.axes.clip(increment);
        let velocity = self.axes.clip(velocity);
        *self.velocity = velocity;

        if increment == DeviceVector2D::zero() {
            return velocity != DeviceVector2D::zero();
        }

        trace!("Fling scroll by {increment:?} at velocity {velocity:?}");
        let did_scroll = match self.parameters.source_device {
            GestureSourceDevice::Touchpad => self.touchpad_fling_scroll(increment),
            GestureSourceDevice::Touchscreen => self
                .engine
                .scroll_by(self.parameters.point, -increment),
        };

        if did_scroll {
            self.parameters.cumulative_scroll += increment;
        }

        if increment.x.abs() < SCROLL_EPSILON && increment.y.abs() < SCROLL_EPSILON {
            return true;
        }
        did_scroll
    }
}
