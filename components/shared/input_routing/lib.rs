/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The interface between compositor-thread input routing and the rest of the
//! engine: input events, the scroll engine that applies scrolls, the provider
//! of fling animation curves and the messages sent back to the main thread.

#![deny(unsafe_code)]

mod input_events;

use std::fmt::{Debug, Error, Formatter};

use crossbeam_channel::Sender;
use euclid::{Point2D, Vector2D};
use keyboard_types::Modifiers;
use log::warn;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

pub use crate::input_events::*;

/// One hardware pixel of the display the view is composited to.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum DevicePixel {}

pub type DevicePoint = Point2D<f32, DevicePixel>;
pub type DeviceVector2D = Vector2D<f32, DevicePixel>;

/// The outcome of routing an input event on the compositor thread.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum EventDisposition {
    /// The event was fully handled on the compositor thread and must not be
    /// forwarded.
    Handled,
    /// The event must be handled by the main thread.
    NotHandled,
    /// Nothing can consume the event; it should be silently discarded.
    Dropped,
}

/// The answer of the [`ScrollEngine`] to a request to start scrolling.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ScrollStatus {
    /// The compositor thread now owns a scroll session.
    Started,
    /// There is nothing to scroll at the requested position.
    Ignored,
    /// The scroll must be performed on the main thread, e.g. because of
    /// non-passive event handlers or non-fast-scrollable regions.
    OnMainThread,
    /// The scroll engine could not decide.
    Unknown,
}

/// How a scroll was initiated. This affects which layer the scroll engine
/// selects and whether scrolls bubble to ancestors.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ScrollInputType {
    Wheel,
    Gesture,
    /// A gesture whose scroll must not bubble to ancestor layers once the
    /// targeted layer is exhausted.
    NonBubblingGesture,
}

/// The scrolling, pinching and hit-testing machinery of the compositor. Calls
/// are synchronous and made from the compositor thread only.
pub trait ScrollEngine {
    /// Start a scroll session for the layer under `point`.
    fn scroll_begin(&mut self, point: DevicePoint, input_type: ScrollInputType) -> ScrollStatus;

    /// Scroll the current scroll session by `delta`, in the content
    /// convention. Returns true if anything moved.
    fn scroll_by(&mut self, point: DevicePoint, delta: DeviceVector2D) -> bool;

    /// Finish the current scroll session.
    fn scroll_end(&mut self);

    /// Turn the current gesture scroll session into a fling.
    fn fling_scroll_begin(&mut self) -> ScrollStatus;

    fn pinch_gesture_begin(&mut self);
    fn pinch_gesture_update(&mut self, magnification: f32, anchor: DevicePoint);
    fn pinch_gesture_end(&mut self);

    /// Whether the layer that a scroll started at `point` would target is the
    /// layer currently being scrolled.
    fn is_currently_scrolling_layer_at(
        &self,
        point: DevicePoint,
        input_type: ScrollInputType,
    ) -> bool;

    /// Whether a touch event handler is registered at `point`.
    fn have_touch_event_handlers_at(&self, point: DevicePoint) -> bool;

    /// Update hover tracking, e.g. for scrollbar animations.
    fn mouse_move_at(&mut self, point: DevicePoint);

    /// Ask for [`FlingCurve`] animation to be ticked again on the next frame.
    fn set_needs_animate(&mut self);
}

/// A snapshot of an active fling, with everything needed to resume it
/// elsewhere.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct FlingParameters {
    /// Time the fling started, in seconds. Zero when unknown.
    pub start_time: f64,
    /// The velocity the fling was created with.
    pub delta: DeviceVector2D,
    pub point: DevicePoint,
    pub global_point: DevicePoint,
    pub modifiers: Modifiers,
    pub source_device: GestureSourceDevice,
    /// The distance already scrolled by this fling.
    pub cumulative_scroll: DeviceVector2D,
}

impl Default for FlingParameters {
    fn default() -> Self {
        Self {
            start_time: 0.,
            delta: DeviceVector2D::zero(),
            point: DevicePoint::origin(),
            global_point: DevicePoint::origin(),
            modifiers: Modifiers::empty(),
            source_device: GestureSourceDevice::default(),
            cumulative_scroll: DeviceVector2D::zero(),
        }
    }
}

/// The object a [`FlingCurve`] scrolls while it is sampled.
pub trait FlingCurveTarget {
    /// Apply `increment`, the distance travelled since the previous sample,
    /// given the curve's current `velocity`. Returns false if the fling should
    /// stop because nothing scrolled.
    fn apply_scroll_increment(
        &mut self,
        increment: DeviceVector2D,
        velocity: DeviceVector2D,
    ) -> bool;
}

/// A velocity decay curve driving a fling.
pub trait FlingCurve {
    /// Advance the curve to `elapsed` seconds since the fling started, feeding
    /// the travelled distance into `target`. Returns whether the curve is
    /// still active.
    fn apply(&mut self, elapsed: f64, target: &mut dyn FlingCurveTarget) -> bool;
}

/// Builds the curves used to animate flings.
pub trait AnimationCurveProvider {
    fn create_fling_curve(
        &self,
        source_device: GestureSourceDevice,
        velocity: DeviceVector2D,
        cumulative_scroll: DeviceVector2D,
    ) -> Box<dyn FlingCurve>;
}

/// Describes a scroll that the content could not fully absorb.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct DidOverscrollParams {
    pub accumulated_overscroll: DeviceVector2D,
    pub latest_overscroll_delta: DeviceVector2D,
    pub current_fling_velocity: DeviceVector2D,
}

/// Notifications sent from the compositor thread to the main thread.
#[derive(Deserialize, IntoStaticStr, Serialize)]
pub enum InputHandlerClientMessage {
    /// A fling started animating on the compositor thread.
    DidStartFlinging,
    /// A fling stopped animating, either on the compositor thread or, after a
    /// transfer, on the main thread.
    DidStopFlinging,
    /// A touchpad fling needs wheel events that only the main thread can
    /// handle. The main thread should continue the fling from these parameters.
    TransferActiveWheelFlingAnimation(FlingParameters),
    /// The content could not absorb a scroll.
    DidOverscroll(DidOverscrollParams),
}

impl Debug for InputHandlerClientMessage {
    fn fmt(&self, formatter: &mut Formatter) -> Result<(), Error> {
        let string: &'static str = self.into();
        write!(formatter, "{string}")
    }
}

/// Sends [`InputHandlerClientMessage`]s to the main thread.
#[derive(Clone)]
pub struct InputHandlerClientProxy {
    pub sender: Sender<InputHandlerClientMessage>,
}

impl InputHandlerClientProxy {
    pub fn new(sender: Sender<InputHandlerClientMessage>) -> Self {
        Self { sender }
    }

    pub fn send(&self, message: InputHandlerClientMessage) {
        if let Err(error) = self.sender.send(message) {
            warn!("Failed to send input handler client message ({error:?}).");
        }
    }
}
