/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use keyboard_types::{KeyboardEvent, Modifiers};
use serde::{Deserialize, Serialize};

use crate::{DevicePoint, DeviceVector2D};

/// An input event that has been marshalled onto the compositor thread.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum InputEvent {
    Gesture(GestureEvent),
    Wheel(WheelEvent),
    Touch(TouchEvent),
    Keyboard(KeyboardEvent),
    MouseMove(MouseMoveEvent),
}

impl InputEvent {
    pub fn point(&self) -> Option<DevicePoint> {
        match self {
            InputEvent::Gesture(event) => Some(event.point),
            InputEvent::Wheel(event) => Some(event.point),
            InputEvent::Touch(..) => None,
            InputEvent::Keyboard(..) => None,
            InputEvent::MouseMove(event) => Some(event.point),
        }
    }
}

/// The device that produced a gesture.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum GestureSourceDevice {
    #[default]
    Touchpad,
    Touchscreen,
}

/// The kind of a [`GestureEvent`] together with its payload.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub enum GestureType {
    ScrollBegin,
    /// A scroll update. The delta follows the screen convention: a positive
    /// value moves the content towards positive coordinates.
    ScrollUpdate { delta: DeviceVector2D },
    ScrollEnd,
    PinchBegin,
    /// A pinch update, anchored at the event point.
    PinchUpdate { scale: f32 },
    PinchEnd,
    /// The start of a fling, with the release velocity in pixels per second.
    FlingStart { velocity: DeviceVector2D },
    FlingCancel,
    TapDown,
    TapCancel,
    Tap,
    LongPress,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct GestureEvent {
    pub gesture: GestureType,
    pub source_device: GestureSourceDevice,
    /// The position of the gesture in the coordinate space of the view.
    pub point: DevicePoint,
    /// The position of the gesture on the screen.
    pub global_point: DevicePoint,
    /// Monotonic timestamp in seconds.
    pub time_stamp: f64,
    pub modifiers: Modifiers,
}

impl GestureEvent {
    pub fn new(
        gesture: GestureType,
        source_device: GestureSourceDevice,
        point: DevicePoint,
        time_stamp: f64,
    ) -> Self {
        Self {
            gesture,
            source_device,
            point,
            global_point: point,
            time_stamp,
            modifiers: Modifiers::empty(),
        }
    }

    pub fn with_global_point(mut self, global_point: DevicePoint) -> Self {
        self.global_point = global_point;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Returns a copy of this event turned into a payload-free `ScrollBegin`,
    /// keeping its position, device, modifiers and timestamp.
    pub fn to_scroll_begin(&self) -> Self {
        Self {
            gesture: GestureType::ScrollBegin,
            ..*self
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct WheelEvent {
    /// Wheel deltas in pixels, in the screen convention.
    pub delta: DeviceVector2D,
    pub point: DevicePoint,
    pub global_point: DevicePoint,
    pub modifiers: Modifiers,
    /// Whether the wheel asks to scroll by whole pages.
    pub scroll_by_page: bool,
    /// Whether the deltas come from a precise device (or a synthesized fling)
    /// rather than from discrete wheel notches.
    pub has_precise_scrolling_deltas: bool,
    pub time_stamp: f64,
}

impl WheelEvent {
    pub fn new(delta: DeviceVector2D, point: DevicePoint, time_stamp: f64) -> Self {
        Self {
            delta,
            point,
            global_point: point,
            modifiers: Modifiers::empty(),
            scroll_by_page: false,
            has_precise_scrolling_deltas: false,
            time_stamp,
        }
    }
}

/// The state of a single point in a [`TouchEvent`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TouchPointState {
    Pressed,
    Moved,
    Stationary,
    Released,
    Cancelled,
}

/// An opaque identifier for a touch point.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TouchId(pub i32);

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct TouchPoint {
    pub id: TouchId,
    pub state: TouchPointState,
    pub point: DevicePoint,
}

impl TouchPoint {
    pub fn new(id: TouchId, state: TouchPointState, point: DevicePoint) -> Self {
        TouchPoint { id, state, point }
    }
}

/// A multi-touch event. Every point in the sequence is reported, including
/// the ones that did not change.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TouchEvent {
    pub points: Vec<TouchPoint>,
    pub time_stamp: f64,
}

impl TouchEvent {
    pub fn new(points: Vec<TouchPoint>, time_stamp: f64) -> Self {
        TouchEvent { points, time_stamp }
    }

    /// Iterate over the points that came in contact with the screen with this event.
    pub fn pressed_points(&self) -> impl Iterator<Item = &TouchPoint> {
        self.points
            .iter()
            .filter(|point| point.state == TouchPointState::Pressed)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct MouseMoveEvent {
    pub point: DevicePoint,
    pub modifiers: Modifiers,
    pub time_stamp: f64,
}

impl MouseMoveEvent {
    pub fn new(point: DevicePoint, time_stamp: f64) -> Self {
        Self {
            point,
            modifiers: Modifiers::empty(),
            time_stamp,
        }
    }
}
