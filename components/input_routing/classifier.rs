/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use input_routing_api::{GestureType, InputEvent};
use keyboard_types::Modifiers;

/// The routing category of an [`InputEvent`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventCategory {
    Wheel,
    GestureScrollBegin,
    GestureScrollUpdate,
    GestureScrollEnd,
    GesturePinchBegin,
    GesturePinchUpdate,
    GesturePinchEnd,
    GestureFlingStart,
    GestureFlingCancel,
    TouchStart,
    Keyboard,
    MouseMove,
    /// Never handled on the compositor thread.
    PassThrough,
}

/// Map an event to the category that drives its routing.
///
/// Page scrolls and control-wheel chords are `PassThrough`, since their
/// meaning (page steps, zoom shortcuts) is defined by the main thread.
pub fn classify(event: &InputEvent) -> EventCategory {
    match event {
        InputEvent::Wheel(wheel) => {
            if wheel.scroll_by_page || wheel.modifiers.contains(Modifiers::CONTROL) {
                EventCategory::PassThrough
            } else {
                EventCategory::Wheel
            }
        },
        InputEvent::Gesture(gesture) => match gesture.gesture {
            GestureType::ScrollBegin => EventCategory::GestureScrollBegin,
            GestureType::ScrollUpdate { .. } => EventCategory::GestureScrollUpdate,
            GestureType::ScrollEnd => EventCategory::GestureScrollEnd,
            GestureType::PinchBegin => EventCategory::GesturePinchBegin,
            GestureType::PinchUpdate { .. } => EventCategory::GesturePinchUpdate,
            GestureType::PinchEnd => EventCategory::GesturePinchEnd,
            GestureType::FlingStart { .. } => EventCategory::GestureFlingStart,
            GestureType::FlingCancel => EventCategory::GestureFlingCancel,
            GestureType::TapDown |
            GestureType::TapCancel |
            GestureType::Tap |
            GestureType::LongPress => EventCategory::PassThrough,
        },
        InputEvent::Touch(touch) => {
            if touch.pressed_points().next().is_some() {
                EventCategory::TouchStart
            } else {
                EventCategory::PassThrough
            }
        },
        InputEvent::Keyboard(..) => EventCategory::Keyboard,
        InputEvent::MouseMove(..) => EventCategory::MouseMove,
    }
}
