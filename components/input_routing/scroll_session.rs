/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use input_routing_api::{
    DevicePoint, DeviceVector2D, EventDisposition, GestureSourceDevice, ScrollEngine,
    ScrollInputType, ScrollStatus, WheelEvent,
};
use log::{debug, error, trace};

/// Tracks whether the compositor thread owns the scroll or pinch gesture in
/// progress.
#[derive(Debug, Default)]
pub(crate) struct ScrollSession {
    /// A gesture scroll was started on the compositor thread and has not ended.
    pub(crate) gesture_scroll_active: bool,
    /// A pinch was started on the compositor thread and has not ended.
    pub(crate) gesture_pinch_active: bool,
    /// Gesture streams from different devices may interleave, for instance when
    /// a scroll begin held back during a deferred fling cancel is replayed just
    /// before another device's begin. Pairing is therefore checked per device.
    expect_scroll_end: PendingScrollEnds,
}

/// Set between a `GestureScrollBegin` and the `GestureScrollEnd` (or fling)
/// that finishes it, regardless of which thread handles the scroll.
#[derive(Debug, Default)]
struct PendingScrollEnds {
    touchpad: bool,
    touchscreen: bool,
}

impl PendingScrollEnds {
    fn for_device(&mut self, device: GestureSourceDevice) -> &mut bool {
        match device {
            GestureSourceDevice::Touchpad => &mut self.touchpad,
            GestureSourceDevice::Touchscreen => &mut self.touchscreen,
        }
    }
}

impl ScrollSession {
    pub(crate) fn begin_scroll(
        &mut self,
        engine: &mut dyn ScrollEngine,
        device: GestureSourceDevice,
        point: DevicePoint,
        input_type: ScrollInputType,
    ) -> EventDisposition {
        let expect_scroll_end = self.expect_scroll_end.for_device(device);
        debug_assert!(
            !*expect_scroll_end,
            "Gesture scroll began before the previous one ended"
        );
        *expect_scroll_end = true;

        match engine.scroll_begin(point, input_type) {
            ScrollStatus::Started => {
                debug!("Gesture scroll started on the compositor thread");
                self.gesture_scroll_active = true;
                EventDisposition::Handled
            },
            ScrollStatus::Ignored => EventDisposition::Dropped,
            ScrollStatus::OnMainThread | ScrollStatus::Unknown => EventDisposition::NotHandled,
            status => unexpected_scroll_status(status),
        }
    }

    /// Scroll by `delta`, given in the screen convention.
    pub(crate) fn update_scroll(
        &mut self,
        engine: &mut dyn ScrollEngine,
        device: GestureSourceDevice,
        point: DevicePoint,
        delta: DeviceVector2D,
    ) -> EventDisposition {
        debug_assert!(
            *self.expect_scroll_end.for_device(device),
            "Gesture scroll update outside of a scroll"
        );
        if !self.gesture_scroll_active && !self.gesture_pinch_active {
            return EventDisposition::NotHandled;
        }

        if engine.scroll_by(point, -delta) {
            EventDisposition::Handled
        } else {
            EventDisposition::Dropped
        }
    }

    pub(crate) fn end_scroll(
        &mut self,
        engine: &mut dyn ScrollEngine,
        device: GestureSourceDevice,
    ) -> EventDisposition {
        let expect_scroll_end = self.expect_scroll_end.for_device(device);
        debug_assert!(
            *expect_scroll_end,
            "Gesture scroll ended without a matching begin"
        );
        *expect_scroll_end = false;

        engine.scroll_end();
        if !self.gesture_scroll_active {
            return EventDisposition::NotHandled;
        }
        self.gesture_scroll_active = false;
        EventDisposition::Handled
    }

    /// A fling takes over the gesture scroll, so no `GestureScrollEnd` will follow.
    pub(crate) fn fling_started(&mut self, device: GestureSourceDevice) {
        *self.expect_scroll_end.for_device(device) = false;
    }

    pub(crate) fn begin_pinch(&mut self, engine: &mut dyn ScrollEngine) -> EventDisposition {
        debug_assert!(!self.gesture_pinch_active, "Nested pinch gesture");
        engine.pinch_gesture_begin();
        self.gesture_pinch_active = true;
        EventDisposition::Handled
    }

    pub(crate) fn update_pinch(
        &mut self,
        engine: &mut dyn ScrollEngine,
        scale: f32,
        anchor: DevicePoint,
    ) -> EventDisposition {
        debug_assert!(self.gesture_pinch_active, "Pinch update outside of a pinch");
        engine.pinch_gesture_update(scale, anchor);
        EventDisposition::Handled
    }

    pub(crate) fn end_pinch(&mut self, engine: &mut dyn ScrollEngine) -> EventDisposition {
        debug_assert!(self.gesture_pinch_active, "Pinch ended without a matching begin");
        self.gesture_pinch_active = false;
        engine.pinch_gesture_end();
        EventDisposition::Handled
    }
}

/// Scroll for a single wheel event. A wheel is a complete scroll session of
/// its own, so this does not touch the gesture state.
pub(crate) fn scroll_wheel(engine: &mut dyn ScrollEngine, wheel: &WheelEvent) -> EventDisposition {
    trace!(
        "Wheel scroll by {:?} (precise deltas: {})",
        wheel.delta, wheel.has_precise_scrolling_deltas
    );
    match engine.scroll_begin(wheel.point, ScrollInputType::Wheel) {
        ScrollStatus::Started => {
            let did_scroll = engine.scroll_by(wheel.point, -wheel.delta);
            engine.scroll_end();
            if did_scroll {
                EventDisposition::Handled
            } else {
                EventDisposition::Dropped
            }
        },
        // Nothing scrollable according to the compositor, but its view of
        // scrollability can lag behind the main thread, which gets to decide.
        ScrollStatus::Ignored => EventDisposition::NotHandled,
        ScrollStatus::OnMainThread | ScrollStatus::Unknown => EventDisposition::NotHandled,
        status => unexpected_scroll_status(status),
    }
}

pub(crate) fn unexpected_scroll_status(status: ScrollStatus) -> EventDisposition {
    debug_assert!(false, "Unexpected scroll status: {status:?}");
    error!("Unexpected scroll status {status:?}, deferring to the main thread");
    EventDisposition::NotHandled
}
