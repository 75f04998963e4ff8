/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::mem;

use input_routing_api::{
    AnimationCurveProvider, DeviceVector2D, DidOverscrollParams, EventDisposition,
    FlingParameters, GestureEvent, GestureSourceDevice, GestureType, InputEvent,
    InputHandlerClientMessage, InputHandlerClientProxy, ScrollEngine, ScrollInputType,
    ScrollStatus,
};
use log::{debug, trace, warn};

use crate::classifier::{EventCategory, classify};
use crate::fling::{
    Fling, FlingScrollTarget, FlingState, should_boost_fling,
    should_suppress_scroll_for_fling_boosting,
};
use crate::prefs::InputRoutingPreferences;
use crate::scroll_session::{ScrollSession, scroll_wheel, unexpected_scroll_status};

/// Routes input events on the compositor thread. Events that can be handled
/// without the main thread (scrolls, pinches, flings) are applied to the
/// [`ScrollEngine`] directly; everything else is reported as
/// [`EventDisposition::NotHandled`] for the caller to forward.
///
/// A proxy is owned and driven by a single thread. Notifications for the main
/// thread are sent through its [`InputHandlerClientProxy`].
pub struct InputHandlerProxy {
    /// `None` once [`InputHandlerProxy::will_shutdown`] was called.
    scroll_engine: Option<Box<dyn ScrollEngine>>,
    curve_provider: Box<dyn AnimationCurveProvider>,
    client: InputHandlerClientProxy,
    preferences: InputRoutingPreferences,
    scroll_session: ScrollSession,
    fling: FlingState,
    /// A fling was started on or transferred to the main thread and has not
    /// been reported as stopped yet.
    fling_may_be_active_on_main_thread: bool,
}

impl InputHandlerProxy {
    pub fn new(
        scroll_engine: Box<dyn ScrollEngine>,
        curve_provider: Box<dyn AnimationCurveProvider>,
        client: InputHandlerClientProxy,
    ) -> Self {
        Self::new_with_preferences(
            scroll_engine,
            curve_provider,
            client,
            InputRoutingPreferences::default(),
        )
    }

    pub fn new_with_preferences(
        scroll_engine: Box<dyn ScrollEngine>,
        curve_provider: Box<dyn AnimationCurveProvider>,
        client: InputHandlerClientProxy,
        preferences: InputRoutingPreferences,
    ) -> Self {
        Self {
            scroll_engine: Some(scroll_engine),
            curve_provider,
            client,
            preferences,
            scroll_session: ScrollSession::default(),
            fling: FlingState::Idle,
            fling_may_be_active_on_main_thread: false,
        }
    }

    /// Route a single input event and report what the caller should do with it.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "InputHandlerProxy::handle_event",
            skip_all,
            fields(servo_profiling = true),
            level = "trace",
        )
    )]
    pub fn handle_event(&mut self, event: InputEvent) -> EventDisposition {
        let category = classify(&event);
        if self.scroll_engine.is_none() {
            warn!("Received {category:?} input event after shutdown");
            return EventDisposition::NotHandled;
        }

        if let InputEvent::Gesture(gesture) = &event {
            if self.filter_for_boosting(gesture) {
                trace!("{category:?} absorbed by fling boosting");
                return EventDisposition::Handled;
            }
        }

        let disposition = self.route_event(category, &event);
        trace!("{category:?} at {:?} routed as {disposition:?}", event.point());
        disposition
    }

    fn route_event(&mut self, category: EventCategory, event: &InputEvent) -> EventDisposition {
        let Some(engine) = self.scroll_engine.as_deref_mut() else {
            return EventDisposition::NotHandled;
        };

        match (category, event) {
            (EventCategory::Wheel, InputEvent::Wheel(wheel)) => scroll_wheel(engine, wheel),
            (EventCategory::GestureScrollBegin, InputEvent::Gesture(gesture)) => self
                .scroll_session
                .begin_scroll(
                    engine,
                    gesture.source_device,
                    gesture.point,
                    ScrollInputType::Gesture,
                ),
            (EventCategory::GestureScrollUpdate, InputEvent::Gesture(gesture)) => {
                let GestureType::ScrollUpdate { delta } = gesture.gesture else {
                    return EventDisposition::NotHandled;
                };
                self.scroll_session
                    .update_scroll(engine, gesture.source_device, gesture.point, delta)
            },
            (EventCategory::GestureScrollEnd, InputEvent::Gesture(gesture)) => self
                .scroll_session
                .end_scroll(engine, gesture.source_device),
            (EventCategory::GesturePinchBegin, _) => self.scroll_session.begin_pinch(engine),
            (EventCategory::GesturePinchUpdate, InputEvent::Gesture(gesture)) => {
                let GestureType::PinchUpdate { scale } = gesture.gesture else {
                    return EventDisposition::NotHandled;
                };
                self.scroll_session
                    .update_pinch(engine, scale, gesture.point)
            },
            (EventCategory::GesturePinchEnd, _) => self.scroll_session.end_pinch(engine),
            (EventCategory::GestureFlingStart, InputEvent::Gesture(gesture)) => {
                let GestureType::FlingStart { velocity } = gesture.gesture else {
                    return EventDisposition::NotHandled;
                };
                self.start_fling(gesture, velocity)
            },
            (EventCategory::GestureFlingCancel, _) => {
                if self.cancel_current_fling() {
                    EventDisposition::Handled
                } else if !self.fling_may_be_active_on_main_thread {
                    EventDisposition::Dropped
                } else {
                    EventDisposition::NotHandled
                }
            },
            (EventCategory::TouchStart, InputEvent::Touch(touch)) => {
                if touch
                    .pressed_points()
                    .any(|point| engine.have_touch_event_handlers_at(point.point))
                {
                    EventDisposition::NotHandled
                } else {
                    EventDisposition::Dropped
                }
            },
            (EventCategory::Keyboard, _) => {
                // Any key press stops a fling, the main thread decides what
                // the key does.
                self.cancel_current_fling();
                EventDisposition::NotHandled
            },
            (EventCategory::MouseMove, InputEvent::MouseMove(mouse_move)) => {
                engine.mouse_move_at(mouse_move.point);
                EventDisposition::NotHandled
            },
            _ => EventDisposition::NotHandled,
        }
    }

    fn start_fling(&mut self, gesture: &GestureEvent, velocity: DeviceVector2D) -> EventDisposition {
        let Some(engine) = self.scroll_engine.as_deref_mut() else {
            return EventDisposition::NotHandled;
        };

        let status = match gesture.source_device {
            GestureSourceDevice::Touchpad => {
                engine.scroll_begin(gesture.point, ScrollInputType::NonBubblingGesture)
            },
            GestureSourceDevice::Touchscreen => {
                if self.scroll_session.gesture_scroll_active {
                    engine.fling_scroll_begin()
                } else {
                    ScrollStatus::OnMainThread
                }
            },
        };
        self.scroll_session.fling_started(gesture.source_device);

        match status {
            ScrollStatus::Started => {
                if gesture.source_device == GestureSourceDevice::Touchpad {
                    engine.scroll_end();
                }
                if self.fling.fling().is_some() {
                    debug!("Replacing the active fling");
                    self.client.send(InputHandlerClientMessage::DidStopFlinging);
                }

                let parameters = FlingParameters {
                    start_time: gesture.time_stamp,
                    delta: velocity,
                    point: gesture.point,
                    global_point: gesture.global_point,
                    modifiers: gesture.modifiers,
                    source_device: gesture.source_device,
                    cumulative_scroll: DeviceVector2D::zero(),
                };
                let curve = self.curve_provider.create_fling_curve(
                    gesture.source_device,
                    velocity,
                    DeviceVector2D::zero(),
                );
                debug!(
                    "Started {:?} fling at {velocity:?}",
                    gesture.source_device
                );
                self.fling = FlingState::Active(Fling::new(curve, parameters, velocity));
                engine.set_needs_animate();
                self.client.send(InputHandlerClientMessage::DidStartFlinging);
                EventDisposition::Handled
            },
            ScrollStatus::Ignored => match gesture.source_device {
                // The main thread may still find something to scroll with
                // the wheels of a touchpad fling.
                GestureSourceDevice::Touchpad => EventDisposition::NotHandled,
                GestureSourceDevice::Touchscreen => EventDisposition::Dropped,
            },
            ScrollStatus::OnMainThread | ScrollStatus::Unknown => {
                self.fling_may_be_active_on_main_thread = true;
                EventDisposition::NotHandled
            },
            status => unexpected_scroll_status(status),
        }
    }

    /// Decide whether `gesture` is absorbed by an active fling, either to
    /// hold back its cancellation or to boost it. Returns true if the event
    /// must not be routed any further.
    fn filter_for_boosting(&mut self, gesture: &GestureEvent) -> bool {
        let Some(fling) = self.fling.fling() else {
            return false;
        };
        let fling_velocity = fling.velocity;
        let fling_device = fling.parameters.source_device;
        let fling_modifiers = fling.parameters.modifiers;

        if gesture.gesture == GestureType::FlingCancel {
            if !self.preferences.fling_boosting_enabled {
                return false;
            }
            let min_speed = self.preferences.min_boost_fling_speed;
            if fling_velocity.square_length() < min_speed * min_speed {
                return false;
            }
            trace!("Deferring fling cancel");
            self.fling
                .defer_cancel(gesture.time_stamp + self.preferences.fling_boost_timeout_seconds);
            return true;
        }

        let FlingState::DeferredCancel {
            last_boost_event, ..
        } = &self.fling
        else {
            return false;
        };
        let last_boost_time = last_boost_event.as_ref().map(|event| event.time_stamp);

        if gesture.source_device != fling_device {
            self.cancel_current_fling();
            return false;
        }

        match gesture.gesture {
            GestureType::TapDown | GestureType::TapCancel => false,
            GestureType::ScrollBegin => {
                let input_type = match fling_device {
                    GestureSourceDevice::Touchpad => ScrollInputType::NonBubblingGesture,
                    GestureSourceDevice::Touchscreen => ScrollInputType::Gesture,
                };
                let same_layer = self
                    .scroll_engine
                    .as_deref()
                    .is_some_and(|engine| engine.is_currently_scrolling_layer_at(gesture.point, input_type));
                if !same_layer {
                    self.cancel_current_fling();
                    return false;
                }
                self.extend_boosted_fling_timeout(gesture);
                true
            },
            GestureType::ScrollUpdate { delta } => {
                let time_since_last_boost_event =
                    gesture.time_stamp - last_boost_time.unwrap_or(0.);
                if !should_suppress_scroll_for_fling_boosting(
                    fling_velocity,
                    delta,
                    time_since_last_boost_event,
                    self.preferences.min_boost_touch_scroll_speed,
                ) {
                    self.cancel_current_fling();
                    return false;
                }
                self.extend_boosted_fling_timeout(gesture);
                true
            },
            GestureType::ScrollEnd => {
                // The scroll that would have boosted the fling ended without
                // one, so nothing is left to replay.
                self.fling.clear_last_boost_event();
                self.cancel_current_fling();
                true
            },
            GestureType::FlingStart { velocity } => {
                let boost = gesture.modifiers == fling_modifiers &&
                    should_boost_fling(
                        fling_velocity,
                        velocity,
                        self.preferences.min_boost_fling_speed,
                    );
                self.restart_fling(gesture, velocity, boost);
                true
            },
            _ => {
                self.cancel_current_fling();
                false
            },
        }
    }

    fn extend_boosted_fling_timeout(&mut self, gesture: &GestureEvent) {
        self.fling.extend_deferred_cancel(
            *gesture,
            gesture.time_stamp + self.preferences.fling_boost_timeout_seconds,
        );
    }

    /// Replace the curve of the current fling with one for a new fling
    /// gesture, adding the current velocity when `boost` is set.
    fn restart_fling(&mut self, gesture: &GestureEvent, velocity: DeviceVector2D, boost: bool) {
        let (FlingState::Active(fling) | FlingState::DeferredCancel { fling, .. }) =
            mem::take(&mut self.fling)
        else {
            return;
        };

        let velocity = if boost {
            debug!("Boosting fling from {:?} by {velocity:?}", fling.velocity);
            fling.velocity + velocity
        } else {
            debug!("Replacing fling with a new one at {velocity:?}");
            velocity
        };

        let mut parameters = fling.parameters;
        parameters.start_time = gesture.time_stamp;
        parameters.delta = velocity;
        parameters.point = gesture.point;
        parameters.global_point = gesture.global_point;

        let curve = self.curve_provider.create_fling_curve(
            parameters.source_device,
            velocity,
            DeviceVector2D::zero(),
        );
        self.fling = FlingState::Active(Fling::new(curve, parameters, velocity));
        if let Some(engine) = self.scroll_engine.as_deref_mut() {
            engine.set_needs_animate();
        }
        self.client.send(InputHandlerClientMessage::DidStopFlinging);
        self.client.send(InputHandlerClientMessage::DidStartFlinging);
    }

    /// Advance the active fling to frame time `time`, in seconds.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "InputHandlerProxy::animate",
            skip_all,
            fields(servo_profiling = true),
            level = "trace",
        )
    )]
    pub fn animate(&mut self, time: f64) {
        let Some(engine) = self.scroll_engine.as_deref_mut() else {
            return;
        };
        let (fling, deadline) = match &mut self.fling {
            FlingState::Idle => return,
            FlingState::Active(fling) => (fling, None),
            FlingState::DeferredCancel {
                fling, deadline, ..
            } => (fling, Some(*deadline)),
        };

        if deadline.is_some_and(|deadline| time > deadline) {
            debug!("No gesture boosted the fling in time, cancelling it");
            self.cancel_current_fling();
            return;
        }

        if !fling.has_started {
            fling.has_started = true;
            // The gesture timestamp is only trusted if the first frame comes
            // shortly after it. Otherwise the fling starts on this frame.
            let start_time = fling.parameters.start_time;
            let max_delay = self
                .preferences
                .max_seconds_from_fling_timestamp_to_first_animate;
            if start_time == 0. || time <= start_time || time > start_time + max_delay {
                trace!("Starting fling animation at {time}");
                fling.parameters.start_time = time;
                engine.set_needs_animate();
                return;
            }
        }

        let axes = fling.axes;
        let elapsed = time - fling.parameters.start_time;
        let Fling {
            curve,
            parameters,
            velocity,
            ..
        } = fling;
        let mut target = FlingScrollTarget::new(parameters, velocity, axes, engine, time);
        let fling_is_active = curve.apply(elapsed, &mut target) && axes.any_allowed();

        if let Some(parameters) = target.take_transfer() {
            debug!("Transferring touchpad fling to the main thread");
            self.client
                .send(InputHandlerClientMessage::TransferActiveWheelFlingAnimation(parameters));
            self.fling_may_be_active_on_main_thread = true;
            self.cancel_current_fling_without_notifying_client();
            return;
        }

        if fling_is_active {
            if let Some(engine) = self.scroll_engine.as_deref_mut() {
                engine.set_needs_animate();
            }
        } else {
            debug!("Fling finished");
            self.cancel_current_fling();
        }
    }

    /// Report that the content could not absorb a scroll. Fling axes that ran
    /// into an edge stop moving.
    pub fn did_overscroll(
        &mut self,
        accumulated_overscroll: DeviceVector2D,
        latest_overscroll_delta: DeviceVector2D,
    ) {
        let threshold = self.preferences.fling_overscroll_threshold;
        let current_fling_velocity = match self.fling.fling_mut() {
            Some(fling) => {
                fling
                    .axes
                    .disallow_for_overscroll(accumulated_overscroll, threshold);
                fling.velocity
            },
            None => DeviceVector2D::zero(),
        };
        self.client
            .send(InputHandlerClientMessage::DidOverscroll(DidOverscrollParams {
                accumulated_overscroll,
                latest_overscroll_delta,
                current_fling_velocity,
            }));
    }

    /// The main thread finished a fling it started or took over.
    pub fn main_thread_has_stopped_flinging(&mut self) {
        self.fling_may_be_active_on_main_thread = false;
        self.client.send(InputHandlerClientMessage::DidStopFlinging);
    }

    /// Release the scroll engine. Events received afterwards are not handled.
    pub fn will_shutdown(&mut self) {
        debug_assert!(
            self.scroll_engine.is_some(),
            "Input handler proxy shut down twice"
        );
        self.fling = FlingState::Idle;
        self.scroll_engine = None;
    }

    /// Cancel the current fling and notify the client if there was one.
    /// Returns whether a fling was cancelled.
    pub fn cancel_current_fling(&mut self) -> bool {
        let had_fling = self.cancel_current_fling_without_notifying_client();
        if had_fling {
            self.client.send(InputHandlerClientMessage::DidStopFlinging);
        }
        had_fling
    }

    fn cancel_current_fling_without_notifying_client(&mut self) -> bool {
        let (fling, last_boost_event) = match mem::take(&mut self.fling) {
            FlingState::Idle => (None, None),
            FlingState::Active(fling) => (Some(fling), None),
            FlingState::DeferredCancel {
                fling,
                last_boost_event,
                ..
            } => (Some(fling), last_boost_event),
        };
        let had_fling = fling.is_some();

        if let Some(fling) = fling {
            debug!("Cancelling {:?} fling", fling.parameters.source_device);
            if fling.parameters.source_device == GestureSourceDevice::Touchscreen {
                if let Some(engine) = self.scroll_engine.as_deref_mut() {
                    engine.scroll_end();
                }
            }
        }
        self.scroll_session.gesture_scroll_active = false;

        // A scroll that was absorbed while waiting for a boost still has to
        // happen, so replay its start.
        if let Some(event) = last_boost_event {
            if matches!(
                event.gesture,
                GestureType::ScrollBegin | GestureType::ScrollUpdate { .. }
            ) {
                trace!("Replaying scroll begin absorbed by fling boosting");
                self.handle_event(InputEvent::Gesture(event.to_scroll_begin()));
            }
        }

        had_fling
    }

    pub fn preferences(&self) -> &InputRoutingPreferences {
        &self.preferences
    }

    pub fn has_active_fling(&self) -> bool {
        self.fling.fling().is_some()
    }

    pub fn is_fling_cancel_deferred(&self) -> bool {
        self.fling.is_cancel_deferred()
    }

    /// The velocity of the active fling, as of its latest animation frame.
    pub fn current_fling_velocity(&self) -> Option<DeviceVector2D> {
        self.fling.fling().map(|fling| fling.velocity)
    }

    pub fn fling_parameters(&self) -> Option<FlingParameters> {
        self.fling.fling().map(|fling| fling.parameters)
    }

    pub fn fling_may_be_active_on_main_thread(&self) -> bool {
        self.fling_may_be_active_on_main_thread
    }

    pub fn is_gesture_scroll_active(&self) -> bool {
        self.scroll_session.gesture_scroll_active
    }

    pub fn is_gesture_pinch_active(&self) -> bool {
        self.scroll_session.gesture_pinch_active
    }
}
