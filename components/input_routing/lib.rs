/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Compositor-thread input routing. [`InputHandlerProxy`] decides for each
//! input event whether it can be handled without the main thread, drives
//! scroll and pinch gestures and animates flings.

#![deny(unsafe_code)]

mod classifier;
mod curve;
mod fling;
mod input_handler_proxy;
mod prefs;
mod scroll_session;

pub use crate::classifier::{EventCategory, classify};
pub use crate::curve::{DecayFlingCurve, DefaultAnimationCurveProvider};
pub use crate::input_handler_proxy::InputHandlerProxy;
pub use crate::prefs::InputRoutingPreferences;
