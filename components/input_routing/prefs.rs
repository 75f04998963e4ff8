/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use serde::{Deserialize, Serialize};

/// Tuning of fling handling on the compositor thread. Times are in seconds,
/// speeds in device pixels per second and distances in device pixels.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct InputRoutingPreferences {
    /// Whether gestures following a fling may extend it instead of cancelling it.
    pub fling_boosting_enabled: bool,
    /// How long a fling cancel is held back waiting for a boosting gesture.
    pub fling_boost_timeout_seconds: f64,
    /// Flings slower than this are cancelled right away, and cannot be boosted
    /// by a fling slower than this.
    pub min_boost_fling_speed: f32,
    /// Scroll updates slower than this cancel a boostable fling.
    pub min_boost_touch_scroll_speed: f32,
    /// The longest delay between a fling gesture and the first animation frame
    /// for which the gesture timestamp is trusted as the fling start time.
    pub max_seconds_from_fling_timestamp_to_first_animate: f64,
    /// Overscroll along an axis at which a fling stops moving along it.
    pub fling_overscroll_threshold: f32,
}

impl Default for InputRoutingPreferences {
    fn default() -> Self {
        Self {
            fling_boosting_enabled: true,
            fling_boost_timeout_seconds: 0.045,
            min_boost_fling_speed: 350.,
            min_boost_touch_scroll_speed: 150.,
            max_seconds_from_fling_timestamp_to_first_animate: 2. / 60.,
            fling_overscroll_threshold: 1.,
        }
    }
}

impl InputRoutingPreferences {
    /// Parse preferences from a JSON object. Missing fields keep their default value.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let preferences = InputRoutingPreferences::from_json(
            r#"{ "fling_boosting_enabled": false, "min_boost_fling_speed": 500.0 }"#,
        )
        .unwrap();
        assert!(!preferences.fling_boosting_enabled);
        assert_eq!(preferences.min_boost_fling_speed, 500.);
        assert_eq!(preferences.fling_boost_timeout_seconds, 0.045);
        assert_eq!(preferences.fling_overscroll_threshold, 1.);
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(
            InputRoutingPreferences::from_json("{}").unwrap(),
            InputRoutingPreferences::default()
        );
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(InputRoutingPreferences::from_json(r#"{ "fling_boosting_enabled": 3 }"#).is_err());
        assert!(InputRoutingPreferences::from_json("[").is_err());
    }
}
