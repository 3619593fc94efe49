//! Optional profile metadata at the head of the document.

use crate::element::Element;
use crate::error::{MltError, Result};
use serde_json::Value;

/// Broadcast rates that must map onto their exact NTSC fractions rather
/// than a rounded decimal.
const NTSC_RATES: &[(f64, i64)] = &[
    (23.976, 24_000),
    (29.97, 30_000),
    (47.952, 48_000),
    (59.94, 60_000),
    (119.88, 120_000),
];

const NTSC_TOLERANCE: f64 = 0.01;

/// Frame rate as an exact numerator/denominator pair. NTSC-family rates
/// match within a small tolerance, integral rates stay over 1, anything
/// else is rounded to thousandths.
pub fn frame_rate_fraction(rate: f64) -> (i64, i64) {
    for &(nominal, num) in NTSC_RATES {
        if (rate - nominal).abs() < NTSC_TOLERANCE {
            return (num, 1001);
        }
    }
    if (rate - rate.round()).abs() < 1e-9 {
        (rate.round() as i64, 1)
    } else {
        ((rate * 1000.0).round() as i64, 1000)
    }
}

/// Caller-supplied profile configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileSetting {
    /// Derive `frame_rate_num`/`frame_rate_den` from a rate.
    Rate(f64),
    /// Explicit profile attributes, emitted in the given order.
    Properties(Vec<(String, String)>),
}

impl ProfileSetting {
    /// Interpret a loosely-typed override: a number is a frame rate, an
    /// object is an explicit attribute map. Anything else is rejected.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(ProfileSetting::Rate)
                .ok_or_else(|| {
                    MltError::InvalidConfiguration("profile rate is not a finite number".into())
                }),
            Value::Object(map) => {
                let mut pairs = Vec::with_capacity(map.len());
                for (key, value) in map {
                    let text = match value {
                        Value::String(s) => s.clone(),
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        other => {
                            return Err(MltError::InvalidConfiguration(format!(
                                "profile property `{key}` must be a scalar, got {other}"
                            )))
                        }
                    };
                    pairs.push((key.clone(), text));
                }
                Ok(ProfileSetting::Properties(pairs))
            }
            other => Err(MltError::InvalidConfiguration(format!(
                "expected a frame rate or a property map, got {other}"
            ))),
        }
    }

    pub fn to_element(&self) -> Element {
        match self {
            ProfileSetting::Rate(rate) => {
                let (num, den) = frame_rate_fraction(*rate);
                Element::new("profile")
                    .attr("frame_rate_num", num.to_string())
                    .attr("frame_rate_den", den.to_string())
            }
            ProfileSetting::Properties(pairs) => {
                let mut element = Element::new("profile");
                for (key, value) in pairs {
                    element = element.attr(key.as_str(), value.as_str());
                }
                element
            }
        }
    }
}

/// Options accepted by the conversion entry point.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Profile override; without one a timeline's global start supplies
    /// the rate, and other inputs emit no profile at all.
    pub profile: Option<ProfileSetting>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ntsc_rates_match_within_tolerance() {
        assert_eq!(frame_rate_fraction(23.976), (24_000, 1001));
        assert_eq!(frame_rate_fraction(23.976023976023978), (24_000, 1001));
        assert_eq!(frame_rate_fraction(29.97), (30_000, 1001));
        assert_eq!(frame_rate_fraction(59.94), (60_000, 1001));
    }

    #[test]
    fn integral_rates_stay_over_one() {
        assert_eq!(frame_rate_fraction(24.0), (24, 1));
        assert_eq!(frame_rate_fraction(25.0), (25, 1));
        assert_eq!(frame_rate_fraction(60.0), (60, 1));
    }

    #[test]
    fn other_rates_round_to_thousandths() {
        assert_eq!(frame_rate_fraction(12.5), (12_500, 1000));
    }

    #[test]
    fn rate_override_from_number() {
        let setting = ProfileSetting::from_json(&json!(29.97)).unwrap();
        let element = setting.to_element();
        assert_eq!(element.get_attr("frame_rate_num"), Some("30000"));
        assert_eq!(element.get_attr("frame_rate_den"), Some("1001"));
    }

    #[test]
    fn property_override_from_object() {
        let setting = ProfileSetting::from_json(&json!({
            "description": "HD 1080p 25 fps",
            "width": 1920,
            "progressive": true,
        }))
        .unwrap();
        let element = setting.to_element();
        assert_eq!(element.get_attr("description"), Some("HD 1080p 25 fps"));
        assert_eq!(element.get_attr("width"), Some("1920"));
        assert_eq!(element.get_attr("progressive"), Some("true"));
    }

    #[test]
    fn malformed_override_is_rejected() {
        let err = ProfileSetting::from_json(&json!("29.97")).unwrap_err();
        assert!(matches!(err, MltError::InvalidConfiguration(_)));

        let err = ProfileSetting::from_json(&json!({ "nested": [1, 2] })).unwrap_err();
        assert!(matches!(err, MltError::InvalidConfiguration(_)));
    }
}
