//! Authored easing curves
//!
//! A [`Curve`] maps normalized tween time (0.0 to 1.0) to eased progress.
//! It is either a named [`Easing`] or a list of keys interpolated piecewise.
//! Keyed curves need not end at 1.0: a return curve ending at 0.99 stops just
//! short of its destination, which is why cue drivers force-assign exact rest
//! values once a return completes.

use crate::easing::Easing;
use serde::{Deserialize, Serialize};

/// A key on a [`Curve`]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    /// Normalized time (0.0 to 1.0)
    pub time: f32,
    /// Progress at this key
    pub value: f32,
    /// Easing used when travelling TO this key
    #[serde(default)]
    pub easing: Easing,
}

impl CurveKey {
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            easing: Easing::Linear,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// Easing curve applied to a tween
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Curve {
    Easing(Easing),
    Keys(Vec<CurveKey>),
}

impl Default for Curve {
    fn default() -> Self {
        Curve::Easing(Easing::Linear)
    }
}

impl From<Easing> for Curve {
    fn from(easing: Easing) -> Self {
        Curve::Easing(easing)
    }
}

impl Curve {
    /// Build a keyed curve; keys are sorted by time
    pub fn keys(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Curve::Keys(keys)
    }

    /// Two-key linear curve from `(0, start)` to `(1, end)`
    pub fn linear(start: f32, end: f32) -> Self {
        Curve::Keys(vec![CurveKey::new(0.0, start), CurveKey::new(1.0, end)])
    }

    /// True when keys are present and sorted by time
    pub fn is_well_formed(&self) -> bool {
        match self {
            Curve::Easing(_) => true,
            Curve::Keys(keys) => {
                !keys.is_empty()
                    && keys.iter().all(|k| k.time.is_finite() && k.value.is_finite())
                    && keys.windows(2).all(|w| w[0].time <= w[1].time)
            }
        }
    }

    /// Eased progress at normalized time `t`
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let keys = match self {
            Curve::Easing(easing) => return easing.apply(t),
            Curve::Keys(keys) => keys,
        };

        let (first, last) = match (keys.first(), keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return t,
        };

        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        for pair in keys.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if t >= a.time && t <= b.time {
                let span = b.time - a.time;
                if span <= 0.0 {
                    return b.value;
                }
                let local = b.easing.apply((t - a.time) / span);
                return a.value + (b.value - a.value) * local;
            }
        }

        last.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_curve() {
        let curve = Curve::from(Easing::EaseIn);
        assert!((curve.evaluate(0.5) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_keyed_curve_stops_short() {
        let curve = Curve::linear(0.0, 0.99);
        assert!((curve.evaluate(1.0) - 0.99).abs() < 1e-6);
        assert!((curve.evaluate(0.5) - 0.495).abs() < 1e-6);
    }

    #[test]
    fn test_keyed_curve_clamps_outside_keys() {
        let curve = Curve::keys(vec![CurveKey::new(0.2, 0.1), CurveKey::new(0.8, 0.9)]);
        assert_eq!(curve.evaluate(0.0), 0.1);
        assert_eq!(curve.evaluate(1.0), 0.9);
    }

    #[test]
    fn test_keys_are_sorted() {
        let curve = Curve::keys(vec![
            CurveKey::new(1.0, 1.0),
            CurveKey::new(0.0, 0.0),
            CurveKey::new(0.5, 0.8).with_easing(Easing::EaseOut),
        ]);
        assert!(curve.is_well_formed());
        assert!(curve.evaluate(0.25) > 0.4);
    }

    #[test]
    fn test_unsorted_keys_are_malformed() {
        let curve = Curve::Keys(vec![CurveKey::new(1.0, 1.0), CurveKey::new(0.0, 0.0)]);
        assert!(!curve.is_well_formed());
        assert!(!Curve::Keys(Vec::new()).is_well_formed());
    }

    #[test]
    fn test_deserialize_both_forms() {
        #[derive(Deserialize)]
        struct Doc {
            named: Curve,
            keyed: Curve,
        }

        let doc: Doc = toml::from_str(
            r#"
            named = "cubic_out"
            keyed = [{ time = 0.0, value = 0.0 }, { time = 1.0, value = 0.99, easing = "ease_in" }]
            "#,
        )
        .unwrap();

        assert_eq!(doc.named, Curve::Easing(Easing::CubicOut));
        match doc.keyed {
            Curve::Keys(keys) => {
                assert_eq!(keys.len(), 2);
                assert_eq!(keys[1].easing, Easing::EaseIn);
            }
            other => panic!("expected keys, got {:?}", other),
        }
    }
}
