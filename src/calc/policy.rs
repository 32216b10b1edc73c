use serde::{Deserialize, Serialize};

/// How a graded component's score feeds the subject numerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeightingScheme {
    /// `min(score, weight)` over `weight`: the component weight is a points cap.
    #[default]
    PointsCapped,
    /// `min(score, 100) * weight / 100`: the score is already a percentage.
    Percentage,
}

impl WeightingScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            WeightingScheme::PointsCapped => "pointsCapped",
            WeightingScheme::Percentage => "percentage",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "pointsCapped" => Some(WeightingScheme::PointsCapped),
            "percentage" => Some(WeightingScheme::Percentage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct AggregationPolicy {
    pub scheme: WeightingScheme,
    /// Ungraded components still count their weight as possible work.
    pub include_ungraded: bool,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            scheme: WeightingScheme::PointsCapped,
            include_ungraded: true,
        }
    }
}

impl AggregationPolicy {
    /// Apply a camelCase JSON patch on top of `self`.
    pub fn merge_patch(
        &mut self,
        patch: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), String> {
        for (k, v) in patch {
            match k.as_str() {
                "scheme" => {
                    let Some(s) = v.as_str() else {
                        return Err("scheme must be a string".to_string());
                    };
                    let Some(scheme) = WeightingScheme::parse(s) else {
                        return Err(format!(
                            "scheme must be one of: pointsCapped, percentage (got {})",
                            s
                        ));
                    };
                    self.scheme = scheme;
                }
                "includeUngraded" => {
                    let Some(b) = v.as_bool() else {
                        return Err("includeUngraded must be a boolean".to_string());
                    };
                    self.include_ungraded = b;
                }
                _ => return Err(format!("unknown policy field: {}", k)),
            }
        }
        Ok(())
    }
}

/// Round-half-up to 2 decimals: `Int(100*x + 0.5) / 100`.
///
/// The tolerance is a few ULPs of the scaled value: enough that `1.005`,
/// stored a hair below the half, still rounds up, but a value genuinely below
/// the half never does.
pub fn round_half_up_2(x: f64) -> f64 {
    let scaled = 100.0 * x;
    (scaled + 0.5 + scaled.abs() * f64::EPSILON * 4.0).floor() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_half_up_2_matches_hand_rounding() {
        assert_eq!(round_half_up_2(0.0), 0.0);
        assert_eq!(round_half_up_2(90.0), 90.0);
        assert_eq!(round_half_up_2(66.666_666), 66.67);
        assert_eq!(round_half_up_2(33.333_333), 33.33);
        assert_eq!(round_half_up_2(80.125), 80.13);
        assert_eq!(round_half_up_2(1.005), 1.01);
        assert_eq!(round_half_up_2(89.994), 89.99);
    }

    #[test]
    fn values_just_below_the_half_round_down() {
        assert_eq!(round_half_up_2(89.994_999_999_995), 89.99);
        assert_eq!(round_half_up_2(89.995), 90.0);
        assert_eq!(round_half_up_2(59.994_999_999_9), 59.99);
        assert_eq!(round_half_up_2(66.665), 66.67);
    }

    #[test]
    fn default_policy_is_points_capped_including_ungraded() {
        let p = AggregationPolicy::default();
        assert_eq!(p.scheme, WeightingScheme::PointsCapped);
        assert!(p.include_ungraded);

        let parsed: AggregationPolicy = serde_json::from_value(json!({})).expect("parse");
        assert_eq!(parsed, p);
    }

    #[test]
    fn policy_deserializes_camel_case_fields() {
        let parsed: AggregationPolicy = serde_json::from_value(json!({
            "scheme": "percentage",
            "includeUngraded": false
        }))
        .expect("parse");
        assert_eq!(parsed.scheme, WeightingScheme::Percentage);
        assert!(!parsed.include_ungraded);

        let bad = serde_json::from_value::<AggregationPolicy>(json!({ "weights": 1 }));
        assert!(bad.is_err());
    }

    #[test]
    fn merge_patch_rejects_unknown_and_mistyped_fields() {
        let mut p = AggregationPolicy::default();
        let patch = json!({ "includeUngraded": false });
        p.merge_patch(patch.as_object().expect("obj")).expect("merge");
        assert!(!p.include_ungraded);
        assert_eq!(p.scheme, WeightingScheme::PointsCapped);

        let bad_scheme = json!({ "scheme": "curve" });
        assert!(p.merge_patch(bad_scheme.as_object().expect("obj")).is_err());

        let bad_type = json!({ "includeUngraded": "yes" });
        assert!(p.merge_patch(bad_type.as_object().expect("obj")).is_err());

        let unknown = json!({ "roff": true });
        assert!(p.merge_patch(unknown.as_object().expect("obj")).is_err());
    }
}
