//! Rule-source parsing.
//!
//! The text-to-rule interpreter returns free text that should contain a JSON
//! rule set, often wrapped in markdown code fences or surrounded by prose.
//! [`extract_rule_set`] recovers the JSON object; [`normalize_rule`] turns
//! each side into a [`Rule`] without ever failing on its content.

use crate::domain::error::PhoenixError;
use crate::domain::rule::{Condition, Indicator, MovingAverage, Rule, RuleSet};
use serde_json::{Map, Value};

/// Extract and normalize a rule set from interpreter output.
///
/// Fails only when no JSON object can be recovered from `text`.
pub fn extract_rule_set(text: &str) -> Result<RuleSet, PhoenixError> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let value = match serde_json::from_str::<Value>(cleaned) {
        Ok(v) => v,
        Err(direct_err) => {
            let span = outermost_object(cleaned).ok_or_else(|| PhoenixError::RuleSource {
                reason: format!("no JSON object found in interpreter output ({})", direct_err),
            })?;
            serde_json::from_str::<Value>(span).map_err(|e| PhoenixError::RuleSource {
                reason: format!("invalid JSON in interpreter output: {}", e),
            })?
        }
    };

    match value {
        Value::Object(map) => Ok(normalize_rule_set(&map)),
        other => Err(PhoenixError::RuleSource {
            reason: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
    }
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Missing, `null` or non-object sides become empty rules.
pub fn normalize_rule_set(map: &Map<String, Value>) -> RuleSet {
    let side = |key: &str| map.get(key).map(normalize_rule).unwrap_or_default();
    RuleSet {
        buy: side("buy"),
        sell: side("sell"),
    }
}

/// Normalize one untrusted rule object.
///
/// Indicator names are uppercased, condition aliases collapse to the
/// canonical set, and `operator` is read when `condition` is absent.
/// Anything unrecognized is left out, so the rule fails closed.
pub fn normalize_rule(value: &Value) -> Rule {
    let Value::Object(map) = value else {
        if !value.is_null() {
            tracing::warn!(found = json_kind(value), "rule is not an object; treating as empty");
        }
        return Rule::default();
    };

    let condition_field = map
        .get("condition")
        .filter(|v| !v.is_null())
        .or_else(|| map.get("operator"));

    Rule {
        indicator: map.get("indicator").and_then(|v| parse_named(v, "indicator")),
        condition: condition_field.and_then(|v| parse_named::<Condition>(v, "condition")),
        value: map.get("value").and_then(as_number),
        compare_to: map.get("compare_to").and_then(|v| parse_named(v, "compare_to")),
        moving_average: map.get("moving_average").and_then(parse_moving_average),
    }
}

fn parse_named<T>(value: &Value, field: &str) -> Option<T>
where
    T: std::str::FromStr<Err = String>,
{
    match value {
        Value::String(s) => match s.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(reason) => {
                tracing::warn!(field, %reason, "unrecognized rule field; rule will never fire");
                None
            }
        },
        Value::Null => None,
        other => {
            tracing::warn!(field, found = json_kind(other), "expected a string in rule field");
            None
        }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

fn parse_moving_average(value: &Value) -> Option<MovingAverage> {
    let period = match value {
        Value::Object(map) => map.get("period").and_then(as_number),
        other => as_number(other),
    }?;
    if period >= 1.0 && period.fract() == 0.0 && period <= u32::MAX as f64 {
        Some(MovingAverage {
            period: period as u32,
        })
    } else {
        tracing::warn!(period, "moving_average period must be a positive integer");
        None
    }
}

impl From<Value> for Rule {
    fn from(value: Value) -> Self {
        normalize_rule(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_plain_json() {
        let rules = extract_rule_set(
            r#"{"buy": {"indicator": "RSI", "operator": "<", "value": 30},
                "sell": {"indicator": "EMA20", "condition": "crosses_above"}}"#,
        )
        .unwrap();

        assert_eq!(rules.buy.indicator, Some(Indicator::Rsi));
        assert_eq!(rules.buy.condition, Some(Condition::Lt));
        assert_eq!(rules.buy.value, Some(30.0));
        assert_eq!(rules.sell.indicator, Some(Indicator::Ema20));
        assert_eq!(rules.sell.condition, Some(Condition::CrossesAbove));
    }

    #[test]
    fn extract_fenced_json() {
        let text = "```json\n{\"buy\": {\"indicator\": \"macd\", \"condition\": \"above\"}}\n```";
        let rules = extract_rule_set(text).unwrap();
        assert_eq!(rules.buy.indicator, Some(Indicator::Macd));
        assert_eq!(rules.buy.condition, Some(Condition::Gt));
        assert!(rules.sell.is_empty());
    }

    #[test]
    fn extract_json_surrounded_by_prose() {
        let text = "Sure! Here are your rules:\n{\"sell\": {\"indicator\": \"RSI\", \"condition\": \">\", \"value\": 70}}\nGood luck.";
        let rules = extract_rule_set(text).unwrap();
        assert!(rules.buy.is_empty());
        assert_eq!(rules.sell.value, Some(70.0));
    }

    #[test]
    fn extract_without_json_fails() {
        let err = extract_rule_set("I could not understand that strategy.").unwrap_err();
        assert!(matches!(err, PhoenixError::RuleSource { .. }));
    }

    #[test]
    fn extract_non_object_fails() {
        let err = extract_rule_set("[1, 2, 3]").unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn extract_broken_braces_fails() {
        assert!(extract_rule_set("{ not json }").is_err());
    }

    #[test]
    fn condition_preferred_over_operator() {
        let rule = normalize_rule(&json!({
            "indicator": "RSI", "condition": "gt", "operator": "<", "value": 50
        }));
        assert_eq!(rule.condition, Some(Condition::Gt));
    }

    #[test]
    fn null_condition_falls_back_to_operator() {
        let rule = normalize_rule(&json!({"indicator": "RSI", "condition": null, "operator": "<"}));
        assert_eq!(rule.condition, Some(Condition::Lt));
    }

    #[test]
    fn unknown_names_are_dropped() {
        let rule = normalize_rule(&json!({"indicator": "STOCH", "condition": "equals", "value": 20}));
        assert_eq!(rule.indicator, None);
        assert_eq!(rule.condition, None);
        assert_eq!(rule.value, Some(20.0));
        assert!(!rule.is_empty());
    }

    #[test]
    fn numeric_string_value() {
        let rule = normalize_rule(&json!({"indicator": "RSI", "condition": "<", "value": " 25.5 "}));
        assert_eq!(rule.value, Some(25.5));
    }

    #[test]
    fn compare_to_and_moving_average() {
        let rule = normalize_rule(&json!({
            "indicator": "ema20", "condition": "crosses_above", "compare_to": "Ema50"
        }));
        assert_eq!(rule.compare_to, Some(Indicator::Ema50));

        let rule = normalize_rule(&json!({
            "indicator": "PRICE", "condition": "crosses_below", "moving_average": {"period": 50}
        }));
        assert_eq!(rule.moving_average, Some(MovingAverage { period: 50 }));
    }

    #[test]
    fn invalid_moving_average_period() {
        for period in [json!(0), json!(-5), json!(12.5), json!("abc")] {
            let rule = normalize_rule(&json!({"indicator": "PRICE", "moving_average": {"period": period}}));
            assert_eq!(rule.moving_average, None);
        }
    }

    #[test]
    fn null_and_non_object_sides() {
        let rules = extract_rule_set(r#"{"buy": null, "sell": "RSI < 30"}"#).unwrap();
        assert!(rules.buy.is_empty());
        assert!(rules.sell.is_empty());
    }

    #[test]
    fn serde_deserialize_uses_normalization() {
        let rules: RuleSet =
            serde_json::from_str(r#"{"buy": {"indicator": "rsi", "operator": "less_than", "value": 30}}"#)
                .unwrap();
        assert_eq!(rules.buy.indicator, Some(Indicator::Rsi));
        assert_eq!(rules.buy.condition, Some(Condition::Lt));
        assert!(rules.sell.is_empty());
    }

    #[test]
    fn serialize_round_trip_is_stable() {
        let rules = extract_rule_set(r#"{"buy": {"indicator": "EMA20", "condition": "crosses_above", "compare_to": "EMA50"}}"#)
            .unwrap();
        let json = serde_json::to_string(&rules).unwrap();
        let again: RuleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(rules, again);
    }
}
