//! Validators for loosely typed plot attributes.
//!
//! Attributes coming from configuration files, scripting layers or other
//! dynamically typed sources arrive as [`serde_json::Value`]. Each validator
//! checks one attribute and returns its typed, normalised form, failing with a
//! [`ErrorKind::Type`](crate::ErrorKind::Type) error when the value has the
//! wrong shape and an [`ErrorKind::Value`](crate::ErrorKind::Value) error when
//! the content is out of domain. Markers and line styles are closed token sets,
//! so anything outside the set is a value error whatever its type.

use num_traits::ToPrimitive;
use serde_json::{Map, Value};

use crate::error::{PlotError, PlotResult};
use crate::style::{LineStyle, Marker, Rgb, STYLE_KEYS, TraceStyle};

/// What [`validate_kwargs`] does with names that are not style attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Skip them silently.
    #[default]
    Ignore,
    /// Fail with a value error naming the first unknown key.
    Reject,
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validate a legend label: a string, or null for "no label".
pub fn validate_label(value: &Value) -> PlotResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(PlotError::invalid_type("label", "string or null", describe(other))),
    }
}

/// Validate an RGB colour given as three integers in `0..=255`.
///
/// The result is normalised to `[0, 1]` per channel.
pub fn validate_color(value: &Value) -> PlotResult<Rgb> {
    let components = match value {
        Value::Array(items) if items.len() == 3 => items,
        Value::Array(items) => {
            return Err(PlotError::invalid_type(
                "color",
                "array of 3 integers",
                format!("array of {} elements", items.len()),
            ));
        }
        other => {
            return Err(PlotError::invalid_type("color", "array of 3 integers", describe(other)));
        }
    };

    let mut channels = [0u8; 3];
    for (slot, component) in channels.iter_mut().zip(components) {
        let Value::Number(n) = component else {
            return Err(PlotError::invalid_type(
                "color",
                "array of 3 integers",
                format!("array containing a {}", describe(component)),
            ));
        };
        *slot = n
            .as_i64()
            .and_then(|v| u8::try_from(v).ok())
            .ok_or_else(|| {
                PlotError::invalid_value(
                    "color",
                    format!("component {n} is not an integer in 0..=255"),
                )
            })?;
    }
    Ok(Rgb::from_rgb8(channels[0], channels[1], channels[2]))
}

/// Validate a marker token; null means no marker.
pub fn validate_marker(value: &Value) -> PlotResult<Option<Marker>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => s.parse().map(Some),
        other => Err(PlotError::invalid_value(
            "marker",
            format!("expected one of '.', 'o', '+', 'x', '*' or null, got {}", describe(other)),
        )),
    }
}

/// Validate a line-style token; null means the default (solid).
pub fn validate_linestyle(value: &Value) -> PlotResult<Option<LineStyle>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => s.parse().map(Some),
        other => Err(PlotError::invalid_value(
            "linestyle",
            format!("expected one of solid, dotted, dashed, none or null, got {}", describe(other)),
        )),
    }
}

/// Coerce a JSON number or numeric string to `f64`.
fn coerce_number(parameter: &str, value: &Value) -> PlotResult<f64> {
    let coerced = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    coerced.ok_or_else(|| {
        PlotError::invalid_type(parameter, "number or numeric string", describe(value))
    })
}

pub(crate) fn check_linewidth(linewidth: f64) -> PlotResult<f64> {
    if linewidth.is_nan() || linewidth < 0.0 {
        return Err(PlotError::invalid_value(
            "linewidth",
            format!("must be non-negative, got {linewidth}"),
        ));
    }
    Ok(linewidth)
}

pub(crate) fn check_alpha(alpha: f64) -> PlotResult<f64> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(PlotError::invalid_value(
            "alpha",
            format!("must be in [0, 1], got {alpha}"),
        ));
    }
    Ok(alpha)
}

/// Validate a line width: numeric (or numeric string) and non-negative.
pub fn validate_linewidth(value: &Value) -> PlotResult<f64> {
    check_linewidth(coerce_number("linewidth", value)?)
}

/// Validate an opacity: numeric (or numeric string) in `[0, 1]`.
pub fn validate_alpha(value: &Value) -> PlotResult<f64> {
    check_alpha(coerce_number("alpha", value)?)
}

/// Validate a bag of style attributes.
///
/// Every name in `required` must be present in `supplied`. Each supplied style
/// attribute is passed through its validator. Names that are not style
/// attributes are handled according to `unknown`.
pub fn validate_kwargs(
    required: &[&str],
    supplied: &Map<String, Value>,
    unknown: UnknownKeys,
) -> PlotResult<TraceStyle> {
    for name in required {
        if !STYLE_KEYS.contains(name) {
            return Err(PlotError::invalid_value(
                *name,
                format!("no validator for this argument; expected one of {STYLE_KEYS:?}"),
            ));
        }
        if !supplied.contains_key(*name) {
            return Err(PlotError::invalid_value(*name, "required argument is missing"));
        }
    }

    let mut style = TraceStyle::default();
    for (name, value) in supplied {
        match name.as_str() {
            "label" => style.label = validate_label(value)?,
            "color" => style.color = Some(validate_color(value)?),
            "marker" => style.marker = validate_marker(value)?,
            "linestyle" => style.linestyle = validate_linestyle(value)?,
            "linewidth" => style.linewidth = Some(validate_linewidth(value)?),
            "alpha" => style.alpha = Some(validate_alpha(value)?),
            other => {
                if unknown == UnknownKeys::Reject {
                    return Err(PlotError::invalid_value(
                        other,
                        format!("unknown style argument; expected one of {STYLE_KEYS:?}"),
                    ));
                }
            }
        }
    }
    Ok(style)
}

/// Convert any primitive numeric sequence into `f64` coordinates.
///
/// Fails with a value error if an element has no `f64` representation.
pub fn to_f64_vec<I, T>(parameter: &str, values: I) -> PlotResult<Vec<f64>>
where
    I: IntoIterator<Item = T>,
    T: ToPrimitive,
{
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.to_f64().ok_or_else(|| {
                PlotError::invalid_value(parameter, format!("element {i} is not representable as f64"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use approx_eq::assert_approx_eq;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_validate_label() {
        for label in ["Gráfico", "This is a long label because sometimes labels are long"] {
            assert_eq!(validate_label(&json!(label)).unwrap().as_deref(), Some(label));
        }
        assert_eq!(validate_label(&Value::Null).unwrap(), None);
        assert_eq!(validate_label(&json!(9)).unwrap_err().kind(), ErrorKind::Type);
    }

    #[test]
    fn test_validate_label_is_idempotent() {
        let once = validate_label(&json!("signal")).unwrap();
        let twice = validate_label(&json!(once.clone())).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_validate_color() {
        for (r, g, b) in [(0u8, 0u8, 0u8), (1, 2, 3), (255, 255, 255)] {
            let c = validate_color(&json!([r, g, b])).unwrap();
            assert_approx_eq!(c.r, f64::from(r) / 255.0);
            assert_approx_eq!(c.g, f64::from(g) / 255.0);
            assert_approx_eq!(c.b, f64::from(b) / 255.0);
        }

        for bad in [json!([-1, 1, 1]), json!([444, 0, 0]), json!([0.5, 0, 0])] {
            assert_eq!(validate_color(&bad).unwrap_err().kind(), ErrorKind::Value);
        }
        for bad in [json!("#fcba03"), json!([1, 2, 3, 4]), json!([1, 2]), json!(["a", 0, 0])] {
            assert_eq!(validate_color(&bad).unwrap_err().kind(), ErrorKind::Type);
        }
    }

    #[test]
    fn test_validate_marker() {
        for token in [".", "o", "+", "x", "*"] {
            let marker = validate_marker(&json!(token)).unwrap();
            assert_eq!(marker.map(Marker::token), Some(token));
        }
        assert_eq!(validate_marker(&Value::Null).unwrap(), None);
        for bad in [",", "dot", "cross"] {
            assert_eq!(validate_marker(&json!(bad)).unwrap_err().kind(), ErrorKind::Value);
        }
        assert_eq!(validate_marker(&json!(3)).unwrap_err().kind(), ErrorKind::Value);
    }

    #[test]
    fn test_validate_linestyle() {
        for token in ["solid", "dotted", "dashed", "none"] {
            let ls = validate_linestyle(&json!(token)).unwrap();
            assert_eq!(ls.map(LineStyle::token), Some(token));
        }
        assert_eq!(validate_linestyle(&Value::Null).unwrap(), None);
        for bad in [",", "dot", "--"] {
            assert_eq!(validate_linestyle(&json!(bad)).unwrap_err().kind(), ErrorKind::Value);
        }
    }

    #[test]
    fn test_validate_linewidth() {
        assert_approx_eq!(validate_linewidth(&json!(1)).unwrap(), 1.0);
        assert_approx_eq!(validate_linewidth(&json!(1.5)).unwrap(), 1.5);
        assert_approx_eq!(validate_linewidth(&json!("1.5")).unwrap(), 1.5);
        assert_eq!(validate_linewidth(&json!(0)).unwrap(), 0.0);

        for bad in [json!(","), json!("dot"), json!([1])] {
            assert_eq!(validate_linewidth(&bad).unwrap_err().kind(), ErrorKind::Type);
        }
        for bad in [json!("-2"), json!(-1), json!(-1.5)] {
            assert_eq!(validate_linewidth(&bad).unwrap_err().kind(), ErrorKind::Value);
        }
    }

    #[test]
    fn test_validate_alpha() {
        for ok in [0.0, 1.0, 0.5] {
            assert_eq!(validate_alpha(&json!(ok)).unwrap(), ok);
        }
        for bad in [json!(","), json!("dot")] {
            assert_eq!(validate_alpha(&bad).unwrap_err().kind(), ErrorKind::Type);
        }
        for bad in [json!("-2"), json!(-1), json!(-1.5), json!(2)] {
            assert_eq!(validate_alpha(&bad).unwrap_err().kind(), ErrorKind::Value);
        }
    }

    #[test]
    fn test_numeric_validators_are_idempotent() {
        let lw = validate_linewidth(&json!("2.25")).unwrap();
        assert_approx_eq!(validate_linewidth(&json!(lw)).unwrap(), lw);
        let alpha = validate_alpha(&json!(0.3)).unwrap();
        assert_approx_eq!(validate_alpha(&json!(alpha)).unwrap(), alpha);
    }

    #[test]
    fn test_validate_kwargs_accepts() {
        let style = validate_kwargs(
            &["linestyle", "linewidth"],
            &object(json!({ "linestyle": "solid", "linewidth": 2 })),
            UnknownKeys::Ignore,
        )
        .unwrap();
        assert_eq!(style.linestyle, Some(LineStyle::Solid));
        assert_eq!(style.linewidth, Some(2.0));

        let style = validate_kwargs(
            &["color", "label", "linestyle", "marker"],
            &object(json!({
                "linestyle": "dashed", "marker": ".", "color": [255, 0, 0], "label": "My plot"
            })),
            UnknownKeys::Ignore,
        )
        .unwrap();
        assert_eq!(style.marker, Some(Marker::Point));
        assert_eq!(style.color, Some(Rgb::from_rgb8(255, 0, 0)));
        assert_eq!(style.label.as_deref(), Some("My plot"));
    }

    #[test]
    fn test_validate_kwargs_failures() {
        let missing = validate_kwargs(
            &["linestyle", "linewidth", "marker"],
            &object(json!({ "linestyle": "solid", "linewidth": 2 })),
            UnknownKeys::Ignore,
        );
        assert_eq!(missing.unwrap_err().kind(), ErrorKind::Value);

        let negative = validate_kwargs(
            &["linestyle", "linewidth"],
            &object(json!({ "linestyle": "solid", "linewidth": -2 })),
            UnknownKeys::Ignore,
        );
        assert_eq!(negative.unwrap_err().kind(), ErrorKind::Value);

        let bad_token = validate_kwargs(
            &["linestyle"],
            &object(json!({ "linestyle": "--" })),
            UnknownKeys::Ignore,
        );
        assert_eq!(bad_token.unwrap_err().kind(), ErrorKind::Value);
    }

    #[test]
    fn test_validate_kwargs_unknown_policy() {
        let supplied = object(json!({ "linestyle": "solid", "linestylesssss": "solid" }));
        assert!(validate_kwargs(&["linestyle"], &supplied, UnknownKeys::Ignore).is_ok());
        let err = validate_kwargs(&["linestyle"], &supplied, UnknownKeys::Reject).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_to_f64_vec() {
        let ints = to_f64_vec("x", [0i32, 1, 2]).unwrap();
        assert_eq!(ints, vec![0.0, 1.0, 2.0]);
        let floats = to_f64_vec("x", vec![0.5f32, 1.5]).unwrap();
        assert_eq!(floats, vec![0.5, 1.5]);
    }
}
