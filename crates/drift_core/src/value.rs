//! Property values
//!
//! `PropertyValue` is the tagged form of every value a widget property can hold.
//! Widgets keep their native types (`Point`, `Color`, ...) and convert at the
//! property boundary with the `From`/`TryFrom` impls below.

use std::fmt;

use crate::error::PropertyError;
use crate::geometry::{Color, Point, Rect, Size};

/// A typed property value owned by a widget
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    /// Floating-point scalar (opacity, progress, scale)
    Scalar(f64),
    /// Integral scalar (pixel offsets, counters)
    Integer(i64),
    Point(Point),
    Size(Size),
    Rect(Rect),
    Color(Color),
    /// Heterogeneous sequence of values
    List(Vec<PropertyValue>),
    Bool(bool),
    Text(String),
}

/// Discriminant of a [`PropertyValue`], used in diagnostics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Scalar,
    Integer,
    Point,
    Size,
    Rect,
    Color,
    List,
    Bool,
    Text,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Scalar => "scalar",
            ValueKind::Integer => "integer",
            ValueKind::Point => "point",
            ValueKind::Size => "size",
            ValueKind::Rect => "rect",
            ValueKind::Color => "color",
            ValueKind::List => "list",
            ValueKind::Bool => "bool",
            ValueKind::Text => "text",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PropertyValue {
    /// Get the kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            PropertyValue::Scalar(_) => ValueKind::Scalar,
            PropertyValue::Integer(_) => ValueKind::Integer,
            PropertyValue::Point(_) => ValueKind::Point,
            PropertyValue::Size(_) => ValueKind::Size,
            PropertyValue::Rect(_) => ValueKind::Rect,
            PropertyValue::Color(_) => ValueKind::Color,
            PropertyValue::List(_) => ValueKind::List,
            PropertyValue::Bool(_) => ValueKind::Bool,
            PropertyValue::Text(_) => ValueKind::Text,
        }
    }

    /// Numeric value of a scalar-like variant
    ///
    /// `Scalar` and `Integer` yield their value; everything else yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Scalar(v) => Some(*v),
            PropertyValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    fn mismatch(&self, expected: ValueKind) -> PropertyError {
        PropertyError::WrongKind {
            expected,
            found: self.kind(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Native type conversions
// ─────────────────────────────────────────────────────────────────────────────

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Scalar(value)
    }
}

impl From<f32> for PropertyValue {
    fn from(value: f32) -> Self {
        PropertyValue::Scalar(value as f64)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Integer(value as i64)
    }
}

impl From<Point> for PropertyValue {
    fn from(value: Point) -> Self {
        PropertyValue::Point(value)
    }
}

impl From<Size> for PropertyValue {
    fn from(value: Size) -> Self {
        PropertyValue::Size(value)
    }
}

impl From<Rect> for PropertyValue {
    fn from(value: Rect) -> Self {
        PropertyValue::Rect(value)
    }
}

impl From<Color> for PropertyValue {
    fn from(value: Color) -> Self {
        PropertyValue::Color(value)
    }
}

impl From<Vec<f64>> for PropertyValue {
    fn from(values: Vec<f64>) -> Self {
        PropertyValue::List(values.into_iter().map(PropertyValue::Scalar).collect())
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl TryFrom<PropertyValue> for f64 {
    type Error = PropertyError;

    fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
        match value {
            PropertyValue::Scalar(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Scalar)),
        }
    }
}

impl TryFrom<PropertyValue> for f32 {
    type Error = PropertyError;

    fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
        f64::try_from(value).map(|v| v as f32)
    }
}

impl TryFrom<PropertyValue> for i64 {
    type Error = PropertyError;

    fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
        match value {
            PropertyValue::Integer(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Integer)),
        }
    }
}

impl TryFrom<PropertyValue> for Point {
    type Error = PropertyError;

    fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
        match value {
            PropertyValue::Point(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Point)),
        }
    }
}

impl TryFrom<PropertyValue> for Size {
    type Error = PropertyError;

    fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
        match value {
            PropertyValue::Size(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Size)),
        }
    }
}

impl TryFrom<PropertyValue> for Rect {
    type Error = PropertyError;

    fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
        match value {
            PropertyValue::Rect(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Rect)),
        }
    }
}

impl TryFrom<PropertyValue> for Color {
    type Error = PropertyError;

    fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
        match value {
            PropertyValue::Color(v) => Ok(v),
            other => Err(other.mismatch(ValueKind::Color)),
        }
    }
}

impl TryFrom<PropertyValue> for Vec<f64> {
    type Error = PropertyError;

    fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
        match value {
            PropertyValue::List(items) => items
                .iter()
                .map(|item| item.as_number().ok_or_else(|| item.mismatch(ValueKind::Scalar)))
                .collect(),
            other => Err(other.mismatch(ValueKind::List)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(PropertyValue::from(1.5).kind(), ValueKind::Scalar);
        assert_eq!(PropertyValue::from(3i64).kind(), ValueKind::Integer);
        assert_eq!(PropertyValue::from(Color::WHITE).kind(), ValueKind::Color);
        assert_eq!(PropertyValue::from("label").kind().to_string(), "text");
    }

    #[test]
    fn test_native_round_trip() {
        let point = Point::new(3.0, 4.0);
        assert_eq!(Point::try_from(PropertyValue::from(point)).unwrap(), point);

        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(Rect::try_from(PropertyValue::from(rect)).unwrap(), rect);

        let list = vec![1.0, -2.5, 8.0];
        assert_eq!(Vec::<f64>::try_from(PropertyValue::from(list.clone())).unwrap(), list);
    }

    #[test]
    fn test_wrong_kind_is_reported() {
        let err = Color::try_from(PropertyValue::from(Size::new(1.0, 1.0))).unwrap_err();
        assert_eq!(
            err,
            PropertyError::WrongKind {
                expected: ValueKind::Color,
                found: ValueKind::Size,
            }
        );
    }

    #[test]
    fn test_list_with_nested_values_is_rejected() {
        let value = PropertyValue::List(vec![
            PropertyValue::Scalar(1.0),
            PropertyValue::Point(Point::ZERO),
        ]);
        assert!(Vec::<f64>::try_from(value).is_err());
    }
}
