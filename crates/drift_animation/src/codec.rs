//! Value codec
//!
//! Maps typed property values to the fixed-length numeric vectors the stepper
//! works on, and back again.
//!
//! Dispatch is a closed set of [`ValueFamily`] variants, each with an
//! encode/decode pair in a static function table. Adding a family means adding
//! a variant and a table row. Lists of scalars that are not one of the named
//! families are coerced elementwise into [`ValueFamily::Components`]; anything
//! that cannot be decomposed into numbers is a `TypeMismatch`.

use std::fmt;

use drift_core::{Color, Point, PropertyValue, Rect, Size};
use smallvec::SmallVec;

use crate::error::{AnimationError, Result};

/// The engine's internal representation of a property value
pub type NumericVector = SmallVec<[f64; 4]>;

/// Family of animatable values
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueFamily {
    Scalar,
    Integer,
    Point,
    Size,
    Rect,
    Color,
    /// Elementwise-coerced list of `n` scalar-like values
    Components(usize),
}

impl ValueFamily {
    /// Resolve the family of a value
    pub fn of(value: &PropertyValue) -> Result<Self> {
        match value {
            PropertyValue::Scalar(_) => Ok(ValueFamily::Scalar),
            PropertyValue::Integer(_) => Ok(ValueFamily::Integer),
            PropertyValue::Point(_) => Ok(ValueFamily::Point),
            PropertyValue::Size(_) => Ok(ValueFamily::Size),
            PropertyValue::Rect(_) => Ok(ValueFamily::Rect),
            PropertyValue::Color(_) => Ok(ValueFamily::Color),
            PropertyValue::List(items) => {
                if let Some(bad) = items.iter().find(|item| item.as_number().is_none()) {
                    return Err(AnimationError::TypeMismatch {
                        expected: "list of numbers".to_string(),
                        found: format!("list containing {}", bad.kind()),
                    });
                }
                Ok(ValueFamily::Components(items.len()))
            }
            other => Err(AnimationError::TypeMismatch {
                expected: "animatable value".to_string(),
                found: other.kind().to_string(),
            }),
        }
    }

    /// Number of numeric components
    pub fn width(self) -> usize {
        match self {
            ValueFamily::Scalar | ValueFamily::Integer => 1,
            ValueFamily::Point | ValueFamily::Size => 2,
            ValueFamily::Rect | ValueFamily::Color => 4,
            ValueFamily::Components(n) => n,
        }
    }

    /// Whether decoded values are rounded to integers
    pub fn is_integral(self) -> bool {
        matches!(self, ValueFamily::Integer)
    }

    fn slot(self) -> usize {
        match self {
            ValueFamily::Scalar => 0,
            ValueFamily::Integer => 1,
            ValueFamily::Point => 2,
            ValueFamily::Size => 3,
            ValueFamily::Rect => 4,
            ValueFamily::Color => 5,
            ValueFamily::Components(_) => 6,
        }
    }

    fn fns(self) -> &'static CodecFns {
        &CODEC_TABLE[self.slot()]
    }
}

impl fmt::Display for ValueFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueFamily::Components(n) => write!(f, "{n}-component list"),
            other => f.write_str(other.fns().name),
        }
    }
}

// ============================================================================
// Function table
// ============================================================================

struct CodecFns {
    name: &'static str,
    encode: fn(&PropertyValue) -> Option<NumericVector>,
    decode: fn(&[f64]) -> PropertyValue,
}

static CODEC_TABLE: [CodecFns; 7] = [
    CodecFns {
        name: "scalar",
        encode: encode_scalar,
        decode: decode_scalar,
    },
    CodecFns {
        name: "integer",
        encode: encode_integer,
        decode: decode_integer,
    },
    CodecFns {
        name: "point",
        encode: encode_point,
        decode: decode_point,
    },
    CodecFns {
        name: "size",
        encode: encode_size,
        decode: decode_size,
    },
    CodecFns {
        name: "rect",
        encode: encode_rect,
        decode: decode_rect,
    },
    CodecFns {
        name: "color",
        encode: encode_color,
        decode: decode_color,
    },
    CodecFns {
        name: "list",
        encode: encode_components,
        decode: decode_components,
    },
];

fn encode_scalar(value: &PropertyValue) -> Option<NumericVector> {
    match value {
        PropertyValue::Scalar(v) => Some(smallvec::smallvec![*v]),
        _ => None,
    }
}

fn decode_scalar(v: &[f64]) -> PropertyValue {
    PropertyValue::Scalar(v[0])
}

fn encode_integer(value: &PropertyValue) -> Option<NumericVector> {
    match value {
        PropertyValue::Integer(v) => Some(smallvec::smallvec![*v as f64]),
        _ => None,
    }
}

fn decode_integer(v: &[f64]) -> PropertyValue {
    PropertyValue::Integer(v[0].round() as i64)
}

fn encode_point(value: &PropertyValue) -> Option<NumericVector> {
    match value {
        PropertyValue::Point(p) => Some(smallvec::smallvec![p.x as f64, p.y as f64]),
        _ => None,
    }
}

fn decode_point(v: &[f64]) -> PropertyValue {
    PropertyValue::Point(Point::new(v[0] as f32, v[1] as f32))
}

fn encode_size(value: &PropertyValue) -> Option<NumericVector> {
    match value {
        PropertyValue::Size(s) => Some(smallvec::smallvec![s.width as f64, s.height as f64]),
        _ => None,
    }
}

fn decode_size(v: &[f64]) -> PropertyValue {
    PropertyValue::Size(Size::new(v[0] as f32, v[1] as f32))
}

fn encode_rect(value: &PropertyValue) -> Option<NumericVector> {
    match value {
        PropertyValue::Rect(r) => Some(smallvec::smallvec![
            r.origin.x as f64,
            r.origin.y as f64,
            r.size.width as f64,
            r.size.height as f64,
        ]),
        _ => None,
    }
}

fn decode_rect(v: &[f64]) -> PropertyValue {
    PropertyValue::Rect(Rect::new(
        v[0] as f32,
        v[1] as f32,
        v[2] as f32,
        v[3] as f32,
    ))
}

fn encode_color(value: &PropertyValue) -> Option<NumericVector> {
    match value {
        PropertyValue::Color(c) => Some(c.to_array().iter().map(|&ch| ch as f64).collect()),
        _ => None,
    }
}

fn decode_color(v: &[f64]) -> PropertyValue {
    PropertyValue::Color(Color::rgba(
        v[0] as f32,
        v[1] as f32,
        v[2] as f32,
        v[3] as f32,
    ))
}

fn encode_components(value: &PropertyValue) -> Option<NumericVector> {
    match value {
        PropertyValue::List(items) => items.iter().map(PropertyValue::as_number).collect(),
        _ => None,
    }
}

fn decode_components(v: &[f64]) -> PropertyValue {
    PropertyValue::List(v.iter().copied().map(PropertyValue::Scalar).collect())
}

// ============================================================================
// Codec
// ============================================================================

/// Encoder/decoder bound to one value family
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Codec {
    family: ValueFamily,
}

impl Codec {
    pub fn new(family: ValueFamily) -> Self {
        Self { family }
    }

    /// Bind a codec to the family of `value`
    pub fn for_value(value: &PropertyValue) -> Result<Self> {
        ValueFamily::of(value).map(Self::new)
    }

    pub fn family(&self) -> ValueFamily {
        self.family
    }

    /// Vector length every encoded value has
    pub fn width(&self) -> usize {
        self.family.width()
    }

    /// Encode a value of this codec's family
    pub fn encode(&self, value: &PropertyValue) -> Result<NumericVector> {
        let family = ValueFamily::of(value)?;
        if family != self.family {
            return Err(AnimationError::TypeMismatch {
                expected: self.family.to_string(),
                found: family.to_string(),
            });
        }

        (self.family.fns().encode)(value).ok_or_else(|| AnimationError::TypeMismatch {
            expected: self.family.to_string(),
            found: value.kind().to_string(),
        })
    }

    /// Decode a vector back into a typed value
    pub fn decode(&self, vector: &[f64]) -> Result<PropertyValue> {
        if vector.len() != self.width() {
            return Err(AnimationError::DimensionMismatch {
                expected: self.width(),
                found: vector.len(),
            });
        }
        Ok((self.family.fns().decode)(vector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: PropertyValue) -> PropertyValue {
        let codec = Codec::for_value(&value).unwrap();
        let encoded = codec.encode(&value).unwrap();
        assert_eq!(encoded.len(), codec.width());
        codec.decode(&encoded).unwrap()
    }

    #[test]
    fn test_family_widths() {
        assert_eq!(ValueFamily::Scalar.width(), 1);
        assert_eq!(ValueFamily::Point.width(), 2);
        assert_eq!(ValueFamily::Rect.width(), 4);
        assert_eq!(ValueFamily::Color.width(), 4);
        assert_eq!(ValueFamily::Components(6).width(), 6);
        assert!(ValueFamily::Integer.is_integral());
        assert!(!ValueFamily::Scalar.is_integral());
    }

    #[test]
    fn test_round_trip_every_family() {
        let values = [
            PropertyValue::Scalar(0.125),
            PropertyValue::Integer(-42),
            PropertyValue::Point(Point::new(3.5, -7.25)),
            PropertyValue::Size(Size::new(320.0, 240.0)),
            PropertyValue::Rect(Rect::new(1.0, 2.0, 30.5, 40.25)),
            PropertyValue::Color(Color::rgba(0.1, 0.2, 0.3, 0.4)),
            PropertyValue::from(vec![1.0, 2.0, 3.0]),
        ];

        for value in values {
            assert_eq!(round_trip(value.clone()), value);
        }
    }

    #[test]
    fn test_integer_decode_rounds() {
        let codec = Codec::new(ValueFamily::Integer);
        assert_eq!(codec.decode(&[41.6]).unwrap(), PropertyValue::Integer(42));
        assert_eq!(codec.decode(&[-2.4]).unwrap(), PropertyValue::Integer(-2));
    }

    #[test]
    fn test_list_coercion_accepts_integers() {
        let value = PropertyValue::List(vec![PropertyValue::Integer(2), PropertyValue::Scalar(0.5)]);
        let codec = Codec::for_value(&value).unwrap();
        assert_eq!(codec.family(), ValueFamily::Components(2));
        assert_eq!(codec.encode(&value).unwrap().as_slice(), &[2.0, 0.5]);
    }

    #[test]
    fn test_non_numeric_values_are_rejected() {
        for value in [
            PropertyValue::Text("hello".into()),
            PropertyValue::Bool(true),
            PropertyValue::List(vec![PropertyValue::Point(Point::ZERO)]),
        ] {
            assert!(matches!(
                Codec::for_value(&value),
                Err(AnimationError::TypeMismatch { .. })
            ));
        }
    }

    #[test]
    fn test_encode_other_family_is_mismatch() {
        let codec = Codec::new(ValueFamily::Point);
        let err = codec.encode(&PropertyValue::Color(Color::WHITE)).unwrap_err();
        match err {
            AnimationError::TypeMismatch { expected, found } => {
                assert_eq!(expected, "point");
                assert_eq!(found, "color");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Same family, different length
        let codec = Codec::new(ValueFamily::Components(3));
        assert!(codec.encode(&PropertyValue::from(vec![1.0, 2.0])).is_err());
    }

    #[test]
    fn test_decode_wrong_length() {
        let codec = Codec::new(ValueFamily::Size);
        assert!(matches!(
            codec.decode(&[1.0]),
            Err(AnimationError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        ));
    }
}
