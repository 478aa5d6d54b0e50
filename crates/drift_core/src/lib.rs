//! Drift Core
//!
//! Foundational types shared by the Drift widget toolkit and its animation engine:
//!
//! - **Geometry**: `Point`, `Size`, `Rect` and `Color` primitives
//! - **Property Values**: `PropertyValue`, the tagged form of every widget property
//! - **Owner Contract**: `PropertyAccess`, the getter/setter pair a widget hands
//!   to anything that drives one of its properties

pub mod error;
pub mod geometry;
pub mod property;
pub mod value;

pub use error::PropertyError;
pub use geometry::{Color, Point, Rect, Size};
pub use property::{property, FnProperty, PropertyAccess, WidgetProperty};
pub use value::{PropertyValue, ValueKind};
