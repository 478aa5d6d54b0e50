//! Owner property contract
//!
//! An animation never owns the value it drives. The owning widget hands it a
//! [`PropertyAccess`] implementation: a getter the engine calls when it needs
//! to sample the current value, and a setter it calls with each new frame.
//!
//! Two adapters cover the usual cases:
//!
//! - [`FnProperty`]: any pair of closures
//! - [`WidgetProperty`]: a field of widget state shared as `Arc<Mutex<W>>`,
//!   held weakly so a destroyed widget reports [`PropertyError::OwnerDropped`]
//!
//! ```rust
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use drift_core::{Color, PropertyAccess, WidgetProperty};
//!
//! struct Card {
//!     background: Color,
//! }
//!
//! let card = Arc::new(Mutex::new(Card { background: Color::BLACK }));
//! let mut background = WidgetProperty::new(
//!     "background",
//!     &card,
//!     |c: &Card| c.background,
//!     |c: &mut Card, v: Color| c.background = v,
//! );
//!
//! background.set(Color::WHITE.into()).unwrap();
//! assert_eq!(card.lock().background, Color::WHITE);
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{PropertyError, Result};
use crate::value::PropertyValue;

/// Read/write access to one property of an owner
pub trait PropertyAccess: Send {
    /// Read the owner's current value
    fn get(&self) -> Result<PropertyValue>;

    /// Push a new value into the owner
    fn set(&mut self, value: PropertyValue) -> Result<()>;

    /// Property name, used in log output
    fn name(&self) -> &str {
        "property"
    }
}

impl PropertyAccess for Box<dyn PropertyAccess> {
    fn get(&self) -> Result<PropertyValue> {
        (**self).get()
    }

    fn set(&mut self, value: PropertyValue) -> Result<()> {
        (**self).set(value)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Property backed by a getter/setter closure pair
pub struct FnProperty<G, S> {
    name: String,
    getter: G,
    setter: S,
}

impl<G, S> FnProperty<G, S>
where
    G: Fn() -> Result<PropertyValue> + Send,
    S: FnMut(PropertyValue) -> Result<()> + Send,
{
    pub fn new(name: impl Into<String>, getter: G, setter: S) -> Self {
        Self {
            name: name.into(),
            getter,
            setter,
        }
    }
}

impl<G, S> PropertyAccess for FnProperty<G, S>
where
    G: Fn() -> Result<PropertyValue> + Send,
    S: FnMut(PropertyValue) -> Result<()> + Send,
{
    fn get(&self) -> Result<PropertyValue> {
        (self.getter)()
    }

    fn set(&mut self, value: PropertyValue) -> Result<()> {
        (self.setter)(value)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Create a property from a getter/setter closure pair
pub fn property<G, S>(name: impl Into<String>, getter: G, setter: S) -> FnProperty<G, S>
where
    G: Fn() -> Result<PropertyValue> + Send,
    S: FnMut(PropertyValue) -> Result<()> + Send,
{
    FnProperty::new(name, getter, setter)
}

/// Property bound to a field of shared widget state
///
/// The owner is held through a `Weak` reference: once the widget is dropped
/// every access fails with [`PropertyError::OwnerDropped`].
pub struct WidgetProperty<W, T> {
    name: String,
    owner: Weak<Mutex<W>>,
    read: fn(&W) -> T,
    write: fn(&mut W, T),
}

impl<W, T> WidgetProperty<W, T>
where
    W: Send,
    T: Into<PropertyValue> + TryFrom<PropertyValue, Error = PropertyError>,
{
    pub fn new(
        name: impl Into<String>,
        owner: &Arc<Mutex<W>>,
        read: fn(&W) -> T,
        write: fn(&mut W, T),
    ) -> Self {
        Self {
            name: name.into(),
            owner: Arc::downgrade(owner),
            read,
            write,
        }
    }

    fn owner(&self) -> Result<Arc<Mutex<W>>> {
        self.owner.upgrade().ok_or(PropertyError::OwnerDropped)
    }
}

impl<W, T> PropertyAccess for WidgetProperty<W, T>
where
    W: Send,
    T: Into<PropertyValue> + TryFrom<PropertyValue, Error = PropertyError>,
{
    fn get(&self) -> Result<PropertyValue> {
        let owner = self.owner()?;
        let value = (self.read)(&owner.lock());
        Ok(value.into())
    }

    fn set(&mut self, value: PropertyValue) -> Result<()> {
        let owner = self.owner()?;
        let value = T::try_from(value)?;
        (self.write)(&mut owner.lock(), value);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
