//! Animation groups
//!
//! A named set of animations addressed by unique string tokens, e.g. the
//! `"background"` and `"border"` animations of one button. Members keep their
//! insertion order.

use indexmap::IndexMap;

use crate::animation::SharedAnimation;
use crate::error::{AnimationError, Result};
use drift_core::PropertyValue;

/// Named collection of animations keyed by token
#[derive(Debug, Default)]
pub struct AnimationGroup {
    name: String,
    members: IndexMap<String, SharedAnimation>,
}

impl AnimationGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a member under `token`
    ///
    /// Fails with `DuplicateToken` if the token is taken; the existing member
    /// is left in place.
    pub fn add_member(&mut self, animation: SharedAnimation, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        if self.members.contains_key(&token) {
            return Err(AnimationError::DuplicateToken(token));
        }
        self.members.insert(token, animation);
        Ok(())
    }

    /// Look up a member by token
    pub fn from_token(&self, token: &str) -> Result<&SharedAnimation> {
        self.members
            .get(token)
            .ok_or_else(|| AnimationError::UnknownToken(token.to_string()))
    }

    /// Remove a member, keeping the order of the rest
    pub fn remove_member(&mut self, token: &str) -> Result<SharedAnimation> {
        self.members
            .shift_remove(token)
            .ok_or_else(|| AnimationError::UnknownToken(token.to_string()))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.members.contains_key(token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SharedAnimation)> {
        self.members.iter().map(|(token, anim)| (token.as_str(), anim))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Retarget one member
    pub fn set_target(&self, token: &str, value: impl Into<PropertyValue>) -> Result<()> {
        self.from_token(token)?.lock().set_target(value)
    }

    /// Start every member; returns how many actually started
    pub fn start_all(&self) -> Result<usize> {
        let mut started = 0;
        for animation in self.members.values() {
            if animation.lock().start()? {
                started += 1;
            }
        }
        Ok(started)
    }

    /// Stop every member
    pub fn stop_all(&self) {
        for animation in self.members.values() {
            animation.lock().stop();
        }
    }

    /// Check if any member is running
    pub fn is_running(&self) -> bool {
        self.members.values().any(|animation| animation.lock().is_running())
    }
}
