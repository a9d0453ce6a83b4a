//! Resource identity.
//!
//! Contexts, systems, APIs and every other stored kind are looked up by a
//! UUID that the caller picks when it builds the entity. Annotations have no
//! identity of their own, so their change events travel to the owning entity
//! under the nil UUID. That is why nil can never name a stored entity and
//! `add_*` rejects it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a stored entity, or nil for a value-object event.
///
/// Serialized as the bare UUID string, the same form REST paths carry.
///
/// # Examples
///
/// ```
/// use modelsrv::ResourceId;
///
/// let id: ResourceId = "6f1c2b9e-54d4-4d8c-9a57-0c7c1e0b2a11".parse().unwrap();
/// assert!(!id.is_nil());
/// assert!(ResourceId::nil().is_nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// A fresh random (v4) id for a new entity.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// True for the annotation-event id; no stored entity has it.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Resource id of every annotation change event.
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Accepts any UUID text form, nil included; rejecting nil is left to the
/// model so lookups by a nil id simply find nothing.
impl FromStr for ResourceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for ResourceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ResourceId> for Uuid {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}
