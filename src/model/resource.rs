//! The generic reference entity.
//!
//! Every kind of landscape entity shares one shape: a UUID identity, a
//! display name and description, an owned [`Annotations`] value object, a
//! registration state, and some kind-specific data `D`. [`Resource<D>`]
//! carries that shape once; the kind modules only add `D` and its accessors.
//!
//! Setters behave differently depending on registration. Before the entity
//! is added to its [`Model`] a setter only mutates local state. Afterwards
//! the same setter also emits one `Update` event on the model's sink, with
//! the entity itself as payload.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::trace;

use crate::error::{EventError, EventResult, ModelError, ModelResult};
use crate::events::{EventSink, Operation, Payload, ResourceType};
use crate::identity::ResourceId;

use super::annotations::Annotations;
use super::registry::{Registry, Stored};
use super::{Model, ModelCore, ModelState};

/// Registration state of a reference entity.
///
/// The only transition is `Unregistered -> Registered`, performed by the
/// model when the entity is added. Deleting the entity from the model does
/// not reset it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RegistrationState {
    #[default]
    Unregistered,
    Registered,
}

/// Kind-specific data of a reference entity.
pub trait ResourceData: Default + fmt::Debug + Send + Sync + 'static {
    /// Resource type reported in events about this kind.
    const RESOURCE_TYPE: ResourceType;
}

/// Type-erased view of a reference entity, as carried in event payloads.
pub trait AnyResource: fmt::Debug + Send + Sync {
    fn resource_type(&self) -> ResourceType;
    fn resource_id(&self) -> ResourceId;
    fn resource_display_name(&self) -> String;
    fn resource_description(&self) -> String;
    /// Annotation entries ordered by key.
    fn annotation_pairs(&self) -> Vec<(String, String)>;
    fn as_any(&self) -> &dyn Any;
}

impl dyn AnyResource {
    /// Recovers the concrete entity type.
    #[must_use]
    pub fn downcast_ref<D: ResourceData>(&self) -> Option<&Resource<D>> {
        self.as_any().downcast_ref()
    }
}

/// A lazily resolved reference to another entity.
///
/// Holds the target's id plus a non-owning cache of the target. The cache is
/// filled on the first successful lookup (or eagerly, when the target is
/// already stored) and is never an owning pointer: the model remains the
/// sole owner of every entity.
pub struct LazyRef<D: ResourceData> {
    id: ResourceId,
    cached: Weak<Resource<D>>,
}

impl<D: ResourceData> LazyRef<D> {
    /// Reference by id only; resolved on first access.
    #[must_use]
    pub fn by_id(id: ResourceId) -> Self {
        Self {
            id,
            cached: Weak::new(),
        }
    }

    /// Reference with id and cache set together.
    #[must_use]
    pub fn by_ref(target: &Arc<Resource<D>>) -> Self {
        Self {
            id: target.id(),
            cached: Arc::downgrade(target),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ResourceId {
        self.id
    }

    /// The cached target, if it has been resolved and is still alive.
    #[must_use]
    pub fn cached(&self) -> Option<Arc<Resource<D>>> {
        self.cached.upgrade()
    }

    fn cache(&mut self, target: &Arc<Resource<D>>) {
        self.cached = Arc::downgrade(target);
    }
}

impl<D: ResourceData> Clone for LazyRef<D> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            cached: Weak::clone(&self.cached),
        }
    }
}

impl<D: ResourceData> fmt::Debug for LazyRef<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRef")
            .field("type", &D::RESOURCE_TYPE)
            .field("id", &self.id)
            .field("resolved", &(self.cached.strong_count() > 0))
            .finish()
    }
}

/// Fills the cache of `slot` from `registry` if the target is stored.
pub(crate) fn link_ref<T: ResourceData>(slot: &mut Option<LazyRef<T>>, registry: &Registry<T>) {
    let Some(link) = slot.as_mut() else {
        return;
    };
    if link.cached.strong_count() > 0 {
        return;
    }
    if let Some(target) = registry.get(link.id) {
        link.cache(&target);
    }
}

#[derive(Debug, Default)]
struct Fields<D> {
    display_name: String,
    description: String,
    data: D,
}

/// A reference entity of kind `D`.
///
/// Always handled through `Arc`; construct with [`Resource::new`] or the
/// `Model::new_*` helpers.
pub struct Resource<D: ResourceData> {
    id: ResourceId,
    model: Weak<ModelCore>,
    me: Weak<Self>,
    registration: RwLock<RegistrationState>,
    fields: RwLock<Fields<D>>,
    annotations: Annotations,
}

impl<D: ResourceData> Resource<D> {
    /// Creates an unregistered entity bound to `model`.
    ///
    /// A nil `id` is accepted here; the model rejects it on add.
    #[must_use]
    pub fn new(model: &Model, id: ResourceId) -> Arc<Self> {
        let core = model.downgrade();
        Arc::new_cyclic(|me: &Weak<Self>| {
            let owner: Weak<dyn EventSink> = me.clone();
            Self {
                id,
                model: Weak::clone(&core),
                me: Weak::clone(me),
                registration: RwLock::new(RegistrationState::Unregistered),
                fields: RwLock::new(Fields::default()),
                annotations: Annotations::owned_by(core, owner),
            }
        })
    }

    #[must_use]
    pub const fn id(&self) -> ResourceId {
        self.id
    }

    #[must_use]
    pub fn registration_state(&self) -> RegistrationState {
        *self.registration.read()
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registration_state() == RegistrationState::Registered
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        self.fields.read().display_name.clone()
    }

    /// # Errors
    ///
    /// The sink's error, if registered and the update event is rejected.
    /// The new name is kept either way.
    pub fn set_display_name(&self, name: impl Into<String>) -> ModelResult<()> {
        let name = name.into();
        self.update_fields(|fields| fields.display_name = name)
    }

    #[must_use]
    pub fn description(&self) -> String {
        self.fields.read().description.clone()
    }

    /// # Errors
    ///
    /// The sink's error, if registered and the update event is rejected.
    /// The new description is kept either way.
    pub fn set_description(&self, description: impl Into<String>) -> ModelResult<()> {
        let description = description.into();
        self.update_fields(|fields| fields.description = description)
    }

    /// The entity's annotations. Changes to them are reported as updates
    /// of this entity.
    #[must_use]
    pub const fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub(crate) fn mark_registered(&self) {
        *self.registration.write() = RegistrationState::Registered;
    }

    pub(crate) fn belongs_to(&self, core: &Arc<ModelCore>) -> bool {
        std::ptr::eq(self.model.as_ptr(), Arc::as_ptr(core))
    }

    /// Reads kind-specific data.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&D) -> R) -> R {
        f(&self.fields.read().data)
    }

    /// Mutates kind-specific data, then emits an update if registered.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut D) -> R) -> ModelResult<R> {
        self.update_fields(|fields| f(&mut fields.data))
    }

    /// Like [`update`](Self::update), but `f` decides under the model gate
    /// whether anything changed; no event is emitted when it returns false.
    pub(crate) fn update_if(&self, f: impl FnOnce(&mut D) -> bool) -> ModelResult<bool> {
        let core = self.model.upgrade();
        let _gate = core.as_ref().map(|core| core.gate.lock());

        let changed = f(&mut self.fields.write().data);
        if changed {
            self.notify_updated()?;
        }
        Ok(changed)
    }

    fn update_fields<R>(&self, f: impl FnOnce(&mut Fields<D>) -> R) -> ModelResult<R> {
        let core = self.model.upgrade();
        let _gate = core.as_ref().map(|core| core.gate.lock());

        let out = {
            let mut fields = self.fields.write();
            f(&mut *fields)
        };
        self.notify_updated()?;
        Ok(out)
    }

    /// Emits `Update` on the model's sink with this entity as payload, if
    /// registered. The field lock must not be held by the caller.
    fn notify_updated(&self) -> EventResult<()> {
        if !self.is_registered() {
            return Ok(());
        }
        // A registered entity whose model is gone has nobody to notify.
        let (Some(core), Some(me)) = (self.model.upgrade(), self.me.upgrade()) else {
            return Ok(());
        };
        let _gate = core.gate.lock();
        let payload: Arc<dyn AnyResource> = me;
        core.sink.receive(
            D::RESOURCE_TYPE,
            Operation::Update,
            self.id,
            &[Payload::Resource(payload)],
        )
    }

    pub(crate) fn link_with(&self, state: &ModelState)
    where
        D: Stored,
    {
        self.fields.write().data.link(state);
    }

    /// Points `slot` at `id`, caching the target if it is already stored.
    pub(crate) fn set_link_by_id<T: Stored>(
        &self,
        id: ResourceId,
        slot: fn(&mut D) -> &mut Option<LazyRef<T>>,
    ) -> ModelResult<()> {
        let core = self.model.upgrade();
        let _gate = core.as_ref().map(|core| core.gate.lock());

        let mut link = LazyRef::by_id(id);
        if let Some(target) = core.as_ref().and_then(|core| core.lookup::<T>(id)) {
            link.cache(&target);
        }
        self.update(|data| *slot(data) = Some(link))
    }

    pub(crate) fn set_link_by_ref<T: ResourceData>(
        &self,
        target: &Arc<Resource<T>>,
        slot: fn(&mut D) -> &mut Option<LazyRef<T>>,
    ) -> ModelResult<()> {
        let link = LazyRef::by_ref(target);
        self.update(|data| *slot(data) = Some(link))
    }

    /// Resolves `slot`: the cached target if any, otherwise one model lookup
    /// whose result is cached.
    pub(crate) fn resolve_link<T: Stored>(
        &self,
        slot: fn(&mut D) -> &mut Option<LazyRef<T>>,
    ) -> ModelResult<Option<Arc<Resource<T>>>> {
        let id = {
            let mut fields = self.fields.write();
            match slot(&mut fields.data) {
                None => return Ok(None),
                Some(link) => match link.cached() {
                    Some(hit) => return Ok(Some(hit)),
                    None => link.id(),
                },
            }
        };

        let core = self.model.upgrade().ok_or(ModelError::ModelDropped)?;
        let target = core
            .lookup::<T>(id)
            .ok_or_else(|| ModelError::not_found(T::RESOURCE_TYPE, id))?;
        trace!(from = %self.id, to = %id, resource_type = %T::RESOURCE_TYPE, "lazy reference resolved");

        let mut fields = self.fields.write();
        if let Some(link) = slot(&mut fields.data) {
            if link.id() == id {
                link.cache(&target);
            }
        }
        Ok(Some(target))
    }

    pub(crate) fn link_id<T: ResourceData>(
        &self,
        slot: fn(&D) -> &Option<LazyRef<T>>,
    ) -> Option<ResourceId> {
        self.read(|data| slot(data).as_ref().map(LazyRef::id))
    }
}

impl<D: ResourceData> EventSink for Resource<D> {
    /// Accepts annotation changes only, re-emitting them as an update of
    /// this entity.
    fn receive(
        &self,
        resource_type: ResourceType,
        _operation: Operation,
        _resource_id: ResourceId,
        _payload: &[Payload],
    ) -> EventResult<()> {
        if resource_type != ResourceType::Annotations {
            return Err(EventError::UnsupportedResourceType {
                sink: D::RESOURCE_TYPE.name(),
                resource_type,
            });
        }
        self.notify_updated()
    }
}

impl<D: ResourceData> AnyResource for Resource<D> {
    fn resource_type(&self) -> ResourceType {
        D::RESOURCE_TYPE
    }

    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn resource_display_name(&self) -> String {
        self.display_name()
    }

    fn resource_description(&self) -> String {
        self.description()
    }

    fn annotation_pairs(&self) -> Vec<(String, String)> {
        self.annotations.sorted_pairs()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<D: ResourceData> fmt::Debug for Resource<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(D::RESOURCE_TYPE.name());
        s.field("id", &self.id)
            .field("registration", &self.registration_state());
        match self.fields.try_read() {
            Some(fields) => s
                .field("display_name", &fields.display_name)
                .field("description", &fields.description)
                .field("data", &fields.data),
            None => s.field("fields", &"<locked>"),
        };
        s.field("annotations", &self.annotations).finish()
    }
}

/// Generates the four accessors of one lazy reference field.
macro_rules! lazy_ref_accessors {
    ($field:ident: $target:ty, $get_id:ident, $set_by_id:ident, $set_by_ref:ident) => {
        #[doc = concat!("Resolves `", stringify!($field), "`; `Ok(None)` when unset.")]
        ///
        /// # Errors
        ///
        /// The target kind's `NotFound` if the referenced id is not stored.
        pub fn $field(&self) -> $crate::error::ModelResult<Option<::std::sync::Arc<$target>>> {
            self.resolve_link(|data| &mut data.$field)
        }

        #[doc = concat!("Id held by `", stringify!($field), "`, without resolving it.")]
        #[must_use]
        pub fn $get_id(&self) -> Option<$crate::identity::ResourceId> {
            self.link_id(|data| &data.$field)
        }

        #[doc = concat!("Points `", stringify!($field), "` at an id; the target need not be stored yet.")]
        ///
        /// # Errors
        ///
        /// The sink's error, if registered and the update event is rejected.
        pub fn $set_by_id(&self, id: $crate::identity::ResourceId) -> $crate::error::ModelResult<()> {
            self.set_link_by_id(id, |data| &mut data.$field)
        }

        #[doc = concat!("Points `", stringify!($field), "` at an entity.")]
        ///
        /// # Errors
        ///
        /// The sink's error, if registered and the update event is rejected.
        pub fn $set_by_ref(&self, target: &::std::sync::Arc<$target>) -> $crate::error::ModelResult<()> {
            self.set_link_by_ref(target, |data| &mut data.$field)
        }
    };
}

pub(crate) use lazy_ref_accessors;
