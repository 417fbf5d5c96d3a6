use std::sync::Arc;

use crate::object::{Object, ObjectRef, INVALID_OBJECT_INDEX};
use crate::registry::{ReflectClass, TypeDescriptor, TypeRegistry};

/// Central allocation and ownership gate for reflected objects.
///
/// Every instance is constructed here, receives its UUID and slot index
/// here, and is released here; the factory also carries the registry so one
/// value threads the whole object-model context through a program. Distinct
/// factories are fully isolated, which is what the tests rely on.
pub struct ObjectFactory {
    registry: TypeRegistry,
    next_uuid: u32,
    slots: Vec<Option<ObjectRef>>,
    free_slots: Vec<u32>,
}

impl Default for ObjectFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectFactory {
    pub fn new() -> Self {
        Self {
            registry: TypeRegistry::new(),
            next_uuid: 1,
            slots: Vec::new(),
            free_slots: Vec::new(),
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    pub fn class_of<T: ReflectClass>(&mut self) -> Arc<TypeDescriptor> {
        self.registry.class_of::<T>()
    }

    /// Constructs a default instance of `T` and adopts it into a slot.
    pub fn spawn<T: ReflectClass>(&mut self) -> ObjectRef {
        let descriptor = self.registry.class_of::<T>();
        self.spawn_from(&descriptor)
    }

    /// Constructs an instance of the named class, if it is registered.
    pub fn spawn_by_name(&mut self, name: &str) -> Option<ObjectRef> {
        let descriptor = self.registry.find_class(name)?;
        Some(self.spawn_from(&descriptor))
    }

    fn spawn_from(&mut self, descriptor: &TypeDescriptor) -> ObjectRef {
        let object = descriptor.construct();
        {
            let mut guard = object.write();
            guard.core_mut().uuid = self.generate_uuid();
        }
        self.install(&object);
        object
    }

    /// Two-stage deep copy: memberwise clone of the source's dynamic type,
    /// then the fix-up hook chain, then adoption into a fresh slot.
    ///
    /// Always returns an instance of the same dynamic type with a new UUID;
    /// never fails.
    pub fn duplicate(&mut self, source: &ObjectRef) -> ObjectRef {
        let clone = source.read().clone_object();
        clone.write().duplicate_sub_objects(self);
        self.install(&clone);
        clone
    }

    /// Releases the factory's owning reference to the object.
    ///
    /// Returns false when the object does not occupy one of this factory's
    /// slots. Outstanding handles keep the instance alive until dropped.
    pub fn destroy(&mut self, object: &ObjectRef) -> bool {
        let index = object.read().internal_index();
        let Some(slot) = self.slots.get_mut(index as usize) else {
            return false;
        };
        let occupied = slot
            .as_ref()
            .is_some_and(|resident| Arc::ptr_eq(resident, object));
        if !occupied {
            return false;
        }
        *slot = None;
        self.free_slots.push(index);
        object.write().core_mut().internal_index = INVALID_OBJECT_INDEX;
        true
    }

    /// Object resident in the given slot, if any.
    pub fn get(&self, index: u32) -> Option<ObjectRef> {
        self.slots.get(index as usize)?.as_ref().map(Arc::clone)
    }

    pub fn find_by_uuid(&self, uuid: u32) -> Option<ObjectRef> {
        self.slots
            .iter()
            .flatten()
            .find(|object| object.read().uuid() == uuid)
            .map(Arc::clone)
    }

    /// Handles of every live object, in slot order.
    pub fn live_objects(&self) -> Vec<ObjectRef> {
        self.slots.iter().flatten().map(Arc::clone).collect()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Issues the next UUID and advances the counter.
    pub fn generate_uuid(&mut self) -> u32 {
        let uuid = self.next_uuid;
        self.next_uuid += 1;
        uuid
    }

    /// The UUID the next allocation will receive, without advancing.
    pub fn peek_next_uuid(&self) -> u32 {
        self.next_uuid
    }

    /// Re-seats the UUID counter, e.g. when restoring a saved scene.
    pub fn set_next_uuid(&mut self, next: u32) {
        self.next_uuid = next;
    }

    fn install(&mut self, object: &ObjectRef) {
        let index = match self.free_slots.pop() {
            Some(index) => index,
            None => {
                self.slots.push(None);
                (self.slots.len() - 1) as u32
            }
        };
        object.write().core_mut().internal_index = index;
        self.slots[index as usize] = Some(Arc::clone(object));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectBase;

    fn factory_with_base() -> ObjectFactory {
        let mut factory = ObjectFactory::new();
        factory.class_of::<ObjectBase>();
        factory
    }

    #[test]
    fn spawn_assigns_monotonic_uuids_and_slots() {
        let mut factory = factory_with_base();
        let first = factory.spawn::<ObjectBase>();
        let second = factory.spawn::<ObjectBase>();
        assert_eq!(first.read().uuid(), 1);
        assert_eq!(second.read().uuid(), 2);
        assert_eq!(first.read().internal_index(), 0);
        assert_eq!(second.read().internal_index(), 1);
        assert_eq!(factory.live_count(), 2);
    }

    #[test]
    fn spawn_by_name_resolves_registered_classes() {
        let mut factory = factory_with_base();
        let object = factory.spawn_by_name("object").expect("registered class");
        assert_eq!(object.read().class_name(), "Object");
        assert!(factory.spawn_by_name("Phantom").is_none());
    }

    #[test]
    fn destroy_frees_slot_for_reuse() {
        let mut factory = factory_with_base();
        let first = factory.spawn::<ObjectBase>();
        let index = first.read().internal_index();
        assert!(factory.destroy(&first));
        assert!(!factory.destroy(&first));
        assert_eq!(factory.live_count(), 0);

        let second = factory.spawn::<ObjectBase>();
        assert_eq!(second.read().internal_index(), index);
    }

    #[test]
    fn duplicate_issues_fresh_identity() {
        let mut factory = factory_with_base();
        let source = factory.spawn::<ObjectBase>();
        source.write().core_mut().name = "Prototype".into();

        let copy = factory.duplicate(&source);
        assert!(!Arc::ptr_eq(&source, &copy));
        assert_eq!(copy.read().class_name(), "Object");
        assert_ne!(copy.read().uuid(), source.read().uuid());
        assert_eq!(copy.read().name().as_str(), "Prototype");
        assert_eq!(factory.live_count(), 2);
    }

    #[test]
    fn uuid_counter_can_be_checkpointed() {
        let mut factory = factory_with_base();
        factory.set_next_uuid(40);
        assert_eq!(factory.peek_next_uuid(), 40);
        let object = factory.spawn::<ObjectBase>();
        assert_eq!(object.read().uuid(), 40);
        assert_eq!(factory.peek_next_uuid(), 41);
    }

    #[test]
    fn lookup_by_uuid_and_slot() {
        let mut factory = factory_with_base();
        let object = factory.spawn::<ObjectBase>();
        let uuid = object.read().uuid();
        let index = object.read().internal_index();
        assert!(factory
            .find_by_uuid(uuid)
            .is_some_and(|found| Arc::ptr_eq(&found, &object)));
        assert!(factory
            .get(index)
            .is_some_and(|found| Arc::ptr_eq(&found, &object)));
        assert!(factory.get(99).is_none());
    }
}
