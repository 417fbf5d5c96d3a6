use std::any::TypeId;
use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::object::{Object, ObjectRef, Reflected};
use crate::property::{PropertyDescriptor, PropertyTable};

/// Registration capability every reflected class implements.
///
/// The registry drives registration: it resolves the parent descriptor,
/// seeds the property table with the parent's list, and only then invokes
/// `register_properties`, so the merge order cannot be skipped by an
/// implementation.
pub trait ReflectClass: Object + Default {
    const CLASS_NAME: &'static str;

    /// Descriptor of the parent class; `None` for root types.
    fn super_descriptor(registry: &mut TypeRegistry) -> Option<Arc<TypeDescriptor>>;

    fn register_properties(table: &mut PropertyTable);
}

/// Registration capability for nested aggregates (plain reflected structs).
pub trait ReflectStruct: Reflected + Default {
    const STRUCT_NAME: &'static str;

    fn register_properties(table: &mut PropertyTable);
}

/// Immutable metadata record describing one reflected class.
///
/// Exactly one descriptor exists per concrete type within a registry; it is
/// created lazily on first access and never mutated afterwards.
pub struct TypeDescriptor {
    name: &'static str,
    parent: Option<Arc<TypeDescriptor>>,
    instance_size: usize,
    properties: Vec<PropertyDescriptor>,
    construct: fn() -> ObjectRef,
}

impl TypeDescriptor {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&Arc<TypeDescriptor>> {
        self.parent.as_ref()
    }

    pub fn instance_size(&self) -> usize {
        self.instance_size
    }

    /// Merged property list: parent properties first, declaration order.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Builds a default instance of the described class.
    pub fn construct(&self) -> ObjectRef {
        (self.construct)()
    }

    /// Whether this class is `other` or a descendant of it, walking the
    /// parent chain by descriptor identity.
    pub fn is_child_of(&self, other: &TypeDescriptor) -> bool {
        let mut current = Some(self);
        while let Some(descriptor) = current {
            if std::ptr::eq(descriptor, other) {
                return true;
            }
            current = descriptor.parent.as_deref();
        }
        false
    }
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name))
            .field("instance_size", &self.instance_size)
            .field("properties", &self.properties.len())
            .finish()
    }
}

/// Property list of a nested aggregate type, looked up by name during
/// serialization.
pub struct StructDescriptor {
    name: &'static str,
    properties: Vec<PropertyDescriptor>,
}

impl StructDescriptor {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }
}

/// Append-only table of class and aggregate descriptors.
///
/// Registration is expected to finish before concurrent use begins; the
/// registry itself does no locking.
#[derive(Default)]
pub struct TypeRegistry {
    classes: Vec<Arc<TypeDescriptor>>,
    classes_by_id: HashMap<TypeId, Arc<TypeDescriptor>>,
    structs: Vec<Arc<StructDescriptor>>,
    structs_by_id: HashMap<TypeId, Arc<StructDescriptor>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptor of `T`, created and registered on first access. Every
    /// call returns the same shared descriptor.
    pub fn class_of<T: ReflectClass>(&mut self) -> Arc<TypeDescriptor> {
        if let Some(existing) = self.classes_by_id.get(&TypeId::of::<T>()) {
            return Arc::clone(existing);
        }

        let parent = T::super_descriptor(self);
        let mut table = PropertyTable::new();
        if let Some(parent) = &parent {
            table.extend_from(parent.properties());
        }
        T::register_properties(&mut table);

        let descriptor = Arc::new(TypeDescriptor {
            name: T::CLASS_NAME,
            parent,
            instance_size: mem::size_of::<T>(),
            properties: table.into_vec(),
            construct: construct_default::<T>,
        });
        self.classes.push(Arc::clone(&descriptor));
        self.classes_by_id
            .insert(TypeId::of::<T>(), Arc::clone(&descriptor));
        descriptor
    }

    /// Descriptor matching an instance's dynamic type, if registered.
    pub fn class_of_instance(&self, object: &dyn Object) -> Option<Arc<TypeDescriptor>> {
        self.classes_by_id
            .get(&object.as_any().type_id())
            .map(Arc::clone)
    }

    /// Case-insensitive linear scan over the registered classes.
    pub fn find_class(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.classes
            .iter()
            .find(|descriptor| descriptor.name.eq_ignore_ascii_case(name))
            .map(Arc::clone)
    }

    /// All registered classes in registration order.
    pub fn classes(&self) -> &[Arc<TypeDescriptor>] {
        &self.classes
    }

    /// Aggregate descriptor of `S`, created and registered on first access.
    pub fn struct_of<S: ReflectStruct>(&mut self) -> Arc<StructDescriptor> {
        if let Some(existing) = self.structs_by_id.get(&TypeId::of::<S>()) {
            return Arc::clone(existing);
        }

        let mut table = PropertyTable::new();
        S::register_properties(&mut table);
        let descriptor = Arc::new(StructDescriptor {
            name: S::STRUCT_NAME,
            properties: table.into_vec(),
        });
        self.structs.push(Arc::clone(&descriptor));
        self.structs_by_id
            .insert(TypeId::of::<S>(), Arc::clone(&descriptor));
        descriptor
    }

    pub fn find_struct(&self, name: &str) -> Option<Arc<StructDescriptor>> {
        self.structs
            .iter()
            .find(|descriptor| descriptor.name.eq_ignore_ascii_case(name))
            .map(Arc::clone)
    }
}

fn construct_default<T: ReflectClass>() -> ObjectRef {
    let handle: ObjectRef = Arc::new(RwLock::new(T::default()));
    handle
}
