use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::factory::ObjectFactory;
use crate::name::Name;
use crate::property::PropertyTable;
use crate::registry::{ReflectClass, TypeDescriptor, TypeRegistry};

/// Slot index value of an object that has not been adopted by a factory.
pub const INVALID_OBJECT_INDEX: u32 = u32::MAX;

/// Shared handle to a reflected object.
pub type ObjectRef = Arc<RwLock<dyn Object>>;

/// Non-owning handle; duplication leaves these aliasing the original target.
pub type WeakObjectRef = Weak<RwLock<dyn Object>>;

/// Identity state carried by every object instance.
///
/// The UUID and slot index are issued by the factory and are not meant to be
/// assigned anywhere else; duplication re-issues both for the copy.
#[derive(Debug, Clone)]
pub struct ObjectCore {
    pub(crate) uuid: u32,
    pub(crate) internal_index: u32,
    pub name: Name,
}

impl ObjectCore {
    pub fn uuid(&self) -> u32 {
        self.uuid
    }

    pub fn internal_index(&self) -> u32 {
        self.internal_index
    }
}

impl Default for ObjectCore {
    fn default() -> Self {
        Self {
            uuid: 0,
            internal_index: INVALID_OBJECT_INDEX,
            name: Name::none(),
        }
    }
}

/// Runtime capability shared by objects and nested aggregates: dynamic type
/// access plus visibility of the embedded parent layer, if any.
pub trait Reflected: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The embedded parent layer; `None` for root types and plain aggregates.
    fn base(&self) -> Option<&dyn Reflected> {
        None
    }

    fn base_mut(&mut self) -> Option<&mut dyn Reflected> {
        None
    }
}

/// Capability every reflected engine object implements.
pub trait Object: Reflected {
    fn core(&self) -> &ObjectCore;
    fn core_mut(&mut self) -> &mut ObjectCore;

    /// Name of the dynamic class, matching its descriptor in the registry.
    fn class_name(&self) -> &'static str;

    fn as_reflected(&self) -> &dyn Reflected;
    fn as_reflected_mut(&mut self) -> &mut dyn Reflected;

    /// Produces a fresh handle holding a memberwise copy of `self` with the
    /// same dynamic type. Shared handles in the copy alias the source's
    /// referents until `duplicate_sub_objects` runs.
    fn clone_object(&self) -> ObjectRef;

    /// Second stage of duplication. Implementations must invoke the embedded
    /// base layer's hook first, then replace each owned sub-object handle
    /// with an independent duplicate; non-owning references stay untouched.
    /// The root hook re-issues the UUID.
    fn duplicate_sub_objects(&mut self, factory: &mut ObjectFactory);

    fn uuid(&self) -> u32 {
        self.core().uuid
    }

    fn internal_index(&self) -> u32 {
        self.core().internal_index
    }

    fn name(&self) -> &Name {
        &self.core().name
    }

    /// The dynamic type's descriptor, if the type has been registered.
    fn class(&self, registry: &TypeRegistry) -> Option<Arc<TypeDescriptor>>
    where
        Self: Sized,
    {
        registry.class_of_instance(self)
    }
}

/// Checked downcast across the embedding chain.
///
/// Walks from the dynamic type down through each embedded base layer and
/// returns the first layer of type `T`; total, never panics. Succeeds
/// exactly when the instance's class is `T` or a descendant of it.
pub fn cast<T: Reflected>(host: &dyn Reflected) -> Option<&T> {
    let mut layer = Some(host);
    while let Some(current) = layer {
        if let Some(hit) = current.as_any().downcast_ref::<T>() {
            return Some(hit);
        }
        layer = current.base();
    }
    None
}

/// Mutable counterpart of [`cast`].
pub fn cast_mut<T: Reflected>(host: &mut dyn Reflected) -> Option<&mut T> {
    if host.as_any().type_id() == TypeId::of::<T>() {
        return host.as_any_mut().downcast_mut::<T>();
    }
    host.base_mut().and_then(cast_mut::<T>)
}

/// Whether the instance's dynamic class is `T` or derives from it.
pub fn is_a<T: Reflected>(host: &dyn Reflected) -> bool {
    cast::<T>(host).is_some()
}

/// Root of the reflected class hierarchy.
#[derive(Debug, Clone, Default)]
pub struct ObjectBase {
    core: ObjectCore,
}

impl Reflected for ObjectBase {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Object for ObjectBase {
    fn core(&self) -> &ObjectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        &mut self.core
    }

    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn as_reflected(&self) -> &dyn Reflected {
        self
    }

    fn as_reflected_mut(&mut self) -> &mut dyn Reflected {
        self
    }

    fn clone_object(&self) -> ObjectRef {
        let handle: ObjectRef = Arc::new(RwLock::new(self.clone()));
        handle
    }

    fn duplicate_sub_objects(&mut self, factory: &mut ObjectFactory) {
        self.core.uuid = factory.generate_uuid();
    }
}

impl ReflectClass for ObjectBase {
    const CLASS_NAME: &'static str = "Object";

    fn super_descriptor(_registry: &mut TypeRegistry) -> Option<Arc<TypeDescriptor>> {
        None
    }

    fn register_properties(table: &mut PropertyTable) {
        table.name(
            "Name",
            |o: &ObjectBase| &o.core.name,
            |o: &mut ObjectBase| &mut o.core.name,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Widget {
        base: ObjectBase,
        value: i32,
    }

    impl Reflected for Widget {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        fn base(&self) -> Option<&dyn Reflected> {
            Some(&self.base)
        }

        fn base_mut(&mut self) -> Option<&mut dyn Reflected> {
            Some(&mut self.base)
        }
    }

    impl Object for Widget {
        fn core(&self) -> &ObjectCore {
            self.base.core()
        }

        fn core_mut(&mut self) -> &mut ObjectCore {
            self.base.core_mut()
        }

        fn class_name(&self) -> &'static str {
            "Widget"
        }

        fn as_reflected(&self) -> &dyn Reflected {
            self
        }

        fn as_reflected_mut(&mut self) -> &mut dyn Reflected {
            self
        }

        fn clone_object(&self) -> ObjectRef {
            let handle: ObjectRef = Arc::new(RwLock::new(self.clone()));
            handle
        }

        fn duplicate_sub_objects(&mut self, factory: &mut ObjectFactory) {
            self.base.duplicate_sub_objects(factory);
        }
    }

    #[test]
    fn cast_reaches_embedded_base_layer() {
        let widget = Widget {
            value: 7,
            ..Widget::default()
        };
        assert!(cast::<Widget>(&widget).is_some());
        assert!(cast::<ObjectBase>(&widget).is_some());
        assert_eq!(cast::<Widget>(&widget).map(|w| w.value), Some(7));
    }

    #[test]
    fn cast_fails_for_unrelated_type() {
        let base = ObjectBase::default();
        assert!(cast::<Widget>(&base).is_none());
        assert!(!is_a::<Widget>(&base));
        assert!(is_a::<ObjectBase>(&base));
    }

    #[test]
    fn cast_mut_mutates_through_layers() {
        let mut widget = Widget::default();
        cast_mut::<ObjectBase>(&mut widget)
            .expect("base layer")
            .core_mut()
            .name = Name::new("Gizmo");
        assert_eq!(widget.name().as_str(), "Gizmo");
    }

    #[test]
    fn fresh_objects_carry_unassigned_identity() {
        let widget = Widget::default();
        assert_eq!(widget.uuid(), 0);
        assert_eq!(widget.internal_index(), INVALID_OBJECT_INDEX);
    }
}
