use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;

use crate::color::LinearColor;
use crate::name::Name;
use crate::object::{cast, cast_mut, Reflected};
use crate::resources::{AssetHandle, AssetKind};

/// Semantic kind of a reflected property, used for serializer dispatch.
///
/// `Array` and `Map` carry their element/key kinds in the descriptor's
/// `inner`/`key` fields; `Struct` carries the aggregate type name. `Object`
/// marks a generic object reference, which the serializer never persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Bool,
    Int32,
    Float,
    Vector3,
    LinearColor,
    String,
    Name,
    Enum,
    Asset(AssetKind),
    Curve,
    Array,
    Map,
    Struct,
    Object,
}

/// Editor-facing metadata; the serializer ignores it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyMeta {
    pub category: Option<&'static str>,
    pub tooltip: Option<&'static str>,
    pub range: Option<(f32, f32)>,
}

/// Getter/setter pair bound to one field at registration time.
///
/// Accessors resolve their declaring layer through the embedding chain, so a
/// parent class's accessor works on any descendant instance.
pub struct FieldAccess<T: 'static> {
    get: Arc<dyn Fn(&dyn Reflected) -> Option<&T> + Send + Sync>,
    get_mut: Arc<dyn Fn(&mut dyn Reflected) -> Option<&mut T> + Send + Sync>,
}

impl<T: 'static> FieldAccess<T> {
    pub fn bind<C: Reflected>(
        project: fn(&C) -> &T,
        project_mut: fn(&mut C) -> &mut T,
    ) -> Self {
        Self {
            get: Arc::new(move |host| cast::<C>(host).map(project)),
            get_mut: Arc::new(move |host| cast_mut::<C>(host).map(project_mut)),
        }
    }

    pub fn get<'a>(&self, host: &'a dyn Reflected) -> Option<&'a T> {
        (self.get)(host)
    }

    pub fn get_mut<'a>(&self, host: &'a mut dyn Reflected) -> Option<&'a mut T> {
        (self.get_mut)(host)
    }
}

impl<T: 'static> Clone for FieldAccess<T> {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            get_mut: Arc::clone(&self.get_mut),
        }
    }
}

/// Accessor for enum fields, exchanging values as integer ordinals.
pub struct EnumAccess {
    get: Arc<dyn Fn(&dyn Reflected) -> Option<i32> + Send + Sync>,
    set: Arc<dyn Fn(&mut dyn Reflected, i32) + Send + Sync>,
}

impl EnumAccess {
    /// Binds an enum field; setting an ordinal the enum cannot represent is
    /// ignored, leaving the current value in place.
    pub fn bind<C, E>(project: fn(&C) -> &E, project_mut: fn(&mut C) -> &mut E) -> Self
    where
        C: Reflected,
        E: Copy + Into<i32> + TryFrom<i32> + 'static,
    {
        Self {
            get: Arc::new(move |host| cast::<C>(host).map(|c| (*project(c)).into())),
            set: Arc::new(move |host, raw| {
                if let (Some(c), Ok(value)) = (cast_mut::<C>(host), E::try_from(raw)) {
                    *project_mut(c) = value;
                }
            }),
        }
    }

    pub fn ordinal(&self, host: &dyn Reflected) -> Option<i32> {
        (self.get)(host)
    }

    pub fn set_ordinal(&self, host: &mut dyn Reflected, ordinal: i32) {
        (self.set)(host, ordinal)
    }
}

impl Clone for EnumAccess {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

/// Accessor for nested aggregate fields, exposing the aggregate as a
/// reflected value so its own property list can be applied to it.
pub struct AggregateAccess {
    get: Arc<dyn Fn(&dyn Reflected) -> Option<&dyn Reflected> + Send + Sync>,
    get_mut: Arc<dyn Fn(&mut dyn Reflected) -> Option<&mut dyn Reflected> + Send + Sync>,
}

impl AggregateAccess {
    pub fn bind<C: Reflected, S: Reflected>(
        project: fn(&C) -> &S,
        project_mut: fn(&mut C) -> &mut S,
    ) -> Self {
        Self {
            get: Arc::new(move |host| {
                cast::<C>(host).map(|c| project(c) as &dyn Reflected)
            }),
            get_mut: Arc::new(move |host| {
                cast_mut::<C>(host).map(|c| project_mut(c) as &mut dyn Reflected)
            }),
        }
    }

    pub fn get<'a>(&self, host: &'a dyn Reflected) -> Option<&'a dyn Reflected> {
        (self.get)(host)
    }

    pub fn get_mut<'a>(&self, host: &'a mut dyn Reflected) -> Option<&'a mut dyn Reflected> {
        (self.get_mut)(host)
    }
}

impl Clone for AggregateAccess {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            get_mut: Arc::clone(&self.get_mut),
        }
    }
}

/// Typed storage behind a property, when the engine can serialize it.
///
/// `None` marks a property declared for tooling whose shape the serializer
/// does not support; such fields are skipped with a diagnostic.
#[derive(Clone)]
pub enum PropertyStorage {
    Bool(FieldAccess<bool>),
    Int32(FieldAccess<i32>),
    Float(FieldAccess<f32>),
    Vector3(FieldAccess<Vec3>),
    Color(FieldAccess<LinearColor>),
    String(FieldAccess<String>),
    Name(FieldAccess<Name>),
    Enum(EnumAccess),
    Asset(FieldAccess<Option<AssetHandle>>),
    Curve(FieldAccess<[f32; 4]>),
    BoolArray(FieldAccess<Vec<bool>>),
    Int32Array(FieldAccess<Vec<i32>>),
    FloatArray(FieldAccess<Vec<f32>>),
    StringArray(FieldAccess<Vec<String>>),
    SoundArray(FieldAccess<Vec<Option<AssetHandle>>>),
    StringInt32Map(FieldAccess<HashMap<String, i32>>),
    StringFloatMap(FieldAccess<HashMap<String, f32>>),
    StringStringMap(FieldAccess<HashMap<String, String>>),
    StringBoolMap(FieldAccess<HashMap<String, bool>>),
    Int32StringMap(FieldAccess<HashMap<i32, String>>),
    Aggregate(AggregateAccess),
    None,
}

/// Metadata and accessor for one serializable field of a reflected type.
#[derive(Clone)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub tag: TypeTag,
    pub inner: Option<TypeTag>,
    pub key: Option<TypeTag>,
    pub struct_name: Option<&'static str>,
    pub meta: PropertyMeta,
    pub storage: PropertyStorage,
}

impl PropertyDescriptor {
    pub fn category(&mut self, category: &'static str) -> &mut Self {
        self.meta.category = Some(category);
        self
    }

    pub fn tooltip(&mut self, tooltip: &'static str) -> &mut Self {
        self.meta.tooltip = Some(tooltip);
        self
    }

    pub fn range(&mut self, min: f32, max: f32) -> &mut Self {
        self.meta.range = Some((min, max));
        self
    }
}

/// Ordered property list under construction for one type.
///
/// The registry seeds a child type's table with its parent's descriptors
/// before the type's own registration runs, so inherited properties always
/// precede declared ones.
#[derive(Clone, Default)]
pub struct PropertyTable {
    properties: Vec<PropertyDescriptor>,
}

impl PropertyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend_from(&mut self, properties: &[PropertyDescriptor]) {
        self.properties.extend_from_slice(properties);
    }

    pub fn into_vec(self) -> Vec<PropertyDescriptor> {
        self.properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PropertyDescriptor> {
        self.properties.iter()
    }

    pub fn find(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    fn push(&mut self, descriptor: PropertyDescriptor) -> &mut PropertyDescriptor {
        self.properties.push(descriptor);
        self.properties.last_mut().expect("descriptor just pushed")
    }

    fn push_plain(&mut self, name: &'static str, tag: TypeTag, storage: PropertyStorage) -> &mut PropertyDescriptor {
        self.push(PropertyDescriptor {
            name,
            tag,
            inner: None,
            key: None,
            struct_name: None,
            meta: PropertyMeta::default(),
            storage,
        })
    }

    pub fn boolean<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &bool,
        project_mut: fn(&mut C) -> &mut bool,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::Bool(FieldAccess::bind(project, project_mut));
        self.push_plain(name, TypeTag::Bool, storage)
    }

    pub fn int32<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &i32,
        project_mut: fn(&mut C) -> &mut i32,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::Int32(FieldAccess::bind(project, project_mut));
        self.push_plain(name, TypeTag::Int32, storage)
    }

    pub fn float<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &f32,
        project_mut: fn(&mut C) -> &mut f32,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::Float(FieldAccess::bind(project, project_mut));
        self.push_plain(name, TypeTag::Float, storage)
    }

    pub fn vector3<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &Vec3,
        project_mut: fn(&mut C) -> &mut Vec3,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::Vector3(FieldAccess::bind(project, project_mut));
        self.push_plain(name, TypeTag::Vector3, storage)
    }

    pub fn color<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &LinearColor,
        project_mut: fn(&mut C) -> &mut LinearColor,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::Color(FieldAccess::bind(project, project_mut));
        self.push_plain(name, TypeTag::LinearColor, storage)
    }

    pub fn string<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &String,
        project_mut: fn(&mut C) -> &mut String,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::String(FieldAccess::bind(project, project_mut));
        self.push_plain(name, TypeTag::String, storage)
    }

    pub fn name<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &Name,
        project_mut: fn(&mut C) -> &mut Name,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::Name(FieldAccess::bind(project, project_mut));
        self.push_plain(name, TypeTag::Name, storage)
    }

    /// Enum values persist as integer ordinals: renaming variants is safe
    /// for saved documents, reordering them is not.
    pub fn enumeration<C, E>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &E,
        project_mut: fn(&mut C) -> &mut E,
    ) -> &mut PropertyDescriptor
    where
        C: Reflected,
        E: Copy + Into<i32> + TryFrom<i32> + 'static,
    {
        let storage = PropertyStorage::Enum(EnumAccess::bind(project, project_mut));
        self.push_plain(name, TypeTag::Enum, storage)
    }

    pub fn asset<C: Reflected>(
        &mut self,
        name: &'static str,
        kind: AssetKind,
        project: fn(&C) -> &Option<AssetHandle>,
        project_mut: fn(&mut C) -> &mut Option<AssetHandle>,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::Asset(FieldAccess::bind(project, project_mut));
        self.push_plain(name, TypeTag::Asset(kind), storage)
    }

    pub fn curve<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &[f32; 4],
        project_mut: fn(&mut C) -> &mut [f32; 4],
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::Curve(FieldAccess::bind(project, project_mut));
        self.push_plain(name, TypeTag::Curve, storage)
    }

    pub fn array_bool<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &Vec<bool>,
        project_mut: fn(&mut C) -> &mut Vec<bool>,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::BoolArray(FieldAccess::bind(project, project_mut));
        let descriptor = self.push_plain(name, TypeTag::Array, storage);
        descriptor.inner = Some(TypeTag::Bool);
        descriptor
    }

    pub fn array_int32<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &Vec<i32>,
        project_mut: fn(&mut C) -> &mut Vec<i32>,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::Int32Array(FieldAccess::bind(project, project_mut));
        let descriptor = self.push_plain(name, TypeTag::Array, storage);
        descriptor.inner = Some(TypeTag::Int32);
        descriptor
    }

    pub fn array_float<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &Vec<f32>,
        project_mut: fn(&mut C) -> &mut Vec<f32>,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::FloatArray(FieldAccess::bind(project, project_mut));
        let descriptor = self.push_plain(name, TypeTag::Array, storage);
        descriptor.inner = Some(TypeTag::Float);
        descriptor
    }

    pub fn array_string<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &Vec<String>,
        project_mut: fn(&mut C) -> &mut Vec<String>,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::StringArray(FieldAccess::bind(project, project_mut));
        let descriptor = self.push_plain(name, TypeTag::Array, storage);
        descriptor.inner = Some(TypeTag::String);
        descriptor
    }

    pub fn array_sound<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &Vec<Option<AssetHandle>>,
        project_mut: fn(&mut C) -> &mut Vec<Option<AssetHandle>>,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::SoundArray(FieldAccess::bind(project, project_mut));
        let descriptor = self.push_plain(name, TypeTag::Array, storage);
        descriptor.inner = Some(TypeTag::Asset(AssetKind::Sound));
        descriptor
    }

    pub fn map_string_int32<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &HashMap<String, i32>,
        project_mut: fn(&mut C) -> &mut HashMap<String, i32>,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::StringInt32Map(FieldAccess::bind(project, project_mut));
        let descriptor = self.push_plain(name, TypeTag::Map, storage);
        descriptor.key = Some(TypeTag::String);
        descriptor.inner = Some(TypeTag::Int32);
        descriptor
    }

    pub fn map_string_float<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &HashMap<String, f32>,
        project_mut: fn(&mut C) -> &mut HashMap<String, f32>,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::StringFloatMap(FieldAccess::bind(project, project_mut));
        let descriptor = self.push_plain(name, TypeTag::Map, storage);
        descriptor.key = Some(TypeTag::String);
        descriptor.inner = Some(TypeTag::Float);
        descriptor
    }

    pub fn map_string_string<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &HashMap<String, String>,
        project_mut: fn(&mut C) -> &mut HashMap<String, String>,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::StringStringMap(FieldAccess::bind(project, project_mut));
        let descriptor = self.push_plain(name, TypeTag::Map, storage);
        descriptor.key = Some(TypeTag::String);
        descriptor.inner = Some(TypeTag::String);
        descriptor
    }

    pub fn map_string_bool<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &HashMap<String, bool>,
        project_mut: fn(&mut C) -> &mut HashMap<String, bool>,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::StringBoolMap(FieldAccess::bind(project, project_mut));
        let descriptor = self.push_plain(name, TypeTag::Map, storage);
        descriptor.key = Some(TypeTag::String);
        descriptor.inner = Some(TypeTag::Bool);
        descriptor
    }

    pub fn map_int32_string<C: Reflected>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &HashMap<i32, String>,
        project_mut: fn(&mut C) -> &mut HashMap<i32, String>,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::Int32StringMap(FieldAccess::bind(project, project_mut));
        let descriptor = self.push_plain(name, TypeTag::Map, storage);
        descriptor.key = Some(TypeTag::Int32);
        descriptor.inner = Some(TypeTag::String);
        descriptor
    }

    pub fn aggregate<C: Reflected, S: crate::registry::ReflectStruct>(
        &mut self,
        name: &'static str,
        project: fn(&C) -> &S,
        project_mut: fn(&mut C) -> &mut S,
    ) -> &mut PropertyDescriptor {
        let storage = PropertyStorage::Aggregate(AggregateAccess::bind(project, project_mut));
        let descriptor = self.push_plain(name, TypeTag::Struct, storage);
        descriptor.struct_name = Some(S::STRUCT_NAME);
        descriptor
    }

    /// Declares a generic object reference. The serializer never persists
    /// these; the descriptor exists for tooling.
    pub fn object_ref(&mut self, name: &'static str) -> &mut PropertyDescriptor {
        self.push_plain(name, TypeTag::Object, PropertyStorage::None)
    }

    /// Declares a property without serializable storage, e.g. a container
    /// shape the engine does not persist. The serializer skips it with a
    /// diagnostic.
    pub fn declare(
        &mut self,
        name: &'static str,
        tag: TypeTag,
        inner: Option<TypeTag>,
        key: Option<TypeTag>,
    ) -> &mut PropertyDescriptor {
        let descriptor = self.push_plain(name, tag, PropertyStorage::None);
        descriptor.inner = inner;
        descriptor.key = key;
        descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectBase;
    use std::any::Any;

    #[derive(Debug, Clone, Default)]
    struct Probe {
        flag: bool,
        speed: f32,
    }

    impl Reflected for Probe {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn probe_table() -> PropertyTable {
        let mut table = PropertyTable::new();
        table.boolean("Flag", |p: &Probe| &p.flag, |p: &mut Probe| &mut p.flag);
        table
            .float("Speed", |p: &Probe| &p.speed, |p: &mut Probe| &mut p.speed)
            .category("Movement")
            .tooltip("Units per second")
            .range(0.0, 10.0);
        table
    }

    #[test]
    fn accessors_read_and_write_fields() {
        let table = probe_table();
        let mut probe = Probe::default();

        let flag = table.find("Flag").expect("flag property");
        match &flag.storage {
            PropertyStorage::Bool(access) => {
                assert_eq!(access.get(&probe), Some(&false));
                *access.get_mut(&mut probe).expect("writable") = true;
            }
            _ => panic!("unexpected storage"),
        }
        assert!(probe.flag);
    }

    #[test]
    fn metadata_chains_onto_descriptor() {
        let table = probe_table();
        let speed = table.find("Speed").expect("speed property");
        assert_eq!(speed.meta.category, Some("Movement"));
        assert_eq!(speed.meta.tooltip, Some("Units per second"));
        assert_eq!(speed.meta.range, Some((0.0, 10.0)));
    }

    #[test]
    fn accessor_rejects_foreign_instance() {
        let table = probe_table();
        let other = ObjectBase::default();
        let flag = table.find("Flag").expect("flag property");
        match &flag.storage {
            PropertyStorage::Bool(access) => assert!(access.get(&other).is_none()),
            _ => panic!("unexpected storage"),
        }
    }

    #[test]
    fn container_declarations_record_shape() {
        let mut table = PropertyTable::new();
        table.declare(
            "Waypoints",
            TypeTag::Array,
            Some(TypeTag::Vector3),
            None,
        );
        let declared = table.find("Waypoints").expect("declared property");
        assert_eq!(declared.tag, TypeTag::Array);
        assert_eq!(declared.inner, Some(TypeTag::Vector3));
        assert!(matches!(declared.storage, PropertyStorage::None));
    }
}
