//! Reflection-driven serialization of objects to and from documents.
//!
//! Loading is best-effort: a missing or mismatched node leaves the current
//! field value untouched, an unresolvable asset path becomes a null
//! reference, and unsupported container shapes are skipped with a warning.
//! Saving writes every supported property under its declared name, in
//! declaration order. Nothing in this module returns an error.

use std::collections::HashMap;
use std::hash::Hash;

use log::warn;
use serde_json::Value;

use crate::color::LinearColor;
use crate::doc::{self, DocObject};
use crate::name::Name;
use crate::object::{Object, Reflected};
use crate::property::{FieldAccess, PropertyDescriptor, PropertyStorage, TypeTag};
use crate::registry::TypeRegistry;
use crate::resources::{AssetKind, ResourceManager};

/// Which way `serialize_object` moves data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Save,
    Load,
}

/// Applies the property list of the object's dynamic class against `doc`.
pub fn serialize_object(
    object: &mut dyn Object,
    direction: Direction,
    doc: &mut DocObject,
    registry: &TypeRegistry,
    resources: &mut ResourceManager,
) {
    let Some(class) = registry.class_of_instance(object) else {
        warn!(
            "cannot serialize {}: class is not registered",
            object.class_name()
        );
        return;
    };
    let host = object.as_reflected_mut();
    for property in class.properties() {
        serialize_property(host, property, direction, doc, registry, resources);
    }
}

fn serialize_property(
    host: &mut dyn Reflected,
    property: &PropertyDescriptor,
    direction: Direction,
    doc: &mut DocObject,
    registry: &TypeRegistry,
    resources: &mut ResourceManager,
) {
    match property.tag {
        TypeTag::Bool => {
            if let PropertyStorage::Bool(access) = &property.storage {
                sync_field(access, host, property.name, direction, doc, doc::read_bool, |v| {
                    Value::Bool(*v)
                });
            } else {
                storage_mismatch(property);
            }
        }
        TypeTag::Int32 => {
            if let PropertyStorage::Int32(access) = &property.storage {
                sync_field(access, host, property.name, direction, doc, doc::read_int32, |v| {
                    Value::from(*v)
                });
            } else {
                storage_mismatch(property);
            }
        }
        TypeTag::Float => {
            if let PropertyStorage::Float(access) = &property.storage {
                sync_field(access, host, property.name, direction, doc, doc::read_float, |v| {
                    doc::float_value(*v)
                });
            } else {
                storage_mismatch(property);
            }
        }
        TypeTag::Vector3 => {
            if let PropertyStorage::Vector3(access) = &property.storage {
                sync_field(access, host, property.name, direction, doc, doc::read_vec3, |v| {
                    doc::vec3_value(*v)
                });
            } else {
                storage_mismatch(property);
            }
        }
        TypeTag::LinearColor => {
            if let PropertyStorage::Color(access) = &property.storage {
                sync_field(
                    access,
                    host,
                    property.name,
                    direction,
                    doc,
                    |d, k| doc::read_vec4(d, k).map(LinearColor::from_array),
                    |v| doc::vec4_value(v.to_array()),
                );
            } else {
                storage_mismatch(property);
            }
        }
        TypeTag::String => {
            if let PropertyStorage::String(access) = &property.storage {
                sync_field(access, host, property.name, direction, doc, doc::read_string, |v| {
                    Value::String(v.clone())
                });
            } else {
                storage_mismatch(property);
            }
        }
        TypeTag::Name => {
            if let PropertyStorage::Name(access) = &property.storage {
                sync_field(
                    access,
                    host,
                    property.name,
                    direction,
                    doc,
                    |d, k| doc::read_string(d, k).map(Name::from),
                    |v| Value::String(v.as_str().to_string()),
                );
            } else {
                storage_mismatch(property);
            }
        }
        TypeTag::Enum => {
            if let PropertyStorage::Enum(access) = &property.storage {
                match direction {
                    Direction::Load => {
                        if let Some(ordinal) = doc::read_int32(doc, property.name) {
                            access.set_ordinal(host, ordinal);
                        }
                    }
                    Direction::Save => {
                        if let Some(ordinal) = access.ordinal(host) {
                            doc.insert(property.name.to_string(), Value::from(ordinal));
                        }
                    }
                }
            } else {
                storage_mismatch(property);
            }
        }
        TypeTag::Asset(kind) => {
            if let PropertyStorage::Asset(access) = &property.storage {
                match direction {
                    Direction::Load => {
                        if let Some(path) = doc::read_string(doc, property.name) {
                            let resolved = if path.is_empty() {
                                None
                            } else {
                                resources.load(kind, &path)
                            };
                            if let Some(slot) = access.get_mut(host) {
                                *slot = resolved;
                            }
                        }
                    }
                    Direction::Save => {
                        if let Some(reference) = access.get(host) {
                            let path = reference
                                .as_ref()
                                .map(|asset| asset.path().to_string())
                                .unwrap_or_default();
                            doc.insert(property.name.to_string(), Value::String(path));
                        }
                    }
                }
            } else {
                storage_mismatch(property);
            }
        }
        TypeTag::Curve => {
            if let PropertyStorage::Curve(access) = &property.storage {
                sync_field(access, host, property.name, direction, doc, doc::read_vec4, |v| {
                    doc::vec4_value(*v)
                });
            } else {
                storage_mismatch(property);
            }
        }
        TypeTag::Array => {
            let Some(inner) = property.inner else {
                warn!("array property {} has no element kind, skipping", property.name);
                return;
            };
            match (inner, &property.storage) {
                (TypeTag::Bool, PropertyStorage::BoolArray(access)) => {
                    sync_array(access, host, property.name, direction, doc, |node| node.as_bool(), |v| {
                        Value::Bool(*v)
                    });
                }
                (TypeTag::Int32, PropertyStorage::Int32Array(access)) => {
                    sync_array(
                        access,
                        host,
                        property.name,
                        direction,
                        doc,
                        |node| node.as_i64().map(|v| v as i32),
                        |v| Value::from(*v),
                    );
                }
                (TypeTag::Float, PropertyStorage::FloatArray(access)) => {
                    sync_array(
                        access,
                        host,
                        property.name,
                        direction,
                        doc,
                        |node| node.as_f64().map(|v| v as f32),
                        |v| doc::float_value(*v),
                    );
                }
                (TypeTag::String, PropertyStorage::StringArray(access)) => {
                    sync_array(
                        access,
                        host,
                        property.name,
                        direction,
                        doc,
                        |node| node.as_str().map(str::to_string),
                        |v| Value::String(v.clone()),
                    );
                }
                (TypeTag::Asset(AssetKind::Sound), PropertyStorage::SoundArray(access)) => {
                    sync_array(
                        access,
                        host,
                        property.name,
                        direction,
                        doc,
                        |node| {
                            node.as_str().map(|path| {
                                if path.is_empty() {
                                    None
                                } else {
                                    resources.load(AssetKind::Sound, path)
                                }
                            })
                        },
                        |v| {
                            let path = v
                                .as_ref()
                                .map(|asset| asset.path().to_string())
                                .unwrap_or_default();
                            Value::String(path)
                        },
                    );
                }
                _ => {
                    warn!(
                        "array property {} has unsupported element kind {:?}, skipping",
                        property.name, inner
                    );
                }
            }
        }
        TypeTag::Map => {
            let (Some(key), Some(inner)) = (property.key, property.inner) else {
                warn!("map property {} has no key/value kinds, skipping", property.name);
                return;
            };
            match (key, inner, &property.storage) {
                (TypeTag::String, TypeTag::Int32, PropertyStorage::StringInt32Map(access)) => {
                    sync_map(
                        access,
                        host,
                        property.name,
                        direction,
                        doc,
                        string_key,
                        String::clone,
                        |node| node.as_i64().map(|v| v as i32),
                        |v| Value::from(*v),
                    );
                }
                (TypeTag::String, TypeTag::Float, PropertyStorage::StringFloatMap(access)) => {
                    sync_map(
                        access,
                        host,
                        property.name,
                        direction,
                        doc,
                        string_key,
                        String::clone,
                        |node| node.as_f64().map(|v| v as f32),
                        |v| doc::float_value(*v),
                    );
                }
                (TypeTag::String, TypeTag::String, PropertyStorage::StringStringMap(access)) => {
                    sync_map(
                        access,
                        host,
                        property.name,
                        direction,
                        doc,
                        string_key,
                        String::clone,
                        |node| node.as_str().map(str::to_string),
                        |v| Value::String(v.clone()),
                    );
                }
                (TypeTag::String, TypeTag::Bool, PropertyStorage::StringBoolMap(access)) => {
                    sync_map(
                        access,
                        host,
                        property.name,
                        direction,
                        doc,
                        string_key,
                        String::clone,
                        |node| node.as_bool(),
                        |v| Value::Bool(*v),
                    );
                }
                (TypeTag::Int32, TypeTag::String, PropertyStorage::Int32StringMap(access)) => {
                    sync_map(
                        access,
                        host,
                        property.name,
                        direction,
                        doc,
                        |raw| raw.parse::<i32>().ok(),
                        |key| key.to_string(),
                        |node| node.as_str().map(str::to_string),
                        |v| Value::String(v.clone()),
                    );
                }
                _ => {
                    warn!(
                        "map property {} has unsupported key/value kinds {:?}/{:?}, skipping",
                        property.name, key, inner
                    );
                }
            }
        }
        TypeTag::Struct => {
            let Some(struct_name) = property.struct_name else {
                warn!("aggregate property {} has no type name, skipping", property.name);
                return;
            };
            let Some(descriptor) = registry.find_struct(struct_name) else {
                warn!(
                    "aggregate property {} has unknown type {struct_name}, skipping",
                    property.name
                );
                return;
            };
            let PropertyStorage::Aggregate(access) = &property.storage else {
                storage_mismatch(property);
                return;
            };
            match direction {
                Direction::Load => {
                    let Some(source) = doc::read_object(doc, property.name) else {
                        return;
                    };
                    let mut nested_doc = source.clone();
                    let Some(nested) = access.get_mut(host) else {
                        return;
                    };
                    for nested_property in descriptor.properties() {
                        serialize_property(
                            nested,
                            nested_property,
                            Direction::Load,
                            &mut nested_doc,
                            registry,
                            resources,
                        );
                    }
                }
                Direction::Save => {
                    let Some(nested) = access.get_mut(host) else {
                        return;
                    };
                    let mut nested_doc = DocObject::new();
                    for nested_property in descriptor.properties() {
                        serialize_property(
                            nested,
                            nested_property,
                            Direction::Save,
                            &mut nested_doc,
                            registry,
                            resources,
                        );
                    }
                    doc.insert(property.name.to_string(), Value::Object(nested_doc));
                }
            }
        }
        TypeTag::Object => {
            // Generic object references are not persisted; only asset
            // references serialize, by path.
        }
    }
}

fn storage_mismatch(property: &PropertyDescriptor) {
    warn!(
        "property {} declared as {:?} has no matching storage, skipping",
        property.name, property.tag
    );
}

fn string_key(raw: &str) -> Option<String> {
    Some(raw.to_string())
}

fn sync_field<T: 'static>(
    access: &FieldAccess<T>,
    host: &mut dyn Reflected,
    name: &str,
    direction: Direction,
    doc: &mut DocObject,
    read: impl FnOnce(&DocObject, &str) -> Option<T>,
    write: impl FnOnce(&T) -> Value,
) {
    match direction {
        Direction::Load => {
            if let Some(value) = read(doc, name) {
                if let Some(slot) = access.get_mut(host) {
                    *slot = value;
                }
            }
        }
        Direction::Save => {
            if let Some(value) = access.get(host) {
                doc.insert(name.to_string(), write(value));
            }
        }
    }
}

fn sync_array<T: 'static>(
    access: &FieldAccess<Vec<T>>,
    host: &mut dyn Reflected,
    name: &str,
    direction: Direction,
    doc: &mut DocObject,
    mut decode: impl FnMut(&Value) -> Option<T>,
    encode: impl Fn(&T) -> Value,
) {
    match direction {
        Direction::Load => {
            let Some(items) = doc::read_array(doc, name) else {
                return;
            };
            let rebuilt: Vec<T> = items.iter().filter_map(|node| decode(node)).collect();
            if let Some(slot) = access.get_mut(host) {
                *slot = rebuilt;
            }
        }
        Direction::Save => {
            if let Some(values) = access.get(host) {
                let encoded = values.iter().map(|v| encode(v)).collect();
                doc.insert(name.to_string(), Value::Array(encoded));
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn sync_map<K: Eq + Hash + 'static, V: 'static>(
    access: &FieldAccess<HashMap<K, V>>,
    host: &mut dyn Reflected,
    name: &str,
    direction: Direction,
    doc: &mut DocObject,
    decode_key: impl Fn(&str) -> Option<K>,
    encode_key: impl Fn(&K) -> String,
    mut decode_value: impl FnMut(&Value) -> Option<V>,
    encode_value: impl Fn(&V) -> Value,
) {
    match direction {
        Direction::Load => {
            let Some(entries) = doc::read_object(doc, name) else {
                return;
            };
            let mut rebuilt = HashMap::new();
            for (raw_key, node) in entries {
                if let (Some(key), Some(value)) = (decode_key(raw_key), decode_value(node)) {
                    rebuilt.insert(key, value);
                }
            }
            if let Some(slot) = access.get_mut(host) {
                *slot = rebuilt;
            }
        }
        Direction::Save => {
            if let Some(map) = access.get(host) {
                let mut encoded = DocObject::new();
                for (key, value) in map {
                    encoded.insert(encode_key(key), encode_value(value));
                }
                doc.insert(name.to_string(), Value::Object(encoded));
            }
        }
    }
}
